//! Airtable formula functions
//!
//! One builder per Airtable function. Fixed-arity functions take each
//! argument separately; variadic ones take any iterator of arguments.
//! Names that collide with Rust keywords get a trailing underscore.

use super::{Formula, FunctionCall};

macro_rules! fixed_functions {
    ($( $(#[$doc:meta])* $rust:ident => $name:literal ( $($arg:ident),* ); )*) => {
        $(
            $(#[$doc])*
            pub fn $rust($($arg: impl Into<Formula>),*) -> Formula {
                FunctionCall::new($name, vec![$($arg.into()),*]).into()
            }
        )*
    };
}

macro_rules! variadic_functions {
    ($( $(#[$doc:meta])* $rust:ident => $name:literal; )*) => {
        $(
            $(#[$doc])*
            pub fn $rust<I, T>(args: I) -> Formula
            where
                I: IntoIterator<Item = T>,
                T: Into<Formula>,
            {
                FunctionCall::new($name, args.into_iter().map(Into::into).collect()).into()
            }
        )*
    };
}

fixed_functions! {
    /// `TODAY()`: the current date
    today => "TODAY"();
    /// `NOW()`: the current date and time
    now => "NOW"();
    /// `BLANK()`: an empty value
    blank => "BLANK"();
    /// `ERROR()`: an error value
    error => "ERROR"();
    /// `RECORD_ID()`: id of the current record
    record_id => "RECORD_ID"();
    /// `CREATED_TIME()`: creation time of the current record
    created_time => "CREATED_TIME"();
    /// `LAST_MODIFIED_TIME()`: last modification of any field
    last_modified_time => "LAST_MODIFIED_TIME"();

    /// `IF(expression, value1, value2)`
    if_ => "IF"(expression, value1, value2);
    /// `ISERROR(expr)`
    is_error => "ISERROR"(expr);

    /// `ABS(value)`
    abs => "ABS"(value);
    /// `CEILING(value, significance)`
    ceiling => "CEILING"(value, significance);
    /// `FLOOR(value, significance)`
    floor => "FLOOR"(value, significance);
    /// `EVEN(value)`
    even => "EVEN"(value);
    /// `ODD(value)`
    odd => "ODD"(value);
    /// `EXP(power)`
    exp => "EXP"(power);
    /// `INT(value)`
    int => "INT"(value);
    /// `LOG(number, base)`
    log => "LOG"(number, base);
    /// `MOD(value, divisor)`
    mod_ => "MOD"(value, divisor);
    /// `POWER(base, power)`
    power => "POWER"(base, power);
    /// `ROUND(value, precision)`
    round => "ROUND"(value, precision);
    /// `ROUNDUP(value, precision)`
    round_up => "ROUNDUP"(value, precision);
    /// `ROUNDDOWN(value, precision)`
    round_down => "ROUNDDOWN"(value, precision);
    /// `SQRT(value)`
    sqrt => "SQRT"(value);
    /// `VALUE(text)`
    value => "VALUE"(text);

    /// `ENCODE_URL_COMPONENT(component)`
    encode_url_component => "ENCODE_URL_COMPONENT"(component);
    /// `FIND(string_to_find, where_to_search)`
    find => "FIND"(string_to_find, where_to_search);
    /// `SEARCH(string_to_find, where_to_search)`
    search => "SEARCH"(string_to_find, where_to_search);
    /// `LEFT(string, how_many)`
    left => "LEFT"(string, how_many);
    /// `RIGHT(string, how_many)`
    right => "RIGHT"(string, how_many);
    /// `MID(string, where_to_start, count)`
    mid => "MID"(string, where_to_start, count);
    /// `LEN(string)`
    len => "LEN"(string);
    /// `LOWER(string)`
    lower => "LOWER"(string);
    /// `UPPER(string)`
    upper => "UPPER"(string);
    /// `TRIM(string)`
    trim => "TRIM"(string);
    /// `REPT(string, number)`
    rept => "REPT"(string, number);
    /// `SUBSTITUTE(string, old_text, new_text)`
    substitute => "SUBSTITUTE"(string, old_text, new_text);
    /// `T(value)`: the value if it is text, otherwise blank
    t => "T"(value);
    /// `REGEX_MATCH(string, regex)`
    regex_match => "REGEX_MATCH"(string, regex);
    /// `REGEX_EXTRACT(string, regex)`
    regex_extract => "REGEX_EXTRACT"(string, regex);
    /// `REGEX_REPLACE(string, regex, replacement)`
    regex_replace => "REGEX_REPLACE"(string, regex, replacement);

    /// `ARRAYCOMPACT(values)`
    array_compact => "ARRAYCOMPACT"(values);
    /// `ARRAYFLATTEN(values)`
    array_flatten => "ARRAYFLATTEN"(values);
    /// `ARRAYUNIQUE(values)`
    array_unique => "ARRAYUNIQUE"(values);
    /// `ARRAYJOIN(values, separator)`
    array_join => "ARRAYJOIN"(values, separator);

    /// `DATEADD(date, count, units)`
    date_add => "DATEADD"(date, count, units);
    /// `DATESTR(date)`
    date_str => "DATESTR"(date);
    /// `DATETIME_DIFF(date1, date2, units)`
    datetime_diff => "DATETIME_DIFF"(date1, date2, units);
    /// `DATETIME_FORMAT(date, output_format)`
    datetime_format => "DATETIME_FORMAT"(date, output_format);
    /// `DATETIME_PARSE(date, input_format)`
    datetime_parse => "DATETIME_PARSE"(date, input_format);
    /// `DAY(date)`
    day => "DAY"(date);
    /// `HOUR(datetime)`
    hour => "HOUR"(datetime);
    /// `MINUTE(datetime)`
    minute => "MINUTE"(datetime);
    /// `SECOND(datetime)`
    second => "SECOND"(datetime);
    /// `MONTH(date)`
    month => "MONTH"(date);
    /// `YEAR(date)`
    year => "YEAR"(date);
    /// `WEEKDAY(date)`
    weekday => "WEEKDAY"(date);
    /// `WEEKNUM(date)`
    weeknum => "WEEKNUM"(date);
    /// `IS_AFTER(date1, date2)`
    is_after => "IS_AFTER"(date1, date2);
    /// `IS_BEFORE(date1, date2)`
    is_before => "IS_BEFORE"(date1, date2);
    /// `IS_SAME(date1, date2, unit)`
    is_same => "IS_SAME"(date1, date2, unit);
    /// `SET_LOCALE(date, locale_modifier)`
    set_locale => "SET_LOCALE"(date, locale_modifier);
    /// `SET_TIMEZONE(date, tz_identifier)`
    set_timezone => "SET_TIMEZONE"(date, tz_identifier);
    /// `TIMESTR(datetime)`
    time_str => "TIMESTR"(datetime);
    /// `TONOW(date)`
    to_now => "TONOW"(date);
    /// `FROMNOW(date)`
    from_now => "FROMNOW"(date);
    /// `WORKDAY(start_date, num_days)`
    workday => "WORKDAY"(start_date, num_days);
    /// `WORKDAY_DIFF(start_date, end_date)`
    workday_diff => "WORKDAY_DIFF"(start_date, end_date);
}

variadic_functions! {
    /// `AVERAGE(number1, ...)`
    average => "AVERAGE";
    /// `CONCATENATE(text1, ...)`
    concatenate => "CONCATENATE";
    /// `COUNT(number1, ...)`: count of numeric items
    count => "COUNT";
    /// `COUNTA(value1, ...)`: count of non-empty values
    counta => "COUNTA";
    /// `COUNTALL(value1, ...)`: count of all values, including blanks
    countall => "COUNTALL";
    /// `MAX(number1, ...)`
    max => "MAX";
    /// `MIN(number1, ...)`
    min => "MIN";
    /// `SUM(number1, ...)`
    sum => "SUM";
    /// `SWITCH(expression, pattern, result, ..., default)`
    switch => "SWITCH";
}
