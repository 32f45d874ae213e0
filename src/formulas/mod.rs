//! Formula builder
//!
//! Builds Airtable formula expressions, mostly for `filterByFormula`.
//! A [`Formula`] is a small expression tree; its `Display` output is the
//! formula text Airtable expects.
//!
//! ```
//! use airtable_kit::formulas::{field, gte, Formula};
//!
//! let formula = field("Name").equals("Alice") & gte(field("Age"), 21);
//! assert_eq!(formula.to_string(), "AND({Name}='Alice', {Age}>=21)");
//! ```

pub mod functions;

use crate::error::{AirtableError, Result};
use crate::utils::{date_to_iso_str, datetime_to_iso_str};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not};

pub use functions::*;

/// Escape single quotes for use inside a quoted formula string
pub fn escape_quotes(value: &str) -> String {
    value.replace('\'', "\\'")
}

/// Wrap a string in single quotes, escaping quotes inside it
///
/// `quoted("Guest's Name") == "'Guest\\'s Name'"`
pub fn quoted(value: &str) -> String {
    format!("'{}'", escape_quotes(value))
}

/// Reference a field by name: `{First Name}`
pub fn field_name(name: &str) -> String {
    format!("{{{}}}", escape_quotes(name))
}

/// Render any formula-convertible value as formula text
pub fn to_formula_str(value: impl Into<Formula>) -> String {
    value.into().to_string()
}

/// A scalar value embedded in a formula
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Integer(i64),
    /// NaN and infinities have no formula spelling and render as `ERROR()`
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(true) => write!(f, "TRUE()"),
            Literal::Bool(false) => write!(f, "FALSE()"),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(n) if n.is_finite() => write!(f, "{}", n),
            Literal::Float(_) => write!(f, "ERROR()"),
            Literal::Text(s) => write!(f, "{}", quoted(s)),
            Literal::Date(d) => write!(f, "DATETIME_PARSE('{}')", date_to_iso_str(d)),
            Literal::DateTime(dt) => write!(f, "DATETIME_PARSE('{}')", datetime_to_iso_str(dt)),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    /// Operator as written in a formula
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
        }
    }

    /// Parse an operator symbol such as `">="`
    pub fn from_symbol(symbol: &str) -> Result<Self> {
        match symbol.trim() {
            "=" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::Ne),
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Gte),
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Lte),
            other => Err(AirtableError::Formula(format!(
                "unknown comparison operator {:?}",
                other
            ))),
        }
    }
}

/// Logical operators combining formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Xor,
    Not,
}

impl Operator {
    /// Function name used in the formula text
    pub fn name(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Xor => "XOR",
            Operator::Not => "NOT",
        }
    }

    fn is_associative(&self) -> bool {
        !matches!(self, Operator::Not)
    }
}

/// A binary comparison such as `{Age}>=21`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub lhs: Box<Formula>,
    pub op: Comparator,
    pub rhs: Box<Formula>,
}

impl Comparison {
    /// Create a comparison
    pub fn new(lhs: impl Into<Formula>, op: Comparator, rhs: impl Into<Formula>) -> Self {
        Self {
            lhs: Box::new(lhs.into()),
            op,
            rhs: Box::new(rhs.into()),
        }
    }
}

/// A logical combination: `AND(...)`, `OR(...)`, `XOR(...)` or `NOT(...)`
///
/// Always holds at least one component; `NOT` holds exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    op: Operator,
    components: Vec<Formula>,
}

impl Compound {
    /// Create a compound, validating the number of components
    pub fn new<I, T>(op: Operator, components: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Component,
    {
        let components: Vec<Formula> = components
            .into_iter()
            .map(Component::into_component)
            .collect();
        if components.is_empty() {
            return Err(AirtableError::Formula(
                "Compound() requires at least one component".to_string(),
            ));
        }
        if op == Operator::Not && components.len() != 1 {
            return Err(AirtableError::Formula(format!(
                "NOT() requires exactly one condition; got {}",
                components.len()
            )));
        }
        Ok(Self { op, components })
    }

    fn pair(op: Operator, lhs: Formula, rhs: Formula) -> Self {
        Self {
            op,
            components: vec![lhs, rhs],
        }
    }

    /// The logical operator
    pub fn op(&self) -> Operator {
        self.op
    }

    /// The combined formulas
    pub fn components(&self) -> &[Formula] {
        &self.components
    }

    fn flatten(self) -> Self {
        let op = self.op;
        let mut components = Vec::with_capacity(self.components.len());
        for component in self.components {
            match component.flatten() {
                Formula::Compound(inner) if op.is_associative() && inner.op == op => {
                    components.extend(inner.components);
                }
                other => components.push(other),
            }
        }
        Self { op, components }
    }
}

/// A call to an Airtable function, such as `IF(...)` or `TODAY()`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Formula>,
}

impl FunctionCall {
    /// Create a function call
    pub fn new(name: impl Into<String>, args: Vec<Formula>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// An Airtable formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    /// Formula text used verbatim
    Raw(String),
    /// A reference to a field: `{Name}`
    Field(String),
    /// A literal value
    Literal(Literal),
    /// A comparison between two formulas
    Comparison(Comparison),
    /// A logical combination of formulas
    Compound(Compound),
    /// A function call
    Function(FunctionCall),
}

/// Reference a field by name
pub fn field(name: impl Into<String>) -> Formula {
    Formula::Field(name.into())
}

impl Formula {
    /// Wrap existing formula text
    pub fn raw(text: impl Into<String>) -> Self {
        Formula::Raw(text.into())
    }

    /// Call an Airtable function by name
    pub fn call(name: impl Into<String>, args: Vec<Formula>) -> Self {
        Formula::Function(FunctionCall::new(name, args))
    }

    fn compare(self, op: Comparator, other: impl Into<Formula>) -> Formula {
        Formula::Comparison(Comparison::new(self, op, other))
    }

    /// `self=other`
    pub fn equals(self, other: impl Into<Formula>) -> Formula {
        self.compare(Comparator::Eq, other)
    }

    /// `self!=other`
    pub fn not_equals(self, other: impl Into<Formula>) -> Formula {
        self.compare(Comparator::Ne, other)
    }

    /// `self>other`
    pub fn gt(self, other: impl Into<Formula>) -> Formula {
        self.compare(Comparator::Gt, other)
    }

    /// `self>=other`
    pub fn gte(self, other: impl Into<Formula>) -> Formula {
        self.compare(Comparator::Gte, other)
    }

    /// `self<other`
    pub fn lt(self, other: impl Into<Formula>) -> Formula {
        self.compare(Comparator::Lt, other)
    }

    /// `self<=other`
    pub fn lte(self, other: impl Into<Formula>) -> Formula {
        self.compare(Comparator::Lte, other)
    }

    /// Merge nested compounds that use the same operator
    ///
    /// `AND(AND(a, b), AND(c, OR(d, e)))` becomes `AND(a, b, c, OR(d, e))`.
    /// Formulas that are not compounds are returned unchanged.
    pub fn flatten(self) -> Formula {
        match self {
            Formula::Compound(compound) => Formula::Compound(compound.flatten()),
            other => other,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Comparison(_) => write!(f, "({})", self),
            _ => write!(f, "{}", self),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, name: &str, args: &[Formula]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    write!(f, ")")
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Raw(text) => write!(f, "{}", text),
            Formula::Field(name) => write!(f, "{}", field_name(name)),
            Formula::Literal(literal) => write!(f, "{}", literal),
            Formula::Comparison(cmp) => {
                cmp.lhs.fmt_operand(f)?;
                write!(f, "{}", cmp.op.symbol())?;
                cmp.rhs.fmt_operand(f)
            }
            Formula::Compound(compound) => write_args(f, compound.op.name(), &compound.components),
            Formula::Function(call) => write_args(f, &call.name, &call.args),
        }
    }
}

impl From<Literal> for Formula {
    fn from(value: Literal) -> Self {
        Formula::Literal(value)
    }
}

impl From<Comparison> for Formula {
    fn from(value: Comparison) -> Self {
        Formula::Comparison(value)
    }
}

impl From<Compound> for Formula {
    fn from(value: Compound) -> Self {
        Formula::Compound(value)
    }
}

impl From<FunctionCall> for Formula {
    fn from(value: FunctionCall) -> Self {
        Formula::Function(value)
    }
}

impl From<&Formula> for Formula {
    fn from(value: &Formula) -> Self {
        value.clone()
    }
}

macro_rules! literal_from {
    ($variant:ident: $($ty:ty => $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Formula {
                fn from(value: $ty) -> Self {
                    Formula::Literal(Literal::$variant(($conv)(value)))
                }
            }
        )*
    };
}

literal_from!(Bool: bool => |v| v);
literal_from!(Integer:
    i64 => |v| v,
    i32 => i64::from,
    u32 => i64::from,
    i16 => i64::from,
    u16 => i64::from,
);
literal_from!(Float: f64 => |v| v, f32 => f64::from);
literal_from!(Text:
    &str => |v: &str| v.to_string(),
    String => |v| v,
    &String => |v: &String| v.clone(),
);
literal_from!(Date: NaiveDate => |v| v);
literal_from!(DateTime:
    DateTime<Utc> => |v| v,
    NaiveDateTime => |v: NaiveDateTime| v.and_utc(),
);

/// A component of `AND()`, `OR()`, `XOR()` or `NOT()`
///
/// Unlike [`Into<Formula>`], strings are taken as formula text rather than
/// quoted literals, so `and(["{a}=1", "{b}=2"])` renders `AND({a}=1, {b}=2)`.
pub trait Component {
    fn into_component(self) -> Formula;
}

macro_rules! component_via_formula {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Component for $ty {
                fn into_component(self) -> Formula {
                    self.into()
                }
            }
        )*
    };
}

component_via_formula!(
    Formula,
    Literal,
    Comparison,
    Compound,
    FunctionCall,
    bool,
    i64,
    i32,
    u32,
    i16,
    u16,
    f64,
    f32,
    NaiveDate,
    DateTime<Utc>,
    NaiveDateTime,
);

impl Component for &Formula {
    fn into_component(self) -> Formula {
        self.clone()
    }
}

impl Component for &str {
    fn into_component(self) -> Formula {
        Formula::Raw(self.to_string())
    }
}

impl Component for String {
    fn into_component(self) -> Formula {
        Formula::Raw(self)
    }
}

impl Component for &String {
    fn into_component(self) -> Formula {
        Formula::Raw(self.clone())
    }
}

impl<T: Into<Formula>> BitAnd<T> for Formula {
    type Output = Formula;

    fn bitand(self, rhs: T) -> Formula {
        Formula::Compound(Compound::pair(Operator::And, self, rhs.into()))
    }
}

impl<T: Into<Formula>> BitOr<T> for Formula {
    type Output = Formula;

    fn bitor(self, rhs: T) -> Formula {
        Formula::Compound(Compound::pair(Operator::Or, self, rhs.into()))
    }
}

impl<T: Into<Formula>> BitXor<T> for Formula {
    type Output = Formula;

    fn bitxor(self, rhs: T) -> Formula {
        Formula::Compound(Compound::pair(Operator::Xor, self, rhs.into()))
    }
}

impl<T: Into<Formula>> BitAndAssign<T> for Formula {
    fn bitand_assign(&mut self, rhs: T) {
        let lhs = std::mem::replace(self, Formula::Raw(String::new()));
        *self = lhs & rhs;
    }
}

impl<T: Into<Formula>> BitOrAssign<T> for Formula {
    fn bitor_assign(&mut self, rhs: T) {
        let lhs = std::mem::replace(self, Formula::Raw(String::new()));
        *self = lhs | rhs;
    }
}

impl Not for Formula {
    type Output = Formula;

    fn not(self) -> Formula {
        Formula::Compound(Compound {
            op: Operator::Not,
            components: vec![self],
        })
    }
}

/// `lhs=rhs`
pub fn eq(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Formula {
    Comparison::new(lhs, Comparator::Eq, rhs).into()
}

/// `lhs!=rhs`
pub fn ne(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Formula {
    Comparison::new(lhs, Comparator::Ne, rhs).into()
}

/// `lhs>rhs`
pub fn gt(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Formula {
    Comparison::new(lhs, Comparator::Gt, rhs).into()
}

/// `lhs>=rhs`
pub fn gte(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Formula {
    Comparison::new(lhs, Comparator::Gte, rhs).into()
}

/// `lhs<rhs`
pub fn lt(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Formula {
    Comparison::new(lhs, Comparator::Lt, rhs).into()
}

/// `lhs<=rhs`
pub fn lte(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Formula {
    Comparison::new(lhs, Comparator::Lte, rhs).into()
}

/// `{field}=value` for each pair, in order
pub fn fields_equal<I, K, V>(pairs: I) -> impl Iterator<Item = Formula>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Formula>,
{
    pairs.into_iter().map(|(k, v)| eq(field(k), v))
}

/// `AND(...)` over one or more formulas
pub fn and<I, T>(components: I) -> Result<Formula>
where
    I: IntoIterator<Item = T>,
    T: Component,
{
    Compound::new(Operator::And, components).map(Formula::Compound)
}

/// `OR(...)` over one or more formulas
pub fn or<I, T>(components: I) -> Result<Formula>
where
    I: IntoIterator<Item = T>,
    T: Component,
{
    Compound::new(Operator::Or, components).map(Formula::Compound)
}

/// `XOR(...)` over one or more formulas
pub fn xor<I, T>(components: I) -> Result<Formula>
where
    I: IntoIterator<Item = T>,
    T: Component,
{
    Compound::new(Operator::Xor, components).map(Formula::Compound)
}

/// `NOT(...)` over exactly one formula
pub fn not<I, T>(components: I) -> Result<Formula>
where
    I: IntoIterator<Item = T>,
    T: Component,
{
    let components: Vec<Formula> = components
        .into_iter()
        .map(Component::into_component)
        .collect();
    if components.len() != 1 {
        return Err(AirtableError::Formula(format!(
            "NOT() requires exactly one condition; got {}",
            components.len()
        )));
    }
    Compound::new(Operator::Not, components).map(Formula::Compound)
}

/// A comparison against a field's value, used by [`match_fields`]
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub op: Comparator,
    pub value: Formula,
}

impl<T: Into<Formula>> From<(Comparator, T)> for Condition {
    fn from((op, value): (Comparator, T)) -> Self {
        Self {
            op,
            value: value.into(),
        }
    }
}

macro_rules! condition_eq_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Condition {
                fn from(value: $ty) -> Self {
                    Self { op: Comparator::Eq, value: value.into() }
                }
            }
        )*
    };
}

condition_eq_from!(
    bool, i64, i32, u32, f64, &str, String, NaiveDate, DateTime<Utc>, Formula
);

/// Build a formula matching field values
///
/// Each condition is either a plain value (equality) or a
/// `(Comparator, value)` pair. One condition yields a bare comparison,
/// several are joined with `AND` (or `OR` when `match_any` is set), and
/// no conditions yield `None`.
pub fn match_fields<I, K, C>(conditions: I, match_any: bool) -> Option<Formula>
where
    I: IntoIterator<Item = (K, C)>,
    K: Into<String>,
    C: Into<Condition>,
{
    let mut comparisons: Vec<Formula> = conditions
        .into_iter()
        .map(|(name, condition)| {
            let condition = condition.into();
            Comparison::new(field(name), condition.op, condition.value).into()
        })
        .collect();

    match comparisons.len() {
        0 => None,
        1 => comparisons.pop(),
        _ => {
            let op = if match_any { Operator::Or } else { Operator::And };
            Some(Formula::Compound(Compound { op, components: comparisons }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(text: &str) -> Formula {
        Formula::raw(text)
    }

    #[test]
    fn test_equivalence() {
        assert_eq!(raw("a"), raw("a"));
        assert_ne!(raw("a"), raw("b"));
        assert_ne!(raw("a"), Formula::from("a"));
    }

    #[test]
    fn test_operators() {
        let lft = raw("a");
        let rgt = raw("b");
        assert_eq!(lft.to_string(), "a");
        assert_eq!((lft.clone() & rgt.clone()).to_string(), "AND(a, b)");
        assert_eq!((lft.clone() | rgt.clone()).to_string(), "OR(a, b)");
        assert_eq!((!(lft.clone() & rgt.clone())).to_string(), "NOT(AND(a, b))");
        assert_eq!((lft.clone() ^ rgt).to_string(), "XOR(a, b)");
        assert_eq!(lft.clone().flatten(), lft);
    }

    #[test]
    fn test_comparisons() {
        let cases = [
            (eq as fn(Formula, Formula) -> Formula, "="),
            (ne, "!="),
            (gt, ">"),
            (gte, ">="),
            (lt, "<"),
            (lte, "<="),
        ];
        for (cmp, op) in cases {
            assert_eq!(cmp(1.into(), 1.into()).to_string(), format!("1{op}1"));
            assert_eq!(
                cmp(raw("Foo"), "Foo".into()).to_string(),
                format!("Foo{op}'Foo'")
            );
        }
    }

    #[test]
    fn test_comparison_shortcuts() {
        let targets = [
            raw("X"),
            field("X"),
            eq(1, 1),
            today(),
        ];
        for target in targets {
            assert_eq!(target.clone().equals("Y"), eq(target.clone(), "Y"));
            assert_eq!(target.clone().not_equals("Y"), ne(target.clone(), "Y"));
            assert_eq!(target.clone().gt("Y"), gt(target.clone(), "Y"));
            assert_eq!(target.clone().gte("Y"), gte(target.clone(), "Y"));
            assert_eq!(target.clone().lt("Y"), lt(target.clone(), "Y"));
            assert_eq!(target.clone().lte("Y"), lte(target, "Y"));
        }
    }

    #[test]
    fn test_comparison_equivalence() {
        assert_eq!(eq(1, 1), eq(1, 1));
        assert_ne!(eq(1, 2), eq(2, 1));
        assert_ne!(eq(1, 1), ne(1, 1));
        assert_ne!(eq(1, 1), raw("1=1"));
        assert_eq!(eq(1, 1).to_string(), raw("1=1").to_string());
    }

    #[test]
    fn test_compound() {
        for (op, name) in [(Operator::And, "AND"), (Operator::Or, "OR")] {
            let cmp = Compound::new(op, [eq("foo", 1), eq("bar", 2)]).unwrap();
            assert_eq!(
                Formula::from(cmp).to_string(),
                format!("{name}('foo'=1, 'bar'=2)")
            );
        }
    }

    #[test]
    fn test_compound_with_iterator() {
        let cmp = and((0..3).map(|n| eq(format!("f{n}"), n))).unwrap();
        assert_eq!(cmp.to_string(), "AND('f0'=0, 'f1'=1, 'f2'=2)");
    }

    #[test]
    fn test_compound_equivalence() {
        let one = |op| Compound::new(op, [1]).unwrap();
        assert_eq!(one(Operator::And), one(Operator::And));
        assert_ne!(one(Operator::And), Compound::new(Operator::And, [2]).unwrap());
        assert_ne!(one(Operator::And), one(Operator::Or));
    }

    #[test]
    fn test_compound_constructors() {
        let expected = "AND('foo'=1, {bar}=2)";

        // mix of formulas and field=value pairs
        let mixed = and(std::iter::once(eq("foo", 1)).chain(fields_equal([("bar", 2)]))).unwrap();
        assert_eq!(mixed.to_string(), expected);

        // a list of formulas
        let listed = and(vec![eq("foo", 1), eq(field("bar"), 2)]).unwrap();
        assert_eq!(listed.to_string(), expected);

        // raw strings
        let raw_parts = and(["'foo'=1", "{bar}=2"]).unwrap();
        assert_eq!(raw_parts.to_string(), expected);
        let owned = and(vec!["'foo'=1".to_string(), "{bar}=2".to_string()]).unwrap();
        assert_eq!(owned.to_string(), expected);
        assert_eq!(and(["'foo'=1", "{bar}=2"].map(Formula::raw)).unwrap(), raw_parts);

        let ored = or([eq("foo", 1), eq(field("bar"), 2)]).unwrap();
        assert_eq!(ored.to_string(), "OR('foo'=1, {bar}=2)");
        assert_eq!(or(["'foo'=1", "{bar}=2"]).unwrap(), ored);
        assert_eq!(xor(["{a}", "{b}"]).unwrap().to_string(), "XOR({a}, {b})");
        assert_eq!(not(["{done}"]).unwrap().to_string(), "NOT({done})");
    }

    #[test]
    fn test_compound_without_parameters() {
        for op in [Operator::And, Operator::Or, Operator::Not] {
            let err = Compound::new(op, Vec::<Formula>::new()).unwrap_err();
            assert!(err
                .to_string()
                .contains("Compound() requires at least one component"));
        }
    }

    #[test]
    fn test_compound_flatten() {
        let a = eq("a", "a");
        let b = eq("b", "b");
        let c = eq("c", "c");
        let d = eq("d", "d");
        let e = eq("e", "e");
        let nested = (a.clone() & b.clone()) & (c.clone() & (d.clone() | e.clone()));

        assert_eq!(
            nested,
            and([
                and([a.clone(), b.clone()]).unwrap(),
                and([c.clone(), or([d.clone(), e.clone()]).unwrap()]).unwrap(),
            ])
            .unwrap()
        );

        let flat = and([
            a.clone(),
            b.clone(),
            c.clone(),
            or([d.clone(), e.clone()]).unwrap(),
        ])
        .unwrap();
        assert_eq!(nested.clone().flatten(), flat);

        let negated = (!nested).flatten();
        assert_eq!(negated, not([flat]).unwrap());
        assert_eq!(
            negated.to_string(),
            "NOT(AND('a'='a', 'b'='b', 'c'='c', OR('d'='d', 'e'='e')))"
        );
    }

    #[test]
    fn test_flatten_keeps_double_negation() {
        let formula = !!raw("x");
        assert_eq!(formula.clone().flatten(), formula);
        assert_eq!(formula.to_string(), "NOT(NOT(x))");
    }

    #[test]
    fn test_compound_with_compound() {
        assert_eq!(eq(1, 1).equals(true).to_string(), "(1=1)=TRUE()");
        assert_eq!(eq(false, eq(1, 2)).to_string(), "FALSE()=(1=2)");
    }

    #[test]
    fn test_not() {
        assert_eq!(not([eq("foo", 1)]).unwrap().to_string(), "NOT('foo'=1)");
        assert_eq!(
            not(fields_equal([("foo", 1)])).unwrap().to_string(),
            "NOT({foo}=1)"
        );

        let err = not([eq("foo", 1), eq(field("bar"), 2)]).unwrap_err();
        assert!(err.to_string().contains("requires exactly one condition; got 2"));

        let err = not(fields_equal([("foo", 1), ("bar", 2)])).unwrap_err();
        assert!(err.to_string().contains("requires exactly one condition; got 2"));

        let err = not(Vec::<Formula>::new()).unwrap_err();
        assert!(err.to_string().contains("requires exactly one condition; got 0"));
    }

    #[test]
    fn test_to_formula() {
        assert_eq!(to_formula_str(eq(raw("a"), "b")), "a='b'");
        assert_eq!(to_formula_str(true), "TRUE()");
        assert_eq!(to_formula_str(false), "FALSE()");
        assert_eq!(to_formula_str(3), "3");
        assert_eq!(to_formula_str(3.5), "3.5");
        assert_eq!(to_formula_str(3.14159265), "3.14159265");
        assert_eq!(to_formula_str(f64::NAN), "ERROR()");
        assert_eq!(to_formula_str(f64::INFINITY), "ERROR()");
        assert_eq!(to_formula_str(f32::NEG_INFINITY), "ERROR()");
        assert_eq!(field("Score").gt(f64::NAN).to_string(), "{Score}>ERROR()");
        assert_eq!(to_formula_str("asdf"), "'asdf'");
        assert_eq!(to_formula_str("Jane's"), "'Jane\\'s'");
        assert_eq!(
            to_formula_str(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()),
            "DATETIME_PARSE('2023-12-01')"
        );
        assert_eq!(
            to_formula_str(Utc.with_ymd_and_hms(2023, 12, 1, 12, 34, 56).unwrap()),
            "DATETIME_PARSE('2023-12-01T12:34:56.000Z')"
        );
    }

    #[test]
    fn test_match() {
        let empty: Vec<(&str, i64)> = vec![];
        assert!(match_fields(empty, false).is_none());

        assert_eq!(
            match_fields([("Field", "value")], false).unwrap().to_string(),
            "{Field}='value'"
        );
        assert_eq!(
            match_fields(
                [("A", (Comparator::Eq, 123)), ("B", (Comparator::Ne, 123))],
                false
            )
            .unwrap()
            .to_string(),
            "AND({A}=123, {B}!=123)"
        );
        assert_eq!(
            match_fields([("A", 123), ("B", 123)], true)
                .unwrap()
                .to_string(),
            "OR({A}=123, {B}=123)"
        );

        for symbol in ["<", "<=", ">", ">="] {
            let op = Comparator::from_symbol(symbol).unwrap();
            assert_eq!(
                match_fields([("Field", (op, 123))], false)
                    .unwrap()
                    .to_string(),
                format!("{{Field}}{symbol}123")
            );
        }
        assert!(Comparator::from_symbol("<>").is_err());
    }

    #[test]
    fn test_function_call() {
        let fc = Formula::call("IF", vec![1.into(), true.into(), false.into()]);
        assert_eq!(fc.to_string(), "IF(1, TRUE(), FALSE())");
    }

    #[test]
    fn test_field_name() {
        assert_eq!(field_name("First Name"), "{First Name}");
        assert_eq!(field_name("Guest's Name"), "{Guest\\'s Name}");
    }

    #[test]
    fn test_quoted() {
        assert_eq!(quoted("John"), "'John'");
        assert_eq!(quoted("Guest's Name"), "'Guest\\'s Name'");
    }

    #[test]
    fn test_assign_operators() {
        let mut formula = field("Name").equals("Value");
        formula &= gte(field("Age"), 21);
        assert_eq!(formula.to_string(), "AND({Name}='Value', {Age}>=21)");

        formula |= raw("TRUE()");
        assert_eq!(
            formula.to_string(),
            "OR(AND({Name}='Value', {Age}>=21), TRUE())"
        );
    }
}
