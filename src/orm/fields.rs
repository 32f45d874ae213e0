//! Field descriptors
//!
//! A [`Field<K>`] names one Airtable field and knows, through its
//! [`FieldKind`], how to convert the JSON cell value to a Rust value and
//! back. Values live in the model's [`RecordState`](super::RecordState);
//! descriptors are usually declared as associated constants:
//!
//! ```
//! use airtable_kit::orm::{Field, Integer, Text};
//!
//! struct Contact;
//! impl Contact {
//!     const NAME: Field<Text> = Field::new("Name");
//!     const AGE: Field<Integer> = Field::new("Age");
//! }
//!
//! assert_eq!(Contact::AGE.gte(21).to_string(), "{Age}>=21");
//! assert_eq!(Contact::NAME.name(), "Name");
//! ```

use super::Model;
use crate::error::{AirtableError, Result};
use crate::formulas::{field, Formula};
use crate::models::{AttachmentDict, Collaborator as CollaboratorDict};
use crate::utils::{date_to_iso_str, datetime_to_iso_str};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;
use std::marker::PhantomData;

/// Conversion between a JSON cell value and a Rust value
pub trait FieldKind {
    /// Rust type of a present cell value
    type Value;
    /// What [`Field::get`] returns
    type Output;
    /// Human-readable expected type, used in decode errors
    const TYPE_NAME: &'static str;
    /// Computed fields cannot be written
    const READ_ONLY: bool = false;
    /// Required fields fail with [`AirtableError::MissingValue`] when empty
    const REQUIRED: bool = false;

    /// Decode a non-null cell value; `None` signals a type mismatch
    fn decode(value: &Json) -> Option<Self::Value>;

    /// Encode a value for the API
    fn encode(value: &Self::Value) -> Json;

    /// Shape a possibly-empty cell into the getter's output
    fn output(field: &str, value: Option<Self::Value>) -> Result<Self::Output>;
}

fn decode_serde<T: DeserializeOwned>(value: &Json) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

fn encode_serde<T: Serialize>(value: &T) -> Json {
    serde_json::to_value(value).unwrap_or(Json::Null)
}

macro_rules! field_kinds {
    (@output option $value:ty) => { Option<$value> };
    (@output list $value:ty) => { $value };
    (@wrap option $v:ident) => { $v };
    (@wrap list $v:ident) => { $v.unwrap_or_default() };
    ($( $(#[$doc:meta])* $kind:ident => $value:ty, $name:literal, read_only = $ro:literal, $shape:ident; )*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $kind;

            impl FieldKind for $kind {
                type Value = $value;
                type Output = field_kinds!(@output $shape $value);
                const TYPE_NAME: &'static str = $name;
                const READ_ONLY: bool = $ro;

                fn decode(value: &Json) -> Option<$value> {
                    decode_serde(value)
                }

                fn encode(value: &$value) -> Json {
                    encode_serde(value)
                }

                fn output(_field: &str, value: Option<$value>) -> Result<Self::Output> {
                    Ok(field_kinds!(@wrap $shape value))
                }
            }
        )*
    };
}

field_kinds! {
    /// Single line text
    Text => String, "text", read_only = false, option;
    /// Email address
    Email => String, "email", read_only = false, option;
    /// URL
    Url => String, "url", read_only = false, option;
    /// Phone number
    PhoneNumber => String, "phone number", read_only = false, option;
    /// Long text with markdown formatting
    RichText => String, "rich text", read_only = false, option;
    /// Decimal number
    Number => f64, "number", read_only = false, option;
    /// Whole number
    Integer => i64, "integer", read_only = false, option;
    /// Decimal number
    Float => f64, "float", read_only = false, option;
    /// Star rating (1 to 10)
    Rating => i64, "rating", read_only = false, option;
    /// Percentage, stored as a fraction (`0.5` is 50%)
    Percent => f64, "percent", read_only = false, option;
    /// Currency amount
    Currency => f64, "currency", read_only = false, option;
    /// Single select option name
    Select => String, "select option", read_only = false, option;
    /// Multiple select option names
    MultipleSelect => Vec<String>, "list of select options", read_only = false, list;
    /// Attachments
    Attachments => Vec<AttachmentDict>, "list of attachments", read_only = false, list;
    /// Linked record ids
    Link => Vec<String>, "list of record ids", read_only = false, list;
    /// A single user
    Collaborator => CollaboratorDict, "collaborator", read_only = false, option;
    /// Several users
    MultipleCollaborators => Vec<CollaboratorDict>, "list of collaborators", read_only = false, list;
    /// Barcode
    Barcode => BarcodeDict, "barcode", read_only = false, option;

    /// Auto-incrementing number
    AutoNumber => i64, "integer", read_only = true, option;
    /// Count of linked records
    Count => i64, "integer", read_only = true, option;
    /// Values looked up from linked records
    Lookup => Vec<Json>, "list", read_only = true, list;
    /// Button
    Button => ButtonDict, "button", read_only = true, option;
    /// User who created the record
    CreatedBy => CollaboratorDict, "collaborator", read_only = true, option;
    /// User who last modified the record
    LastModifiedBy => CollaboratorDict, "collaborator", read_only = true, option;
}

/// Checkbox; an empty cell reads as `false`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkbox;

impl FieldKind for Checkbox {
    type Value = bool;
    type Output = bool;
    const TYPE_NAME: &'static str = "boolean";

    fn decode(value: &Json) -> Option<bool> {
        value.as_bool()
    }

    fn encode(value: &bool) -> Json {
        Json::Bool(*value)
    }

    fn output(_field: &str, value: Option<bool>) -> Result<bool> {
        Ok(value.unwrap_or(false))
    }
}

/// Calendar date, sent as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date;

impl FieldKind for Date {
    type Value = NaiveDate;
    type Output = Option<NaiveDate>;
    const TYPE_NAME: &'static str = "date";

    fn decode(value: &Json) -> Option<NaiveDate> {
        value.as_str().and_then(|s| crate::utils::date_from_iso_str(s).ok())
    }

    fn encode(value: &NaiveDate) -> Json {
        Json::String(date_to_iso_str(value))
    }

    fn output(_field: &str, value: Option<NaiveDate>) -> Result<Option<NaiveDate>> {
        Ok(value)
    }
}

macro_rules! datetime_kinds {
    ($( $(#[$doc:meta])* $kind:ident, read_only = $ro:literal; )*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $kind;

            impl FieldKind for $kind {
                type Value = DateTime<Utc>;
                type Output = Option<DateTime<Utc>>;
                const TYPE_NAME: &'static str = "datetime";
                const READ_ONLY: bool = $ro;

                fn decode(value: &Json) -> Option<DateTime<Utc>> {
                    value
                        .as_str()
                        .and_then(|s| crate::utils::datetime_from_iso_str(s).ok())
                }

                fn encode(value: &DateTime<Utc>) -> Json {
                    Json::String(datetime_to_iso_str(value))
                }

                fn output(_field: &str, value: Option<DateTime<Utc>>) -> Result<Self::Output> {
                    Ok(value)
                }
            }
        )*
    };
}

datetime_kinds! {
    /// Date and time, sent as ISO 8601 in UTC
    Datetime, read_only = false;
    /// Creation time of the record
    CreatedTime, read_only = true;
    /// Last modification time of the record
    LastModifiedTime, read_only = true;
}

/// Duration, stored by Airtable as a number of seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration;

impl FieldKind for Duration {
    type Value = std::time::Duration;
    type Output = Option<std::time::Duration>;
    const TYPE_NAME: &'static str = "duration in seconds";

    fn decode(value: &Json) -> Option<std::time::Duration> {
        value
            .as_f64()
            .and_then(|secs| std::time::Duration::try_from_secs_f64(secs).ok())
    }

    fn encode(value: &std::time::Duration) -> Json {
        serde_json::json!(value.as_secs_f64())
    }

    fn output(_field: &str, value: Option<std::time::Duration>) -> Result<Self::Output> {
        Ok(value)
    }
}

/// Wraps a kind so that an empty cell is an error instead of `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Required<K>(PhantomData<K>);

impl<K: FieldKind> FieldKind for Required<K> {
    type Value = K::Value;
    type Output = K::Value;
    const TYPE_NAME: &'static str = K::TYPE_NAME;
    const READ_ONLY: bool = K::READ_ONLY;
    const REQUIRED: bool = true;

    fn decode(value: &Json) -> Option<K::Value> {
        K::decode(value)
    }

    fn encode(value: &K::Value) -> Json {
        K::encode(value)
    }

    fn output(field: &str, value: Option<K::Value>) -> Result<K::Value> {
        value.ok_or_else(|| AirtableError::MissingValue(field.to_string()))
    }
}

/// Barcode cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeDict {
    pub text: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub barcode_type: Option<String>,
}

/// Button cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonDict {
    pub label: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// What a model knows about one of its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub type_name: &'static str,
    pub read_only: bool,
    pub required: bool,
}

/// Descriptor for one field of a [`Model`]
pub struct Field<K> {
    name: &'static str,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Field<K> {
    /// Declare a field by its Airtable name (or id, with `use_field_ids`)
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _kind: PhantomData,
        }
    }

    /// Airtable field name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<K> Clone for Field<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Field<K> {}

impl<K> fmt::Debug for Field<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

impl<K: FieldKind> Field<K> {
    /// Metadata about this field
    pub fn def(&self) -> FieldDef {
        FieldDef {
            name: self.name,
            type_name: K::TYPE_NAME,
            read_only: K::READ_ONLY,
            required: K::REQUIRED,
        }
    }

    /// Read the field from a model instance
    pub fn get<M: Model>(&self, model: &M) -> Result<K::Output> {
        let value = match model.record().fields.get(self.name) {
            None | Some(Json::Null) => None,
            Some(json) => Some(K::decode(json).ok_or_else(|| AirtableError::FieldType {
                field: self.name.to_string(),
                expected: K::TYPE_NAME.to_string(),
            })?),
        };
        K::output(self.name, value)
    }

    /// Write the field on a model instance
    pub fn set<M: Model>(&self, model: &mut M, value: K::Value) -> Result<()> {
        if K::READ_ONLY {
            return Err(AirtableError::ReadOnlyField(self.name.to_string()));
        }
        model
            .record_mut()
            .fields
            .insert(self.name.to_string(), K::encode(&value));
        Ok(())
    }

    /// Empty the field on a model instance
    pub fn clear<M: Model>(&self, model: &mut M) -> Result<()> {
        if K::READ_ONLY {
            return Err(AirtableError::ReadOnlyField(self.name.to_string()));
        }
        if K::REQUIRED {
            return Err(AirtableError::MissingValue(self.name.to_string()));
        }
        model.record_mut().fields.remove(self.name);
        Ok(())
    }

    /// `{Field}=value`
    pub fn eq(&self, value: impl Into<Formula>) -> Formula {
        Formula::from(self).equals(value)
    }

    /// `{Field}!=value`
    pub fn ne(&self, value: impl Into<Formula>) -> Formula {
        Formula::from(self).not_equals(value)
    }

    /// `{Field}>value`
    pub fn gt(&self, value: impl Into<Formula>) -> Formula {
        Formula::from(self).gt(value)
    }

    /// `{Field}>=value`
    pub fn gte(&self, value: impl Into<Formula>) -> Formula {
        Formula::from(self).gte(value)
    }

    /// `{Field}<value`
    pub fn lt(&self, value: impl Into<Formula>) -> Formula {
        Formula::from(self).lt(value)
    }

    /// `{Field}<=value`
    pub fn lte(&self, value: impl Into<Formula>) -> Formula {
        Formula::from(self).lte(value)
    }
}

impl<K> From<&Field<K>> for Formula {
    fn from(value: &Field<K>) -> Self {
        field(value.name)
    }
}

impl<K> From<Field<K>> for Formula {
    fn from(value: Field<K>) -> Self {
        field(value.name)
    }
}
