//! ORM
//!
//! Map a Rust type onto the records of one table. A model stores a
//! [`RecordState`] and declares its fields as [`Field`] constants; the
//! [`Model`] trait supplies save, fetch, delete and query operations.
//!
//! ```no_run
//! use airtable_kit::api::RecordQuery;
//! use airtable_kit::orm::{Field, FieldDef, Integer, Model, ModelMeta, RecordState, Required, Text};
//! use std::sync::OnceLock;
//!
//! struct Contact {
//!     state: RecordState,
//! }
//!
//! impl Contact {
//!     const NAME: Field<Required<Text>> = Field::new("Name");
//!     const AGE: Field<Integer> = Field::new("Age");
//! }
//!
//! impl Model for Contact {
//!     fn meta() -> &'static ModelMeta {
//!         static META: OnceLock<ModelMeta> = OnceLock::new();
//!         META.get_or_init(|| ModelMeta::new("appXXXXXXXXXXXXXX", "Contacts", "patXXX"))
//!     }
//!     fn field_defs() -> Vec<FieldDef> {
//!         vec![Self::NAME.def(), Self::AGE.def()]
//!     }
//!     fn record(&self) -> &RecordState {
//!         &self.state
//!     }
//!     fn record_mut(&mut self) -> &mut RecordState {
//!         &mut self.state
//!     }
//!     fn from_state(state: RecordState) -> Self {
//!         Self { state }
//!     }
//! }
//!
//! # async fn run() -> airtable_kit::error::Result<()> {
//! let mut contact = Contact::from_state(RecordState::new());
//! Contact::NAME.set(&mut contact, "Alice".to_string())?;
//! contact.save(false).await?;
//!
//! let adults = Contact::all(&RecordQuery::new().with_formula(Contact::AGE.gte(18))).await?;
//! # Ok(())
//! # }
//! ```

pub mod fields;
pub mod model;

// Re-exports
pub use fields::{
    Attachments, AutoNumber, Barcode, BarcodeDict, Button, ButtonDict, Checkbox, Collaborator,
    Count, CreatedBy, CreatedTime, Currency, Date, Datetime, Duration, Email, Field, FieldDef,
    FieldKind, Float, Integer, LastModifiedBy, LastModifiedTime, Link, Lookup, MultipleCollaborators,
    MultipleSelect, Number, Percent, PhoneNumber, Rating, Required, RichText, Select, Text, Url,
};
pub use model::{Model, ModelMeta, RecordState, SaveResult};
