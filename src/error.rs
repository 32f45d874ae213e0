//! Error types for airtable-kit
//!
//! This module defines the error types used throughout the library.

use thiserror::Error;

/// Result type alias for airtable-kit
pub type Result<T> = std::result::Result<T, AirtableError>;

/// Main error type for airtable-kit
#[derive(Error, Debug)]
pub enum AirtableError {
    /// Transport-level HTTP errors (connection, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error response returned by the Airtable API
    #[error("Airtable API error ({status}) {error_type}: {message}")]
    Api {
        status: u16,
        error_type: String,
        message: String,
    },

    /// Invalid argument passed to a client method
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid HTTP header name or value
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required ORM field has no value
    #[error("Missing value for required field: {0}")]
    MissingValue(String),

    /// Attempt to write a computed or otherwise read-only field
    #[error("Field is read-only: {0}")]
    ReadOnlyField(String),

    /// Cell value did not match the type expected by an ORM field
    #[error("Field {field} expected {expected}")]
    FieldType { field: String, expected: String },

    /// Webhook notification MAC did not match
    #[error("Webhook signature does not match the request body")]
    InvalidSignature,

    /// Formula construction errors
    #[error("Formula error: {0}")]
    Formula(String),

    /// Operation requires a record that has been saved
    #[error("Record has not been saved to Airtable")]
    UnsavedRecord,
}

impl AirtableError {
    /// HTTP status of the failed request, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            AirtableError::Api { status, .. } => Some(*status),
            AirtableError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error is a 404 from the API
    pub fn is_not_found(&self) -> bool {
        matches!(self, AirtableError::NotFound(_)) || self.status() == Some(404)
    }

    /// Whether the transport failed before a response arrived
    pub(crate) fn is_transient_transport(&self) -> bool {
        matches!(self, AirtableError::Http(e) if e.is_timeout() || e.is_connect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status() {
        let err = AirtableError::Api {
            status: 422,
            error_type: "INVALID_REQUEST_UNKNOWN".to_string(),
            message: "Invalid request".to_string(),
        };
        assert_eq!(err.status(), Some(422));
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Airtable API error (422) INVALID_REQUEST_UNKNOWN: Invalid request"
        );
    }

    #[test]
    fn test_not_found() {
        let err = AirtableError::Api {
            status: 404,
            error_type: "NOT_FOUND".to_string(),
            message: String::new(),
        };
        assert!(err.is_not_found());
        assert!(AirtableError::NotFound("rec".to_string()).is_not_found());
        assert_eq!(AirtableError::UnsavedRecord.status(), None);
    }
}
