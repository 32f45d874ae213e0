//! Utility helpers
//!
//! Date/time conversion in the formats Airtable reads and writes, record and
//! base id checks, and small collection helpers.

use crate::error::{AirtableError, Result};
use crate::models::AttachmentDict;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a datetime the way Airtable returns it: `2023-12-01T12:34:56.000Z`
pub fn datetime_to_iso_str(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO 8601 timestamp returned by Airtable
pub fn datetime_from_iso_str(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AirtableError::InvalidParameter(format!("invalid datetime {value:?}: {e}")))
}

/// Format a date as `YYYY-MM-DD`
pub fn date_to_iso_str(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date
pub fn date_from_iso_str(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AirtableError::InvalidParameter(format!("invalid date {value:?}: {e}")))
}

/// Build an attachment value for creating or updating a record
pub fn attachment(url: impl Into<String>, filename: Option<&str>) -> AttachmentDict {
    AttachmentDict {
        url: url.into(),
        filename: filename.map(str::to_string),
        ..AttachmentDict::default()
    }
}

/// Split a slice into chunks of at most `size` items
pub fn chunked<T>(items: &[T], size: usize) -> impl Iterator<Item = &[T]> {
    items.chunks(size.max(1))
}

fn has_id_shape(value: &str, prefix: &str) -> bool {
    value.len() == 17
        && value.starts_with(prefix)
        && value[prefix.len()..].chars().all(|c| c.is_ascii_alphanumeric())
}

/// Whether the value looks like a record id (`rec` + 14 characters)
pub fn is_record_id(value: &str) -> bool {
    has_id_shape(value, "rec")
}

/// Whether the value looks like a base id (`app...`)
pub fn is_base_id(value: &str) -> bool {
    has_id_shape(value, "app")
}

/// Whether the value looks like a table id (`tbl...`)
pub fn is_table_id(value: &str) -> bool {
    has_id_shape(value, "tbl")
}

/// Whether the value looks like a field id (`fld...`)
pub fn is_field_id(value: &str) -> bool {
    has_id_shape(value, "fld")
}

/// Whether the value looks like a user id (`usr...`)
pub fn is_user_id(value: &str) -> bool {
    has_id_shape(value, "usr")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_round_trip() {
        let dt = Utc.with_ymd_and_hms(2023, 12, 1, 12, 34, 56).unwrap();
        let text = datetime_to_iso_str(&dt);
        assert_eq!(text, "2023-12-01T12:34:56.000Z");
        assert_eq!(datetime_from_iso_str(&text).unwrap(), dt);
        assert!(datetime_from_iso_str("yesterday").is_err());
    }

    #[test]
    fn test_date_parsing() {
        let date = date_from_iso_str("2023-12-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(date_to_iso_str(&date), "2023-12-01");
        assert!(date_from_iso_str("12/01/2023").is_err());
    }

    #[test]
    fn test_id_checks() {
        assert!(is_record_id("rec0123456789abcd"));
        assert!(!is_record_id("rec123"));
        assert!(!is_record_id("app0123456789abcd"));
        assert!(is_base_id("appABCDEFGHIJKLMN"));
        assert!(is_table_id("tblABCDEFGHIJKLMN"));
        assert!(is_field_id("fldABCDEFGHIJKLMN"));
        assert!(is_user_id("usrABCDEFGHIJKLMN"));
        assert!(!is_table_id("Contacts"));
    }

    #[test]
    fn test_chunked() {
        let items: Vec<u32> = (0..25).collect();
        let sizes: Vec<usize> = chunked(&items, 10).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn test_attachment() {
        let a = attachment("https://example.com/a.png", Some("a.png"));
        assert_eq!(a.url, "https://example.com/a.png");
        assert_eq!(a.filename.as_deref(), Some("a.png"));
        assert!(a.id.is_none());
    }
}
