//! Request parameters
//!
//! Options for listing records, and the definitions sent when creating
//! tables and fields.
//!
//! Record list options can be encoded two ways: as a GET query string
//! (`fields[]=A&sort[0][field]=B`) or as the JSON body of
//! `POST .../listRecords`, which is used when the URL would be too long.

use crate::formulas::Formula;
use crate::models::FieldType;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortField {
    pub field: String,
    pub direction: Direction,
}

impl SortField {
    /// Parse `"Name"` (ascending) or `"-Name"` (descending)
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                direction: Direction::Desc,
            },
            None => Self {
                field: spec.to_string(),
                direction: Direction::Asc,
            },
        }
    }
}

/// Cell value format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    Json,
    String,
}

impl CellFormat {
    fn as_str(&self) -> &'static str {
        match self {
            CellFormat::Json => "json",
            CellFormat::String => "string",
        }
    }
}

/// Options for reading records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    /// View name or id; records are filtered and sorted by the view
    pub view: Option<String>,
    /// Records per page (max 100)
    pub page_size: Option<u32>,
    /// Total number of records to return
    pub max_records: Option<u32>,
    /// Only return these fields
    pub fields: Vec<String>,
    /// Sort keys, applied in order
    pub sort: Vec<SortField>,
    /// `filterByFormula`
    pub formula: Option<String>,
    /// Cell format (`string` requires `time_zone` and `user_locale`)
    pub cell_format: Option<CellFormat>,
    pub user_locale: Option<String>,
    pub time_zone: Option<String>,
    /// Key returned fields by field id instead of name
    pub return_fields_by_field_id: Option<bool>,
    /// Include `commentCount` on each record
    pub comment_count: bool,
}

impl RecordQuery {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the view
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Set the page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Set the maximum number of records
    pub fn with_max_records(mut self, max_records: u32) -> Self {
        self.max_records = Some(max_records);
        self
    }

    /// Restrict the returned fields
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sort by `"Field"` or `"-Field"` specs
    pub fn with_sort(mut self, sort: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.sort = sort
            .into_iter()
            .map(|s| SortField::parse(s.as_ref()))
            .collect();
        self
    }

    /// Filter with a formula
    pub fn with_formula(mut self, formula: impl Into<Formula>) -> Self {
        self.formula = Some(formula.into().to_string());
        self
    }

    /// Set the cell format
    pub fn with_cell_format(mut self, cell_format: CellFormat) -> Self {
        self.cell_format = Some(cell_format);
        self
    }

    /// Set the user locale used with the `string` cell format
    pub fn with_user_locale(mut self, locale: impl Into<String>) -> Self {
        self.user_locale = Some(locale.into());
        self
    }

    /// Set the time zone used with the `string` cell format
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Key fields by id
    pub fn with_field_ids(mut self, enabled: bool) -> Self {
        self.return_fields_by_field_id = Some(enabled);
        self
    }

    /// Request comment counts
    pub fn with_comment_count(mut self) -> Self {
        self.comment_count = true;
        self
    }

    /// Encode as GET query parameters
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(view) = &self.view {
            pairs.push(("view".to_string(), view.clone()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("pageSize".to_string(), page_size.to_string()));
        }
        if let Some(max_records) = self.max_records {
            pairs.push(("maxRecords".to_string(), max_records.to_string()));
        }
        for field in &self.fields {
            pairs.push(("fields[]".to_string(), field.clone()));
        }
        for (i, sort) in self.sort.iter().enumerate() {
            pairs.push((format!("sort[{}][field]", i), sort.field.clone()));
            pairs.push((
                format!("sort[{}][direction]", i),
                sort.direction.as_str().to_string(),
            ));
        }
        if let Some(formula) = &self.formula {
            pairs.push(("filterByFormula".to_string(), formula.clone()));
        }
        if let Some(cell_format) = self.cell_format {
            pairs.push(("cellFormat".to_string(), cell_format.as_str().to_string()));
        }
        if let Some(locale) = &self.user_locale {
            pairs.push(("userLocale".to_string(), locale.clone()));
        }
        if let Some(tz) = &self.time_zone {
            pairs.push(("timeZone".to_string(), tz.clone()));
        }
        if let Some(by_id) = self.return_fields_by_field_id {
            pairs.push(("returnFieldsByFieldId".to_string(), by_id.to_string()));
        }
        if self.comment_count {
            pairs.push(("recordMetadata[]".to_string(), "commentCount".to_string()));
        }
        pairs
    }

    /// Encode as the JSON body of `POST .../listRecords`
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(view) = &self.view {
            body.insert("view".into(), json!(view));
        }
        if let Some(page_size) = self.page_size {
            body.insert("pageSize".into(), json!(page_size));
        }
        if let Some(max_records) = self.max_records {
            body.insert("maxRecords".into(), json!(max_records));
        }
        if !self.fields.is_empty() {
            body.insert("fields".into(), json!(self.fields));
        }
        if !self.sort.is_empty() {
            body.insert("sort".into(), json!(self.sort));
        }
        if let Some(formula) = &self.formula {
            body.insert("filterByFormula".into(), json!(formula));
        }
        if let Some(cell_format) = self.cell_format {
            body.insert("cellFormat".into(), json!(cell_format));
        }
        if let Some(locale) = &self.user_locale {
            body.insert("userLocale".into(), json!(locale));
        }
        if let Some(tz) = &self.time_zone {
            body.insert("timeZone".into(), json!(tz));
        }
        if let Some(by_id) = self.return_fields_by_field_id {
            body.insert("returnFieldsByFieldId".into(), json!(by_id));
        }
        if self.comment_count {
            body.insert("recordMetadata".into(), json!(["commentCount"]));
        }
        Value::Object(body)
    }
}

/// Definition of a field to create
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl FieldSpec {
    /// Create a field definition
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
            options: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set type-specific options
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}

/// Definition of a table to create
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The first field becomes the primary field
    pub fields: Vec<FieldSpec>,
}

impl TableSpec {
    /// Create a table definition
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulas::field;

    #[test]
    fn test_sort_parsing() {
        assert_eq!(SortField::parse("Name").direction, Direction::Asc);
        let desc = SortField::parse("-Created");
        assert_eq!(desc.field, "Created");
        assert_eq!(desc.direction, Direction::Desc);
    }

    #[test]
    fn test_query_pairs() {
        let query = RecordQuery::new()
            .with_view("Grid view")
            .with_page_size(50)
            .with_fields(["Name", "Age"])
            .with_sort(["-Age", "Name"])
            .with_formula(field("Age").gt(21))
            .with_comment_count();

        let pairs = query.to_query_pairs();
        let get = |k: &str| -> Vec<&str> {
            pairs
                .iter()
                .filter(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
                .collect()
        };

        assert_eq!(get("view"), vec!["Grid view"]);
        assert_eq!(get("pageSize"), vec!["50"]);
        assert_eq!(get("fields[]"), vec!["Name", "Age"]);
        assert_eq!(get("sort[0][field]"), vec!["Age"]);
        assert_eq!(get("sort[0][direction]"), vec!["desc"]);
        assert_eq!(get("sort[1][direction]"), vec!["asc"]);
        assert_eq!(get("filterByFormula"), vec!["{Age}>21"]);
        assert_eq!(get("recordMetadata[]"), vec!["commentCount"]);
    }

    #[test]
    fn test_json_body() {
        let query = RecordQuery::new()
            .with_max_records(5)
            .with_fields(["Name"])
            .with_sort(["-Name"])
            .with_cell_format(CellFormat::String)
            .with_field_ids(true);

        assert_eq!(
            query.to_json(),
            json!({
                "maxRecords": 5,
                "fields": ["Name"],
                "sort": [{"field": "Name", "direction": "desc"}],
                "cellFormat": "string",
                "returnFieldsByFieldId": true
            })
        );
        assert_eq!(RecordQuery::new().to_json(), json!({}));
    }

    #[test]
    fn test_field_spec_serialization() {
        let spec = TableSpec::new(
            "Contacts",
            vec![
                FieldSpec::new("Name", FieldType::SingleLineText),
                FieldSpec::new("Age", FieldType::Number).with_options(json!({"precision": 0})),
            ],
        );
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "name": "Contacts",
                "fields": [
                    {"name": "Name", "type": "singleLineText"},
                    {"name": "Age", "type": "number", "options": {"precision": 0}}
                ]
            })
        );
    }
}
