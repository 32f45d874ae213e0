//! Terminal output
//!
//! Renders API results as `comfy-table` tables, or as pretty JSON with
//! `--json`.

use crate::api::Base;
use crate::error::Result;
use crate::models::{BaseSchema, EnterpriseInfo, RecordDict, UserAndScopesInfo};
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

/// Print `value` as JSON, or as the table built by `render`
pub fn print<T, F>(value: &T, json: bool, render: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> Table,
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", render(value));
    }
    Ok(())
}

fn new_table<I, S>(headers: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .into_iter()
            .map(|h| Cell::new(Into::<String>::into(h)).add_attribute(Attribute::Bold)),
    );
    table
}

/// Render a cell value for display
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| cell_text(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Object(map)) => map
            .get("name")
            .or_else(|| map.get("filename"))
            .or_else(|| map.get("email"))
            .or_else(|| map.get("id"))
            .map(|v| cell_text(Some(v)))
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        Some(v) => v.to_string(),
    }
}

pub fn whoami_table(me: &UserAndScopesInfo) -> Table {
    let mut table = new_table(["User", "Email", "Scopes"]);
    table.add_row(vec![
        me.id.clone(),
        me.email.clone().unwrap_or_default(),
        me.scopes.as_ref().map(|s| s.join(" ")).unwrap_or_default(),
    ]);
    table
}

pub fn bases_table(bases: &[Base]) -> Table {
    let mut table = new_table(["Base", "Name", "Permission"]);
    for base in bases {
        table.add_row(vec![
            base.id().to_string(),
            base.name().unwrap_or_default().to_string(),
            base.permission_level().unwrap_or_default().to_string(),
        ]);
    }
    table
}

pub fn schema_table(schema: &BaseSchema) -> Table {
    let mut table = new_table(["Table", "Field", "Type", "Id"]);
    for t in &schema.tables {
        for f in &t.fields {
            let mut name = f.name.clone();
            if f.id == t.primary_field_id {
                name.push_str(" *");
            }
            table.add_row(vec![
                t.name.clone(),
                name,
                cell_text(serde_json::to_value(f.field_type).ok().as_ref()),
                f.id.clone(),
            ]);
        }
    }
    table
}

/// Records as rows; columns are `fields`, or every field seen when empty
pub fn records_table(records: &[RecordDict], fields: &[String]) -> Table {
    let columns: Vec<String> = if fields.is_empty() {
        let mut seen: Vec<String> = Vec::new();
        for record in records {
            for name in record.fields.keys() {
                if !seen.contains(name) {
                    seen.push(name.clone());
                }
            }
        }
        seen
    } else {
        fields.to_vec()
    };

    let mut table = new_table(std::iter::once("id".to_string()).chain(columns.iter().cloned()));
    for record in records {
        let mut row = vec![record.id.clone()];
        row.extend(columns.iter().map(|c| cell_text(record.fields.get(c))));
        table.add_row(row);
    }
    table
}

pub fn enterprise_table(info: &EnterpriseInfo) -> Table {
    let mut table = new_table(["Enterprise", "Users", "Groups", "Workspaces"]);
    table.add_row(vec![
        info.id.clone(),
        info.user_ids.len().to_string(),
        info.group_ids.len().to_string(),
        info.workspace_ids.len().to_string(),
    ]);
    table
}
