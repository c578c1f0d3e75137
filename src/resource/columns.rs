//! Column definitions
//!
//! A column maps a display label to a JSON path in a record, optionally
//! passed through a named formatting function.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Named formatting functions a column can apply to its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatter {
    /// RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS UTC`
    Date,
    /// Byte count in human readable units
    Bytes,
    /// Boolean as Yes/No
    YesNo,
    /// Number of elements in an array
    Count,
    /// Comma separated `name` fields of an array of objects
    Names,
    /// Compact JSON
    Json,
}

impl Formatter {
    pub fn apply(&self, value: &Value) -> String {
        match self {
            Formatter::Date => match value.as_str() {
                Some(s) => format_timestamp(s),
                None => display_value(value),
            },
            Formatter::Bytes => match value {
                Value::Number(n) => n.as_u64().map(format_bytes).unwrap_or_else(|| n.to_string()),
                Value::String(s) => s
                    .parse::<u64>()
                    .map(format_bytes)
                    .unwrap_or_else(|_| s.clone()),
                other => display_value(other),
            },
            Formatter::YesNo => match value {
                Value::Bool(true) => "Yes".to_string(),
                Value::Bool(false) => "No".to_string(),
                Value::String(s) if s == "on" || s == "true" => "Yes".to_string(),
                Value::String(s) if s == "off" || s == "false" => "No".to_string(),
                Value::Null => "No".to_string(),
                other => display_value(other),
            },
            Formatter::Count => match value {
                Value::Array(items) => items.len().to_string(),
                Value::Null => "0".to_string(),
                other => display_value(other),
            },
            Formatter::Names => match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item.get("name") {
                        Some(name) => display_value(name),
                        None => display_value(item),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                other => display_value(other),
            },
            Formatter::Json => match value {
                Value::Null => String::new(),
                other => serde_json::to_string(other).unwrap_or_default(),
            },
        }
    }
}

/// Column definition from JSON
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnDef {
    pub label: String,
    /// Dot path into the record; absent means the formatter sees the whole record
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub format: Option<Formatter>,
}

impl ColumnDef {
    /// Column showing the raw value at `path`, labelled by the path itself
    pub fn for_field(path: &str) -> Self {
        Self {
            label: path.to_string(),
            field: Some(path.to_string()),
            format: None,
        }
    }

    /// Column showing the raw value at `path` under its own label
    pub fn labelled(label: &str, path: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::for_field(path)
        }
    }

    /// Render this column for one record
    pub fn value(&self, record: &Value) -> String {
        let value = match &self.field {
            Some(path) => lookup(record, path).unwrap_or(&Value::Null),
            None => record,
        };

        match self.format {
            Some(formatter) => formatter.apply(value),
            None => display_value(value),
        }
    }
}

/// Follow a dot path (numeric segments index arrays)
pub fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;

    for part in path.split('.') {
        current = match (current, part.parse::<usize>()) {
            (Value::Array(items), Ok(idx)) => items.get(idx)?,
            _ => current.get(part)?,
        };
    }

    Some(current)
}

/// Plain text rendering of a JSON value for tables and CSV
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => match map.get("name") {
            Some(name) => display_value(name),
            None => serde_json::to_string(value).unwrap_or_default(),
        },
    }
}

fn format_timestamp(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// Format bytes to human readable
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
