//! Output rendering
//!
//! Renders records as a table or detail view driven by column definitions,
//! or as raw JSON, YAML or CSV. [`Console`] owns the output streams so the
//! driver can be exercised against in-memory buffers.

use crate::error::CommandResult;
use crate::resource::payload::select_fields;
use crate::resource::{ColumnDef, ResourceDescriptor};
use colored::Colorize;
use comfy_table::{presets, ContentArrangement, Table};
use serde_json::{json, Value};
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
    Csv,
}

impl OutputFormat {
    /// Pick the format from the mutually exclusive `--json`/`--yaml`/`--csv` flags
    pub fn from_flags(json: bool, yaml: bool, csv: bool) -> Self {
        if json {
            OutputFormat::Json
        } else if yaml {
            OutputFormat::Yaml
        } else if csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Table
        }
    }
}

/// Destination for command output and error lines
pub struct Console {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl Console {
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self { out, err }
    }

    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Console writing into shared buffers, returned as `(console, stdout, stderr)`
    pub fn captured() -> (Self, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let console = Self::new(Box::new(out.clone()), Box::new(err.clone()));
        (console, out, err)
    }

    pub fn print(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()
    }

    /// Print a red `error:` line to stderr
    pub fn error(&mut self, msg: impl Display) {
        let _ = writeln!(self.err, "{}: {}", "error".red().bold(), msg);
    }
}

/// Cloneable in-memory writer
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::other("output buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Columns to show: `--fields` when given, else the descriptor's columns
fn effective_columns(defaults: &[ColumnDef], fields: &[String]) -> Vec<ColumnDef> {
    if fields.is_empty() {
        defaults.to_vec()
    } else {
        fields.iter().map(|f| ColumnDef::for_field(f)).collect()
    }
}

/// Render a list response (`{list_key: [...], meta: {...}}`)
pub fn render_list(
    descriptor: &ResourceDescriptor,
    response: &Value,
    format: OutputFormat,
    fields: &[String],
) -> CommandResult<String> {
    let items: &[Value] = response
        .get(&descriptor.list_key)
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[]);

    match format {
        OutputFormat::Json | OutputFormat::Yaml if !fields.is_empty() => {
            let selected: Vec<Value> = items.iter().map(|i| select_fields(i, fields)).collect();
            render_value(&json!({ descriptor.list_key.as_str(): selected }), format)
        }
        OutputFormat::Json | OutputFormat::Yaml => render_value(response, format),
        OutputFormat::Csv => {
            let columns = effective_columns(&descriptor.list_columns, fields);
            render_csv(&columns, items)
        }
        OutputFormat::Table => {
            let columns = effective_columns(&descriptor.list_columns, fields);
            let mut rendered = render_table(&columns, items);
            if let Some(footer) = viewing_footer(descriptor, response.get("meta"), items.len()) {
                rendered.push('\n');
                rendered.push_str(&footer);
            }
            Ok(rendered)
        }
    }
}

/// Render one record in the detail view or as raw data
pub fn render_record(
    descriptor: &ResourceDescriptor,
    record: &Value,
    format: OutputFormat,
    fields: &[String],
) -> CommandResult<String> {
    let record = if fields.is_empty() {
        record.clone()
    } else {
        select_fields(record, fields)
    };

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            render_value(&json!({ descriptor.object_key.as_str(): record }), format)
        }
        OutputFormat::Csv => {
            let columns = effective_columns(descriptor.detail_columns(), fields);
            render_csv(&columns, std::slice::from_ref(&record))
        }
        OutputFormat::Table => {
            let columns = effective_columns(descriptor.detail_columns(), fields);
            let title = format!("{} Details", descriptor.label);
            Ok(format!(
                "{}\n{}\n{}",
                title,
                "=".repeat(title.len()),
                render_details(&columns, &record)
            ))
        }
    }
}

/// Raw JSON or YAML dump; table and CSV fall back to pretty JSON
pub fn render_value(value: &Value, format: OutputFormat) -> CommandResult<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?.trim_end().to_string()),
        _ => Ok(serde_json::to_string_pretty(value)?),
    }
}

/// Table of records, one row per record
pub fn render_table(columns: &[ColumnDef], items: &[Value]) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns.iter().map(|c| c.label.clone()));

    for item in items {
        table.add_row(columns.iter().map(|c| c.value(item)));
    }

    table.to_string()
}

/// `Label: value` lines with right-aligned labels
pub fn render_details(columns: &[ColumnDef], record: &Value) -> String {
    let width = columns.iter().map(|c| c.label.len()).max().unwrap_or(0);
    columns
        .iter()
        .map(|c| format!("{:>width$}: {}", c.label, c.value(record), width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_csv(columns: &[ColumnDef], items: &[Value]) -> CommandResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|c| c.label.as_str()))?;
    for item in items {
        writer.write_record(columns.iter().map(|c| c.value(item)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::CommandError::Output(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).trim_end().to_string())
}

/// "Viewing 1-25 of 40 Backups" when the response carries paging metadata
fn viewing_footer(descriptor: &ResourceDescriptor, meta: Option<&Value>, shown: usize) -> Option<String> {
    let meta = meta?;
    let total = meta.get("total").and_then(|v| v.as_u64())?;
    if shown == 0 {
        return None;
    }
    let offset = meta.get("offset").and_then(|v| v.as_u64()).unwrap_or(0);
    Some(format!(
        "Viewing {}-{} of {} {}",
        offset + 1,
        offset + shown as u64,
        total,
        descriptor.label_plural
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::registry;

    fn backups() -> &'static ResourceDescriptor {
        registry().get("backups").unwrap()
    }

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false, false), OutputFormat::Table);
        assert_eq!(OutputFormat::from_flags(true, false, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, false, true), OutputFormat::Csv);
    }

    #[test]
    fn test_table_contains_headers_and_values() {
        let response = json!({
            "backups": [{"id": 3, "name": "nightly-db"}],
            "meta": {"total": 1, "offset": 0}
        });
        let rendered = render_list(backups(), &response, OutputFormat::Table, &[]).unwrap();
        assert!(rendered.contains("ID"));
        assert!(rendered.contains("nightly-db"));
        assert!(rendered.ends_with("Viewing 1-1 of 1 Backups"));
    }

    #[test]
    fn test_fields_limit_json_output() {
        let record = json!({"id": 3, "name": "nightly-db", "enabled": true});
        let rendered = render_record(
            backups(),
            &record,
            OutputFormat::Json,
            &["name".to_string()],
        )
        .unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, json!({"backup": {"name": "nightly-db"}}));
    }

    #[test]
    fn test_csv_quotes_values() {
        let columns = vec![ColumnDef::for_field("id"), ColumnDef::for_field("name")];
        let rendered = render_csv(&columns, &[json!({"id": 1, "name": "a, b"})]).unwrap();
        assert_eq!(rendered, "id,name\n1,\"a, b\"");
    }

    #[test]
    fn test_details_align_labels() {
        let columns = vec![ColumnDef::for_field("id"), ColumnDef::for_field("name")];
        let rendered = render_details(&columns, &json!({"id": 9, "name": "x"}));
        assert_eq!(rendered, "  id: 9\nname: x");
    }

    #[test]
    fn test_yaml_output() {
        let rendered = render_value(&json!({"id": 1}), OutputFormat::Yaml).unwrap();
        assert_eq!(rendered, "id: 1");
    }

    #[test]
    fn test_captured_console() {
        let (mut console, out, err) = Console::captured();
        console.print("hello").unwrap();
        console.error("boom");
        assert_eq!(out.contents(), "hello\n");
        assert!(err.contents().contains("boom"));
    }
}
