//! Identifier resolution
//!
//! An all-digit identifier is always an id. Anything else is a name, looked
//! up by listing with a `name` filter and keeping exact matches.

use crate::api::{ApiRequest, ResourceEndpoint};
use crate::error::{CommandError, CommandResult};
use crate::resource::ResourceDescriptor;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier<'a> {
    Id(&'a str),
    Name(&'a str),
}

pub fn is_numeric_id(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Decide whether `raw` is an id or a name for `descriptor`
pub fn classify<'a>(descriptor: &ResourceDescriptor, raw: &'a str) -> CommandResult<Identifier<'a>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CommandError::Validation(format!(
            "{} id or name is required",
            descriptor.label
        )));
    }

    if is_numeric_id(raw) {
        Ok(Identifier::Id(raw))
    } else if descriptor.has_name {
        Ok(Identifier::Name(raw))
    } else {
        Err(CommandError::Validation(format!(
            "{} must be referenced by numeric id, got '{}'",
            descriptor.label, raw
        )))
    }
}

/// List request that finds records named `name`
pub fn lookup_request(endpoint: &ResourceEndpoint, name: &str) -> ApiRequest {
    endpoint.list(vec![
        ("name".to_string(), name.to_string()),
        ("max".to_string(), "-1".to_string()),
    ])
}

/// Pick the single record whose name equals `name` from a lookup response
pub fn match_by_name(
    descriptor: &ResourceDescriptor,
    response: &Value,
    name: &str,
) -> CommandResult<Value> {
    let mut matches: Vec<&Value> = response
        .get(&descriptor.list_key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter(|item| item.get("name").and_then(|n| n.as_str()) == Some(name))
                .collect()
        })
        .unwrap_or_default();

    match matches.len() {
        0 => Err(CommandError::NotFound(format!(
            "{} not found by name '{}'",
            descriptor.label, name
        ))),
        1 => Ok(matches.remove(0).clone()),
        _ => Err(CommandError::AmbiguousName {
            label: descriptor.label.clone(),
            name: name.to_string(),
            matches: matches
                .iter()
                .map(|m| {
                    format!(
                        "ID: {} Name: {}",
                        record_id(m).unwrap_or_else(|| "-".to_string()),
                        name
                    )
                })
                .collect(),
        }),
    }
}

/// The `id` of a record as a path segment
pub fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
