//! Payload building from `field=value` assignments and dot paths

use super::columns::lookup;
use super::option_types::{InputType, OptionType};
use crate::error::{CommandError, CommandResult};
use serde_json::{Map, Value};

/// One `field=value` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub path: String,
    pub raw: String,
}

/// Parse `field=value` arguments; the value may itself contain `=`
pub fn parse_assignments(args: &[String]) -> CommandResult<Vec<Assignment>> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((path, raw)) if !path.trim().is_empty() => Ok(Assignment {
                path: path.trim().to_string(),
                raw: raw.to_string(),
            }),
            _ => Err(CommandError::Validation(format!(
                "expected FIELD=VALUE, got '{}'",
                arg
            ))),
        })
        .collect()
}

/// Hand each option the assignment addressing it, removing claimed ones
///
/// Exact dot paths are matched across all options before any bare field
/// name, so `name=x` goes to a root `name` even when a `config.name` option
/// comes first. The result is parallel to `options`.
pub fn claim_assignments(
    assignments: &mut Vec<Assignment>,
    options: &[&OptionType],
) -> Vec<Option<Assignment>> {
    let mut claimed: Vec<Option<Assignment>> = vec![None; options.len()];

    for (slot, option) in claimed.iter_mut().zip(options) {
        let path = option.path();
        if let Some(idx) = assignments.iter().position(|a| a.path == path) {
            *slot = Some(assignments.remove(idx));
        }
    }
    for (slot, option) in claimed.iter_mut().zip(options) {
        if slot.is_some() {
            continue;
        }
        if let Some(idx) = assignments.iter().position(|a| a.path == option.field_name) {
            *slot = Some(assignments.remove(idx));
        }
    }

    claimed
}

/// Convert raw input into the JSON value the option type expects
pub fn typed_value(option: Option<&OptionType>, raw: &str) -> CommandResult<Value> {
    let Some(option) = option else {
        return Ok(Value::String(raw.to_string()));
    };

    match option.input_type {
        InputType::Checkbox => match raw.trim().to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
            "off" | "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
            _ => Err(CommandError::Validation(format!(
                "{} expects on/off, got '{}'",
                option.label(),
                raw
            ))),
        },
        InputType::Number => {
            let trimmed = raw.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(Value::from(n));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| {
                    CommandError::Validation(format!(
                        "{} expects a number, got '{}'",
                        option.label(),
                        raw
                    ))
                })
        }
        InputType::FileContent => match raw.strip_prefix('@') {
            Some(path) => std::fs::read_to_string(path)
                .map(Value::String)
                .map_err(|e| {
                    CommandError::Validation(format!("failed to read {}: {}", path, e))
                }),
            None => Ok(Value::String(raw.to_string())),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Set `value` at a dot path, creating intermediate objects
pub fn set_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    let mut parts = path.split('.').peekable();
    let mut current = target;

    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            return;
        }

        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(map) = entry else {
            return;
        };
        current = map;
    }
}

/// Whether the payload already carries a value at `path`
pub fn has_path(payload: &Map<String, Value>, path: &str) -> bool {
    let (first, rest) = match path.split_once('.') {
        Some((first, rest)) => (first, Some(rest)),
        None => (path, None),
    };

    match (payload.get(first), rest) {
        (Some(_), None) => true,
        (Some(value), Some(rest)) => lookup(value, rest).is_some(),
        (None, _) => false,
    }
}

/// Keep only the given dot paths of a record (`--fields`)
pub fn select_fields(record: &Value, fields: &[String]) -> Value {
    let mut selected = Map::new();
    for field in fields {
        if let Some(value) = lookup(record, field) {
            set_path(&mut selected, field, value.clone());
        }
    }
    Value::Object(selected)
}

/// Parse a `--payload` argument: inline JSON, or `@path` to a JSON file
pub fn parse_payload(raw: &str) -> CommandResult<Map<String, Value>> {
    let content = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| CommandError::Validation(format!("failed to read {}: {}", path, e)))?,
        None => raw.to_string(),
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CommandError::Validation(
            "--payload must be a JSON object".to_string(),
        )),
        Err(e) => Err(CommandError::Validation(format!("invalid --payload JSON: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn option(name: &str, input_type: InputType) -> OptionType {
        let mut opt: OptionType = serde_json::from_value(json!({"fieldName": name})).unwrap();
        opt.input_type = input_type;
        opt
    }

    #[test]
    fn test_parse_assignments_keeps_equals_in_value() {
        let parsed = parse_assignments(&["config.query=a=b".to_string()]).unwrap();
        assert_eq!(parsed[0].path, "config.query");
        assert_eq!(parsed[0].raw, "a=b");
    }

    #[test]
    fn test_parse_assignments_rejects_bare_words() {
        let err = parse_assignments(&["nightly".to_string()]).unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
    }

    #[test]
    fn test_set_path_nests_objects() {
        let mut payload = Map::new();
        set_path(&mut payload, "name", json!("db"));
        set_path(&mut payload, "config.username", json!("admin"));
        set_path(&mut payload, "config.port", json!(5432));

        assert_eq!(
            Value::Object(payload),
            json!({"name": "db", "config": {"username": "admin", "port": 5432}})
        );
    }

    #[test]
    fn test_has_path() {
        let payload = json!({"config": {"username": "admin"}});
        let map = payload.as_object().unwrap();
        assert!(has_path(map, "config.username"));
        assert!(!has_path(map, "config.password"));
        assert!(!has_path(map, "name"));
    }

    #[test]
    fn test_typed_values() {
        assert_eq!(typed_value(Some(&option("enabled", InputType::Checkbox)), "on").unwrap(), json!(true));
        assert_eq!(typed_value(Some(&option("port", InputType::Number)), "8080").unwrap(), json!(8080));
        assert!(typed_value(Some(&option("port", InputType::Number)), "eighty").is_err());
        assert_eq!(typed_value(None, "007").unwrap(), json!("007"));
    }

    #[test]
    fn test_claim_assignment_by_bare_name() {
        let mut opt = option("username", InputType::Text);
        opt.field_context = Some("config".to_string());
        let mut assignments = parse_assignments(&["username=admin".to_string(), "x=1".to_string()]).unwrap();

        let claimed = claim_assignments(&mut assignments, &[&opt]);
        assert_eq!(claimed[0].as_ref().unwrap().raw, "admin");
        assert_eq!(assignments.len(), 1);
    }

    #[test]
    fn test_exact_path_wins_over_earlier_bare_name() {
        let mut nested = option("name", InputType::Text);
        nested.field_context = Some("config".to_string());
        let root = option("name", InputType::Text);
        let mut assignments = parse_assignments(&["name=deploy".to_string()]).unwrap();

        let claimed = claim_assignments(&mut assignments, &[&nested, &root]);
        assert!(claimed[0].is_none());
        assert_eq!(claimed[1].as_ref().unwrap().raw, "deploy");
        assert!(assignments.is_empty());
    }

    #[test]
    fn test_select_fields() {
        let record = json!({"id": 1, "name": "db", "config": {"host": "h", "port": 1}});
        let selected = select_fields(&record, &["id".to_string(), "config.host".to_string()]);
        assert_eq!(selected, json!({"id": 1, "config": {"host": "h"}}));
    }

    #[test]
    fn test_parse_payload_requires_object() {
        assert!(parse_payload(r#"{"name":"x"}"#).is_ok());
        assert!(parse_payload("[1,2]").is_err());
        assert!(parse_payload("{nope").is_err());
    }
}
