//! Option types
//!
//! Field descriptors used to prompt for and validate `add`/`update` payloads.
//! The layout matches the `optionTypes` the appliance returns for type
//! records (camelCase), so embedded descriptors and API responses parse into
//! the same [`OptionType`].

use super::registry::ResourceRegistry;
use crate::api::{ApiRequest, ResourceEndpoint, RestTransport};
use crate::error::{CommandError, CommandResult};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Context name the appliance uses for fields at the payload root
const ROOT_CONTEXT: &str = "domain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    #[default]
    Text,
    Textarea,
    Number,
    Password,
    Checkbox,
    Select,
    Hidden,
    FileContent,
    #[serde(other)]
    Other,
}

/// One choice of a select field
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectOption {
    pub name: String,
    pub value: Value,
}

impl SelectOption {
    pub fn value_str(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Where a select field loads its choices from at prompt time
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OptionSource {
    /// Records of another registered resource (`resource:<key>`), keyed by id
    Resource(String),
    /// Values served by the appliance at `/api/options/<name>`
    Options(String),
}

impl From<String> for OptionSource {
    fn from(name: String) -> Self {
        match name.strip_prefix("resource:") {
            Some(key) => OptionSource::Resource(key.to_string()),
            None => OptionSource::Options(name),
        }
    }
}

impl OptionSource {
    /// The request that fetches this source's choices
    pub fn request(&self, registry: &ResourceRegistry) -> CommandResult<ApiRequest> {
        match self {
            OptionSource::Options(name) => Ok(ApiRequest::get(format!(
                "/api/options/{}",
                urlencoding::encode(name)
            ))),
            OptionSource::Resource(key) => {
                let descriptor = registry.get(key).ok_or_else(|| {
                    CommandError::Validation(format!("unknown option source resource '{}'", key))
                })?;
                if descriptor.parent.is_some() {
                    return Err(CommandError::Validation(format!(
                        "option source '{}' is a nested resource",
                        key
                    )));
                }
                Ok(ResourceEndpoint::new(descriptor, None)
                    .list(vec![("max".to_string(), "-1".to_string())]))
            }
        }
    }

    /// Fetch the choices through `transport`
    pub async fn load(
        &self,
        transport: &dyn RestTransport,
        registry: &ResourceRegistry,
    ) -> CommandResult<Vec<SelectOption>> {
        let request = self.request(registry)?;
        tracing::debug!("loading option source {:?}", self);
        let response = transport.execute(&request).await?;

        let items = match self {
            OptionSource::Options(_) => response.get("data"),
            OptionSource::Resource(key) => registry
                .get(key)
                .and_then(|descriptor| response.get(&descriptor.list_key)),
        };

        let choices = items
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match self {
                        OptionSource::Options(_) => {
                            serde_json::from_value::<SelectOption>(item.clone()).ok()
                        }
                        OptionSource::Resource(_) => Some(SelectOption {
                            name: item
                                .get("name")
                                .and_then(|v| v.as_str())
                                .unwrap_or("-")
                                .to_string(),
                            value: item.get("id").cloned().unwrap_or(Value::Null),
                        }),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(choices)
    }
}

/// Field descriptor from JSON
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionType {
    pub field_name: String,
    #[serde(default)]
    pub field_context: Option<String>,
    #[serde(default)]
    pub field_label: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub input_type: InputType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub option_source: Option<OptionSource>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_order: i64,
    #[serde(default)]
    pub help_block: Option<String>,
}

impl OptionType {
    /// Dot path of this field inside the payload
    pub fn path(&self) -> String {
        match self.field_context.as_deref() {
            Some(context) if !context.is_empty() && context != ROOT_CONTEXT => {
                format!("{}.{}", context, self.field_name)
            }
            _ => self.field_name.clone(),
        }
    }

    pub fn label(&self) -> &str {
        self.field_label.as_deref().unwrap_or(&self.field_name)
    }

    /// Default value, ignoring empty strings the appliance sends for "none"
    pub fn default(&self) -> Option<&Value> {
        match &self.default_value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(value) => Some(value),
        }
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sort option types by display order, keeping declaration order for ties
pub fn sorted(mut option_types: Vec<OptionType>) -> Vec<OptionType> {
    option_types.sort_by_key(|opt| opt.display_order);
    option_types
}
