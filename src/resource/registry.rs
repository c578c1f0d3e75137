//! Resource Registry - Load resource descriptors from JSON
//!
//! This module loads all resource descriptors from embedded JSON files,
//! validates their linkage, and provides lookup functions for the rest of
//! the application.

use super::columns::ColumnDef;
use super::option_types::OptionType;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/backups.json"),
    include_str!("../resources/infrastructure.json"),
    include_str!("../resources/security.json"),
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("failed to parse resource JSON: {0}")]
    Parse(String),

    #[error("resource '{0}' is defined more than once")]
    DuplicateKey(String),

    #[error("resources '{first}' and '{second}' share the JSON key '{json_key}'")]
    DuplicateJsonKey {
        first: String,
        second: String,
        json_key: String,
    },

    #[error("resource '{resource}' names unknown parent '{parent}'")]
    UnknownParent { resource: String, parent: String },

    #[error("resource '{resource}' has parent '{parent}', which is itself nested")]
    NestedTooDeep { resource: String, parent: String },

    #[error("resource '{0}' defines a column with neither field nor format")]
    EmptyColumn(String),

    #[error("resource '{0}' has no list columns")]
    NoColumns(String),
}

/// Type resource governing a resource's option schema
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeDescriptor {
    pub label: String,
    pub path: String,
    pub list_key: String,
    /// Payload key that receives `{"code": <type code>}`
    #[serde(default = "default_type_field")]
    pub field: String,
    /// Type code used when none is given
    #[serde(default)]
    pub default: Option<String>,
}

fn default_type_field() -> String {
    "type".to_string()
}

fn default_true() -> bool {
    true
}

/// Resource descriptor from JSON
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceDescriptor {
    /// Registry key, e.g. `load-balancer-pools` (filled in at load)
    #[serde(skip)]
    pub key: String,
    pub label: String,
    pub label_plural: String,
    pub object_key: String,
    pub list_key: String,
    /// Absolute API path, or the path below the parent record when nested
    pub path: String,
    #[serde(default = "default_true")]
    pub has_name: bool,
    #[serde(default, rename = "type")]
    pub type_def: Option<TypeDescriptor>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    pub list_columns: Vec<ColumnDef>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub option_types: Vec<OptionType>,
    #[serde(default)]
    pub advanced_option_types: Vec<OptionType>,
}

impl ResourceDescriptor {
    pub fn has_type(&self) -> bool {
        self.type_def.is_some()
    }

    /// Detail view columns, falling back to the list columns
    pub fn detail_columns(&self) -> &[ColumnDef] {
        if self.columns.is_empty() {
            &self.list_columns
        } else {
            &self.columns
        }
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
struct ResourceFile {
    #[serde(default)]
    resources: BTreeMap<String, ResourceDescriptor>,
}

/// All registered resource descriptors, immutable after load
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, ResourceDescriptor>,
}

impl ResourceRegistry {
    /// Parse and validate descriptors from JSON documents
    pub fn from_sources(sources: &[&str]) -> Result<Self, RegistryError> {
        let mut resources = BTreeMap::new();

        for content in sources {
            let file: ResourceFile =
                serde_json::from_str(content).map_err(|e| RegistryError::Parse(e.to_string()))?;

            for (key, mut descriptor) in file.resources {
                if resources.contains_key(&key) {
                    return Err(RegistryError::DuplicateKey(key));
                }
                descriptor.key = key.clone();
                resources.insert(key, descriptor);
            }
        }

        let registry = Self { resources };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let mut json_keys: BTreeMap<(&str, &str), &str> = BTreeMap::new();

        for (key, descriptor) in &self.resources {
            if descriptor.list_columns.is_empty() {
                return Err(RegistryError::NoColumns(key.clone()));
            }

            let mut all_columns = descriptor.list_columns.iter().chain(&descriptor.columns);
            if all_columns.any(|c| c.field.is_none() && c.format.is_none()) {
                return Err(RegistryError::EmptyColumn(key.clone()));
            }

            // Nested resources may reuse the JSON keys of another parent's children
            let scope = descriptor.parent.as_deref().unwrap_or("");
            for json_key in [&descriptor.object_key, &descriptor.list_key] {
                if let Some(first) = json_keys.insert((scope, json_key.as_str()), key.as_str()) {
                    if first != key.as_str() {
                        return Err(RegistryError::DuplicateJsonKey {
                            first: first.to_string(),
                            second: key.clone(),
                            json_key: json_key.clone(),
                        });
                    }
                }
            }

            if let Some(parent) = &descriptor.parent {
                let Some(parent_def) = self.resources.get(parent) else {
                    return Err(RegistryError::UnknownParent {
                        resource: key.clone(),
                        parent: parent.clone(),
                    });
                };
                if parent_def.parent.is_some() || parent == key {
                    return Err(RegistryError::NestedTooDeep {
                        resource: key.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Get a descriptor by registry key
    pub fn get(&self, key: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(key)
    }

    /// Get a descriptor by registry key, object key or list key
    pub fn find(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.get(name).or_else(|| {
            self.resources
                .values()
                .filter(|d| d.parent.is_none())
                .find(|d| d.object_key == name || d.list_key == name)
        })
    }

    /// Parent descriptor of a nested resource
    pub fn parent_of(&self, descriptor: &ResourceDescriptor) -> Option<&ResourceDescriptor> {
        descriptor.parent.as_deref().and_then(|p| self.get(p))
    }

    /// All resource keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        self.resources.keys().map(|k| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceRegistry> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn registry() -> &'static ResourceRegistry {
    REGISTRY.get_or_init(|| {
        ResourceRegistry::from_sources(RESOURCE_FILES)
            .unwrap_or_else(|e| panic!("Invalid embedded resource JSON: {}", e))
    })
}

/// Get a resource descriptor by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDescriptor> {
    registry().get(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "resources": {
            "widgets": {
                "label": "Widget",
                "label_plural": "Widgets",
                "object_key": "widget",
                "list_key": "widgets",
                "path": "/api/widgets",
                "list_columns": [{"label": "ID", "field": "id"}]
            }
        }
    }"#;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = registry();
        assert!(!registry.is_empty(), "Registry should have resources");
    }

    #[test]
    fn test_backups_resource_exists() {
        let resource = get_resource("backups").expect("backups should exist");
        assert_eq!(resource.label, "Backup");
        assert_eq!(resource.object_key, "backup");
        assert_eq!(resource.list_key, "backups");
        assert!(resource.has_name);
    }

    #[test]
    fn test_resource_keys() {
        let keys = registry().keys();
        assert!(keys.contains(&"credentials"));
        assert!(keys.contains(&"load-balancer-pools"));
    }

    #[test]
    fn test_embedded_parents_are_valid() {
        let registry = registry();
        for descriptor in registry.iter() {
            if let Some(parent) = registry.parent_of(descriptor) {
                assert!(parent.parent.is_none(), "{} nested too deep", descriptor.key);
            }
        }
        let pools = registry.get("load-balancer-pools").unwrap();
        assert_eq!(registry.parent_of(pools).unwrap().key, "load-balancers");
    }

    #[test]
    fn test_find_by_json_keys() {
        let registry = registry();
        assert_eq!(registry.find("credential").unwrap().key, "credentials");
        assert_eq!(registry.find("storageVolumes").unwrap().key, "storage-volumes");
        assert!(registry.find("nope").is_none());
    }

    #[test]
    fn test_defaults_applied() {
        let registry = ResourceRegistry::from_sources(&[MINIMAL]).unwrap();
        let widgets = registry.get("widgets").unwrap();
        assert_eq!(widgets.key, "widgets");
        assert!(widgets.has_name);
        assert!(!widgets.has_type());
        assert!(!widgets.read_only);
        assert_eq!(widgets.detail_columns().len(), 1);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = ResourceRegistry::from_sources(&[MINIMAL, MINIMAL]).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateKey("widgets".to_string()));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let source = MINIMAL.replace(
            "\"path\": \"/api/widgets\"",
            "\"path\": \"parts\", \"parent\": \"gadgets\"",
        );
        let err = ResourceRegistry::from_sources(&[&source]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownParent { .. }));
    }

    #[test]
    fn test_self_parent_rejected() {
        let source = MINIMAL.replace(
            "\"path\": \"/api/widgets\"",
            "\"path\": \"/api/widgets\", \"parent\": \"widgets\"",
        );
        let err = ResourceRegistry::from_sources(&[&source]).unwrap_err();
        assert!(matches!(err, RegistryError::NestedTooDeep { .. }));
    }

    #[test]
    fn test_two_level_nesting_rejected() {
        let source = r#"{
            "resources": {
                "a": {"label": "A", "label_plural": "As", "object_key": "a", "list_key": "as",
                      "path": "/api/a", "list_columns": [{"label": "ID", "field": "id"}]},
                "b": {"label": "B", "label_plural": "Bs", "object_key": "b", "list_key": "bs",
                      "path": "b", "parent": "a", "list_columns": [{"label": "ID", "field": "id"}]},
                "c": {"label": "C", "label_plural": "Cs", "object_key": "c", "list_key": "cs",
                      "path": "c", "parent": "b", "list_columns": [{"label": "ID", "field": "id"}]}
            }
        }"#;
        let err = ResourceRegistry::from_sources(&[source]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::NestedTooDeep {
                resource: "c".to_string(),
                parent: "b".to_string()
            }
        );
    }

    #[test]
    fn test_empty_column_rejected() {
        let source = MINIMAL.replace(r#"{"label": "ID", "field": "id"}"#, r#"{"label": "ID"}"#);
        let err = ResourceRegistry::from_sources(&[&source]).unwrap_err();
        assert_eq!(err, RegistryError::EmptyColumn("widgets".to_string()));
    }
}
