//! Resource abstraction layer
//!
//! This module provides a data-driven approach to describing the appliance's
//! resource types. Resource descriptors are loaded from JSON files at compile
//! time, so a new resource type is added without code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads, validates and caches resource descriptors
//! - `columns` - Column definitions and value formatting
//! - `option_types` - Field descriptors for `add`/`update` payloads
//! - `payload` - `field=value` parsing and dot-path payload building
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `backups.json` - Backups, backup jobs and restores
//! - `infrastructure.json` - Load balancers (with pools and virtual servers) and storage
//! - `security.json` - Credentials, security packages and scans, key pairs
//!
//! # Example
//!
//! ```ignore
//! use morph::resource::{get_resource, ColumnDef};
//!
//! let backups = get_resource("backups").unwrap();
//! let headers: Vec<&str> = backups.list_columns.iter().map(|c| c.label.as_str()).collect();
//! ```

mod columns;
mod option_types;
pub mod payload;
mod registry;

pub use columns::{display_value, format_bytes, lookup, ColumnDef, Formatter};
pub use option_types::{sorted, InputType, OptionSource, OptionType, SelectOption};
pub use registry::*;
