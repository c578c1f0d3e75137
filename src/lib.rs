//! morph: command line client for Morpheus appliances
//!
//! Every resource type the client knows is described by a
//! [`resource::ResourceDescriptor`] embedded in the binary. One generic
//! driver ([`command::ResourceCommand`]) implements `list`, `get`, `add`,
//! `update` and `remove` for all of them over the [`api::RestTransport`]
//! seam.

pub mod api;
pub mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod exitcode;
pub mod output;
pub mod resource;

/// Version injected at compile time via MORPH_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("MORPH_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
