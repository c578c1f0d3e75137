//! Appliance API interaction module
//!
//! This module provides everything needed to talk to a Morpheus appliance's
//! REST API: request descriptions, the transport seam, and the HTTP client.
//!
//! # Module Structure
//!
//! - [`request`] - Method/path/query/payload descriptions of API calls
//! - [`rest`] - The [`RestTransport`] trait and per-resource request builders
//! - [`http`] - HTTP utilities for REST API calls
//! - [`client`] - Session-bound client that implements [`RestTransport`]
//!
//! # Example
//!
//! ```ignore
//! use morph::api::{ApiClient, ApiRequest, RestTransport};
//!
//! async fn example(client: &ApiClient) -> Result<(), morph::api::ApiError> {
//!     let backups = client.execute(&ApiRequest::get("/api/backups")).await?;
//!     println!("{}", backups);
//!     Ok(())
//! }
//! ```

pub mod client;
mod error;
pub mod http;
pub mod request;
pub mod rest;

pub use client::{ApiClient, Session};
pub use error::ApiError;
pub use request::{ApiRequest, Method};
pub use rest::{ResourceEndpoint, RestTransport};
