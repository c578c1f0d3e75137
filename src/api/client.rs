//! Appliance Client
//!
//! Main client for talking to a remote appliance, combining the resolved
//! session (URL and access token) with the HTTP client.

use super::error::ApiError;
use super::http::HttpClient;
use super::request::ApiRequest;
use super::rest::RestTransport;
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// The remote appliance selected for this invocation. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Remote name from the config file, or `env` for an ad-hoc remote
    pub remote: String,
    pub url: Url,
    pub access_token: Option<String>,
}

/// Main appliance client
#[derive(Clone)]
pub struct ApiClient {
    pub session: Session,
    pub http: HttpClient,
}

impl ApiClient {
    /// Create a new client bound to `session`
    pub fn new(session: Session) -> Result<Self, ApiError> {
        let http = HttpClient::new()?;
        Ok(Self { session, http })
    }
}

#[async_trait]
impl RestTransport for ApiClient {
    async fn execute(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        self.http
            .send(
                &self.session.url,
                self.session.access_token.as_deref(),
                request,
            )
            .await
    }
}
