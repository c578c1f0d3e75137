//! REST interface
//!
//! [`RestTransport`] is the seam between the command driver and the network:
//! it executes one [`ApiRequest`] and returns parsed JSON. [`ResourceEndpoint`]
//! builds the list/get/create/update/destroy requests for one resource type,
//! optionally nested under a resolved parent record.

use super::error::ApiError;
use super::request::ApiRequest;
use crate::resource::ResourceDescriptor;
use async_trait::async_trait;
use serde_json::Value;

/// Executes API requests against a remote appliance
#[async_trait]
pub trait RestTransport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<Value, ApiError>;
}

/// Request builder for one resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEndpoint {
    base_path: String,
}

impl ResourceEndpoint {
    /// Endpoint for a top-level resource, or for a nested resource under
    /// `parent` (the parent descriptor and its resolved id).
    pub fn new(descriptor: &ResourceDescriptor, parent: Option<(&ResourceDescriptor, &str)>) -> Self {
        let base_path = match parent {
            Some((parent_def, parent_id)) => format!(
                "{}/{}/{}",
                parent_def.path.trim_end_matches('/'),
                urlencoding::encode(parent_id),
                descriptor.path.trim_matches('/')
            ),
            None => descriptor.path.trim_end_matches('/').to_string(),
        };

        Self { base_path }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    fn record_path(&self, id: &str) -> String {
        format!("{}/{}", self.base_path, urlencoding::encode(id))
    }

    pub fn list(&self, query: Vec<(String, String)>) -> ApiRequest {
        let mut request = ApiRequest::get(self.base_path.clone());
        request.query = query;
        request
    }

    pub fn get(&self, id: &str) -> ApiRequest {
        ApiRequest::get(self.record_path(id))
    }

    pub fn create(&self, payload: Value) -> ApiRequest {
        ApiRequest::post(self.base_path.clone(), payload)
    }

    pub fn update(&self, id: &str, payload: Value) -> ApiRequest {
        ApiRequest::put(self.record_path(id), payload)
    }

    pub fn destroy(&self, id: &str) -> ApiRequest {
        ApiRequest::delete(self.record_path(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::resource::registry;
    use serde_json::json;

    #[test]
    fn test_top_level_paths() {
        let backups = registry().get("backups").unwrap();
        let endpoint = ResourceEndpoint::new(backups, None);

        assert_eq!(endpoint.get("17").path, "/api/backups/17");
        assert_eq!(endpoint.destroy("17").method, Method::Delete);
        let update = endpoint.update("17", json!({"backup": {}}));
        assert_eq!(update.method, Method::Put);
        assert_eq!(update.path, "/api/backups/17");
    }

    #[test]
    fn test_nested_paths_use_parent_id() {
        let registry = registry();
        let pools = registry.get("load-balancer-pools").unwrap();
        let balancers = registry.get("load-balancers").unwrap();
        let endpoint = ResourceEndpoint::new(pools, Some((balancers, "42")));

        assert_eq!(endpoint.base_path(), "/api/load-balancers/42/pools");
        assert_eq!(endpoint.get("7").path, "/api/load-balancers/42/pools/7");
    }

    #[test]
    fn test_ids_are_encoded() {
        let backups = registry().get("backups").unwrap();
        let endpoint = ResourceEndpoint::new(backups, None);
        assert_eq!(endpoint.get("a b").path, "/api/backups/a%20b");
    }
}
