//! Errors produced by the transport layer

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Non-success HTTP status; `message` is the appliance's own message
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to parse response JSON: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error from a raw response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            message: server_message(status, body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extract the message the appliance attached to an error response.
///
/// Morpheus answers failures with `{"success": false, "msg": "..."}`; other
/// shapes fall back to the raw body so nothing the server said is lost.
pub fn server_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {}", status);
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["msg", "message", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_prefers_msg() {
        let body = r#"{"success":false,"msg":"Unable to find credential"}"#;
        assert_eq!(server_message(400, body), "Unable to find credential");
    }

    #[test]
    fn test_server_message_falls_back_to_body() {
        assert_eq!(server_message(502, "Bad Gateway\n"), "Bad Gateway");
        assert_eq!(server_message(500, r#"{"errors":{"name":"taken"}}"#), r#"{"errors":{"name":"taken"}}"#);
    }

    #[test]
    fn test_server_message_empty_body() {
        assert_eq!(server_message(503, ""), "HTTP 503");
    }
}
