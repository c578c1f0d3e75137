//! `curl`: send a raw request to the appliance API

use crate::api::{ApiRequest, Method, RestTransport};
use crate::error::{CommandError, CommandResult};
use crate::output::{render_value, Console, OutputFormat};
use crate::resource::payload::parse_assignments;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CurlArgs {
    pub path: String,
    pub method: Method,
    /// JSON request body
    pub data: Option<String>,
    /// `key=value` query parameters
    pub query: Vec<String>,
    pub dry_run: bool,
}

/// Build the request a `curl` invocation describes
pub fn build_request(args: &CurlArgs) -> CommandResult<ApiRequest> {
    let path = if args.path.starts_with('/') {
        args.path.clone()
    } else {
        format!("/api/{}", args.path)
    };

    let mut request = ApiRequest::new(args.method, path);
    for assignment in parse_assignments(&args.query)? {
        request = request.with_query(&assignment.path, assignment.raw);
    }
    if let Some(data) = &args.data {
        let payload: Value = serde_json::from_str(data)
            .map_err(|e| CommandError::Validation(format!("invalid --data JSON: {}", e)))?;
        request = request.with_payload(payload);
    }
    Ok(request)
}

pub async fn run(
    transport: &dyn RestTransport,
    console: &mut Console,
    args: &CurlArgs,
    format: OutputFormat,
) -> CommandResult<()> {
    let request = build_request(args)?;

    if args.dry_run {
        let rendered = match format {
            OutputFormat::Json | OutputFormat::Yaml => {
                render_value(&serde_json::to_value(&request)?, format)?
            }
            _ => format!("DRY RUN\n{}", request),
        };
        console.print(rendered)?;
        return Ok(());
    }

    tracing::info!("curl {} {}", request.method, request.path_and_query());
    let response = transport.execute(&request).await?;
    console.print(render_value(&response, format)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(path: &str) -> CurlArgs {
        CurlArgs {
            path: path.to_string(),
            method: Method::Get,
            data: None,
            query: Vec::new(),
            dry_run: false,
        }
    }

    #[test]
    fn test_relative_path_gets_api_prefix() {
        assert_eq!(build_request(&args("whoami")).unwrap().path, "/api/whoami");
        assert_eq!(build_request(&args("/api/ping")).unwrap().path, "/api/ping");
    }

    #[test]
    fn test_query_and_data() {
        let mut curl = args("/api/backups");
        curl.method = Method::Post;
        curl.query = vec!["max=5".to_string()];
        curl.data = Some(r#"{"backup": {"name": "x"}}"#.to_string());

        let request = build_request(&curl).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.query_value("max"), Some("5"));
        assert_eq!(request.payload, Some(json!({"backup": {"name": "x"}})));
    }

    #[test]
    fn test_invalid_data_rejected() {
        let mut curl = args("/api/backups");
        curl.data = Some("{oops".to_string());
        assert!(matches!(build_request(&curl), Err(CommandError::Validation(_))));
    }
}
