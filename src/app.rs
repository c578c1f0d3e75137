//! Application entry
//!
//! Dispatches a parsed command line to the remote, curl and resource
//! commands and maps the outcome to a process exit code.

use crate::api::{ApiClient, ApiError, ApiRequest, RestTransport};
use crate::cli::{Cli, Command, Invocation, ResourceCli};
use crate::command::remote::{self, RemoteAction};
use crate::command::{curl, ResourceCommand, TerminalPrompter};
use crate::config::Config;
use crate::error::{CommandError, CommandResult};
use crate::exitcode;
use crate::output::{render_table, Console};
use crate::resource::{registry, ColumnDef, ResourceRegistry};
use async_trait::async_trait;
use clap::Parser;
use serde_json::{json, Value};

/// Transport used for dry runs when no remote is configured
struct Disconnected;

#[async_trait]
impl RestTransport for Disconnected {
    async fn execute(&self, _request: &ApiRequest) -> Result<Value, ApiError> {
        Err(ApiError::Transport("no remote appliance configured".to_string()))
    }
}

/// Run a parsed command line and return the process exit code
pub async fn run(cli: Cli) -> i32 {
    match dispatch(cli.command).await {
        Ok(()) => exitcode::OK,
        Err(err) => {
            tracing::error!("command failed: {}", err);
            Console::stdio().error(&err);
            err.exit_code()
        }
    }
}

async fn dispatch(command: Command) -> CommandResult<()> {
    match command {
        Command::Remote { action } => {
            let mut config = Config::load();
            let action = RemoteAction::from(action);
            remote::run(&mut config, &action, &mut Console::stdio())?;
            if action.modifies_config() {
                config.save()?;
            }
            Ok(())
        }
        Command::Resources => list_resources(registry(), &mut Console::stdio()),
        Command::Curl(cli) => {
            let config = Config::load();
            let transport = connect(&config, cli.common.remote.as_deref(), cli.common.dry_run)?;
            curl::run(
                transport.as_ref(),
                &mut Console::stdio(),
                &cli.curl_args(),
                cli.common.format(),
            )
            .await
        }
        Command::Resource(args) => run_resource(&args).await,
    }
}

/// Build the transport for this invocation
///
/// A dry run never sends requests, so it works without a configured remote.
fn connect(
    config: &Config,
    remote: Option<&str>,
    dry_run: bool,
) -> CommandResult<Box<dyn RestTransport>> {
    match config.resolve_session(remote) {
        Ok(session) => {
            tracing::info!("using remote {} ({})", session.remote, session.url);
            Ok(Box::new(ApiClient::new(session)?))
        }
        Err(err) if dry_run => {
            tracing::debug!("dry run without a remote: {:#}", err);
            Ok(Box::new(Disconnected))
        }
        Err(err) => Err(err.into()),
    }
}

async fn run_resource(args: &[String]) -> CommandResult<()> {
    let registry = registry();
    let Some(key) = args.first() else {
        return Err(CommandError::Usage("missing resource name".to_string()));
    };
    let descriptor = registry.find(key).ok_or_else(|| {
        CommandError::Usage(format!(
            "unknown resource '{}', run `morph resources` to list them",
            key
        ))
    })?;

    let parsed = match ResourceCli::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(e) if !e.use_stderr() => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            let message = e.to_string();
            return Err(CommandError::Usage(
                message.trim_start_matches("error: ").trim_end().to_string(),
            ));
        }
    };

    let common = parsed.action.common();
    let config = Config::load();
    let transport = connect(&config, common.remote.as_deref(), common.dry_run)?;
    let mut command = ResourceCommand::new(
        registry,
        descriptor,
        transport.as_ref(),
        TerminalPrompter::detect(common.no_prompt),
        Console::stdio(),
        common.options(),
    );

    execute(&mut command, Invocation::from(&parsed.action)).await
}

/// Run one resource action through the driver
pub async fn execute(command: &mut ResourceCommand<'_>, invocation: Invocation) -> CommandResult<()> {
    match invocation {
        Invocation::List(args) => command.list(&args).await,
        Invocation::Get(ids) => command.get(&ids).await,
        Invocation::Add(args) => command.add(&args).await,
        Invocation::Update(id, args) => command.update(&id, &args).await,
        Invocation::Remove(id, args) => command.remove(&id, &args).await,
    }
}

/// `resources`: table of registered resource types
pub fn list_resources(registry: &ResourceRegistry, console: &mut Console) -> CommandResult<()> {
    let rows: Vec<Value> = registry
        .iter()
        .map(|d| {
            json!({
                "key": d.key,
                "label": d.label_plural,
                "parent": d.parent.as_deref().unwrap_or(""),
                "path": d.path,
            })
        })
        .collect();

    let columns = [
        ColumnDef::labelled("Resource", "key"),
        ColumnDef::labelled("Label", "label"),
        ColumnDef::labelled("Parent", "parent"),
        ColumnDef::labelled("Path", "path"),
    ];
    console.print(render_table(&columns, &rows))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_resources_shows_nesting() {
        let (mut console, out, _) = Console::captured();
        list_resources(registry(), &mut console).unwrap();
        let printed = out.contents();
        assert!(printed.contains("load-balancer-pools"));
        assert!(printed.contains("load-balancers"));
        assert!(printed.contains("/api/backups"));
    }

    #[test]
    fn test_unknown_resource_is_usage_error() {
        let err = tokio_test::block_on(run_resource(&["widgets".to_string(), "list".to_string()]))
            .unwrap_err();
        assert_eq!(err.exit_code(), exitcode::USAGE);
    }

    #[test]
    fn test_bad_action_is_usage_error() {
        let err = tokio_test::block_on(run_resource(&["backups".to_string(), "explode".to_string()]))
            .unwrap_err();
        assert!(matches!(err, CommandError::Usage(_)));
    }

    #[test]
    fn test_disconnected_transport_errors() {
        let result = tokio_test::block_on(Disconnected.execute(&ApiRequest::get("/api/ping")));
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }
}
