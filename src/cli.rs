//! Command line parsing
//!
//! `morph <resource> <action>` is captured as an external subcommand and
//! parsed by [`ResourceCli`] so the set of resources stays data-driven.

use crate::api::Method;
use crate::command::curl::CurlArgs;
use crate::command::driver::{AddArgs, CommandOptions, ListArgs, RemoveArgs, UpdateArgs};
use crate::command::remote::RemoteAction;
use crate::output::OutputFormat;
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::Level;

/// Command line client for Morpheus appliances
#[derive(Parser, Debug)]
#[command(name = "morph", version, about, long_about = None)]
#[command(after_help = "Run `morph resources` to see the resource types, \
then `morph <resource> --help` for its actions.")]
pub struct Cli {
    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Take `--log-level` out of the resource arguments
    ///
    /// Everything after the resource key is parsed later by [`ResourceCli`],
    /// but logging is set up before that, so the flag is lifted here.
    pub fn lift_log_level(&mut self) -> Result<(), clap::Error> {
        let Command::Resource(args) = &mut self.command else {
            return Ok(());
        };

        let mut idx = 1;
        while idx < args.len() {
            let arg = args[idx].as_str();
            if arg == "--" {
                break;
            }
            let value = if arg == "--log-level" {
                if idx + 1 >= args.len() {
                    return Err(Cli::command().error(
                        ErrorKind::InvalidValue,
                        "a value is required for '--log-level <LOG_LEVEL>'",
                    ));
                }
                let value = args.remove(idx + 1);
                args.remove(idx);
                value
            } else if let Some(value) = arg.strip_prefix("--log-level=") {
                let value = value.to_string();
                args.remove(idx);
                value
            } else {
                idx += 1;
                continue;
            };
            self.log_level = LogLevel::from_str(&value, true).map_err(|_| {
                Cli::command().error(
                    ErrorKind::InvalidValue,
                    format!("invalid value '{}' for '--log-level <LOG_LEVEL>'", value),
                )
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the configured remote appliances
    Remote {
        #[command(subcommand)]
        action: RemoteCommand,
    },

    /// List the resource types this client knows
    Resources,

    /// Send a raw request to the appliance API
    Curl(CurlCli),

    /// `<resource> <action>`, e.g. `backups list`
    #[command(external_subcommand)]
    Resource(Vec<String>),
}

#[derive(Subcommand, Debug)]
pub enum RemoteCommand {
    /// List configured remotes
    List,
    /// Add a remote appliance
    Add {
        name: String,
        url: String,
        /// Access token for the appliance API
        #[arg(long)]
        token: Option<String>,
        /// Make this the active remote
        #[arg(long = "use")]
        make_active: bool,
    },
    /// Set the active remote
    Use { name: String },
    /// Remove a remote
    Remove { name: String },
    /// Show the active remote
    Current,
}

impl From<RemoteCommand> for RemoteAction {
    fn from(command: RemoteCommand) -> Self {
        match command {
            RemoteCommand::List => RemoteAction::List,
            RemoteCommand::Add {
                name,
                url,
                token,
                make_active,
            } => RemoteAction::Add {
                name,
                url,
                token,
                make_active,
            },
            RemoteCommand::Use { name } => RemoteAction::Use { name },
            RemoteCommand::Remove { name } => RemoteAction::Remove { name },
            RemoteCommand::Current => RemoteAction::Current,
        }
    }
}

#[derive(Args, Debug)]
pub struct CurlCli {
    /// API path, e.g. `/api/whoami` (relative paths get an `/api/` prefix)
    pub path: String,

    /// HTTP method
    #[arg(short = 'X', long = "request", default_value = "GET")]
    pub method: Method,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,

    /// Query parameter as KEY=VALUE (repeatable)
    #[arg(long)]
    pub query: Vec<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl CurlCli {
    pub fn curl_args(&self) -> CurlArgs {
        CurlArgs {
            path: self.path.clone(),
            method: self.method,
            data: self.data.clone(),
            query: self.query.clone(),
            dry_run: self.common.dry_run,
        }
    }
}

/// Flags shared by every resource action
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// JSON output
    #[arg(long, conflicts_with_all = ["yaml", "csv"])]
    pub json: bool,

    /// YAML output
    #[arg(long, conflicts_with = "csv")]
    pub yaml: bool,

    /// CSV output
    #[arg(long)]
    pub csv: bool,

    /// Only show these comma separated fields (dot paths)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Print the request instead of sending it
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Remote appliance to use
    #[arg(short = 'r', long, env = "MORPH_REMOTE")]
    pub remote: Option<String>,

    /// Never prompt; missing required values are errors
    #[arg(short = 'N', long)]
    pub no_prompt: bool,

    /// Parent id or name, for nested resources
    #[arg(long)]
    pub parent: Option<String>,
}

impl CommonArgs {
    pub fn format(&self) -> OutputFormat {
        OutputFormat::from_flags(self.json, self.yaml, self.csv)
    }

    pub fn options(&self) -> CommandOptions {
        CommandOptions {
            format: self.format(),
            fields: self.fields.clone(),
            dry_run: self.dry_run,
            yes: self.yes,
            parent: self.parent.clone(),
        }
    }
}

/// Parser for `<resource> <action> ...`; the resource key is the binary name
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct ResourceCli {
    #[command(subcommand)]
    pub action: ResourceAction,
}

#[derive(Subcommand, Debug)]
pub enum ResourceAction {
    /// List records, optionally filtered by a search phrase
    List {
        /// Search phrase
        phrase: Vec<String>,
        /// Maximum number of records
        #[arg(short = 'm', long)]
        max: Option<i64>,
        /// Offset of the first record
        #[arg(short = 'o', long)]
        offset: Option<i64>,
        /// Sort by this field
        #[arg(short = 's', long)]
        sort: Option<String>,
        /// Reverse the sort order
        #[arg(long)]
        desc: bool,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Show one or more records by id or name
    Get {
        #[arg(required = true)]
        ids: Vec<String>,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Create a record from FIELD=VALUE assignments
    Add {
        assignments: Vec<String>,
        /// Type code, name or id
        #[arg(short = 't', long = "type")]
        type_code: Option<String>,
        /// Base payload as a JSON object, or @file
        #[arg(long)]
        payload: Option<String>,
        /// Also prompt for advanced fields
        #[arg(long)]
        advanced: bool,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Update fields of a record
    Update {
        id: String,
        assignments: Vec<String>,
        /// Payload as a JSON object, or @file
        #[arg(long)]
        payload: Option<String>,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Delete a record
    Remove {
        id: String,
        /// Ask the appliance to force the removal
        #[arg(long)]
        force: bool,
        #[command(flatten)]
        common: CommonArgs,
    },
}

impl ResourceAction {
    pub fn common(&self) -> &CommonArgs {
        match self {
            ResourceAction::List { common, .. }
            | ResourceAction::Get { common, .. }
            | ResourceAction::Add { common, .. }
            | ResourceAction::Update { common, .. }
            | ResourceAction::Remove { common, .. } => common,
        }
    }
}

/// A parsed resource action, as the driver consumes it
#[derive(Debug, Clone)]
pub enum Invocation {
    List(ListArgs),
    Get(Vec<String>),
    Add(AddArgs),
    Update(String, UpdateArgs),
    Remove(String, RemoveArgs),
}

impl From<&ResourceAction> for Invocation {
    fn from(action: &ResourceAction) -> Self {
        match action {
            ResourceAction::List {
                phrase,
                max,
                offset,
                sort,
                desc,
                ..
            } => Invocation::List(ListArgs {
                phrase: phrase.clone(),
                max: *max,
                offset: *offset,
                sort: sort.clone(),
                desc: *desc,
            }),
            ResourceAction::Get { ids, .. } => Invocation::Get(ids.clone()),
            ResourceAction::Add {
                assignments,
                type_code,
                payload,
                advanced,
                ..
            } => Invocation::Add(AddArgs {
                type_code: type_code.clone(),
                assignments: assignments.clone(),
                payload: payload.clone(),
                advanced: *advanced,
            }),
            ResourceAction::Update {
                id,
                assignments,
                payload,
                ..
            } => Invocation::Update(
                id.clone(),
                UpdateArgs {
                    assignments: assignments.clone(),
                    payload: payload.clone(),
                },
            ),
            ResourceAction::Remove { id, force, .. } => {
                Invocation::Remove(id.clone(), RemoveArgs { force: *force })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definitions_are_valid() {
        Cli::command().debug_assert();
        ResourceCli::command().debug_assert();
    }

    #[test]
    fn test_resource_is_external_subcommand() {
        let cli = Cli::try_parse_from(["morph", "backups", "get", "17", "--json"]).unwrap();
        match cli.command {
            Command::Resource(args) => assert_eq!(args, vec!["backups", "get", "17", "--json"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_log_level_after_resource_action() {
        let mut cli =
            Cli::try_parse_from(["morph", "backups", "list", "--log-level", "debug", "-m", "5"])
                .unwrap();
        cli.lift_log_level().unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        match &cli.command {
            Command::Resource(args) => {
                assert_eq!(args, &vec!["backups", "list", "-m", "5"]);
                assert!(ResourceCli::try_parse_from(args).is_ok());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_log_level_equals_form_and_leading_flag() {
        let mut cli = Cli::try_parse_from(["morph", "--log-level", "warn", "backups", "get", "3"])
            .unwrap();
        cli.lift_log_level().unwrap();
        assert_eq!(cli.log_level, LogLevel::Warn);

        let mut cli =
            Cli::try_parse_from(["morph", "backups", "get", "3", "--log-level=TRACE"]).unwrap();
        cli.lift_log_level().unwrap();
        assert_eq!(cli.log_level, LogLevel::Trace);
    }

    #[test]
    fn test_bad_trailing_log_level_is_rejected() {
        let mut cli =
            Cli::try_parse_from(["morph", "backups", "list", "--log-level", "loud"]).unwrap();
        let err = cli.lift_log_level().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);

        let mut cli = Cli::try_parse_from(["morph", "backups", "list", "--log-level"]).unwrap();
        assert!(cli.lift_log_level().is_err());
    }

    #[test]
    fn test_resource_action_flags() {
        let parsed = ResourceCli::try_parse_from([
            "backups", "list", "nightly", "-m", "10", "--desc", "--fields", "id,name", "-d",
        ])
        .unwrap();
        let common = parsed.action.common();
        assert!(common.dry_run);
        assert_eq!(common.fields, vec!["id", "name"]);

        match Invocation::from(&parsed.action) {
            Invocation::List(args) => {
                assert_eq!(args.phrase, vec!["nightly"]);
                assert_eq!(args.max, Some(10));
                assert!(args.desc);
            }
            other => panic!("unexpected invocation {:?}", other),
        }
    }

    #[test]
    fn test_output_flags_conflict() {
        assert!(ResourceCli::try_parse_from(["backups", "get", "1", "--json", "--yaml"]).is_err());
    }

    #[test]
    fn test_add_collects_assignments() {
        let parsed = ResourceCli::try_parse_from([
            "credentials", "add", "name=deploy", "-t", "api-key", "-y",
        ])
        .unwrap();
        match Invocation::from(&parsed.action) {
            Invocation::Add(args) => {
                assert_eq!(args.assignments, vec!["name=deploy"]);
                assert_eq!(args.type_code.as_deref(), Some("api-key"));
            }
            other => panic!("unexpected invocation {:?}", other),
        }
    }

    #[test]
    fn test_curl_method() {
        let cli = Cli::try_parse_from(["morph", "curl", "/api/ping", "-X", "delete"]).unwrap();
        match cli.command {
            Command::Curl(curl) => assert_eq!(curl.curl_args().method, Method::Delete),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
