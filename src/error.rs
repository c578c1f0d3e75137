//! Command errors
//!
//! Every resource operation returns [`CommandError`]. Local outcomes
//! (not found, ambiguous name, validation) are expected and rendered as a
//! plain message; remote errors carry the appliance's message unmodified.

use crate::api::ApiError;
use crate::exitcode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    /// An id or name did not resolve to a record
    #[error("{0}")]
    NotFound(String),

    /// A name matched more than one record
    #[error(
        "{label} name '{name}' is ambiguous, {} matches found: {}",
        .matches.len(),
        .matches.join(", ")
    )]
    AmbiguousName {
        label: String,
        name: String,
        matches: Vec<String>,
    },

    /// Missing or malformed input that cannot be supplied interactively
    #[error("{0}")]
    Validation(String),

    /// The appliance answered with a non-success status
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The user declined a confirmation
    #[error("aborted")]
    Aborted,

    /// Some ids of a multi-record request failed
    #[error("{failed} of {total} {label} could not be retrieved")]
    Failures {
        failed: usize,
        total: usize,
        label: String,
    },

    /// The request never produced an HTTP response
    #[error("{0}")]
    Transport(String),

    /// Unknown resource or malformed invocation
    #[error("{0}")]
    Usage(String),

    /// Configuration could not be read, resolved or written
    #[error("{0}")]
    Config(String),

    #[error("failed to render output: {0}")]
    Output(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

impl CommandError {
    /// Exit code reported to the shell for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Aborted => exitcode::ABORTED,
            CommandError::Usage(_) => exitcode::USAGE,
            _ => exitcode::FAILURE,
        }
    }

    /// Replace the message of a not-found error, leaving other errors intact.
    pub fn with_not_found(self, message: impl Into<String>) -> Self {
        match self {
            CommandError::NotFound(_) => CommandError::NotFound(message.into()),
            other => other,
        }
    }
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status: 404, message } => CommandError::NotFound(message),
            ApiError::Status { status, message } => CommandError::Remote { status, message },
            ApiError::Transport(message) | ApiError::Decode(message) => {
                CommandError::Transport(message)
            }
        }
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        CommandError::Config(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::Output(err.to_string())
    }
}

impl From<serde_yaml::Error> for CommandError {
    fn from(err: serde_yaml::Error) -> Self {
        CommandError::Output(err.to_string())
    }
}

impl From<csv::Error> for CommandError {
    fn from(err: csv::Error) -> Self {
        CommandError::Output(err.to_string())
    }
}
