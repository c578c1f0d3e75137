//! Command implementations
//!
//! - [`driver`] - The generic list/get/add/update/remove driver
//! - [`resolve`] - Id and name resolution
//! - [`prompt`] - Interactive prompting
//! - [`remote`] - Remote appliance management
//! - [`curl`] - Raw API requests

pub mod curl;
pub mod driver;
pub mod prompt;
pub mod remote;
pub mod resolve;

pub use driver::{AddArgs, CommandOptions, ListArgs, RemoveArgs, ResourceCommand, UpdateArgs};
pub use prompt::{NoPrompt, Prompter, Question, TerminalPrompter};
