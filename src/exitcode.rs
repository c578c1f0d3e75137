//! Process exit codes

/// Successful termination
pub const OK: i32 = 0;

/// General failure: not found, validation, remote or transport error
pub const FAILURE: i32 = 1;

/// Command line usage error (reported by clap)
pub const USAGE: i32 = 2;

/// The user declined a confirmation prompt
pub const ABORTED: i32 = 9;
