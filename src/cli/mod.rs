//! Command-line interface module
//!
//! Provides argument parsing, shell completion and command execution.

pub mod args;
pub mod commands;

pub use args::{Args, Command, ReadValueArgs, SimulatorArgs, parse_args};
pub use commands::execute_command;

use crate::utils::env::{COMPLETE_VAR, normalize_completion_var};
use clap::CommandFactory;
use clap_complete::CompleteEnv;

/// Serve a shell completion request if `_RCTCLIENT_COMPLETE` is set
///
/// Prints the registration script, or the candidates for the words passed
/// by the shell, and exits. Returns normally when no completion was asked
/// for.
pub fn complete_from_env() {
    normalize_completion_var();
    CompleteEnv::with_factory(Args::command)
        .var(COMPLETE_VAR)
        .complete();
}
