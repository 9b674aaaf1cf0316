//! CLI support for the PQL compiler
//!
//! Each subcommand of the `pql` binary is a plain function here, so the
//! commands can be driven from tests and other tools without spawning the
//! binary.

mod compile;
mod convert;
mod format;
mod search;

pub use compile::{CompileOptions, execute_compile};
pub use convert::execute_convert;
pub use format::format_pql;
pub use search::{SearchOptions, execute_search};

use crate::config::ConfigError;
use crate::error::CompileError;
use std::io;
use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No argument and nothing piped to stdin
    #[error("No input provided. Pass it as an argument or pipe it to stdin.")]
    NoInput,

    #[error("Documents must be a JSON array of objects")]
    Documents,
}

fn to_json_string(value: &serde_json::Value, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    Ok(json)
}
