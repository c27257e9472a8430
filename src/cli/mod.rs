//! CLI support for objpath
//!
//! Provides programmatic access to the objpath CLI commands for embedding in
//! other tools. Commands work on JSON documents.

mod check;
mod convert;
mod query;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use convert::{parse_assignment, parse_value};
pub use query::{GetOptions, PatchOptions, execute_get, execute_patch};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Path(#[from] crate::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("Invalid assignment '{0}': expected PATH=VALUE")]
    InvalidAssignment(String),
}
