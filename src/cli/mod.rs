//! CLI support for classad-lang
//!
//! Provides programmatic access to the `classad` CLI functionality for
//! embedding in other tools.

mod check;
mod eval;

pub use check::{execute_check, CheckOptions, CheckResult};
pub use eval::{execute_eval, EvalOptions};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Expression failed to parse
    #[error("parse error: {0}")]
    Parse(#[from] crate::ParseError),

    /// A record file failed to parse
    #[error("invalid ad in {path}: {source}")]
    Ad {
        path: String,
        #[source]
        source: crate::AdParseError,
    },

    /// IO error reading an ad file or stdin
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
