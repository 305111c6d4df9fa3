//! Configuration errors raised while building a linter.
//!
//! These are programmer errors: an empty or malformed pattern, a schema
//! outside the supported subset, or a validator chain whose artifact tags do
//! not line up. Lint findings are never reported through this type; they are
//! collected as `Violation`s in the run report.

use std::path::PathBuf;
use thiserror::Error;

use crate::validators::ArtifactKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A selector was declared with an empty pattern.
    #[error("selector pattern must not be empty")]
    EmptyPattern,

    /// A glob selector could not be compiled.
    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The schema document uses something outside the supported subset.
    #[error("malformed schema: {reason}")]
    MalformedSchema { reason: String },

    /// A validator was placed after one that does not produce its input.
    #[error("validator '{validator}' expects {expected} but the chain provides {found}")]
    ChainMismatch {
        validator: &'static str,
        expected: String,
        found: ArtifactKind,
    },

    /// `shell_command` was given no program.
    #[error("shell command must name a program")]
    EmptyCommand,

    /// A declarative node entry is not well formed.
    #[error("invalid linter node: {reason}")]
    InvalidNode { reason: String },

    /// A schema file could not be read or parsed.
    #[error("could not load schema '{}': {reason}", .path.display())]
    SchemaLoad { path: PathBuf, reason: String },

    /// A config file could not be parsed.
    #[error("could not parse config '{}': {reason}", .path.display())]
    ConfigParse { path: PathBuf, reason: String },

    /// IO error reading configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ConfigError::MalformedSchema {
            reason: reason.into(),
        }
    }
}
