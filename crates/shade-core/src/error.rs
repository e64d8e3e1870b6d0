//! Error types.
//!
//! [`Error`] covers the host-level failures that stop a run (missing or
//! invalid configuration, unreadable files). [`Diagnostic`] is the non-fatal
//! taxonomy produced while rewriting a single `lighten()`/`darken()` call;
//! a diagnostic never aborts processing.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors raised outside the rewriting engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration:\n  {}", .0.join("\n  "))]
    ConfigValidation(Vec<String>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// A problem with one `lighten()`/`darken()` call.
///
/// The offending call is left in the output as written and the message is
/// surfaced to the caller as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("Invalid call to {op}(): Expected 2 arguments")]
    InvalidArgumentCount { op: String },

    #[error(
        "Invalid call to {op}(): First argument must be a hex value, hsla color, or nested lighten/darken"
    )]
    InvalidColorArgument { op: String },

    #[error("Invalid call to {op}(): Second argument must be a percentage")]
    InvalidPercentageArgument { op: String },

    #[error("Unable to convert {hex} to RGB")]
    UnresolvableHex { hex: String },

    #[error("Unable to parse {text} to HSL")]
    UnparsableHslaLiteral { text: String },

    #[error("Unexpected function encountered ({name}). Unable to resolve color.")]
    UnsupportedNestedFunction { name: String },
}
