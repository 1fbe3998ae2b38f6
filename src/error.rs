//! Error types for result scoring.
//!
//! The scoring core itself never fails: missing courses, classes or punches degrade to
//! neutral values (0, empty lists, unset points). Errors only surface at the edges of the
//! crate, where external input is turned into domain data:
//!
//! - **Parse Errors**: malformed event fixtures, durations or timestamps
//! - **Formula Errors**: points formulas that fail to tokenize, parse or evaluate
//! - **Config Errors**: scoring configuration that is syntactically valid but unusable
//! - **File Errors**: fixtures or configuration files that cannot be read
//!
//! ## Recovery
//!
//! ```rust
//! use punchcard::ScoringError;
//!
//! let error = ScoringError::formula("[RESULT].time / 0", "division by zero");
//! assert!(error.is_per_result());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scoring operations.
pub type Result<T, E = ScoringError> = std::result::Result<T, E>;

/// Main error type for the scoring crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Points formula '{expression}' failed: {details}")]
    Formula { expression: String, details: String },

    #[error("Invalid scoring configuration: {reason}")]
    Config { reason: String },

    #[error("Fixture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScoringError {
    /// Returns whether the error only affects a single result in a batch.
    ///
    /// Batch scoring logs these and carries on with the remaining results.
    pub fn is_per_result(&self) -> bool {
        match self {
            ScoringError::Formula { .. } => true,
            ScoringError::Parse { .. } => false,
            ScoringError::Config { .. } => false,
            ScoringError::File { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ScoringError::Parse { .. } => vec![
                "Check the input against the camelCase event model",
                "Verify timestamps are RFC 3339 formatted",
                "Verify durations use the H:MM:SS or M:SS form",
            ],
            ScoringError::Formula { .. } => vec![
                "Reference results only through [RESULT] and [FIRST_RESULT]",
                "Use only the fields time, points, position and difference",
                "Guard divisions against a zero leader time",
            ],
            ScoringError::Config { .. } => vec![
                "Compare the configuration with ScoringConfig::default()",
                "Remove negative tolerances",
            ],
            ScoringError::File { .. } => vec![
                "Check the file exists and is readable",
                "Check the path is relative to the crate root",
            ],
        }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        ScoringError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for formula errors.
    pub fn formula(expression: impl Into<String>, details: impl Into<String>) -> Self {
        ScoringError::Formula { expression: expression.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        ScoringError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        ScoringError::File { path, source }
    }
}

impl From<std::io::Error> for ScoringError {
    fn from(err: std::io::Error) -> Self {
        ScoringError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for ScoringError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        ScoringError::Parse { context: "YAML deserialization".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for ScoringError {
    fn from(err: serde_json::Error) -> Self {
        ScoringError::Parse { context: "JSON deserialization".to_string(), details: err.to_string() }
    }
}
