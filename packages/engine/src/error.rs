//! Error types for the Nusach engine
//!
//! Text operations (resolving, gendering, numbering) never fail; they report
//! problems through [`crate::diagnostics`]. Errors only come from loading
//! inputs: rule tables, phrase patterns, section records and contexts.

use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// A rule table entry is structurally invalid
    #[error("Invalid rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    /// A regex pattern in a rule or protected phrase failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Input rejected before parsing (size or count limits)
    #[error("Load error: {0}")]
    LoadError(String),

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Reject loaded content larger than [`crate::config::MAX_INPUT_SIZE`].
pub(crate) fn check_input_size(content: &str, what: &str) -> Result<()> {
    if content.len() > crate::config::MAX_INPUT_SIZE {
        tracing::warn!(
            size = content.len(),
            max = crate::config::MAX_INPUT_SIZE,
            what,
            "Input exceeds size limit"
        );
        return Err(EngineError::LoadError(format!(
            "{what} exceeds maximum size limit ({} bytes)",
            crate::config::MAX_INPUT_SIZE
        )));
    }
    Ok(())
}
