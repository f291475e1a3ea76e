//! Error types for the CLI.

use thiserror::Error;

use nusach_engine::EngineError;

/// Main error type for CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading an input file failed.
    #[error("Failed to load {what} from {path}: {source}")]
    Load {
        what: &'static str,
        path: String,
        #[source]
        source: EngineError,
    },

    /// A flag value could not be interpreted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `lint --strict` found problems.
    #[error("Lint found {0} issue(s)")]
    LintFailed(usize),

    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
