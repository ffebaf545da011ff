//! Error types for the analysis pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced at the library boundary.
///
/// Loading failures are split into "not found" and "unreadable" so callers
/// can tell which fallback path was taken.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// Input file does not exist.
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Input file exists but could not be read or parsed.
    #[error("source unreadable: {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    /// Filter criteria rejected before touching the table.
    #[error("invalid filter criteria: {0}")]
    InvalidCriteria(String),

    /// Configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExplorerError {
    /// Whether this error is one of the two load failures the fallback policy handles.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            ExplorerError::SourceNotFound(_) | ExplorerError::SourceUnreadable { .. }
        )
    }
}

/// Result type alias using `ExplorerError`.
pub type Result<T> = std::result::Result<T, ExplorerError>;
