//! Error types for the sales pipeline.
//!
//! Only [`PipelineError`] can end a run. Per-record problems are
//! [`RejectReason`](crate::transaction::RejectReason)s and catalog problems
//! are [`FetchError`](crate::catalog::FetchError)s; both are recovered where
//! they occur.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur during a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input path does not exist
    #[error("Input file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The input path exists but could not be read
    #[error("Cannot read input file {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the candidate text encodings could decode the whole file
    #[error(
        "Unreadable encoding in {}: tried {}",
        path.display(),
        attempted.join(", ")
    )]
    Encoding {
        path: PathBuf,
        attempted: Vec<&'static str>,
    },

    /// Failed to write an output snapshot
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Pipe-delimited read/write error
    #[error("Delimited file error: {0}")]
    Csv(#[from] csv::Error),

    /// Report serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
