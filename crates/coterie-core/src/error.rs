//! Error types for coterie-core.

use thiserror::Error;

/// Error type for co-occurrence and clique operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A threshold or budget value is out of range. Fatal at startup.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A record failed to parse. Callers log it and continue.
    #[error("Malformed input in {source_name} at line {line}: {reason}")]
    MalformedInput {
        /// File or stream the record came from.
        source_name: String,
        /// 1-based line number.
        line: usize,
        /// Parser message.
        reason: String,
    },

    /// Clique search on one component exceeded its budget.
    #[error("Enumeration budget exceeded on component of {vertices} vertices: {reason}")]
    BudgetExceeded {
        /// Size of the offending component.
        vertices: usize,
        /// Which limit tripped.
        reason: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV/TSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for coterie operations.
pub type Result<T> = std::result::Result<T, Error>;
