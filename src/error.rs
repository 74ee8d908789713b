//! Error types for the churn-analysis-rust library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the churn-analysis-rust application.
#[derive(Error, Debug)]
pub enum ChurnError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A transactional record references a row that does not exist
    #[error("Referential integrity violation: {entity} references missing customer {id}")]
    ReferentialIntegrity {
        /// The referencing entity (e.g. "order")
        entity: String,
        /// The missing customer id
        id: i64,
    },

    /// Customer not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    /// No feature snapshot published for a customer
    #[error("No feature snapshot for customer: {0}")]
    SnapshotNotFound(i64),

    /// A caller-supplied parameter is out of its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model training or scoring failure
    #[error("Training error: {0}")]
    Training(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with ChurnError
pub type Result<T> = std::result::Result<T, ChurnError>;

impl From<anyhow::Error> for ChurnError {
    fn from(err: anyhow::Error) -> Self {
        ChurnError::Other(err.to_string())
    }
}
