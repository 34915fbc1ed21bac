//! Error types for warriorplus-core

use thiserror::Error;

/// Main error type for the warriorplus-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The document store could not be reached or rejected the request
    #[error("fetch error: {0}")]
    Fetch(String),

    /// A fetched document could not be mapped onto a record type
    #[error("failed to decode {collection} document: {message}")]
    Decode { collection: String, message: String },

    /// Serialization format selector not recognized
    #[error("unsupported export format: {0} (expected 'json' or 'csv')")]
    UnsupportedFormat(String),

    /// Time window selector not recognized
    #[error("invalid time window: {0} (expected all, 7d, 30d, 90d, 1y or YYYY-MM-DD..YYYY-MM-DD)")]
    InvalidWindow(String),

    /// Anonymization level not recognized
    #[error("invalid anonymization level: {0} (expected none, partial or full)")]
    InvalidAnonymization(String),
}

/// Result type alias for warriorplus-core
pub type Result<T> = std::result::Result<T, Error>;
