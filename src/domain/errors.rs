//! Domain error types
//!
//! This module defines the error hierarchy for the connector.
//! Errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main connector error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source database errors
    #[error("Source database error: {0}")]
    Source(#[from] SourceError),

    /// Ingestion endpoint errors
    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    /// Network/connection errors that are not tied to one collaborator
    #[error("Connection error: {0}")]
    Connection(String),

    /// Watermark and history persistence errors
    #[error("State management error: {0}")]
    State(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ConnectorError {
    /// Whether this error means a collaborator could not be reached at all.
    ///
    /// Connection-level failures are fatal for a sync cycle, while query or
    /// batch failures are isolated to the unit that raised them.
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            ConnectorError::Connection(_)
                | ConnectorError::Source(SourceError::ConnectionFailed(_))
                | ConnectorError::Source(SourceError::Pool(_))
                | ConnectorError::Ingestion(IngestionError::ConnectionFailed(_))
        )
    }
}

/// Source database errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to open a connection
    #[error("Failed to connect to source database: {0}")]
    ConnectionFailed(String),

    /// Connection pool could not be created or exhausted
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// A query failed to execute
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A row could not be decoded into the expected shape
    #[error("Failed to decode row: {0}")]
    Decode(String),
}

/// Ingestion endpoint errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Endpoint unreachable (DNS, TCP, TLS)
    #[error("Failed to reach ingestion endpoint: {0}")]
    ConnectionFailed(String),

    /// Endpoint answered with a status other than 200/201
    #[error("Ingestion endpoint rejected the request: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Endpoint URL or headers could not be built
    #[error("Invalid ingestion request: {0}")]
    InvalidRequest(String),
}

impl From<std::io::Error> for ConnectorError {
    fn from(err: std::io::Error) -> Self {
        ConnectorError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ConnectorError {
    fn from(err: toml::de::Error) -> Self {
        ConnectorError::Configuration(format!("TOML parse error: {err}"))
    }
}
