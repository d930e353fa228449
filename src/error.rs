//! Error types for oh-no-again
//!
//! This module provides the single error type shared by the retry executor,
//! the batch orchestrator and the HTTP transport, including:
//! - Argument and configuration errors
//! - Transport errors carrying the HTTP status and response body
//! - The abort class (per-attempt timeout and cancellation)

use std::time::Duration;
use thiserror::Error;

/// Result type alias for oh-no-again operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for oh-no-again
///
/// Each variant includes enough context to diagnose a failed attempt without
/// consulting the logs. After retries are exhausted the error of the final
/// attempt is surfaced as-is, so callers always see the root cause.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller passed an invalid argument (zero batch size, zero retries, bad method)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "timeout")
        key: Option<String>,
    },

    /// The request URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The server answered with a non-2xx status
    #[error("request failed with {status} {reason}. Body: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status (may be empty)
        reason: String,
        /// Response body text, empty if it could not be read
        body: String,
    },

    /// Network error (connection refused, reset, TLS failure, ...)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An attempt ran past its time budget and was cancelled
    #[error("attempt timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// An attempt was cancelled through its cancellation token
    #[error("operation aborted")]
    Aborted,

    /// The task function returned no request on a retry attempt
    #[error("task produced no request on retry")]
    TaskWithdrawn,

    /// A spawned item task panicked
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true for the abort class: per-attempt timeouts and cancellations
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::Aborted)
    }

    /// HTTP status associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Response body associated with this error, if any
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Error::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Build a configuration error for the given key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
