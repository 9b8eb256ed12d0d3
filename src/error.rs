//! Error types for CronPulse
//!
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for CronPulse operations.
#[derive(Error, Debug)]
pub enum PulseError {
    /// Lifecycle state other than `run`, `complete` or `failed`.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Network-level failure (DNS, refused connection, reset mid-stream).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Base URL or composed endpoint URL that does not parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration-related errors (unreadable values, bad overrides, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapped job failure, surfaced only when re-raising is enabled.
    #[error("Job failed: {0}")]
    JobFailed(String),
}

/// A specialized `Result` type for CronPulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;
