//! Error types for static text rendering.

use std::io;

use thiserror::Error;

/// Boxed error produced by a fallible deferred text item.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Static text error type
#[derive(Error, Debug)]
pub enum Error {
    /// Writing to the output sink failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A deferred text item failed while being resolved
    #[error("deferred text item failed: {0}")]
    Deferred(#[source] BoxError),

    /// `start()` was called on a disposed render interval
    #[error("render interval has been disposed")]
    IntervalDisposed,

    /// Text items could not be decoded from JSON
    #[error("invalid text items: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for static text operations
pub type Result<T> = std::result::Result<T, Error>;
