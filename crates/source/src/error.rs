//! Source Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A source error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Content file does not exist
    #[display("content file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Content could not be decoded into objects
    #[display("invalid content data")]
    InvalidData,
    /// Underlying I/O error
    #[display("I/O error")]
    Io,
    /// Backend-specific error (database unavailable, query rejected, etc.)
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::BackendError(_))
    }
}
