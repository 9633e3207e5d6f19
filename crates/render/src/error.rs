//! Render error types.

use derive_more::{Display, Error};

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A single sitemap document may not list more than
    /// [`MAX_ENTRIES`](crate::MAX_ENTRIES) URLs.
    #[display("sitemap document has {_0} entries, more than the protocol allows")]
    TooManyEntries(#[error(not(source))] usize),
    #[display("could not format lastmod timestamp")]
    Timestamp,
    /// Asset was not loadable.
    #[display("asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
