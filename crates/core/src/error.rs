//! Core Error Types
//!
//! Only genuine failures live here. A page past the end, an unknown sitemap
//! name or a lastmod cache miss are ordinary values (an empty list, `None`,
//! an unknown lastmod) and never become errors.

use derive_more::{Display, Error};

/// A core error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The object source could not count or list content.
    #[display("object source failure")]
    Source,
    /// The lastmod cache could not be read or written.
    #[display("lastmod cache failure")]
    Cache,
    /// A recompute job could not be handed to the scheduler.
    #[display("could not schedule job")]
    Schedule,
    #[display("could not render sitemap document")]
    Render,
    /// Unusable configuration (unknown provider name, malformed base URL).
    #[display("invalid configuration: {_0}")]
    Config(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Source | ErrorKind::Cache | ErrorKind::Schedule => true,
            ErrorKind::Render | ErrorKind::Config(_) => false,
        }
    }
}
