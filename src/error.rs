//! CLI Error Types

use derive_more::{Display, Error};

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not load content source")]
    Source,
    #[display("could not open lastmod cache")]
    Cache,
    #[display("sitemap generation failed")]
    Sitemap,
    #[display("could not write output")]
    Output,
}
