//! Object source trait and implementations.
//!
//! This module defines the [`ObjectSource`] trait, the narrow interface the
//! sitemap providers use to enumerate content. Implementations wrap whatever
//! content store a site uses; this crate ships an in-memory one that can also
//! be loaded from a JSON content file.

mod memory;

pub use self::memory::MemorySource;
use crate::error::Result;
use crate::models::{Filter, ObjectKind, ObjectRecord, Order};
use async_trait::async_trait;

/// Unified interface for content sources.
///
/// All operations are asynchronous since real sources sit behind a database or
/// network connection. Errors are never swallowed by callers in this
/// workspace; they bubble up to whoever is answering the request.
///
/// # Consistency
/// `count` and `list` are called separately, so a source only has to be
/// consistent on a best-effort basis: content modified between the two calls
/// may shift a page by a few objects. Ordering by identifier keeps pages
/// stable for append-only content.
///
/// # Examples
///
/// ```
/// use sitemapper_source::{Filter, ObjectKind, ObjectSource, Order, Visibility, error::Result};
///
/// async fn first_page_of_pages(source: &dyn ObjectSource) -> Result<Vec<String>> {
///     let filter = Filter::new(Visibility::Public).with_sub_type("page".to_string());
///     let records = source.list(ObjectKind::Post, &filter, Order::IdAscending, 0, 100).await?;
///     Ok(records.into_iter().map(|r| r.location).collect())
/// }
/// ```
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Name of the configured source (used for logging only).
    fn name(&self) -> &str;

    /// Count the objects of `kind` matching `filter`.
    async fn count(&self, kind: ObjectKind, filter: &Filter) -> Result<u64>;

    /// List at most `limit` objects of `kind` matching `filter`, skipping the
    /// first `offset` in the given `order`.
    ///
    /// An `offset` beyond the end of the result set yields an empty list, not
    /// an error.
    async fn list(
        &self,
        kind: ObjectKind,
        filter: &Filter,
        order: Order,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ObjectRecord>>;

    /// Sub-types (post types, taxonomies) that `kind` is partitioned into and
    /// that contain at least one publicly viewable object, sorted by name.
    async fn sub_types(&self, kind: ObjectKind) -> Result<Vec<String>>;
}
