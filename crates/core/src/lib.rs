//! Sitemap core: turns a growing content set into a stable set of bounded,
//! cacheable, URL-addressable sitemap pages.
//!
//! - [`Provider`]s map a `(sub-type, page)` to an ordered URL list, one
//!   provider per content category.
//! - The [`Registry`] resolves a category name to its provider.
//! - The [`IndexBuilder`] lists every page of every provider for the
//!   top-level index.
//! - Page lastmods are cached and recomputed out-of-band through a
//!   [`Scheduler`], usually the [`WorkQueue`].
//! - The [`Dispatcher`] ties it together for an incoming request path.

mod dispatch;
mod entry;
pub mod error;
mod index;
mod job;
pub mod provider;
mod registry;
mod route;
mod urls;
mod warm;

pub use crate::dispatch::{Dispatcher, IndexTransform, Response, Transforms, UrlListTransform};
pub use crate::entry::{SitemapEntry, SubType};
pub use crate::index::IndexBuilder;
#[cfg(any(test, feature = "mock"))]
pub use crate::job::RecordingScheduler;
pub use crate::job::{Job, Scheduler, SchedulerHandle, WorkQueue, Worker};
pub use crate::provider::{Origin, Provider, ProviderHandle};
pub use crate::registry::{Registry, RegistryBuilder};
pub use crate::route::Route;
pub use crate::urls::UrlBuilder;
pub use crate::warm::{WarmEvent, warm};

use sitemapper_cache::LastmodCache;
use sitemapper_source::SourceHandle;
use std::time::Duration;

const DEFAULT_RECOMPUTE_DELAY: Duration = Duration::from_secs(10);

/// Process-wide collaborators every provider call runs against.
///
/// Constructed once at startup and passed by reference; nothing in the core
/// reaches for global state.
#[derive(Clone)]
pub struct Context {
    pub source: SourceHandle,
    pub lastmod: LastmodCache,
    pub scheduler: SchedulerHandle,
    pub urls: UrlBuilder,
    /// How far in the future a lastmod recompute is scheduled.
    pub recompute_delay: Duration,
    /// Store a "known empty" marker for pages whose recompute found no
    /// timestamp, instead of leaving them unset and recomputing them again on
    /// the next render.
    pub cache_empty_pages: bool,
}
impl Context {
    pub fn new(source: SourceHandle, lastmod: LastmodCache, scheduler: SchedulerHandle, urls: UrlBuilder) -> Self {
        Self {
            source,
            lastmod,
            scheduler,
            urls,
            recompute_delay: DEFAULT_RECOMPUTE_DELAY,
            cache_empty_pages: true,
        }
    }

    pub fn with_recompute_delay(mut self, delay: Duration) -> Self {
        self.recompute_delay = delay;
        self
    }

    pub fn with_cache_empty_pages(mut self, cache_empty_pages: bool) -> Self {
        self.cache_empty_pages = cache_empty_pages;
        self
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use sitemapper_cache::MemoryStore;
    use sitemapper_source::{MemorySource, ObjectKind, StoredObject};
    use std::sync::Arc;
    use time::OffsetDateTime;

    /// A context over an in-memory source and store, recording scheduled
    /// jobs instead of running them.
    pub(crate) fn context(source: MemorySource) -> (Context, Arc<RecordingScheduler>) {
        let scheduler = Arc::new(RecordingScheduler::new());
        let urls = UrlBuilder::new("https://example.com", true).unwrap();
        let ctx = Context::new(
            Arc::new(source),
            LastmodCache::new(Arc::new(MemoryStore::new())),
            scheduler.clone(),
            urls,
        );
        (ctx, scheduler)
    }

    /// `count` posts of the given sub-type with ids starting at `first_id`,
    /// each modified `id` minutes after the epoch.
    pub(crate) fn posts(sub_type: &str, first_id: u64, count: u64) -> Vec<StoredObject> {
        (first_id..first_id + count)
            .map(|id| {
                StoredObject::new(ObjectKind::Post, id, format!("https://example.com/{sub_type}/{id}/"))
                    .with_sub_type(sub_type)
                    .with_last_modified(minutes(id))
            })
            .collect()
    }

    pub(crate) fn minutes(n: u64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + time::Duration::minutes(n as i64)
    }
}
