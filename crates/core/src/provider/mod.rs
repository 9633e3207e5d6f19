//! The provider contract and the built-in providers.
//!
//! A [`Provider`] owns one content category. Implementors only describe how
//! to count and list their content; pagination, index contributions, URL
//! composition and lastmod caching come from the trait's provided methods and
//! behave identically for every category.

mod posts;
mod taxonomy;
mod users;

pub use self::posts::PostsProvider;
pub use self::taxonomy::TaxonomyProvider;
pub use self::users::UsersProvider;
use crate::error::{ErrorKind, Result};
use crate::route::is_routable_sub_type;
use crate::{Context, Job, SitemapEntry, SubType};
use async_trait::async_trait;
use exn::ResultExt;
use sitemapper_cache::{Lastmod, LastmodKey};
use sitemapper_source::{Filter, ObjectKind, Order};
use std::sync::Arc;
use time::OffsetDateTime;

pub type ProviderHandle = Arc<dyn Provider + Send + Sync>;

/// Where a call originates. Recompute jobs run with [`Origin::Job`] and must
/// never schedule further recomputes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Request,
    Job,
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Category identifier. Doubles as the route slug and the registry name.
    fn category(&self) -> &str;

    /// Maximum number of URLs on one sitemap page. Always at least 1.
    fn page_size(&self) -> u64;

    /// A sub-type this provider is pinned to, if any.
    fn fixed_sub_type(&self) -> Option<&str> {
        None
    }

    /// Whether this category has a notion of modification time at all.
    fn tracks_lastmod(&self) -> bool {
        true
    }

    /// Number of objects in `sub_type`.
    async fn count(&self, ctx: &Context, sub_type: &SubType) -> Result<u64>;

    /// At most `limit` entries of `sub_type`, skipping the first `offset`,
    /// ordered by object identifier ascending.
    async fn list(&self, ctx: &Context, sub_type: &SubType, offset: u64, limit: u64) -> Result<Vec<SitemapEntry>>;

    /// The sub-types this provider partitions its content into.
    ///
    /// Defaults to the fixed sub-type when there is one, otherwise the single
    /// [`SubType::None`] sentinel. Never empty unless the provider genuinely
    /// has nothing to contribute.
    async fn object_sub_types(&self, _ctx: &Context) -> Result<Vec<SubType>> {
        Ok(vec![self.fixed_sub_type().map(SubType::named).unwrap_or_default()])
    }

    /// `ceil(count / page_size)`.
    async fn max_num_pages(&self, ctx: &Context, sub_type: &SubType) -> Result<u64> {
        let count = self.count(ctx, sub_type).await?;
        Ok(count.div_ceil(self.page_size().max(1)))
    }

    /// The URLs on 1-indexed `page` of `sub_type`.
    ///
    /// Page `p` holds objects `(p - 1) * page_size` up to `p * page_size - 1`
    /// in identifier order, so appending content never moves the boundaries
    /// of earlier pages. A page outside `1..=max_num_pages` yields an empty
    /// list.
    async fn url_list(&self, ctx: &Context, page: u64, sub_type: &SubType) -> Result<Vec<SitemapEntry>> {
        if page == 0 {
            return Ok(Vec::new());
        }
        let size = self.page_size().max(1);
        let offset = (page - 1).saturating_mul(size);
        self.list(ctx, sub_type, offset, size).await
    }

    /// One entry per page per sub-type: this provider's contribution to the
    /// index.
    async fn sitemap_entries(&self, ctx: &Context, origin: Origin) -> Result<Vec<SitemapEntry>> {
        let mut entries = Vec::new();
        for sub_type in self.object_sub_types(ctx).await? {
            let pages = self.max_num_pages(ctx, &sub_type).await?;
            for page in 1..=pages {
                let location = self.sitemap_url(ctx, &sub_type, page);
                let last_modified = self.sitemap_lastmod(ctx, origin, &sub_type, page).await;
                entries.push(SitemapEntry { location, last_modified });
            }
        }
        Ok(entries)
    }

    fn sitemap_url(&self, ctx: &Context, sub_type: &SubType, page: u64) -> String {
        ctx.urls.sitemap(self.category(), sub_type, page)
    }

    /// Cached lastmod of a page.
    ///
    /// Never blocks on a recompute: a miss schedules one (unless already
    /// running inside a job) and reports the lastmod as unknown for now.
    /// Cache or scheduler failures are logged and also report unknown.
    async fn sitemap_lastmod(
        &self,
        ctx: &Context,
        origin: Origin,
        sub_type: &SubType,
        page: u64,
    ) -> Option<OffsetDateTime> {
        if !self.tracks_lastmod() {
            return None;
        }
        let key = LastmodKey::new(self.category(), sub_type.name(), page);
        match ctx.lastmod.get(&key).await {
            Ok(Lastmod::At(ts)) => Some(ts),
            Ok(Lastmod::Empty) => None,
            Ok(Lastmod::Absent) => {
                if origin == Origin::Request {
                    let job = Job::new(self.category(), sub_type.clone(), page);
                    if let Err(e) = ctx.scheduler.schedule_once(ctx.recompute_delay, job) {
                        tracing::warn!(%key, error = ?e, "Could not schedule lastmod recompute");
                    }
                }
                None
            },
            Err(e) => {
                tracing::warn!(%key, error = ?e, "Could not read cached lastmod");
                None
            },
        }
    }

    /// Recompute job body: store the most recent lastmod of the page's URLs.
    ///
    /// Jobs are broadcast to every provider, so a job for another category is
    /// a silent no-op returning `None`. Otherwise returns what the cache now
    /// holds for the page. A page without any timestamp is stored as
    /// [`Lastmod::Empty`] when `cache_empty_pages` is on, and left
    /// [`Lastmod::Absent`] otherwise.
    async fn calculate_sitemap_lastmod(
        &self,
        ctx: &Context,
        category: &str,
        sub_type: &SubType,
        page: u64,
    ) -> Result<Option<Lastmod>> {
        if category != self.category() || !self.tracks_lastmod() {
            return Ok(None);
        }
        let key = LastmodKey::new(category, sub_type.name(), page);
        let newest = self.url_list(ctx, page, sub_type).await?.into_iter().filter_map(|e| e.last_modified).max();
        if newest.is_none() && !ctx.cache_empty_pages {
            tracing::debug!(%key, "No lastmod found; leaving cache unset");
            return Ok(Some(Lastmod::Absent));
        }
        ctx.lastmod.set(&key, newest).await.or_raise(|| ErrorKind::Cache)?;
        tracing::debug!(%key, lastmod = ?newest, "Lastmod recomputed");
        Ok(Some(newest.map_or(Lastmod::Empty, Lastmod::At)))
    }
}

/// Count `kind` objects through the context's source.
async fn count_objects(ctx: &Context, kind: ObjectKind, filter: &Filter) -> Result<u64> {
    ctx.source.count(kind, filter).await.or_raise(|| ErrorKind::Source)
}

/// List `kind` objects through the context's source, identifier ascending.
async fn list_objects(
    ctx: &Context,
    kind: ObjectKind,
    filter: &Filter,
    offset: u64,
    limit: u64,
) -> Result<Vec<SitemapEntry>> {
    let records = ctx.source.list(kind, filter, Order::IdAscending, offset, limit).await.or_raise(|| ErrorKind::Source)?;
    Ok(records.into_iter().map(|r| SitemapEntry::new(r.location, r.last_modified)).collect())
}

/// Named sub-types of `kind` known to the source, or just the fixed one.
/// Names a sitemap URL could not be routed back from are left out.
async fn source_sub_types(ctx: &Context, kind: ObjectKind, fixed: Option<&str>) -> Result<Vec<SubType>> {
    let names = match fixed {
        Some(fixed) => vec![fixed.to_string()],
        None => ctx.source.sub_types(kind).await.or_raise(|| ErrorKind::Source)?,
    };
    let sub_types = names
        .into_iter()
        .filter(|name| {
            let routable = is_routable_sub_type(name);
            if !routable {
                tracing::warn!(%kind, sub_type = %name, "Skipping sub-type that sitemap URLs cannot carry");
            }
            routable
        })
        .map(SubType::Named)
        .collect();
    Ok(sub_types)
}
