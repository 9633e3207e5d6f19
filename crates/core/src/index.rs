use crate::error::Result;
use crate::{Context, Origin, Registry, SitemapEntry};
use sitemapper_render::MAX_ENTRIES;
use tracing::instrument;

/// Builds the top-level index: one entry per page of every provider.
pub struct IndexBuilder<'a> {
    registry: &'a Registry,
}
impl<'a> IndexBuilder<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Every provider's entries concatenated in registration order. Not
    /// deduplicated; registry names are already unique.
    ///
    /// An index can list at most [`MAX_ENTRIES`] sitemaps; anything beyond is
    /// dropped with a warning rather than failing the whole index.
    #[instrument(skip_all, fields(providers = self.registry.len()))]
    pub async fn build_index(&self, ctx: &Context) -> Result<Vec<SitemapEntry>> {
        let mut entries = Vec::new();
        for (name, provider) in self.registry.all() {
            let contributed = provider.sitemap_entries(ctx, Origin::Request).await?;
            tracing::debug!(provider = name, entries = contributed.len(), "Collected index entries");
            entries.extend(contributed);
        }
        if entries.len() > MAX_ENTRIES {
            tracing::warn!(entries = entries.len(), limit = MAX_ENTRIES, "Sitemap index truncated");
            entries.truncate(MAX_ENTRIES);
        }
        Ok(entries)
    }
}
