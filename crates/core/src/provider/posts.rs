use crate::error::Result;
use crate::provider::{Provider, count_objects, list_objects, source_sub_types};
use crate::{Context, SitemapEntry, SubType};
use async_trait::async_trait;
use sitemapper_source::{Filter, ObjectKind, Visibility};

/// Documents, partitioned by document kind (`post`, `page`, ...).
///
/// Only publicly viewable documents are listed. The sub-types are whatever
/// document kinds the source reports, unless the provider is pinned to one.
/// Asking for [`SubType::None`] yields nothing: documents are always
/// addressed through their kind.
#[derive(Clone, Debug)]
pub struct PostsProvider {
    page_size: u64,
    fixed_sub_type: Option<String>,
}
impl PostsProvider {
    pub const CATEGORY: &'static str = "posts";

    pub fn new(page_size: u64) -> Self {
        Self { page_size: page_size.max(1), fixed_sub_type: None }
    }

    /// Pin the provider to a single document kind.
    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.fixed_sub_type = Some(sub_type.into());
        self
    }

    fn filter(sub_type: &SubType) -> Option<Filter> {
        let name = sub_type.name()?;
        Some(Filter::new(Visibility::Public).with_sub_type(name.to_string()))
    }
}

#[async_trait]
impl Provider for PostsProvider {
    fn category(&self) -> &str {
        Self::CATEGORY
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    fn fixed_sub_type(&self) -> Option<&str> {
        self.fixed_sub_type.as_deref()
    }

    async fn object_sub_types(&self, ctx: &Context) -> Result<Vec<SubType>> {
        source_sub_types(ctx, ObjectKind::Post, self.fixed_sub_type()).await
    }

    async fn count(&self, ctx: &Context, sub_type: &SubType) -> Result<u64> {
        let Some(filter) = Self::filter(sub_type) else {
            return Ok(0);
        };
        count_objects(ctx, ObjectKind::Post, &filter).await
    }

    async fn list(&self, ctx: &Context, sub_type: &SubType, offset: u64, limit: u64) -> Result<Vec<SitemapEntry>> {
        let Some(filter) = Self::filter(sub_type) else {
            return Ok(Vec::new());
        };
        list_objects(ctx, ObjectKind::Post, &filter, offset, limit).await
    }
}
