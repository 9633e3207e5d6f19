use crate::error::Result;
use crate::provider::{Provider, count_objects, list_objects};
use crate::{Context, SitemapEntry, SubType};
use async_trait::async_trait;
use sitemapper_source::{Filter, ObjectKind, Visibility};

/// Authors with at least one published, publicly-queryable document.
///
/// Authors are not partitioned (the sub-type is always the sentinel) and have
/// no modification time, so none of their pages carry a lastmod and no
/// recompute is ever scheduled for them.
#[derive(Clone, Debug)]
pub struct UsersProvider {
    page_size: u64,
}
impl UsersProvider {
    pub const CATEGORY: &'static str = "users";

    pub fn new(page_size: u64) -> Self {
        Self { page_size: page_size.max(1) }
    }

    fn filter(sub_type: &SubType) -> Option<Filter> {
        sub_type.is_none().then(|| Filter::new(Visibility::Published))
    }
}

#[async_trait]
impl Provider for UsersProvider {
    fn category(&self) -> &str {
        Self::CATEGORY
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    fn tracks_lastmod(&self) -> bool {
        false
    }

    async fn count(&self, ctx: &Context, sub_type: &SubType) -> Result<u64> {
        let Some(filter) = Self::filter(sub_type) else {
            return Ok(0);
        };
        count_objects(ctx, ObjectKind::User, &filter).await
    }

    async fn list(&self, ctx: &Context, sub_type: &SubType, offset: u64, limit: u64) -> Result<Vec<SitemapEntry>> {
        let Some(filter) = Self::filter(sub_type) else {
            return Ok(Vec::new());
        };
        let mut entries = list_objects(ctx, ObjectKind::User, &filter, offset, limit).await?;
        for entry in &mut entries {
            entry.last_modified = None;
        }
        Ok(entries)
    }
}
