//! Lastmod cache.
//!
//! Computing an accurate "last modified" value for a sitemap page means paging
//! through every object on that page, which is far too expensive to do inline
//! on every render. Instead the value is cached here per
//! `(category, sub-type, page)` and recomputed out-of-band when missing.

use crate::StoreHandle;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fmt::{Display, Formatter, Result as FmtResult};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::instrument;
use url::form_urlencoded::byte_serialize;

const KEY_PREFIX: &str = "sitemap_lastmod";

/// Cache address of a single sitemap page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LastmodKey {
    pub category: String,
    /// `None` for categories that are not partitioned into sub-types.
    pub sub_type: Option<String>,
    /// 1-indexed page number.
    pub page: u64,
}
impl LastmodKey {
    pub fn new(category: impl Into<String>, sub_type: Option<&str>, page: u64) -> Self {
        Self {
            category: category.into(),
            sub_type: sub_type.filter(|s| !s.is_empty()).map(str::to_string),
            page,
        }
    }

    /// The settings key this page's lastmod is stored under.
    ///
    /// Segments are joined with `:` and each name is form-encoded, so no
    /// name can contain the separator. The sentinel "no sub-type" becomes an
    /// empty segment: `("users", None, 2)` is stored as
    /// `sitemap_lastmod:users::2`.
    pub fn storage_key(&self) -> String {
        format!(
            "{}{}:{}",
            Self::category_prefix(&self.category),
            encode(self.sub_type.as_deref().unwrap_or_default()),
            self.page
        )
    }

    fn category_prefix(category: &str) -> String {
        format!("{KEY_PREFIX}:{}:", encode(category))
    }
}
fn encode(segment: &str) -> String {
    byte_serialize(segment.as_bytes()).collect()
}

impl Display for LastmodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "({}, {}, {})", self.category, self.sub_type.as_deref().unwrap_or("-"), self.page)
    }
}

/// Observable state of a cached lastmod value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lastmod {
    /// Nothing cached yet (or the cached value was unreadable). Triggers a
    /// recompute.
    Absent,
    /// A recompute ran and the page had no timestamps to offer.
    Empty,
    /// Most recent modification of any object on the page.
    At(OffsetDateTime),
}
impl Lastmod {
    /// The timestamp, if one is known.
    pub fn timestamp(&self) -> Option<OffsetDateTime> {
        match self {
            Self::At(ts) => Some(*ts),
            Self::Absent | Self::Empty => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Typed lastmod view over a [`SettingsStore`](crate::SettingsStore).
///
/// Timestamps are stored as RFC 3339 strings; the empty string marks a page
/// that was computed and found to have no timestamp.
///
/// # Examples
///
/// ```
/// use sitemapper_cache::{Lastmod, LastmodCache, LastmodKey, MemoryStore};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = LastmodCache::new(Arc::new(MemoryStore::new()));
/// let key = LastmodKey::new("posts", Some("page"), 3);
/// assert_eq!(cache.get(&key).await.unwrap(), Lastmod::Absent);
/// cache.set(&key, None).await.unwrap();
/// assert_eq!(cache.get(&key).await.unwrap(), Lastmod::Empty);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LastmodCache {
    store: StoreHandle,
}
impl LastmodCache {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Look up the cached lastmod for `key`.
    pub async fn get(&self, key: &LastmodKey) -> Result<Lastmod> {
        let Some(value) = self.store.get(&key.storage_key()).await? else {
            return Ok(Lastmod::Absent);
        };
        if value.is_empty() {
            return Ok(Lastmod::Empty);
        }
        match OffsetDateTime::parse(&value, &Rfc3339) {
            Ok(ts) => Ok(Lastmod::At(ts)),
            Err(e) => {
                // Derived data: treat garbage as a miss so it gets recomputed.
                tracing::warn!(%key, value = %value, error = %e, "Discarding unreadable cached lastmod");
                Ok(Lastmod::Absent)
            },
        }
    }

    /// Store the lastmod for `key`, overwriting whatever was there. `None`
    /// stores the "computed, but empty" marker.
    #[instrument(skip(self, key), fields(%key))]
    pub async fn set(&self, key: &LastmodKey, value: Option<OffsetDateTime>) -> Result<()> {
        let value = match value {
            Some(ts) => ts.format(&Rfc3339).or_raise(|| ErrorKind::InvalidData("timestamp"))?,
            None => String::new(),
        };
        self.store.set(&key.storage_key(), &value).await
    }

    /// Forget the lastmod for `key` so the next render recomputes it.
    pub async fn invalidate(&self, key: &LastmodKey) -> Result<bool> {
        self.store.delete(&key.storage_key()).await
    }

    /// Forget every cached lastmod of a category.
    pub async fn invalidate_category(&self, category: &str) -> Result<u64> {
        self.store.delete_prefix(&LastmodKey::category_prefix(category)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, MemoryStore, SettingsStore, SqliteStore};
    use rstest::rstest;
    use std::sync::Arc;
    use time::macros::datetime;

    #[rstest]
    #[case("posts", Some("page"), 3, "sitemap_lastmod:posts:page:3")]
    #[case("taxonomies", Some("post_tag"), 1, "sitemap_lastmod:taxonomies:post_tag:1")]
    #[case("users", None, 2, "sitemap_lastmod:users::2")]
    #[case("users", Some(""), 2, "sitemap_lastmod:users::2")]
    #[case("posts", Some("a:b"), 1, "sitemap_lastmod:posts:a%3Ab:1")]
    fn test_storage_key(#[case] category: &str, #[case] sub_type: Option<&str>, #[case] page: u64, #[case] key: &str) {
        assert_eq!(LastmodKey::new(category, sub_type, page).storage_key(), key);
    }

    #[tokio::test]
    async fn test_absent_empty_and_present() {
        let cache = LastmodCache::new(Arc::new(MemoryStore::new()));
        let key = LastmodKey::new("posts", Some("post"), 1);
        assert_eq!(cache.get(&key).await.unwrap(), Lastmod::Absent);

        cache.set(&key, None).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Lastmod::Empty);

        let ts = datetime!(2024-03-01 12:30:00 UTC);
        cache.set(&key, Some(ts)).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Lastmod::At(ts));
        assert_eq!(cache.get(&key).await.unwrap().timestamp(), Some(ts));
    }

    #[tokio::test]
    async fn test_offset_is_preserved() {
        let cache = LastmodCache::new(Arc::new(MemoryStore::new()));
        let key = LastmodKey::new("posts", Some("post"), 1);
        let ts = datetime!(2024-03-01 12:30:00 +02:00);
        cache.set(&key, Some(ts)).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Lastmod::At(ts));
    }

    #[tokio::test]
    async fn test_unreadable_value_is_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set("sitemap_lastmod:posts:post:1", "yesterday-ish").await.unwrap();
        let cache = LastmodCache::new(store);
        assert!(cache.get(&LastmodKey::new("posts", Some("post"), 1)).await.unwrap().is_absent());
    }

    #[rstest]
    #[case(("posts", Some("x_y"), 1), ("posts_x", Some("y"), 1))]
    #[case(("posts", Some("a:b"), 1), ("posts:a", Some("b"), 1))]
    #[case(("posts", Some("1"), 1), ("posts", None, 11))]
    fn test_distinct_keys_stay_distinct(
        #[case] a: (&str, Option<&str>, u64),
        #[case] b: (&str, Option<&str>, u64),
    ) {
        let a = LastmodKey::new(a.0, a.1, a.2);
        let b = LastmodKey::new(b.0, b.1, b.2);
        assert_ne!(a.storage_key(), b.storage_key());
    }

    #[tokio::test]
    async fn test_similar_keys_do_not_share_values() {
        let cache = LastmodCache::new(Arc::new(MemoryStore::new()));
        let a = LastmodKey::new("posts", Some("x_y"), 1);
        let b = LastmodKey::new("posts_x", Some("y"), 1);
        cache.set(&a, None).await.unwrap();
        assert_eq!(cache.get(&a).await.unwrap(), Lastmod::Empty);
        assert!(cache.get(&b).await.unwrap().is_absent());
    }

    #[tokio::test]
    async fn test_invalidate_category_stays_in_category() {
        let db = Database::connect_in_memory().await.unwrap();
        let cache = LastmodCache::new(Arc::new(SqliteStore::from(&db)));
        let ts = datetime!(2024-01-01 00:00:00 UTC);
        let posts = LastmodKey::new("posts", Some("post"), 1);
        let lookalike = LastmodKey::new("posts_archive", Some("post"), 1);
        cache.set(&posts, Some(ts)).await.unwrap();
        cache.set(&lookalike, Some(ts)).await.unwrap();

        assert_eq!(cache.invalidate_category("posts").await.unwrap(), 1);
        assert!(cache.get(&posts).await.unwrap().is_absent());
        assert_eq!(cache.get(&lookalike).await.unwrap(), Lastmod::At(ts));
    }

    #[tokio::test]
    async fn test_invalidate_category() {
        let db = Database::connect_in_memory().await.unwrap();
        let cache = LastmodCache::new(Arc::new(SqliteStore::from(&db)));
        let ts = datetime!(2024-01-01 00:00:00 UTC);
        for page in 1..=3 {
            cache.set(&LastmodKey::new("posts", Some("post"), page), Some(ts)).await.unwrap();
        }
        let users = LastmodKey::new("users", None, 1);
        cache.set(&users, Some(ts)).await.unwrap();

        assert_eq!(cache.invalidate_category("posts").await.unwrap(), 3);
        assert!(cache.get(&LastmodKey::new("posts", Some("post"), 2)).await.unwrap().is_absent());
        assert_eq!(cache.get(&users).await.unwrap(), Lastmod::At(ts));
        assert!(cache.invalidate(&users).await.unwrap());
        assert!(cache.get(&users).await.unwrap().is_absent());
    }
}
