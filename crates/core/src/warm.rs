use crate::error::{Error, Result};
use crate::{Context, ProviderHandle, Registry, SubType};
use async_stream::stream;
use futures::{Stream, StreamExt};
use sitemapper_cache::{Lastmod, LastmodKey};

const WARM_CONCURRENCY: usize = 8;

/// Progress events emitted by [`warm`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete), exactly once, with the
///    number of pages that will be recomputed.
/// 3. [`Computed`](Self::Computed), once per page.
/// 4. [`Complete`](Self::Complete), exactly once.
///
/// A discovery failure ends the stream early, without `Complete`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarmEvent {
    Started,
    DiscoveryComplete(u64),
    /// A page's lastmod was recomputed; carries what the cache now holds.
    Computed(LastmodKey, Lastmod),
    Complete,
}

/// Recompute the lastmod of every page of every provider that tracks one,
/// in job context, so the next index render finds a warm cache.
///
/// Individual page failures are yielded as `Err` items without ending the
/// stream.
pub fn warm<'a>(ctx: &'a Context, registry: &'a Registry) -> impl Stream<Item = Result<WarmEvent>> + 'a {
    stream!({
        yield Ok(WarmEvent::Started);

        let pages = match discover(ctx, registry).await {
            Ok(pages) => pages,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield Ok(WarmEvent::DiscoveryComplete(u64::try_from(pages.len()).unwrap_or(0)));

        let mut computed = futures::stream::iter(pages)
            .map(|(provider, sub_type, page)| async move {
                let category = provider.category();
                let key = LastmodKey::new(category, sub_type.name(), page);
                let stored = provider.calculate_sitemap_lastmod(ctx, category, &sub_type, page).await?;
                Ok::<_, Error>(WarmEvent::Computed(key, stored.unwrap_or(Lastmod::Absent)))
            })
            .buffered(WARM_CONCURRENCY);
        while let Some(event) = computed.next().await {
            yield event;
        }

        yield Ok(WarmEvent::Complete);
    })
}

async fn discover(ctx: &Context, registry: &Registry) -> Result<Vec<(ProviderHandle, SubType, u64)>> {
    let mut pages = Vec::new();
    for (name, provider) in registry.all() {
        if !provider.tracks_lastmod() {
            tracing::debug!(provider = name, "Skipping provider without lastmod");
            continue;
        }
        for sub_type in provider.object_sub_types(ctx).await? {
            let count = provider.max_num_pages(ctx, &sub_type).await?;
            pages.extend((1..=count).map(|page| (provider.clone(), sub_type.clone(), page)));
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{PostsProvider, UsersProvider};
    use crate::testing::{context, minutes, posts};
    use crate::RegistryBuilder;
    use sitemapper_source::{MemorySource, ObjectKind, StoredObject};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_warm_computes_every_page() {
        let mut objects = posts("post", 1, 5);
        objects.extend(posts("page", 10, 1));
        objects.push(StoredObject::new(ObjectKind::User, 1, "https://example.com/author/1/").with_published(1));
        let (ctx, scheduler) = context(MemorySource::with_objects(objects));
        let registry = RegistryBuilder::new()
            .extend(|registry| {
                registry.register(Arc::new(PostsProvider::new(2)));
                registry.register(Arc::new(UsersProvider::new(2)));
            })
            .build();

        let events: Vec<_> = warm(&ctx, &registry).map(|e| e.unwrap()).collect().await;
        assert_eq!(
            events,
            vec![
                WarmEvent::Started,
                WarmEvent::DiscoveryComplete(4),
                WarmEvent::Computed(LastmodKey::new("posts", Some("page"), 1), Lastmod::At(minutes(10))),
                WarmEvent::Computed(LastmodKey::new("posts", Some("post"), 1), Lastmod::At(minutes(2))),
                WarmEvent::Computed(LastmodKey::new("posts", Some("post"), 2), Lastmod::At(minutes(4))),
                WarmEvent::Computed(LastmodKey::new("posts", Some("post"), 3), Lastmod::At(minutes(5))),
                WarmEvent::Complete,
            ]
        );
        assert!(scheduler.jobs().is_empty());

        // The index now renders with every lastmod known and schedules nothing.
        let provider = registry.get("posts").unwrap();
        let entries = provider.sitemap_entries(&ctx, crate::Origin::Request).await.unwrap();
        assert!(entries.iter().all(|e| e.last_modified.is_some()));
        assert!(scheduler.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_warm_empty_registry() {
        let (ctx, _) = context(MemorySource::default());
        let registry = Registry::new();
        let events: Vec<_> = warm(&ctx, &registry).map(|e| e.unwrap()).collect().await;
        assert_eq!(events, vec![WarmEvent::Started, WarmEvent::DiscoveryComplete(0), WarmEvent::Complete]);
    }
}
