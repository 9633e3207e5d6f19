use crate::error::{ErrorKind, Result};
use crate::provider::{PostsProvider, TaxonomyProvider, UsersProvider};
use crate::route::is_routable_category;
use crate::{Context, Job, ProviderHandle};
use sitemapper_cache::Lastmod;
use sitemapper_config::SitemapsConfig;
use std::sync::Arc;
use tracing::instrument;

/// The active providers, keyed by name, in registration order.
///
/// Populated once at startup (see [`RegistryBuilder`]) and only read
/// afterwards.
#[derive(Clone, Default)]
pub struct Registry {
    providers: Vec<(String, ProviderHandle)>,
}
impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `name`. A provider already registered under
    /// that name is replaced in place (keeping its position) and returned.
    ///
    /// Sitemap URLs carry the provider's category, and routes resolve that
    /// category through [`get`](Self::get). A provider added under any other
    /// name still contributes to the index, but its pages are never served;
    /// prefer [`register`](Self::register). A provider whose category cannot
    /// appear in a sitemap URL is not added at all.
    pub fn add(&mut self, name: impl Into<String>, provider: ProviderHandle) -> Option<ProviderHandle> {
        let name = name.into();
        let category = provider.category();
        if !is_routable_category(category) {
            tracing::warn!(%name, category, "Ignoring sitemap provider whose category cannot be routed");
            return None;
        }
        if name != category {
            tracing::warn!(%name, category, "Sitemap provider registered under a name other than its category");
        }
        if let Some((_, existing)) = self.providers.iter_mut().find(|(n, _)| *n == name) {
            tracing::debug!(%name, "Replacing registered sitemap provider");
            return Some(std::mem::replace(existing, provider));
        }
        self.providers.push((name, provider));
        None
    }

    /// Register `provider` under its own category, which is the name routes
    /// resolve it by.
    pub fn register(&mut self, provider: ProviderHandle) -> Option<ProviderHandle> {
        let name = provider.category().to_string();
        self.add(name, provider)
    }

    pub fn get(&self, name: &str) -> Option<&ProviderHandle> {
        self.providers.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Every provider with its name, in registration order.
    pub fn all(&self) -> impl Iterator<Item = (&str, &ProviderHandle)> {
        self.providers.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Broadcast a recompute job. Only the provider owning the job's category
    /// acts on it; returns what it stored, or `None` if no provider did.
    #[instrument(skip(self, ctx), fields(%job))]
    pub async fn run_job(&self, ctx: &Context, job: &Job) -> Result<Option<Lastmod>> {
        let mut outcome = None;
        for (_, provider) in &self.providers {
            let stored = provider.calculate_sitemap_lastmod(ctx, &job.category, &job.sub_type, job.page).await?;
            if stored.is_some() {
                outcome = stored;
            }
        }
        if outcome.is_none() {
            tracing::debug!("No provider handled job");
        }
        Ok(outcome)
    }
}

/// Assembles the [`Registry`] during initialization: the built-in providers
/// named in configuration, then any extensions.
///
/// ```
/// use sitemapper_core::RegistryBuilder;
/// use sitemapper_core::provider::PostsProvider;
/// use std::sync::Arc;
///
/// let registry = RegistryBuilder::new()
///     .extend(|registry| {
///         registry.register(Arc::new(PostsProvider::new(100).with_sub_type("page")));
///     })
///     .build();
/// assert!(registry.get("posts").is_some());
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    registry: Registry,
}
impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the built-in providers listed in `config.providers`, each
    /// with its configured page size.
    pub fn from_config(config: &SitemapsConfig) -> Result<Self> {
        let mut registry = Registry::new();
        for name in &config.providers {
            let page_size = config.page_size_for(name);
            let provider: ProviderHandle = match name.as_str() {
                PostsProvider::CATEGORY => Arc::new(PostsProvider::new(page_size)),
                TaxonomyProvider::CATEGORY => Arc::new(TaxonomyProvider::new(page_size)),
                UsersProvider::CATEGORY => Arc::new(UsersProvider::new(page_size)),
                other => exn::bail!(ErrorKind::Config(format!("unknown sitemap provider: {other}"))),
            };
            registry.add(name.as_str(), provider);
        }
        Ok(Self { registry })
    }

    /// Let a collaborator add, replace or inspect providers before the
    /// registry is frozen. Extensions run in the order they are given.
    pub fn extend(mut self, extension: impl FnOnce(&mut Registry)) -> Self {
        extension(&mut self.registry);
        self
    }

    pub fn build(self) -> Registry {
        tracing::debug!(providers = self.registry.len(), "Sitemap registry built");
        self.registry
    }
}
