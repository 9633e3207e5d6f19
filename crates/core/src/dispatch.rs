use crate::error::{ErrorKind, Result};
use crate::{Context, IndexBuilder, ProviderHandle, Registry, Route, SitemapEntry, SubType};
use exn::ResultExt;
use sitemapper_render::{Entry, Renderer, Stylesheet};
use std::borrow::Cow;
use tracing::instrument;

/// Callback adjusting a leaf sitemap's URLs before rendering. Receives the
/// category, sub-type and page being rendered.
pub type UrlListTransform = Box<dyn Fn(&str, &SubType, u64, Vec<SitemapEntry>) -> Vec<SitemapEntry> + Send + Sync>;
/// Callback adjusting the index entries before rendering.
pub type IndexTransform = Box<dyn Fn(Vec<SitemapEntry>) -> Vec<SitemapEntry> + Send + Sync>;

/// Pre-render transforms, applied in the order they were added.
#[derive(Default)]
pub struct Transforms {
    url_list: Vec<UrlListTransform>,
    index: Vec<IndexTransform>,
}
impl Transforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_url_list(
        mut self,
        transform: impl Fn(&str, &SubType, u64, Vec<SitemapEntry>) -> Vec<SitemapEntry> + Send + Sync + 'static,
    ) -> Self {
        self.url_list.push(Box::new(transform));
        self
    }

    pub fn on_index(
        mut self,
        transform: impl Fn(Vec<SitemapEntry>) -> Vec<SitemapEntry> + Send + Sync + 'static,
    ) -> Self {
        self.index.push(Box::new(transform));
        self
    }

    fn apply_url_list(
        &self,
        category: &str,
        sub_type: &SubType,
        page: u64,
        entries: Vec<SitemapEntry>,
    ) -> Vec<SitemapEntry> {
        self.url_list.iter().fold(entries, |entries, transform| transform(category, sub_type, page, entries))
    }

    fn apply_index(&self, entries: Vec<SitemapEntry>) -> Vec<SitemapEntry> {
        self.index.iter().fold(entries, |entries, transform| transform(entries))
    }
}

/// Outcome of dispatching a request path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// A rendered sitemap or sitemap index.
    Xml(String),
    Stylesheet(Cow<'static, [u8]>),
    /// A sitemap route whose page has no URLs.
    NotFound,
    /// Not a sitemap route, or a sitemap name nobody registered. Let the rest
    /// of the site handle it.
    PassThrough,
}
impl Response {
    /// HTTP-equivalent status code, if the request was handled here.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Xml(_) | Self::Stylesheet(_) => Some(200),
            Self::NotFound => Some(404),
            Self::PassThrough => None,
        }
    }

    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Xml(_) => Some("application/xml; charset=UTF-8"),
            Self::Stylesheet(_) => Some(Stylesheet::CONTENT_TYPE),
            Self::NotFound | Self::PassThrough => None,
        }
    }
}

/// Answers sitemap requests: resolves the route, asks the registry or index
/// builder for entries, applies transforms and renders.
pub struct Dispatcher {
    ctx: Context,
    registry: Registry,
    renderer: Renderer,
    transforms: Transforms,
}
impl Dispatcher {
    pub fn new(ctx: Context, registry: Registry) -> Self {
        Self {
            ctx,
            registry,
            renderer: Renderer::new(),
            transforms: Transforms::default(),
        }
    }

    /// Link the XSL stylesheets from every rendered document.
    pub fn with_stylesheets(mut self) -> Self {
        let (index, leaf) = (self.ctx.urls.stylesheet(Stylesheet::Index), self.ctx.urls.stylesheet(Stylesheet::Leaf));
        self.renderer = self.renderer.with_stylesheets(index, leaf);
        self
    }

    pub fn with_transforms(mut self, transforms: Transforms) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn resolve(&self, name: &str) -> Option<&ProviderHandle> {
        self.registry.get(name)
    }

    pub fn robots_txt_line(&self) -> String {
        self.ctx.urls.robots_txt_line()
    }

    /// Handle a request for `path_and_query`, as seen by the web server.
    /// The path of the configured base URL is stripped before routing.
    #[instrument(skip(self))]
    pub async fn handle(&self, path_and_query: &str) -> Result<Response> {
        let relative = path_and_query.strip_prefix(self.ctx.urls.base_path()).unwrap_or(path_and_query);
        let Some(route) = Route::parse(relative) else {
            return Ok(Response::PassThrough);
        };
        match route {
            Route::Index => self.index().await,
            Route::Sitemap { category, sub_type, page } => self.sitemap(&category, &sub_type, page).await,
            Route::Stylesheet(stylesheet) => {
                Ok(Response::Stylesheet(stylesheet.content().or_raise(|| ErrorKind::Render)?))
            },
        }
    }

    pub async fn index(&self) -> Result<Response> {
        let entries = IndexBuilder::new(&self.registry).build_index(&self.ctx).await?;
        let entries = self.transforms.apply_index(entries);
        let xml = self.renderer.render_index(entries.iter().map(Entry::from)).or_raise(|| ErrorKind::Render)?;
        Ok(Response::Xml(xml))
    }

    /// Errors from the object source propagate; an unknown provider passes
    /// through and an empty page is not found.
    pub async fn sitemap(&self, category: &str, sub_type: &SubType, page: u64) -> Result<Response> {
        let Some(provider) = self.resolve(category) else {
            tracing::debug!(category, "No sitemap provider registered");
            return Ok(Response::PassThrough);
        };
        let entries = provider.url_list(&self.ctx, page, sub_type).await?;
        let entries = self.transforms.apply_url_list(category, sub_type, page, entries);
        if entries.is_empty() {
            return Ok(Response::NotFound);
        }
        let xml = self.renderer.render_leaf(entries.iter().map(Entry::from)).or_raise(|| ErrorKind::Render)?;
        Ok(Response::Xml(xml))
    }
}
