//! XML rendering for sitemaps and sitemap indexes.
//!
//! Documents follow the [sitemaps.org 0.9 protocol](https://www.sitemaps.org/protocol.html):
//! an index is a `<sitemapindex>` of `<sitemap>` children, a leaf sitemap is a
//! `<urlset>` of `<url>` children. Each child carries a `<loc>` and, when one
//! is known, a `<lastmod>`.

pub mod error;
mod render;
mod stylesheet;

pub use crate::render::{Entry, escape_xml};
pub use crate::stylesheet::{Builtins, Stylesheet};

/// Namespace of every rendered document.
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
/// Protocol limit on the number of children of a single document.
pub const MAX_ENTRIES: usize = 50_000;

/// Renders sitemap documents, optionally linking an XSL stylesheet so browsers
/// show a readable table instead of raw XML.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    stylesheets: Option<StylesheetLinks>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct StylesheetLinks {
    index: String,
    leaf: String,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link the given stylesheet URLs from index and leaf documents
    /// respectively.
    pub fn with_stylesheets(mut self, index: impl Into<String>, leaf: impl Into<String>) -> Self {
        self.stylesheets = Some(StylesheetLinks {
            index: index.into(),
            leaf: leaf.into(),
        });
        self
    }

    pub(crate) fn stylesheet_for(&self, stylesheet: Stylesheet) -> Option<&str> {
        self.stylesheets.as_ref().map(|links| match stylesheet {
            Stylesheet::Index => links.index.as_str(),
            Stylesheet::Leaf => links.leaf.as_str(),
        })
    }
}
