use crate::error::{ErrorKind, Result};
use crate::{MAX_ENTRIES, Renderer, SITEMAP_NAMESPACE, Stylesheet};
use exn::ResultExt;
use std::borrow::Cow;
use std::fmt::Write;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::instrument;

/// One child of a rendered document: a sitemap page in an index, or a URL in
/// a leaf sitemap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry<'a> {
    pub location: &'a str,
    pub last_modified: Option<OffsetDateTime>,
}
impl<'a> Entry<'a> {
    pub fn new(location: &'a str, last_modified: Option<OffsetDateTime>) -> Self {
        Self { location, last_modified }
    }
}

impl Stylesheet {
    fn root_element(&self) -> &'static str {
        match self {
            Self::Index => "sitemapindex",
            Self::Leaf => "urlset",
        }
    }

    fn child_element(&self) -> &'static str {
        match self {
            Self::Index => "sitemap",
            Self::Leaf => "url",
        }
    }
}

impl Renderer {
    /// Render a `<sitemapindex>` document.
    pub fn render_index<'a>(&self, entries: impl IntoIterator<Item = Entry<'a>>) -> Result<String> {
        self.render(Stylesheet::Index, entries)
    }

    /// Render a `<urlset>` document.
    pub fn render_leaf<'a>(&self, entries: impl IntoIterator<Item = Entry<'a>>) -> Result<String> {
        self.render(Stylesheet::Leaf, entries)
    }

    #[instrument(skip_all, fields(document = kind.root_element()))]
    fn render<'a>(&self, kind: Stylesheet, entries: impl IntoIterator<Item = Entry<'a>>) -> Result<String> {
        let entries: Vec<Entry<'a>> = entries.into_iter().collect();
        if entries.len() > MAX_ENTRIES {
            exn::bail!(ErrorKind::TooManyEntries(entries.len()));
        }

        let (root, child) = (kind.root_element(), kind.child_element());
        let mut xml = String::with_capacity(256 + entries.len() * 128);
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        if let Some(href) = self.stylesheet_for(kind) {
            // Infallible: writing to a String never fails.
            let _ = writeln!(xml, "<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>", escape_xml(href));
        }
        let _ = writeln!(xml, "<{root} xmlns=\"{SITEMAP_NAMESPACE}\">");
        for entry in &entries {
            let _ = writeln!(xml, "  <{child}>");
            let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(entry.location));
            if let Some(last_modified) = entry.last_modified {
                let formatted = last_modified.format(&Rfc3339).or_raise(|| ErrorKind::Timestamp)?;
                let _ = writeln!(xml, "    <lastmod>{formatted}</lastmod>");
            }
            let _ = writeln!(xml, "  </{child}>");
        }
        let _ = writeln!(xml, "</{root}>");

        tracing::debug!(entries = entries.len(), bytes = xml.len(), "Rendered sitemap document");
        Ok(xml)
    }
}

/// Escape the five XML special characters.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}
