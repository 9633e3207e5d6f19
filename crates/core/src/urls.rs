//! Sitemap URL composition.

use crate::SubType;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sitemapper_render::Stylesheet;
use std::fmt::Write;
use url::{Url, form_urlencoded};

/// Composes every URL the sitemap exposes.
///
/// All methods are pure functions of their arguments and the builder's
/// configuration, so a URL can be linked or cached without ever being
/// recomputed. With pretty URLs the values are encoded in the path
/// (`/sitemap-posts-page-3.xml`); without, they are carried as query
/// parameters (`/?sitemap=posts&sub_type=page&paged=3`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlBuilder {
    /// Site root without a trailing slash.
    base: String,
    /// Path component of `base`, without a trailing slash (empty at the root).
    base_path: String,
    pretty: bool,
}
impl UrlBuilder {
    pub fn new(base_url: &str, pretty: bool) -> Result<Self> {
        let parsed = Url::parse(base_url).or_raise(|| ErrorKind::Config(format!("invalid base URL: {base_url}")))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            exn::bail!(ErrorKind::Config(format!("base URL must be an absolute http(s) URL: {base_url}")));
        }
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
            base_path: parsed.path().trim_end_matches('/').to_string(),
            pretty,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Path prefix every sitemap route lives under.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    pub fn index(&self) -> String {
        if self.pretty {
            format!("{}/sitemap-index.xml", self.base)
        } else {
            self.query(&[("sitemap", "index")])
        }
    }

    /// URL of one sitemap page.
    ///
    /// The page number is left out only for page 1 of a category without
    /// sub-types. A category with sub-types always carries both the sub-type
    /// and the page, even on page 1.
    pub fn sitemap(&self, category: &str, sub_type: &SubType, page: u64) -> String {
        let omit_page = sub_type.is_none() && page == 1;
        if self.pretty {
            let mut name = format!("sitemap-{category}");
            if let Some(sub_type) = sub_type.name() {
                name.push('-');
                name.push_str(sub_type);
            }
            if !omit_page {
                // Infallible: writing to a String never fails.
                let _ = write!(name, "-{page}");
            }
            format!("{}/{name}.xml", self.base)
        } else {
            let page = page.to_string();
            let mut pairs = vec![("sitemap", category)];
            if let Some(sub_type) = sub_type.name() {
                pairs.push(("sub_type", sub_type));
            }
            if !omit_page {
                pairs.push(("paged", page.as_str()));
            }
            self.query(&pairs)
        }
    }

    pub fn stylesheet(&self, stylesheet: Stylesheet) -> String {
        if self.pretty {
            format!("{}/{}", self.base, stylesheet.file_name())
        } else {
            let name = match stylesheet {
                Stylesheet::Index => "index",
                Stylesheet::Leaf => "sitemap",
            };
            self.query(&[("sitemap-stylesheet", name)])
        }
    }

    /// The `Sitemap:` directive advertising the index in robots.txt.
    pub fn robots_txt_line(&self) -> String {
        format!("Sitemap: {}", self.index())
    }

    fn query(&self, pairs: &[(&str, &str)]) -> String {
        let query = form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();
        format!("{}/?{query}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pretty() -> UrlBuilder {
        UrlBuilder::new("https://example.com/", true).unwrap()
    }

    fn plain() -> UrlBuilder {
        UrlBuilder::new("https://example.com", false).unwrap()
    }

    #[rstest]
    #[case("posts", SubType::named("page"), 3, "https://example.com/sitemap-posts-page-3.xml")]
    #[case("posts", SubType::named("post"), 1, "https://example.com/sitemap-posts-post-1.xml")]
    #[case("users", SubType::None, 2, "https://example.com/sitemap-users-2.xml")]
    #[case("users", SubType::None, 1, "https://example.com/sitemap-users.xml")]
    fn test_pretty_sitemap_url(
        #[case] category: &str,
        #[case] sub_type: SubType,
        #[case] page: u64,
        #[case] expected: &str,
    ) {
        assert_eq!(pretty().sitemap(category, &sub_type, page), expected);
    }

    #[rstest]
    #[case("posts", SubType::named("page"), 3, "https://example.com/?sitemap=posts&sub_type=page&paged=3")]
    #[case("users", SubType::None, 1, "https://example.com/?sitemap=users")]
    #[case("users", SubType::None, 4, "https://example.com/?sitemap=users&paged=4")]
    #[case("posts", SubType::named("a&b"), 1, "https://example.com/?sitemap=posts&sub_type=a%26b&paged=1")]
    fn test_query_sitemap_url(
        #[case] category: &str,
        #[case] sub_type: SubType,
        #[case] page: u64,
        #[case] expected: &str,
    ) {
        assert_eq!(plain().sitemap(category, &sub_type, page), expected);
    }

    #[test]
    fn test_sitemap_url_is_pure() {
        let urls = pretty();
        let sub_type = SubType::named("page");
        let first = urls.sitemap("posts", &sub_type, 7);
        for _ in 0..3 {
            assert_eq!(urls.sitemap("posts", &sub_type, 7), first);
        }
        assert_eq!(pretty().sitemap("posts", &sub_type, 7), first);
    }

    #[test]
    fn test_index_and_stylesheets() {
        assert_eq!(pretty().index(), "https://example.com/sitemap-index.xml");
        assert_eq!(plain().index(), "https://example.com/?sitemap=index");
        assert_eq!(pretty().stylesheet(Stylesheet::Leaf), "https://example.com/sitemap.xsl");
        assert_eq!(pretty().stylesheet(Stylesheet::Index), "https://example.com/sitemap-index.xsl");
        assert_eq!(plain().stylesheet(Stylesheet::Index), "https://example.com/?sitemap-stylesheet=index");
        assert_eq!(pretty().robots_txt_line(), "Sitemap: https://example.com/sitemap-index.xml");
    }

    #[test]
    fn test_base_path() {
        let urls = UrlBuilder::new("https://example.com/blog/", true).unwrap();
        assert_eq!(urls.base_path(), "/blog");
        assert_eq!(urls.index(), "https://example.com/blog/sitemap-index.xml");
        assert_eq!(pretty().base_path(), "");
    }

    #[rstest]
    #[case("example.com")]
    #[case("ftp://example.com")]
    #[case("mailto:someone@example.com")]
    fn test_invalid_base_url(#[case] base_url: &str) {
        let err = UrlBuilder::new(base_url, true).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Config(_)));
    }
}
