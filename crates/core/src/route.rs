//! Request path to sitemap resolution.
//!
//! Pretty paths:
//!
//! | Path | Route |
//! |---|---|
//! | `/sitemap-index.xml`, `/sitemap.xml` | index |
//! | `/sitemap-{category}-{sub_type}-{page}.xml` | leaf with sub-type |
//! | `/sitemap-{category}-{page}.xml` | leaf without sub-type |
//! | `/sitemap-{category}.xml` | page 1 without sub-type |
//! | `/sitemap.xsl`, `/sitemap-index.xsl` | stylesheets |
//!
//! Without pretty routing the same values come from the `sitemap`,
//! `sub_type` and `paged` query parameters of a request to the site root
//! (`sitemap=index` for the index, `sitemap-stylesheet=index|sitemap` for
//! the stylesheets).
//!
//! Categories are made of ASCII letters, digits, `_` and `.`; sub-types may
//! also contain `-`. The page number is always the last `-` segment, so a
//! sub-type like `x-2` still parses back unambiguously. Names outside these
//! sets are kept out of the registry and the index (see
//! [`is_routable_category`] and [`is_routable_sub_type`]).

use crate::SubType;
use regex::Regex;
use sitemapper_render::Stylesheet;
use std::sync::LazyLock;
use url::form_urlencoded;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(CATEGORY_REGEX, r"^[A-Za-z0-9_.]+$");
regex!(SUB_TYPE_REGEX, r"^[A-Za-z0-9_.-]+$");
regex!(SUB_TYPE_PAGE_REGEX, r"^sitemap-([A-Za-z0-9_.]+)-([A-Za-z0-9_.-]+)-([0-9]+)\.xml$");
regex!(PAGE_REGEX, r"^sitemap-([A-Za-z0-9_.]+)-([0-9]+)\.xml$");
regex!(FIRST_PAGE_REGEX, r"^sitemap-([A-Za-z0-9_.]+)\.xml$");

/// Whether sitemap URLs of `category` can be routed back to it. `index` is
/// taken by the sitemap index itself.
pub(crate) fn is_routable_category(category: &str) -> bool {
    category != "index" && CATEGORY_REGEX.is_match(category)
}

pub(crate) fn is_routable_sub_type(sub_type: &str) -> bool {
    SUB_TYPE_REGEX.is_match(sub_type)
}

/// What a request path asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Index,
    Sitemap { category: String, sub_type: SubType, page: u64 },
    Stylesheet(Stylesheet),
}
impl Route {
    /// Resolve a path (with optional query string) relative to the site
    /// root. `None` means the request is not for a sitemap at all.
    pub fn parse(path_and_query: &str) -> Option<Self> {
        let (path, query) = path_and_query.split_once('?').unwrap_or((path_and_query, ""));
        let path = path.trim_start_matches('/');
        if path.is_empty() || path == "index.php" {
            Self::parse_query(query)
        } else {
            Self::parse_path(path)
        }
    }

    fn parse_path(path: &str) -> Option<Self> {
        match path {
            "sitemap.xml" | "sitemap-index.xml" => return Some(Self::Index),
            "sitemap.xsl" => return Some(Self::Stylesheet(Stylesheet::Leaf)),
            "sitemap-index.xsl" => return Some(Self::Stylesheet(Stylesheet::Index)),
            _ => {},
        }
        if let Some(captures) = SUB_TYPE_PAGE_REGEX.captures(path) {
            return Some(Self::Sitemap {
                category: captures[1].to_string(),
                sub_type: SubType::named(&captures[2]),
                page: captures[3].parse().ok()?,
            });
        }
        if let Some(captures) = PAGE_REGEX.captures(path) {
            return Some(Self::Sitemap {
                category: captures[1].to_string(),
                sub_type: SubType::None,
                page: captures[2].parse().ok()?,
            });
        }
        FIRST_PAGE_REGEX.captures(path).map(|captures| Self::Sitemap {
            category: captures[1].to_string(),
            sub_type: SubType::None,
            page: 1,
        })
    }

    fn parse_query(query: &str) -> Option<Self> {
        let (mut sitemap, mut sub_type, mut paged, mut stylesheet) = (None, None, None, None);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "sitemap" => sitemap = Some(value.into_owned()),
                "sub_type" => sub_type = Some(value.into_owned()),
                "paged" => paged = Some(value.into_owned()),
                "sitemap-stylesheet" => stylesheet = Some(value.into_owned()),
                _ => {},
            }
        }
        if let Some(stylesheet) = stylesheet {
            return stylesheet.parse().ok().map(Self::Stylesheet);
        }
        let category = sitemap.filter(|s| !s.is_empty())?;
        if category == "index" {
            return Some(Self::Index);
        }
        // An unreadable page number is a page that does not exist.
        let page = paged.map_or(1, |p| p.trim().parse().unwrap_or(0));
        Some(Self::Sitemap { category, sub_type: SubType::from(sub_type), page })
    }
}
