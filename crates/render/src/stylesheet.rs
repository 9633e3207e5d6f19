//! Embedded XSL stylesheets.
//!
//! The stylesheets are embedded into the binary at compile time using
//! [`rust-embed`](rust_embed) and served verbatim.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use rust_embed::Embed;
use std::borrow::Cow;
use std::str::FromStr;

#[derive(Embed)]
#[folder = "assets/"]
pub struct Builtins;
impl Builtins {
    /// Get the content of a builtin asset by file name.
    pub fn load(name: impl AsRef<str>) -> Result<Cow<'static, [u8]>> {
        let name = name.as_ref();
        Self::get(name).map(|f| f.data).ok_or_raise(|| ErrorKind::AssetNotFound(name.to_string()))
    }

    /// List all available builtin asset names.
    pub fn list() -> Vec<Cow<'static, str>> {
        Self::iter().collect()
    }
}

/// Which of the two stylesheets: the one for the index document, or the one
/// for leaf sitemaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stylesheet {
    Index,
    Leaf,
}
impl Stylesheet {
    /// File name the stylesheet is served under, relative to the site root.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Index => "sitemap-index.xsl",
            Self::Leaf => "sitemap.xsl",
        }
    }

    pub fn content(&self) -> Result<Cow<'static, [u8]>> {
        Builtins::load(self.file_name())
    }

    pub const CONTENT_TYPE: &'static str = "text/xsl; charset=UTF-8";
}
impl FromStr for Stylesheet {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "index" | "sitemap-index.xsl" => Ok(Self::Index),
            "leaf" | "sitemap" | "sitemap.xsl" => Ok(Self::Leaf),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Stylesheet::Index)]
    #[case(Stylesheet::Leaf)]
    fn test_stylesheets_are_embedded(#[case] stylesheet: Stylesheet) {
        let content = stylesheet.content().unwrap();
        let text = std::str::from_utf8(&content).unwrap();
        assert!(text.contains("xsl:stylesheet"));
        assert!(text.contains(crate::SITEMAP_NAMESPACE));
    }

    #[test]
    fn test_list_only_includes_stylesheets() {
        let mut names = Builtins::list();
        names.sort();
        assert_eq!(names, vec!["sitemap-index.xsl", "sitemap.xsl"]);
    }

    #[test]
    fn test_missing_asset() {
        let err = Builtins::load("nope.css").unwrap_err();
        assert!(matches!(&*err, ErrorKind::AssetNotFound(name) if name == "nope.css"));
    }

    #[rstest]
    #[case("index", Some(Stylesheet::Index))]
    #[case("sitemap-index.xsl", Some(Stylesheet::Index))]
    #[case("Leaf", Some(Stylesheet::Leaf))]
    #[case("sitemap.xsl", Some(Stylesheet::Leaf))]
    #[case("robots", None)]
    fn test_parse(#[case] input: &str, #[case] expected: Option<Stylesheet>) {
        assert_eq!(input.parse::<Stylesheet>().ok(), expected);
    }
}
