use derive_more::Display;
use sitemapper_render::Entry;
use time::OffsetDateTime;

/// A URL plus its optional last modification time. Used both for individual
/// content URLs in a leaf sitemap and for the sitemap pages listed in the
/// index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SitemapEntry {
    pub location: String,
    pub last_modified: Option<OffsetDateTime>,
}
impl SitemapEntry {
    pub fn new(location: impl Into<String>, last_modified: Option<OffsetDateTime>) -> Self {
        Self { location: location.into(), last_modified }
    }
}
impl<'a> From<&'a SitemapEntry> for Entry<'a> {
    fn from(entry: &'a SitemapEntry) -> Self {
        Entry::new(&entry.location, entry.last_modified)
    }
}

/// A named partition of a category's content, or the sentinel for categories
/// that are not partitioned at all.
///
/// The sentinel keeps iteration uniform: a provider without partitions still
/// yields exactly one sub-type ([`SubType::None`]), whereas an empty list of
/// sub-types means the provider contributes nothing.
#[derive(Clone, Debug, Default, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubType {
    #[default]
    #[display("-")]
    None,
    #[display("{_0}")]
    Named(String),
}
impl SubType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Named(name) => Some(name),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
impl From<Option<String>> for SubType {
    /// An empty name is the same as no name.
    fn from(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.is_empty() => Self::Named(name),
            _ => Self::None,
        }
    }
}
impl From<&str> for SubType {
    fn from(name: &str) -> Self {
        Self::from(Some(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, SubType::None)]
    #[case(Some(""), SubType::None)]
    #[case(Some("page"), SubType::named("page"))]
    fn test_sub_type_from_option(#[case] name: Option<&str>, #[case] expected: SubType) {
        assert_eq!(SubType::from(name.map(str::to_string)), expected);
    }

    #[test]
    fn test_sub_type_display() {
        assert_eq!(SubType::None.to_string(), "-");
        assert_eq!(SubType::named("post_tag").to_string(), "post_tag");
        assert_eq!(SubType::named("post_tag").name(), Some("post_tag"));
        assert!(SubType::default().is_none());
    }
}
