//! Source models.
//!
//! [`ObjectRecord`] is what providers see: just enough to emit a sitemap URL.
//! [`StoredObject`] is the richer shape the in-memory source keeps so that it
//! can answer filtered queries.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Top-level kind of content object a source can enumerate.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Documents (posts, pages, custom document kinds).
    #[display("post")]
    Post,
    /// Taxonomy terms (categories, tags, ...).
    #[display("term")]
    Term,
    /// Authors.
    #[display("user")]
    User,
}

/// Which objects are eligible to be counted or listed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Only publicly viewable, indexable objects.
    #[default]
    Public,
    /// Only objects that have at least one published, publicly-queryable
    /// content item attached (authors with posts).
    Published,
}

/// Query filter shared by `count` and `list`, so both always agree on the set
/// of objects being paginated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    /// Restrict to a single sub-type (post type, taxonomy). `None` means all.
    pub sub_type: Option<String>,
    pub visibility: Visibility,
}
impl Filter {
    pub fn new(visibility: Visibility) -> Self {
        Self { sub_type: None, visibility }
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<Option<String>>) -> Self {
        self.sub_type = sub_type.into();
        self
    }

    /// Returns `true` if the given object passes this filter.
    pub fn matches(&self, object: &StoredObject) -> bool {
        if let Some(sub_type) = &self.sub_type
            && object.sub_type.as_deref() != Some(sub_type.as_str())
        {
            return false;
        }
        match self.visibility {
            Visibility::Public => object.public,
            Visibility::Published => object.published > 0,
        }
    }
}

/// Listing order. Sitemaps always page by identifier ascending so that
/// appending content never shifts the boundaries of earlier pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    IdAscending,
}

/// A single listed object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Stable identifier used for ordering.
    pub id: u64,
    /// Absolute, canonical URL of the object.
    pub location: String,
    /// Last modification, if the object has such a concept.
    pub last_modified: Option<OffsetDateTime>,
}

/// An object as held by [`MemorySource`](crate::MemorySource) and as read from
/// a JSON content file.
///
/// ```json
/// {"kind": "post", "sub_type": "page", "id": 7, "location": "https://example.com/about/",
///  "last_modified": "2024-05-01T10:00:00Z"}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredObject {
    pub kind: ObjectKind,
    #[serde(default)]
    pub sub_type: Option<String>,
    pub id: u64,
    pub location: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_modified: Option<OffsetDateTime>,
    #[serde(default = "default_public")]
    pub public: bool,
    /// Number of published, publicly-queryable items attributed to this
    /// object. Only meaningful for authors.
    #[serde(default)]
    pub published: u64,
}
impl StoredObject {
    pub fn new(kind: ObjectKind, id: u64, location: impl Into<String>) -> Self {
        Self {
            kind,
            sub_type: None,
            id,
            location: location.into(),
            last_modified: None,
            public: true,
            published: 0,
        }
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    pub fn with_last_modified(mut self, last_modified: OffsetDateTime) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn with_published(mut self, published: u64) -> Self {
        self.published = published;
        self
    }

    pub fn record(&self) -> ObjectRecord {
        ObjectRecord {
            id: self.id,
            location: self.location.clone(),
            last_modified: self.last_modified,
        }
    }
}

fn default_public() -> bool {
    true
}
