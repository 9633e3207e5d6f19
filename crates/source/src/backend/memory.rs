//! In-memory object source.

use crate::error::{ErrorKind, Result};
use crate::models::{Filter, ObjectKind, ObjectRecord, Order, StoredObject, Visibility};
use crate::ObjectSource;
use async_trait::async_trait;
use exn::ResultExt;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use tokio::sync::RwLock;

type ObjectMap = BTreeMap<(ObjectKind, u64), StoredObject>;

/// Shape of a JSON content file: `{"objects": [...]}`.
#[derive(Deserialize)]
struct ContentFile {
    objects: Vec<StoredObject>,
}

/// In-memory object source.
///
/// Objects are kept in a [`BTreeMap`] keyed by `(kind, id)` behind a
/// [`RwLock`], so listing in identifier order is a plain range walk and all
/// trait methods can operate on `&self`. Objects are unique per `(kind, id)`;
/// inserting the same key again replaces the previous object.
///
/// # Examples
///
/// ```
/// use sitemapper_source::{Filter, MemorySource, ObjectKind, ObjectSource, StoredObject, Visibility};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MemorySource::with_objects([
///     StoredObject::new(ObjectKind::Post, 1, "https://example.com/hello/").with_sub_type("post"),
/// ]);
/// let count = source.count(ObjectKind::Post, &Filter::new(Visibility::Public)).await.unwrap();
/// assert_eq!(count, 1);
/// # Ok(())
/// # }
/// ```
pub struct MemorySource {
    name: String,
    objects: RwLock<ObjectMap>,
}

impl MemorySource {
    /// Create a source pre-populated with objects.
    pub fn with_objects(objects: impl IntoIterator<Item = StoredObject>) -> Self {
        let map = objects.into_iter().map(|o| ((o.kind, o.id), o)).collect();
        Self {
            name: "memory".to_string(),
            objects: RwLock::new(map),
        }
    }

    /// Parse a JSON content document (`{"objects": [...]}`).
    pub fn from_json(json: &str) -> Result<Self> {
        let content: ContentFile = serde_json::from_str(json).or_raise(|| ErrorKind::InvalidData)?;
        Ok(Self::with_objects(content.objects))
    }

    /// Load a JSON content file from disk. The source is named after the file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == IoErrorKind::NotFound => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
        };
        let source = Self::from_json(&json)?.with_name(path.display().to_string());
        tracing::debug!(source = source.name(), "Loaded content file");
        Ok(source)
    }

    /// Change the name of the source.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add or replace an object.
    pub async fn insert(&self, object: StoredObject) {
        self.objects.write().await.insert((object.kind, object.id), object);
    }

    /// Remove an object, returning it if it existed.
    pub async fn remove(&self, kind: ObjectKind, id: u64) -> Option<StoredObject> {
        self.objects.write().await.remove(&(kind, id))
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}
impl Default for MemorySource {
    fn default() -> Self {
        Self::with_objects(Vec::new())
    }
}

#[async_trait]
impl ObjectSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count(&self, kind: ObjectKind, filter: &Filter) -> Result<u64> {
        let guard = self.objects.read().await;
        let count = guard.range((kind, 0)..=(kind, u64::MAX)).filter(|(_, o)| filter.matches(o)).count();
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn list(
        &self,
        kind: ObjectKind,
        filter: &Filter,
        order: Order,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ObjectRecord>> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let guard = self.objects.read().await;
        let matching = guard.range((kind, 0)..=(kind, u64::MAX)).map(|(_, o)| o).filter(|o| filter.matches(o));
        let records = match order {
            Order::IdAscending => matching.skip(offset).take(limit).map(StoredObject::record).collect(),
        };
        Ok(records)
    }

    async fn sub_types(&self, kind: ObjectKind) -> Result<Vec<String>> {
        let public = Filter::new(Visibility::Public);
        let guard = self.objects.read().await;
        let names: BTreeSet<&str> = guard
            .range((kind, 0)..=(kind, u64::MAX))
            .filter(|(_, o)| public.matches(o))
            .filter_map(|(_, o)| o.sub_type.as_deref())
            .collect();
        Ok(names.into_iter().map(str::to_string).collect())
    }
}
