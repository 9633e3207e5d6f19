//! In-memory settings store.

use crate::error::Result;
use crate::store::SettingsStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Settings store backed by a `HashMap` behind a [`RwLock`].
///
/// Nothing survives the process. Useful for tests, and for one-shot runs where
/// there is no point persisting lastmod values.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with values.
    pub fn with_values(values: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let values = values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { values: RwLock::new(values) }
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.values.write().await.remove(key).is_some())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let mut guard = self.values.write().await;
        let before = guard.len();
        guard.retain(|key, _| !key.starts_with(prefix));
        Ok(u64::try_from(before - guard.len()).unwrap_or(u64::MAX))
    }
}
