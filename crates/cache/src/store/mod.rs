//! Key/value settings stores.
//!
//! A [`SettingsStore`] is deliberately dumb: string keys, string values,
//! single-key overwrites. There are no cross-key transactions, so concurrent
//! writers to the same key resolve as last-writer-wins.

mod memory;
mod sqlite;

pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the value stored under `key`, or `None` if there isn't one.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Returns `true` if a value was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every key starting with `prefix`, returning how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64>;
}
