//! SQLite-backed settings store.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::store::SettingsStore;
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;

/// Settings store over the `settings` table of a [`Database`].
///
/// Every write is a single-statement upsert, so there is nothing to roll back
/// and no transaction is needed. With `dry_run` enabled, reads go through but
/// writes and deletes are logged and dropped.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for SqliteStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl SqliteStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }
}

#[async_trait]
impl SettingsStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(include_str!("../../queries/get_setting.sql"))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.dry_run {
            tracing::info!(key, "Skipping settings write during dry-run");
            return Ok(());
        }
        sqlx::query(include_str!("../../queries/upsert_setting.sql"))
            .bind(key)
            .bind(value)
            .bind(UtcDateTime::now().unix_timestamp())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        if self.dry_run {
            tracing::info!(key, "Skipping settings delete during dry-run");
            return Ok(false);
        }
        let result = sqlx::query(include_str!("../../queries/delete_setting.sql"))
            .bind(key)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        if self.dry_run {
            tracing::info!(prefix, "Skipping settings delete during dry-run");
            return Ok(0);
        }
        let result = sqlx::query(include_str!("../../queries/delete_settings_by_prefix.sql"))
            .bind(prefix)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        let db = Database::connect_in_memory().await.unwrap();
        SqliteStore::from(&db)
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = store().await;
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_is_an_upsert() {
        let store = store().await;
        store.set("key", "one").await.unwrap();
        store.set("key", "two").await.unwrap();
        assert_eq!(store.get("key").await.unwrap().as_deref(), Some("two"));
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings").fetch_one(&store.pool).await.unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn test_empty_value_is_not_absent() {
        let store = store().await;
        store.set("empty", "").await.unwrap();
        assert_eq!(store.get("empty").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = store().await;
        store.set("key", "value").await.unwrap();
        assert!(store.delete("key").await.unwrap());
        assert!(!store.delete("key").await.unwrap());
        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_prefix_treats_underscore_literally() {
        let store = store().await;
        store.set("lastmod_posts_1", "a").await.unwrap();
        store.set("lastmod_posts_2", "b").await.unwrap();
        store.set("lastmodXposts_3", "c").await.unwrap();
        assert_eq!(store.delete_prefix("lastmod_posts_").await.unwrap(), 2);
        assert_eq!(store.get("lastmodXposts_3").await.unwrap().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_dry_run_skips_writes() {
        let db = Database::connect_in_memory().await.unwrap();
        let store = SqliteStore::new(db.pool().clone(), true);
        store.set("key", "value").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), None);
    }
}
