//! Settings store and lastmod cache.
//!
//! This crate provides the small, persistent key/value store that sitemap
//! lastmod values are cached in. The store is not the source of truth - the
//! content is. Every value in it is derived and can be recomputed, so if the
//! database is deleted the next render simply schedules recomputation again.
//!
//! # Architecture
//! - **[`SettingsStore`]**: string key/value persistence with overwrite
//!   semantics, implemented over SQLite ([`SqliteStore`]) and in memory
//!   ([`MemoryStore`]).
//! - **[`LastmodCache`]**: typed view over a store, addressed by
//!   `(category, sub-type, page)` and holding a single timestamp per key.

mod db;
pub mod error;
mod lastmod;
mod store;

pub use crate::db::Database;
pub use crate::lastmod::{Lastmod, LastmodCache, LastmodKey};
pub use crate::store::{MemoryStore, SettingsStore, SqliteStore};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn SettingsStore + Send + Sync>;
