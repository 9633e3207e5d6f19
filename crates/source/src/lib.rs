//! Content object sources.
//!
//! A source is the capability the sitemap providers page through: it can count
//! the objects of a [`ObjectKind`] matching a [`Filter`], list a window of them
//! in a deterministic [`Order`], and report the sub-types a kind is partitioned
//! into. The storage engine behind it is somebody else's problem.

pub mod backend;
pub mod error;
mod models;

pub use crate::backend::{MemorySource, ObjectSource};
pub use crate::models::{Filter, ObjectKind, ObjectRecord, Order, StoredObject, Visibility};
use std::sync::Arc;

pub type SourceHandle = Arc<dyn ObjectSource + Send + Sync>;
