//! Deferred lastmod recomputation.
//!
//! Providers never compute a page's lastmod inline; on a cache miss they hand
//! a [`Job`] to a [`Scheduler`]. Scheduling is best-effort and may duplicate:
//! the job is idempotent and the last write wins.

#[cfg(any(test, feature = "mock"))]
mod mock;
mod queue;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::RecordingScheduler;
pub use self::queue::{WorkQueue, Worker};
use crate::SubType;
use crate::error::Result;
use sitemapper_cache::LastmodKey;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

pub type SchedulerHandle = Arc<dyn Scheduler + Send + Sync>;

/// Recompute the lastmod of one sitemap page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Job {
    pub category: String,
    pub sub_type: SubType,
    pub page: u64,
}
impl Job {
    pub const NAME: &'static str = "sitemap_calculate_lastmod";

    pub fn new(category: impl Into<String>, sub_type: SubType, page: u64) -> Self {
        Self { category: category.into(), sub_type, page }
    }

    pub fn key(&self) -> LastmodKey {
        LastmodKey::new(&self.category, self.sub_type.name(), self.page)
    }
}
impl Display for Job {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}({}, {}, {})", Self::NAME, self.category, self.sub_type, self.page)
    }
}

/// Runs a job once, no sooner than `delay` from now.
pub trait Scheduler {
    fn schedule_once(&self, delay: Duration, job: Job) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_display_and_key() {
        let job = Job::new("posts", SubType::named("page"), 3);
        assert_eq!(job.to_string(), "sitemap_calculate_lastmod(posts, page, 3)");
        assert_eq!(job.key().storage_key(), "sitemap_lastmod:posts:page:3");
        let job = Job::new("users", SubType::None, 1);
        assert_eq!(job.to_string(), "sitemap_calculate_lastmod(users, -, 1)");
    }
}
