use crate::error::Result;
use crate::job::{Job, Scheduler};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Scheduler that records what it is asked to schedule and never runs it.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<(Duration, Job)>>,
}
impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything scheduled so far, in order, with its delay.
    pub fn scheduled(&self) -> Vec<(Duration, Job)> {
        self.scheduled.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.scheduled().into_iter().map(|(_, job)| job).collect()
    }

    pub fn clear(&self) {
        self.scheduled.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
impl Scheduler for RecordingScheduler {
    fn schedule_once(&self, delay: Duration, job: Job) -> Result<()> {
        self.scheduled.lock().unwrap_or_else(PoisonError::into_inner).push((delay, job));
        Ok(())
    }
}
