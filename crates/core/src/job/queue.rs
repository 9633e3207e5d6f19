use crate::error::{ErrorKind, Result};
use crate::job::{Job, Scheduler};
use crate::{Context, Registry};
use exn::ResultExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::time::Instant;
use tracing::instrument;

#[derive(Debug)]
struct Scheduled {
    due: Instant,
    job: Job,
}

/// Jobs queued but not yet started.
#[derive(Debug, Default)]
struct Pending(Mutex<HashSet<Job>>);
impl Pending {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<Job>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process [`Scheduler`] backed by an unbounded channel.
///
/// Jobs are picked up by the paired [`Worker`] in the order they were
/// scheduled. Every job is scheduled with the same configured delay, so
/// scheduling order is also due order. A job equal to one still waiting in
/// the queue is dropped, so the queue never holds more than one job per
/// sitemap page.
#[derive(Clone, Debug)]
pub struct WorkQueue {
    tx: mpsc::UnboundedSender<Scheduled>,
    pending: Arc<Pending>,
    shutdown: Arc<Notify>,
}

/// Receiving half of a [`WorkQueue`].
#[derive(Debug)]
pub struct Worker {
    rx: mpsc::UnboundedReceiver<Scheduled>,
    pending: Arc<Pending>,
    shutdown: Arc<Notify>,
}

impl WorkQueue {
    pub fn new() -> (Self, Worker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Pending::default());
        let shutdown = Arc::new(Notify::new());
        let worker = Worker {
            rx,
            pending: pending.clone(),
            shutdown: shutdown.clone(),
        };
        (Self { tx, pending, shutdown }, worker)
    }

    /// Number of jobs queued and not yet started.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Ask a running [`Worker::run`] to stop waiting out delays and drain
    /// what is left.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

impl Scheduler for WorkQueue {
    fn schedule_once(&self, delay: Duration, job: Job) -> Result<()> {
        let mut pending = self.pending.lock();
        if pending.contains(&job) {
            tracing::trace!(%job, "Job already pending");
            return Ok(());
        }
        tracing::debug!(%job, ?delay, "Scheduling job");
        let due = Instant::now() + delay;
        self.tx.send(Scheduled { due, job: job.clone() }).or_raise(|| ErrorKind::Schedule)?;
        pending.insert(job);
        Ok(())
    }
}

impl Worker {
    /// Run jobs as they fall due until every [`WorkQueue`] handle is dropped
    /// or [`WorkQueue::shutdown`] is called. On shutdown, jobs still queued
    /// run immediately. Returns the number of jobs run.
    #[instrument(name = "worker", skip_all)]
    pub async fn run(mut self, ctx: &Context, registry: &Registry) -> usize {
        let mut completed = 0;
        loop {
            let next = tokio::select! {
                _ = self.shutdown.notified() => break,
                next = self.rx.recv() => next,
            };
            let Some(scheduled) = next else {
                return completed;
            };
            let stopping = tokio::select! {
                _ = self.shutdown.notified() => true,
                _ = tokio::time::sleep_until(scheduled.due) => false,
            };
            self.execute(ctx, registry, &scheduled.job).await;
            completed += 1;
            if stopping {
                break;
            }
        }
        completed + self.drain(ctx, registry).await
    }

    /// Close the queue and run every job already in it without waiting for
    /// its delay. Scheduling fails once the queue is closed. Returns the
    /// number of jobs run.
    #[instrument(name = "drain", skip_all)]
    pub async fn drain(&mut self, ctx: &Context, registry: &Registry) -> usize {
        self.rx.close();
        let mut completed = 0;
        while let Some(scheduled) = self.rx.recv().await {
            self.execute(ctx, registry, &scheduled.job).await;
            completed += 1;
        }
        if completed > 0 {
            tracing::info!(jobs = completed, "Drained queued jobs");
        }
        completed
    }

    /// Jobs are fire-and-forget: a failure is logged and the page simply
    /// stays uncached until the next miss schedules it again. The job stops
    /// being pending before it runs, so a miss during the run queues it anew.
    async fn execute(&self, ctx: &Context, registry: &Registry, job: &Job) {
        self.pending.lock().remove(job);
        if let Err(e) = registry.run_job(ctx, job).await {
            tracing::warn!(%job, error = ?e, "Job failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::PostsProvider;
    use crate::testing::{context, minutes, posts};
    use crate::{IndexBuilder, Origin, SubType};
    use sitemapper_cache::{Lastmod, LastmodKey};
    use sitemapper_source::MemorySource;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(Arc::new(PostsProvider::new(2)));
        registry
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_for_delay() {
        let (ctx, _) = context(MemorySource::with_objects(posts("post", 1, 3)));
        let (queue, worker) = WorkQueue::new();
        let registry = registry();
        let key = LastmodKey::new("posts", Some("post"), 2);

        queue.schedule_once(Duration::from_secs(10), Job::new("posts", SubType::named("post"), 2)).unwrap();
        let worker_ctx = ctx.clone();
        let worker_registry = registry.clone();
        let handle = tokio::spawn(async move { worker.run(&worker_ctx, &worker_registry).await });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(ctx.lastmod.get(&key).await.unwrap().is_absent());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(ctx.lastmod.get(&key).await.unwrap(), Lastmod::At(minutes(3)));

        drop(queue);
        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_runs_remaining_jobs() {
        let (ctx, _) = context(MemorySource::with_objects(posts("post", 1, 4)));
        let (queue, worker) = WorkQueue::new();
        let registry = registry();
        for page in 1..=2 {
            queue.schedule_once(Duration::from_secs(3600), Job::new("posts", SubType::named("post"), page)).unwrap();
        }
        queue.shutdown();
        assert_eq!(worker.run(&ctx, &registry).await, 2);
        for page in 1..=2 {
            let cached = ctx.lastmod.get(&LastmodKey::new("posts", Some("post"), page)).await.unwrap();
            assert_eq!(cached, Lastmod::At(minutes(page * 2)));
        }
    }

    #[tokio::test]
    async fn test_drain_runs_jobs_from_cache_misses() {
        let (ctx, _) = context(MemorySource::with_objects(posts("post", 1, 5)));
        let (queue, mut worker) = WorkQueue::new();
        let ctx = Context { scheduler: Arc::new(queue), ..ctx };
        let registry = registry();
        let provider = registry.get("posts").unwrap();

        let entries = provider.sitemap_entries(&ctx, Origin::Request).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.last_modified.is_none()));

        assert_eq!(worker.drain(&ctx, &registry).await, 3);
        let entries = provider.sitemap_entries(&ctx, Origin::Request).await.unwrap();
        let lastmods: Vec<_> = entries.iter().map(|e| e.last_modified).collect();
        assert_eq!(lastmods, vec![Some(minutes(2)), Some(minutes(4)), Some(minutes(5))]);

        // Closed: further misses can no longer be scheduled, but nothing fails.
        ctx.lastmod.invalidate(&LastmodKey::new("posts", Some("post"), 1)).await.unwrap();
        assert!(ctx.scheduler.schedule_once(Duration::ZERO, Job::new("posts", SubType::None, 1)).is_err());
        assert_eq!(provider.sitemap_lastmod(&ctx, Origin::Request, &SubType::named("post"), 1).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_misses_queue_one_job_per_page() {
        let (ctx, _) = context(MemorySource::with_objects(posts("post", 1, 4)));
        let (queue, worker) = WorkQueue::new();
        let ctx = Context { scheduler: Arc::new(queue.clone()), ..ctx };
        let mut registry = Registry::new();
        registry.register(Arc::new(PostsProvider::new(1)));

        for _ in 0..5 {
            IndexBuilder::new(&registry).build_index(&ctx).await.unwrap();
        }
        assert_eq!(queue.pending(), 4);

        let worker_ctx = ctx.clone();
        let worker_registry = registry.clone();
        let handle = tokio::spawn(async move { worker.run(&worker_ctx, &worker_registry).await });
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(queue.pending(), 0);

        // Once run, a job can be queued again by the next miss.
        let key = LastmodKey::new("posts", Some("post"), 2);
        ctx.lastmod.invalidate(&key).await.unwrap();
        IndexBuilder::new(&registry).build_index(&ctx).await.unwrap();
        IndexBuilder::new(&registry).build_index(&ctx).await.unwrap();
        assert_eq!(queue.pending(), 1);

        queue.shutdown();
        assert_eq!(handle.await.unwrap(), 5);
        assert_eq!(ctx.lastmod.get(&key).await.unwrap(), Lastmod::At(minutes(2)));
    }
}
