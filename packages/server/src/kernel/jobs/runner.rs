//! Job runner service for processing background jobs.
//!
//! The `JobRunner` is a background service that:
//! - Polls the queue for pending jobs and claims them
//! - Executes jobs via the registry
//! - Completes or fails them (the queue handles retry accounting)
//!
//! A sibling sweep loop (`run_stale_sweeper`) recycles jobs whose lease
//! expired because a worker died between claiming and completing.
//!
//! ```text
//! JobRunner
//!     │
//!     ├─► claim (CAS: pending -> processing)
//!     ├─► execute via JobRegistry
//!     └─► complete(result) | fail(error)  -> retry or terminal
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::job::{Job, JobStatus};
use super::queue::JobQueue;
use super::registry::SharedJobRegistry;
use crate::kernel::ServerDeps;

/// Builds a user-facing terminal-failure notice from a failed job:
/// `(chat_id, message)`, or None when the job carries no notification target.
pub type FailureNotice = Box<dyn Fn(&Job) -> Option<(i64, String)> + Send + Sync>;

/// Configuration for the job runner.
pub struct JobRunnerConfig {
    /// Maximum number of jobs to claim at once
    pub batch_size: i64,
    /// How long to wait when no jobs are available
    pub poll_interval: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
    /// Optional terminal-failure notice builder (wired by main with domain
    /// knowledge; the runner itself stays payload-agnostic).
    pub failure_notice: Option<FailureNotice>,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            poll_interval: Duration::from_secs(2),
            worker_id: format!("worker-{}", Uuid::new_v4()),
            failure_notice: None,
        }
    }
}

impl JobRunnerConfig {
    /// Create a new config with a specific worker ID.
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// Background service that processes jobs from the queue.
pub struct JobRunner {
    job_queue: Arc<dyn JobQueue>,
    registry: SharedJobRegistry,
    deps: Arc<ServerDeps>,
    config: JobRunnerConfig,
    shutdown: Arc<AtomicBool>,
}

impl JobRunner {
    /// Create a new job runner.
    pub fn new(
        job_queue: Arc<dyn JobQueue>,
        registry: SharedJobRegistry,
        deps: Arc<ServerDeps>,
    ) -> Self {
        Self::with_config(job_queue, registry, deps, JobRunnerConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(
        job_queue: Arc<dyn JobQueue>,
        registry: SharedJobRegistry,
        deps: Arc<ServerDeps>,
        config: JobRunnerConfig,
    ) -> Self {
        Self {
            job_queue,
            registry,
            deps,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a shutdown handle for graceful shutdown.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Claim and process one batch. Returns how many jobs were executed.
    ///
    /// Exposed separately so tests can drain the queue deterministically.
    pub async fn run_once(&self) -> Result<usize> {
        let jobs = self
            .job_queue
            .claim(&self.config.worker_id, self.config.batch_size)
            .await?;

        let count = jobs.len();
        for job in jobs {
            self.process_job(job).await;
        }

        Ok(count)
    }

    async fn process_job(&self, job: Job) {
        let job_id = job.id;
        let job_type = job.job_type.clone();

        debug!(job_id = %job_id, job_type = %job_type, "executing job");

        match self.registry.execute(&job, self.deps.clone()).await {
            Ok(result) => {
                info!(job_id = %job_id, job_type = %job_type, "job succeeded");
                match self.job_queue.complete(job_id, result).await {
                    Ok(true) => {}
                    Ok(false) => {
                        // Lease was recycled mid-run; the retry will redo the
                        // work. Stages are idempotent-safe, so this is noise,
                        // not corruption.
                        warn!(job_id = %job_id, "completion superseded by stale-lease recycle");
                    }
                    Err(e) => error!(job_id = %job_id, error = %e, "failed to mark job as completed"),
                }
            }
            Err(e) => {
                warn!(job_id = %job_id, job_type = %job_type, error = %e, "job failed");
                match self.job_queue.fail(job_id, &e.to_string()).await {
                    Ok(JobStatus::Failed) => self.send_failure_notice(&job).await,
                    Ok(_) => {}
                    Err(mark_err) => {
                        error!(job_id = %job_id, error = %mark_err, "failed to mark job as failed")
                    }
                }
            }
        }
    }

    /// Best-effort user notification after a terminal failure. The full
    /// diagnostic stays on the job row; the user gets a short notice.
    async fn send_failure_notice(&self, job: &Job) {
        let Some(builder) = &self.config.failure_notice else {
            return;
        };
        let Some((chat_id, message)) = builder(job) else {
            return;
        };

        if let Err(e) = self.deps.notifier.send(chat_id, &message).await {
            warn!(job_id = %job.id, error = %e, "failed to send failure notice");
        }
    }

    /// Run the job runner until shutdown is requested.
    pub async fn run(self) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "job runner starting"
        );

        loop {
            if self.is_shutdown_requested() {
                break;
            }

            match self.run_once().await {
                Ok(0) => tokio::time::sleep(self.config.poll_interval).await,
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "failed to claim jobs");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }

        info!(worker_id = %self.config.worker_id, "job runner stopped");
        Ok(())
    }
}

/// Periodic stale-lease sweep: dead workers leave jobs in `processing`
/// forever; this loop makes them reclaimable again.
pub async fn run_stale_sweeper(
    job_queue: Arc<dyn JobQueue>,
    threshold: chrono::Duration,
    interval: Duration,
) {
    info!(
        threshold_secs = threshold.num_seconds(),
        interval_secs = interval.as_secs(),
        "stale-lease sweeper starting"
    );

    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(e) = job_queue.recycle_stale(threshold).await {
            error!(error = %e, "stale-lease sweep failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = JobRunnerConfig::default();
        assert_eq!(config.batch_size, 5);
        assert!(config.worker_id.starts_with("worker-"));
        assert!(config.failure_notice.is_none());
    }

    #[test]
    fn config_with_worker_id() {
        let config = JobRunnerConfig::with_worker_id("my-worker");
        assert_eq!(config.worker_id, "my-worker");
    }
}
