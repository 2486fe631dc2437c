//! PostgreSQL-backed job queue implementation.
//!
//! Durable, lease-based work queue. Every state transition is a conditional
//! update keyed on the expected prior status, so concurrent workers (and the
//! stale-lease sweep) can never double-apply a transition:
//!
//! - claim:    `pending    -> processing`  (the compare-and-swap)
//! - complete: `processing -> completed`
//! - fail:     `processing -> pending` while retries remain, else `failed`
//! - sweep:    same decision as fail, for leases past the threshold

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::job::{Job, JobStatus, JOB_COLUMNS};

/// Retry budget applied when the submitter does not specify one.
pub const DEFAULT_MAX_RETRIES: i32 = 2;

/// Trait for job queue operations.
///
/// Implementations provide durable storage and conditional state transitions
/// for background jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a payload for background processing. Always succeeds while the
    /// store is reachable.
    async fn enqueue(
        &self,
        job_type: &str,
        payload: serde_json::Value,
        max_retries: i32,
    ) -> Result<Uuid>;

    /// Atomically claim up to `limit` pending jobs for this worker.
    ///
    /// Each transition is `SET status='processing' WHERE id=? AND
    /// status='pending'`; a job counts as claimed only if that update
    /// affected a row, so two workers racing on the same job cannot both
    /// win it.
    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<Job>>;

    /// Mark a job completed, storing its result.
    ///
    /// Returns `false` (and changes nothing) when the job is no longer in
    /// `processing` -- e.g. it was recycled by the stale sweep while this
    /// worker was finishing. Safe to call at any time.
    async fn complete(&self, job_id: Uuid, result: serde_json::Value) -> Result<bool>;

    /// Record a failure: requeue while the retry budget allows, otherwise
    /// mark the job terminally failed. Returns the status after the call.
    async fn fail(&self, job_id: Uuid, message: &str) -> Result<JobStatus>;

    /// Recycle jobs whose lease expired (claimed longer ago than `threshold`
    /// without completing). Applies the same retry/terminal decision as
    /// `fail` with the error message `"stale lease"`. Returns how many jobs
    /// were recycled.
    async fn recycle_stale(&self, threshold: Duration) -> Result<u64>;

    /// Fetch a job by id (status query surface).
    async fn get(&self, job_id: Uuid) -> Result<Option<Job>>;

    /// Most recent jobs (status query surface).
    async fn list_recent(&self, limit: i64) -> Result<Vec<Job>>;
}

/// PostgreSQL-backed job queue.
pub struct PostgresJobQueue {
    pool: PgPool,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PostgresJobQueue {
    async fn enqueue(
        &self,
        job_type: &str,
        payload: serde_json::Value,
        max_retries: i32,
    ) -> Result<Uuid> {
        let job = Job::new(job_type, payload, max_retries);
        let inserted = job.insert(&self.pool).await?;

        debug!(job_id = %inserted.id, job_type = %job_type, "job enqueued");

        Ok(inserted.id)
    }

    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<Job>> {
        // Candidate selection is only an optimization; exclusivity rests on
        // the per-row conditional update below.
        let candidates: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM jobs WHERE status = 'pending' ORDER BY created_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut claimed = Vec::with_capacity(candidates.len());
        for id in candidates {
            let job = sqlx::query_as::<_, Job>(&format!(
                r#"
                UPDATE jobs
                SET status = 'processing',
                    started_at = NOW(),
                    worker_id = $2,
                    updated_at = NOW()
                WHERE id = $1 AND status = 'pending'
                RETURNING {JOB_COLUMNS}
                "#
            ))
            .bind(id)
            .bind(worker_id)
            .fetch_optional(&self.pool)
            .await?;

            // None: another worker won the compare-and-swap for this row.
            if let Some(job) = job {
                claimed.push(job);
            }
        }

        if !claimed.is_empty() {
            debug!(worker_id = %worker_id, count = claimed.len(), "claimed jobs");
        }

        Ok(claimed)
    }

    async fn complete(&self, job_id: Uuid, result: serde_json::Value) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed',
                result = $2,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(job_id)
        .bind(&result)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            warn!(job_id = %job_id, "completion ignored: job is no longer processing");
            return Ok(false);
        }

        Ok(true)
    }

    async fn fail(&self, job_id: Uuid, message: &str) -> Result<JobStatus> {
        let job = Job::find_by_id(job_id, &self.pool)
            .await?
            .ok_or_else(|| anyhow!("job {job_id} not found"))?;

        if job.status != JobStatus::Processing {
            warn!(job_id = %job_id, status = ?job.status, "failure ignored: job is no longer processing");
            return Ok(job.status);
        }

        let retries = job.retries + 1;
        let next_status = Job::retry_decision(retries, job.max_retries);

        let updated = match next_status {
            JobStatus::Pending => {
                sqlx::query(
                    r#"
                    UPDATE jobs
                    SET status = 'pending',
                        retries = $2,
                        error = $3,
                        started_at = NULL,
                        worker_id = NULL,
                        updated_at = NOW()
                    WHERE id = $1 AND status = 'processing'
                    "#,
                )
                .bind(job_id)
                .bind(retries)
                .bind(message)
                .execute(&self.pool)
                .await?
                .rows_affected()
            }
            _ => {
                sqlx::query(
                    r#"
                    UPDATE jobs
                    SET status = 'failed',
                        retries = $2,
                        error = $3,
                        completed_at = NOW(),
                        updated_at = NOW()
                    WHERE id = $1 AND status = 'processing'
                    "#,
                )
                .bind(job_id)
                .bind(retries)
                .bind(message)
                .execute(&self.pool)
                .await?
                .rows_affected()
            }
        };

        if updated == 0 {
            // Raced with the stale sweep; report whatever the row holds now.
            let current = Job::find_by_id(job_id, &self.pool)
                .await?
                .map(|j| j.status)
                .unwrap_or(JobStatus::Failed);
            warn!(job_id = %job_id, status = ?current, "failure raced with another transition");
            return Ok(current);
        }

        match next_status {
            JobStatus::Pending => {
                info!(job_id = %job_id, retries, max_retries = job.max_retries, error = %message, "job requeued for retry")
            }
            _ => {
                warn!(job_id = %job_id, retries, error = %message, "job terminally failed")
            }
        }

        Ok(next_status)
    }

    async fn recycle_stale(&self, threshold: Duration) -> Result<u64> {
        let cutoff = Utc::now() - threshold;

        // Requeue first: rows it transitions are no longer 'processing', so
        // the terminal pass below cannot double-apply.
        let requeued = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending',
                retries = retries + 1,
                error = 'stale lease',
                started_at = NULL,
                worker_id = NULL,
                updated_at = NOW()
            WHERE status = 'processing'
              AND started_at < $1
              AND retries + 1 <= max_retries
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let failed = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed',
                retries = retries + 1,
                error = 'stale lease',
                completed_at = NOW(),
                updated_at = NOW()
            WHERE status = 'processing'
              AND started_at < $1
              AND retries + 1 > max_retries
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let recycled = requeued + failed;
        if recycled > 0 {
            info!(requeued, failed, "recycled stale jobs");
        }

        Ok(recycled)
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<Job>> {
        Job::find_by_id(job_id, &self.pool).await
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Job>> {
        Job::list_recent(limit, &self.pool).await
    }
}
