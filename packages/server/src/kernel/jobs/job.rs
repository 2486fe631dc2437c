//! Job model for background submission processing.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

// ============================================================================
// Job Model
// ============================================================================

/// One queued unit of work. Owned exclusively by the queue; every mutation
/// goes through a conditional update keyed on the expected prior status.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    pub status: JobStatus,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub retries: i32,
    pub max_retries: i32,
    pub worker_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Columns selected/returned by every job query.
pub(crate) const JOB_COLUMNS: &str = "id, job_type, status, payload, result, error, retries, \
     max_retries, worker_id, created_at, started_at, completed_at, updated_at";

impl Job {
    /// Create a new pending job.
    pub fn new(job_type: &str, payload: serde_json::Value, max_retries: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_type: job_type.to_string(),
            status: JobStatus::Pending,
            payload,
            result: None,
            error: None,
            retries: 0,
            max_retries,
            worker_id: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Status a job moves to after one more failure: back to `pending` while
    /// the retry budget allows, terminal `failed` once it is exhausted.
    pub fn retry_decision(retries_after_failure: i32, max_retries: i32) -> JobStatus {
        if retries_after_failure <= max_retries {
            JobStatus::Pending
        } else {
            JobStatus::Failed
        }
    }

    /// Insert the job into the database.
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let job = sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO jobs (
                {JOB_COLUMNS}
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.job_type)
        .bind(self.status)
        .bind(&self.payload)
        .bind(&self.result)
        .bind(&self.error)
        .bind(self.retries)
        .bind(self.max_retries)
        .bind(&self.worker_id)
        .bind(self.created_at)
        .bind(self.started_at)
        .bind(self.completed_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    /// Find a job by id.
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Self>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(job)
    }

    /// Most recent jobs, newest first.
    pub async fn list_recent(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Self>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_job() -> Job {
        Job::new("process_submission", json!({"chat_id": 1}), 2)
    }

    #[test]
    fn new_job_starts_with_pending_status() {
        let job = sample_job();
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn new_job_has_retry_count_of_0() {
        let job = sample_job();
        assert_eq!(job.retries, 0);
        assert_eq!(job.max_retries, 2);
    }

    #[test]
    fn retry_decision_within_budget_requeues() {
        assert_eq!(Job::retry_decision(1, 2), JobStatus::Pending);
        assert_eq!(Job::retry_decision(2, 2), JobStatus::Pending);
    }

    #[test]
    fn retry_decision_over_budget_is_terminal() {
        assert_eq!(Job::retry_decision(3, 2), JobStatus::Failed);
        assert_eq!(Job::retry_decision(1, 0), JobStatus::Failed);
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }
}
