//! Integration tests for the lease-based job queue.

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::TestHarness;
use futures::future::join_all;
use serde_json::json;
use test_context::test_context;
use uuid::Uuid;

use server_core::kernel::jobs::{JobQueue, JobStatus, PostgresJobQueue};

const JOB_TYPE: &str = "process_submission";

async fn backdate(pool: &sqlx::PgPool, job_id: Uuid, minutes: i64) {
    sqlx::query("UPDATE jobs SET started_at = NOW() - ($2 || ' minutes')::INTERVAL WHERE id = $1")
        .bind(job_id)
        .bind(minutes.to_string())
        .execute(pool)
        .await
        .expect("backdating lease should succeed");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn enqueue_creates_pending_job(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    let job_id = queue
        .enqueue(JOB_TYPE, json!({"chat_id": 1}), 2)
        .await
        .unwrap();

    let job = queue.get(job_id).await.unwrap().expect("job should exist");
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.retries, 0);
    assert_eq!(job.max_retries, 2);
    assert!(job.started_at.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_claims_yield_exactly_one_winner(ctx: &mut TestHarness) {
    let queue = Arc::new(PostgresJobQueue::new(ctx.db_pool.clone()));

    let job_id = queue
        .enqueue(JOB_TYPE, json!({"chat_id": 1}), 2)
        .await
        .unwrap();

    // Eight workers race on one pending job.
    let claims = join_all((0..8).map(|i| {
        let queue = queue.clone();
        async move {
            queue
                .claim(&format!("worker-{i}"), 5)
                .await
                .expect("claim should not error")
        }
    }))
    .await;

    let total_claimed: usize = claims.iter().map(|jobs| jobs.len()).sum();
    assert_eq!(total_claimed, 1, "exactly one claim call may win the job");

    let job = queue.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert!(job.started_at.is_some());
    assert!(job.worker_id.is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn claim_respects_limit_and_fifo_order(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    let first = queue.enqueue(JOB_TYPE, json!({"n": 1}), 2).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let _second = queue.enqueue(JOB_TYPE, json!({"n": 2}), 2).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let _third = queue.enqueue(JOB_TYPE, json!({"n": 3}), 2).await.unwrap();

    let claimed = queue.claim("worker-a", 2).await.unwrap();
    assert_eq!(claimed.len(), 2);
    assert_eq!(claimed[0].id, first, "oldest job is claimed first");

    let rest = queue.claim("worker-b", 10).await.unwrap();
    assert_eq!(rest.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn complete_stores_result(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    let job_id = queue
        .enqueue(JOB_TYPE, json!({"chat_id": 1}), 2)
        .await
        .unwrap();
    queue.claim("worker-a", 1).await.unwrap();

    let landed = queue
        .complete(job_id, json!({"article_id": "abc"}))
        .await
        .unwrap();
    assert!(landed);

    let job = queue.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.completed_at.is_some());
    assert_eq!(job.result.unwrap()["article_id"], "abc");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn retry_bound_two_requeues_then_terminal(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    let job_id = queue
        .enqueue(JOB_TYPE, json!({"chat_id": 1}), 2)
        .await
        .unwrap();

    // Failure 1: back to pending.
    queue.claim("worker-a", 1).await.unwrap();
    let status = queue.fail(job_id, "transform: boom").await.unwrap();
    assert_eq!(status, JobStatus::Pending);
    let job = queue.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.retries, 1);
    assert!(job.started_at.is_none(), "retry resets the lease");
    assert_eq!(job.error.as_deref(), Some("transform: boom"));

    // Failure 2: still within budget.
    queue.claim("worker-a", 1).await.unwrap();
    let status = queue.fail(job_id, "transform: boom again").await.unwrap();
    assert_eq!(status, JobStatus::Pending);
    assert_eq!(queue.get(job_id).await.unwrap().unwrap().retries, 2);

    // Failure 3: budget exhausted, terminal.
    queue.claim("worker-a", 1).await.unwrap();
    let status = queue.fail(job_id, "transform: boom finally").await.unwrap();
    assert_eq!(status, JobStatus::Failed);

    let job = queue.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.retries, 3);
    assert!(job.completed_at.is_some());
    assert_eq!(job.error.as_deref(), Some("transform: boom finally"));

    // Terminal jobs are not claimable.
    assert!(queue.claim("worker-a", 1).await.unwrap().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn stale_job_is_recycled_within_budget(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    let job_id = queue
        .enqueue(JOB_TYPE, json!({"chat_id": 1}), 2)
        .await
        .unwrap();
    queue.claim("dead-worker", 1).await.unwrap();
    backdate(&ctx.db_pool, job_id, 10).await;

    let recycled = queue.recycle_stale(Duration::minutes(5)).await.unwrap();
    assert_eq!(recycled, 1);

    let job = queue.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.retries, 1);
    assert_eq!(job.error.as_deref(), Some("stale lease"));

    // The job is visible to the queue again.
    let reclaimed = queue.claim("live-worker", 1).await.unwrap();
    assert_eq!(reclaimed.len(), 1);
    assert_eq!(reclaimed[0].id, job_id);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn stale_job_over_budget_is_terminally_failed(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    let job_id = queue
        .enqueue(JOB_TYPE, json!({"chat_id": 1}), 0)
        .await
        .unwrap();
    queue.claim("dead-worker", 1).await.unwrap();
    backdate(&ctx.db_pool, job_id, 10).await;

    let recycled = queue.recycle_stale(Duration::minutes(5)).await.unwrap();
    assert_eq!(recycled, 1);

    let job = queue.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("stale lease"));
    assert!(job.completed_at.is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn fresh_leases_are_not_recycled(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    let job_id = queue
        .enqueue(JOB_TYPE, json!({"chat_id": 1}), 2)
        .await
        .unwrap();
    queue.claim("busy-worker", 1).await.unwrap();

    let recycled = queue.recycle_stale(Duration::minutes(5)).await.unwrap();
    assert_eq!(recycled, 0);
    assert_eq!(
        queue.get(job_id).await.unwrap().unwrap().status,
        JobStatus::Processing
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn zombie_completion_after_recycle_is_a_noop(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    let job_id = queue
        .enqueue(JOB_TYPE, json!({"chat_id": 1}), 2)
        .await
        .unwrap();
    queue.claim("slow-worker", 1).await.unwrap();
    backdate(&ctx.db_pool, job_id, 10).await;
    queue.recycle_stale(Duration::minutes(5)).await.unwrap();

    // The original worker finally finishes and reports success.
    let landed = queue.complete(job_id, json!({"late": true})).await.unwrap();
    assert!(!landed, "a recycled job must not accept the zombie completion");

    let job = queue.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.result.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn zombie_failure_after_recycle_is_a_noop(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    let job_id = queue
        .enqueue(JOB_TYPE, json!({"chat_id": 1}), 2)
        .await
        .unwrap();
    queue.claim("slow-worker", 1).await.unwrap();
    backdate(&ctx.db_pool, job_id, 10).await;
    queue.recycle_stale(Duration::minutes(5)).await.unwrap();

    let status = queue.fail(job_id, "late failure").await.unwrap();
    assert_eq!(status, JobStatus::Pending, "reported status is the row's current state");

    let job = queue.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.retries, 1, "only the sweep's increment is recorded");
    assert_eq!(job.error.as_deref(), Some("stale lease"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn list_recent_returns_newest_first(ctx: &mut TestHarness) {
    let queue = ctx.queue();

    for n in 0..3 {
        queue.enqueue(JOB_TYPE, json!({"n": n}), 2).await.unwrap();
    }

    let jobs = queue.list_recent(2).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs[0].created_at >= jobs[1].created_at);
}
