//! Durable, lease-based job queue.
//!
//! Jobs are claimed with a compare-and-swap on `status`, processed by
//! stateless workers, and recovered by a stale-lease sweep when a worker
//! dies mid-run. See `queue::JobQueue` for the external contract.

pub mod job;
pub mod queue;
pub mod registry;
pub mod runner;

pub use job::{Job, JobStatus};
pub use queue::{JobQueue, PostgresJobQueue, DEFAULT_MAX_RETRIES};
pub use registry::{JobRegistry, SharedJobRegistry};
pub use runner::{run_stale_sweeper, FailureNotice, JobRunner, JobRunnerConfig};
