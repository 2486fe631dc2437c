//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is started for the whole test run; every test gets
//! its own freshly migrated database inside it, so tests stay isolated while
//! container startup cost is paid once.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use server_core::domains::pipeline::{self, SubmissionPayload, PROCESS_SUBMISSION};
use server_core::kernel::jobs::{JobQueue, JobRegistry, JobRunner, JobRunnerConfig, PostgresJobQueue};
use server_core::kernel::{ServerDeps, TestDependencies};

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    /// Connection URL template without a database name.
    base_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();
static DB_COUNTER: AtomicU32 = AtomicU32::new(0);

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?;
        let port = postgres.get_host_port_ipv4(5432).await?;
        let base_url = format!("postgresql://postgres:postgres@{}:{}", host, port);

        Ok(Self {
            base_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Per-test harness: a dedicated migrated database plus mock collaborators.
pub struct TestHarness {
    pub db_pool: PgPool,
    pub mocks: TestDependencies,
}

impl TestHarness {
    async fn create() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_name = format!("newsdesk_test_{}", DB_COUNTER.fetch_add(1, Ordering::SeqCst));

        let admin_pool = PgPool::connect(&format!("{}/postgres", infra.base_url))
            .await
            .context("Failed to connect to admin database")?;
        sqlx::query(&format!(r#"CREATE DATABASE "{db_name}""#))
            .execute(&admin_pool)
            .await
            .context("Failed to create test database")?;
        admin_pool.close().await;

        let db_pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&format!("{}/{}", infra.base_url, db_name))
            .await
            .context("Failed to connect to test database")?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_pool,
            mocks: TestDependencies::new(),
        })
    }

    /// Dependencies backed by this harness's database and mocks.
    pub fn deps(&self) -> Arc<ServerDeps> {
        Arc::new(self.mocks.server_deps(self.db_pool.clone()))
    }

    /// Queue over this harness's database.
    pub fn queue(&self) -> Arc<dyn JobQueue> {
        Arc::new(PostgresJobQueue::new(self.db_pool.clone()))
    }

    /// Runner with the submission pipeline registered, for deterministic
    /// draining via `run_once`.
    pub fn runner(&self, queue: Arc<dyn JobQueue>) -> JobRunner {
        let mut registry = JobRegistry::new();
        registry.register::<SubmissionPayload, _, _>(
            PROCESS_SUBMISSION,
            |payload, deps| async move { pipeline::process_submission(payload, &deps).await },
        );

        JobRunner::with_config(
            queue,
            Arc::new(registry),
            self.deps(),
            JobRunnerConfig::with_worker_id("test-worker"),
        )
    }
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        TestHarness::create()
            .await
            .expect("Failed to set up test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}
