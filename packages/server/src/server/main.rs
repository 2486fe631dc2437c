// Main entry point for the Newsdesk API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use telegram::{TelegramOptions, TelegramService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server_core::domains::intake::messages;
use server_core::domains::pipeline::{self, SubmissionPayload, PROCESS_SUBMISSION};
use server_core::domains::settings::InterfaceLanguage;
use server_core::kernel::jobs::{
    run_stale_sweeper, JobQueue, JobRegistry, JobRunner, JobRunnerConfig, PostgresJobQueue,
};
use server_core::kernel::{
    DallEImageGenerator, HttpExtractor, OpenAiAdapter, ServerDeps, TelegramNotifier,
    UnsplashClient,
};
use server_core::{server::build_app, Config};

/// Leases older than this are considered abandoned by a dead worker.
const STALE_LEASE_THRESHOLD_SECS: i64 = 300;

/// How often the sweep runs.
const SWEEP_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Newsdesk API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // External collaborators
    let telegram_service = Arc::new(TelegramService::new(TelegramOptions {
        bot_token: config.telegram_bot_token.clone(),
    }));

    let deps = Arc::new(ServerDeps::new(
        pool.clone(),
        Arc::new(OpenAiAdapter::new(config.openai_api_key.clone())),
        Arc::new(HttpExtractor::new().context("Failed to create extractor")?),
        Arc::new(UnsplashClient::new(config.unsplash_access_key.clone())),
        Arc::new(DallEImageGenerator::new(config.openai_api_key.clone())),
        Arc::new(TelegramNotifier::new(telegram_service)),
        config.site_base_url.clone(),
    ));

    // Job queue + registry
    let queue: Arc<dyn JobQueue> = Arc::new(PostgresJobQueue::new(pool.clone()));

    let mut registry = JobRegistry::new();
    registry.register::<SubmissionPayload, _, _>(PROCESS_SUBMISSION, |payload, deps| async move {
        pipeline::process_submission(payload, &deps).await
    });
    let registry = Arc::new(registry);

    // Background worker: on terminal failure, send the submitter a short
    // localized notice (diagnostics stay on the job row).
    let runner_config = JobRunnerConfig {
        failure_notice: Some(Box::new(|job| {
            let chat_id = job.payload.get("chat_id")?.as_i64()?;
            let lang = job
                .payload
                .get("language_code")
                .and_then(|v| v.as_str())
                .and_then(InterfaceLanguage::parse)
                .unwrap_or_default();
            Some((chat_id, messages::failure_message(lang).to_string()))
        })),
        ..Default::default()
    };
    let runner = JobRunner::with_config(queue.clone(), registry, deps.clone(), runner_config);
    tokio::spawn(runner.run());

    // Stale-lease sweep: recovers jobs abandoned by crashed workers.
    tokio::spawn(run_stale_sweeper(
        queue.clone(),
        chrono::Duration::seconds(STALE_LEASE_THRESHOLD_SECS),
        Duration::from_secs(SWEEP_INTERVAL_SECS),
    ));

    // HTTP surface
    let app = build_app(deps, queue);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
