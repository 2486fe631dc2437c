//! Best-effort activity log.
//!
//! Audit inserts are an optional side channel: a failure -- including the
//! table not existing yet in a fresh environment (SQLSTATE 42P01) -- is
//! logged and swallowed, never propagated into the pipeline.

use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

/// SQLSTATE for "relation does not exist".
const UNDEFINED_TABLE: &str = "42P01";

/// One audit entry.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub chat_id: i64,
    pub action: &'static str,
    pub entity_id: Option<String>,
    pub entity_title: Option<String>,
    pub metadata: Value,
}

impl ActivityEntry {
    pub fn new(chat_id: i64, action: &'static str) -> Self {
        Self {
            chat_id,
            action,
            entity_id: None,
            entity_title: None,
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn entity(mut self, id: impl Into<String>, title: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self.entity_title = Some(title.into());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Record an activity entry. Never fails.
pub async fn log_activity(pool: &PgPool, entry: ActivityEntry) {
    let result = sqlx::query(
        r#"
        INSERT INTO activity_logs (id, chat_id, action, entity_id, entity_title, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.chat_id)
    .bind(entry.action)
    .bind(&entry.entity_id)
    .bind(&entry.entity_title)
    .bind(&entry.metadata)
    .execute(pool)
    .await;

    match result {
        Ok(_) => debug!(chat_id = entry.chat_id, action = entry.action, "activity logged"),
        Err(e) => {
            let missing_table = e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code == UNDEFINED_TABLE)
                .unwrap_or(false);

            if missing_table {
                debug!(action = entry.action, "activity table missing, skipping audit write");
            } else {
                warn!(action = entry.action, error = %e, "failed to write activity log");
            }
        }
    }
}
