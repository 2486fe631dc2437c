//! Job registry mapping job type strings to handlers.
//!
//! Each domain registers its job types at startup. When the runner claims a
//! job it uses this registry to deserialize the payload and execute the
//! handler in one step. Handlers return the JSON value stored as the job's
//! result on completion.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;

use super::job::Job;
use crate::kernel::ServerDeps;

/// Type alias for the async handler function.
///
/// Handlers take the raw payload and a reference to ServerDeps and return
/// the job result.
type BoxedHandler = Box<
    dyn Fn(
            serde_json::Value,
            Arc<ServerDeps>,
        ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send>>
        + Send
        + Sync,
>;

/// Registry that maps job type strings to handlers.
///
/// # Example
///
/// ```ignore
/// let mut registry = JobRegistry::new();
/// registry.register::<SubmissionPayload, _, _>(
///     PROCESS_SUBMISSION,
///     |payload, deps| async move { pipeline::process_submission(payload, &deps).await },
/// );
/// ```
#[derive(Default)]
pub struct JobRegistry {
    registrations: HashMap<&'static str, BoxedHandler>,
}

impl JobRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
        }
    }

    /// Register a job type with its handler.
    pub fn register<P, F, Fut>(&mut self, job_type: &'static str, handler: F)
    where
        P: DeserializeOwned + Send + Sync + 'static,
        F: Fn(P, Arc<ServerDeps>) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<serde_json::Value>> + Send + 'static,
    {
        let boxed: BoxedHandler = Box::new(move |value, deps| {
            let handler = handler.clone();
            Box::pin(async move {
                let payload: P = serde_json::from_value(value)
                    .map_err(|e| anyhow!("Failed to deserialize {}: {}", job_type, e))?;
                handler(payload, deps).await
            })
        });

        self.registrations.insert(job_type, boxed);
    }

    /// Execute a claimed job using its registered handler.
    ///
    /// Returns an error if the job type is unknown, the payload does not
    /// deserialize, or the handler fails.
    pub async fn execute(&self, job: &Job, deps: Arc<ServerDeps>) -> Result<serde_json::Value> {
        let handler = self
            .registrations
            .get(job.job_type.as_str())
            .ok_or_else(|| anyhow!("Unknown job type: {}", job.job_type))?;

        handler(job.payload.clone(), deps).await
    }

    /// Check if a job type is registered.
    pub fn is_registered(&self, job_type: &str) -> bool {
        self.registrations.contains_key(job_type)
    }

    /// Get all registered job types.
    pub fn registered_types(&self) -> Vec<&'static str> {
        self.registrations.keys().copied().collect()
    }
}

/// Thread-safe registry wrapped in Arc.
pub type SharedJobRegistry = Arc<JobRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct TestPayload {
        name: String,
    }

    #[test]
    fn register_and_check() {
        let mut registry = JobRegistry::new();
        registry.register::<TestPayload, _, _>("test_job", |payload, _deps| async move {
            Ok(json!({"echo": payload.name}))
        });

        assert!(registry.is_registered("test_job"));
        assert!(!registry.is_registered("unknown_job"));
        assert!(registry.registered_types().contains(&"test_job"));
    }
}
