//! Telegram webhook endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{error, warn};

use crate::domains::intake::{self, TelegramUpdate};
use crate::server::app::AppState;

/// POST /telegram/webhook
///
/// Always acknowledges with 200 once the body parses: Telegram retries
/// non-2xx deliveries, and a processing hiccup must not turn into a
/// redelivery storm. Failures are logged; duplicate deliveries are dropped
/// by the gateway's durable update-id dedup.
pub async fn webhook_handler(
    State(state): State<AppState>,
    payload: Result<Json<TelegramUpdate>, axum::extract::rejection::JsonRejection>,
) -> StatusCode {
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "unparseable webhook payload");
            return StatusCode::OK;
        }
    };

    if let Err(e) = intake::handle_update(update, &state.deps, state.queue.as_ref()).await {
        error!(error = %e, "webhook handling failed");
    }

    StatusCode::OK
}
