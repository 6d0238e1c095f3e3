//! Control surface routes

use crate::monitor::{AlertPhase, Monitor};
use crate::RuleAction;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn bad_action(name: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            success: false,
            error: format!(
                "invalid action '{}', expected one of allow, block, allow-once, block-once",
                name
            ),
        }),
    )
}

// ============================================================================
// Status
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub running: bool,
    pub has_alert: bool,
    pub last_alert_hash: Option<String>,
    pub last_message_id: Option<String>,
    pub uptime_seconds: u64,
    pub version: String,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn get_status(State(monitor): State<Arc<Monitor>>) -> Json<StatusResponse> {
    let state = monitor.snapshot().await;
    let uptime = chrono::Utc::now()
        .signed_duration_since(monitor.started_at())
        .num_seconds()
        .max(0) as u64;

    Json(StatusResponse {
        running: true,
        has_alert: state.phase == AlertPhase::AlertActive,
        last_alert_hash: state.last_fingerprint,
        last_message_id: state.last_message_id,
        uptime_seconds: uptime,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub action: RuleAction,
}

pub async fn post_action(
    State(monitor): State<Arc<Monitor>>,
    Json(body): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let action: RuleAction = body.action.parse().map_err(|_| bad_action(&body.action))?;
    info!("🎯 Action requested: {}", action);

    let report = monitor.perform_action(action).await;
    Ok(Json(ActionResponse {
        success: report.success,
        action,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub action: String,
    /// String or number, as chat platforms differ
    #[serde(default)]
    pub message_id: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    pub success: bool,
    pub action: RuleAction,
    pub message_edited: bool,
}

pub async fn post_callback(
    State(monitor): State<Arc<Monitor>>,
    Json(body): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, ApiError> {
    let action: RuleAction = body.action.parse().map_err(|_| bad_action(&body.action))?;
    let message_id = body.message_id.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    info!(
        "📲 Callback: {} (message {})",
        action,
        message_id.as_deref().unwrap_or("stored")
    );

    let outcome = monitor.callback(action, message_id).await;
    Ok(Json(CallbackResponse {
        success: outcome.report.success,
        action,
        message_edited: outcome.message_edited,
    }))
}
