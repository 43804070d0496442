use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::composer::{GenerationResult, Selection};
use crate::state::AppState;
use crate::utils::timing::{complete_request_timer, start_request_timer};

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /generate`. Always answers 200: an unreadable body, an upstream
/// failure or a panicking compose task all come back as fallback content.
pub async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<Selection>, JsonRejection>,
) -> Json<GenerationResult> {
    let selection = match payload {
        Ok(Json(selection)) => selection,
        Err(rejection) => {
            let mut timer = start_request_timer("/generate", None);
            warn!("Rejected /generate body: {}", rejection.body_text());
            complete_request_timer(&mut timer, "fallback", Some("invalid_body".to_string()));
            return Json(state.composer.fallback_result(None));
        }
    };

    let mut timer = start_request_timer("/generate", Some(selection.to_string()));
    if !selection.is_known() {
        warn!("Selection {} contains values outside the known options", selection);
    }

    let composer = state.composer.clone();
    let task_selection = selection.clone();
    let result =
        match tokio::spawn(async move { composer.compose(&task_selection).await }).await {
            Ok(result) => result,
            Err(err) => {
                error!("Generation error for {}: {}", selection, err);
                complete_request_timer(&mut timer, "fallback", Some("task_failed".to_string()));
                return Json(state.composer.fallback_result(Some(&selection)));
            }
        };

    let status = if result.has_image() { "success" } else { "degraded" };
    complete_request_timer(&mut timer, status, None);
    Json(result)
}
