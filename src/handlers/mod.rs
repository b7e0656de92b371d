//! HTTP handlers for the relay endpoints.

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

use crate::error::AppError;
use crate::models::{GenerationRequest, GenerationResult};
use crate::services::providers::GenerationParams;
use crate::startup::AppState;

/// Liveness endpoint. Always 200; upstream availability is not probed.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "llm-relay",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// JSON 404 for unknown routes so callers always see the error body
/// shape, never an empty default.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"success": false, "error": "Endpoint not found"})),
    )
}

/// JSON 405 for known routes hit with the wrong method.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"success": false, "error": "Method not allowed"})),
    )
}

/// Relay a generation request to the upstream completion API.
///
/// Validates and normalizes the body, performs exactly one outbound
/// call, and translates the outcome per the error taxonomy.
#[tracing::instrument(skip(state, body))]
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GenerationResult>), AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    request.validate()?;
    let params = normalize(&request, &state)?;
    let prompt = request.prompt.trim();

    let response = state.text_provider.generate(prompt, &params).await?;

    tracing::info!(
        model = %response.model,
        prompt_tokens = response.usage.prompt_tokens,
        completion_tokens = response.usage.completion_tokens,
        "Generation completed"
    );

    Ok((
        StatusCode::OK,
        Json(GenerationResult::success(
            response.content,
            response.model,
            response.usage,
        )),
    ))
}

/// Apply configured defaults and bounds to the optional fields.
fn normalize(request: &GenerationRequest, state: &AppState) -> Result<GenerationParams, AppError> {
    let generation = &state.config.generation;

    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation(
            "Prompt is required and cannot be empty".to_string(),
        ));
    }

    let max_tokens = request.max_tokens.unwrap_or(generation.default_max_tokens);
    if max_tokens > generation.max_tokens_limit {
        return Err(AppError::Validation(format!(
            "max_tokens must not exceed {}",
            generation.max_tokens_limit
        )));
    }

    Ok(GenerationParams {
        model: request
            .model
            .clone()
            .unwrap_or_else(|| generation.default_model.clone()),
        max_tokens,
        temperature: request
            .temperature
            .unwrap_or(generation.default_temperature),
    })
}
