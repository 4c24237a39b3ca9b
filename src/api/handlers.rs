use crate::api::AppState;
use crate::error::Result;
use crate::recommender::{ModelStats, Suggestion};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Request closure-code suggestions for a free-text incident description
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>> {
    request.validate()?;

    tracing::info!(
        application_id = ?request.application_id,
        description_prefix = %request.description.chars().take(50).collect::<String>(),
        "Recommendation requested"
    );

    let suggestions = state
        .recommender
        .recommend(&request.description, request.application_id)
        .await?;

    tracing::info!(count = suggestions.len(), "Sending suggestions");

    Ok(Json(RecommendResponse {
        status: "success".to_string(),
        suggestions,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecommendRequest {
    #[validate(length(min = 1))]
    pub description: String,
    pub application_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub status: String,
    pub suggestions: Vec<Suggestion>,
}

/// Retrain the similarity model and swap it in without a restart.
/// Exposure to privileged callers only is the deployment's concern.
pub async fn reload_model(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    let stats = state.recommender.reload().await?;

    Ok(Json(ReloadResponse {
        status: "success".to_string(),
        message: "Model retrained and reloaded".to_string(),
        model: stats,
    }))
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: String,
    pub message: String,
    pub model: ModelStats,
}

/// Current model status
pub async fn model_status(State(state): State<AppState>) -> Result<Json<ModelStats>> {
    Ok(Json(state.recommender.stats().await))
}
