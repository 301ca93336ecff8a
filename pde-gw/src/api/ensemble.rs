//! Ensemble endpoints
//!
//! - `GET /ensemble/weights`: current weights, metadata and settings
//! - `POST /applications/score?strategy=...`: score one application

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use pde_common::{EnsembleView, ScoreResponse, Strategy};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiResult;
use crate::AppState;

/// Query parameters for scoring
#[derive(Debug, Default, Deserialize)]
pub struct ScoreQuery {
    /// Strategy override
    pub strategy: Option<String>,
}

/// GET /ensemble/weights
pub async fn get_weights(State(state): State<AppState>) -> Json<EnsembleView> {
    let snapshot = state.ensemble.snapshot().await;
    Json(snapshot.to_view(
        state.orchestrator.default_strategy(),
        state.refresh_interval.as_secs(),
    ))
}

/// POST /applications/score
///
/// The JSON body is forwarded verbatim to both models.
pub async fn score_application(
    State(state): State<AppState>,
    Query(query): Query<ScoreQuery>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<ScoreResponse>> {
    let strategy = query
        .strategy
        .as_deref()
        .map(str::parse::<Strategy>)
        .transpose()?;

    let response = state.orchestrator.score(&payload, strategy).await?;
    Ok(Json(response))
}

/// Build ensemble routes
pub fn ensemble_routes() -> Router<AppState> {
    Router::new()
        .route("/ensemble/weights", get(get_weights))
        .route("/applications/score", post(score_application))
}
