//! pde-gw library - PD ensemble gateway
//!
//! Fronts two probability-of-default models. Each scoring request calls both
//! models concurrently and combines their outputs; a background task keeps
//! the combination weights in line with the models' reported quality.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod backend;
pub mod clock;
pub mod combine;
pub mod config;
pub mod error;
pub mod model_client;
pub mod orchestrator;
pub mod refresh;
pub mod state;
pub mod weights;

use crate::backend::ModelBackend;
use crate::clock::SystemClock;
use crate::config::GatewayConfig;
use crate::error::UpstreamError;
use crate::model_client::HttpModelClient;
use crate::orchestrator::ScoringOrchestrator;
use crate::refresh::RefreshScheduler;
use crate::state::EnsembleState;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Current weights and metadata
    pub ensemble: Arc<EnsembleState>,
    /// Request scoring
    pub orchestrator: Arc<ScoringOrchestrator>,
    /// Reported in the weights view
    pub refresh_interval: Duration,
}

/// Engine components wired together
pub struct Gateway {
    pub app_state: AppState,
    pub scheduler: Arc<RefreshScheduler>,
}

impl Gateway {
    /// Wire the engine around two model backends
    pub fn new(
        model_a: Arc<dyn ModelBackend>,
        model_b: Arc<dyn ModelBackend>,
        config: &GatewayConfig,
    ) -> Self {
        let ensemble = Arc::new(EnsembleState::new(
            &config.model_a.flavor,
            &config.model_b.flavor,
        ));

        let orchestrator = Arc::new(ScoringOrchestrator::new(
            Arc::clone(&model_a),
            Arc::clone(&model_b),
            Arc::clone(&ensemble),
            config.default_strategy,
        ));

        let scheduler = Arc::new(RefreshScheduler::new(
            model_a,
            model_b,
            Arc::clone(&ensemble),
            Arc::new(SystemClock),
            config.refresh_interval,
        ));

        Self {
            app_state: AppState {
                ensemble,
                orchestrator,
                refresh_interval: config.refresh_interval,
            },
            scheduler,
        }
    }

    /// Wire the engine around HTTP clients for the configured models
    pub fn from_config(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        let model_a = Arc::new(HttpModelClient::new(config.endpoint_a())?);
        let model_b = Arc::new(HttpModelClient::new(config.endpoint_b())?);
        Ok(Self::new(model_a, model_b, config))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::ensemble_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
