//! Per-request scoring
//!
//! Calls both models concurrently, combines their probabilities against the
//! ensemble snapshot current at combination time, and assembles the
//! response. Either prediction failing fails the whole request.

use pde_common::{ComponentPair, ComponentResult, ModelMetadata, ScoreResponse, Strategy};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use crate::backend::{ModelBackend, Prediction};
use crate::combine::{combine, merge_reasons};
use crate::error::UpstreamError;
use crate::state::EnsembleState;

/// Scores requests against both models
pub struct ScoringOrchestrator {
    model_a: Arc<dyn ModelBackend>,
    model_b: Arc<dyn ModelBackend>,
    state: Arc<EnsembleState>,
    default_strategy: Strategy,
}

impl ScoringOrchestrator {
    pub fn new(
        model_a: Arc<dyn ModelBackend>,
        model_b: Arc<dyn ModelBackend>,
        state: Arc<EnsembleState>,
        default_strategy: Strategy,
    ) -> Self {
        Self {
            model_a,
            model_b,
            state,
            default_strategy,
        }
    }

    pub fn default_strategy(&self) -> Strategy {
        self.default_strategy
    }

    /// Score one payload
    ///
    /// `strategy` overrides the configured default. Both models are always
    /// called, even for the single-model strategies, so every response
    /// carries both components.
    pub async fn score(
        &self,
        payload: &Value,
        strategy: Option<Strategy>,
    ) -> Result<ScoreResponse, UpstreamError> {
        let strategy = strategy.unwrap_or(self.default_strategy);
        let started = Instant::now();

        let (prediction_a, prediction_b) = tokio::try_join!(
            self.model_a.predict(payload),
            self.model_b.predict(payload)
        )
        .map_err(|e| {
            error!(model = %e.model(), error = %e, "Prediction call failed");
            e
        })?;

        // Snapshot taken after both predictions returned
        let snapshot = self.state.snapshot().await;
        let pd = combine(strategy, snapshot.weights, prediction_a.pd, prediction_b.pd);

        debug!(
            strategy = %strategy,
            pd_a = prediction_a.pd,
            pd_b = prediction_b.pd,
            pd,
            generation = snapshot.generation,
            "Scored request"
        );

        Ok(ScoreResponse {
            strategy,
            weights: snapshot.weights,
            pd,
            components: ComponentPair {
                model_a: component(&prediction_a, &snapshot.model_a),
                model_b: component(&prediction_b, &snapshot.model_b),
            },
            reasons: merge_reasons(&prediction_a.reasons, &prediction_b.reasons),
            latency_ms: started.elapsed().as_millis() as u64,
            meta_updated_at: snapshot.updated_at,
            generation: snapshot.generation,
        })
    }
}

fn component(prediction: &Prediction, meta: &ModelMetadata) -> ComponentResult {
    ComponentResult {
        pd: prediction.pd,
        version: meta.version.clone(),
        flavor: meta.flavor.clone(),
        metrics: meta.metrics,
    }
}
