//! Model backend abstraction
//!
//! The ensemble engine talks to each model through [`ModelBackend`] so the
//! refresh loop and the orchestrator can run against in-process fakes as
//! easily as against live HTTP services.
//!
//! Metadata fetches distinguish a failed call (`Err` / `None`) from a
//! successful reply that happens to be empty, so the refresh loop only
//! keeps stale metadata when a model could not be reached or answered
//! with something unusable.

use async_trait::async_trait;
use pde_common::ModelMetadata;
use serde_json::Value;
use tracing::warn;

use crate::error::UpstreamError;

/// Result of one prediction call
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Probability of default in [0, 1]
    pub pd: f64,
    /// Reason entries reported by the model, in model order
    pub reasons: Vec<Value>,
}

/// One scoring model reachable by the gateway
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Slot label used in logs and errors ("model_a", "model_b")
    fn label(&self) -> &str;

    /// Fetch the model's self-reported metadata, reporting why it failed
    ///
    /// A successful reply is `Ok` even when it carries no version or
    /// metrics.
    async fn try_fetch_metadata(&self) -> Result<ModelMetadata, UpstreamError>;

    /// Fetch metadata without failing the caller
    ///
    /// `None` means the fetch itself failed; the cause is logged here.
    async fn fetch_metadata(&self) -> Option<ModelMetadata> {
        match self.try_fetch_metadata().await {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(model = %self.label(), error = %e, "Metadata fetch failed");
                None
            }
        }
    }

    /// Score one payload
    async fn predict(&self, payload: &Value) -> Result<Prediction, UpstreamError>;
}
