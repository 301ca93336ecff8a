//! In-process model backend
//!
//! Metadata changes on every fetch (call `n` reports AUC derived from `n`)
//! so consecutive refreshes publish distinguishable weights.

use async_trait::async_trait;
use pde_common::{ModelMetadata, QualityMetrics};
use pde_gw::backend::{ModelBackend, Prediction};
use pde_gw::error::UpstreamError;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub struct FakeBackend {
    label: &'static str,
    pd: f64,
    base_auc: f64,
    predict_delay: Duration,
    fail_metadata: AtomicBool,
    metadata_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(label: &'static str, pd: f64, base_auc: f64) -> Self {
        Self {
            label,
            pd,
            base_auc,
            predict_delay: Duration::ZERO,
            fail_metadata: AtomicBool::new(false),
            metadata_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_predict_delay(mut self, delay: Duration) -> Self {
        self.predict_delay = delay;
        self
    }

    pub fn set_metadata_failing(&self, failing: bool) {
        self.fail_metadata.store(failing, Ordering::SeqCst);
    }

    /// AUC reported on the `n`th metadata call (1-based)
    pub fn auc_for_call(&self, n: usize) -> f64 {
        self.base_auc + (n % 20) as f64 * 0.01
    }
}

#[async_trait]
impl ModelBackend for FakeBackend {
    fn label(&self) -> &str {
        self.label
    }

    async fn try_fetch_metadata(&self) -> Result<ModelMetadata, UpstreamError> {
        let n = self.metadata_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_metadata.load(Ordering::SeqCst) {
            return Err(UpstreamError::Network {
                model: self.label.to_string(),
                message: "metadata service down".to_string(),
            });
        }
        Ok(ModelMetadata {
            version: Some(format!("{}-{}", self.label, n)),
            flavor: self.label.to_string(),
            metrics: QualityMetrics {
                auc_calibrated: Some(self.auc_for_call(n)),
                ..Default::default()
            },
        })
    }

    async fn predict(&self, _payload: &Value) -> Result<Prediction, UpstreamError> {
        if self.predict_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.predict_delay).await;
        }
        Ok(Prediction {
            pd: self.pd,
            reasons: vec![json!({ "model": self.label })],
        })
    }
}
