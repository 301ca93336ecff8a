//! Model service wire types
//!
//! `GET <base>/metadata` and `POST <base>/predict` as spoken by the model
//! services behind the gateway.
//!
//! Metadata is parsed field by field from a `serde_json::Value` so that one
//! missing or wrong-typed field never discards the rest. The typed structs
//! describe what a well-behaved model service sends; the gateway reads
//! replies leniently and never deserializes into them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{ModelMetadata, QualityMetrics};

/// Body of `GET <base>/metadata`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub model_version: Option<String>,
    pub metrics: Option<UpstreamMetrics>,
}

/// `metrics` object inside a metadata response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamMetrics {
    pub flavor: Option<String>,
    pub auc_raw: Option<f64>,
    pub auc_calibrated: Option<f64>,
    pub ks: Option<f64>,
    pub gini: Option<f64>,
}

/// Body of `POST <base>/predict`
///
/// Only `pd` and `top_reasons` matter to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Probability of default in [0, 1]
    pub pd: f64,
    /// Explanatory reason entries, passed through opaquely
    #[serde(default)]
    pub top_reasons: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ModelMetadata {
    /// Extract metadata from a raw `/metadata` body
    ///
    /// Wrong-typed or missing fields become `None`. An empty version string
    /// counts as absent. `default_flavor` is used when the body carries no
    /// `metrics.flavor`.
    pub fn from_metadata_json(body: &Value, default_flavor: &str) -> Self {
        let metrics = body.get("metrics");
        let number = |key: &str| {
            metrics
                .and_then(|m| m.get(key))
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite())
        };

        let version = body
            .get("model_version")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let flavor = metrics
            .and_then(|m| m.get("flavor"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(default_flavor)
            .to_string();

        Self {
            version,
            flavor,
            metrics: QualityMetrics {
                auc_raw: number("auc_raw"),
                auc_calibrated: number("auc_calibrated"),
                ks: number("ks"),
                gini: number("gini"),
            },
        }
    }
}
