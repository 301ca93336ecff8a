//! Shared API request/response types
//!
//! Types served by the gateway and consumed by whatever fronts it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::Error;

// ========================================
// Model Metadata
// ========================================

/// Self-reported quality indicators of one model
///
/// Absent and zero are different things: a model reporting `auc_raw = 0.0`
/// has a legitimate (if terrible) score, while `None` means the value was
/// not reported or could not be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Discriminative power (ROC AUC) of the raw model
    pub auc_raw: Option<f64>,
    /// ROC AUC after probability calibration
    pub auc_calibrated: Option<f64>,
    /// Kolmogorov-Smirnov statistic
    pub ks: Option<f64>,
    /// Gini coefficient
    pub gini: Option<f64>,
}

impl QualityMetrics {
    /// True when no indicator is present
    pub fn is_empty(&self) -> bool {
        self.auc_raw.is_none()
            && self.auc_calibrated.is_none()
            && self.ks.is_none()
            && self.gini.is_none()
    }
}

/// Metadata snapshot of one backing model
///
/// Immutable once built; a refresh replaces it with a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Opaque model version identifier
    pub version: Option<String>,
    /// Label identifying the model variant
    pub flavor: String,
    /// Quality indicators
    pub metrics: QualityMetrics,
}

impl ModelMetadata {
    /// Metadata with every field absent, labelled with the slot's default flavor
    pub fn unknown(flavor: impl Into<String>) -> Self {
        Self {
            version: None,
            flavor: flavor.into(),
            metrics: QualityMetrics::default(),
        }
    }

    /// True when nothing beyond the flavor label is known
    pub fn is_unknown(&self) -> bool {
        self.version.is_none() && self.metrics.is_empty()
    }
}

// ========================================
// Weights and Strategy
// ========================================

/// Normalized ensemble weights, one per model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightPair {
    pub model_a: f64,
    pub model_b: f64,
}

impl WeightPair {
    /// Equal weighting
    pub const NEUTRAL: WeightPair = WeightPair {
        model_a: 0.5,
        model_b: 0.5,
    };
}

impl Default for WeightPair {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// How the two model probabilities are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Arithmetic mean of the two probabilities
    Average,
    /// Weighted mix in log-odds space
    #[default]
    Weighted,
    /// Model A's probability unchanged
    ModelAOnly,
    /// Model B's probability unchanged
    ModelBOnly,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Average,
        Strategy::Weighted,
        Strategy::ModelAOnly,
        Strategy::ModelBOnly,
    ];

    /// Canonical name as used in config and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Average => "average",
            Strategy::Weighted => "weighted",
            Strategy::ModelAOnly => "model_a_only",
            Strategy::ModelBOnly => "model_b_only",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    /// Case-insensitive; also accepts `avg`, `model_a`/`a`, `model_b`/`b`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "average" | "avg" => Ok(Strategy::Average),
            "weighted" => Ok(Strategy::Weighted),
            "model_a_only" | "model_a" | "a" => Ok(Strategy::ModelAOnly),
            "model_b_only" | "model_b" | "b" => Ok(Strategy::ModelBOnly),
            other => Err(Error::InvalidInput(format!(
                "Unknown strategy '{}' (expected one of: average, weighted, model_a_only, model_b_only)",
                other
            ))),
        }
    }
}

// ========================================
// Score Response
// ========================================

/// One model's contribution to a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    /// Probability returned by the model
    pub pd: f64,
    pub version: Option<String>,
    pub flavor: String,
    pub metrics: QualityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentPair {
    pub model_a: ComponentResult,
    pub model_b: ComponentResult,
}

/// Result of one scoring request
///
/// `weights`, the component metadata, `meta_updated_at` and `generation`
/// all come from the same ensemble snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Strategy actually applied
    pub strategy: Strategy,
    /// Weights in effect when the combination was computed
    pub weights: WeightPair,
    /// Combined probability of default
    pub pd: f64,
    pub components: ComponentPair,
    /// Model A's reasons then model B's, at most three
    pub reasons: Vec<Value>,
    /// Wall-clock time spent serving the request
    pub latency_ms: u64,
    /// Timestamp of the ensemble snapshot used
    pub meta_updated_at: DateTime<Utc>,
    /// Refresh generation of the ensemble snapshot used
    pub generation: u64,
}

// ========================================
// Ensemble View
// ========================================

/// Metadata half of the weights view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaView {
    pub model_a: ModelMetadata,
    pub model_b: ModelMetadata,
    pub updated_at: DateTime<Utc>,
    pub generation: u64,
}

/// Read-only view of current weights, metadata and static settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleView {
    /// Default strategy for requests without an override
    pub strategy: Strategy,
    pub weights: WeightPair,
    pub meta: MetaView,
    /// Refresh interval in seconds
    pub refresh_sec: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}
