//! Ensemble weight derivation
//!
//! Turns the two models' self-reported quality into a normalized weight pair.
//! Pure functions only.

use pde_common::{QualityMetrics, WeightPair};

/// Lower bound applied to each quality signal so no model gets zero weight
pub const QUALITY_FLOOR: f64 = 1e-6;

/// Quality signal used for weighting
///
/// Calibrated AUC when reported, raw AUC otherwise, `None` if neither.
pub fn quality_signal(metrics: &QualityMetrics) -> Option<f64> {
    metrics
        .auc_calibrated
        .filter(|v| v.is_finite())
        .or(metrics.auc_raw.filter(|v| v.is_finite()))
}

/// Derive normalized weights from two quality signals
///
/// Both present: each is floored at [`QUALITY_FLOOR`] and the pair is
/// normalized so `model_a + model_b == 1`. Either missing (or not a finite
/// number): neutral `0.5 / 0.5`.
pub fn compute_weights(quality_a: Option<f64>, quality_b: Option<f64>) -> WeightPair {
    match (quality_a, quality_b) {
        (Some(a), Some(b)) if a.is_finite() && b.is_finite() => {
            let a = a.max(QUALITY_FLOOR);
            let b = b.max(QUALITY_FLOOR);
            let model_a = a / (a + b);
            WeightPair {
                model_a,
                model_b: 1.0 - model_a,
            }
        }
        _ => WeightPair::NEUTRAL,
    }
}

/// Weights for two models' metrics, per the quality signal policy
pub fn weights_for(metrics_a: &QualityMetrics, metrics_b: &QualityMetrics) -> WeightPair {
    compute_weights(quality_signal(metrics_a), quality_signal(metrics_b))
}
