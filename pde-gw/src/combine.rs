//! Probability combination
//!
//! The `weighted` strategy mixes in log-odds space: each probability is
//! clamped away from 0 and 1, mapped through `logit`, weighted, summed and
//! mapped back with the logistic function.

use pde_common::{Strategy, WeightPair};
use serde_json::Value;

/// Distance kept from 0 and 1 before taking a logit
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// Reason entries kept in a score response
pub const MAX_REASONS: usize = 3;

/// Clamp into `[PROBABILITY_EPSILON, 1 - PROBABILITY_EPSILON]`
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
}

/// Log-odds, `ln(p / (1 - p))`
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Logistic function, inverse of [`logit`]
pub fn inv_logit(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Combine two model probabilities with the given strategy
pub fn combine(strategy: Strategy, weights: WeightPair, pd_a: f64, pd_b: f64) -> f64 {
    match strategy {
        Strategy::ModelAOnly => pd_a,
        Strategy::ModelBOnly => pd_b,
        Strategy::Average => (pd_a + pd_b) / 2.0,
        Strategy::Weighted => {
            let z = weights.model_a * logit(clamp_probability(pd_a))
                + weights.model_b * logit(clamp_probability(pd_b));
            inv_logit(z)
        }
    }
}

/// Model A's reasons followed by model B's, truncated to [`MAX_REASONS`]
pub fn merge_reasons(reasons_a: &[Value], reasons_b: &[Value]) -> Vec<Value> {
    reasons_a
        .iter()
        .chain(reasons_b)
        .take(MAX_REASONS)
        .cloned()
        .collect()
}
