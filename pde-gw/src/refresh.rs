//! Background metadata refresh
//!
//! Periodically pulls both models' metadata, recomputes weights and
//! publishes a new ensemble snapshot. One cycle:
//!
//! `Idle -> Fetching -> Computing -> Publishing -> Idle`
//!
//! Failure policy: a model whose fetch failed (network error, timeout,
//! error status, unusable body) keeps its previous metadata. A successful
//! reply replaces it, even an empty one.
//! If at least one fetch succeeded, weights are recomputed from the merged
//! metadata and a fresh snapshot is published. If both failed, nothing is
//! published and the previous snapshot stays current, `updated_at`
//! included, so staleness shows up as a timestamp that stops advancing.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::ModelBackend;
use crate::clock::Clock;
use crate::state::{EnsembleSnapshot, EnsembleState};
use crate::weights::weights_for;

/// What one refresh cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was published
    Published {
        generation: u64,
        /// Models whose metadata could not be fetched this cycle
        failed: usize,
    },
    /// Both fetches failed; the previous snapshot was kept
    Retained,
}

/// Periodic refresher of [`EnsembleState`]
pub struct RefreshScheduler {
    model_a: Arc<dyn ModelBackend>,
    model_b: Arc<dyn ModelBackend>,
    state: Arc<EnsembleState>,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl RefreshScheduler {
    pub fn new(
        model_a: Arc<dyn ModelBackend>,
        model_b: Arc<dyn ModelBackend>,
        state: Arc<EnsembleState>,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> Self {
        Self {
            model_a,
            model_b,
            state,
            clock,
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one full refresh cycle
    pub async fn refresh_once(&self) -> RefreshOutcome {
        debug!(phase = "fetching", "Refresh cycle started");
        let (fetched_a, fetched_b) = tokio::join!(
            self.model_a.fetch_metadata(),
            self.model_b.fetch_metadata()
        );

        debug!(phase = "computing", "Deriving ensemble weights");
        let previous = self.state.snapshot().await;
        let mut failed = 0;

        let model_a = match fetched_a {
            Some(meta) => meta,
            None => {
                failed += 1;
                warn!(model = %self.model_a.label(), "No metadata this cycle, keeping previous");
                previous.model_a.clone()
            }
        };
        let model_b = match fetched_b {
            Some(meta) => meta,
            None => {
                failed += 1;
                warn!(model = %self.model_b.label(), "No metadata this cycle, keeping previous");
                previous.model_b.clone()
            }
        };

        if failed == 2 {
            warn!(
                generation = previous.generation,
                updated_at = %previous.updated_at,
                "Both metadata fetches failed, ensemble state retained"
            );
            return RefreshOutcome::Retained;
        }

        let weights = weights_for(&model_a.metrics, &model_b.metrics);

        debug!(phase = "publishing", "Publishing ensemble snapshot");
        let published = self
            .state
            .publish(EnsembleSnapshot::new(
                weights,
                model_a,
                model_b,
                self.clock.now(),
            ))
            .await;

        info!(
            generation = published.generation,
            weight_a = published.weights.model_a,
            weight_b = published.weights.model_b,
            version_a = ?published.model_a.version,
            version_b = ?published.model_b.version,
            "Ensemble weights refreshed"
        );

        RefreshOutcome::Published {
            generation: published.generation,
            failed,
        }
    }

    /// Run until cancelled: once immediately, then every period
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!("Starting ensemble refresh (interval: {}s)", self.period.as_secs());

        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Ensemble refresh stopped");
                    break;
                }
                // First tick completes immediately
                _ = timer.tick() => {
                    self.refresh_once().await;
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) as a background task
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
