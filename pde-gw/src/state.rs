//! Shared ensemble state
//!
//! The current weights and both models' metadata live in one immutable
//! [`EnsembleSnapshot`] behind an `Arc`. Readers clone the `Arc` and work
//! from that snapshot for as long as they like; the refresh task replaces
//! the whole `Arc` in one write. A reader therefore sees either the old
//! snapshot or the new one, never a mix.
//!
//! Both lock sections are a pointer clone or a pointer store, so readers
//! and the writer only ever wait on each other for that long.

use chrono::{DateTime, Utc};
use pde_common::{EnsembleView, MetaView, ModelMetadata, Strategy, WeightPair};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Weights and metadata published together by one refresh
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleSnapshot {
    pub weights: WeightPair,
    pub model_a: ModelMetadata,
    pub model_b: ModelMetadata,
    /// When this snapshot was built (epoch for the startup default)
    pub updated_at: DateTime<Utc>,
    /// 0 for the startup default, +1 per publish
    pub generation: u64,
}

impl EnsembleSnapshot {
    /// Snapshot ready to publish; the generation is assigned on publish
    pub fn new(
        weights: WeightPair,
        model_a: ModelMetadata,
        model_b: ModelMetadata,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            weights,
            model_a,
            model_b,
            updated_at,
            generation: 0,
        }
    }

    /// Startup default: equal weights, no metadata
    pub fn neutral(flavor_a: &str, flavor_b: &str) -> Self {
        Self::new(
            WeightPair::NEUTRAL,
            ModelMetadata::unknown(flavor_a),
            ModelMetadata::unknown(flavor_b),
            DateTime::<Utc>::UNIX_EPOCH,
        )
    }

    /// Read-only view combined with static settings
    pub fn to_view(&self, strategy: Strategy, refresh_sec: u64) -> EnsembleView {
        EnsembleView {
            strategy,
            weights: self.weights,
            meta: MetaView {
                model_a: self.model_a.clone(),
                model_b: self.model_b.clone(),
                updated_at: self.updated_at,
                generation: self.generation,
            },
            refresh_sec,
        }
    }
}

/// Process-wide holder of the current snapshot
///
/// Written only by the refresh scheduler; read by every scoring request.
pub struct EnsembleState {
    current: RwLock<Arc<EnsembleSnapshot>>,
}

impl EnsembleState {
    /// State holding the neutral startup snapshot
    pub fn new(flavor_a: &str, flavor_b: &str) -> Self {
        Self::with_snapshot(EnsembleSnapshot::neutral(flavor_a, flavor_b))
    }

    pub fn with_snapshot(snapshot: EnsembleSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Arc<EnsembleSnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the current snapshot
    ///
    /// Assigns the next generation number and returns the published value.
    pub async fn publish(&self, mut snapshot: EnsembleSnapshot) -> Arc<EnsembleSnapshot> {
        let mut current = self.current.write().await;
        snapshot.generation = current.generation + 1;
        let published = Arc::new(snapshot);
        *current = Arc::clone(&published);
        published
    }
}
