//! Scoring under concurrent refresh
//!
//! Publishes new ensemble snapshots while 100 scoring requests are in
//! flight and checks that every response is internally consistent: its
//! weights, component metadata, timestamp and generation must all come from
//! one published snapshot.

mod helpers;

use chrono::{DateTime, Utc};
use helpers::FakeBackend;
use pde_common::{ScoreResponse, Strategy, WeightPair};
use pde_gw::clock::SystemClock;
use pde_gw::orchestrator::ScoringOrchestrator;
use pde_gw::refresh::{RefreshOutcome, RefreshScheduler};
use pde_gw::state::EnsembleState;
use pde_gw::weights::weights_for;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct Engine {
    state: Arc<EnsembleState>,
    orchestrator: Arc<ScoringOrchestrator>,
    scheduler: Arc<RefreshScheduler>,
    model_a: Arc<FakeBackend>,
    model_b: Arc<FakeBackend>,
}

fn engine(predict_delay: Duration) -> Engine {
    let model_a = Arc::new(FakeBackend::new("model_a", 0.04, 0.55).with_predict_delay(predict_delay));
    let model_b = Arc::new(FakeBackend::new("model_b", 0.12, 0.70).with_predict_delay(predict_delay));
    let state = Arc::new(EnsembleState::new("model_a", "model_b"));

    let orchestrator = Arc::new(ScoringOrchestrator::new(
        model_a.clone(),
        model_b.clone(),
        Arc::clone(&state),
        Strategy::Weighted,
    ));
    let scheduler = Arc::new(RefreshScheduler::new(
        model_a.clone(),
        model_b.clone(),
        Arc::clone(&state),
        Arc::new(SystemClock),
        Duration::from_secs(600),
    ));

    Engine {
        state,
        orchestrator,
        scheduler,
        model_a,
        model_b,
    }
}

/// generation -> (updated_at, weights) for every published snapshot
type Published = HashMap<u64, (DateTime<Utc>, WeightPair)>;

fn assert_consistent(response: &ScoreResponse, published: &Published) {
    // Weights agree with the metadata carried alongside them
    let derived = weights_for(
        &response.components.model_a.metrics,
        &response.components.model_b.metrics,
    );
    assert_eq!(response.weights, derived, "weights/metadata mismatch: {:?}", response);

    if response.generation == 0 {
        assert_eq!(response.weights, WeightPair::NEUTRAL);
        assert_eq!(response.meta_updated_at, DateTime::<Utc>::UNIX_EPOCH);
        assert!(response.components.model_a.version.is_none());
        return;
    }

    let (updated_at, weights) = published
        .get(&response.generation)
        .unwrap_or_else(|| panic!("generation {} never published", response.generation));
    assert_eq!(&response.meta_updated_at, updated_at);
    assert_eq!(&response.weights, weights);

    // Version strings encode the fetch number, which equals the generation
    // when every refresh succeeds
    let n = response.generation;
    assert_eq!(
        response.components.model_a.version.as_deref(),
        Some(format!("model_a-{}", n).as_str())
    );
    assert_eq!(
        response.components.model_b.version.as_deref(),
        Some(format!("model_b-{}", n).as_str())
    );

    let expected_pd = pde_gw::combine::combine(Strategy::Weighted, response.weights, 0.04, 0.12);
    assert_eq!(response.pd, expected_pd);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_refresh_during_100_inflight_requests() {
    let engine = engine(Duration::from_millis(5));

    let refresher = {
        let scheduler = Arc::clone(&engine.scheduler);
        let state = Arc::clone(&engine.state);
        tokio::spawn(async move {
            let mut published = Published::new();
            for _ in 0..50 {
                if let RefreshOutcome::Published { generation, .. } = scheduler.refresh_once().await {
                    let snapshot = state.snapshot().await;
                    assert_eq!(snapshot.generation, generation);
                    published.insert(generation, (snapshot.updated_at, snapshot.weights));
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            published
        })
    };

    let requests: Vec<_> = (0..100)
        .map(|i| {
            let orchestrator = Arc::clone(&engine.orchestrator);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis((i % 10) * 3)).await;
                orchestrator
                    .score(&json!({ "customer_id": format!("c-{}", i) }), None)
                    .await
                    .expect("fake backends never fail")
            })
        })
        .collect();

    let mut responses = Vec::with_capacity(requests.len());
    for request in requests {
        responses.push(request.await.unwrap());
    }
    let published = refresher.await.unwrap();

    assert_eq!(published.len(), 50);
    for response in &responses {
        assert_consistent(response, &published);
    }

    // Weights really did move between snapshots
    let distinct: std::collections::HashSet<u64> =
        published.values().map(|(_, w)| w.model_a.to_bits()).collect();
    assert!(distinct.len() > 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_requests_keep_working_while_metadata_is_down() {
    let engine = engine(Duration::ZERO);
    engine.scheduler.refresh_once().await;
    let good = engine.state.snapshot().await;

    engine.model_a.set_metadata_failing(true);
    engine.model_b.set_metadata_failing(true);

    let refresher = {
        let scheduler = Arc::clone(&engine.scheduler);
        tokio::spawn(async move {
            for _ in 0..20 {
                assert_eq!(scheduler.refresh_once().await, RefreshOutcome::Retained);
            }
        })
    };

    let requests: Vec<_> = (0..100)
        .map(|_| {
            let orchestrator = Arc::clone(&engine.orchestrator);
            tokio::spawn(async move { orchestrator.score(&json!({}), None).await.unwrap() })
        })
        .collect();

    for request in requests {
        let response = request.await.unwrap();
        assert_eq!(response.generation, good.generation);
        assert_eq!(response.weights, good.weights);
        assert_eq!(response.meta_updated_at, good.updated_at);
    }
    refresher.await.unwrap();

    assert_eq!(*engine.state.snapshot().await, *good);
}
