//! pde-mock-model - stand-in model service
//!
//! Speaks the upstream protocol the gateway expects (`/v1/metadata`,
//! `/v1/predict`) with a simple heuristic PD, so the gateway can be run
//! end to end without trained models.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use pde_common::api::{MetadataResponse, PredictResponse, UpstreamMetrics};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for pde-mock-model
#[derive(Parser, Debug, Clone)]
#[command(name = "pde-mock-model")]
#[command(about = "Mock probability-of-default model service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "MOCK_MODEL_PORT")]
    port: u16,

    /// Model version reported by /v1/metadata
    #[arg(long, default_value = "pd_mock_0.1.0", env = "MOCK_MODEL_VERSION")]
    model_version: String,

    /// Flavor label reported by /v1/metadata
    #[arg(long, env = "MOCK_MODEL_FLAVOR")]
    flavor: Option<String>,

    #[arg(long, env = "MOCK_MODEL_AUC_RAW")]
    auc_raw: Option<f64>,

    #[arg(long, env = "MOCK_MODEL_AUC_CALIBRATED")]
    auc_calibrated: Option<f64>,

    #[arg(long, env = "MOCK_MODEL_KS")]
    ks: Option<f64>,

    #[arg(long, env = "MOCK_MODEL_GINI")]
    gini: Option<f64>,

    /// Amplitude of uniform noise added to each PD (0 for deterministic output)
    #[arg(long, default_value = "0.01", env = "MOCK_MODEL_NOISE")]
    noise: f64,
}

/// Applicant features accepted by /v1/predict
#[derive(Debug, Clone, Deserialize)]
struct Features {
    customer_id: String,
    age: f64,
    income: f64,
    liabilities: f64,
    credit_history_months: f64,
}

impl Features {
    fn validate(&self) -> Result<(), String> {
        if self.customer_id.is_empty() {
            return Err("customer_id must not be empty".to_string());
        }
        if !(18.0..=100.0).contains(&self.age) {
            return Err(format!("age {} outside 18..=100", self.age));
        }
        for (name, value) in [
            ("income", self.income),
            ("liabilities", self.liabilities),
            ("credit_history_months", self.credit_history_months),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }
        Ok(())
    }
}

/// Heuristic PD terms: (income factor, debt ratio, history bonus)
fn risk_terms(f: &Features) -> (f64, f64, f64) {
    let income_factor = if f.income <= 0.0 {
        1.0
    } else {
        (10_000_000.0 / (f.income + 1.0)).min(1.0)
    };
    let debt_ratio = if f.income == 0.0 {
        0.0
    } else {
        f.liabilities / (f.income + 1.0)
    };
    let history_bonus = (12.0 - f.credit_history_months.min(120.0)).max(0.0) / 120.0;
    (income_factor, debt_ratio, history_bonus)
}

/// PD before noise, clamped to [0.0001, 0.9999]
fn heuristic_pd(f: &Features, noise: f64) -> f64 {
    let (income_factor, debt_ratio, history_bonus) = risk_terms(f);
    let pd = 0.03 + 0.02 * income_factor + 0.03 * debt_ratio + 0.02 * history_bonus + noise;
    pd.clamp(0.0001, 0.9999)
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

struct MockModel {
    args: Args,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "model" }))
}

async fn metadata(State(model): State<Arc<MockModel>>) -> Json<MetadataResponse> {
    let args = &model.args;
    Json(MetadataResponse {
        model_version: Some(args.model_version.clone()),
        metrics: Some(UpstreamMetrics {
            flavor: args.flavor.clone(),
            auc_raw: args.auc_raw,
            auc_calibrated: args.auc_calibrated,
            ks: args.ks,
            gini: args.gini,
        }),
    })
}

async fn predict(
    State(model): State<Arc<MockModel>>,
    Json(features): Json<Features>,
) -> Response {
    let started = Instant::now();
    if let Err(message) = features.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": message })),
        )
            .into_response();
    }

    let noise = if model.args.noise > 0.0 {
        (rand::thread_rng().gen::<f64>() - 0.5) * model.args.noise
    } else {
        0.0
    };
    let pd = heuristic_pd(&features, noise);
    let (income_factor, debt_ratio, history_bonus) = risk_terms(&features);

    Json(PredictResponse {
        pd,
        top_reasons: Some(vec![
            json!({ "feature": "liabilities/income", "impact": round6(0.03 * debt_ratio) }),
            json!({ "feature": "credit_history_months", "impact": round6(0.02 * history_bonus) }),
            json!({ "feature": "income", "impact": round6(0.02 * income_factor) }),
        ]),
        model_version: Some(model.args.model_version.clone()),
        latency_ms: Some(started.elapsed().as_millis() as u64),
    })
    .into_response()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pde_mock_model=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!(
        "Starting PDE mock model v{} [{}] built {} ({}), reports {} / {:?}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
        args.model_version,
        args.flavor
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let app = Router::new()
        .route("/v1/health", get(health))
        .route("/v1/metadata", get(metadata))
        .route("/v1/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(MockModel { args }));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("pde-mock-model listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
