//! Loopback model service for integration tests
//!
//! Serves `/v1/metadata` and `/v1/predict` on 127.0.0.1 with an ephemeral
//! port. Responses are switched at runtime through `set_metadata` /
//! `set_predict`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub enum MetadataMode {
    Json(Value),
    Status(u16),
    Garbage,
    Delay(Duration, Value),
}

#[derive(Debug, Clone)]
pub enum PredictMode {
    Json(Value),
    Status(u16, String),
    Garbage,
    Delay(Duration, Value),
}

struct Control {
    metadata: Mutex<MetadataMode>,
    predict: Mutex<PredictMode>,
    metadata_calls: AtomicUsize,
    predict_calls: AtomicUsize,
    last_payload: Mutex<Option<Value>>,
}

pub struct MockUpstream {
    /// Base URL including `/v1`
    pub base_url: String,
    control: Arc<Control>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    /// Start a model service reporting the given AUCs and answering `pd`
    pub async fn start(flavor: &str, auc_calibrated: f64, pd: f64) -> Self {
        Self::start_with(
            MetadataMode::Json(metadata_body(flavor, auc_calibrated)),
            PredictMode::Json(predict_body(pd, &[])),
        )
        .await
    }

    pub async fn start_with(metadata: MetadataMode, predict: PredictMode) -> Self {
        let control = Arc::new(Control {
            metadata: Mutex::new(metadata),
            predict: Mutex::new(predict),
            metadata_calls: AtomicUsize::new(0),
            predict_calls: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/metadata", get(serve_metadata))
            .route("/v1/predict", post(serve_predict))
            .with_state(Arc::clone(&control));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://{}/v1", addr),
            control,
            handle,
        }
    }

    pub fn set_metadata(&self, mode: MetadataMode) {
        *self.control.metadata.lock().unwrap() = mode;
    }

    pub fn set_predict(&self, mode: PredictMode) {
        *self.control.predict.lock().unwrap() = mode;
    }

    pub fn metadata_calls(&self) -> usize {
        self.control.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn predict_calls(&self) -> usize {
        self.control.predict_calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<Value> {
        self.control.last_payload.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Metadata body in the shape real model services return
pub fn metadata_body(flavor: &str, auc_calibrated: f64) -> Value {
    json!({
        "model_version": format!("{}-1.0.0", flavor),
        "feature_order": ["age", "income", "liabilities", "credit_history_months"],
        "metrics": {
            "flavor": flavor,
            "auc_raw": auc_calibrated - 0.01,
            "auc_calibrated": auc_calibrated,
            "ks": 0.4,
            "gini": 2.0 * auc_calibrated - 1.0
        }
    })
}

pub fn predict_body(pd: f64, reasons: &[&str]) -> Value {
    let top_reasons: Vec<Value> = reasons
        .iter()
        .map(|f| json!({ "feature": f, "impact": 0.01 }))
        .collect();
    json!({
        "pd": pd,
        "top_reasons": top_reasons,
        "model_version": "pd_mock_0.1.0",
        "latency_ms": 0
    })
}

async fn serve_metadata(State(control): State<Arc<Control>>) -> Response {
    control.metadata_calls.fetch_add(1, Ordering::SeqCst);
    let mode = control.metadata.lock().unwrap().clone();
    match mode {
        MetadataMode::Json(body) => Json(body).into_response(),
        MetadataMode::Status(code) => status(code, "metadata unavailable"),
        MetadataMode::Garbage => garbage(),
        MetadataMode::Delay(delay, body) => {
            tokio::time::sleep(delay).await;
            Json(body).into_response()
        }
    }
}

async fn serve_predict(State(control): State<Arc<Control>>, Json(payload): Json<Value>) -> Response {
    control.predict_calls.fetch_add(1, Ordering::SeqCst);
    *control.last_payload.lock().unwrap() = Some(payload);
    let mode = control.predict.lock().unwrap().clone();
    match mode {
        PredictMode::Json(body) => Json(body).into_response(),
        PredictMode::Status(code, body) => status(code, &body),
        PredictMode::Garbage => garbage(),
        PredictMode::Delay(delay, body) => {
            tokio::time::sleep(delay).await;
            Json(body).into_response()
        }
    }
}

fn status(code: u16, body: &str) -> Response {
    let code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, body.to_string()).into_response()
}

fn garbage() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        "{not json",
    )
        .into_response()
}
