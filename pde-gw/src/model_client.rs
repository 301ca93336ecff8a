//! HTTP client for model services
//!
//! Speaks `GET <base>/metadata` and `POST <base>/predict`. Each call carries
//! its own timeout. Every failure is classified into an [`UpstreamError`];
//! callers decide whether it is fatal.

use async_trait::async_trait;
use pde_common::ModelMetadata;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::backend::{ModelBackend, Prediction};
use crate::error::UpstreamError;

const USER_AGENT: &str = concat!("pde-gw/", env!("CARGO_PKG_VERSION"));

/// Upstream body text kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for one model service
#[derive(Debug, Clone)]
pub struct ModelEndpoint {
    /// Slot label ("model_a" / "model_b")
    pub label: String,
    /// Base URL; `/metadata` and `/predict` are appended
    pub base_url: String,
    /// Flavor reported when the model does not name one
    pub default_flavor: String,
    pub metadata_timeout: Duration,
    pub predict_timeout: Duration,
}

/// Model service client over reqwest
pub struct HttpModelClient {
    endpoint: ModelEndpoint,
    http_client: reqwest::Client,
}

impl HttpModelClient {
    /// Create a client for one endpoint
    pub fn new(endpoint: ModelEndpoint) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UpstreamError::Network {
                model: endpoint.label.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            endpoint,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &ModelEndpoint {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.base_url.trim_end_matches('/'), path)
    }

    fn classify(&self, err: reqwest::Error, timeout: Duration) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout {
                model: self.endpoint.label.clone(),
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if err.is_decode() {
            UpstreamError::Malformed {
                model: self.endpoint.label.clone(),
                message: err.to_string(),
            }
        } else {
            UpstreamError::Network {
                model: self.endpoint.label.clone(),
                message: err.to_string(),
            }
        }
    }

    /// Send a request and return the body of a successful response
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<Value, UpstreamError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| self.classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                model: self.endpoint.label.clone(),
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e, timeout)
            } else {
                UpstreamError::Malformed {
                    model: self.endpoint.label.clone(),
                    message: e.to_string(),
                }
            }
        })
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

#[async_trait]
impl ModelBackend for HttpModelClient {
    fn label(&self) -> &str {
        &self.endpoint.label
    }

    async fn try_fetch_metadata(&self) -> Result<ModelMetadata, UpstreamError> {
        let url = self.url("metadata");
        debug!(model = %self.endpoint.label, url = %url, "Fetching model metadata");

        let body = self
            .send(self.http_client.get(&url), self.endpoint.metadata_timeout)
            .await?;

        if !body.is_object() {
            return Err(UpstreamError::Malformed {
                model: self.endpoint.label.clone(),
                message: "metadata body is not a JSON object".to_string(),
            });
        }

        Ok(ModelMetadata::from_metadata_json(
            &body,
            &self.endpoint.default_flavor,
        ))
    }

    async fn predict(&self, payload: &Value) -> Result<Prediction, UpstreamError> {
        let url = self.url("predict");
        let body = self
            .send(
                self.http_client.post(&url).json(payload),
                self.endpoint.predict_timeout,
            )
            .await?;

        parse_prediction(&body).map_err(|message| UpstreamError::Malformed {
            model: self.endpoint.label.clone(),
            message,
        })
    }
}

/// Read `pd` and `top_reasons` from a predict body
///
/// `pd` must be a probability. Reasons that are missing or not an array
/// count as none. Any other field is ignored.
fn parse_prediction(body: &Value) -> Result<Prediction, String> {
    let pd = match body.get("pd") {
        Some(value) => value
            .as_f64()
            .ok_or_else(|| format!("pd {} is not a number", value))?,
        None => return Err("missing pd".to_string()),
    };
    if !pd.is_finite() || !(0.0..=1.0).contains(&pd) {
        return Err(format!("pd {} is not a probability", pd));
    }

    let reasons = body
        .get("top_reasons")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    Ok(Prediction { pd, reasons })
}
