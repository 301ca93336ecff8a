//! Gateway configuration
//!
//! Each option resolves as: CLI flag → environment variable → TOML file →
//! compiled default. Clap covers the first two tiers (every flag carries an
//! `env`), `pde_common::config` the third.

use clap::Parser;
use pde_common::config::{load_toml_config, TomlConfig};
use pde_common::{Error, Result, Strategy};
use std::path::PathBuf;
use std::time::Duration;

use crate::model_client::ModelEndpoint;

pub const MODULE_NAME: &str = "pde-gw";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MODEL_A_URL: &str = "http://model_a:8000/v1";
pub const DEFAULT_MODEL_B_URL: &str = "http://model_b:8000/v1";
pub const DEFAULT_MODEL_A_FLAVOR: &str = "model_a";
pub const DEFAULT_MODEL_B_FLAVOR: &str = "model_b";
pub const DEFAULT_REFRESH_SECS: u64 = 600;
pub const DEFAULT_METADATA_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_PREDICT_TIMEOUT_MS: u64 = 5000;

/// Command-line arguments for pde-gw
#[derive(Parser, Debug, Default)]
#[command(name = "pde-gw")]
#[command(about = "Probability-of-default ensemble gateway")]
#[command(version)]
pub struct Args {
    /// TOML config file
    #[arg(short, long, env = "PDE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PDE_GW_PORT")]
    pub port: Option<u16>,

    /// Model A base URL (metadata and predict paths are appended)
    #[arg(long, env = "MODEL_A_URL")]
    pub model_a_url: Option<String>,

    /// Model B base URL (metadata and predict paths are appended)
    #[arg(long, env = "MODEL_B_URL")]
    pub model_b_url: Option<String>,

    /// Flavor label for model A when it does not report one
    #[arg(long, env = "MODEL_A_FLAVOR")]
    pub model_a_flavor: Option<String>,

    /// Flavor label for model B when it does not report one
    #[arg(long, env = "MODEL_B_FLAVOR")]
    pub model_b_flavor: Option<String>,

    /// Seconds between metadata refreshes
    #[arg(long, env = "ENSEMBLE_REFRESH_SEC")]
    pub refresh_secs: Option<u64>,

    /// Default combination strategy (average, weighted, model_a_only, model_b_only)
    #[arg(long, env = "ENSEMBLE_STRATEGY")]
    pub strategy: Option<String>,

    /// Timeout for metadata calls in milliseconds
    #[arg(long, env = "METADATA_TIMEOUT_MS")]
    pub metadata_timeout_ms: Option<u64>,

    /// Timeout for predict calls in milliseconds
    #[arg(long, env = "PREDICT_TIMEOUT_MS")]
    pub predict_timeout_ms: Option<u64>,
}

/// Upstream settings for one model slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub url: String,
    pub flavor: String,
}

/// Fully resolved gateway configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub port: u16,
    pub model_a: ModelConfig,
    pub model_b: ModelConfig,
    pub refresh_interval: Duration,
    pub default_strategy: Strategy,
    pub metadata_timeout: Duration,
    pub predict_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            model_a: ModelConfig {
                url: DEFAULT_MODEL_A_URL.to_string(),
                flavor: DEFAULT_MODEL_A_FLAVOR.to_string(),
            },
            model_b: ModelConfig {
                url: DEFAULT_MODEL_B_URL.to_string(),
                flavor: DEFAULT_MODEL_B_FLAVOR.to_string(),
            },
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            default_strategy: Strategy::Weighted,
            metadata_timeout: Duration::from_millis(DEFAULT_METADATA_TIMEOUT_MS),
            predict_timeout: Duration::from_millis(DEFAULT_PREDICT_TIMEOUT_MS),
        }
    }
}

impl GatewayConfig {
    /// Resolve from parsed arguments, loading the TOML tier from disk
    pub fn load(args: Args) -> Result<Self> {
        let toml = load_toml_config(args.config.as_deref(), MODULE_NAME)?;
        Self::resolve(args, toml)
    }

    /// Merge arguments over a TOML config over compiled defaults
    pub fn resolve(args: Args, toml: TomlConfig) -> Result<Self> {
        let strategy = match args.strategy.or(toml.strategy) {
            Some(name) => name
                .parse::<Strategy>()
                .map_err(|e| Error::Config(e.to_string()))?,
            None => Strategy::Weighted,
        };

        let refresh_secs = args
            .refresh_secs
            .or(toml.refresh_secs)
            .unwrap_or(DEFAULT_REFRESH_SECS);
        if refresh_secs == 0 {
            return Err(Error::Config("refresh interval must be at least 1 second".to_string()));
        }

        let metadata_timeout_ms = args
            .metadata_timeout_ms
            .or(toml.metadata_timeout_ms)
            .unwrap_or(DEFAULT_METADATA_TIMEOUT_MS);
        let predict_timeout_ms = args
            .predict_timeout_ms
            .or(toml.predict_timeout_ms)
            .unwrap_or(DEFAULT_PREDICT_TIMEOUT_MS);
        if metadata_timeout_ms == 0 || predict_timeout_ms == 0 {
            return Err(Error::Config("upstream timeouts must be non-zero".to_string()));
        }

        Ok(Self {
            port: args.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            model_a: ModelConfig {
                url: args
                    .model_a_url
                    .or(toml.model_a.url)
                    .unwrap_or_else(|| DEFAULT_MODEL_A_URL.to_string()),
                flavor: args
                    .model_a_flavor
                    .or(toml.model_a.flavor)
                    .unwrap_or_else(|| DEFAULT_MODEL_A_FLAVOR.to_string()),
            },
            model_b: ModelConfig {
                url: args
                    .model_b_url
                    .or(toml.model_b.url)
                    .unwrap_or_else(|| DEFAULT_MODEL_B_URL.to_string()),
                flavor: args
                    .model_b_flavor
                    .or(toml.model_b.flavor)
                    .unwrap_or_else(|| DEFAULT_MODEL_B_FLAVOR.to_string()),
            },
            refresh_interval: Duration::from_secs(refresh_secs),
            default_strategy: strategy,
            metadata_timeout: Duration::from_millis(metadata_timeout_ms),
            predict_timeout: Duration::from_millis(predict_timeout_ms),
        })
    }

    /// Endpoint settings for model A
    pub fn endpoint_a(&self) -> ModelEndpoint {
        self.endpoint("model_a", &self.model_a)
    }

    /// Endpoint settings for model B
    pub fn endpoint_b(&self) -> ModelEndpoint {
        self.endpoint("model_b", &self.model_b)
    }

    fn endpoint(&self, label: &str, model: &ModelConfig) -> ModelEndpoint {
        ModelEndpoint {
            label: label.to_string(),
            base_url: model.url.clone(),
            default_flavor: model.flavor.clone(),
            metadata_timeout: self.metadata_timeout,
            predict_timeout: self.predict_timeout,
        }
    }
}
