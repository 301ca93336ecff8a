//! Configuration file loading
//!
//! Every gateway option resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are handled by clap in each binary. This module owns tier 3.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "PDE_CONFIG";

/// Gateway settings as they may appear in a TOML file
///
/// Every field is optional; anything missing falls through to the
/// compiled default.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Listen port for the gateway HTTP server
    pub port: Option<u16>,
    /// Seconds between background metadata refreshes
    pub refresh_secs: Option<u64>,
    /// Default combination strategy name
    pub strategy: Option<String>,
    /// Timeout for metadata calls in milliseconds
    pub metadata_timeout_ms: Option<u64>,
    /// Timeout for predict calls in milliseconds
    pub predict_timeout_ms: Option<u64>,
    /// Model A upstream
    #[serde(default)]
    pub model_a: ModelSection,
    /// Model B upstream
    #[serde(default)]
    pub model_b: ModelSection,
}

/// `[model_a]` / `[model_b]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    /// Base URL, e.g. `http://model_a:8000/v1`
    pub url: Option<String>,
    /// Flavor label used when the model does not report one
    pub flavor: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config from a string
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Default config file location for a module, e.g. `~/.config/pde/pde-gw.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pde").join(format!("{}.toml", module_name)))
}

/// Load the TOML tier for a module
///
/// An explicitly named file (CLI argument, then `PDE_CONFIG`) must exist and
/// parse. The platform default location is optional: if it does not exist
/// an empty config is returned.
pub fn load_toml_config(cli_path: Option<&Path>, module_name: &str) -> Result<TomlConfig> {
    let explicit = cli_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        info!("Loading config file {}", path.display());
        return TomlConfig::from_file(&path);
    }

    match default_config_path(module_name) {
        Some(path) if path.exists() => {
            info!("Loading config file {}", path.display());
            TomlConfig::from_file(&path)
        }
        Some(path) => {
            debug!("No config file at {}, using defaults", path.display());
            Ok(TomlConfig::default())
        }
        None => Ok(TomlConfig::default()),
    }
}
