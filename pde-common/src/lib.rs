//! # PDE Common Library
//!
//! Shared code for the PD ensemble gateway and its companion binaries:
//! - Error types
//! - TOML configuration loading
//! - Upstream model wire types (metadata, predict)
//! - Gateway API request/response types

pub mod api;
pub mod config;
pub mod error;

pub use api::types::{
    ComponentPair, ComponentResult, EnsembleView, HealthResponse, MetaView, ModelMetadata,
    QualityMetrics, ScoreResponse, Strategy, WeightPair,
};
pub use error::{Error, Result};
