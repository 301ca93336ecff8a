//! API module for shared HTTP types
//!
//! # Architecture
//!
//! Two sides of the gateway share these definitions:
//! - `upstream`: what model services speak (`/metadata`, `/predict`)
//! - `types`: what the gateway itself serves (weights view, score response)
//!
//! The mock model binary serializes the upstream types; the gateway parses
//! them leniently.
//!
//! # Design Principle
//!
//! This module contains ONLY plain data and pure functions. No HTTP client
//! or server framework dependencies.

pub mod types;
pub mod upstream;

pub use types::{
    ComponentPair, ComponentResult, EnsembleView, HealthResponse, MetaView, ModelMetadata,
    QualityMetrics, ScoreResponse, Strategy, WeightPair,
};
pub use upstream::{MetadataResponse, PredictResponse, UpstreamMetrics};
