//! HTTP API handlers for pde-gw

pub mod ensemble;
pub mod health;

pub use ensemble::{ensemble_routes, get_weights, score_application};
pub use health::health_routes;
