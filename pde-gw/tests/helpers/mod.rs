//! Test helper modules for pde-gw integration tests
//!
//! - MockUpstream: loopback HTTP model service with scriptable responses
//! - FakeBackend: in-process ModelBackend for engine-level tests

#![allow(dead_code)]

pub mod fake_backend;
pub mod mock_upstream;

pub use fake_backend::FakeBackend;
pub use mock_upstream::{MetadataMode, MockUpstream, PredictMode};
