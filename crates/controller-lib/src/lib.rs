//! Controller library for closed-loop replica autoscaling
//!
//! This crate provides the core functionality for:
//! - Load-generator invocation and report parsing
//! - Feature-vector construction for the prediction service
//! - Replica prediction over HTTP with bounded retry
//! - Workload scaling through the orchestrator CLI
//! - Durable per-cycle observation logging

pub mod config;
pub mod controller;
pub mod error;
pub mod features;
pub mod loadgen;
pub mod models;
pub mod predictor;
pub mod scaler;
pub mod store;

pub use config::ControllerConfig;
pub use controller::{ControlLoop, CycleOutcome, RunSummary};
pub use error::ControllerError;
pub use features::FeatureVectorBuilder;
pub use loadgen::LoadGenerator;
pub use models::*;
pub use predictor::{PredictorClient, RetryConfig};
pub use scaler::ScalingActuator;
pub use store::ObservationStore;
