//! Initialization logic for logging and metrics shared by the plan executor
//! and the action layer, plus small helpers around them.
pub mod config;
pub mod metrics;
pub mod tracing;

pub use config::Config;
