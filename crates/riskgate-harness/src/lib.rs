//! Replay and observability tooling for riskgate controllers.
//!
//! This crate provides:
//! - Scenario fixtures: scripted controller sessions as JSON
//! - Scenario runner: replay a fixture against a fresh controller and check expectations
//! - Structured logging: JSONL decision logs with a validating schema and artifact index
//! - A `tracing` sink for live decision traces

#![forbid(unsafe_code)]

pub mod error;
pub mod runner;
pub mod scenario;
pub mod seed;
pub mod structured_log;
pub mod tracing_sink;

pub use error::HarnessError;
pub use runner::{ScenarioReport, ScenarioRunner, StepResult};
pub use scenario::{RiskInput, ScenarioSet, ScenarioStep};
pub use structured_log::LogEmitter;
pub use tracing_sink::TracingSink;
