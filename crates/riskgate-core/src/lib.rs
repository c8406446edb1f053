//! Adaptive-threshold admission control.
//!
//! This crate provides:
//! - Risk normalization and the product-form risk estimate ([`normalize`])
//! - The pain model and necessity discount ([`pain`])
//! - The adaptive denial threshold ([`threshold`])
//! - Bounded FIFO histories of risks and weighted events ([`history`])
//! - Historical desensitization ([`desensitize`])
//! - The orchestrating [`AdmissionController`] and its kill-switch scenario ([`controller`])
//! - Injectable randomness ([`random`]) and the diagnostic record seam ([`record`])

#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod desensitize;
pub mod error;
pub mod history;
pub mod normalize;
pub mod pain;
pub mod random;
pub mod record;
pub mod threshold;

pub use config::ControllerConfig;
pub use controller::{AdmissionController, ControllerStats, KILL_SWITCH_RISK};
pub use desensitize::{DESENSITIZE_BANDS, DesensitizeBand, DesensitizeCheck, Desensitizer};
pub use error::ConfigError;
pub use history::{BoundedHistory, EventMemory, RiskHistory, WeightedEvent};
pub use normalize::{RiskEstimate, estimate_risk, normalize_risk};
pub use pain::PainModel;
pub use random::{EntropySource, FixedDraws, RandomSource, XorShift64};
pub use record::{
    ActionOutcome, DecisionRecord, DecisionSink, KillSwitchOutcome, MemorySink, NullSink, Verdict,
};
pub use threshold::ThresholdCalculator;
