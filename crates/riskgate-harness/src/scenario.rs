//! Scenario fixtures: scripted controller sessions.
//!
//! A scenario is a JSON document listing controller operations in order.
//! Evaluation and kill-switch steps may carry expectations that the
//! [`ScenarioRunner`](crate::ScenarioRunner) checks on replay.

use std::path::Path;

use riskgate_core::{ControllerConfig, RiskEstimate, Verdict};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Fixture format version understood by this crate.
pub const SCENARIO_VERSION: &str = "v1";

/// Risk given directly, or as a product-form estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RiskInput {
    Direct(f64),
    Estimate(RiskEstimate),
}

impl RiskInput {
    /// Risk value handed to the controller (normalized there).
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Self::Direct(risk) => *risk,
            Self::Estimate(estimate) => estimate.risk(),
        }
    }
}

impl From<f64> for RiskInput {
    fn from(risk: f64) -> Self {
        Self::Direct(risk)
    }
}

/// One scripted operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScenarioStep {
    SetNecessity {
        category: String,
        necessity: f64,
    },
    Evaluate {
        risk: RiskInput,
        category: String,
        #[serde(default)]
        consequence: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect: Option<Verdict>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect_desensitized: Option<bool>,
    },
    LogEvent {
        category: String,
        risk: RiskInput,
    },
    KillSwitch {
        #[serde(default)]
        fatal: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect_avoided: Option<bool>,
    },
    /// Checks counters at this point of the session.
    ExpectStats {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avoided_dangers: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overreactions: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event_memory_len: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        risk_history_len: Option<usize>,
    },
}

impl ScenarioStep {
    /// Short operation name for reports.
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::SetNecessity { .. } => "set_necessity",
            Self::Evaluate { .. } => "evaluate",
            Self::LogEvent { .. } => "log_event",
            Self::KillSwitch { .. } => "kill_switch",
            Self::ExpectStats { .. } => "expect_stats",
        }
    }

    #[must_use]
    pub fn evaluate(risk: f64, category: &str, consequence: bool) -> Self {
        Self::Evaluate {
            risk: risk.into(),
            category: category.to_string(),
            consequence,
            expect: None,
            expect_desensitized: None,
        }
    }

    #[must_use]
    pub fn log_event(category: &str, risk: f64) -> Self {
        Self::LogEvent {
            category: category.to_string(),
            risk: risk.into(),
        }
    }

    #[must_use]
    pub fn set_necessity(category: &str, necessity: f64) -> Self {
        Self::SetNecessity {
            category: category.to_string(),
            necessity,
        }
    }

    /// Attach an expected verdict to an `evaluate` step; other steps are
    /// returned unchanged.
    #[must_use]
    pub fn expecting(mut self, verdict: Verdict) -> Self {
        if let Self::Evaluate { expect, .. } = &mut self {
            *expect = Some(verdict);
        }
        self
    }
}

/// A named, versioned list of steps with optional controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub version: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Overrides the default controller configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ControllerConfig>,
    /// Seed for the desensitization draws; entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub steps: Vec<ScenarioStep>,
}

impl ScenarioSet {
    pub fn from_json(json: &str) -> Result<Self, HarnessError> {
        let set: Self = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path).map_err(|source| HarnessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Shape checks that serde cannot express.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let fixture_error = |message: String| HarnessError::Fixture {
            scenario: self.name.clone(),
            message,
        };
        if self.version != SCENARIO_VERSION {
            return Err(fixture_error(format!(
                "unsupported version '{}', expected '{SCENARIO_VERSION}'",
                self.version
            )));
        }
        if self.steps.is_empty() {
            return Err(fixture_error("no steps".to_string()));
        }
        for (index, step) in self.steps.iter().enumerate() {
            let category = match step {
                ScenarioStep::SetNecessity { category, .. }
                | ScenarioStep::Evaluate { category, .. }
                | ScenarioStep::LogEvent { category, .. } => category,
                ScenarioStep::KillSwitch { .. } | ScenarioStep::ExpectStats { .. } => continue,
            };
            if category.trim().is_empty() {
                return Err(fixture_error(format!(
                    "step {index} ({}) has an empty category",
                    step.op()
                )));
            }
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }

    /// The reference demo session: two necessities, five evaluations
    /// interleaved with manual annotations, then a non-fatal kill switch.
    #[must_use]
    pub fn demo() -> Self {
        use ScenarioStep as S;
        Self {
            version: SCENARIO_VERSION.to_string(),
            name: "demo".to_string(),
            description: Some(
                "Escalating risks against a growing event memory, ending in a kill switch"
                    .to_string(),
            ),
            config: None,
            seed: Some(0xDEAD_BEEF),
            steps: vec![
                S::set_necessity("external_interrupt", 0.92),
                S::set_necessity("logic_conflict", 0.0),
                S::evaluate(0.2, "logic_conflict", false).expecting(Verdict::Accept),
                S::log_event("logic_conflict", 0.2),
                S::evaluate(0.6, "external_interrupt", true).expecting(Verdict::Accept),
                S::log_event("overload", 0.6),
                S::evaluate(0.85, "external_interrupt", false).expecting(Verdict::Accept),
                S::log_event("overload", 0.85),
                S::evaluate(0.95, "external_interrupt", false).expecting(Verdict::Deny),
                S::log_event("overload", 0.95),
                S::evaluate(1.0, "shutdown", true).expecting(Verdict::Deny),
                S::log_event("shutdown", 1.0),
                S::KillSwitch {
                    fatal: false,
                    expect_avoided: Some(true),
                },
                S::ExpectStats {
                    avoided_dangers: Some(2),
                    overreactions: Some(2),
                    event_memory_len: Some(6),
                    risk_history_len: Some(5),
                },
            ],
        }
    }
}
