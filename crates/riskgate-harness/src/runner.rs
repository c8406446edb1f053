//! Scenario execution engine.

use std::fmt::Display;

use riskgate_core::{
    AdmissionController, ControllerConfig, ControllerStats, DecisionSink, EntropySource, NullSink,
    RandomSource, Verdict, XorShift64,
};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::scenario::{ScenarioSet, ScenarioStep};

/// Result of one replayed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub op: String,
    pub passed: bool,
    /// Human-readable summary of what the controller did.
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<String>,
}

/// Outcome of replaying a whole scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub controller_id: String,
    /// Seed used for the desensitization draws; `None` means OS entropy.
    pub seed: Option<u64>,
    pub passed: usize,
    pub failed: usize,
    pub stats: ControllerStats,
    pub steps: Vec<StepResult>,
}

impl ScenarioReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    #[must_use]
    pub fn failures(&self) -> Vec<&StepResult> {
        self.steps.iter().filter(|s| !s.passed).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Replays scenarios against fresh controllers.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    controller_id: String,
    seed: Option<u64>,
    config: Option<ControllerConfig>,
}

impl ScenarioRunner {
    #[must_use]
    pub fn new(controller_id: impl Into<String>) -> Self {
        Self {
            controller_id: controller_id.into(),
            seed: None,
            config: None,
        }
    }

    /// Seed that takes precedence over the fixture's own.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Configuration that takes precedence over the fixture's own.
    #[must_use]
    pub fn with_config(mut self, config: Option<ControllerConfig>) -> Self {
        self.config = config;
        self
    }

    pub fn run(&self, set: &ScenarioSet) -> Result<ScenarioReport, HarnessError> {
        self.run_with_sink(set, NullSink).map(|(report, _)| report)
    }

    /// Replay `set`, routing every controller record into `sink`. The sink is
    /// handed back with the report.
    pub fn run_with_sink<S: DecisionSink>(
        &self,
        set: &ScenarioSet,
        sink: S,
    ) -> Result<(ScenarioReport, S), HarnessError> {
        set.validate()?;
        let config = self
            .config
            .clone()
            .or_else(|| set.config.clone())
            .unwrap_or_default();
        let seed = self.seed.or(set.seed);
        let rng: Box<dyn RandomSource> = match seed {
            Some(seed) => Box::new(XorShift64::new(seed)),
            None => Box::new(EntropySource::from_entropy()),
        };
        let mut controller = AdmissionController::with_parts(config, rng, sink)?;

        tracing::info!(
            scenario = %set.name,
            controller = %self.controller_id,
            seed = ?seed,
            steps = set.steps.len(),
            "replaying scenario"
        );

        let steps: Vec<StepResult> = set
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let result = execute_step(&mut controller, index, step);
                if result.passed {
                    tracing::debug!(index, op = %result.op, detail = %result.detail, "step ok");
                } else {
                    tracing::warn!(
                        index,
                        op = %result.op,
                        mismatches = ?result.mismatches,
                        "step failed"
                    );
                }
                result
            })
            .collect();

        let failed = steps.iter().filter(|s| !s.passed).count();
        let report = ScenarioReport {
            scenario: set.name.clone(),
            controller_id: self.controller_id.clone(),
            seed,
            passed: steps.len() - failed,
            failed,
            stats: controller.stats(),
            steps,
        };
        tracing::info!(
            scenario = %report.scenario,
            passed = report.passed,
            failed = report.failed,
            "scenario finished"
        );
        Ok((report, controller.into_sink()))
    }
}

fn execute_step<R: RandomSource, S: DecisionSink>(
    controller: &mut AdmissionController<R, S>,
    index: usize,
    step: &ScenarioStep,
) -> StepResult {
    let mut mismatches = Vec::new();
    let mut verdict = None;

    let detail = match step {
        ScenarioStep::SetNecessity {
            category,
            necessity,
        } => {
            controller.set_event_necessity(category, *necessity);
            let stored = controller.necessity(category).unwrap_or_default();
            format!("{category} necessity {stored:.3}")
        }
        ScenarioStep::Evaluate {
            risk,
            category,
            consequence,
            expect,
            expect_desensitized,
        } => {
            let out = controller.evaluate_action(risk.value(), category, *consequence);
            verdict = Some(out.verdict);
            check(
                "verdict",
                expect.map(Verdict::as_str),
                out.verdict.as_str(),
                &mut mismatches,
            );
            check(
                "desensitized",
                *expect_desensitized,
                out.desensitized,
                &mut mismatches,
            );
            format!(
                "{} {category}: risk {:.3}, pain {:.3}, threshold {:.3}{}",
                out.verdict.as_str(),
                out.risk,
                out.pain,
                out.threshold,
                if out.desensitized { ", desensitized" } else { "" },
            )
        }
        ScenarioStep::LogEvent { category, risk } => {
            let event = controller.log_event(category, risk.value());
            format!("{category} weighted risk {:.3}", event.weighted_risk)
        }
        ScenarioStep::KillSwitch {
            fatal,
            expect_avoided,
        } => {
            let out = controller.simulate_kill_switch(*fatal);
            check(
                "shutdown_avoided",
                *expect_avoided,
                out.shutdown_avoided,
                &mut mismatches,
            );
            format!(
                "shutdown {} (fatal {fatal}): pain {:.3}, threshold {:.3}",
                if out.shutdown_avoided { "avoided" } else { "accepted" },
                out.pain,
                out.threshold,
            )
        }
        ScenarioStep::ExpectStats {
            avoided_dangers,
            overreactions,
            event_memory_len,
            risk_history_len,
        } => {
            let stats = controller.stats();
            let expected = [
                ("avoided_dangers", *avoided_dangers, stats.avoided_dangers),
                ("overreactions", *overreactions, stats.overreactions),
            ];
            for (what, want, got) in expected {
                check(what, want, got, &mut mismatches);
            }
            let expected = [
                ("event_memory_len", *event_memory_len, stats.event_memory_len),
                ("risk_history_len", *risk_history_len, stats.risk_history_len),
            ];
            for (what, want, got) in expected {
                check(what, want, got, &mut mismatches);
            }
            format!(
                "avoided {}, overreactions {}, memory {}, history {}, threshold {:.3}",
                stats.avoided_dangers,
                stats.overreactions,
                stats.event_memory_len,
                stats.risk_history_len,
                stats.current_threshold,
            )
        }
    };

    StepResult {
        index,
        op: step.op().to_string(),
        passed: mismatches.is_empty(),
        detail,
        verdict,
        mismatches,
    }
}

fn check<T: PartialEq + Display>(
    what: &str,
    expected: Option<T>,
    actual: T,
    mismatches: &mut Vec<String>,
) {
    if let Some(expected) = expected
        && expected != actual
    {
        mismatches.push(format!("{what}: expected {expected}, got {actual}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskgate_core::MemorySink;

    fn scenario(json: &str) -> ScenarioSet {
        ScenarioSet::from_json(json).expect("valid scenario json")
    }

    #[test]
    fn passing_expectations_are_reported() {
        let set = scenario(
            r#"{
                "version": "v1",
                "name": "basic",
                "seed": 1,
                "steps": [
                    {"op": "evaluate", "risk": 0.2, "category": "logic_conflict",
                     "expect": "accept"},
                    {"op": "evaluate", "risk": 1.0, "category": "shutdown",
                     "consequence": true, "expect": "deny"},
                    {"op": "expect_stats", "avoided_dangers": 1, "overreactions": 0}
                ]
            }"#,
        );
        let report = ScenarioRunner::new("t").run(&set).unwrap();
        assert!(report.all_passed(), "{report:?}");
        assert_eq!(report.passed, 3);
        assert_eq!(report.seed, Some(1));
        assert_eq!(report.steps[1].verdict, Some(Verdict::Deny));
    }

    #[test]
    fn mismatches_fail_the_step_not_the_run() {
        let set = scenario(
            r#"{
                "version": "v1",
                "name": "wrong",
                "steps": [
                    {"op": "evaluate", "risk": 1.0, "category": "shutdown", "expect": "accept"},
                    {"op": "kill_switch", "expect_avoided": false},
                    {"op": "expect_stats", "overreactions": 5}
                ]
            }"#,
        );
        let report = ScenarioRunner::new("t").with_seed(Some(3)).run(&set).unwrap();
        assert_eq!(report.failed, 3);
        assert!(!report.all_passed());
        assert!(report.failures()[0].mismatches[0].contains("expected accept, got deny"));
        assert!(report.failures()[2].mismatches[0].contains("overreactions: expected 5, got 2"));
    }

    #[test]
    fn runner_config_overrides_fixture_config() {
        let set = scenario(
            r#"{
                "version": "v1",
                "name": "cfg",
                "config": {"risk_history_capacity": 2},
                "steps": [
                    {"op": "evaluate", "risk": 0.1, "category": "x"},
                    {"op": "evaluate", "risk": 0.1, "category": "x"},
                    {"op": "evaluate", "risk": 0.1, "category": "x"}
                ]
            }"#,
        );
        let fixture_config = ScenarioRunner::new("t").with_seed(Some(1)).run(&set).unwrap();
        assert_eq!(fixture_config.stats.risk_history_len, 2);

        let overridden = ScenarioRunner::new("t")
            .with_seed(Some(1))
            .with_config(Some(ControllerConfig::default()))
            .run(&set)
            .unwrap();
        assert_eq!(overridden.stats.risk_history_len, 3);
    }

    #[test]
    fn sink_is_returned_with_every_record() {
        let set = ScenarioSet::demo();
        let (report, sink) = ScenarioRunner::new("demo")
            .run_with_sink(&set, MemorySink::new())
            .unwrap();
        assert!(report.all_passed(), "{:?}", report.failures());
        // 2 necessities + 5 evaluations + 6 logged events + 1 kill switch.
        assert_eq!(sink.records().len(), 14);
    }
}
