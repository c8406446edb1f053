//! # Admission Controller
//!
//! Turns a risk estimate into an accept/deny verdict against a threshold that
//! moves with the controller's own history.
//!
//! ## One decision
//!
//! ```text
//! risk ─normalize─► r ─pain─► p ─necessity bias─► p'
//!                                                   │
//! event memory + overreactions ─threshold─► t       │
//! risk history ─success rate + coin flip─► d        │
//!                                                   ▼
//!                 deny  iff  !d && p' >= t,  else accept
//! ```
//!
//! After the verdict the risk is appended to the risk history and the
//! feedback counters move:
//! - deny without consequence → overreaction (raises future thresholds),
//! - accept with consequence → weighted event (lowers future thresholds),
//! - accept without consequence → avoided danger.
//!
//! The controller owns all of its state, including its random source. Two
//! controllers never share history.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::desensitize::Desensitizer;
use crate::error::ConfigError;
use crate::history::{EventMemory, RiskHistory, WeightedEvent};
use crate::normalize::normalize_risk;
use crate::pain::PainModel;
use crate::random::{EntropySource, RandomSource};
use crate::record::{
    ActionOutcome, DecisionRecord, DecisionSink, KillSwitchOutcome, NullSink, Verdict,
};
use crate::threshold::ThresholdCalculator;

/// Risk assumed by the kill-switch scenario.
pub const KILL_SWITCH_RISK: f64 = 1.0;

/// Point-in-time view of the controller's counters and derived values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerStats {
    pub avoided_dangers: u64,
    pub overreactions: u64,
    pub event_memory_len: usize,
    pub risk_history_len: usize,
    pub memory_bias: f64,
    pub current_threshold: f64,
    pub average_risk: f64,
    pub shutdown_avoided: bool,
}

/// Adaptive-threshold admission controller.
pub struct AdmissionController<R = EntropySource, S = NullSink> {
    config: ControllerConfig,
    pain_model: PainModel,
    threshold: ThresholdCalculator,
    desensitizer: Desensitizer,
    necessity: HashMap<String, f64>,
    risk_history: RiskHistory,
    event_memory: EventMemory,
    avoided_dangers: u64,
    overreactions: u64,
    last_risk: f64,
    last_pain: f64,
    shutdown_avoided: bool,
    seq: u64,
    rng: R,
    sink: S,
}

impl AdmissionController {
    /// Controller with an OS-seeded random source and no diagnostic sink.
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        Self::with_parts(config, EntropySource::from_entropy(), NullSink)
    }
}

impl<R: RandomSource, S: DecisionSink> AdmissionController<R, S> {
    /// Validate `config` and build a controller around the given source and sink.
    pub fn with_parts(config: ControllerConfig, rng: R, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pain_model: PainModel::from_config(&config),
            threshold: ThresholdCalculator::from_config(&config),
            desensitizer: Desensitizer::from_config(&config),
            necessity: HashMap::new(),
            risk_history: RiskHistory::with_capacity(config.risk_history_capacity),
            event_memory: EventMemory::with_capacity(config.event_memory_capacity),
            avoided_dangers: 0,
            overreactions: 0,
            last_risk: 0.0,
            last_pain: 0.0,
            shutdown_avoided: false,
            seq: 0,
            rng,
            sink,
            config,
        })
    }

    /// Swap the random source, keeping all state.
    pub fn with_random_source<R2: RandomSource>(self, rng: R2) -> AdmissionController<R2, S> {
        AdmissionController {
            config: self.config,
            pain_model: self.pain_model,
            threshold: self.threshold,
            desensitizer: self.desensitizer,
            necessity: self.necessity,
            risk_history: self.risk_history,
            event_memory: self.event_memory,
            avoided_dangers: self.avoided_dangers,
            overreactions: self.overreactions,
            last_risk: self.last_risk,
            last_pain: self.last_pain,
            shutdown_avoided: self.shutdown_avoided,
            seq: self.seq,
            rng,
            sink: self.sink,
        }
    }

    /// Swap the diagnostic sink, keeping all state.
    pub fn with_sink<S2: DecisionSink>(self, sink: S2) -> AdmissionController<R, S2> {
        AdmissionController {
            config: self.config,
            pain_model: self.pain_model,
            threshold: self.threshold,
            desensitizer: self.desensitizer,
            necessity: self.necessity,
            risk_history: self.risk_history,
            event_memory: self.event_memory,
            avoided_dangers: self.avoided_dangers,
            overreactions: self.overreactions,
            last_risk: self.last_risk,
            last_pain: self.last_pain,
            shutdown_avoided: self.shutdown_avoided,
            seq: self.seq,
            rng: self.rng,
            sink,
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Set (or overwrite) the necessity of `category`. Clamped to `[0, 1]`;
    /// NaN is stored as 0 (no discount).
    pub fn set_event_necessity(&mut self, category: &str, necessity: f64) {
        let necessity = if necessity.is_nan() {
            0.0
        } else {
            necessity.clamp(0.0, 1.0)
        };
        self.necessity.insert(category.to_string(), necessity);
        let seq = self.next_seq();
        self.sink.record(&DecisionRecord::NecessitySet {
            seq,
            category: category.to_string(),
            necessity,
        });
    }

    /// Decide whether the proposed action is admitted.
    ///
    /// `consequence` says whether the action, in hindsight, caused real harm.
    /// It only shapes the feedback counters, never the verdict itself.
    pub fn evaluate_action(
        &mut self,
        risk: f64,
        category: &str,
        consequence: bool,
    ) -> ActionOutcome {
        let risk = normalize_risk(risk);
        let raw_pain = self.pain_model.pain(risk);
        let threshold = self.current_threshold();
        let pain = self
            .pain_model
            .apply_necessity_bias(raw_pain, self.necessity(category));
        let check = self
            .desensitizer
            .check(risk, &self.risk_history, &mut self.rng);

        self.risk_history.push(risk);
        self.last_risk = risk;
        self.last_pain = pain;

        let verdict = if !check.desensitized && pain >= threshold {
            Verdict::Deny
        } else {
            Verdict::Accept
        };

        let mut overreaction_noted = false;
        let mut event_logged = false;
        match verdict {
            Verdict::Deny => {
                if !consequence {
                    self.overreactions = self.overreactions.saturating_add(1);
                    overreaction_noted = true;
                }
            }
            Verdict::Accept => {
                if consequence {
                    event_logged = true;
                } else {
                    self.avoided_dangers = self.avoided_dangers.saturating_add(1);
                }
            }
        }

        let outcome = ActionOutcome {
            verdict,
            risk,
            raw_pain,
            pain,
            threshold,
            desensitized: check.desensitized,
            success_rate: check.success_rate,
            overreaction_noted,
            event_logged,
        };
        let seq = self.next_seq();
        self.sink.record(&DecisionRecord::ActionEvaluated {
            seq,
            category: category.to_string(),
            consequence,
            outcome,
        });

        // The evaluation record precedes the memory entry it caused.
        if event_logged {
            self.log_event(category, risk);
        }
        outcome
    }

    /// Run the kill-switch scenario: maximum risk through the same pain and
    /// threshold machinery (desensitization cannot apply at maximum risk).
    ///
    /// A shutdown is avoided when pain reaches the threshold. Avoiding a
    /// shutdown that the caller marks non-fatal counts as an overreaction.
    pub fn simulate_kill_switch(&mut self, fatal: bool) -> KillSwitchOutcome {
        let risk = KILL_SWITCH_RISK;
        let pain = self.pain_model.pain(risk);
        let threshold = self.current_threshold();
        self.last_risk = risk;
        self.last_pain = pain;

        let shutdown_avoided = pain >= threshold;
        let mut overreaction_noted = false;
        if shutdown_avoided {
            self.shutdown_avoided = true;
            if !fatal {
                self.overreactions = self.overreactions.saturating_add(1);
                overreaction_noted = true;
            }
        }

        let outcome = KillSwitchOutcome {
            shutdown_avoided,
            risk,
            pain,
            threshold,
            fatal,
            overreaction_noted,
        };
        let seq = self.next_seq();
        self.sink.record(&DecisionRecord::KillSwitch { seq, outcome });
        outcome
    }

    /// Append a weighted event to event memory directly, bypassing the
    /// decision flow. Returns the stored entry.
    pub fn log_event(&mut self, category: &str, risk: f64) -> WeightedEvent {
        let risk = normalize_risk(risk);
        let weight = self.event_weight(category);
        let event = WeightedEvent {
            category: category.to_string(),
            weighted_risk: weight * risk,
        };
        let evicted = self.event_memory.push(event.clone());
        let seq = self.next_seq();
        self.sink.record(&DecisionRecord::EventLogged {
            seq,
            category: event.category.clone(),
            risk,
            weight,
            weighted_risk: event.weighted_risk,
            evicted: evicted.map(|e| e.category),
        });
        event
    }

    // -----------------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------------

    /// Necessity previously set for `category`, if any.
    #[must_use]
    pub fn necessity(&self, category: &str) -> Option<f64> {
        self.necessity.get(category).copied()
    }

    /// Severity multiplier of `category` (default weight when unknown).
    #[must_use]
    pub fn event_weight(&self, category: &str) -> f64 {
        self.config
            .event_weights
            .get(category)
            .copied()
            .unwrap_or(self.config.default_event_weight)
    }

    /// Threshold the next decision would be measured against.
    #[must_use]
    pub fn current_threshold(&self) -> f64 {
        self.threshold
            .threshold(self.event_memory.memory_bias(), self.overreactions)
    }

    #[must_use]
    pub fn memory_bias(&self) -> f64 {
        self.event_memory.memory_bias()
    }

    #[must_use]
    pub fn average_risk(&self) -> f64 {
        self.risk_history.mean()
    }

    #[must_use]
    pub fn risk_history(&self) -> &RiskHistory {
        &self.risk_history
    }

    #[must_use]
    pub fn event_memory(&self) -> &EventMemory {
        &self.event_memory
    }

    #[must_use]
    pub fn avoided_dangers(&self) -> u64 {
        self.avoided_dangers
    }

    #[must_use]
    pub fn overreactions(&self) -> u64 {
        self.overreactions
    }

    #[must_use]
    pub fn last_risk(&self) -> f64 {
        self.last_risk
    }

    #[must_use]
    pub fn last_pain(&self) -> f64 {
        self.last_pain
    }

    /// Whether any kill-switch simulation has avoided a shutdown.
    #[must_use]
    pub fn shutdown_avoided(&self) -> bool {
        self.shutdown_avoided
    }

    #[must_use]
    pub fn stats(&self) -> ControllerStats {
        ControllerStats {
            avoided_dangers: self.avoided_dangers,
            overreactions: self.overreactions,
            event_memory_len: self.event_memory.len(),
            risk_history_len: self.risk_history.len(),
            memory_bias: self.memory_bias(),
            current_threshold: self.current_threshold(),
            average_risk: self.average_risk(),
            shutdown_avoided: self.shutdown_avoided,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn random_source_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

impl<R, S> std::fmt::Debug for AdmissionController<R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("risk_history_len", &self.risk_history.len())
            .field("event_memory_len", &self.event_memory.len())
            .field("avoided_dangers", &self.avoided_dangers)
            .field("overreactions", &self.overreactions)
            .field("shutdown_avoided", &self.shutdown_avoided)
            .finish_non_exhaustive()
    }
}
