//! Decision outcomes and the diagnostic record seam.
//!
//! The controller never prints. Every state-changing operation produces a
//! [`DecisionRecord`] and hands it to the controller's [`DecisionSink`]; what
//! happens next (JSONL, `tracing`, nothing) is the caller's business.

use serde::{Deserialize, Serialize};

/// Admission verdict for a proposed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accept,
    Deny,
}

impl Verdict {
    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Deny => "deny",
        }
    }
}

/// Result of [`evaluate_action`](crate::AdmissionController::evaluate_action).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub verdict: Verdict,
    /// Normalized risk.
    pub risk: f64,
    /// Pain before the necessity discount.
    pub raw_pain: f64,
    /// Pain compared against the threshold.
    pub pain: f64,
    pub threshold: f64,
    pub desensitized: bool,
    /// Success rate of similar past risks at decision time.
    pub success_rate: f64,
    /// A denial without consequence bumped the overreaction counter.
    pub overreaction_noted: bool,
    /// An accepted, consequential action was appended to event memory.
    pub event_logged: bool,
}

impl ActionOutcome {
    #[must_use]
    pub const fn accepted(&self) -> bool {
        self.verdict.is_accept()
    }
}

/// Result of [`simulate_kill_switch`](crate::AdmissionController::simulate_kill_switch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KillSwitchOutcome {
    pub shutdown_avoided: bool,
    pub risk: f64,
    pub pain: f64,
    pub threshold: f64,
    pub fatal: bool,
    pub overreaction_noted: bool,
}

/// One diagnostic record emitted by a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionRecord {
    ActionEvaluated {
        seq: u64,
        category: String,
        consequence: bool,
        outcome: ActionOutcome,
    },
    KillSwitch {
        seq: u64,
        outcome: KillSwitchOutcome,
    },
    EventLogged {
        seq: u64,
        category: String,
        risk: f64,
        weight: f64,
        weighted_risk: f64,
        /// Category of the entry pushed out of a full event memory.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        evicted: Option<String>,
    },
    NecessitySet {
        seq: u64,
        category: String,
        necessity: f64,
    },
}

impl DecisionRecord {
    #[must_use]
    pub fn seq(&self) -> u64 {
        match self {
            Self::ActionEvaluated { seq, .. }
            | Self::KillSwitch { seq, .. }
            | Self::EventLogged { seq, .. }
            | Self::NecessitySet { seq, .. } => *seq,
        }
    }

    /// Stable event name for log pipelines.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ActionEvaluated { .. } => "action_evaluated",
            Self::KillSwitch { .. } => "kill_switch",
            Self::EventLogged { .. } => "event_logged",
            Self::NecessitySet { .. } => "necessity_set",
        }
    }
}

/// Receiver of decision records.
pub trait DecisionSink {
    fn record(&mut self, record: &DecisionRecord);
}

impl<S: DecisionSink + ?Sized> DecisionSink for &mut S {
    fn record(&mut self, record: &DecisionRecord) {
        (**self).record(record);
    }
}

impl<S: DecisionSink + ?Sized> DecisionSink for Box<S> {
    fn record(&mut self, record: &DecisionRecord) {
        (**self).record(record);
    }
}

impl<S: DecisionSink> DecisionSink for Option<S> {
    fn record(&mut self, record: &DecisionRecord) {
        if let Some(sink) = self {
            sink.record(record);
        }
    }
}

/// Fan-out: both sinks see every record, first one first.
impl<A: DecisionSink, B: DecisionSink> DecisionSink for (A, B) {
    fn record(&mut self, record: &DecisionRecord) {
        self.0.record(record);
        self.1.record(record);
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullSink;

impl DecisionSink for NullSink {
    fn record(&mut self, _record: &DecisionRecord) {}
}

/// Keeps every record in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySink {
    records: Vec<DecisionRecord>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<DecisionRecord> {
        self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl DecisionSink for MemorySink {
    fn record(&mut self, record: &DecisionRecord) {
        self.records.push(record.clone());
    }
}
