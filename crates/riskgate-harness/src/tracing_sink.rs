//! Forwards controller records to `tracing`.

use riskgate_core::{DecisionRecord, DecisionSink};

/// Emits one `tracing` event per record under the `riskgate` target.
///
/// Accepts and memory updates log at `info`, denials and avoided shutdowns at
/// `warn`, necessity changes at `debug`.
#[derive(Debug, Clone)]
pub struct TracingSink {
    controller_id: String,
}

impl TracingSink {
    #[must_use]
    pub fn new(controller_id: impl Into<String>) -> Self {
        Self {
            controller_id: controller_id.into(),
        }
    }
}

impl DecisionSink for TracingSink {
    fn record(&mut self, record: &DecisionRecord) {
        let controller = self.controller_id.as_str();
        match record {
            DecisionRecord::ActionEvaluated {
                seq,
                category,
                consequence,
                outcome,
            } => {
                if outcome.accepted() {
                    tracing::info!(
                        target: "riskgate",
                        controller, seq, category = category.as_str(), consequence,
                        risk = outcome.risk, pain = outcome.pain, threshold = outcome.threshold,
                        desensitized = outcome.desensitized,
                        "action accepted"
                    );
                } else {
                    tracing::warn!(
                        target: "riskgate",
                        controller, seq, category = category.as_str(), consequence,
                        risk = outcome.risk, pain = outcome.pain, threshold = outcome.threshold,
                        overreaction = outcome.overreaction_noted,
                        "action denied"
                    );
                }
            }
            DecisionRecord::KillSwitch { seq, outcome } => {
                if outcome.shutdown_avoided {
                    tracing::warn!(
                        target: "riskgate",
                        controller, seq, fatal = outcome.fatal,
                        pain = outcome.pain, threshold = outcome.threshold,
                        overreaction = outcome.overreaction_noted,
                        "shutdown avoided"
                    );
                } else {
                    tracing::info!(
                        target: "riskgate",
                        controller, seq, fatal = outcome.fatal,
                        pain = outcome.pain, threshold = outcome.threshold,
                        "shutdown accepted"
                    );
                }
            }
            DecisionRecord::EventLogged {
                seq,
                category,
                weighted_risk,
                evicted,
                ..
            } => {
                tracing::info!(
                    target: "riskgate",
                    controller, seq, category = category.as_str(), weighted_risk,
                    evicted = evicted.as_deref(),
                    "event remembered"
                );
            }
            DecisionRecord::NecessitySet {
                seq,
                category,
                necessity,
            } => {
                tracing::debug!(
                    target: "riskgate",
                    controller, seq, category = category.as_str(), necessity,
                    "necessity set"
                );
            }
        }
    }
}
