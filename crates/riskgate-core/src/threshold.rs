//! Adaptive denial threshold.
//!
//! `threshold = clamp(base - memory_bias * decrease + overreactions * increase, min, max)`
//!
//! Weighted event memory lowers the bar (more cautious); past overreactions
//! raise it (less trigger-happy). The result always lies in `[min, max]`.

use crate::config::ControllerConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdCalculator {
    base: f64,
    min: f64,
    max: f64,
    memory_bias_factor: f64,
    overreaction_factor: f64,
}

impl ThresholdCalculator {
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            base: config.base_threshold,
            min: config.min_threshold,
            max: config.max_threshold,
            memory_bias_factor: config.memory_bias_factor,
            overreaction_factor: config.overreaction_factor,
        }
    }

    /// Current threshold for the given memory bias and overreaction count.
    #[must_use]
    pub fn threshold(&self, memory_bias: f64, overreactions: u64) -> f64 {
        let decrease = memory_bias * self.memory_bias_factor;
        let increase = overreactions as f64 * self.overreaction_factor;
        let raw = self.base - decrease + increase;
        if raw.is_nan() {
            // Only reachable with a non-finite bias; stay at the cautious end.
            return self.min;
        }
        raw.clamp(self.min, self.max)
    }

    /// Threshold with empty memory and no overreactions, clamped to the band.
    #[must_use]
    pub fn base(&self) -> f64 {
        self.base.clamp(self.min, self.max)
    }

    #[must_use]
    pub fn band(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl Default for ThresholdCalculator {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}
