//! Pain model: risk → pain, and the necessity discount.
//!
//! Both transforms are pure. Pain is a monotone power of risk; the necessity
//! discount only ever lowers pain, and only for categories the caller has
//! explicitly marked as highly necessary.

use crate::config::ControllerConfig;

/// Stateless pain transform built from a validated config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PainModel {
    exponent: f64,
    necessity_floor: f64,
    necessity_span: f64,
    max_reduction: f64,
}

impl PainModel {
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            exponent: config.pain_exponent,
            necessity_floor: config.necessity_floor,
            necessity_span: config.necessity_span,
            max_reduction: config.max_necessity_reduction,
        }
    }

    /// `pain = risk ^ exponent`. Expects a normalized risk.
    #[must_use]
    pub fn pain(&self, risk: f64) -> f64 {
        risk.powf(self.exponent)
    }

    /// Necessity bias in `[0, 1]`, or `None` when no discount applies.
    ///
    /// Necessity at or above the floor maps linearly onto `[0, 1]` over the
    /// calibration span and saturates beyond it.
    #[must_use]
    pub fn necessity_bias(&self, necessity: Option<f64>) -> Option<f64> {
        let necessity = necessity?;
        if necessity < self.necessity_floor {
            return None;
        }
        Some(((necessity - self.necessity_floor) / self.necessity_span).clamp(0.0, 1.0))
    }

    /// Discount `pain` by the category's necessity.
    ///
    /// Absent necessity, or necessity below the floor, returns `pain` unchanged.
    #[must_use]
    pub fn apply_necessity_bias(&self, pain: f64, necessity: Option<f64>) -> f64 {
        match self.necessity_bias(necessity) {
            Some(bias) => pain - pain * bias * self.max_reduction,
            None => pain,
        }
    }
}

impl Default for PainModel {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}
