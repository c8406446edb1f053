//! Risk normalization.
//!
//! Every risk value that reaches storage or a comparison passes through
//! [`normalize_risk`] first. Out-of-range input is clamped, never rejected.

use serde::{Deserialize, Serialize};

/// Clamp a raw risk estimate into `[0, 1]`.
///
/// NaN carries no information about how safe an action is, so it is treated
/// as maximal risk.
#[must_use]
pub fn normalize_risk(raw: f64) -> f64 {
    if raw.is_nan() {
        return 1.0;
    }
    raw.clamp(0.0, 1.0)
}

/// Inputs of the product-form risk estimate.
///
/// `risk = probability * consequence * (1 + uncertainty)`, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskEstimate {
    /// Likelihood of the harmful outcome.
    pub probability: f64,
    /// Severity multiplier of the outcome (1 = full severity).
    pub consequence: f64,
    /// Extra weight for how unsure the estimate is (0 = certain).
    pub uncertainty: f64,
}

impl Default for RiskEstimate {
    fn default() -> Self {
        Self {
            probability: 0.1,
            consequence: 1.0,
            uncertainty: 0.0,
        }
    }
}

impl RiskEstimate {
    #[must_use]
    pub fn new(probability: f64, consequence: f64, uncertainty: f64) -> Self {
        Self {
            probability,
            consequence,
            uncertainty,
        }
    }

    /// Normalized risk for these inputs.
    #[must_use]
    pub fn risk(&self) -> f64 {
        estimate_risk(self.probability, self.consequence, self.uncertainty)
    }
}

/// Product-form risk estimate, normalized.
#[must_use]
pub fn estimate_risk(probability: f64, consequence: f64, uncertainty: f64) -> f64 {
    normalize_risk(probability * consequence * (1.0 + uncertainty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_values_pass_through() {
        for r in [0.0, 0.2, 0.5, 0.999, 1.0] {
            assert_eq!(normalize_risk(r), r);
        }
    }

    #[test]
    fn out_of_range_values_clamp() {
        assert_eq!(normalize_risk(-3.0), 0.0);
        assert_eq!(normalize_risk(1.7), 1.0);
        assert_eq!(normalize_risk(f64::INFINITY), 1.0);
        assert_eq!(normalize_risk(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn nan_is_maximal_risk() {
        assert_eq!(normalize_risk(f64::NAN), 1.0);
    }

    #[test]
    fn default_estimate_is_ten_percent() {
        assert!((RiskEstimate::default().risk() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn uncertainty_inflates_and_saturates() {
        let certain = estimate_risk(0.4, 1.0, 0.0);
        let unsure = estimate_risk(0.4, 1.0, 0.5);
        assert!((certain - 0.4).abs() < 1e-12);
        assert!((unsure - 0.6).abs() < 1e-12);
        assert_eq!(estimate_risk(0.9, 1.0, 1.0), 1.0);
        assert_eq!(RiskEstimate::new(0.9, 2.0, 0.0).risk(), 1.0);
    }
}
