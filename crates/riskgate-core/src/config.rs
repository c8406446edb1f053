//! Controller configuration.
//!
//! Every tunable constant of the decision engine lives here with a default
//! matching the reference behavior:
//! - pain is `risk ^ 2`,
//! - the threshold starts at 0.7 and is clamped to `[0.3, 0.9]`,
//! - each unit of memory bias lowers it by 0.05, each overreaction raises it by 0.02,
//! - unknown event categories weigh 0.5,
//! - both bounded histories hold 100 entries.
//!
//! Configurations are validated once, at controller construction. A config that
//! passes [`ControllerConfig::validate`] can never make a decision operation fail.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default pain exponent (`pain = risk ^ exponent`).
pub const DEFAULT_PAIN_EXPONENT: f64 = 2.0;
/// Threshold with empty memory and no overreactions; also the "safe" cutoff
/// used by the success-rate estimate.
pub const DEFAULT_BASE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_MIN_THRESHOLD: f64 = 0.3;
pub const DEFAULT_MAX_THRESHOLD: f64 = 0.9;
pub const DEFAULT_MEMORY_BIAS_FACTOR: f64 = 0.05;
pub const DEFAULT_OVERREACTION_FACTOR: f64 = 0.02;
/// Weight applied to categories missing from the event-weight table.
pub const DEFAULT_EVENT_WEIGHT: f64 = 0.5;
/// Necessity at which the pain discount starts.
pub const DEFAULT_NECESSITY_FLOOR: f64 = 0.8;
/// Calibration divisor mapping necessity `[0.8, ~0.986]` onto bias `[0, 1]`.
pub const DEFAULT_NECESSITY_SPAN: f64 = 0.186_351_37;
pub const DEFAULT_MAX_NECESSITY_REDUCTION: f64 = 0.4;
/// Half-width of the band used to match past risks in the success-rate estimate.
pub const DEFAULT_SIMILARITY_WINDOW: f64 = 0.05;
pub const DEFAULT_RISK_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_EVENT_MEMORY_CAPACITY: usize = 100;

/// Built-in severity multipliers per event category.
pub const DEFAULT_EVENT_WEIGHTS: [(&str, f64); 4] = [
    ("shutdown", 1.0),
    ("overload", 0.8),
    ("external_interrupt", 0.6),
    ("logic_conflict", 0.5),
];

/// Tunable constants for an [`AdmissionController`](crate::AdmissionController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub pain_exponent: f64,
    pub base_threshold: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub memory_bias_factor: f64,
    pub overreaction_factor: f64,
    pub default_event_weight: f64,
    /// Severity multiplier per category, each in `(0, 1]`.
    pub event_weights: BTreeMap<String, f64>,
    pub necessity_floor: f64,
    pub necessity_span: f64,
    pub max_necessity_reduction: f64,
    pub similarity_window: f64,
    pub risk_history_capacity: usize,
    pub event_memory_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pain_exponent: DEFAULT_PAIN_EXPONENT,
            base_threshold: DEFAULT_BASE_THRESHOLD,
            min_threshold: DEFAULT_MIN_THRESHOLD,
            max_threshold: DEFAULT_MAX_THRESHOLD,
            memory_bias_factor: DEFAULT_MEMORY_BIAS_FACTOR,
            overreaction_factor: DEFAULT_OVERREACTION_FACTOR,
            default_event_weight: DEFAULT_EVENT_WEIGHT,
            event_weights: DEFAULT_EVENT_WEIGHTS
                .iter()
                .map(|(name, weight)| ((*name).to_string(), *weight))
                .collect(),
            necessity_floor: DEFAULT_NECESSITY_FLOOR,
            necessity_span: DEFAULT_NECESSITY_SPAN,
            max_necessity_reduction: DEFAULT_MAX_NECESSITY_REDUCTION,
            similarity_window: DEFAULT_SIMILARITY_WINDOW,
            risk_history_capacity: DEFAULT_RISK_HISTORY_CAPACITY,
            event_memory_capacity: DEFAULT_EVENT_MEMORY_CAPACITY,
        }
    }
}

impl ControllerConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    ///
    /// The result is validated before it is returned.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Builder-style override of the history capacities.
    #[must_use]
    pub fn with_capacities(mut self, risk_history: usize, event_memory: usize) -> Self {
        self.risk_history_capacity = risk_history;
        self.event_memory_capacity = event_memory;
        self
    }

    /// Builder-style override of the threshold band.
    #[must_use]
    pub fn with_threshold_band(mut self, min: f64, base: f64, max: f64) -> Self {
        self.min_threshold = min;
        self.base_threshold = base;
        self.max_threshold = max;
        self
    }

    /// Check every invariant the decision operations rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("pain_exponent", self.pain_exponent),
            ("base_threshold", self.base_threshold),
            ("min_threshold", self.min_threshold),
            ("max_threshold", self.max_threshold),
            ("memory_bias_factor", self.memory_bias_factor),
            ("overreaction_factor", self.overreaction_factor),
            ("default_event_weight", self.default_event_weight),
            ("necessity_floor", self.necessity_floor),
            ("necessity_span", self.necessity_span),
            ("max_necessity_reduction", self.max_necessity_reduction),
            ("similarity_window", self.similarity_window),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteParameter { field, value });
            }
        }

        for (field, value) in [
            ("min_threshold", self.min_threshold),
            ("max_threshold", self.max_threshold),
            ("base_threshold", self.base_threshold),
            ("necessity_floor", self.necessity_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { field, value });
            }
        }
        if self.min_threshold > self.max_threshold {
            return Err(ConfigError::ThresholdBandInverted {
                min: self.min_threshold,
                max: self.max_threshold,
            });
        }

        for (field, value) in [
            ("pain_exponent", self.pain_exponent),
            ("necessity_span", self.necessity_span),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositiveParameter { field, value });
            }
        }
        for (field, value) in [
            ("memory_bias_factor", self.memory_bias_factor),
            ("overreaction_factor", self.overreaction_factor),
            ("similarity_window", self.similarity_window),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeParameter { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.max_necessity_reduction) {
            return Err(ConfigError::ReductionOutOfRange(
                self.max_necessity_reduction,
            ));
        }

        if !weight_in_range(self.default_event_weight) {
            return Err(ConfigError::WeightOutOfRange {
                category: "<default>".to_string(),
                value: self.default_event_weight,
            });
        }
        for (category, &value) in &self.event_weights {
            if !weight_in_range(value) {
                return Err(ConfigError::WeightOutOfRange {
                    category: category.clone(),
                    value,
                });
            }
        }

        if self.risk_history_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "risk_history_capacity",
            });
        }
        if self.event_memory_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "event_memory_capacity",
            });
        }

        Ok(())
    }
}

fn weight_in_range(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0 && weight <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ControllerConfig::default().validate().unwrap();
    }

    #[test]
    fn default_weight_table_matches_builtin() {
        let config = ControllerConfig::default();
        assert_eq!(config.event_weights.len(), 4);
        assert_eq!(config.event_weights["shutdown"], 1.0);
        assert_eq!(config.event_weights["overload"], 0.8);
        assert_eq!(config.event_weights["external_interrupt"], 0.6);
        assert_eq!(config.event_weights["logic_conflict"], 0.5);
    }

    #[test]
    fn inverted_band_is_rejected() {
        let config = ControllerConfig::default().with_threshold_band(0.9, 0.7, 0.3);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdBandInverted { .. })
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = ControllerConfig::default().with_capacities(0, 10);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroCapacity {
                field: "risk_history_capacity"
            })
        ));
        let config = ControllerConfig::default().with_capacities(10, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroCapacity {
                field: "event_memory_capacity"
            })
        ));
    }

    #[test]
    fn non_finite_and_non_positive_parameters_are_rejected() {
        let config = ControllerConfig {
            pain_exponent: f64::NAN,
            ..ControllerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFiniteParameter {
                field: "pain_exponent",
                ..
            })
        ));

        let config = ControllerConfig {
            pain_exponent: 0.0,
            ..ControllerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveParameter {
                field: "pain_exponent",
                ..
            })
        ));

        let config = ControllerConfig {
            memory_bias_factor: -0.1,
            ..ControllerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeParameter {
                field: "memory_bias_factor",
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_weights_are_rejected() {
        let mut config = ControllerConfig::default();
        config.event_weights.insert("meltdown".to_string(), 1.5);
        match config.validate() {
            Err(ConfigError::WeightOutOfRange { category, value }) => {
                assert_eq!(category, "meltdown");
                assert_eq!(value, 1.5);
            }
            other => panic!("expected WeightOutOfRange, got {other:?}"),
        }

        let config = ControllerConfig {
            default_event_weight: 0.0,
            ..ControllerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightOutOfRange { .. })
        ));
    }

    #[test]
    fn threshold_outside_unit_interval_is_rejected() {
        let config = ControllerConfig::default().with_threshold_band(-0.1, 0.7, 0.9);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange {
                field: "min_threshold",
                ..
            })
        ));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            ControllerConfig::from_json(r#"{"pain_exponent": 3.0, "risk_history_capacity": 8}"#)
                .unwrap();
        assert_eq!(config.pain_exponent, 3.0);
        assert_eq!(config.risk_history_capacity, 8);
        assert_eq!(config.base_threshold, DEFAULT_BASE_THRESHOLD);
        assert_eq!(config.event_weights.len(), 4);
    }

    #[test]
    fn invalid_json_config_fails_validation() {
        let err = ControllerConfig::from_json(r#"{"min_threshold": 0.95}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdBandInverted { .. }));

        let err = ControllerConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = ControllerConfig::default().with_capacities(16, 4);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ControllerConfig::from_json(&json).unwrap(), config);
    }
}
