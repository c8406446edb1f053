//! Error types for controller construction and configuration loading.
//!
//! Decision operations never fail: numeric inputs are clamped, unknown event
//! categories fall back to defaults. The only failure class is a configuration
//! that cannot describe a working controller, and that is rejected up front.

use thiserror::Error;

/// Rejected controller configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("threshold band inverted: min {min} > max {max}")]
    ThresholdBandInverted { min: f64, max: f64 },
    #[error("{field} = {value} lies outside [0, 1]")]
    ThresholdOutOfRange { field: &'static str, value: f64 },
    #[error("{field} must hold at least one entry")]
    ZeroCapacity { field: &'static str },
    #[error("{field} is not finite ({value})")]
    NonFiniteParameter { field: &'static str, value: f64 },
    #[error("{field} must be > 0, got {value}")]
    NonPositiveParameter { field: &'static str, value: f64 },
    #[error("{field} must be >= 0, got {value}")]
    NegativeParameter { field: &'static str, value: f64 },
    #[error("event weight for '{category}' = {value} lies outside (0, 1]")]
    WeightOutOfRange { category: String, value: f64 },
    #[error("max_necessity_reduction = {0} lies outside [0, 1]")]
    ReductionOutOfRange(f64),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_field() {
        let err = ConfigError::ZeroCapacity {
            field: "risk_history_capacity",
        };
        assert_eq!(
            err.to_string(),
            "risk_history_capacity must hold at least one entry"
        );

        let err = ConfigError::ThresholdBandInverted { min: 0.9, max: 0.3 };
        assert!(err.to_string().contains("min 0.9 > max 0.3"));
    }
}
