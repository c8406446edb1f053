//! Historical desensitization.
//!
//! A risk level that has "usually been safe" may be let through despite pain
//! exceeding the threshold. Two conditions must both hold:
//! 1. the empirical success rate of similar past risks clears the band's bar, and
//! 2. a weighted coin flip succeeds.
//!
//! Both become more permissive as risk decreases. Maximum risk never desensitizes.

use crate::config::ControllerConfig;
use crate::history::RiskHistory;
use crate::random::RandomSource;

/// One row of the desensitization table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesensitizeBand {
    /// Lowest risk (inclusive) covered by this row.
    pub floor: f64,
    /// Success rate must be strictly greater than this.
    pub success_bar: f64,
    /// Probability the coin flip succeeds.
    pub flip_probability: f64,
}

/// Rows ordered from highest floor to lowest; the first row whose floor is
/// `<= risk` applies.
pub const DESENSITIZE_BANDS: [DesensitizeBand; 5] = [
    DesensitizeBand {
        floor: 0.9,
        success_bar: 0.95,
        flip_probability: 0.05,
    },
    DesensitizeBand {
        floor: 0.7,
        success_bar: 0.90,
        flip_probability: 0.10,
    },
    DesensitizeBand {
        floor: 0.5,
        success_bar: 0.80,
        flip_probability: 0.30,
    },
    DesensitizeBand {
        floor: 0.3,
        success_bar: 0.70,
        flip_probability: 0.50,
    },
    DesensitizeBand {
        floor: 0.0,
        success_bar: 0.65,
        flip_probability: 0.80,
    },
];

/// Band for a normalized risk below 1.0.
#[must_use]
pub fn band_for(risk: f64) -> Option<&'static DesensitizeBand> {
    if risk >= 1.0 {
        return None;
    }
    DESENSITIZE_BANDS
        .iter()
        .find(|band| risk >= band.floor)
        .or(DESENSITIZE_BANDS.last())
}

/// Outcome of one desensitization check, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesensitizeCheck {
    pub success_rate: f64,
    /// Whether the success-rate bar was cleared (and so a draw was taken).
    pub bar_cleared: bool,
    pub desensitized: bool,
}

/// Success-rate estimator and probabilistic gate over the risk history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Desensitizer {
    safe_cutoff: f64,
    window: f64,
}

impl Desensitizer {
    /// The "safe" cutoff is the configured base threshold, not the live one.
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            safe_cutoff: config.base_threshold,
            window: config.similarity_window,
        }
    }

    /// Fraction of stored risks within the similarity window of `risk` that
    /// fall below the safe cutoff. 0 when nothing matches.
    #[must_use]
    pub fn success_rate(&self, risk: f64, history: &RiskHistory) -> f64 {
        let mut total = 0_u64;
        let mut safe = 0_u64;
        for &past in history.iter() {
            if (past - risk).abs() < self.window {
                total += 1;
                if past < self.safe_cutoff {
                    safe += 1;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            safe as f64 / total as f64
        }
    }

    /// Full check with diagnostics. A random draw is taken only when the
    /// success-rate bar is cleared.
    pub fn check<R: RandomSource + ?Sized>(
        &self,
        risk: f64,
        history: &RiskHistory,
        rng: &mut R,
    ) -> DesensitizeCheck {
        let success_rate = self.success_rate(risk, history);
        let Some(band) = band_for(risk) else {
            return DesensitizeCheck {
                success_rate,
                bar_cleared: false,
                desensitized: false,
            };
        };
        let bar_cleared = success_rate > band.success_bar;
        let desensitized = bar_cleared && rng.chance(band.flip_probability);
        DesensitizeCheck {
            success_rate,
            bar_cleared,
            desensitized,
        }
    }

    pub fn should_desensitize<R: RandomSource + ?Sized>(
        &self,
        risk: f64,
        history: &RiskHistory,
        rng: &mut R,
    ) -> bool {
        self.check(risk, history, rng).desensitized
    }
}

impl Default for Desensitizer {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}
