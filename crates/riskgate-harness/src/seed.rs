//! Seed parsing for reproducible replays.
//!
//! Seeds are accepted as decimal (`42`) or hex (`0xDEAD_BEEF`), with `_`
//! separators allowed in either form. The `RISKGATE_SEED` environment variable
//! overrides a fixture's seed; an unparsable value is ignored.

use crate::error::HarnessError;

/// Environment variable consulted by [`seed_from_env`].
pub const SEED_ENV: &str = "RISKGATE_SEED";

pub fn parse_seed(raw: &str) -> Result<u64, HarnessError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '_').collect();
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => cleaned.parse::<u64>(),
    };
    parsed.map_err(|_| HarnessError::InvalidSeed(raw.to_string()))
}

/// Seed from `RISKGATE_SEED`, if set and valid.
#[must_use]
pub fn seed_from_env() -> Option<u64> {
    let raw = std::env::var(SEED_ENV).ok()?;
    parse_seed_env(&raw)
}

fn parse_seed_env(raw: &str) -> Option<u64> {
    if raw.trim().is_empty() {
        return None;
    }
    match parse_seed(raw) {
        Ok(seed) => Some(seed),
        Err(err) => {
            tracing::warn!(env = SEED_ENV, %err, "ignoring seed override");
            None
        }
    }
}
