//! Harness error type.

use std::path::PathBuf;

use riskgate_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed reading '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("controller config rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("scenario '{scenario}': {message}")]
    Fixture { scenario: String, message: String },
    #[error("invalid seed '{0}': expected decimal or 0x-prefixed hex")]
    InvalidSeed(String),
}
