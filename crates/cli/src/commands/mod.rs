//! CLI subcommands.

pub mod quote;
pub mod rates;

use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no delivery rate for postal code {postal_code:?} and volume {volume}")]
    Unsupported { postal_code: String, volume: f64 },

    #[error("invalid volume: {0}")]
    InvalidVolume(f64),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}
