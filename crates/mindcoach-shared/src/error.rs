//! Degradation taxonomy for normalized model output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a normalized result fell back to defaults.
///
/// Never returned as an `Err`: the normalizer always produces a usable value
/// and only reports the degradation alongside it so callers can log it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    #[error("upstream model unavailable")]
    UpstreamUnavailable,

    #[error("model response did not match any expected shape")]
    UnparseableResponse,
}

impl Degradation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Degradation::UpstreamUnavailable => "upstream_unavailable",
            Degradation::UnparseableResponse => "unparseable_response",
        }
    }
}
