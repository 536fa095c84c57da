//! Best-effort extraction of typed results from raw model output.
//!
//! The model is asked for labeled lines or a JSON object, but what comes back
//! is free text: sometimes fenced JSON, sometimes prose with Chinese or
//! English labels, sometimes nothing usable at all. Each extractor here is a
//! pure function of the text and never fails; when extraction comes up empty
//! the fixed tables in [`fallback`] fill the gaps.
//!
//! # Entry points
//!
//! - `parse_*`: raw text in, typed result out.
//! - `normalize_*`: takes a [`ModelResponse`] (text or "the call failed") and
//!   also reports whether the result is degraded, for the caller's logs.
//!
//! # Known looseness
//!
//! - `stress_index` is not clamped to [0, 1].
//! - Scenario `mindset_guidance` is the whole response text.
//! - Scenario `visualization_script` is never extracted; it is always the
//!   fixed phrase even when the model wrote a visualization section.

pub mod emergency;
pub mod fallback;
pub mod mood;
pub mod scenario;

pub use emergency::{normalize_emergency_guidance, parse_emergency_guidance};
pub use mood::{normalize_mood_analysis, parse_mood_analysis, parse_mood_analysis_with, MoodLabels};
pub use scenario::{normalize_scenario_plan, parse_scenario_plan};

use crate::error::Degradation;

/// What the LLM collaborator handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelResponse<'a> {
    /// The call succeeded with this text.
    Text(&'a str),
    /// The call failed, timed out, or no credential is configured.
    Unavailable,
}

impl<'a> ModelResponse<'a> {
    pub fn from_result<E>(result: &'a Result<String, E>) -> Self {
        match result {
            Ok(text) => ModelResponse::Text(text.as_str()),
            Err(_) => ModelResponse::Unavailable,
        }
    }
}

/// A normalized value plus the reason it degraded, if it did.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub value: T,
    pub degradation: Option<Degradation>,
}

impl<T> Normalized<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            degradation: None,
        }
    }

    pub fn degraded(value: T, degradation: Degradation) -> Self {
        Self {
            value,
            degradation: Some(degradation),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
