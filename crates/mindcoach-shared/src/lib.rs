//! Shared types and the model-output normalizer for MindCoach components.
//!
//! `ai` holds the typed results the AI layer hands back to callers,
//! `records` the user-owned documents the daemon persists, and `normalizer`
//! the best-effort extractors that turn raw model text into those results.

pub mod ai;
pub mod error;
pub mod normalizer;
pub mod records;

pub use ai::{
    ChatMessage, ChatRole, EmergencyGuidance, MoodAnalysisResult, MusicType, ScenarioPlan,
    ScenarioType,
};
pub use error::Degradation;
pub use normalizer::{
    normalize_emergency_guidance, normalize_mood_analysis, normalize_scenario_plan,
    parse_emergency_guidance, parse_mood_analysis, parse_scenario_plan, ModelResponse,
    MoodLabels, Normalized,
};
