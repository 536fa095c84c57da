//! Typed results produced by the AI layer.
//!
//! These structures are serialized straight into HTTP response bodies and
//! embedded into persisted records; nothing downstream re-validates them.

use serde::{Deserialize, Serialize};

/// Fixed length of an emotional first-aid session, in seconds.
pub const EMERGENCY_DURATION_SECS: u32 = 90;

/// Sentiment scoring of a piece of user text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodAnalysisResult {
    /// Conventionally in [0, 1]; model output is passed through unclamped.
    pub stress_index: f64,
    pub mood_radar: String,
    pub explanation: String,
    #[serde(default)]
    pub intervention_suggestion: Option<String>,
}

/// Background audio for a first-aid session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicType {
    #[default]
    NatureSounds,
    RelaxingPiano,
    MeditationBell,
}

impl MusicType {
    pub const ALL: [MusicType; 3] = [
        MusicType::NatureSounds,
        MusicType::RelaxingPiano,
        MusicType::MeditationBell,
    ];

    /// Exact match against the wire names; anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }

    /// Like [`MusicType::parse`] but out-of-range values become the default.
    pub fn coerce(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MusicType::NatureSounds => "nature_sounds",
            MusicType::RelaxingPiano => "relaxing_piano",
            MusicType::MeditationBell => "meditation_bell",
        }
    }
}

impl std::fmt::Display for MusicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 90-second emotional first-aid script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyGuidance {
    pub voice_script: String,
    pub visual_prompt: String,
    pub music_type: MusicType,
    pub duration: u32,
}

impl EmergencyGuidance {
    pub fn new(
        voice_script: impl Into<String>,
        visual_prompt: impl Into<String>,
        music_type: MusicType,
    ) -> Self {
        Self {
            voice_script: voice_script.into(),
            visual_prompt: visual_prompt.into(),
            music_type,
            duration: EMERGENCY_DURATION_SECS,
        }
    }
}

/// Situation a student is preparing to walk into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    Exam,
    Interview,
    #[default]
    Study,
}

impl ScenarioType {
    /// Unrecognized names fall back to `Study`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "exam" => ScenarioType::Exam,
            "interview" => ScenarioType::Interview,
            _ => ScenarioType::Study,
        }
    }

    /// Session length for this scenario, in seconds.
    pub fn duration_secs(&self) -> u32 {
        match self {
            ScenarioType::Exam | ScenarioType::Interview => 300,
            ScenarioType::Study => 180,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::Exam => "exam",
            ScenarioType::Interview => "interview",
            ScenarioType::Study => "study",
        }
    }
}

impl std::fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preparation guidance for entering a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPlan {
    /// At most three entries, in the order the model listed them.
    pub preparation_steps: Vec<String>,
    pub mindset_guidance: String,
    pub visualization_script: String,
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_music_type_parse_is_exact() {
        assert_eq!(MusicType::parse("relaxing_piano"), Some(MusicType::RelaxingPiano));
        assert_eq!(MusicType::parse("Relaxing_Piano"), None);
        assert_eq!(MusicType::parse(" meditation_bell"), None);
        assert_eq!(MusicType::coerce("dubstep"), MusicType::NatureSounds);
    }

    #[test]
    fn test_music_type_wire_format() {
        let json = serde_json::to_string(&MusicType::MeditationBell).unwrap();
        assert_eq!(json, "\"meditation_bell\"");
    }

    #[test]
    fn test_scenario_type_lookup() {
        assert_eq!(ScenarioType::from_name("exam").duration_secs(), 300);
        assert_eq!(ScenarioType::from_name("interview").duration_secs(), 300);
        assert_eq!(ScenarioType::from_name("study").duration_secs(), 180);
        assert_eq!(ScenarioType::from_name("unknown_type"), ScenarioType::Study);
    }

    #[test]
    fn test_emergency_guidance_duration_is_fixed() {
        let g = EmergencyGuidance::new("a", "b", MusicType::RelaxingPiano);
        assert_eq!(g.duration, EMERGENCY_DURATION_SECS);
    }
}
