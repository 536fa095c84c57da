//! Emergency guidance: JSON first, labeled lines second.
//!
//! The prompt demands a bare JSON object, but models wrap it in markdown
//! fences, prefix it with chatter, or give up on JSON entirely and write
//! `语音: ...` style lines. Candidates are tried in a fixed order:
//!
//! 1. a fenced block holding a flat object,
//! 2. the first flat object mentioning `"voice_script"`,
//! 3. the whole response.
//!
//! Malformed JSON sends the text to the line scan. JSON that parses but is
//! not an object yields the canned guidance.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{fallback, ModelResponse, Normalized};
use crate::ai::{EmergencyGuidance, MusicType};
use crate::error::Degradation;

static FENCED_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*(\{[^}]*\})\s*```").unwrap());

static VOICE_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{[^{}]*"voice_script"[^{}]*\}"#).unwrap());

/// Pick the substring most likely to be the JSON payload.
fn json_candidate(content: &str) -> &str {
    if let Some(inner) = FENCED_OBJECT.captures(content).and_then(|c| c.get(1)) {
        return inner.as_str();
    }
    if let Some(m) = VOICE_OBJECT.find(content) {
        return m.as_str();
    }
    content
}

enum JsonOutcome {
    Guidance(EmergencyGuidance),
    NotAnObject,
    Malformed,
}

fn from_json(candidate: &str) -> JsonOutcome {
    let Ok(value) = serde_json::from_str::<Value>(candidate) else {
        return JsonOutcome::Malformed;
    };
    let Some(obj) = value.as_object() else {
        return JsonOutcome::NotAnObject;
    };

    let field = |key: &str, default: &'static str| -> String {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };

    // Only a missing key gets the JSON default; any other non-string is out of range
    let music = match obj.get("music_type") {
        None => MusicType::coerce(fallback::JSON_MUSIC),
        Some(Value::String(s)) => MusicType::coerce(s),
        Some(_) => MusicType::NatureSounds,
    };

    JsonOutcome::Guidance(EmergencyGuidance::new(
        field("voice_script", fallback::JSON_VOICE),
        field("visual_prompt", fallback::JSON_VISUAL),
        music,
    ))
}

/// Value after the first ASCII colon, with surrounding quotes removed.
fn value_after_colon(line: &str) -> Option<&str> {
    let (_, value) = line.split_once(':')?;
    Some(value.trim().trim_matches('"').trim_matches('\''))
}

fn from_lines(content: &str) -> (EmergencyGuidance, bool) {
    let mut voice = fallback::TEXT_VOICE.to_string();
    let mut visual = fallback::TEXT_VISUAL.to_string();
    let mut music = MusicType::NatureSounds;
    let mut matched = false;

    for line in content.split('\n').map(str::trim) {
        let lower = line.to_lowercase();
        if line.contains("语音") || lower.contains("voice") {
            if let Some(v) = value_after_colon(line) {
                voice = v.to_string();
                matched = true;
            }
        } else if line.contains("视觉") || lower.contains("visual") {
            if let Some(v) = value_after_colon(line) {
                visual = v.to_string();
                matched = true;
            }
        } else if line.contains("音乐") || lower.contains("music") {
            if let Some(m) = value_after_colon(line).and_then(MusicType::parse) {
                music = m;
                matched = true;
            }
        }
    }

    (EmergencyGuidance::new(voice, visual, music), matched)
}

fn extract(raw: &str) -> (EmergencyGuidance, bool) {
    let content = raw.trim();
    match from_json(json_candidate(content)) {
        JsonOutcome::Guidance(guidance) => (guidance, true),
        JsonOutcome::NotAnObject => (fallback::emergency_guidance(), false),
        JsonOutcome::Malformed => from_lines(content),
    }
}

pub fn parse_emergency_guidance(raw: &str) -> EmergencyGuidance {
    extract(raw).0
}

pub fn normalize_emergency_guidance(response: ModelResponse<'_>) -> Normalized<EmergencyGuidance> {
    match response {
        ModelResponse::Unavailable => Normalized::degraded(
            fallback::emergency_guidance(),
            Degradation::UpstreamUnavailable,
        ),
        ModelResponse::Text(raw) => {
            let (guidance, matched) = extract(raw);
            if matched {
                Normalized::clean(guidance)
            } else {
                Normalized::degraded(guidance, Degradation::UnparseableResponse)
            }
        }
    }
}
