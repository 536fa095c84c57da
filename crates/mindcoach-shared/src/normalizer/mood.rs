//! Mood analysis: labeled-line scan.
//!
//! Expected model output looks like
//!
//! ```text
//! 压力指数: 0.7
//! 情绪雷达: 焦虑，疲惫
//! 解释: ...
//! 干预建议: ...
//! ```
//!
//! but any of the lines may be missing, reordered, or buried in prose.

use super::{fallback, ModelResponse, Normalized};
use crate::ai::MoodAnalysisResult;
use crate::error::Degradation;

/// Label set the scan looks for. Each label includes its separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodLabels {
    pub stress_index: String,
    pub mood_radar: String,
    pub explanation: String,
    pub intervention_suggestion: String,
}

impl Default for MoodLabels {
    fn default() -> Self {
        Self {
            stress_index: "压力指数:".to_string(),
            mood_radar: "情绪雷达:".to_string(),
            explanation: "解释:".to_string(),
            intervention_suggestion: "干预建议:".to_string(),
        }
    }
}

impl MoodLabels {
    /// English label set for prompts written in English.
    pub fn english() -> Self {
        Self {
            stress_index: "Stress index:".to_string(),
            mood_radar: "Mood radar:".to_string(),
            explanation: "Explanation:".to_string(),
            intervention_suggestion: "Intervention suggestion:".to_string(),
        }
    }
}

/// Text between the first occurrence of `label` and the next newline.
fn capture_after<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    if label.is_empty() {
        return None;
    }
    let start = text.find(label)? + label.len();
    let rest = &text[start..];
    let end = rest.find('\n').unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn scan(raw: &str, labels: &MoodLabels) -> (MoodAnalysisResult, bool) {
    let mut result = MoodAnalysisResult {
        stress_index: fallback::MOOD_STRESS_INDEX,
        mood_radar: fallback::MOOD_RADAR_PARSED.to_string(),
        explanation: raw.to_string(),
        intervention_suggestion: Some(String::new()),
    };
    let mut matched = false;

    if let Some(value) = capture_after(raw, &labels.stress_index) {
        matched = true;
        // Unparseable numbers keep the default
        if let Ok(v) = value.parse::<f64>() {
            if v.is_finite() {
                result.stress_index = v;
            }
        }
    }
    if let Some(value) = capture_after(raw, &labels.mood_radar) {
        matched = true;
        result.mood_radar = value.to_string();
    }
    if let Some(value) = capture_after(raw, &labels.explanation) {
        matched = true;
        result.explanation = value.to_string();
    }
    if let Some(value) = capture_after(raw, &labels.intervention_suggestion) {
        matched = true;
        result.intervention_suggestion = Some(value.to_string());
    }

    (result, matched)
}

/// Scan `raw` for the default Chinese labels.
pub fn parse_mood_analysis(raw: &str) -> MoodAnalysisResult {
    scan(raw, &MoodLabels::default()).0
}

/// Scan `raw` for a caller-supplied label set.
pub fn parse_mood_analysis_with(raw: &str, labels: &MoodLabels) -> MoodAnalysisResult {
    scan(raw, labels).0
}

pub fn normalize_mood_analysis(response: ModelResponse<'_>) -> Normalized<MoodAnalysisResult> {
    match response {
        ModelResponse::Unavailable => {
            Normalized::degraded(fallback::mood_unavailable(), Degradation::UpstreamUnavailable)
        }
        ModelResponse::Text(raw) => {
            let (result, matched) = scan(raw, &MoodLabels::default());
            if matched {
                Normalized::clean(result)
            } else {
                Normalized::degraded(result, Degradation::UnparseableResponse)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_labels_present() {
        let raw = "压力指数: 0.72\n情绪雷达: 焦虑\n解释: 临近考试\n干预建议: 散步十分钟";
        let r = parse_mood_analysis(raw);
        assert_eq!(r.stress_index, 0.72);
        assert_eq!(r.mood_radar, "焦虑");
        assert_eq!(r.explanation, "临近考试");
        assert_eq!(r.intervention_suggestion.as_deref(), Some("散步十分钟"));
    }

    #[test]
    fn test_bad_number_keeps_default() {
        let r = parse_mood_analysis("压力指数: 很高\n情绪雷达: 紧张");
        assert_eq!(r.stress_index, 0.5);
        assert_eq!(r.mood_radar, "紧张");
    }

    #[test]
    fn test_non_finite_number_keeps_default() {
        let r = parse_mood_analysis("压力指数: NaN");
        assert_eq!(r.stress_index, 0.5);
    }

    #[test]
    fn test_out_of_range_stress_passes_through() {
        let r = parse_mood_analysis("压力指数: 15");
        assert_eq!(r.stress_index, 15.0);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let r = parse_mood_analysis("情绪雷达: 平静\n情绪雷达: 愤怒");
        assert_eq!(r.mood_radar, "平静");
    }

    #[test]
    fn test_label_mid_line() {
        let r = parse_mood_analysis("分析结果 情绪雷达:  低落  \n");
        assert_eq!(r.mood_radar, "低落");
    }

    #[test]
    fn test_crlf_is_trimmed() {
        let r = parse_mood_analysis("压力指数: 0.3\r\n");
        assert_eq!(r.stress_index, 0.3);
    }

    #[test]
    fn test_english_labels() {
        let raw = "Stress index: 0.4\nMood radar: calm";
        let r = parse_mood_analysis_with(raw, &MoodLabels::english());
        assert_eq!(r.stress_index, 0.4);
        assert_eq!(r.mood_radar, "calm");
        assert_eq!(r.explanation, raw);
    }

    #[test]
    fn test_unlabeled_text_is_degraded() {
        let n = normalize_mood_analysis(ModelResponse::Text("今天心情还行"));
        assert_eq!(n.degradation, Some(Degradation::UnparseableResponse));
        assert_eq!(n.value.explanation, "今天心情还行");
        assert_eq!(n.value.intervention_suggestion.as_deref(), Some(""));
    }

    #[test]
    fn test_unavailable() {
        let n = normalize_mood_analysis(ModelResponse::Unavailable);
        assert_eq!(n.degradation, Some(Degradation::UpstreamUnavailable));
        assert_eq!(n.value.mood_radar, fallback::MOOD_RADAR_UNAVAILABLE);
    }
}
