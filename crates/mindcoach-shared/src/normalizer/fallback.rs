//! Fixed results served when the model is unavailable or unreadable.
//!
//! These strings are user-facing and tests compare them byte for byte.

use crate::ai::{EmergencyGuidance, MoodAnalysisResult, MusicType, ScenarioPlan, ScenarioType};

// Mood analysis
pub const MOOD_STRESS_INDEX: f64 = 0.5;
pub const MOOD_RADAR_PARSED: &str = "情绪分析结果";
pub const MOOD_RADAR_UNAVAILABLE: &str = "情绪分析暂时不可用";
pub const MOOD_EXPLANATION_UNAVAILABLE: &str = "AI服务暂时不可用，请稍后再试。";
pub const MOOD_SUGGESTION_UNAVAILABLE: &str = "建议进行深呼吸练习。";

// Emergency guidance, when the call fails
pub const EMERGENCY_VOICE: &str =
    "请深呼吸，吸气4秒，保持4秒，呼气6秒。重复这个过程，让自己平静下来。";
pub const EMERGENCY_VISUAL: &str = "一片宁静的森林，阳光透过树叶洒下斑驳的光影";

// Emergency guidance, JSON object missing a key
pub const JSON_VOICE: &str = "请深呼吸，让身心放松。专注于当下，感受每一次呼吸带来的平静。";
pub const JSON_VISUAL: &str = "一片宁静的海滩，海浪轻柔地拍打着岸边";
pub const JSON_MUSIC: &str = "relaxing_piano";

// Emergency guidance, line scan found nothing for a field
pub const TEXT_VOICE: &str = "请深呼吸，让身心放松。专注于当下这一刻，感受每一次呼吸带来的平静。";
pub const TEXT_VISUAL: &str = "一片宁静的森林，阳光透过树叶洒下温暖的光芒";

// Scenario plan
pub const PLACEHOLDER_STEPS: [&str; 3] = ["准备第一步", "准备第二步", "准备第三步"];
pub const VISUALIZATION_SCRIPT: &str = "想象成功完成任务的场景";

/// Mood result when the model could not be reached.
pub fn mood_unavailable() -> MoodAnalysisResult {
    MoodAnalysisResult {
        stress_index: MOOD_STRESS_INDEX,
        mood_radar: MOOD_RADAR_UNAVAILABLE.to_string(),
        explanation: MOOD_EXPLANATION_UNAVAILABLE.to_string(),
        intervention_suggestion: Some(MOOD_SUGGESTION_UNAVAILABLE.to_string()),
    }
}

/// Canned breathing exercise.
pub fn emergency_guidance() -> EmergencyGuidance {
    EmergencyGuidance::new(EMERGENCY_VOICE, EMERGENCY_VISUAL, MusicType::NatureSounds)
}

/// Canned plan for a scenario type.
pub fn scenario_plan(scenario: ScenarioType) -> ScenarioPlan {
    let (steps, mindset, visualization): ([&str; 3], &str, &str) = match scenario {
        ScenarioType::Exam => (
            ["深呼吸3次", "回顾知识要点", "积极心理暗示"],
            "你已经充分准备，相信自己的能力",
            "想象自己在考场上冷静答题的场景",
        ),
        ScenarioType::Interview => (
            ["整理着装", "练习自我介绍", "模拟问答"],
            "展现真实的自己，面试官也希望找到合适的人",
            "想象自己自信地与面试官交流",
        ),
        ScenarioType::Study => (
            ["清理桌面", "设定学习目标", "准备学习材料"],
            "每一分钟的努力都在为梦想添砖加瓦",
            "想象自己专注学习，逐步掌握知识的满足感",
        ),
    };

    ScenarioPlan {
        preparation_steps: steps.iter().map(|s| s.to_string()).collect(),
        mindset_guidance: mindset.to_string(),
        visualization_script: visualization.to_string(),
        duration: scenario.duration_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scenario_plan_has_three_steps() {
        for scenario in [ScenarioType::Exam, ScenarioType::Interview, ScenarioType::Study] {
            let plan = scenario_plan(scenario);
            assert_eq!(plan.preparation_steps.len(), 3);
            assert_eq!(plan.duration, scenario.duration_secs());
        }
    }

    #[test]
    fn test_emergency_guidance_default() {
        let g = emergency_guidance();
        assert_eq!(g.music_type, MusicType::NatureSounds);
        assert_eq!(g.duration, 90);
        assert_eq!(g.voice_script, EMERGENCY_VOICE);
    }
}
