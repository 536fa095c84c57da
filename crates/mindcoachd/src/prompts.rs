//! Prompt text for the AI tasks.
//!
//! The labels and JSON keys requested here are the ones the normalizer in
//! `mindcoach_shared::normalizer` looks for; change both together.

pub const MOOD_SYSTEM: &str = "你是一个心理健康助手，擅长分析用户情绪并提供建议。";

pub const EMERGENCY_SYSTEM: &str = "你是专业的心理危机干预师。请严格按照JSON格式回复，包含voice_script(语音引导词)、visual_prompt(视觉场景描述)、music_type(音乐类型)三个字段。音乐类型只能从nature_sounds、relaxing_piano、meditation_bell中选择。";

pub const SCENARIO_SYSTEM: &str = "你是专业的心理教练，擅长帮助学生快速进入最佳状态。请提供具体的准备步骤、心态调整和可视化引导。";

pub const CHAT_SYSTEM: &str = "你是一个考研心理健康助手，专注于提供情感支持和学习建议。";

/// Token budgets per task
pub const MOOD_MAX_TOKENS: u32 = 200;
pub const EMERGENCY_MAX_TOKENS: u32 = 400;
pub const SCENARIO_MAX_TOKENS: u32 = 400;
pub const CHAT_MAX_TOKENS: u32 = 500;

pub fn mood_user(text: &str) -> String {
    format!(
        "请分析以下文本的情绪，并按以下格式逐行回复：\n压力指数: <0-1之间的小数>\n情绪雷达: <情绪描述>\n解释: <简短解释>\n干预建议: <一句建议>\n\n{}",
        text
    )
}

pub fn emergency_user(emotion_state: &str, intensity: f64) -> String {
    format!(
        "为{}情绪(强度{}/10)设计90秒急救方案。请回复JSON格式：{{\"voice_script\": \"温和具体的呼吸和放松引导词\", \"visual_prompt\": \"平静自然场景描述\", \"music_type\": \"适合的音乐类型\"}}",
        emotion_state, intensity
    )
}

pub fn scenario_user(scenario_type: &str, user_concerns: &str) -> String {
    format!(
        "场景类型：{}，用户担忧：{}。请设计进入状态的方案，包含：1)具体准备步骤 2)心态调整指导 3)可视化引导脚本",
        scenario_type, user_concerns
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_prompt_requests_normalizer_labels() {
        let prompt = mood_user("好累");
        for label in ["压力指数:", "情绪雷达:", "解释:", "干预建议:"] {
            assert!(prompt.contains(label), "missing label {}", label);
        }
        assert!(prompt.ends_with("好累"));
    }

    #[test]
    fn test_emergency_prompt_is_json_shaped() {
        let prompt = emergency_user("焦虑", 7.5);
        assert!(prompt.contains("焦虑情绪(强度7.5/10)"));
        assert!(prompt.contains("\"voice_script\""));
        assert!(EMERGENCY_SYSTEM.contains("meditation_bell"));
    }

    #[test]
    fn test_scenario_prompt() {
        let prompt = scenario_user("interview", "怕冷场");
        assert!(prompt.starts_with("场景类型：interview，用户担忧：怕冷场"));
    }
}
