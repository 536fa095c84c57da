//! User-owned records and their request payloads.
//!
//! Every record carries the owning `user_id` and a creation timestamp. The
//! optional `ai_analysis` is a [`MoodAnalysisResult`] embedded as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::{ChatMessage, MoodAnalysisResult};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub exam_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub selected_subjects: Vec<String>,
    pub ai_companion_style: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub exam_date: Option<DateTime<Utc>>,
    pub selected_subjects: Option<Vec<String>>,
    pub ai_companion_style: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.exam_date.is_none()
            && self.selected_subjects.is_none()
            && self.ai_companion_style.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

// ============================================================================
// Mood log
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: i64,
    pub user_id: i64,
    pub mood: String,
    /// Self-reported intensity, 0 to 10.
    pub intensity: f64,
    pub note: Option<String>,
    pub ai_analysis: Option<MoodAnalysisResult>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoodCreate {
    pub mood: String,
    pub intensity: f64,
    #[serde(default)]
    pub note: Option<String>,
    /// Run mood analysis over the note before storing.
    #[serde(default)]
    pub analyze: bool,
}

impl MoodCreate {
    /// Text handed to mood analysis: the note, or the mood label without one.
    pub fn analysis_text(&self) -> &str {
        self.note
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.mood)
    }
}

// ============================================================================
// Error (mistake) log
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub image_url: Option<String>,
    pub ai_analysis: Option<MoodAnalysisResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorCreate {
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub analyze: bool,
}

// ============================================================================
// Messenger
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessengerEntry {
    pub id: i64,
    pub user_id: i64,
    /// text, image or audio
    pub message_type: String,
    /// Text, or a URL / base64 payload for media.
    pub content: String,
    /// user or ai
    pub sender: String,
    pub ai_analysis: Option<MoodAnalysisResult>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessengerCreate {
    pub message_type: String,
    pub content: String,
    pub sender: String,
    #[serde(default)]
    pub analyze: bool,
}

// ============================================================================
// Paintings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintingEntry {
    pub id: i64,
    pub user_id: i64,
    /// Base64 `data:` URL.
    pub image_data_url: String,
    pub ai_analysis: Option<MoodAnalysisResult>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaintingCreate {
    pub image_data_url: String,
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub user_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub mood_trend_data: Vec<Value>,
    pub efficiency_mood_scatter_data: Vec<Value>,
    pub insights: Vec<String>,
    pub suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCreate {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub mood_trend_data: Vec<Value>,
    #[serde(default)]
    pub efficiency_mood_scatter_data: Vec<Value>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

// ============================================================================
// AI conversations and requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConversation {
    pub id: i64,
    pub user_id: i64,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyRequest {
    pub emotion_state: String,
    /// 0 to 10.
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub scenario_type: String,
    #[serde(default)]
    pub user_concerns: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_analysis_text_prefers_note() {
        let with_note = MoodCreate {
            mood: "焦虑".to_string(),
            intensity: 7.0,
            note: Some("明天模拟考".to_string()),
            analyze: true,
        };
        assert_eq!(with_note.analysis_text(), "明天模拟考");

        let blank_note = MoodCreate {
            note: Some("   ".to_string()),
            ..with_note
        };
        assert_eq!(blank_note.analysis_text(), "焦虑");
    }

    #[test]
    fn test_report_create_defaults() {
        let json = r#"{"start_date": "2024-11-01T00:00:00Z", "end_date": "2024-11-07T00:00:00Z"}"#;
        let report: ReportCreate = serde_json::from_str(json).unwrap();
        assert!(report.insights.is_empty());
        assert!(report.mood_trend_data.is_empty());
    }

    #[test]
    fn test_user_update_is_empty() {
        assert!(UserUpdate::default().is_empty());
        let update = UserUpdate {
            ai_companion_style: Some("gentle".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
