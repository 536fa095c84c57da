//! AI features built on the LLM client and the normalizer.
//!
//! Every task makes exactly one model call. Whatever comes back, or doesn't,
//! is handed to the normalizer, so callers always get a complete result.

use anyhow::Result;
use mindcoach_shared::records::ChatReply;
use mindcoach_shared::{
    normalize_emergency_guidance, normalize_mood_analysis, normalize_scenario_plan, ChatMessage,
    EmergencyGuidance, ModelResponse, MoodAnalysisResult, Normalized, ScenarioPlan, ScenarioType,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::llm_client::{LlmClient, LlmError, LlmRequest};
use crate::prompts;
use crate::store::Store;

/// Conversations loaded as chat context
pub const CHAT_HISTORY_LIMIT: usize = 5;

pub const CHAT_NO_KEY_REPLY: &str = "抱歉，AI服务暂时不可用，请设置OpenAI API密钥。";
pub const CHAT_FAILURE_REPLY: &str = "抱歉，AI服务暂时不可用，请稍后再试。";

pub struct AiService {
    client: Option<Arc<dyn LlmClient>>,
    store: Store,
    config: LlmConfig,
}

impl AiService {
    /// `client` is `None` when no API key is configured.
    pub fn new(client: Option<Arc<dyn LlmClient>>, store: Store, config: LlmConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    fn request(&self, system: &str, user: String, max_tokens: u32) -> LlmRequest {
        LlmRequest::single(
            system,
            user,
            self.config.temperature,
            max_tokens,
            Duration::from_secs(self.config.timeout_secs),
        )
    }

    async fn call(&self, request: &LlmRequest) -> Result<String, LlmError> {
        match &self.client {
            Some(client) => client.invoke(request).await,
            None => Err(LlmError::Disabled),
        }
    }

    pub async fn analyze_mood(&self, text: &str) -> MoodAnalysisResult {
        let request = self.request(
            prompts::MOOD_SYSTEM,
            prompts::mood_user(text),
            prompts::MOOD_MAX_TOKENS,
        );
        let result = self.call(&request).await;
        let normalized = normalize_mood_analysis(ModelResponse::from_result(&result));
        log_degradation("mood_analysis", &normalized, &result);
        normalized.into_inner()
    }

    pub async fn emergency_guidance(&self, emotion_state: &str, intensity: f64) -> EmergencyGuidance {
        let request = self.request(
            prompts::EMERGENCY_SYSTEM,
            prompts::emergency_user(emotion_state, intensity),
            prompts::EMERGENCY_MAX_TOKENS,
        );
        let result = self.call(&request).await;
        let normalized = normalize_emergency_guidance(ModelResponse::from_result(&result));
        log_degradation("emergency_guidance", &normalized, &result);
        normalized.into_inner()
    }

    pub async fn scenario_simulation(&self, scenario_type: &str, user_concerns: &str) -> ScenarioPlan {
        let scenario = ScenarioType::from_name(scenario_type);
        let request = self.request(
            prompts::SCENARIO_SYSTEM,
            prompts::scenario_user(scenario_type, user_concerns),
            prompts::SCENARIO_MAX_TOKENS,
        );
        let result = self.call(&request).await;
        let normalized = normalize_scenario_plan(ModelResponse::from_result(&result), scenario);
        log_degradation("scenario_simulation", &normalized, &result);
        normalized.into_inner()
    }

    /// Reply to `messages` with the user's recent conversations as context.
    ///
    /// Only a successful exchange is stored.
    pub async fn chat(&self, user_id: i64, messages: Vec<ChatMessage>) -> Result<ChatReply> {
        if self.client.is_none() {
            warn!("chat: no LLM configured");
            return Ok(ChatReply {
                response: CHAT_NO_KEY_REPLY.to_string(),
                conversation_id: None,
            });
        }

        let mut history = self.store.recent_conversations(user_id, CHAT_HISTORY_LIMIT)?;
        history.reverse();

        let mut context: Vec<ChatMessage> = history.into_iter().flat_map(|c| c.messages).collect();
        context.extend(messages.iter().cloned());

        let request = LlmRequest {
            system_prompt: prompts::CHAT_SYSTEM.to_string(),
            messages: context,
            temperature: self.config.temperature,
            max_tokens: prompts::CHAT_MAX_TOKENS,
            timeout: Duration::from_secs(self.config.timeout_secs),
        };

        match self.call(&request).await {
            Ok(reply) => {
                let mut exchange = messages;
                exchange.push(ChatMessage::assistant(reply.clone()));
                let conversation = self.store.insert_conversation(user_id, &exchange)?;
                info!(
                    "chat: stored conversation {} for user {}",
                    conversation.id, user_id
                );
                Ok(ChatReply {
                    response: reply,
                    conversation_id: Some(conversation.id),
                })
            }
            Err(e) => {
                warn!("chat: model call failed: {}", e);
                Ok(ChatReply {
                    response: CHAT_FAILURE_REPLY.to_string(),
                    conversation_id: None,
                })
            }
        }
    }
}

fn log_degradation<T>(task: &str, normalized: &Normalized<T>, result: &Result<String, LlmError>) {
    if let Some(degradation) = normalized.degradation {
        match result {
            Err(e) => warn!("{}: degraded ({}): {}", task, degradation.as_str(), e),
            Ok(text) => warn!(
                "{}: degraded ({}), {} chars of model output unused",
                task,
                degradation.as_str(),
                text.chars().count()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::FakeLlmClient;
    use mindcoach_shared::MusicType;

    fn service(fake: FakeLlmClient) -> (AiService, Arc<FakeLlmClient>, Store) {
        let store = Store::open_in_memory().unwrap();
        let fake = Arc::new(fake);
        let client: Arc<dyn LlmClient> = fake.clone();
        let service = AiService::new(Some(client), store.clone(), LlmConfig::default());
        (service, fake, store)
    }

    fn offline() -> AiService {
        AiService::new(None, Store::open_in_memory().unwrap(), LlmConfig::default())
    }

    #[tokio::test]
    async fn test_analyze_mood_parses_labels() {
        let (service, fake, _) = service(FakeLlmClient::always_text(
            "压力指数: 0.7\n情绪雷达: 焦虑\n解释: 考试临近\n干预建议: 散步十分钟",
        ));
        let result = service.analyze_mood("明天考试").await;
        assert_eq!(result.stress_index, 0.7);
        assert_eq!(result.mood_radar, "焦虑");
        assert_eq!(result.intervention_suggestion.as_deref(), Some("散步十分钟"));

        let request = &fake.requests()[0];
        assert_eq!(request.max_tokens, prompts::MOOD_MAX_TOKENS);
        assert!(request.messages[0].content.ends_with("明天考试"));
    }

    #[tokio::test]
    async fn test_offline_tasks_fall_back() {
        let service = offline();
        assert!(!service.is_available());

        let mood = service.analyze_mood("好累").await;
        assert_eq!(mood.stress_index, 0.5);

        let guidance = service.emergency_guidance("焦虑", 8.0).await;
        assert_eq!(guidance.music_type, MusicType::NatureSounds);
        assert_eq!(guidance.duration, 90);

        let plan = service.scenario_simulation("interview", "紧张").await;
        assert_eq!(plan.duration, 300);
        assert_eq!(plan.preparation_steps.len(), 3);
    }

    #[tokio::test]
    async fn test_emergency_guidance_from_json() {
        let (service, fake, _) = service(FakeLlmClient::always_text(
            r#"{"voice_script": "慢慢吸气", "visual_prompt": "湖边", "music_type": "relaxing_piano"}"#,
        ));
        let guidance = service.emergency_guidance("恐慌", 9.0).await;
        assert_eq!(guidance.voice_script, "慢慢吸气");
        assert_eq!(guidance.music_type, MusicType::RelaxingPiano);
        assert_eq!(fake.requests()[0].max_tokens, prompts::EMERGENCY_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_scenario_failure_uses_type_table() {
        let (service, _, _) = service(FakeLlmClient::always_error(LlmError::Timeout(30)));
        let plan = service.scenario_simulation("exam", "").await;
        assert_eq!(plan.duration, 300);
        assert_eq!(plan.preparation_steps.len(), 3);
    }

    #[tokio::test]
    async fn test_chat_stores_exchange() {
        let (service, _, store) = service(FakeLlmClient::always_text("加油，你可以的"));
        let user = store.create_user("b@example.com", "bob", "h", "s").unwrap().unwrap();
        let reply = service
            .chat(user.id, vec![ChatMessage::user("我好焦虑")])
            .await
            .unwrap();
        assert_eq!(reply.response, "加油，你可以的");
        let id = reply.conversation_id.unwrap();

        let stored = store.recent_conversations(user.id, 5).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].messages.len(), 2);
        assert_eq!(stored[0].messages[1], ChatMessage::assistant("加油，你可以的"));
    }

    #[tokio::test]
    async fn test_chat_context_is_oldest_first() {
        let (service, fake, store) = service(FakeLlmClient::new(vec![
            Ok("一".to_string()),
            Ok("二".to_string()),
            Ok("三".to_string()),
        ]));
        let user = store.create_user("c@example.com", "carol", "h", "s").unwrap().unwrap();
        service.chat(user.id, vec![ChatMessage::user("first")]).await.unwrap();
        service.chat(user.id, vec![ChatMessage::user("second")]).await.unwrap();
        service.chat(user.id, vec![ChatMessage::user("third")]).await.unwrap();

        let last = &fake.requests()[2];
        let contents: Vec<&str> = last.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "一", "second", "二", "third"]);
        assert_eq!(last.system_prompt, prompts::CHAT_SYSTEM);
    }

    #[tokio::test]
    async fn test_chat_without_client() {
        let service = offline();
        let reply = service.chat(1, vec![ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(reply.response, CHAT_NO_KEY_REPLY);
        assert_eq!(reply.conversation_id, None);
    }

    #[tokio::test]
    async fn test_chat_failure_stores_nothing() {
        let (service, _, store) = service(FakeLlmClient::always_error(LlmError::HttpError(
            "HTTP 500".to_string(),
        )));
        let user = store.create_user("d@example.com", "dave", "h", "s").unwrap().unwrap();
        let reply = service
            .chat(user.id, vec![ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply.response, CHAT_FAILURE_REPLY);
        assert_eq!(reply.conversation_id, None);
        assert!(store.recent_conversations(user.id, 5).unwrap().is_empty());
    }
}
