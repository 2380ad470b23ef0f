use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, instrument};

use super::traits::{ChatReply, QueryRequest, QueryResponder, ReplySource};
use crate::config::RemoteModelConfig;
use crate::engine::locale::Language;
use crate::engine::templates::{TemplateId, TemplateTable};
use crate::error::AppError;
use crate::models::UserHealthProfile;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Responder backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct RemoteModelResponder {
    client: Client,
    config: RemoteModelConfig,
    templates: Arc<TemplateTable>,
}

impl RemoteModelResponder {
    pub fn new(config: RemoteModelConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            templates: TemplateTable::shared(),
        }
    }

    /// System prompt in the request language, built from the profile.
    pub fn system_prompt(&self, profile: &UserHealthProfile, language: Language) -> String {
        let t = &self.templates;
        let mut lines = vec![t.get(TemplateId::PromptIntro, language).to_string()];

        if let Some(diabetes_type) = profile.diabetes_type() {
            lines.push(t.render(TemplateId::PromptDiabetes, language, &[("diabetes_type", diabetes_type)]));
        }
        if profile.has_allergies() {
            let labels = profile.allergy_labels();
            lines.push(t.render(TemplateId::PromptAllergies, language, &[("allergies", labels.as_str())]));
        }
        if !profile.dietary_restrictions.is_empty() {
            let restrictions = profile.dietary_restrictions.join(", ");
            lines.push(t.render(
                TemplateId::PromptRestrictions,
                language,
                &[("restrictions", restrictions.as_str())],
            ));
        }
        lines.push(t.get(TemplateId::PromptClosing, language).to_string());

        lines.join("\n")
    }

    fn build_request(
        &self,
        payload: &ChatCompletionRequest<'_>,
    ) -> Result<reqwest::RequestBuilder, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| AppError::Config(format!("Invalid API key header: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(self
            .client
            .post(self.config.endpoint()?)
            .headers(headers)
            .json(payload))
    }
}

#[async_trait]
impl QueryResponder for RemoteModelResponder {
    fn name(&self) -> &'static str {
        "remote-model"
    }

    #[instrument(skip(self, request), fields(model = %self.config.model, language = %request.language))]
    async fn respond(&self, request: &QueryRequest) -> Result<ChatReply, AppError> {
        let system_prompt = self.system_prompt(&request.profile, request.language);

        let skip = request.history.len().saturating_sub(self.config.history_window);
        let mut messages = vec![ChatMessage {
            role: "system",
            content: &system_prompt,
        }];
        messages.extend(request.history.iter().skip(skip).map(|turn| ChatMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));
        messages.push(ChatMessage {
            role: "user",
            content: &request.query,
        });

        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
        };

        let res = timeout(self.config.request_timeout(), self.build_request(&payload)?.send()).await??;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "Completion request failed with status {}: {}",
                status, body
            )));
        }

        let body: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("Malformed completion response: {}", e)))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::Remote("Completion response has no content".to_string()))?;

        info!(chars = text.len(), "Remote model replied");

        Ok(ChatReply {
            text,
            language: request.language,
            source: ReplySource::Remote,
            domain: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AllergyRecord, RiskLevel};
    use crate::responders::traits::ChatTurn;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn responder_for(server: &MockServer) -> RemoteModelResponder {
        RemoteModelResponder::new(RemoteModelConfig {
            api_url: format!("{}/v1/chat/completions", server.uri()),
            api_key: Some("sk-test".to_string()),
            request_timeout_secs: 1,
            history_window: 2,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_remote_reply_success() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Keep carbs consistent."}}]
            })))
            .mount(&mock_server)
            .await;
        let responder = responder_for(&mock_server);

        // 2. Act
        let request = QueryRequest::new("carbs?", "en", UserHealthProfile::default());
        let reply = responder.respond(&request).await;

        // 3. Assert
        let reply = reply.unwrap();
        assert_eq!(reply.text, "Keep carbs consistent.");
        assert_eq!(reply.source, ReplySource::Remote);
    }

    #[tokio::test]
    async fn test_remote_server_error() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;
        let responder = responder_for(&mock_server);

        // 2. Act
        let result = responder
            .respond(&QueryRequest::new("hi", "en", UserHealthProfile::default()))
            .await;

        // 3. Assert
        match result {
            Err(AppError::Remote(msg)) => {
                assert!(msg.contains("status 500"));
                assert!(msg.contains("Internal Server Error"));
            }
            other => panic!("Expected AppError::Remote, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&mock_server)
            .await;

        let result = responder_for(&mock_server)
            .respond(&QueryRequest::new("hi", "en", UserHealthProfile::default()))
            .await;

        assert!(matches!(result, Err(AppError::Remote(_))));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": [{"message": {"content": "late"}}]}))
                    .set_delay(std::time::Duration::from_millis(1_500)),
            )
            .mount(&mock_server)
            .await;

        let result = responder_for(&mock_server)
            .respond(&QueryRequest::new("hi", "en", UserHealthProfile::default()))
            .await;

        assert!(matches!(result, Err(AppError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_history_window_is_applied() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&mock_server)
            .await;

        let request = QueryRequest::new("latest", "en", UserHealthProfile::default()).with_history(vec![
            ChatTurn::user("first"),
            ChatTurn::assistant("second"),
            ChatTurn::user("third"),
        ]);
        responder_for(&mock_server).respond(&request).await.unwrap();

        let received = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        let contents: Vec<_> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(contents.len(), 4);
        assert_eq!(&contents[1..], &["second", "third", "latest"]);
    }

    #[test]
    fn test_system_prompt_in_arabic() {
        let responder = RemoteModelResponder::new(RemoteModelConfig::default());
        let profile = UserHealthProfile {
            diabetes_type: Some("Type 1".to_string()),
            allergies: vec![AllergyRecord::new("Peanuts", RiskLevel::High)],
            ..Default::default()
        };

        let prompt = responder.system_prompt(&profile, Language::Ar);

        assert!(prompt.contains("المستخدم لديه: Type 1"));
        assert!(prompt.contains("الحساسيات: Peanuts"));
        assert!(!prompt.contains("القيود الغذائية"));
    }
}
