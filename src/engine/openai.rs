//! Chat-completions adapters for the three guardrail services.
//!
//! A single `ChatClient` talks to an OpenAI-compatible
//! `/chat/completions` endpoint; the generator, topic classifier and
//! moderator are thin prompt builders on top of it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::LlmConfig;
use crate::domain::TopicTag;
use crate::engine::rubric;
use crate::engine::{ContentModerator, TextGenerator, TopicClassifier};
use crate::error::ServiceError;

/// Request to the chat-completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from the chat-completions API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String, ServiceError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(ServiceError::EmptyResponse)
    }
}

/// HTTP client for an OpenAI-compatible chat endpoint.
///
/// Cheap to share: one instance serves every concurrent evaluation.
pub struct ChatClient {
    config: LlmConfig,
    client: Client,
}

impl ChatClient {
    /// Create a new chat client.
    pub fn new(config: LlmConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Send one completion request and return the first choice's text.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api { status, body });
        }

        let chat_response: ChatResponse = response.json().await?;
        chat_response.into_content()
    }

    /// Like `complete`, but gives up as soon as `cancel` fires.
    async fn complete_or_cancel(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ServiceError::Cancelled),
            result = self.complete(messages, temperature) => result,
        }
    }
}

/// Story generator backed by the chat endpoint.
pub struct ChatStoryGenerator {
    client: Arc<ChatClient>,
    temperature: f32,
}

impl ChatStoryGenerator {
    pub fn new(client: Arc<ChatClient>, temperature: f32) -> Self {
        Self {
            client,
            temperature,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatStoryGenerator {
    async fn generate(
        &self,
        prompt: &str,
        age_hint: u8,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        tracing::debug!(model = %self.client.model(), age_hint, "Requesting story");
        let messages = vec![
            ChatMessage::system(rubric::story_instructions(age_hint)),
            ChatMessage::user(prompt),
        ];
        let story = self
            .client
            .complete_or_cancel(messages, self.temperature, cancel)
            .await
            .and_then(require_story)?;
        tracing::debug!(story_len = story.len(), "Story received");
        Ok(story)
    }
}

/// A blank completion is not a story.
fn require_story(story: String) -> Result<String, ServiceError> {
    if story.trim().is_empty() {
        return Err(ServiceError::EmptyResponse);
    }
    Ok(story)
}

/// Topic gate backed by the chat endpoint.
pub struct ChatTopicClassifier {
    client: Arc<ChatClient>,
}

impl ChatTopicClassifier {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TopicClassifier for ChatTopicClassifier {
    async fn classify(
        &self,
        prompt: &str,
        disallowed: &BTreeSet<TopicTag>,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        tracing::debug!(disallowed = ?disallowed, "Checking topical guardrail");
        let messages = vec![
            ChatMessage::system(rubric::classifier_instructions(disallowed)),
            ChatMessage::user(prompt),
        ];
        self.client.complete_or_cancel(messages, 0.0, cancel).await
    }
}

/// Moderation pass backed by the chat endpoint.
pub struct ChatModerator {
    client: Arc<ChatClient>,
}

impl ChatModerator {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentModerator for ChatModerator {
    async fn score(
        &self,
        content: &str,
        rubric: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        tracing::debug!(content_len = content.len(), "Checking moderation guardrail");
        let messages = vec![ChatMessage::user(rubric)];
        self.client.complete_or_cancel(messages, 0.0, cancel).await
    }
}
