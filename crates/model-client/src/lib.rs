// In crates/model-client/src/lib.rs

use async_trait::async_trait;
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};

/// The narrow capability interface to an AI model.
///
/// Both the primary (proposing) and secondary (confirming) models sit behind
/// this trait, which keeps the orchestrator testable with scripted doubles.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// A short label used in logs and validation traces.
    fn name(&self) -> &str;

    /// Sends one system + user prompt pair and returns the response text.
    /// An empty `system_prompt` is omitted from the request.
    async fn call(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// A thin client for an OpenAI-compatible chat-completions API.
#[derive(Debug, Clone)]
pub struct HttpModelClient {
    http_client: reqwest::Client,
    label: String,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpModelClient {
    pub fn new(
        label: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            label: label.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    fn name(&self) -> &str {
        &self.label
    }

    async fn call(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user_prompt.to_string(),
        });

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::RequestFailed)?;
        if !status.is_success() {
            return Err(Error::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(Error::DeserializationFailed)?;
        let choice = parsed.choices.into_iter().next().ok_or(Error::EmptyResponse)?;

        tracing::debug!(model = %self.label, chars = choice.message.content.len(), "Model call completed.");
        Ok(choice.message.content)
    }
}
