//! OpenAI-compatible provider.
//!
//! Works with OpenAI, OpenRouter, Ollama, and other compatible APIs.

use async_trait::async_trait;
use reqwest::Client;

use super::error::LLMError;
use super::provider::{GenerateRequest, TextGenerator};
use super::types::{ChatRequest, ChatResponse, Message, Role};

/// OpenAI-compatible provider (works for OpenAI, OpenRouter, Ollama).
pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleProvider {
    #[must_use]
    pub fn new(client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn chat_request(request: GenerateRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(Message::text(Role::System, request.system));
        }
        messages.push(Message::text(Role::User, request.prompt));
        ChatRequest::new(request.model, messages)
    }
}

#[async_trait]
impl TextGenerator for OpenAICompatibleProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req.json(&Self::chat_request(request)).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LLMError::Api { status, message });
        }

        let body: ChatResponse = response.json().await?;
        response_text(body)
    }
}

fn response_text(response: ChatResponse) -> Result<String, LLMError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::NoContent("no choices".to_string()))?;
    Ok(choice.message.content_str().trim().to_string())
}
