//! Google Gemini provider using the `generateContent` REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::LLMError;
use super::provider::{GenerateRequest, TextGenerator};

/// Gemini provider with native API format.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LLMError> {
        let url = self.endpoint(&request.model);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&Request::from(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LLMError::Api { status, message });
        }

        let body: Response = response.json().await?;
        body.into_text()
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct Request {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

impl From<GenerateRequest> for Request {
    fn from(request: GenerateRequest) -> Self {
        let system_instruction = (!request.system.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part {
                text: Some(request.system),
            }],
        });
        Self {
            system_instruction,
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl Response {
    /// Concatenated text of the first candidate, trimmed.
    fn into_text(self) -> Result<String, LLMError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(LLMError::NoContent(reason));
        };

        let Some(content) = candidate.content.filter(|c| !c.parts.is_empty()) else {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "empty candidate".to_string());
            return Err(LLMError::NoContent(reason));
        };

        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Ok(text.trim().to_string())
    }
}
