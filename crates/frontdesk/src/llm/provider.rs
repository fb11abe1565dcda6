//! Generator trait and provider identifiers.

use async_trait::async_trait;

use super::error::LLMError;

// ============================================================================
// Provider Enum
// ============================================================================

/// Supported generative providers, picked from the environment at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gemini,
    OpenAI,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAI => "openai",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TextGenerator Trait
// ============================================================================

/// One single-turn generation: a system instruction plus one user prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
}

impl GenerateRequest {
    pub fn new(
        model: impl Into<String>,
        system: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// A source of generated text.
///
/// Implementations return the generated text trimmed of surrounding whitespace.
/// An empty string is a valid result.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LLMError>;
}

/// Stand-in used when no provider credentials are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _request: GenerateRequest) -> Result<String, LLMError> {
        Err(LLMError::NotConfigured)
    }
}
