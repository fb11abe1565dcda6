//! Provider selection from environment variables.

use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use super::gemini::GeminiProvider;
use super::openai::OpenAICompatibleProvider;
use super::provider::{Provider, TextGenerator, UnconfiguredGenerator};

/// Default base URLs and models for each provider.
pub mod defaults {
    pub const GEMINI: &str = "https://generativelanguage.googleapis.com";
    pub const GEMINI_MODEL: &str = "gemini-1.5-flash";
    pub const OPENAI: &str = "https://api.openai.com/v1";
    pub const OPENAI_MODEL: &str = "gpt-4o-mini";
}

#[derive(Debug, Clone)]
struct Credentials {
    provider: Provider,
    api_key: String,
    base_url: String,
    model: String,
}

/// Chooses the generative provider once at startup.
///
/// Gemini is preferred when `GEMINI_API_KEY` is set, then any OpenAI-compatible
/// endpoint via `OPENAI_API_KEY`. With neither, the registry hands out a generator
/// that always reports "not configured".
///
/// The registry holds a shared `reqwest::Client` so all calls reuse connections.
#[derive(Clone)]
pub struct ProviderRegistry {
    credentials: Option<Credentials>,
    client: Client,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self {
            credentials: None,
            client: Client::new(),
        }
    }
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the registry from process environment variables.
    pub fn from_env() -> Self {
        let registry = Self::from_vars(|name| std::env::var(name).ok());
        match &registry.credentials {
            Some(c) => info!(provider = %c.provider, model = %c.model, "Generative provider configured"),
            None => warn!(
                "No generative provider configured. \
                Set GEMINI_API_KEY or OPENAI_API_KEY to enable generated replies."
            ),
        }
        registry
    }

    /// Initialize the registry from an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| var(name).filter(|v| !v.is_empty());

        let credentials = if let Some(api_key) = var("GEMINI_API_KEY") {
            Some(Credentials {
                provider: Provider::Gemini,
                api_key,
                base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| defaults::GEMINI.to_string()),
                model: var("GEMINI_MODEL").unwrap_or_else(|| defaults::GEMINI_MODEL.to_string()),
            })
        } else {
            var("OPENAI_API_KEY").map(|api_key| Credentials {
                provider: Provider::OpenAI,
                api_key,
                base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| defaults::OPENAI.to_string()),
                model: var("OPENAI_MODEL").unwrap_or_else(|| defaults::OPENAI_MODEL.to_string()),
            })
        };

        Self {
            credentials,
            client: Client::new(),
        }
    }

    /// The selected provider, if any.
    pub fn provider(&self) -> Option<Provider> {
        self.credentials.as_ref().map(|c| c.provider)
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Model used when `settings.model` is unset.
    pub fn default_model(&self) -> &str {
        self.credentials
            .as_ref()
            .map(|c| c.model.as_str())
            .unwrap_or(defaults::GEMINI_MODEL)
    }

    /// Build the generator for the selected provider.
    pub fn generator(&self) -> Arc<dyn TextGenerator> {
        let Some(c) = &self.credentials else {
            return Arc::new(UnconfiguredGenerator);
        };
        match c.provider {
            Provider::Gemini => Arc::new(GeminiProvider::new(
                self.client.clone(),
                c.api_key.clone(),
                c.base_url.clone(),
            )),
            Provider::OpenAI => Arc::new(OpenAICompatibleProvider::new(
                self.client.clone(),
                c.base_url.clone(),
                Some(c.api_key.clone()),
            )),
        }
    }
}
