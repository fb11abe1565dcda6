//! Generative-text providers.
//!
//! The router depends only on [`TextGenerator`]; the registry picks a concrete
//! provider from the environment at startup.

mod error;
mod gemini;
mod openai;
mod provider;
mod registry;
mod types;

pub use error::LLMError;
pub use gemini::GeminiProvider;
pub use openai::OpenAICompatibleProvider;
pub use provider::{GenerateRequest, Provider, TextGenerator, UnconfiguredGenerator};
pub use registry::{ProviderRegistry, defaults};
