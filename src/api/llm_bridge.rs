//! Bridge types for interoperability with the `llm` crate.
//!
//! Pipelines talk to a [`Generator`], which is either the network-backed
//! [`LlmGenerator`] or a [`StubGenerator`] that always answers the same text.

use async_trait::async_trait;
use console::style;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::{ChatMessage, StructuredOutputFormat};
use llm::error::LLMError;
use llm::LLMProvider;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::PipelineError;
use super::schema::StructuredSchema;
use super::template::{RenderedPrompt, Role};
use crate::core::config::GeneratorConfig;

/// Reply returned by the stub substituted for an unreachable backend.
pub const STUB_REPLY: &str = "This is a dummy response from a fake model.";

/// Anything that can turn a rendered prompt into raw text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produces raw output for `prompt`, biased towards `schema` when given.
    async fn generate(
        &self,
        prompt: &RenderedPrompt,
        schema: Option<&StructuredSchema>,
    ) -> Result<String, PipelineError>;
}

/// Deterministic generator returning a fixed reply for every call.
#[derive(Debug, Clone)]
pub struct StubGenerator {
    reply: String,
}

impl StubGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::new(STUB_REPLY)
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(
        &self,
        _prompt: &RenderedPrompt,
        _schema: Option<&StructuredSchema>,
    ) -> Result<String, PipelineError> {
        Ok(self.reply.clone())
    }
}

/// Standard API-key variable for a backend, if it needs one.
pub fn default_api_key_env(backend: &LLMBackend) -> Option<&'static str> {
    match backend {
        LLMBackend::OpenAI => Some("OPENAI_API_KEY"),
        LLMBackend::Anthropic => Some("ANTHROPIC_API_KEY"),
        LLMBackend::Google => Some("GOOGLE_API_KEY"),
        LLMBackend::Groq => Some("GROQ_API_KEY"),
        LLMBackend::XAI => Some("XAI_API_KEY"),
        LLMBackend::Cohere => Some("COHERE_API_KEY"),
        LLMBackend::DeepSeek => Some("DEEPSEEK_API_KEY"),
        LLMBackend::Mistral => Some("MISTRAL_API_KEY"),
        _ => None,
    }
}

/// Connection settings kept so per-call providers can be rebuilt.
#[derive(Debug, Clone)]
struct ProviderSettings {
    backend: String,
    model: String,
    api_key: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ProviderSettings {
    fn build(
        &self,
        system: Option<String>,
        schema: Option<&StructuredSchema>,
    ) -> Result<Box<dyn LLMProvider>, LLMError> {
        let backend = LLMBackend::from_str(&self.backend)
            .map_err(|_| LLMError::InvalidRequest(format!("Unknown provider: {}", self.backend)))?;
        let mut builder = LLMBuilder::new().backend(backend).model(&self.model);

        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(system) = system {
            builder = builder.system(system);
        }
        if let Some(schema) = schema {
            builder = builder.schema(StructuredOutputFormat::from(schema));
        }

        builder.build()
    }
}

/// Generator backed by a live `llm` provider.
///
/// Prompts with system messages or a schema get a provider built for that
/// call, since the `llm` builder binds both at construction time.
pub struct LlmGenerator {
    settings: ProviderSettings,
    provider: Box<dyn LLMProvider>,
}

impl LlmGenerator {
    /// Builds the provider described by `config`, reading its API key from the environment.
    pub fn new(config: &GeneratorConfig) -> Result<Self, PipelineError> {
        let backend = LLMBackend::from_str(&config.backend).map_err(|_| {
            PipelineError::ClientConstruction(format!("Unknown provider: {}", config.backend))
        })?;

        let key_var = config
            .api_key_env
            .clone()
            .or_else(|| default_api_key_env(&backend).map(str::to_string));
        let api_key = match key_var {
            Some(var) => Some(env::var(&var).map_err(|_| {
                PipelineError::ClientConstruction(format!(
                    "API key env var '{}' not found.",
                    var
                ))
            })?),
            None => None,
        };

        let settings = ProviderSettings {
            backend: config.backend.clone(),
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };
        let provider = settings
            .build(None, None)
            .map_err(|e| PipelineError::ClientConstruction(e.to_string()))?;

        Ok(Self { settings, provider })
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(
        &self,
        prompt: &RenderedPrompt,
        schema: Option<&StructuredSchema>,
    ) -> Result<String, PipelineError> {
        let messages: Vec<ChatMessage> = prompt
            .messages()
            .iter()
            .filter_map(|m| match m.role {
                Role::System => None,
                Role::Human => Some(ChatMessage::user().content(&m.content).build()),
                Role::Assistant => Some(ChatMessage::assistant().content(&m.content).build()),
            })
            .collect();

        let system = prompt.system_text();
        let scoped = if system.is_some() || schema.is_some() {
            Some(self.settings.build(system, schema)?)
        } else {
            None
        };
        let provider: &dyn LLMProvider = match &scoped {
            Some(p) => p.as_ref(),
            None => self.provider.as_ref(),
        };

        debug!(
            backend = %self.settings.backend,
            model = %self.settings.model,
            messages = messages.len(),
            structured = schema.is_some(),
            "sending prompt"
        );
        let resp = provider.chat(&messages).await?;
        Ok(resp.text().unwrap_or_default())
    }
}

impl From<&StructuredSchema> for StructuredOutputFormat {
    fn from(schema: &StructuredSchema) -> Self {
        StructuredOutputFormat {
            name: schema.name().to_string(),
            description: Some(schema.description().to_string()),
            schema: Some(schema.to_json_schema()),
            strict: Some(schema.all_required()),
        }
    }
}

/// Tries to build the live client; on failure, reports why and returns a stub.
pub fn connect_or_stub(config: &GeneratorConfig) -> Arc<dyn Generator> {
    match LlmGenerator::new(config) {
        Ok(generator) => Arc::new(generator),
        Err(e) => {
            warn!(error = %e, backend = %config.backend, "falling back to stub generator");
            eprintln!(
                "{}",
                style(format!("Error while initialising the model: {}", e)).yellow()
            );
            eprintln!(
                "{}",
                style("Check that the provider's API key environment variable is set. Continuing with a stub model.").yellow()
            );
            Arc::new(StubGenerator::default())
        }
    }
}
