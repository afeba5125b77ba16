//! Error types for the library API.

use llm::error::LLMError;
use thiserror::Error;

/// Errors raised while building or running a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The generation client could not be built (unknown backend, missing credential...).
    #[error("Failed to construct generation client: {0}")]
    ClientConstruction(String),

    /// A placeholder referenced by a template was absent from the input mapping.
    #[error("Missing value for template placeholder '{placeholder}'")]
    TemplateRender { placeholder: String },

    /// The generation output could not be mapped onto the declared schema.
    #[error("Output does not conform to schema: {0}")]
    SchemaConformance(String),

    /// A schema declaration broke one of its invariants.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A stage received a value of a kind it cannot consume.
    #[error("Stage '{stage}' expected {expected} but received {found}")]
    StageMismatch {
        stage: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// An error originating from the underlying LLM backend.
    #[error("LLM backend error: {0}")]
    Generation(#[from] LLMError),
}

/// Errors related to loading configuration and schema files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An underlying file I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML configuration file could not be parsed.
    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A YAML schema file could not be parsed.
    #[error("Failed to parse schema file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `provider:model` backend specification was malformed.
    #[error("Invalid backend '{0}'. Use 'provider:model'")]
    Backend(String),

    /// The parsed schema file declared an invalid schema.
    #[error(transparent)]
    Schema(#[from] PipelineError),
}
