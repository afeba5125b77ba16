//! High-level fluent API for composing and running generation pipelines.

mod error;
mod llm_bridge;
mod parser;
mod presets;
mod runner;
mod schema;
mod template;

pub use error::{ConfigError, PipelineError};
pub use llm_bridge::{
    connect_or_stub, default_api_key_env, Generator, LlmGenerator, StubGenerator, STUB_REPLY,
};
pub use parser::{extract_json_from_text, OutputParser};
pub use presets::{resume_extraction, resume_schema, translate_then_summarize, Resume};
pub use runner::{Pipeline, Stage, StageValue};
pub use schema::{FieldSpec, FieldType, Primitive, SchemaBuilder, StructuredRecord, StructuredSchema};
pub use template::{Message, PromptTemplate, RenderedPrompt, Role};
