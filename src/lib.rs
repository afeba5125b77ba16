pub mod api;
pub mod commands;
pub mod core;
pub mod cli;

pub use api::{Pipeline, PipelineError, PromptTemplate, StageValue, StructuredSchema};
