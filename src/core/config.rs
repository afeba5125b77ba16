//! Manages the loading of generator configuration and schema files.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::{ConfigError, FieldSpec, StructuredSchema};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "PROMPT_PIPELINE_CONFIG";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Which backend and model to generate with.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Overrides the backend's standard API-key variable.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

fn default_backend() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: default_model(),
            api_key_env: None,
            base_url: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl GeneratorConfig {
    /// Applies a `provider:model` override, e.g. `anthropic:claude-3-5-sonnet-20240620`.
    pub fn with_backend_spec(mut self, spec: &str) -> Result<Self, ConfigError> {
        let (provider, model) = spec
            .split_once(':')
            .filter(|(p, m)| !p.is_empty() && !m.is_empty())
            .ok_or_else(|| ConfigError::Backend(spec.to_string()))?;
        self.backend = provider.to_string();
        self.model = model.to_string();
        Ok(self)
    }
}

/// Default config location: `$PROMPT_PIPELINE_CONFIG`, else `~/.prompt-pipeline/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".prompt-pipeline").join("config.toml"))
}

/// Loads the configuration, falling back to defaults when no file exists.
pub fn load_config() -> Result<Config, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[derive(Deserialize, Debug)]
struct SchemaFile {
    name: String,
    #[serde(default)]
    description: String,
    fields: Vec<FieldSpec>,
}

/// Loads a record schema from a YAML file.
pub fn load_schema(path: &Path) -> Result<StructuredSchema, ConfigError> {
    let content = fs::read_to_string(path)?;
    let file: SchemaFile = serde_yaml::from_str(&content)?;
    Ok(StructuredSchema::new(file.name, file.description, file.fields)?)
}
