use std::sync::Arc;

use crate::api::{connect_or_stub, Generator, StubGenerator};
use crate::cli::Cmd;
use crate::core::config::{load_config, GeneratorConfig};

pub mod extract;
pub mod render;
pub mod translate;

/// Dispatches the parsed command to the appropriate handler.
pub async fn dispatch(command: Cmd) -> Result<(), String> {
    match command {
        Cmd::Translate {
            text,
            backend,
            stub,
        } => translate::run(&text, backend.as_deref(), stub).await,
        Cmd::Extract {
            file,
            text,
            schema,
            backend,
            stub,
        } => {
            extract::run(
                file.as_deref(),
                text.as_deref(),
                schema.as_deref(),
                backend.as_deref(),
                stub,
            )
            .await
        }
        Cmd::Render { template, vars } => render::run(&template, &vars),
    }
}

/// Resolves the generator config (file + `--backend` override) and connects,
/// substituting the stub when asked to or when the client cannot be built.
pub(crate) fn generator(backend: Option<&str>, stub: bool) -> Result<Arc<dyn Generator>, String> {
    if stub {
        return Ok(Arc::new(StubGenerator::default()));
    }
    let config = load_config().map_err(|e| e.to_string())?;
    let generator_config: GeneratorConfig = match backend {
        Some(spec) => config
            .generator
            .with_backend_spec(spec)
            .map_err(|e| e.to_string())?,
        None => config.generator,
    };
    Ok(connect_or_stub(&generator_config))
}
