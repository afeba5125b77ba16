//! Sequential pipelines built from an explicit list of stages.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{
    error::PipelineError,
    llm_bridge::Generator,
    parser::OutputParser,
    schema::{StructuredRecord, StructuredSchema},
    template::{PromptTemplate, RenderedPrompt},
};

/// The value handed from one stage to the next.
#[derive(Debug, Clone, PartialEq)]
pub enum StageValue {
    /// Named inputs for a template.
    Vars(HashMap<String, String>),
    /// A rendered prompt awaiting generation.
    Prompt(RenderedPrompt),
    /// Raw or parsed text.
    Text(String),
    /// A validated structured record.
    Record(StructuredRecord),
}

impl StageValue {
    pub fn kind(&self) -> &'static str {
        match self {
            StageValue::Vars(_) => "vars",
            StageValue::Prompt(_) => "prompt",
            StageValue::Text(_) => "text",
            StageValue::Record(_) => "record",
        }
    }

    pub fn into_text(self) -> Result<String, PipelineError> {
        match self {
            StageValue::Text(text) => Ok(text),
            other => Err(PipelineError::StageMismatch {
                stage: "output",
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    pub fn into_record(self) -> Result<StructuredRecord, PipelineError> {
        match self {
            StageValue::Record(record) => Ok(record),
            other => Err(PipelineError::StageMismatch {
                stage: "output",
                expected: "record",
                found: other.kind(),
            }),
        }
    }
}

/// A single step of a pipeline.
#[derive(Clone)]
pub enum Stage {
    /// Renders a template against the incoming variables.
    Render(PromptTemplate),
    /// Calls a generator, optionally constrained to a schema.
    Generate {
        generator: Arc<dyn Generator>,
        schema: Option<StructuredSchema>,
    },
    /// Coerces generator output.
    Parse(OutputParser),
    /// Wraps the incoming value (or the output of `source` run on it) as `{key: value}`.
    Remap {
        key: String,
        source: Option<Pipeline>,
    },
    /// Runs another pipeline on the incoming value.
    Nested(Pipeline),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Render(_) => "render",
            Stage::Generate { .. } => "generate",
            Stage::Parse(_) => "parse",
            Stage::Remap { .. } => "remap",
            Stage::Nested(_) => "nested",
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Render(t) => f.debug_tuple("Render").field(&t.placeholders()).finish(),
            Stage::Generate { schema, .. } => f
                .debug_struct("Generate")
                .field("schema", &schema.as_ref().map(|s| s.name()))
                .finish(),
            Stage::Parse(p) => f.debug_tuple("Parse").field(p).finish(),
            Stage::Remap { key, source } => f
                .debug_struct("Remap")
                .field("key", key)
                .field("source", source)
                .finish(),
            Stage::Nested(p) => f.debug_tuple("Nested").field(p).finish(),
        }
    }
}

/// A fixed, linear composition of stages, reusable across runs.
///
/// Built fluently:
///
/// ```no_run
/// # use prompt_pipeline::api::{Pipeline, PromptTemplate, StubGenerator};
/// # use std::sync::Arc;
/// # async fn demo() -> Result<(), prompt_pipeline::PipelineError> {
/// let model = Arc::new(StubGenerator::default());
/// let chain = Pipeline::new("greet")
///     .render(PromptTemplate::from_template("Say hello to {name}"))
///     .generate(model)
///     .parse_text();
/// let text = chain.run_text([("name", "Alice")]).await?;
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct Pipeline {
    name: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Appends an arbitrary stage.
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn render(self, template: PromptTemplate) -> Self {
        self.stage(Stage::Render(template))
    }

    pub fn generate(self, generator: Arc<dyn Generator>) -> Self {
        self.stage(Stage::Generate {
            generator,
            schema: None,
        })
    }

    /// Generation constrained to `schema`, followed by strict validation.
    pub fn generate_structured(self, generator: Arc<dyn Generator>, schema: StructuredSchema) -> Self {
        self.stage(Stage::Generate {
            generator,
            schema: Some(schema.clone()),
        })
        .stage(Stage::Parse(OutputParser::Structured(schema)))
    }

    pub fn parse_text(self) -> Self {
        self.stage(Stage::Parse(OutputParser::Text))
    }

    pub fn parse_structured(self, schema: StructuredSchema) -> Self {
        self.stage(Stage::Parse(OutputParser::Structured(schema)))
    }

    /// Wraps the previous stage's output as `{key: output}`.
    pub fn remap(self, key: impl Into<String>) -> Self {
        self.stage(Stage::Remap {
            key: key.into(),
            source: None,
        })
    }

    /// Runs `source` on the incoming value and wraps its output as `{key: output}`.
    pub fn remap_from(self, key: impl Into<String>, source: Pipeline) -> Self {
        self.stage(Stage::Remap {
            key: key.into(),
            source: Some(source),
        })
    }

    /// Appends `next` as a single nested stage.
    pub fn then(self, next: Pipeline) -> Self {
        self.stage(Stage::Nested(next))
    }

    /// Runs the pipeline on an input mapping.
    pub async fn run(
        &self,
        vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Result<StageValue, PipelineError> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.run_value(StageValue::Vars(vars)).await
    }

    /// Runs the pipeline and expects text output.
    pub async fn run_text(
        &self,
        vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Result<String, PipelineError> {
        self.run(vars).await?.into_text()
    }

    /// Runs the pipeline and expects a structured record.
    pub async fn run_record(
        &self,
        vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Result<StructuredRecord, PipelineError> {
        self.run(vars).await?.into_record()
    }

    /// Evaluates every stage in order, aborting on the first failure.
    pub fn run_value(&self, input: StageValue) -> BoxFuture<'_, Result<StageValue, PipelineError>> {
        Box::pin(async move {
            let mut value = input;
            for (index, stage) in self.stages.iter().enumerate() {
                debug!(
                    pipeline = %self.name,
                    index,
                    stage = stage.name(),
                    input = value.kind(),
                    "running stage"
                );
                value = self.apply(stage, value).await?;
            }
            Ok(value)
        })
    }

    async fn apply(&self, stage: &Stage, value: StageValue) -> Result<StageValue, PipelineError> {
        match stage {
            Stage::Render(template) => match value {
                StageValue::Vars(vars) => Ok(StageValue::Prompt(template.render(&vars)?)),
                other => Err(mismatch("render", "vars", &other)),
            },
            Stage::Generate { generator, schema } => {
                let prompt = match value {
                    StageValue::Prompt(prompt) => prompt,
                    StageValue::Text(text) => RenderedPrompt::from_text(text),
                    other => return Err(mismatch("generate", "prompt or text", &other)),
                };
                let prompt = match schema {
                    Some(schema) => prompt.with_system(schema.instructions()),
                    None => prompt,
                };
                let raw = generator.generate(&prompt, schema.as_ref()).await?;
                Ok(StageValue::Text(raw))
            }
            Stage::Parse(parser) => parser.apply(value),
            Stage::Remap { key, source } => {
                let produced = match source {
                    Some(inner) => inner.run_value(value).await?,
                    None => value,
                };
                let mut vars = HashMap::new();
                vars.insert(key.clone(), remap_text(produced)?);
                Ok(StageValue::Vars(vars))
            }
            Stage::Nested(inner) => inner.run_value(value).await,
        }
    }
}

fn mismatch(stage: &'static str, expected: &'static str, found: &StageValue) -> PipelineError {
    PipelineError::StageMismatch {
        stage,
        expected,
        found: found.kind(),
    }
}

fn remap_text(value: StageValue) -> Result<String, PipelineError> {
    match value {
        StageValue::Text(text) => Ok(text),
        StageValue::Record(record) => Ok(record.to_value().to_string()),
        StageValue::Prompt(prompt) => Ok(prompt.text()),
        other => Err(mismatch("remap", "text, record or prompt", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::llm_bridge::StubGenerator;

    #[tokio::test]
    async fn test_empty_pipeline_returns_input() {
        let out = Pipeline::new("empty").run([("a", "1")]).await.unwrap();
        let mut expected = HashMap::new();
        expected.insert("a".to_string(), "1".to_string());
        assert_eq!(out, StageValue::Vars(expected));
    }

    #[tokio::test]
    async fn test_render_only_pipeline_yields_prompt() {
        let out = Pipeline::new("render")
            .render(PromptTemplate::from_template("Hi {who}"))
            .run([("who", "there")])
            .await
            .unwrap();
        assert_eq!(out, StageValue::Prompt(RenderedPrompt::from_text("Hi there")));
    }

    #[tokio::test]
    async fn test_remap_wraps_text() {
        let out = Pipeline::new("wrap")
            .render(PromptTemplate::from_template("{x}"))
            .generate(Arc::new(StubGenerator::new("done")))
            .parse_text()
            .remap("y")
            .run([("x", "1")])
            .await
            .unwrap();
        let mut expected = HashMap::new();
        expected.insert("y".to_string(), "done".to_string());
        assert_eq!(out, StageValue::Vars(expected));
    }

    #[tokio::test]
    async fn test_remap_of_vars_is_a_mismatch() {
        let err = Pipeline::new("bad").remap("y").run([("x", "1")]).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::StageMismatch { stage: "remap", found: "vars", .. }
        ));
    }

    #[tokio::test]
    async fn test_generate_from_bare_text() {
        let out = Pipeline::new("bare")
            .generate(Arc::new(StubGenerator::new("ok")))
            .run_value(StageValue::Text("question".into()))
            .await
            .unwrap();
        assert_eq!(out, StageValue::Text("ok".into()));
    }

    #[tokio::test]
    async fn test_run_text_on_prompt_output_fails() {
        let err = Pipeline::new("render")
            .render(PromptTemplate::from_template("static"))
            .run_text(Vec::<(String, String)>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::StageMismatch { found: "prompt", .. }));
    }
}
