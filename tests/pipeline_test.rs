use async_trait::async_trait;
use prompt_pipeline::api::{
    translate_then_summarize, Generator, Pipeline, PipelineError, PromptTemplate, RenderedPrompt,
    StageValue, StructuredSchema, StubGenerator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Echoes the rendered prompt back, recording every call.
#[derive(Default)]
struct RecordingGenerator {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(
        &self,
        prompt: &RenderedPrompt,
        _schema: Option<&StructuredSchema>,
    ) -> Result<String, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.text());
        Ok(format!("<{}>", prompt.text()))
    }
}

fn stage_a(generator: Arc<dyn Generator>) -> Pipeline {
    Pipeline::new("a")
        .render(PromptTemplate::from_template("Translate: {text}"))
        .generate(generator)
        .parse_text()
}

fn stage_b() -> Pipeline {
    Pipeline::new("b").remap("draft")
}

fn stage_c(generator: Arc<dyn Generator>) -> Pipeline {
    Pipeline::new("c")
        .render(PromptTemplate::from_template("Summarize: {draft}"))
        .generate(generator)
        .parse_text()
}

#[tokio::test]
async fn test_translate_then_summarize_with_stub_yields_stub_value() {
    let chain = translate_then_summarize(Arc::new(StubGenerator::new("STUB")));
    let out = chain.run_text([("text", "Hello world")]).await.unwrap();
    assert_eq!(out, "STUB");
}

#[tokio::test]
async fn test_translate_then_summarize_feeds_first_output_into_second_prompt() {
    let recorder = Arc::new(RecordingGenerator::default());
    let chain = translate_then_summarize(recorder.clone());
    chain.run_text([("text", "Hello world")]).await.unwrap();

    let prompts = recorder.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 2);
    assert_eq!(
        prompts[0],
        "Translate the following English text to Korean: Hello world"
    );
    assert_eq!(
        prompts[1],
        "Summarize the following text in 3 key bullet points in Korean:\n\n<Translate the following English text to Korean: Hello world>"
    );
}

#[tokio::test]
async fn test_missing_placeholder_never_reaches_generator() {
    let recorder = Arc::new(RecordingGenerator::default());
    let chain = translate_then_summarize(recorder.clone());
    let err = chain.run_text([("txt", "Hello world")]).await.unwrap_err();

    assert!(matches!(err, PipelineError::TemplateRender { placeholder } if placeholder == "text"));
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_composition_is_associative() {
    let generator: Arc<dyn Generator> = Arc::new(RecordingGenerator::default());
    let input = [("text", "Hello world")];

    let flat = stage_a(generator.clone())
        .remap("draft")
        .render(PromptTemplate::from_template("Summarize: {draft}"))
        .generate(generator.clone())
        .parse_text();
    let left = stage_a(generator.clone())
        .then(stage_b())
        .then(stage_c(generator.clone()));
    let right = stage_a(generator.clone()).then(stage_b().then(stage_c(generator.clone())));

    let flat = flat.run(input).await.unwrap();
    let left = left.run(input).await.unwrap();
    let right = right.run(input).await.unwrap();

    assert_eq!(flat, StageValue::Text("<Summarize: <Translate: Hello world>>".into()));
    assert_eq!(left, flat);
    assert_eq!(right, flat);
}

#[tokio::test]
async fn test_pipeline_is_reusable_across_runs() {
    let generator: Arc<dyn Generator> = Arc::new(RecordingGenerator::default());
    let chain = stage_a(generator);

    let first = chain.run_text([("text", "one")]).await.unwrap();
    let second = chain.run_text([("text", "two")]).await.unwrap();
    let again = chain.run_text([("text", "one")]).await.unwrap();

    assert_eq!(first, "<Translate: one>");
    assert_eq!(second, "<Translate: two>");
    assert_eq!(again, first);
}

#[tokio::test]
async fn test_stage_failure_aborts_run() {
    struct Failing;

    #[async_trait]
    impl Generator for Failing {
        async fn generate(
            &self,
            _prompt: &RenderedPrompt,
            _schema: Option<&StructuredSchema>,
        ) -> Result<String, PipelineError> {
            Err(PipelineError::ClientConstruction("offline".into()))
        }
    }

    let recorder = Arc::new(RecordingGenerator::default());
    let chain = stage_a(Arc::new(Failing)).then(stage_b()).then(stage_c(recorder.clone()));
    let err = chain.run([("text", "x")]).await.unwrap_err();

    assert!(matches!(err, PipelineError::ClientConstruction(_)));
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
}
