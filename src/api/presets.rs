//! Ready-made pipelines: translate-then-summarize and resume extraction.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::llm_bridge::Generator;
use super::runner::Pipeline;
use super::schema::{FieldType, StructuredSchema};
use super::template::{PromptTemplate, Role};

const TRANSLATE_PROMPT: &str = "Translate the following English text to Korean: {text}";
const SUMMARIZE_PROMPT: &str =
    "Summarize the following text in 3 key bullet points in Korean:\n\n{korean_text}";
const EXTRACT_SYSTEM_PROMPT: &str = "You are an expert at extracting information from unstructured text and formatting it into a structured JSON object. Your output must strictly conform to the provided JSON schema.";
const EXTRACT_HUMAN_PROMPT: &str =
    "Please extract the required information from the following text:\n\n{resume_text}";

/// `{"text"}` → Korean translation → `{"korean_text"}` → three-bullet summary.
pub fn translate_then_summarize(generator: Arc<dyn Generator>) -> Pipeline {
    let translate = Pipeline::new("translate")
        .render(PromptTemplate::from_template(TRANSLATE_PROMPT))
        .generate(Arc::clone(&generator))
        .parse_text();

    Pipeline::new("translate-then-summarize")
        .remap_from("korean_text", translate)
        .render(PromptTemplate::from_template(SUMMARIZE_PROMPT))
        .generate(generator)
        .parse_text()
}

/// Key facts pulled out of a free-form resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub name: String,
    pub contact_email: String,
    pub total_experience_years: i64,
    pub skills: Vec<String>,
}

pub fn resume_schema() -> StructuredSchema {
    StructuredSchema::builder("Resume")
        .description("Extracts key information from a resume text.")
        .field("name", FieldType::STRING, "Candidate's full name")
        .field("contact_email", FieldType::STRING, "Candidate's email address")
        .field(
            "total_experience_years",
            FieldType::INTEGER,
            "Total years of professional experience, calculated as an integer",
        )
        .field(
            "skills",
            FieldType::STRING_LIST,
            "List of key technical or professional skills mentioned",
        )
        .build()
        .expect("resume schema field names are unique")
}

/// `{"resume_text"}` → system + human prompt → schema-bound generation → record.
pub fn resume_extraction(generator: Arc<dyn Generator>, schema: StructuredSchema) -> Pipeline {
    let prompt = PromptTemplate::from_messages([
        (Role::System, EXTRACT_SYSTEM_PROMPT),
        (Role::Human, EXTRACT_HUMAN_PROMPT),
    ]);

    Pipeline::new("structured-extraction")
        .render(prompt)
        .generate_structured(generator, schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_pipeline_shape() {
        let pipeline = translate_then_summarize(Arc::new(crate::api::StubGenerator::default()));
        let names: Vec<&str> = pipeline.stages().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["remap", "render", "generate", "parse"]);
    }

    #[test]
    fn test_resume_schema_fields() {
        let schema = resume_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["name", "contact_email", "total_experience_years", "skills"]
        );
        assert!(schema.all_required());
    }
}
