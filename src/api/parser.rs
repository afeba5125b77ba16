//! Output coercion applied to raw generation text.

use super::error::PipelineError;
use super::runner::StageValue;
use super::schema::StructuredSchema;

/// How a pipeline turns generator output into its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputParser {
    /// Returns the generated text unchanged.
    Text,
    /// Strictly validates the output into a record of the given schema.
    Structured(StructuredSchema),
}

impl OutputParser {
    pub(crate) fn apply(&self, value: StageValue) -> Result<StageValue, PipelineError> {
        match (self, value) {
            (OutputParser::Text, StageValue::Text(text)) => Ok(StageValue::Text(text)),
            (OutputParser::Structured(schema), StageValue::Text(text)) => {
                Ok(StageValue::Record(schema.parse(&text)?))
            }
            (OutputParser::Structured(schema), StageValue::Record(record)) => {
                Ok(StageValue::Record(schema.validate(&record.to_value())?))
            }
            (OutputParser::Text, other) => Err(PipelineError::StageMismatch {
                stage: "parse",
                expected: "text",
                found: other.kind(),
            }),
            (OutputParser::Structured(_), other) => Err(PipelineError::StageMismatch {
                stage: "parse",
                expected: "text or record",
                found: other.kind(),
            }),
        }
    }
}

/// Extract JSON from text that might be wrapped in markdown code blocks or mixed with other text
pub fn extract_json_from_text(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        if let Some(end) = text[start + 7..].find("```") {
            return Some(text[start + 7..start + 7 + end].trim().to_string());
        }
    }

    if let Some(start) = text.find('{') {
        if let Some(end) = text.rfind('}') {
            if end > start {
                return Some(text[start..=end].trim().to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::schema::FieldType;

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(
            extract_json_from_text("sure: {\"a\": {\"b\": 1}} done").as_deref(),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert!(extract_json_from_text("no json here").is_none());
        assert!(extract_json_from_text("} backwards {").is_none());
    }

    #[test]
    fn test_text_parser_is_identity() {
        let out = OutputParser::Text
            .apply(StageValue::Text("  spaced \n".into()))
            .unwrap();
        assert_eq!(out, StageValue::Text("  spaced \n".into()));
    }

    #[test]
    fn test_text_parser_rejects_vars() {
        let err = OutputParser::Text
            .apply(StageValue::Vars(Default::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::StageMismatch { found: "vars", .. }
        ));
    }

    #[test]
    fn test_structured_parser_revalidates_records() {
        let schema = StructuredSchema::builder("Flag")
            .field("on", FieldType::BOOLEAN, "Whether it is on")
            .build()
            .unwrap();
        let parser = OutputParser::Structured(schema);
        let first = parser.apply(StageValue::Text("{\"on\": true}".into())).unwrap();
        let second = parser.apply(first.clone()).unwrap();
        assert_eq!(first, second);
    }
}
