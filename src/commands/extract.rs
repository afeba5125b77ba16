use console::style;
use serde_json::Value;
use spinners::{Spinner, Spinners};
use std::fs;
use std::path::Path;

use crate::api::{resume_extraction, resume_schema};
use crate::core::config::load_schema;

/// Extract a structured record from a file or inline text and print it.
pub async fn run(
    file: Option<&str>,
    text: Option<&str>,
    schema_path: Option<&str>,
    backend: Option<&str>,
    stub: bool,
) -> Result<(), String> {
    let input = match (file, text) {
        (Some(path), _) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?,
        (None, Some(text)) => text.to_string(),
        (None, None) => return Err("Provide either --file or --text".to_string()),
    };

    let schema = match schema_path {
        Some(path) => load_schema(Path::new(path)).map_err(|e| e.to_string())?,
        None => resume_schema(),
    };

    let generator = super::generator(backend, stub)?;
    let chain = resume_extraction(generator, schema);

    let mut sp = Spinner::new(Spinners::Dots9, "Waiting for LLM response...".into());
    let record = match chain.run_record([("resume_text", input)]).await {
        Ok(record) => {
            sp.stop_with_message("✔ Response received.".into());
            record
        }
        Err(e) => {
            sp.stop_with_message(format!("{}", style("✘ Extraction failed.").red()));
            return Err(e.to_string());
        }
    };

    println!("\n{}", style(format!("--- Extracted {} ---", record.schema_name())).bold());
    let pretty = serde_json::to_string_pretty(&record.to_value()).map_err(|e| e.to_string())?;
    println!("{}", pretty);

    println!("\n{}", style("--- Fields ---").bold());
    for (name, value) in record.fields() {
        let shown = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("{}: {}", style(name).cyan(), shown);
    }

    Ok(())
}
