use console::style;
use spinners::{Spinner, Spinners};

use crate::api::translate_then_summarize;

/// Translate English text to Korean and print a three-point summary.
pub async fn run(text: &str, backend: Option<&str>, stub: bool) -> Result<(), String> {
    let generator = super::generator(backend, stub)?;
    let chain = translate_then_summarize(generator);

    let mut sp = Spinner::new(Spinners::Dots9, "Waiting for LLM response...".into());
    let result = chain.run_text([("text", text)]).await;
    match result {
        Ok(summary) => {
            sp.stop_with_message("✔ Response received.".into());
            println!("\n{}", summary);
            Ok(())
        }
        Err(e) => {
            sp.stop_with_message(format!("{}", style("✘ Pipeline failed.").red()));
            Err(e.to_string())
        }
    }
}
