use crate::api::PromptTemplate;
use crate::core::utils::parse_vars;

/// Render a template with variables and print it to stdout.
pub fn run(template: &str, vars: &[String]) -> Result<(), String> {
    let map = parse_vars(vars);
    let rendered = PromptTemplate::from_template(template)
        .render(&map)
        .map_err(|e| e.to_string())?;

    println!("{}", rendered);
    Ok(())
}
