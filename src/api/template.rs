//! Prompt templates with `{name}` placeholders.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::error::PipelineError;

/// Matches escaped braces or a `{identifier}` placeholder.
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap())
}

/// Author of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
    Assistant,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Role::System),
            "human" | "user" => Ok(Role::Human),
            "assistant" | "ai" => Ok(Role::Assistant),
            other => Err(format!("Unknown message role '{}'", other)),
        }
    }
}

/// A single rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The output of rendering a [`PromptTemplate`], ready to hand to a generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPrompt {
    messages: Vec<Message>,
}

impl RenderedPrompt {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Wraps plain text as a single human message.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Message {
            role: Role::Human,
            content: text.into(),
        }])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns a copy with an extra system message appended at the end.
    pub fn with_system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role: Role::System,
            content: content.into(),
        });
        self
    }

    /// All system messages joined in order, if there are any.
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Every message's content joined by blank lines.
    pub fn text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for RenderedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// An immutable, reusable prompt made of one or more message templates.
///
/// Placeholders are written `{name}`; `{{` and `}}` produce literal braces.
/// Rendering fails if any referenced placeholder is missing from the mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    messages: Vec<(Role, String)>,
    placeholders: Vec<String>,
}

impl PromptTemplate {
    /// Creates a template consisting of a single human message.
    pub fn from_template(template: impl Into<String>) -> Self {
        Self::from_messages([(Role::Human, template)])
    }

    /// Creates a chat template from ordered `(role, template)` pairs.
    pub fn from_messages(
        messages: impl IntoIterator<Item = (Role, impl Into<String>)>,
    ) -> Self {
        let messages: Vec<(Role, String)> = messages
            .into_iter()
            .map(|(role, content)| (role, content.into()))
            .collect();

        let mut placeholders: Vec<String> = Vec::new();
        for (_, content) in &messages {
            for caps in placeholder_re().captures_iter(content) {
                if let Some(name) = caps.get(1) {
                    if !placeholders.iter().any(|p| p == name.as_str()) {
                        placeholders.push(name.as_str().to_string());
                    }
                }
            }
        }

        Self {
            messages,
            placeholders,
        }
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Substitutes every placeholder with its value from `vars`.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<RenderedPrompt, PipelineError> {
        if let Some(missing) = self.placeholders.iter().find(|p| !vars.contains_key(*p)) {
            return Err(PipelineError::TemplateRender {
                placeholder: missing.clone(),
            });
        }

        let messages = self
            .messages
            .iter()
            .map(|(role, content)| Message {
                role: *role,
                content: substitute(content, vars),
            })
            .collect();

        Ok(RenderedPrompt::new(messages))
    }
}

fn substitute(template: &str, vars: &HashMap<String, String>) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures| match caps.get(1) {
            Some(name) => vars
                .get(name.as_str())
                .cloned()
                .unwrap_or_default(),
            None if &caps[0] == "{{" => "{".to_string(),
            None => "}".to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_placeholders_in_first_appearance_order() {
        let tpl = PromptTemplate::from_messages([
            (Role::System, "You speak {lang}."),
            (Role::Human, "{text} then {lang} again, {{literal}}"),
        ]);
        assert_eq!(tpl.placeholders(), &["lang".to_string(), "text".to_string()]);
    }

    #[test]
    fn test_render_substitutes_verbatim() {
        let tpl = PromptTemplate::from_template("Translate the following English text to Korean: {text}");
        let out = tpl.render(&vars(&[("text", "Hello {world}")])).unwrap();
        assert_eq!(
            out.text(),
            "Translate the following English text to Korean: Hello {world}"
        );
    }

    #[test]
    fn test_render_missing_placeholder_fails() {
        let tpl = PromptTemplate::from_template("Summarize: {korean_text}");
        let err = tpl.render(&vars(&[("text", "x")])).unwrap_err();
        match err {
            PipelineError::TemplateRender { placeholder } => assert_eq!(placeholder, "korean_text"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_escaped_braces_render_literally() {
        let tpl = PromptTemplate::from_template("{{\"name\": \"{name}\"}}");
        assert_eq!(tpl.placeholders(), &["name".to_string()]);
        let out = tpl.render(&vars(&[("name", "Kim")])).unwrap();
        assert_eq!(out.text(), "{\"name\": \"Kim\"}");
    }

    #[test]
    fn test_system_text_collects_system_messages() {
        let tpl = PromptTemplate::from_messages([
            (Role::System, "Be strict."),
            (Role::Human, "{q}"),
        ]);
        let out = tpl
            .render(&vars(&[("q", "why?")]))
            .unwrap()
            .with_system("Reply in JSON.");
        assert_eq!(out.system_text().as_deref(), Some("Be strict.\n\nReply in JSON."));
        assert_eq!(out.messages().len(), 3);
    }

    #[test]
    fn test_role_from_str_aliases() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::Human);
        assert_eq!("AI".parse::<Role>().unwrap(), Role::Assistant);
        assert!("robot".parse::<Role>().is_err());
    }
}
