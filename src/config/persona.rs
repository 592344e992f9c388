use serde::Deserialize;
use std::fs;
use std::path::Path;
use log::info;

use crate::error::PersonaError;

const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../../prompts/persona.txt");
const DEFAULT_GREETING: &str = "👋 Hello! How can I help you today?";
const DEFAULT_NAME_ACKNOWLEDGEMENT: &str = "Nice to meet you, {name}! How can I help today?";
const DEFAULT_FALLBACK_REPLY: &str = "Sorry, I couldn't reach the API. Please try again later.";

/// Fixed texts that shape the assistant: its system prompt and the canned UI replies.
///
/// A persona file only needs the keys it overrides.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PersonaConfig {
    pub system_prompt: String,
    pub greeting: String,
    /// `{name}` is replaced with the detected user name.
    pub name_acknowledgement: String,
    pub fallback_reply: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.trim_end().to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            name_acknowledgement: DEFAULT_NAME_ACKNOWLEDGEMENT.to_string(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
        }
    }
}

impl PersonaConfig {
    pub fn acknowledge_name(&self, name: &str) -> String {
        self.name_acknowledgement.replace("{name}", name)
    }
}

pub fn load_persona<P: AsRef<Path>>(path: P) -> Result<PersonaConfig, PersonaError> {
    let file_content = fs::read_to_string(&path)?;
    let config: PersonaConfig = serde_json::from_str(&file_content)?;
    info!("Loaded persona from {}", path.as_ref().display());
    Ok(config)
}

/// Built-in persona unless a file path is given.
pub fn resolve_persona(path: Option<&str>) -> Result<PersonaConfig, PersonaError> {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => load_persona(p),
        None => Ok(PersonaConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_persona_is_the_beauty_specialist() {
        let persona = PersonaConfig::default();
        assert!(persona.system_prompt.starts_with("You are a virtual beauty specialist"));
        assert!(!persona.system_prompt.ends_with('\n'));
        assert_eq!(persona.acknowledge_name("Alex"), "Nice to meet you, Alex! How can I help today?");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let path = std::env::temp_dir().join(format!("persona-{}.json", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{ "greeting": "Welcome back!" }}"#).unwrap();

        let persona = resolve_persona(path.to_str()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(persona.greeting, "Welcome back!");
        assert_eq!(persona.fallback_reply, PersonaConfig::default().fallback_reply);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = resolve_persona(Some("/nonexistent/persona.json")).unwrap_err();
        assert!(matches!(err, PersonaError::Io(_)));
    }

    #[test]
    fn blank_path_uses_defaults() {
        assert_eq!(resolve_persona(Some("  ")).unwrap(), PersonaConfig::default());
    }
}
