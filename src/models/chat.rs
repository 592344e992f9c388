use serde::{ Serialize, Deserialize };
use serde_json::Value;

use crate::error::ClientError;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_CLIENT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Body the conversation client posts to the relay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: Some(DEFAULT_CLIENT_MAX_TOKENS),
            temperature: DEFAULT_TEMPERATURE,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Pulls the first choice's content out of a chat-completion body, trimmed.
pub fn extract_reply(body: &Value) -> Result<String, ClientError> {
    let completion = ChatCompletion::deserialize(body).map_err(|e|
        ClientError::MalformedResponse(format!("unexpected completion shape: {}", e))
    )?;

    let choice = completion.choices
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::MalformedResponse("response has no choices".to_string()))?;

    choice.message.content
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ClientError::MalformedResponse("first choice has no content".to_string()))
}
