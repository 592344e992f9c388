use log::{ info, error };
use std::sync::Arc;
use uuid::Uuid;

use super::context::ConversationContext;
use super::transport::RelayTransport;
use crate::config::persona::PersonaConfig;
use crate::error::ClientError;
use crate::models::chat::{ extract_reply, ChatMessage, ChatRequest, DEFAULT_CHAT_MODEL, DEFAULT_CLIENT_MAX_TOKENS, DEFAULT_TEMPERATURE };

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            max_tokens: DEFAULT_CLIENT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Accumulated turns of the session, seeded with the persona system message.
/// Grows by one user and one assistant entry per successful exchange.
#[derive(Clone, Debug)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(system_prompt: &str) -> Self {
        Self { messages: vec![ChatMessage::system(system_prompt)] }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push_exchange(&mut self, user: &str, assistant: &str) {
        self.messages.push(ChatMessage::user(user));
        self.messages.push(ChatMessage::assistant(assistant));
    }
}

/// One user's chat session: owns the rolling context and the transcript.
///
/// Every call that talks to the relay takes `&mut self`, so a session never has
/// more than one request in flight.
pub struct ChatSession {
    id: String,
    persona: PersonaConfig,
    options: SessionOptions,
    context: ConversationContext,
    transcript: Transcript,
    transport: Arc<dyn RelayTransport>,
}

impl ChatSession {
    pub fn new(
        persona: PersonaConfig,
        options: SessionOptions,
        transport: Arc<dyn RelayTransport>
    ) -> Self {
        let transcript = Transcript::new(&persona.system_prompt);
        let id = Uuid::new_v4().to_string();
        info!("Started chat session {}", id);
        Self {
            id,
            persona,
            options,
            context: ConversationContext::new(),
            transcript,
            transport,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn greeting(&self) -> ChatMessage {
        ChatMessage::assistant(self.persona.greeting.clone())
    }

    /// Transcript so far, then the context summary if any, then the new user turn.
    pub fn build_outgoing_messages(&self, message: &str) -> Vec<ChatMessage> {
        let mut messages = self.transcript.messages().to_vec();
        if let Some(context_msg) = self.context.build_system_message() {
            messages.push(context_msg);
        }
        messages.push(ChatMessage::user(message));
        messages
    }

    /// Sends one user message through the relay and returns the trimmed reply.
    /// The exchange is added to the transcript only on success.
    pub async fn send_message(&mut self, message: &str) -> Result<String, ClientError> {
        self.transport.ensure_configured()?;

        let request = ChatRequest::new(self.options.model.clone(), self.build_outgoing_messages(message))
            .with_max_tokens(self.options.max_tokens)
            .with_temperature(self.options.temperature);

        let body = self.transport.post_chat(&request).await?;
        let reply = extract_reply(&body)?;

        self.transcript.push_exchange(message, &reply);
        Ok(reply)
    }

    /// Handles one submission from the user and returns the messages to display.
    ///
    /// Errors never escape: a failed exchange is shown as the persona's fallback reply.
    pub async fn submit(&mut self, input: &str) -> Vec<ChatMessage> {
        let text = input.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let mut rendered = vec![ChatMessage::user(text)];

        self.context.add_user_question(text);
        if let Some(name) = self.context.update_from_message(text) {
            rendered.push(ChatMessage::assistant(self.persona.acknowledge_name(&name)));
        }

        match self.send_message(text).await {
            Ok(reply) => rendered.push(ChatMessage::assistant(reply)),
            Err(e) => {
                error!("Session {}: chat request failed: {}", self.id, e);
                rendered.push(ChatMessage::assistant(self.persona.fallback_reply.clone()));
            }
        }

        rendered
    }
}
