use chrono::{ DateTime, Utc };
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::VecDeque;

use crate::models::chat::ChatMessage;

pub const MAX_PAST_QUESTIONS: usize = 20;
pub const SUMMARY_QUESTION_COUNT: usize = 5;

lazy_static! {
    // Tried in order; the first pattern that matches decides the name.
    static ref NAME_PATTERNS: [Regex; 3] = [
        Regex::new(r"(?i:my name is)\s+([A-Za-z\-']{2,50})").unwrap(),
        Regex::new(r"(?i:i'm)\s+([A-Za-z\-']{2,50})").unwrap(),
        Regex::new(r"(?i:i am)\s+([A-Za-z\-']{2,50})").unwrap(),
    ];
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PastQuestion {
    pub text: String,
    pub time: DateTime<Utc>,
}

/// What the session has learned about the user so far.
#[derive(Clone, Debug, Default)]
pub struct ConversationContext {
    user_name: Option<String>,
    past_questions: VecDeque<PastQuestion>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn past_questions(&self) -> impl Iterator<Item = &PastQuestion> {
        self.past_questions.iter()
    }

    pub fn question_count(&self) -> usize {
        self.past_questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_name.is_none() && self.past_questions.is_empty()
    }

    /// Looks for a name declaration ("my name is X", "I'm X", "I am X") and
    /// remembers it. Returns the detected name.
    pub fn update_from_message(&mut self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }

        let name = NAME_PATTERNS.iter()
            .find_map(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())?;

        self.user_name = Some(name.clone());
        Some(name)
    }

    pub fn add_user_question(&mut self, text: &str) {
        self.add_user_question_at(text, Utc::now());
    }

    pub fn add_user_question_at(&mut self, text: &str, time: DateTime<Utc>) {
        if text.is_empty() {
            return;
        }
        self.past_questions.push_back(PastQuestion { text: text.to_string(), time });
        while self.past_questions.len() > MAX_PAST_QUESTIONS {
            self.past_questions.pop_front();
        }
    }

    /// Summarises the name and the most recent questions as an extra system message.
    pub fn build_system_message(&self) -> Option<ChatMessage> {
        let mut parts = Vec::new();

        if let Some(name) = &self.user_name {
            parts.push(format!("user_name: {}", name));
        }

        if !self.past_questions.is_empty() {
            let skip = self.past_questions.len().saturating_sub(SUMMARY_QUESTION_COUNT);
            let recent = self.past_questions
                .iter()
                .skip(skip)
                .map(|q| q.text.as_str())
                .collect::<Vec<_>>()
                .join(" || ");
            parts.push(format!("recent_user_questions: {}\n", recent));
        }

        if parts.is_empty() {
            return None;
        }

        Some(ChatMessage::system(format!("Conversation context:\n{}", parts.join("\n"))))
    }
}
