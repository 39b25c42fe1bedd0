//! UI-agnostic chat session state
//!
//! These types describe what the chat pane shows. They carry no rendering
//! information, so any front end can draw them.

use serde::{Deserialize, Serialize};

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
    Error,
}

/// A single transcript entry. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub role: Role,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { text: text.into(), role: Role::User }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { text: text.into(), role: Role::Bot }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), role: Role::Error }
    }
}

/// Append-only list of messages, in creation order
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Request lifecycle of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Sending,
}

/// Placeholder shown below the transcript while a request is pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingIndicator {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_keeps_creation_order() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("who won in 2016?"));
        transcript.push(Message::bot("Sunrisers Hyderabad"));
        transcript.push(Message::error("oops"));

        let roles: Vec<Role> = transcript.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Bot, Role::Error]);
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last().map(|m| m.text.as_str()), Some("oops"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::bot("hi")).unwrap();
        assert_eq!(json, r#"{"text":"hi","role":"bot"}"#);
    }

    #[test]
    fn test_phase_defaults_to_idle() {
        assert_eq!(Phase::default(), Phase::Idle);
    }
}
