//! Conversation history and turn snapshots
//!
//! - Conversation = ordered chat messages, system prompt first
//! - Snapshot = by-value copy taken before a model call, restored to undo
//!   speculative assistant/tool messages

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Role};

/// Ordered chat history sent with every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// History that starts with a system prompt
    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(prompt)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replace the leading system prompt, inserting one if absent
    pub fn set_system(&mut self, prompt: impl Into<String>) {
        let message = ChatMessage::system(prompt);
        match self.messages.first_mut() {
            Some(first) if first.role == Role::System => *first = message,
            _ => self.messages.insert(0, message),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Count messages with the given role
    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

/// Immutable copy of a conversation taken before a model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSnapshot {
    messages: Vec<ChatMessage>,
}

impl TurnSnapshot {
    pub fn take(conversation: &Conversation) -> Self {
        Self {
            messages: conversation.messages.clone(),
        }
    }

    /// Put the conversation back exactly as it was when the snapshot was taken
    pub fn restore(&self, conversation: &mut Conversation) {
        conversation.messages.clone_from(&self.messages);
    }

    /// Messages held, for logging
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
