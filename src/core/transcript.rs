//! Ordered conversation transcript.
//!
//! The transcript only ever grows. While a stream is active its last element
//! is the assistant placeholder the stream writes into, so every in-place
//! mutation targets the back of the list.

use std::fmt;

use crate::api::ChatMessage;
use crate::core::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptError {
    /// A last-message mutation was requested on an empty transcript.
    EmptyTranscript,
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptError::EmptyTranscript => {
                write!(f, "cannot modify the last message of an empty transcript")
            }
        }
    }
}

impl std::error::Error for TranscriptError {}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends both messages in one step so no observer sees the user message
    /// without its placeholder.
    pub fn append_pair(&mut self, user: Message, placeholder: Message) {
        self.messages.reserve(2);
        self.messages.push(user);
        self.messages.push(placeholder);
    }

    pub fn mutate_last<F>(&mut self, f: F) -> Result<(), TranscriptError>
    where
        F: FnOnce(&mut String),
    {
        let last = self
            .messages
            .last_mut()
            .ok_or(TranscriptError::EmptyTranscript)?;
        f(&mut last.content);
        Ok(())
    }

    pub fn replace_last_content(&mut self, text: impl Into<String>) -> Result<(), TranscriptError> {
        let text = text.into();
        self.mutate_last(move |content| *content = text)
    }

    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Wire form of the whole transcript, oldest first.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(ChatMessage::from).collect()
    }
}
