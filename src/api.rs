//! Wire payloads exchanged with the streaming chat endpoint.

use serde::{Deserialize, Serialize};

use crate::core::message::{Message, TranscriptRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: TranscriptRole,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Body of `POST /chat/stream`.
///
/// `history` holds the conversation as it was before `message` was sent; it
/// never contains the message itself or the pending assistant placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatMessage>,
}

/// Payload of an unlabeled (`message`) event.
#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    pub token: String,
}

/// Payload of an `error` event.
#[derive(Debug, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_message_and_history() {
        let request = ChatRequest {
            message: "How are you?".into(),
            history: vec![
                ChatMessage::from(&Message::user("Hi")),
                ChatMessage::from(&Message::assistant("Hello")),
            ],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "message": "How are you?",
                "history": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello"}
                ]
            })
        );
    }

    #[test]
    fn token_payload_requires_token_field() {
        assert_eq!(
            serde_json::from_str::<TokenPayload>(r#"{"token":"Hel"}"#)
                .unwrap()
                .token,
            "Hel"
        );
        assert!(serde_json::from_str::<TokenPayload>(r#"{"text":"Hel"}"#).is_err());
    }
}
