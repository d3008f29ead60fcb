//! The streaming session: one outstanding request at a time, folded into the
//! transcript message by message.
//!
//! [`StreamSession`] is deliberately free of I/O. [`StreamSession::send`]
//! records the outgoing message and hands back the [`StreamParams`] the
//! transport needs; whatever drives the transport then feeds each
//! [`StreamMessage`] back through [`StreamSession::apply`]. The session moves
//! `Idle -> Sending -> Idle`, and only the first terminal message of a stream
//! has any effect.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::api::ChatRequest;
use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::constants::{CONNECTION_ERROR_TEXT, SERVER_ERROR_PREFIX};
use crate::core::message::Message;
use crate::core::transcript::Transcript;

#[cfg(test)]
mod tests;

/// Where streaming requests go.
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub client: reqwest::Client,
    pub base_url: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
}

/// How a stream ended. Returned exactly once per send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    ServerError(String),
    ConnectionLost(String),
    OpenFailed(String),
}

impl StreamOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StreamOutcome::Completed)
    }
}

pub struct StreamSession {
    transcript: Transcript,
    state: SessionState,
    endpoint: Endpoint,
    current_stream_id: u64,
    stream_cancel_token: Option<CancellationToken>,
}

impl StreamSession {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            transcript: Transcript::new(),
            state: SessionState::Idle,
            endpoint,
            current_stream_id: 0,
            stream_cancel_token: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == SessionState::Sending
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn snapshot(&self) -> &[Message] {
        self.transcript.snapshot()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn current_stream_id(&self) -> u64 {
        self.current_stream_id
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.current_stream_id == stream_id
    }

    /// Starts a new exchange for `user_text`.
    ///
    /// Blank input is ignored and returns `None`. Otherwise the user message
    /// and an empty assistant placeholder are appended, the session enters
    /// `Sending`, and the returned params carry the history as it was before
    /// this call.
    ///
    /// Callers must not send while a stream is in flight; the session does not
    /// queue or cancel the earlier request.
    pub fn send(&mut self, user_text: &str) -> Option<StreamParams> {
        if user_text.trim().is_empty() {
            return None;
        }
        if self.is_sending() {
            warn!(
                stream_id = self.current_stream_id,
                "send while a stream is still in flight"
            );
        }

        let history = self.transcript.history();
        self.current_stream_id = self.current_stream_id.wrapping_add(1);
        let cancel_token = CancellationToken::new();
        self.stream_cancel_token = Some(cancel_token.clone());
        self.state = SessionState::Sending;
        self.transcript
            .append_pair(Message::user(user_text), Message::placeholder());

        info!(
            stream_id = self.current_stream_id,
            history_len = history.len(),
            "sending message"
        );

        Some(StreamParams {
            client: self.endpoint.client.clone(),
            base_url: self.endpoint.base_url.clone(),
            request: ChatRequest {
                message: user_text.to_string(),
                history,
            },
            cancel_token,
            stream_id: self.current_stream_id,
        })
    }

    /// Folds one message of stream `stream_id` into the transcript.
    ///
    /// Returns the outcome when this message ends the stream. Messages for
    /// another stream, or arriving after the stream already ended, are
    /// dropped.
    pub fn apply(&mut self, stream_id: u64, message: StreamMessage) -> Option<StreamOutcome> {
        if !self.is_current_stream(stream_id) || !self.is_sending() {
            trace!(stream_id, ?message, "dropping message for inactive stream");
            return None;
        }

        match message {
            StreamMessage::Token(token) => {
                if let Err(e) = self.transcript.mutate_last(|content| content.push_str(&token)) {
                    warn!(stream_id, error = %e, "token arrived without a placeholder");
                }
                None
            }
            StreamMessage::End => Some(self.finish(StreamOutcome::Completed)),
            StreamMessage::Error(error) => {
                self.substitute_reply(format!("{SERVER_ERROR_PREFIX}{error}"));
                Some(self.finish(StreamOutcome::ServerError(error)))
            }
            StreamMessage::TransportFailed(reason) => {
                self.substitute_reply(CONNECTION_ERROR_TEXT);
                Some(self.finish(StreamOutcome::ConnectionLost(reason)))
            }
            StreamMessage::OpenFailed(reason) => {
                self.substitute_reply(CONNECTION_ERROR_TEXT);
                Some(self.finish(StreamOutcome::OpenFailed(reason)))
            }
        }
    }

    /// Aborts the in-flight request, if any. Used when the application exits.
    pub fn shutdown(&mut self) {
        if let Some(token) = self.stream_cancel_token.take() {
            debug!(stream_id = self.current_stream_id, "cancelling stream on shutdown");
            token.cancel();
        }
    }

    fn substitute_reply(&mut self, text: impl Into<String>) {
        if let Err(e) = self.transcript.replace_last_content(text) {
            warn!(stream_id = self.current_stream_id, error = %e, "no reply to replace");
        }
    }

    fn finish(&mut self, outcome: StreamOutcome) -> StreamOutcome {
        self.state = SessionState::Idle;
        self.stream_cancel_token = None;
        match &outcome {
            StreamOutcome::Completed => {
                info!(stream_id = self.current_stream_id, "stream completed")
            }
            StreamOutcome::ServerError(error) => {
                warn!(stream_id = self.current_stream_id, %error, "server reported an error")
            }
            StreamOutcome::ConnectionLost(reason) => {
                warn!(stream_id = self.current_stream_id, %reason, "stream connection lost")
            }
            StreamOutcome::OpenFailed(reason) => {
                warn!(stream_id = self.current_stream_id, %reason, "stream could not be opened")
            }
        }
        outcome
    }
}
