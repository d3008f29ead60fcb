use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{ChatRequest, ErrorPayload, TokenPayload};
use crate::core::constants::CHAT_STREAM_PATH;
use crate::core::sse::{is_event_stream_content_type, SseDecoder, SseEvent, DEFAULT_EVENT_KIND};
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    /// One incremental fragment of the reply.
    Token(String),
    /// The server finished the reply.
    End,
    /// The server reported a failure through an `error` event.
    Error(String),
    /// The response broke, was malformed, or closed before a terminal event.
    TransportFailed(String),
    /// The request could not be opened at all.
    OpenFailed(String),
}

impl StreamMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamMessage::Token(_))
    }
}

pub type StreamSender = mpsc::UnboundedSender<(StreamMessage, u64)>;
pub type StreamReceiver = mpsc::UnboundedReceiver<(StreamMessage, u64)>;

/// Maps one decoded SSE record onto a stream message. Unknown event kinds are
/// skipped; undecodable payloads count as a broken transport.
pub(crate) fn classify_event(event: &SseEvent) -> Option<StreamMessage> {
    match event.kind() {
        DEFAULT_EVENT_KIND => Some(
            match serde_json::from_str::<TokenPayload>(&event.data) {
                Ok(payload) => StreamMessage::Token(payload.token),
                Err(e) => StreamMessage::TransportFailed(format!("malformed token event: {e}")),
            },
        ),
        "end" => Some(StreamMessage::End),
        "error" => Some(match serde_json::from_str::<ErrorPayload>(&event.data) {
            Ok(payload) => StreamMessage::Error(payload.error),
            Err(e) => StreamMessage::TransportFailed(format!("malformed error event: {e}")),
        }),
        other => {
            debug!(kind = other, "ignoring unrecognized SSE event");
            None
        }
    }
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub request: ChatRequest,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: StreamSender,
}

impl ChatStreamService {
    pub fn new() -> (Self, StreamReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                base_url,
                request,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = read_stream(&client, &base_url, &request, stream_id, &tx_clone) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "chat stream cancelled");
                }
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

/// Opens the request and forwards messages until the first terminal one.
async fn read_stream(
    client: &reqwest::Client,
    base_url: &str,
    request: &ChatRequest,
    stream_id: u64,
    tx: &StreamSender,
) {
    let send = |message: StreamMessage| {
        let _ = tx.send((message, stream_id));
    };

    let chat_url = construct_api_url(base_url, CHAT_STREAM_PATH);
    debug!(stream_id, url = %chat_url, "opening chat stream");

    let response = match client
        .post(&chat_url)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "text/event-stream")
        .json(request)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!(stream_id, error = %e, "could not open chat stream");
            send(StreamMessage::OpenFailed(e.to_string()));
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        send(StreamMessage::TransportFailed(format!(
            "endpoint returned {status}: {}",
            error_text.trim()
        )));
        return;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !is_event_stream_content_type(&content_type) {
        send(StreamMessage::TransportFailed(format!(
            "expected an event stream, got content type {content_type:?}"
        )));
        return;
    }

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                send(StreamMessage::TransportFailed(e.to_string()));
                return;
            }
        };

        for event in decoder.push(&chunk) {
            if let Some(message) = classify_event(&event) {
                let terminal = message.is_terminal();
                send(message);
                if terminal {
                    return;
                }
            }
        }
    }

    if decoder.finish() {
        debug!(stream_id, "discarded unterminated SSE record");
    }
    send(StreamMessage::TransportFailed(
        "stream closed before an end event".to_string(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatMessage;
    use crate::core::message::Message;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const SSE_HEADERS: &str =
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n";

    fn header_end(buffer: &[u8]) -> Option<usize> {
        buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
    }

    fn content_length(headers: &str) -> usize {
        headers
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse().ok())
                    .flatten()
            })
            .unwrap_or(0)
    }

    /// Serves a single canned HTTP response and hands back the raw request.
    async fn serve_once(response: String) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (request_tx, request_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buffer = Vec::new();
            let mut chunk = [0_u8; 4096];
            loop {
                let read = socket.read(&mut chunk).await.expect("read");
                if read == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..read]);
                if let Some(end) = header_end(&buffer) {
                    let headers = String::from_utf8_lossy(&buffer[..end]).to_string();
                    if buffer.len() >= end + content_length(&headers) {
                        break;
                    }
                }
            }
            let _ = request_tx.send(String::from_utf8_lossy(&buffer).to_string());
            socket.write_all(response.as_bytes()).await.expect("write");
            let _ = socket.shutdown().await;
        });

        (format!("http://{addr}"), request_rx)
    }

    fn params(base_url: String, stream_id: u64) -> StreamParams {
        StreamParams {
            client: reqwest::Client::new(),
            base_url,
            request: ChatRequest {
                message: "Hi".into(),
                history: vec![ChatMessage::from(&Message::user("Earlier"))],
            },
            cancel_token: CancellationToken::new(),
            stream_id,
        }
    }

    async fn collect(
        service: ChatStreamService,
        mut rx: StreamReceiver,
        params: StreamParams,
    ) -> Vec<StreamMessage> {
        let stream_id = params.stream_id;
        service.spawn_stream(params);
        drop(service);

        let mut messages = Vec::new();
        while let Ok(Some((message, id))) =
            tokio::time::timeout(Duration::from_secs(5), rx.recv()).await
        {
            assert_eq!(id, stream_id);
            messages.push(message);
        }
        messages
    }

    async fn run_against(response: String) -> (Vec<StreamMessage>, String) {
        let (base_url, request_rx) = serve_once(response).await;
        let (service, rx) = ChatStreamService::new();
        let messages = collect(service, rx, params(base_url, 7)).await;
        let request = request_rx.await.unwrap_or_default();
        (messages, request)
    }

    #[test]
    fn classify_maps_known_event_kinds() {
        assert_eq!(
            classify_event(&SseEvent::new("message", r#"{"token":"Hel"}"#)),
            Some(StreamMessage::Token("Hel".into()))
        );
        assert_eq!(
            classify_event(&SseEvent::new("end", "{}")),
            Some(StreamMessage::End)
        );
        assert_eq!(
            classify_event(&SseEvent::new("error", r#"{"error":"quota exceeded"}"#)),
            Some(StreamMessage::Error("quota exceeded".into()))
        );
        assert_eq!(classify_event(&SseEvent::new("ping", "")), None);
    }

    #[test]
    fn classify_treats_bad_payloads_as_transport_failures() {
        assert!(matches!(
            classify_event(&SseEvent::new("message", "not json")),
            Some(StreamMessage::TransportFailed(_))
        ));
        assert!(matches!(
            classify_event(&SseEvent::new("error", r#"{"message":"x"}"#)),
            Some(StreamMessage::TransportFailed(_))
        ));
    }

    #[tokio::test]
    async fn streams_tokens_until_end() {
        let body = "data: {\"token\":\"Hel\"}\n\ndata: {\"token\":\"lo\"}\n\nevent: end\ndata: {}\n\n";
        let (messages, request) = run_against(format!("{SSE_HEADERS}{body}")).await;

        assert_eq!(
            messages,
            vec![
                StreamMessage::Token("Hel".into()),
                StreamMessage::Token("lo".into()),
                StreamMessage::End,
            ]
        );
        assert!(request.starts_with("POST /chat/stream HTTP/1.1"));
        let body_start = header_end(request.as_bytes()).expect("headers");
        let payload: serde_json::Value =
            serde_json::from_str(&request[body_start..]).expect("json body");
        assert_eq!(
            payload,
            serde_json::json!({
                "message": "Hi",
                "history": [{"role": "user", "content": "Earlier"}]
            })
        );
    }

    #[tokio::test]
    async fn forwards_server_errors() {
        let body = "data: {\"token\":\"par\"}\n\nevent: error\ndata: {\"error\":\"quota exceeded\"}\n\n";
        let (messages, _) = run_against(format!("{SSE_HEADERS}{body}")).await;
        assert_eq!(
            messages,
            vec![
                StreamMessage::Token("par".into()),
                StreamMessage::Error("quota exceeded".into()),
            ]
        );
    }

    #[tokio::test]
    async fn stops_after_first_terminal_event() {
        let body = "event: end\ndata: {}\n\ndata: {\"token\":\"late\"}\n\nevent: error\ndata: {\"error\":\"late\"}\n\n";
        let (messages, _) = run_against(format!("{SSE_HEADERS}{body}")).await;
        assert_eq!(messages, vec![StreamMessage::End]);
    }

    #[tokio::test]
    async fn premature_close_is_a_transport_failure() {
        let body = "data: {\"token\":\"Hel\"}\n\ndata: {\"tok";
        let (messages, _) = run_against(format!("{SSE_HEADERS}{body}")).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], StreamMessage::Token("Hel".into()));
        assert!(matches!(messages[1], StreamMessage::TransportFailed(_)));
    }

    #[tokio::test]
    async fn error_status_is_a_transport_failure() {
        let response = "HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\nContent-Length: 4\r\nConnection: close\r\n\r\nboom".to_string();
        let (messages, _) = run_against(response).await;
        match messages.as_slice() {
            [StreamMessage::TransportFailed(reason)] => assert!(reason.contains("500")),
            other => panic!("unexpected messages: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_event_stream_response_is_a_transport_failure() {
        let response = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}".to_string();
        let (messages, _) = run_against(response).await;
        assert!(matches!(
            messages.as_slice(),
            [StreamMessage::TransportFailed(_)]
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_to_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let (service, rx) = ChatStreamService::new();
        let messages = collect(service, rx, params(format!("http://{addr}"), 3)).await;
        assert!(matches!(messages.as_slice(), [StreamMessage::OpenFailed(_)]));
    }

    #[tokio::test]
    async fn cancelled_stream_sends_nothing() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (service, rx) = ChatStreamService::new();
        let stream_params = params(format!("http://{addr}"), 5);
        stream_params.cancel_token.cancel();

        let messages = collect(service, rx, stream_params).await;
        assert!(messages.is_empty());
        drop(listener);
    }
}
