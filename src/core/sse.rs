//! Incremental Server-Sent Events decoder.
//!
//! Response bodies arrive in arbitrary chunks. [`SseDecoder`] buffers bytes
//! until a full line is available, folds `event:`/`data:` fields into the
//! record under construction and yields the record when the blank line that
//! terminates it is seen.

use memchr::memchr2;
use tracing::trace;

/// Event kind used when a record carries no `event:` field.
pub const DEFAULT_EVENT_KIND: &str = "message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

impl SseEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.event
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    // The previous chunk ended on '\r'; a leading '\n' belongs to that line ending.
    skip_lf: bool,
    event: Option<String>,
    data: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of the response body and returns every record it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut chunk = chunk;
        if self.skip_lf && !chunk.is_empty() {
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
            self.skip_lf = false;
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(relative) = memchr2(b'\n', b'\r', &self.buffer[start..]) {
            let end = start + relative;
            let mut next = end + 1;
            if self.buffer[end] == b'\r' {
                if next < self.buffer.len() {
                    if self.buffer[next] == b'\n' {
                        next += 1;
                    }
                } else {
                    self.skip_lf = true;
                }
            }

            let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
            start = next;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        events
    }

    /// Drops any unterminated record at end of stream. Returns `true` when
    /// something was discarded.
    pub fn finish(&mut self) -> bool {
        let discarded =
            !self.buffer.is_empty() || self.event.is_some() || self.data.is_some();
        self.buffer.clear();
        self.event = None;
        self.data = None;
        self.skip_lf = false;
        discarded
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(index) => {
                let value = &line[index + 1..];
                (&line[..index], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "id" | "retry" => {}
            other => trace!(field = other, "ignoring unknown SSE field"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.event.is_none() && self.data.is_none() {
            return None;
        }
        let event = self
            .event
            .take()
            .filter(|kind| !kind.is_empty())
            .unwrap_or_else(|| DEFAULT_EVENT_KIND.to_string());
        let data = self.data.take().unwrap_or_default();
        Some(SseEvent { event, data })
    }
}

pub fn is_event_stream_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|value| value.eq_ignore_ascii_case("text/event-stream"))
}
