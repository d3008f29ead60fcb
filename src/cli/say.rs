//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamReceiver};
use crate::core::session::{Endpoint, StreamOutcome, StreamSession};

/// Feeds stream messages into `session` until the stream ends, echoing each
/// accepted token to `out` as it arrives.
///
/// Returns `None` if the channel closed before a terminal message.
pub async fn print_reply<W: Write>(
    session: &mut StreamSession,
    rx: &mut StreamReceiver,
    out: &mut W,
) -> io::Result<Option<StreamOutcome>> {
    while let Some((message, stream_id)) = rx.recv().await {
        if let StreamMessage::Token(token) = &message {
            if session.is_current_stream(stream_id) && session.is_sending() {
                out.write_all(token.as_bytes())?;
                out.flush()?;
            }
        }

        if let Some(outcome) = session.apply(stream_id, message) {
            return Ok(Some(outcome));
        }
    }

    Ok(None)
}

pub async fn run_say(prompt: Vec<String>, endpoint: Endpoint) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    let mut session = StreamSession::new(endpoint);

    let Some(params) = session.send(&prompt) else {
        eprintln!("Usage: streamchat say <prompt>");
        std::process::exit(1);
    };

    let (stream_service, mut rx) = ChatStreamService::new();
    stream_service.spawn_stream(params);

    let mut stdout = io::stdout();
    let outcome = print_reply(&mut session, &mut rx, &mut stdout).await?;

    match outcome {
        Some(outcome) if outcome.is_success() => {
            println!();
            Ok(())
        }
        _ => {
            let reply = session
                .transcript()
                .last()
                .map(|message| message.content.as_str())
                .unwrap_or_default();
            eprintln!("\n❌ {reply}");
            std::process::exit(1);
        }
    }
}
