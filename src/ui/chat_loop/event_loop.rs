//! Event polling, dispatching, and UI rendering loop.
//!
//! A spawned reader forwards terminal events into a channel. Each loop
//! iteration drains those events, folds stream messages into the session,
//! spawns streams for new sends, and redraws at a capped frame rate.

use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::app::App;
use crate::core::chat_stream::{ChatStreamService, StreamReceiver};
use crate::core::session::{Endpoint, StreamSession};
use crate::ui::chat_loop::keybindings::{handle_key_event, KeyOutcome};
use crate::ui::chat_loop::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};
use crate::ui::renderer::{transcript_viewport, ui};

const MAX_FPS: u64 = 60;

fn try_draw_frame(
    app: &App,
    terminal: &mut ChatTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    terminal.draw(|f| ui(f, app))?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

struct EventProcessingOutcome {
    events_processed: bool,
    request_redraw: bool,
}

fn process_ui_events(
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<Event>,
    stream_service: &ChatStreamService,
    term_area: Rect,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome {
        events_processed: false,
        request_redraw: false,
    };
    let viewport = transcript_viewport(term_area);

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                match handle_key_event(app, &key, viewport) {
                    KeyOutcome::Submitted(params) => {
                        stream_service.spawn_stream(params);
                        outcome.request_redraw = true;
                    }
                    KeyOutcome::Exit => {
                        outcome.request_redraw = true;
                        break;
                    }
                    KeyOutcome::Handled => outcome.request_redraw = true,
                    KeyOutcome::Ignored => {}
                }
            }
            Event::Paste(text) => {
                if !app.is_sending() {
                    app.input.insert_str(&text);
                    outcome.request_redraw = true;
                }
            }
            Event::Resize(_, _) => {
                outcome.request_redraw = true;
            }
            _ => {}
        }
    }

    outcome
}

/// Folds every pending stream message into the session.
///
/// Returns whether anything was received.
fn process_stream_updates(app: &mut App, rx: &mut StreamReceiver) -> bool {
    let mut received_any = false;

    while let Ok((message, stream_id)) = rx.try_recv() {
        received_any = true;
        if let Some(outcome) = app.apply_stream_message(stream_id, message) {
            debug!(stream_id, ?outcome, "stream finished");
        }
    }

    received_any
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<Event>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

async fn main_loop(app: &mut App, terminal: &mut ChatTerminal) -> Result<(), Box<dyn Error>> {
    let (stream_service, mut rx) = ChatStreamService::new();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut last_indicator_frame = Instant::now();

    let result = loop {
        if app.exit_requested {
            break Ok(());
        }

        if let Err(e) = try_draw_frame(
            app,
            terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        ) {
            break Err(e.into());
        }

        let term_area = match terminal.size() {
            Ok(size) => Rect::new(0, 0, size.width, size.height),
            Err(e) => break Err(e.into()),
        };

        let event_outcome = process_ui_events(app, &mut event_rx, &stream_service, term_area);
        if event_outcome.request_redraw {
            request_redraw = true;
        }

        let received_any = process_stream_updates(app, &mut rx);
        if received_any {
            request_redraw = true;
        }

        // Keep the pulse indicator moving while a reply streams
        if app.is_sending() {
            let now = Instant::now();
            if now.duration_since(last_indicator_frame) >= frame_duration {
                request_redraw = true;
                last_indicator_frame = now;
            }
        }

        let idle = !event_outcome.events_processed && !received_any && !request_redraw;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    event_reader_handle.abort();
    result
}

pub async fn run_chat(endpoint: Endpoint) -> Result<(), Box<dyn Error>> {
    info!(base_url = %endpoint.base_url, "starting chat session");
    let mut app = App::new(StreamSession::new(endpoint));

    let mut terminal = setup_terminal()?;
    let result = main_loop(&mut app, &mut terminal).await;

    app.session.shutdown();
    let restored = restore_terminal(&mut terminal);

    info!(messages = app.session.transcript().len(), "chat session ended");
    result.and(restored)
}
