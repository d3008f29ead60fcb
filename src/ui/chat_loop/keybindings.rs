//! Key handling for the chat screen.
//!
//! Editing keys go to the prompt buffer, arrow and page keys scroll the
//! transcript, Enter submits, and Esc or Ctrl+C quits. The prompt does not
//! accept edits while a reply is streaming.

use crate::core::app::{App, Viewport};
use crate::core::chat_stream::StreamParams;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub enum KeyOutcome {
    /// The key had no effect.
    Ignored,
    /// State changed; redraw.
    Handled,
    /// A message was sent; the stream must be spawned.
    Submitted(StreamParams),
    /// Quit was requested.
    Exit,
}

pub fn handle_key_event(app: &mut App, key: &KeyEvent, viewport: Viewport) -> KeyOutcome {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.request_exit();
            KeyOutcome::Exit
        }
        KeyCode::Esc => {
            app.request_exit();
            KeyOutcome::Exit
        }
        KeyCode::Enter => match app.submit_input() {
            Some(params) => KeyOutcome::Submitted(params),
            None => KeyOutcome::Ignored,
        },
        KeyCode::Up => {
            app.scroll_up(1, viewport);
            KeyOutcome::Handled
        }
        KeyCode::Down => {
            app.scroll_down(1, viewport);
            KeyOutcome::Handled
        }
        KeyCode::PageUp => {
            app.page_up(viewport);
            KeyOutcome::Handled
        }
        KeyCode::PageDown => {
            app.page_down(viewport);
            KeyOutcome::Handled
        }
        _ => handle_edit_keys(app, key, ctrl),
    }
}

fn handle_edit_keys(app: &mut App, key: &KeyEvent, ctrl: bool) -> KeyOutcome {
    if app.is_sending() {
        return KeyOutcome::Ignored;
    }

    match key.code {
        KeyCode::Char('a') if ctrl => app.input.move_home(),
        KeyCode::Char('e') if ctrl => app.input.move_end(),
        KeyCode::Char('u') if ctrl => app.input.clear(),
        KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => {
            return KeyOutcome::Ignored
        }
        KeyCode::Char(c) => app.input.insert_char(c),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Home => app.input.move_home(),
        KeyCode::End => app.input.move_end(),
        _ => return KeyOutcome::Ignored,
    }
    KeyOutcome::Handled
}
