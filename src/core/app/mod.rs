//! Interactive application state.
//!
//! [`App`] pairs the [`StreamSession`] with what only the terminal UI needs:
//! the prompt buffer, transcript scroll position, and exit flag. It is owned
//! by the chat loop task and never shared.

use std::time::Instant;

use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::session::{StreamOutcome, StreamSession};
use crate::ui::input::InputBuffer;
use crate::ui::scroll::ScrollCalculator;


/// Size of the transcript area in terminal cells, excluding its title row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

pub struct App {
    pub session: StreamSession,
    pub input: InputBuffer,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub exit_requested: bool,
    pub pulse_start: Instant,
}

impl App {
    pub fn new(session: StreamSession) -> Self {
        Self {
            session,
            input: InputBuffer::new(),
            scroll_offset: 0,
            auto_scroll: true,
            exit_requested: false,
            pulse_start: Instant::now(),
        }
    }

    pub fn is_sending(&self) -> bool {
        self.session.is_sending()
    }

    /// Sends the prompt text if the input buffer allows it.
    ///
    /// Returns the params for the stream the caller must spawn.
    pub fn submit_input(&mut self) -> Option<StreamParams> {
        let text = self.input.submit(self.session.is_sending())?;
        let params = self.session.send(&text)?;
        self.auto_scroll = true;
        self.pulse_start = Instant::now();
        Some(params)
    }

    pub fn apply_stream_message(
        &mut self,
        stream_id: u64,
        message: StreamMessage,
    ) -> Option<StreamOutcome> {
        self.session.apply(stream_id, message)
    }

    /// Cancels any in-flight stream and asks the loop to stop.
    pub fn request_exit(&mut self) {
        self.session.shutdown();
        self.exit_requested = true;
    }

    pub fn calculate_max_scroll_offset(&self, viewport: Viewport) -> u16 {
        ScrollCalculator::calculate_max_scroll_offset(
            self.session.snapshot(),
            self.session.is_sending(),
            viewport.width,
            viewport.height,
        )
    }

    /// Offset the renderer should use: pinned to the bottom while
    /// auto-scrolling, otherwise the user's position clamped to the content.
    pub fn effective_scroll_offset(&self, viewport: Viewport) -> u16 {
        let max_scroll = self.calculate_max_scroll_offset(viewport);
        if self.auto_scroll {
            max_scroll
        } else {
            self.scroll_offset.min(max_scroll)
        }
    }

    pub fn scroll_up(&mut self, lines: u16, viewport: Viewport) {
        self.scroll_offset = self
            .effective_scroll_offset(viewport)
            .saturating_sub(lines);
        self.auto_scroll = false;
    }

    /// Scrolls down; reaching the bottom turns auto-scroll back on.
    pub fn scroll_down(&mut self, lines: u16, viewport: Viewport) {
        let max_scroll = self.calculate_max_scroll_offset(viewport);
        self.scroll_offset = self
            .effective_scroll_offset(viewport)
            .saturating_add(lines)
            .min(max_scroll);
        self.auto_scroll = self.scroll_offset >= max_scroll;
    }

    /// Page up by one transcript area (minus one line overlap).
    pub fn page_up(&mut self, viewport: Viewport) {
        self.scroll_up(viewport.height.saturating_sub(1).max(1), viewport);
    }

    /// Page down by one transcript area (minus one line overlap).
    pub fn page_down(&mut self, viewport: Viewport) {
        self.scroll_down(viewport.height.saturating_sub(1).max(1), viewport);
    }
}
