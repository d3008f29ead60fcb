use crate::core::message::Message;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// Shown in place of an assistant reply that has not produced a token yet.
pub const PENDING_REPLY_TEXT: &str = "…";

/// Builds transcript lines and works out how far they can scroll.
pub struct ScrollCalculator;

impl ScrollCalculator {
    /// Build display lines for all messages.
    ///
    /// `is_sending` marks the final assistant message as still pending, so an
    /// empty placeholder shows an ellipsis instead of nothing.
    pub fn build_display_lines(messages: &[Message], is_sending: bool) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let last_index = messages.len().saturating_sub(1);

        for (index, msg) in messages.iter().enumerate() {
            let pending = is_sending && index == last_index;
            Self::add_message_lines(&mut lines, msg, pending);
        }

        lines
    }

    fn add_message_lines(lines: &mut Vec<Line<'static>>, msg: &Message, pending: bool) {
        let label = msg.role.display_label();

        if msg.is_user() {
            lines.push(
                Line::from(Span::styled(
                    label,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Right),
            );
            for content_line in msg.content.split('\n') {
                lines.push(Line::from(Span::styled(
                    content_line.to_string(),
                    Style::default().fg(Color::Cyan),
                )));
            }
        } else {
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            if msg.content.is_empty() && pending {
                lines.push(Line::from(Span::styled(
                    PENDING_REPLY_TEXT,
                    Style::default().fg(Color::DarkGray),
                )));
            } else {
                for content_line in msg.content.split('\n') {
                    lines.push(Line::from(content_line.to_string()));
                }
            }
        }

        lines.push(Line::from("")); // Spacing between messages
    }

    /// Calculate how many rows the given lines take once wrapped
    pub fn calculate_wrapped_line_count(lines: &[Line], terminal_width: u16) -> u16 {
        let mut total_wrapped_lines = 0u16;

        for line in lines {
            let line_text = line.to_string();
            // Trim whitespace to match ratatui's Wrap { trim: true } behavior
            let trimmed_text = line_text.trim();

            if trimmed_text.is_empty() || terminal_width == 0 {
                total_wrapped_lines = total_wrapped_lines.saturating_add(1);
            } else {
                let wrapped_count = Self::calculate_word_wrapped_lines(trimmed_text, terminal_width);
                total_wrapped_lines = total_wrapped_lines.saturating_add(wrapped_count);
            }
        }

        total_wrapped_lines
    }

    /// Calculate how many rows a single line of text wraps to
    fn calculate_word_wrapped_lines(text: &str, terminal_width: u16) -> u16 {
        let width = terminal_width as usize;
        let mut current_line_len = 0;
        let mut line_count = 1u16;

        for word in text.split_whitespace() {
            let word_len = word.width();

            if current_line_len > 0 && current_line_len + 1 + word_len > width {
                line_count = line_count.saturating_add(1);
                current_line_len = 0;
            } else if current_line_len > 0 {
                current_line_len += 1;
            }

            // Words longer than the row are broken across rows
            if word_len > width {
                let extra_rows = (word_len - 1) / width;
                line_count = line_count.saturating_add(extra_rows as u16);
                current_line_len = word_len - extra_rows * width;
            } else {
                current_line_len += word_len;
            }
        }

        line_count
    }

    /// Offset that shows the bottom of the transcript
    pub fn calculate_max_scroll_offset(
        messages: &[Message],
        is_sending: bool,
        terminal_width: u16,
        available_height: u16,
    ) -> u16 {
        let lines = Self::build_display_lines(messages, is_sending);
        let total_wrapped_lines = Self::calculate_wrapped_line_count(&lines, terminal_width);
        total_wrapped_lines.saturating_sub(available_height)
    }
}
