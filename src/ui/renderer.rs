use std::time::Duration;

use crate::core::app::{App, Viewport};
use crate::ui::scroll::ScrollCalculator;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const INPUT_AREA_HEIGHT: u16 = 3;

const IDLE_INPUT_TITLE: &str = "Type your message (Enter to send, Esc or Ctrl+C to quit)";
const SENDING_INPUT_TITLE: &str = "Waiting for reply (Esc or Ctrl+C to quit)";

fn split_areas(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(INPUT_AREA_HEIGHT)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Transcript area available for messages in a frame of the given size.
pub fn transcript_viewport(area: Rect) -> Viewport {
    let (transcript_area, _) = split_areas(area);
    Viewport {
        width: transcript_area.width,
        height: transcript_area.height.saturating_sub(1), // Account for title
    }
}

/// Pulse indicator shown while a reply streams, two cycles per second.
pub fn pulse_symbol(elapsed: Duration) -> &'static str {
    let elapsed = elapsed.as_millis() as f32 / 1000.0;
    let pulse_phase = (elapsed * 2.0) % 2.0;
    let pulse_intensity = if pulse_phase < 1.0 {
        pulse_phase
    } else {
        2.0 - pulse_phase
    };

    if pulse_intensity < 0.33 {
        "○"
    } else if pulse_intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

pub fn ui(f: &mut Frame, app: &App) {
    let (transcript_area, input_area) = split_areas(f.area());
    let viewport = transcript_viewport(f.area());
    let is_sending = app.is_sending();

    let lines = ScrollCalculator::build_display_lines(app.session.snapshot(), is_sending);
    let scroll_offset = app.effective_scroll_offset(viewport);

    let title = format!(
        "streamchat v{} • {}",
        env!("CARGO_PKG_VERSION"),
        app.session.endpoint().base_url
    );

    let messages_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title))
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));

    f.render_widget(messages_paragraph, transcript_area);

    let (input_style, input_title) = if is_sending {
        (
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
            SENDING_INPUT_TITLE,
        )
    } else {
        (Style::default().fg(Color::Cyan), IDLE_INPUT_TITLE)
    };

    let mut input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Reset))
        .title(input_title);
    if is_sending {
        input_block = input_block
            .title(Line::from(pulse_symbol(app.pulse_start.elapsed())).right_aligned());
    }

    // Keep the cursor in view when the text is wider than the box
    let inner_width = input_area.width.saturating_sub(2);
    let cursor_column = app.input.cursor_column();
    let horizontal_scroll = cursor_column.saturating_sub(inner_width.saturating_sub(1));

    let input = Paragraph::new(app.input.text())
        .style(input_style)
        .block(input_block)
        .scroll((0, horizontal_scroll));

    f.render_widget(input, input_area);

    if inner_width > 0 {
        let cursor_x = input_area.x + 1 + (cursor_column - horizontal_scroll);
        f.set_cursor_position((cursor_x, input_area.y + 1));
    }
}
