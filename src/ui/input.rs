//! Single-line input buffer behind the prompt box.
//!
//! The buffer decides when a submission is allowed: never while a reply is
//! streaming, and never for blank text. A refused submission leaves the text
//! in place so nothing the user typed is lost.

use unicode_width::UnicodeWidthStr;

/// Make pasted text safe for a single-line prompt.
///
/// Tabs become four spaces, line breaks become single spaces, and other
/// control characters are dropped.
pub fn sanitize_text_input(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());
    let mut previous_was_break = false;

    for c in text.chars() {
        match c {
            '\r' | '\n' => {
                if !previous_was_break {
                    sanitized.push(' ');
                }
                previous_was_break = true;
                continue;
            }
            '\t' => sanitized.push_str("    "),
            _ if !c.is_control() => sanitized.push(c),
            _ => {}
        }
        previous_was_break = false;
    }

    sanitized
}

#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    text: String,
    /// Cursor position in chars, `0..=char_count`.
    cursor: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(index, _)| index)
            .unwrap_or(self.text.len())
    }

    pub fn insert_char(&mut self, c: char) {
        if c.is_control() {
            return;
        }
        let index = self.byte_index(self.cursor);
        self.text.insert(index, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        let sanitized = sanitize_text_input(text);
        let index = self.byte_index(self.cursor);
        self.text.insert_str(index, &sanitized);
        self.cursor += sanitized.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let index = self.byte_index(self.cursor);
        self.text.remove(index);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let index = self.byte_index(self.cursor);
            self.text.remove(index);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Takes the text for sending, clearing the buffer, unless a reply is
    /// still streaming or the text is blank.
    pub fn submit(&mut self, is_sending: bool) -> Option<String> {
        if is_sending || self.text.trim().is_empty() {
            return None;
        }
        self.cursor = 0;
        Some(std::mem::take(&mut self.text))
    }

    /// Display columns between the start of the text and the cursor.
    pub fn cursor_column(&self) -> u16 {
        let prefix = &self.text[..self.byte_index(self.cursor)];
        u16::try_from(prefix.width()).unwrap_or(u16::MAX)
    }
}
