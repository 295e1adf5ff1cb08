//! Text-input editing helpers (cursor movement, insertion, deletion).
//!
//! `cursor` counts characters, not bytes, so Urdu/Sindhi text and emoji
//! edit correctly.

use super::App;

impl App {
    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    /// Byte offset of the character at `index` (or the end of the input).
    fn byte_offset(&self, index: usize) -> usize {
        self.input
            .char_indices()
            .nth(index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.input.len())
    }

    /// Insert a character at the current cursor position.
    pub(crate) fn insert_char(&mut self, ch: char) {
        if ch.is_control() {
            return;
        }
        let offset = self.byte_offset(self.cursor);
        self.input.insert(offset, ch);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub(crate) fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let offset = self.byte_offset(self.cursor);
        self.input.remove(offset);
    }

    /// Delete the character at the cursor.
    pub(crate) fn delete(&mut self) {
        if self.cursor >= self.char_count() {
            return;
        }
        let offset = self.byte_offset(self.cursor);
        self.input.remove(offset);
    }

    pub(crate) fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(crate) fn move_cursor_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub(crate) fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn move_cursor_end(&mut self) {
        self.cursor = self.char_count();
    }
}
