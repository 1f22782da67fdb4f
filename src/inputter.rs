use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line text input backing the toolbar search box.
///
/// The cursor position counts chars, not bytes.
#[derive(Debug, Default)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.finished = true,
            (KeyCode::Esc, _) => {
                self.canceled = true;
                self.finished = true;
            }
            (KeyCode::Backspace, _) => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    let at = self.byte_pos();
                    self.current_input.remove(at);
                }
            }
            (KeyCode::Delete, _) => {
                if self.cursor_pos < self.char_len() {
                    let at = self.byte_pos();
                    self.current_input.remove(at);
                }
            }
            (KeyCode::Left, _) => self.cursor_pos = self.cursor_pos.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor_pos = (self.cursor_pos + 1).min(self.char_len()),
            (KeyCode::Home, _) => self.cursor_pos = 0,
            (KeyCode::End, _) => self.cursor_pos = self.char_len(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.current_input.clear();
                self.cursor_pos = 0;
            }
            (KeyCode::Char(chr), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                let at = self.byte_pos();
                self.current_input.insert(at, chr);
                self.cursor_pos += 1;
            }
            _ => {}
        }
        trace!("Input: {:?} @ {}", self.current_input, self.cursor_pos);
        self.get()
    }

    /// Start editing from an existing value with the cursor at its end.
    pub fn set(&mut self, s: &str) {
        self.clear();
        self.current_input = s.to_string();
        self.cursor_pos = self.char_len();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.current_input.clone(),
            finished: self.finished,
            canceled: self.canceled,
            cursor_pos: self.cursor_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    fn char_len(&self) -> usize {
        self.current_input.chars().count()
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut Inputter, s: &str) {
        for c in s.chars() {
            input.read(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn edits_in_the_middle() {
        let mut input = Inputter::default();
        type_str(&mut input, "rüst");
        input.read(key(KeyCode::Left));
        input.read(key(KeyCode::Left));
        input.read(key(KeyCode::Backspace));
        assert_eq!(input.get().input, "rst");
        type_str(&mut input, "u");
        input.read(key(KeyCode::End));
        input.read(key(KeyCode::Delete));
        let result = input.read(key(KeyCode::Enter));
        assert_eq!(result.input, "rust");
        assert!(result.finished);
        assert!(!result.canceled);
    }

    #[test]
    fn escape_cancels_and_set_restores() {
        let mut input = Inputter::default();
        input.set("quiz");
        assert_eq!(input.get().cursor_pos, 4);
        let result = input.read(key(KeyCode::Esc));
        assert!(result.canceled && result.finished);
        assert_eq!(result.input, "quiz");

        input.read(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(input.get().input, "");
    }
}
