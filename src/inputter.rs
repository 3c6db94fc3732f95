use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

#[derive(Debug, Default)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize, // In chars, not bytes
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor_pos: usize,
    /// The text changed with this key.
    pub changed: bool,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        let before = self.current_input.len();
        let mut changed = false;
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.finished = true,
            (KeyCode::Esc, _) => {
                self.clear();
                self.canceled = true;
                self.finished = true;
                changed = before > 0;
            }
            (KeyCode::Backspace, _) => changed = self.backspace(),
            (KeyCode::Delete, _) => changed = self.delete(),
            (KeyCode::Left, _) => self.cursor_pos = self.cursor_pos.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor_pos = (self.cursor_pos + 1).min(self.char_count()),
            (KeyCode::Home, _) => self.cursor_pos = 0,
            (KeyCode::End, _) => self.cursor_pos = self.char_count(),
            (KeyCode::Char(chr), m) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                self.insert(chr);
                changed = true;
            }
            _ => trace!("Ignoring input key {key:?}"),
        }
        InputResult {
            changed,
            ..self.get()
        }
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.current_input.clone(),
            finished: self.finished,
            canceled: self.canceled,
            cursor_pos: self.cursor_pos,
            changed: false,
        }
    }

    /// Starts a new edit, keeping the text.
    pub fn resume(&mut self) {
        self.finished = false;
        self.canceled = false;
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    fn char_count(&self) -> usize {
        self.current_input.chars().count()
    }

    fn insert(&mut self, chr: char) {
        let at = self.byte_pos(self.cursor_pos);
        self.current_input.insert(at, chr);
        self.cursor_pos += 1;
    }

    fn backspace(&mut self) -> bool {
        if self.cursor_pos == 0 {
            return false;
        }
        let at = self.byte_pos(self.cursor_pos - 1);
        self.current_input.remove(at);
        self.cursor_pos -= 1;
        true
    }

    fn delete(&mut self) -> bool {
        if self.cursor_pos >= self.char_count() {
            return false;
        }
        let at = self.byte_pos(self.cursor_pos);
        self.current_input.remove(at);
        true
    }

    fn byte_pos(&self, char_pos: usize) -> usize {
        self.current_input
            .char_indices()
            .nth(char_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut Inputter, code: KeyCode) -> InputResult {
        input.read(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(input: &mut Inputter, text: &str) {
        for chr in text.chars() {
            press(input, KeyCode::Char(chr));
        }
    }

    #[test]
    fn typing_and_enter() {
        let mut input = Inputter::default();
        type_str(&mut input, "name:max");
        let result = press(&mut input, KeyCode::Enter);
        assert_eq!(result.input, "name:max");
        assert!(result.finished);
        assert!(!result.canceled);
        assert!(!result.changed);
    }

    #[test]
    fn backspace_removes_char_before_cursor() {
        let mut input = Inputter::default();
        type_str(&mut input, "abc");
        press(&mut input, KeyCode::Left);
        let result = press(&mut input, KeyCode::Backspace);
        assert_eq!(result.input, "ac");
        assert_eq!(result.cursor_pos, 1);
        assert!(result.changed);
        press(&mut input, KeyCode::Home);
        assert!(!press(&mut input, KeyCode::Backspace).changed);
    }

    #[test]
    fn multibyte_editing() {
        let mut input = Inputter::default();
        type_str(&mut input, "Örgn");
        press(&mut input, KeyCode::Home);
        press(&mut input, KeyCode::Right);
        type_str(&mut input, "i");
        assert_eq!(input.get().input, "Öirgn");
        press(&mut input, KeyCode::Home);
        let result = press(&mut input, KeyCode::Delete);
        assert_eq!(result.input, "irgn");
        press(&mut input, KeyCode::End);
        assert_eq!(input.get().cursor_pos, 4);
        assert!(!press(&mut input, KeyCode::Delete).changed);
    }

    #[test]
    fn escape_cancels_and_clears() {
        let mut input = Inputter::default();
        type_str(&mut input, "bella");
        assert_eq!(input.get().cursor_pos, 5);
        let result = press(&mut input, KeyCode::Esc);
        assert!(result.canceled && result.finished && result.changed);
        assert_eq!(result.input, "");
    }

    #[test]
    fn control_chords_are_not_text() {
        let mut input = Inputter::default();
        let result = input.read(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!result.changed);
        assert_eq!(input.get().input, "");
        let result = input.read(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT));
        assert!(result.changed);
        assert_eq!(input.get().input, "A");
    }
}
