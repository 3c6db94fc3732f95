use std::time::Duration;
use tracing::trace;

use dtv::domain::{Message, TVConfig, TableError};
use dtv::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Waits up to `event_poll_time` for a key press. A timeout yields `None`,
    /// which still lets the model poll its debounced search.
    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TableError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            if model.raw_keyevents() {
                return Ok(Some(Message::RawKey(key)));
            }
            return Ok(self.handle_key(key));
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::Left, _) => Some(Message::MoveLeft),
            (KeyCode::Right, _) => Some(Message::MoveRight),
            (KeyCode::Char('s'), _) => Some(Message::SortColumn),
            (KeyCode::Char(' '), _) => Some(Message::ToggleRow),
            (KeyCode::Char('a'), _) => Some(Message::ToggleSelectAll),
            (KeyCode::Char('/'), _) => Some(Message::Search),
            (KeyCode::Char('c'), _) => Some(Message::ClearSearch),
            (KeyCode::Char('n'), _) | (KeyCode::PageDown, _) => Some(Message::NextPage),
            (KeyCode::Char('p'), _) | (KeyCode::PageUp, _) => Some(Message::PreviousPage),
            (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(Message::FirstPage),
            (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(Message::LastPage),
            (KeyCode::Char('+'), _) => Some(Message::GrowPageSize),
            (KeyCode::Char('-'), _) => Some(Message::ShrinkPageSize),
            (KeyCode::Char('l'), _) => Some(Message::ToggleLoading),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Esc, _) => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn map(code: KeyCode, modifiers: KeyModifiers) -> Option<Message> {
        Controller::new(&TVConfig::default()).handle_key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn handle_key() {
        assert_eq!(map(KeyCode::Char('q'), KeyModifiers::NONE), Some(Message::Quit));
        assert_eq!(map(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(Message::Quit));
        assert_eq!(map(KeyCode::Char('c'), KeyModifiers::NONE), Some(Message::ClearSearch));
        assert_eq!(map(KeyCode::Char(' '), KeyModifiers::NONE), Some(Message::ToggleRow));
        assert_eq!(map(KeyCode::Char('G'), KeyModifiers::SHIFT), Some(Message::LastPage));
        assert_eq!(map(KeyCode::Char('/'), KeyModifiers::NONE), Some(Message::Search));
        assert_eq!(map(KeyCode::Esc, KeyModifiers::NONE), Some(Message::Exit));
        assert_eq!(map(KeyCode::Char('z'), KeyModifiers::NONE), None);
    }
}
