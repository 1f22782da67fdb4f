use std::time::Duration;
use tracing::trace;

use crate::domain::{LVConfig, LVError, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &LVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, LVError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        match event::read()? {
            // crossterm also emits key release and repeat events on Windows.
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Ok(Some(Message::RawKey(key)))
                } else {
                    Ok(Self::handle_key(key))
                }
            }
            Event::Resize(width, height) => Ok(Some(Message::Resize(width as usize, height as usize))),
            _ => Ok(None),
        }
    }

    pub fn handle_key(key: KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Tab, _) => Some(Message::NextView),
            (KeyCode::BackTab, _) => Some(Message::PrevView),
            (KeyCode::Char(c @ '1'..='9'), _) => c.to_digit(10).map(|d| Message::GotoView(d as usize - 1)),
            (KeyCode::Char('j') | KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::Char('k') | KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Char('h') | KeyCode::Left, _) => Some(Message::MoveLeft),
            (KeyCode::Char('l') | KeyCode::Right, _) => Some(Message::MoveRight),
            (KeyCode::Char('n') | KeyCode::PageDown, _) => Some(Message::NextPage),
            (KeyCode::Char('p') | KeyCode::PageUp, _) => Some(Message::PrevPage),
            (KeyCode::Char('g') | KeyCode::Home, _) => Some(Message::FirstPage),
            (KeyCode::Char('G') | KeyCode::End, _) => Some(Message::LastPage),
            (KeyCode::Char('z'), _) => Some(Message::CyclePageSize),
            (KeyCode::Char(' '), _) => Some(Message::ToggleSelect),
            (KeyCode::Char('a'), _) => Some(Message::ToggleSelectAll),
            (KeyCode::Char('s'), _) => Some(Message::SortAscending),
            (KeyCode::Char('S'), _) => Some(Message::SortDescending),
            (KeyCode::Char('x'), _) => Some(Message::ClearSort),
            (KeyCode::Char('/'), _) => Some(Message::Search),
            (KeyCode::Char('f'), _) => Some(Message::CycleSearchField),
            (KeyCode::F(n @ 1..=9), _) => Some(Message::CycleFilter(n as usize - 1)),
            (KeyCode::Char('v'), _) => Some(Message::ColumnMenu),
            (KeyCode::Char('V'), _) => Some(Message::ResetColumns),
            (KeyCode::Char('R'), _) => Some(Message::ResetFilters),
            (KeyCode::Char('K'), _) => Some(Message::MoveItemUp),
            (KeyCode::Char('J'), _) => Some(Message::MoveItemDown),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char(c), _) => Some(Message::SelectAction(c)),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(code: KeyCode) -> Option<Message> {
        Controller::handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn maps_navigation_keys() {
        assert!(matches!(map(KeyCode::Char('q')), Some(Message::Quit)));
        assert!(matches!(map(KeyCode::Char('n')), Some(Message::NextPage)));
        assert!(matches!(map(KeyCode::Char('3')), Some(Message::GotoView(2))));
        assert!(matches!(map(KeyCode::F(2)), Some(Message::CycleFilter(1))));
        assert!(matches!(map(KeyCode::Char('c')), Some(Message::SelectAction('c'))));
        assert!(matches!(map(KeyCode::Char('R')), Some(Message::ResetFilters)));
        assert!(map(KeyCode::Insert).is_none());
    }
}
