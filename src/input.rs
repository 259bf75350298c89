use crate::controller::Key;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

const MAX_EVENTS_PER_POLL: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    /// Ctrl-C; always quits, even from inside an experiment.
    Interrupt,
    Resize(u16, u16),
}

/// Block up to `timeout` for the first event, then drain whatever else is
/// already queued without waiting.
pub fn collect_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();
    let mut wait = timeout;

    while event::poll(wait)? {
        wait = Duration::ZERO;
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                if let Some(ev) = map_key_event(k) {
                    out.push(ev);
                }
            }
            Event::Resize(c, r) => out.push(InputEvent::Resize(c, r)),
            _ => {}
        }
        if out.len() >= MAX_EVENTS_PER_POLL {
            break;
        }
    }
    Ok(out)
}

pub fn map_key_event(k: KeyEvent) -> Option<InputEvent> {
    if k.modifiers.contains(KeyModifiers::CONTROL) {
        return match k.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(InputEvent::Interrupt),
            _ => None,
        };
    }
    let key = match k.code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Char(' ') => Key::Space,
        KeyCode::Char(ch) => Key::Char(ch.to_ascii_lowercase()),
        _ => return None,
    };
    Some(InputEvent::Key(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn maps_named_keys() {
        assert_eq!(
            map_key_event(press(KeyCode::Char(' '), KeyModifiers::NONE)),
            Some(InputEvent::Key(Key::Space))
        );
        assert_eq!(
            map_key_event(press(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(InputEvent::Key(Key::BackTab))
        );
        assert_eq!(map_key_event(press(KeyCode::F(5), KeyModifiers::NONE)), None);
    }

    #[test]
    fn letters_fold_to_lowercase() {
        assert_eq!(
            map_key_event(press(KeyCode::Char('Q'), KeyModifiers::SHIFT)),
            Some(InputEvent::Key(Key::Char('q')))
        );
    }

    #[test]
    fn ctrl_c_interrupts() {
        assert_eq!(
            map_key_event(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(InputEvent::Interrupt)
        );
        assert_eq!(map_key_event(press(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
    }
}
