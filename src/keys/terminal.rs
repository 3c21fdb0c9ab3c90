use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};
use std::collections::BTreeSet;

/// A key transition in raw key-name form, ready for the match engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    Down(String),
    Up(String),
}

enum RawKey {
    Modifier(&'static str),
    Named(String),
}

/// Translates crossterm key events into key-down / key-up transitions.
///
/// Terminals report modifiers as flags on other keys rather than as presses of
/// their own, so modifier transitions are synthesized from the flags: a
/// modifier goes down when it first shows up and goes up once an event arrives
/// without it. When the terminal cannot report releases, every non-modifier
/// press is followed by a synthesized release.
#[derive(Debug, Clone)]
pub struct TerminalKeys {
    reports_release: bool,
    held_modifiers: BTreeSet<&'static str>,
}

impl TerminalKeys {
    pub fn new(reports_release: bool) -> Self {
        Self {
            reports_release,
            held_modifiers: BTreeSet::new(),
        }
    }

    pub fn translate(&mut self, event: &KeyEvent) -> Vec<KeyInput> {
        let mut inputs = Vec::new();
        let flagged = modifier_flags(event.modifiers);
        let key = raw_key(event.code);

        match event.kind {
            KeyEventKind::Repeat => {}
            KeyEventKind::Press => {
                self.release_stale(&flagged, &mut inputs);
                for m in flagged {
                    if self.held_modifiers.insert(m) {
                        inputs.push(KeyInput::Down(m.to_string()));
                    }
                }
                match key {
                    Some(RawKey::Modifier(m)) => {
                        if self.held_modifiers.insert(m) {
                            inputs.push(KeyInput::Down(m.to_string()));
                        }
                    }
                    Some(RawKey::Named(name)) => {
                        inputs.push(KeyInput::Down(name.clone()));
                        if !self.reports_release {
                            inputs.push(KeyInput::Up(name));
                        }
                    }
                    None => {}
                }
            }
            KeyEventKind::Release => {
                match key {
                    Some(RawKey::Modifier(m)) => {
                        if self.held_modifiers.remove(m) {
                            inputs.push(KeyInput::Up(m.to_string()));
                        }
                    }
                    Some(RawKey::Named(name)) => inputs.push(KeyInput::Up(name)),
                    None => {}
                }
                self.release_stale(&flagged, &mut inputs);
            }
        }

        inputs
    }

    fn release_stale(&mut self, flagged: &[&'static str], inputs: &mut Vec<KeyInput>) {
        let stale: Vec<&'static str> = self
            .held_modifiers
            .iter()
            .filter(|m| !flagged.contains(*m))
            .copied()
            .collect();
        for m in stale {
            self.held_modifiers.remove(m);
            inputs.push(KeyInput::Up(m.to_string()));
        }
    }
}

fn modifier_flags(modifiers: KeyModifiers) -> Vec<&'static str> {
    let mut names = Vec::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        names.push("ctrl");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        names.push("alt");
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        names.push("shift");
    }
    if modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META | KeyModifiers::HYPER) {
        names.push("win");
    }
    names
}

fn raw_key(code: KeyCode) -> Option<RawKey> {
    let name = match code {
        KeyCode::Modifier(m) => return modifier_key(m).map(RawKey::Modifier),
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::F(n) => format!("f{n}"),
        KeyCode::Enter => "return".to_string(),
        KeyCode::Esc => "escape".to_string(),
        KeyCode::Tab | KeyCode::BackTab => "tab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Insert => "insert".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        _ => return None,
    };
    Some(RawKey::Named(name))
}

fn modifier_key(code: ModifierKeyCode) -> Option<&'static str> {
    let name = match code {
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => "ctrl",
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt | ModifierKeyCode::IsoLevel3Shift => {
            "alt"
        }
        ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => "shift",
        ModifierKeyCode::LeftSuper
        | ModifierKeyCode::RightSuper
        | ModifierKeyCode::LeftMeta
        | ModifierKeyCode::RightMeta
        | ModifierKeyCode::LeftHyper
        | ModifierKeyCode::RightHyper => "win",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn release(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new_with_kind_and_state(
            code,
            modifiers,
            KeyEventKind::Release,
            KeyEventState::NONE,
        )
    }

    fn down(name: &str) -> KeyInput {
        KeyInput::Down(name.to_string())
    }

    fn up(name: &str) -> KeyInput {
        KeyInput::Up(name.to_string())
    }

    #[test]
    fn test_plain_press_without_release_reporting() {
        let mut keys = TerminalKeys::new(false);
        let inputs = keys.translate(&press(KeyCode::Char('q'), KeyModifiers::NONE));
        assert_eq!(inputs, vec![down("q"), up("q")]);
    }

    #[test]
    fn test_modifiers_stay_down_until_an_event_drops_them() {
        let mut keys = TerminalKeys::new(false);
        let inputs = keys.translate(&press(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(inputs, vec![down("ctrl"), down("s"), up("s")]);

        let inputs = keys.translate(&press(KeyCode::Char('x'), KeyModifiers::CONTROL));
        assert_eq!(inputs, vec![down("x"), up("x")]);

        let inputs = keys.translate(&press(KeyCode::Char('q'), KeyModifiers::NONE));
        assert_eq!(inputs, vec![up("ctrl"), down("q"), up("q")]);
    }

    #[test]
    fn test_release_reporting_terminal() {
        let mut keys = TerminalKeys::new(true);
        assert_eq!(
            keys.translate(&press(
                KeyCode::Modifier(ModifierKeyCode::LeftControl),
                KeyModifiers::CONTROL
            )),
            vec![down("ctrl")]
        );
        assert_eq!(
            keys.translate(&press(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            vec![down("s")]
        );
        assert_eq!(
            keys.translate(&release(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            vec![up("s")]
        );
        assert_eq!(
            keys.translate(&release(
                KeyCode::Modifier(ModifierKeyCode::LeftControl),
                KeyModifiers::NONE
            )),
            vec![up("ctrl")]
        );
    }

    #[test]
    fn test_named_keys_use_raw_names() {
        let mut keys = TerminalKeys::new(false);
        assert_eq!(
            keys.translate(&press(KeyCode::Enter, KeyModifiers::NONE)),
            vec![down("return"), up("return")]
        );
        assert_eq!(
            keys.translate(&press(KeyCode::F(5), KeyModifiers::NONE)),
            vec![down("f5"), up("f5")]
        );
        assert_eq!(
            keys.translate(&press(KeyCode::Char(' '), KeyModifiers::NONE)),
            vec![down("space"), up("space")]
        );
    }

    #[test]
    fn test_repeats_and_unknown_keys_are_ignored() {
        let mut keys = TerminalKeys::new(true);
        let repeat = KeyEvent::new_with_kind_and_state(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
            KeyEventKind::Repeat,
            KeyEventState::NONE,
        );
        assert!(keys.translate(&repeat).is_empty());
        assert!(keys
            .translate(&press(KeyCode::CapsLock, KeyModifiers::NONE))
            .is_empty());
    }
}
