use super::{encode, is_modifier, normalize, KeySet};

/// Records a hotkey while the user holds it down.
///
/// The captured hotkey is the largest chord seen since the capture started.
/// The capture is complete once every non-modifier key of the chord has been
/// released again; a modifier-only chord completes when all keys are up.
#[derive(Debug, Default, Clone)]
pub struct HotkeyCapture {
    held: KeySet,
    captured: KeySet,
}

impl HotkeyCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, raw: &str) {
        let token = normalize(raw);
        if self.held.insert(token) && self.held.len() >= self.captured.len() {
            self.captured = self.held.clone();
        }
    }

    pub fn key_up(&mut self, raw: &str) {
        self.held.remove(&normalize(raw));
    }

    /// Canonical hotkey string captured so far (empty until a key is pressed)
    pub fn hotkey(&self) -> String {
        encode(&self.captured)
    }

    pub fn is_complete(&self) -> bool {
        if self.captured.is_empty() || self.held.iter().any(|k| !is_modifier(k)) {
            return false;
        }
        self.held.is_empty() || self.captured.iter().any(|k| !is_modifier(k))
    }
}
