pub mod capture;
pub mod hotkey;
pub mod normalize;
pub mod terminal;

// Re-export the main entry points for convenience
pub use capture::HotkeyCapture;
pub use hotkey::{decode, encode, is_single_key, KeySet};
pub use normalize::normalize;
pub use terminal::{KeyInput, TerminalKeys};

/// Canonical modifier tokens, in no particular order
pub const MODIFIERS: [&str; 4] = ["ctrl", "alt", "shift", "win"];

pub fn is_modifier(token: &str) -> bool {
    MODIFIERS.contains(&token)
}

/// Normalize every raw key name and compose the canonical hotkey string
pub fn canonical_hotkey<S: AsRef<str>>(raw_keys: &[S]) -> String {
    let tokens: KeySet = raw_keys.iter().map(|k| normalize(k.as_ref())).collect();
    encode(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_hotkey_from_raw_names() {
        assert_eq!(canonical_hotkey(&["S", "Control_L"]), "ctrl+s");
        assert_eq!(canonical_hotkey(&["right shift", "left ctrl", "P"]), "ctrl+shift+p");
        assert_eq!(canonical_hotkey::<&str>(&[]), "");
    }

    #[test]
    fn test_is_modifier() {
        for m in MODIFIERS {
            assert!(is_modifier(m));
        }
        assert!(!is_modifier("a"));
        assert!(!is_modifier("left ctrl"));
    }
}
