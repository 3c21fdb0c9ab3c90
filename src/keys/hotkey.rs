use super::is_modifier;
use itertools::Itertools;
use std::collections::BTreeSet;

/// Set of canonical key tokens making up one hotkey
pub type KeySet = BTreeSet<String>;

const SEPARATOR: char = '+';

/// Compose a hotkey string from a set of canonical tokens.
///
/// Modifiers come first, then the remaining keys, each group sorted, so the
/// same set always yields the same string regardless of press order.
pub fn encode<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let (modifiers, others): (Vec<&String>, Vec<&String>) =
        tokens.into_iter().partition(|t| is_modifier(t));

    modifiers
        .into_iter()
        .sorted()
        .chain(others.into_iter().sorted())
        .dedup()
        .join("+")
}

/// Split a hotkey string into its token set.
///
/// The `+` key itself is a valid token: a `+` found where a token is expected
/// is read as the key rather than as a separator.
pub fn decode(hotkey: &str) -> KeySet {
    let mut tokens = KeySet::new();
    let mut rest = hotkey;

    while !rest.is_empty() {
        let token_len = if rest.starts_with(SEPARATOR) {
            SEPARATOR.len_utf8()
        } else {
            rest.find(SEPARATOR).unwrap_or(rest.len())
        };

        tokens.insert(rest[..token_len].to_string());
        rest = &rest[token_len..];
        rest = rest.strip_prefix(SEPARATOR).unwrap_or(rest);
    }

    tokens
}

/// True when the hotkey is one non-modifier key pressed on its own
pub fn is_single_key(parts: &KeySet) -> bool {
    parts.len() == 1 && parts.iter().all(|p| !is_modifier(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> KeySet {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_encode_orders_modifiers_first() {
        assert_eq!(encode(&set(&["s", "ctrl"])), "ctrl+s");
        assert_eq!(encode(&set(&["p", "shift", "ctrl"])), "ctrl+shift+p");
        assert_eq!(encode(&set(&["win", "alt", "b", "a"])), "alt+win+a+b");
        assert_eq!(encode(&set(&["f5"])), "f5");
    }

    #[test]
    fn test_encode_is_independent_of_input_order() {
        let pressed = vec!["x".to_string(), "shift".to_string(), "ctrl".to_string()];
        let reversed: Vec<String> = pressed.iter().rev().cloned().collect();
        assert_eq!(encode(&pressed), encode(&reversed));
        assert_eq!(encode(&pressed), "ctrl+shift+x");
    }

    #[test]
    fn test_encode_empty_set() {
        assert_eq!(encode(&KeySet::new()), "");
    }

    #[test]
    fn test_decode_splits_on_plus() {
        assert_eq!(decode("ctrl+shift+p"), set(&["ctrl", "shift", "p"]));
        assert_eq!(decode("q"), set(&["q"]));
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_plus_key_round_trips() {
        for tokens in [
            set(&["+"]),
            set(&["ctrl", "+"]),
            set(&["ctrl", "+", "a"]),
            set(&["shift", "+", "-"]),
        ] {
            assert_eq!(decode(&encode(&tokens)), tokens, "{}", encode(&tokens));
        }
    }

    #[test]
    fn test_round_trip_law() {
        let samples = [
            set(&["a"]),
            set(&["ctrl"]),
            set(&["ctrl", "s"]),
            set(&["ctrl", "alt", "shift", "win", "del"]),
            set(&["f1", "f2", "space"]),
            set(&["alt", "ä", "ß"]),
        ];
        for tokens in samples {
            assert_eq!(decode(&encode(&tokens)), tokens);
        }
    }

    #[test]
    fn test_is_single_key() {
        assert!(is_single_key(&set(&["q"])));
        assert!(!is_single_key(&set(&["ctrl"])));
        assert!(!is_single_key(&set(&["ctrl", "q"])));
        assert!(!is_single_key(&KeySet::new()));
    }
}
