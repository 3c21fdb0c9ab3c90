/// Symbols produced by holding shift over a digit or punctuation key (US layout)
const SHIFTED: [(&str, &str); 21] = [
    ("1", "!"),
    ("2", "@"),
    ("3", "#"),
    ("4", "$"),
    ("5", "%"),
    ("6", "^"),
    ("7", "&"),
    ("8", "*"),
    ("9", "("),
    ("0", ")"),
    ("-", "_"),
    ("=", "+"),
    ("[", "{"),
    ("]", "}"),
    ("\\", "|"),
    (";", ":"),
    ("'", "\""),
    (",", "<"),
    (".", ">"),
    ("/", "?"),
    ("`", "~"),
];

/// Map a raw, platform or layout specific key name to its canonical token.
///
/// Lookup order:
/// 1. `shift+<digit-or-punct>` becomes the shifted symbol (`shift+1` → `!`)
/// 2. modifier aliases collapse to `ctrl`, `alt`, `shift` or `win`
/// 3. named keys collapse to a fixed spelling (`return` → `enter`, `kp_1` → `1`)
/// 4. anything else is returned lower-cased and otherwise untouched
pub fn normalize(raw: &str) -> String {
    let key = raw.to_lowercase();

    if let Some(base) = key.strip_prefix("shift+") {
        if let Some((_, shifted)) = SHIFTED.iter().find(|(plain, _)| *plain == base) {
            return (*shifted).to_string();
        }
    }

    if let Some(modifier) = modifier_alias(&key) {
        return modifier.to_string();
    }

    if let Some(named) = named_key(&key) {
        return named.to_string();
    }

    key
}

fn modifier_alias(key: &str) -> Option<&'static str> {
    let canonical = match key {
        "ctrl" | "left ctrl" | "right ctrl" | "control_l" | "control_r" | "control" | "strg" => {
            "ctrl"
        }
        "alt" | "left alt" | "right alt" | "alt_l" | "alt_r" | "alt gr" | "altgr"
        | "alt_graph" => "alt",
        "shift" | "left shift" | "right shift" | "shift_l" | "shift_r" | "umschalt" => "shift",
        "win" | "left windows" | "right windows" | "windows" | "win_l" | "win_r" | "super_l"
        | "super_r" | "super" | "meta_l" | "meta_r" | "meta" => "win",
        _ => return None,
    };
    Some(canonical)
}

fn named_key(key: &str) -> Option<&'static str> {
    let canonical = match key {
        // punctuation spelled out by X11 style keysyms
        "minus" => "-",
        "plus" => "+",
        "comma" => ",",
        "period" | "dot" => ".",
        "slash" => "/",
        "backslash" => "\\",
        "semicolon" => ";",
        "colon" => ":",
        "bracketleft" => "[",
        "bracketright" => "]",
        "braceleft" => "{",
        "braceright" => "}",
        "parenleft" => "(",
        "parenright" => ")",
        "equal" => "=",
        "quotedbl" => "\"",
        "apostrophe" => "'",
        "grave" => "`",
        "asciitilde" => "~",
        "numbersign" => "#",
        "dollar" => "$",
        "percent" => "%",
        "ampersand" => "&",
        "asterisk" => "*",
        "question" => "?",
        "exclaim" => "!",
        "at" => "@",
        "asciicircum" => "^",
        "underscore" => "_",
        "space" => "space",

        "f1" => "f1",
        "f2" => "f2",
        "f3" => "f3",
        "f4" => "f4",
        "f5" => "f5",
        "f6" => "f6",
        "f7" => "f7",
        "f8" => "f8",
        "f9" => "f9",
        "f10" => "f10",
        "f11" => "f11",
        "f12" => "f12",

        "return" | "enter" | "kp_enter" => "enter",
        "escape" | "esc" => "esc",
        "tab" => "tab",
        "backspace" => "backspace",
        "delete" | "del" => "del",
        "insert" | "ins" => "ins",
        "home" => "home",
        "end" => "end",
        "pageup" | "pgup" | "prior" => "pgup",
        "pagedown" | "pgdn" | "next" => "pgdn",
        "up" => "up",
        "down" => "down",
        "left" => "left",
        "right" => "right",

        // German layout
        "adiaeresis" => "ä",
        "odiaeresis" => "ö",
        "udiaeresis" => "ü",
        "ssharp" => "ß",

        "kp_0" => "0",
        "kp_1" => "1",
        "kp_2" => "2",
        "kp_3" => "3",
        "kp_4" => "4",
        "kp_5" => "5",
        "kp_6" => "6",
        "kp_7" => "7",
        "kp_8" => "8",
        "kp_9" => "9",
        "kp_decimal" => ".",
        "kp_divide" => "/",
        "kp_multiply" => "*",
        "kp_subtract" => "-",
        "kp_add" => "+",
        _ => return None,
    };
    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_single_characters() {
        assert_eq!(normalize("A"), "a");
        assert_eq!(normalize("z"), "z");
        assert_eq!(normalize("7"), "7");
    }

    #[test]
    fn test_shifted_symbols() {
        assert_eq!(normalize("shift+1"), "!");
        assert_eq!(normalize("Shift+/"), "?");
        assert_eq!(normalize("shift+="), "+");
        assert_eq!(normalize("shift+`"), "~");
        assert_eq!(normalize("shift+\\"), "|");
        assert_eq!(SHIFTED.len(), 21);
    }

    #[test]
    fn test_shift_prefix_without_table_entry_passes_through() {
        assert_eq!(normalize("shift+a"), "shift+a");
    }

    #[test]
    fn test_modifier_aliases() {
        for raw in ["left ctrl", "Right Ctrl", "control_l", "CONTROL", "strg"] {
            assert_eq!(normalize(raw), "ctrl", "{raw}");
        }
        for raw in ["left alt", "alt_r", "Alt Gr", "altgr", "alt_graph"] {
            assert_eq!(normalize(raw), "alt", "{raw}");
        }
        for raw in ["left shift", "shift_r", "umschalt", "Shift"] {
            assert_eq!(normalize(raw), "shift", "{raw}");
        }
        for raw in ["left windows", "super_l", "super", "meta_r", "Meta", "windows"] {
            assert_eq!(normalize(raw), "win", "{raw}");
        }
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(normalize("Return"), "enter");
        assert_eq!(normalize("enter"), "enter");
        assert_eq!(normalize("KP_Enter"), "enter");
        assert_eq!(normalize("Escape"), "esc");
        assert_eq!(normalize("Prior"), "pgup");
        assert_eq!(normalize("next"), "pgdn");
        assert_eq!(normalize("delete"), "del");
        assert_eq!(normalize("kp_1"), "1");
        assert_eq!(normalize("kp_add"), "+");
        assert_eq!(normalize("bracketleft"), "[");
        assert_eq!(normalize("adiaeresis"), "ä");
        assert_eq!(normalize("F11"), "f11");
    }

    #[test]
    fn test_unknown_names_pass_through() {
        assert_eq!(normalize("print screen"), "print screen");
        assert_eq!(normalize("XF86AudioPlay"), "xf86audioplay");
        assert_eq!(normalize(""), "");
    }
}
