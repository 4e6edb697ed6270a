//! Hotkey detection
//!
//! Kernel-level key event detection using evdev, which works regardless of
//! display server. Requires the user to be in the 'input' group.

pub mod evdev_listener;

use evdev::Key;

/// Events emitted by the hotkey listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The trigger key was pressed
    Pressed,
    /// The trigger key was released
    Released,
}

/// Resolve a trigger key name to an evdev key.
///
/// A single character maps to its letter/digit key; longer names map to
/// evdev KEY_* constants ("SCROLLLOCK", "F13"). An unrecognized value
/// warns and falls back to Z.
pub fn resolve_trigger_key(name: &str) -> Key {
    let key = if name.chars().count() == 1 {
        name.chars().next().and_then(char_key)
    } else {
        name_key(name)
    };

    match key {
        Some(key) => key,
        None => {
            tracing::warn!("Could not set key to '{}', using 'z' instead", name);
            Key::KEY_Z
        }
    }
}

/// Map a single character to its evdev key
fn char_key(c: char) -> Option<Key> {
    let key = match c.to_ascii_lowercase() {
        'a' => Key::KEY_A,
        'b' => Key::KEY_B,
        'c' => Key::KEY_C,
        'd' => Key::KEY_D,
        'e' => Key::KEY_E,
        'f' => Key::KEY_F,
        'g' => Key::KEY_G,
        'h' => Key::KEY_H,
        'i' => Key::KEY_I,
        'j' => Key::KEY_J,
        'k' => Key::KEY_K,
        'l' => Key::KEY_L,
        'm' => Key::KEY_M,
        'n' => Key::KEY_N,
        'o' => Key::KEY_O,
        'p' => Key::KEY_P,
        'q' => Key::KEY_Q,
        'r' => Key::KEY_R,
        's' => Key::KEY_S,
        't' => Key::KEY_T,
        'u' => Key::KEY_U,
        'v' => Key::KEY_V,
        'w' => Key::KEY_W,
        'x' => Key::KEY_X,
        'y' => Key::KEY_Y,
        'z' => Key::KEY_Z,
        '0' => Key::KEY_0,
        '1' => Key::KEY_1,
        '2' => Key::KEY_2,
        '3' => Key::KEY_3,
        '4' => Key::KEY_4,
        '5' => Key::KEY_5,
        '6' => Key::KEY_6,
        '7' => Key::KEY_7,
        '8' => Key::KEY_8,
        '9' => Key::KEY_9,
        _ => return None,
    };
    Some(key)
}

/// Map a key name to an evdev key
fn name_key(name: &str) -> Option<Key> {
    // Normalize: uppercase, strip an optional KEY_ prefix
    let normalized: String = name
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    let normalized = normalized.strip_prefix("KEY_").unwrap_or(&normalized);

    let key = match normalized {
        // Lock keys (good trigger candidates)
        "SCROLLLOCK" => Key::KEY_SCROLLLOCK,
        "PAUSE" => Key::KEY_PAUSE,
        "CAPSLOCK" => Key::KEY_CAPSLOCK,
        "NUMLOCK" => Key::KEY_NUMLOCK,
        "INSERT" => Key::KEY_INSERT,

        // Modifier keys
        "LEFTALT" | "LALT" => Key::KEY_LEFTALT,
        "RIGHTALT" | "RALT" => Key::KEY_RIGHTALT,
        "LEFTCTRL" | "LCTRL" => Key::KEY_LEFTCTRL,
        "RIGHTCTRL" | "RCTRL" => Key::KEY_RIGHTCTRL,
        "LEFTSHIFT" | "LSHIFT" => Key::KEY_LEFTSHIFT,
        "RIGHTSHIFT" | "RSHIFT" => Key::KEY_RIGHTSHIFT,
        "LEFTMETA" | "SUPER" => Key::KEY_LEFTMETA,

        // Function keys (F13-F24 are often unused and make good triggers)
        "F1" => Key::KEY_F1,
        "F2" => Key::KEY_F2,
        "F3" => Key::KEY_F3,
        "F4" => Key::KEY_F4,
        "F5" => Key::KEY_F5,
        "F6" => Key::KEY_F6,
        "F7" => Key::KEY_F7,
        "F8" => Key::KEY_F8,
        "F9" => Key::KEY_F9,
        "F10" => Key::KEY_F10,
        "F11" => Key::KEY_F11,
        "F12" => Key::KEY_F12,
        "F13" => Key::KEY_F13,
        "F14" => Key::KEY_F14,
        "F15" => Key::KEY_F15,
        "F16" => Key::KEY_F16,
        "F17" => Key::KEY_F17,
        "F18" => Key::KEY_F18,
        "F19" => Key::KEY_F19,
        "F20" => Key::KEY_F20,
        "F21" => Key::KEY_F21,
        "F22" => Key::KEY_F22,
        "F23" => Key::KEY_F23,
        "F24" => Key::KEY_F24,

        // Other usable keys
        "SPACE" => Key::KEY_SPACE,
        "TAB" => Key::KEY_TAB,
        "GRAVE" | "BACKTICK" => Key::KEY_GRAVE,
        "HOME" => Key::KEY_HOME,
        "END" => Key::KEY_END,

        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_char_keys() {
        assert_eq!(resolve_trigger_key("z"), Key::KEY_Z);
        assert_eq!(resolve_trigger_key("A"), Key::KEY_A);
        assert_eq!(resolve_trigger_key("5"), Key::KEY_5);
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(resolve_trigger_key("SCROLLLOCK"), Key::KEY_SCROLLLOCK);
        assert_eq!(resolve_trigger_key("ScrollLock"), Key::KEY_SCROLLLOCK);
        assert_eq!(resolve_trigger_key("KEY_F13"), Key::KEY_F13);
        assert_eq!(resolve_trigger_key("f13"), Key::KEY_F13);
        assert_eq!(resolve_trigger_key("ralt"), Key::KEY_RIGHTALT);
    }

    #[test]
    fn test_unknown_key_falls_back_to_z() {
        assert_eq!(resolve_trigger_key("NOT_A_KEY"), Key::KEY_Z);
        assert_eq!(resolve_trigger_key("?"), Key::KEY_Z);
        assert_eq!(resolve_trigger_key(""), Key::KEY_Z);
    }
}
