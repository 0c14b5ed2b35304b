//! Accelerator strings such as `Ctrl+Alt+B`.

use core::fmt::{self, Display, Formatter};

use browser_plus_event::key::{Key, Modifiers};
use thiserror::Error;

/// A modifier set plus one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: Key,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("unknown key `{0}`")]
    UnknownKey(String),

    #[error("accelerator `{0}` has no key")]
    MissingKey(String),

    #[error("accelerator `{0}` has more than one key")]
    MultipleKeys(String),

    #[error("accelerator `{0}` has an empty component")]
    EmptyComponent(String),

    #[error("key mapping `{0}` must look like `Key=Accelerator`")]
    InvalidMapping(String),
}

impl Hotkey {
    pub const fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// Parse an accelerator.
    ///
    /// Components are separated by `+`, matched case-insensitively, and modifiers may
    /// appear in any order. An empty or blank string yields `Ok(None)`.
    pub fn parse(s: &str) -> Result<Option<Self>, HotkeyError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }

        let mut modifiers = Modifiers::empty();
        let mut key = None;
        for component in s.split('+').map(str::trim) {
            if component.is_empty() {
                return Err(HotkeyError::EmptyComponent(s.to_owned()));
            }

            let lower = component.to_ascii_lowercase();
            if let Some(modifier) = parse_modifier(&lower) {
                modifiers |= modifier;
                continue;
            }

            let parsed =
                parse_key(&lower).ok_or_else(|| HotkeyError::UnknownKey(component.to_owned()))?;
            if key.replace(parsed).is_some() {
                return Err(HotkeyError::MultipleKeys(s.to_owned()));
            }
        }

        match key {
            Some(key) => Ok(Some(Self { modifiers, key })),
            None => Err(HotkeyError::MissingKey(s.to_owned())),
        }
    }
}

impl Display for Hotkey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (Modifiers::CTRL, "Ctrl"),
            (Modifiers::SHIFT, "Shift"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::WIN, "Win"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{name}+")?;
            }
        }

        write_key(f, self.key)
    }
}

/// Write `key` the way accelerators spell it. Keys without a name fall back to hex.
fn write_key(f: &mut Formatter<'_>, key: Key) -> fmt::Result {
    let code = key.code();
    match code {
        b'0'..=b'9' | b'A'..=b'Z' => return write!(f, "{}", code as char),
        0x70..=0x87 => return write!(f, "F{}", code - 0x70 + 1),
        _ => {}
    }

    let name = match key {
        Key::ESCAPE => "Esc",
        Key::TAB => "Tab",
        Key::RETURN => "Enter",
        Key::SPACE => "Space",
        Key::BACK => "Backspace",
        Key::DELETE => "Delete",
        Key::INSERT => "Insert",
        Key::HOME => "Home",
        Key::END => "End",
        Key::PRIOR => "PageUp",
        Key::NEXT => "PageDown",
        Key::LEFT => "Left",
        Key::RIGHT => "Right",
        Key::UP => "Up",
        Key::DOWN => "Down",
        Key::PAUSE => "Pause",
        _ => return write!(f, "{code:#04x}"),
    };

    f.write_str(name)
}

/// One `trigger=target` remapping entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMapping {
    pub trigger: Key,
    pub target: Hotkey,
}

impl KeyMapping {
    /// Parse a `;`-separated list such as `F1=Ctrl+T;F2=Ctrl+Shift+T`.
    ///
    /// Blank entries are ignored.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, HotkeyError> {
        s.split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn parse(entry: &str) -> Result<Self, HotkeyError> {
        let invalid = || HotkeyError::InvalidMapping(entry.to_owned());

        let (trigger, target) = entry.split_once('=').ok_or_else(invalid)?;
        let trigger = Hotkey::parse(trigger)?.ok_or_else(invalid)?;
        if !trigger.modifiers.is_empty() {
            return Err(invalid());
        }
        let target = Hotkey::parse(target)?.ok_or_else(invalid)?;

        Ok(Self {
            trigger: trigger.key,
            target,
        })
    }
}

fn parse_modifier(name: &str) -> Option<Modifiers> {
    Some(match name {
        "ctrl" | "control" => Modifiers::CTRL,
        "alt" | "menu" => Modifiers::ALT,
        "shift" => Modifiers::SHIFT,
        "win" | "super" | "meta" => Modifiers::WIN,
        _ => return None,
    })
}

fn parse_key(name: &str) -> Option<Key> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if let Some(key) = Key::alphanumeric(ch) {
            return Some(key);
        }
    }

    if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        return Key::function(n);
    }

    if let Some(n) = name.strip_prefix("numpad").and_then(|n| n.parse::<u8>().ok()) {
        return (n <= 9).then(|| Key::new(Key::NUMPAD0.code() + n)).flatten();
    }

    Some(match name {
        "esc" | "escape" => Key::ESCAPE,
        "tab" => Key::TAB,
        "enter" | "return" => Key::RETURN,
        "space" => Key::SPACE,
        "backspace" | "back" => Key::BACK,
        "delete" | "del" => Key::DELETE,
        "insert" | "ins" => Key::INSERT,
        "home" => Key::HOME,
        "end" => Key::END,
        "pageup" | "pgup" => Key::PRIOR,
        "pagedown" | "pgdn" => Key::NEXT,
        "left" => Key::LEFT,
        "right" => Key::RIGHT,
        "up" => Key::UP,
        "down" => Key::DOWN,
        "pause" => Key::PAUSE,
        "capslock" => Key::CAPITAL,
        "numlock" => Key::NUMLOCK,
        "scrolllock" => Key::SCROLL,
        "printscreen" | "prtsc" => Key::SNAPSHOT,
        "multiply" => Key::MULTIPLY,
        "add" | "plus" => Key::OEM_PLUS,
        "subtract" => Key::SUBTRACT,
        "decimal" => Key::DECIMAL,
        "divide" => Key::DIVIDE,
        ";" => Key::OEM_1,
        "=" => Key::OEM_PLUS,
        "," => Key::OEM_COMMA,
        "-" | "minus" => Key::OEM_MINUS,
        "." => Key::OEM_PERIOD,
        "/" => Key::OEM_2,
        "`" => Key::OEM_3,
        "[" => Key::OEM_4,
        "\\" => Key::OEM_5,
        "]" => Key::OEM_6,
        "'" => Key::OEM_7,
        _ => return None,
    })
}
