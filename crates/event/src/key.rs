//! Virtual-key vocabulary.

use core::{
    fmt::{self, Debug, Formatter},
    num::NonZeroU8,
};

/// Describe a virtual key code.
///
/// Refer to [Virtual-Key Codes](https://learn.microsoft.com/en-us/windows/win32/inputdev/virtual-key-codes) for details.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Key {
    pub code: NonZeroU8,
}

macro_rules! keys {
    ($($name:ident = $code:literal,)*) => {
        impl Key {
            $(pub const $name: Key = Key::from_const($code);)*
        }
    };
}

keys! {
    LBUTTON = 0x01,
    RBUTTON = 0x02,
    MBUTTON = 0x04,
    BACK = 0x08,
    TAB = 0x09,
    RETURN = 0x0D,
    SHIFT = 0x10,
    CONTROL = 0x11,
    MENU = 0x12,
    PAUSE = 0x13,
    CAPITAL = 0x14,
    ESCAPE = 0x1B,
    SPACE = 0x20,
    PRIOR = 0x21,
    NEXT = 0x22,
    END = 0x23,
    HOME = 0x24,
    LEFT = 0x25,
    UP = 0x26,
    RIGHT = 0x27,
    DOWN = 0x28,
    SNAPSHOT = 0x2C,
    INSERT = 0x2D,
    DELETE = 0x2E,
    LWIN = 0x5B,
    RWIN = 0x5C,
    NUMPAD0 = 0x60,
    MULTIPLY = 0x6A,
    ADD = 0x6B,
    SUBTRACT = 0x6D,
    DECIMAL = 0x6E,
    DIVIDE = 0x6F,
    F1 = 0x70,
    F4 = 0x73,
    F24 = 0x87,
    NUMLOCK = 0x90,
    SCROLL = 0x91,
    OEM_1 = 0xBA,
    OEM_PLUS = 0xBB,
    OEM_COMMA = 0xBC,
    OEM_MINUS = 0xBD,
    OEM_PERIOD = 0xBE,
    OEM_2 = 0xBF,
    OEM_3 = 0xC0,
    OEM_4 = 0xDB,
    OEM_5 = 0xDC,
    OEM_6 = 0xDD,
    OEM_7 = 0xDE,
}

impl Key {
    /// Create a new [`Key`] from a virtual-key code.
    pub const fn new(code: u8) -> Option<Self> {
        match NonZeroU8::new(code) {
            Some(code) => Some(Key { code }),
            None => None,
        }
    }

    const fn from_const(code: u8) -> Self {
        match Self::new(code) {
            Some(key) => key,
            None => panic!("zero virtual key"),
        }
    }

    #[inline]
    pub const fn code(self) -> u8 {
        self.code.get()
    }

    /// Function key `F<n>` for `n` in `1..=24`.
    pub const fn function(n: u8) -> Option<Self> {
        if n >= 1 && n <= 24 {
            Self::new(Key::F1.code() + n - 1)
        } else {
            None
        }
    }

    /// Key of an ASCII letter or digit, case-insensitive.
    pub const fn alphanumeric(ch: char) -> Option<Self> {
        match ch {
            '0'..='9' | 'A'..='Z' => Self::new(ch as u8),
            'a'..='z' => Self::new(ch.to_ascii_uppercase() as u8),
            _ => None,
        }
    }

    /// Modifier this key represents, if any.
    pub const fn modifier(self) -> Option<Modifiers> {
        match self.code() {
            0x10 | 0xA0 | 0xA1 => Some(Modifiers::SHIFT),
            0x11 | 0xA2 | 0xA3 => Some(Modifiers::CTRL),
            0x12 | 0xA4 | 0xA5 => Some(Modifiers::ALT),
            0x5B | 0x5C => Some(Modifiers::WIN),
            _ => None,
        }
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:#04x})", self.code())
    }
}

bitflags::bitflags! {
    /// Modifier set of an accelerator.
    ///
    /// Bit values match the `MOD_*` flags of `RegisterHotKey`.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const ALT = 1;
        const CTRL = 1 << 1;
        const SHIFT = 1 << 2;
        const WIN = 1 << 3;
    }
}

impl Modifiers {
    /// Virtual keys to hold for this modifier set, in press order.
    pub fn keys(self) -> impl Iterator<Item = Key> {
        [
            (Modifiers::CTRL, Key::CONTROL),
            (Modifiers::SHIFT, Key::SHIFT),
            (Modifiers::ALT, Key::MENU),
            (Modifiers::WIN, Key::LWIN),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, key)| key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_keys() {
        assert_eq!(Key::function(1), Some(Key::F1));
        assert_eq!(Key::function(4), Some(Key::F4));
        assert_eq!(Key::function(24), Some(Key::F24));
        assert_eq!(Key::function(0), None);
        assert_eq!(Key::function(25), None);
    }

    #[test]
    fn alphanumeric_keys_are_uppercase_codes() {
        assert_eq!(Key::alphanumeric('w').map(Key::code), Some(b'W'));
        assert_eq!(Key::alphanumeric('7').map(Key::code), Some(b'7'));
        assert_eq!(Key::alphanumeric('-'), None);
    }

    #[test]
    fn modifier_keys_in_press_order() {
        let keys: Vec<_> = (Modifiers::ALT | Modifiers::CTRL).keys().collect();
        assert_eq!(keys, [Key::CONTROL, Key::MENU]);
        assert_eq!(Key::RBUTTON.modifier(), None);
        assert_eq!(Key::new(0xA3).and_then(Key::modifier), Some(Modifiers::CTRL));
    }
}
