//! Keys, mouse buttons, actions and modifiers.

use bitflags::bitflags;

macro_rules! keys {
    ($($Key:ident = $code:literal,)+) => {
        /// Physical keys, named after their US layout meaning.
        ///
        /// These are NOT appropriate for text input. For this, use the
        /// character callbacks instead.
        #[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        #[allow(missing_docs)]
        #[repr(i16)]
        pub enum Key {
            /// A key the platform reported but that has no name here.
            Unknown = -1,
            $($Key = $code),+
        }

        impl Key {
            /// Every named key, by increasing code.
            pub const ALL: &'static [Key] = &[$(Key::$Key),+];

            /// Gets the key for a numeric code, or `Unknown`.
            pub fn from_code(code: i32) -> Self {
                match code {
                    $($code => Key::$Key,)+
                    _ => Key::Unknown,
                }
            }
        }
    };
}

keys!{
    Space = 32,
    Apostrophe = 39,
    Comma = 44,
    Minus = 45,
    Period = 46,
    Slash = 47,
    Num0 = 48,
    Num1 = 49,
    Num2 = 50,
    Num3 = 51,
    Num4 = 52,
    Num5 = 53,
    Num6 = 54,
    Num7 = 55,
    Num8 = 56,
    Num9 = 57,
    Semicolon = 59,
    Equal = 61,
    A = 65,
    B = 66,
    C = 67,
    D = 68,
    E = 69,
    F = 70,
    G = 71,
    H = 72,
    I = 73,
    J = 74,
    K = 75,
    L = 76,
    M = 77,
    N = 78,
    O = 79,
    P = 80,
    Q = 81,
    R = 82,
    S = 83,
    T = 84,
    U = 85,
    V = 86,
    W = 87,
    X = 88,
    Y = 89,
    Z = 90,
    LeftBracket = 91,
    Backslash = 92,
    RightBracket = 93,
    GraveAccent = 96,
    World1 = 161,
    World2 = 162,
    Escape = 256,
    Enter = 257,
    Tab = 258,
    Backspace = 259,
    Insert = 260,
    Delete = 261,
    Right = 262,
    Left = 263,
    Down = 264,
    Up = 265,
    PageUp = 266,
    PageDown = 267,
    Home = 268,
    End = 269,
    CapsLock = 280,
    ScrollLock = 281,
    NumLock = 282,
    PrintScreen = 283,
    Pause = 284,
    F1 = 290,
    F2 = 291,
    F3 = 292,
    F4 = 293,
    F5 = 294,
    F6 = 295,
    F7 = 296,
    F8 = 297,
    F9 = 298,
    F10 = 299,
    F11 = 300,
    F12 = 301,
    F13 = 302,
    F14 = 303,
    F15 = 304,
    F16 = 305,
    F17 = 306,
    F18 = 307,
    F19 = 308,
    F20 = 309,
    F21 = 310,
    F22 = 311,
    F23 = 312,
    F24 = 313,
    F25 = 314,
    Kp0 = 320,
    Kp1 = 321,
    Kp2 = 322,
    Kp3 = 323,
    Kp4 = 324,
    Kp5 = 325,
    Kp6 = 326,
    Kp7 = 327,
    Kp8 = 328,
    Kp9 = 329,
    KpDecimal = 330,
    KpDivide = 331,
    KpMultiply = 332,
    KpSubtract = 333,
    KpAdd = 334,
    KpEnter = 335,
    KpEqual = 336,
    LeftShift = 340,
    LeftControl = 341,
    LeftAlt = 342,
    LeftSuper = 343,
    RightShift = 344,
    RightControl = 345,
    RightAlt = 346,
    RightSuper = 347,
    Menu = 348,
}

/// Size of per-window key tables.
pub const KEY_COUNT: usize = Key::Menu as usize + 1;

impl Key {
    /// The numeric code of this key, or -1 for `Unknown`.
    pub fn code(self) -> i32 {
        self as i32
    }
    /// Index into a key table, unless this is `Unknown`.
    pub(crate) fn index(self) -> Option<usize> {
        match self {
            Key::Unknown => None,
            k => Some(k as usize),
        }
    }
}

/// Mouse buttons. `Left`, `Right` and `Middle` are buttons 1, 2 and 3.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum MouseButton {
    Left = 0,
    Right = 1,
    Middle = 2,
    Button4 = 3,
    Button5 = 4,
    Button6 = 5,
    Button7 = 6,
    Button8 = 7,
}

/// Size of per-window mouse button tables.
pub const MOUSE_BUTTON_COUNT: usize = 8;

impl MouseButton {
    /// Every button, in table order.
    pub const ALL: [MouseButton; MOUSE_BUTTON_COUNT] = [
        MouseButton::Left, MouseButton::Right, MouseButton::Middle, MouseButton::Button4,
        MouseButton::Button5, MouseButton::Button6, MouseButton::Button7, MouseButton::Button8,
    ];
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// What happened to a key or button, as reported to callbacks and polls.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Action {
    #[allow(missing_docs)]
    Release,
    #[allow(missing_docs)]
    Press,
    /// A key was held down until it auto-repeated. Never reported for buttons.
    Repeat,
}

/// The state a key or button table entry may be in.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum KeyState {
    #[allow(missing_docs)]
    Release,
    #[allow(missing_docs)]
    Press,
    /// Released while sticky mode was on, and not polled since.
    Stick,
}

bitflags! {
    /// Modifier keys held during a key or button event.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT     = 1 << 0;
        const CONTROL   = 1 << 1;
        const ALT       = 1 << 2;
        const SUPER     = 1 << 3;
        const CAPS_LOCK = 1 << 4;
        const NUM_LOCK  = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_the_table() {
        for &key in Key::ALL {
            assert_eq!(Key::from_code(key.code()), key);
            assert!(key.index().unwrap() < KEY_COUNT);
        }
        assert_eq!(Key::from_code(1000), Key::Unknown);
        assert_eq!(Key::Unknown.index(), None);
    }

    #[test]
    fn printable_keys_match_ascii() {
        assert_eq!(Key::A.code(), 'A' as i32);
        assert_eq!(Key::Num7.code(), '7' as i32);
        assert_eq!(Key::Space.code(), ' ' as i32);
    }
}
