use std::os::raw::c_int;
use super::winapi_utils::*;
use crate::input::Key;

macro_rules! vkeys {
    ($($VK:expr => $Key:ident,)+) => {
        /// Maps a virtual key code. Digits and letters are their ASCII code.
        pub fn key_from_vkey(vkey: c_int) -> Key {
            match vkey {
                $(vkey if vkey == $VK => Key::$Key,)+
                0x30..=0x39 | 0x41..=0x5A => Key::from_code(vkey),
                _ => Key::Unknown,
            }
        }
        pub fn vkey_from_key(key: Key) -> Option<c_int> {
            match key {
                $(Key::$Key => Some($VK),)+
                k if (k >= Key::Num0 && k <= Key::Num9) || (k >= Key::A && k <= Key::Z) => Some(k.code()),
                _ => None,
            }
        }
    };
}

vkeys!{
    VK_SPACE => Space,
    VK_OEM_7 => Apostrophe,
    VK_OEM_COMMA => Comma,
    VK_OEM_MINUS => Minus,
    VK_OEM_PERIOD => Period,
    VK_OEM_2 => Slash,
    VK_OEM_1 => Semicolon,
    VK_OEM_PLUS => Equal,
    VK_OEM_4 => LeftBracket,
    VK_OEM_5 => Backslash,
    VK_OEM_6 => RightBracket,
    VK_OEM_3 => GraveAccent,
    VK_OEM_102 => World2,
    VK_ESCAPE => Escape,
    VK_RETURN => Enter,
    VK_TAB => Tab,
    VK_BACK => Backspace,
    VK_INSERT => Insert,
    VK_DELETE => Delete,
    VK_RIGHT => Right,
    VK_LEFT => Left,
    VK_DOWN => Down,
    VK_UP => Up,
    VK_PRIOR => PageUp,
    VK_NEXT => PageDown,
    VK_HOME => Home,
    VK_END => End,
    VK_CAPITAL => CapsLock,
    VK_SCROLL => ScrollLock,
    VK_NUMLOCK => NumLock,
    VK_SNAPSHOT => PrintScreen,
    VK_PAUSE => Pause,
    VK_F1 => F1,
    VK_F2 => F2,
    VK_F3 => F3,
    VK_F4 => F4,
    VK_F5 => F5,
    VK_F6 => F6,
    VK_F7 => F7,
    VK_F8 => F8,
    VK_F9 => F9,
    VK_F10 => F10,
    VK_F11 => F11,
    VK_F12 => F12,
    VK_F13 => F13,
    VK_F14 => F14,
    VK_F15 => F15,
    VK_F16 => F16,
    VK_F17 => F17,
    VK_F18 => F18,
    VK_F19 => F19,
    VK_F20 => F20,
    VK_F21 => F21,
    VK_F22 => F22,
    VK_F23 => F23,
    VK_F24 => F24,
    VK_NUMPAD0 => Kp0,
    VK_NUMPAD1 => Kp1,
    VK_NUMPAD2 => Kp2,
    VK_NUMPAD3 => Kp3,
    VK_NUMPAD4 => Kp4,
    VK_NUMPAD5 => Kp5,
    VK_NUMPAD6 => Kp6,
    VK_NUMPAD7 => Kp7,
    VK_NUMPAD8 => Kp8,
    VK_NUMPAD9 => Kp9,
    VK_DECIMAL => KpDecimal,
    VK_DIVIDE => KpDivide,
    VK_MULTIPLY => KpMultiply,
    VK_SUBTRACT => KpSubtract,
    VK_ADD => KpAdd,
    VK_LSHIFT => LeftShift,
    VK_LCONTROL => LeftControl,
    VK_LMENU => LeftAlt,
    VK_LWIN => LeftSuper,
    VK_RSHIFT => RightShift,
    VK_RCONTROL => RightControl,
    VK_RMENU => RightAlt,
    VK_RWIN => RightSuper,
    VK_APPS => Menu,
}

/// The scancode of a key message, extended bit included.
pub fn scancode(lparam: LPARAM) -> c_int {
    (HIWORD(lparam as DWORD) & (KF_EXTENDED | 0xFF)) as c_int
}

/// Resolves the side of modifier keys and the keypad Enter key, which share
/// their virtual key code with their twin.
pub fn key_from_message(vkey: WPARAM, lparam: LPARAM) -> Key {
    let extended = HIWORD(lparam as DWORD) & KF_EXTENDED != 0;
    let vkey = vkey as c_int;
    match vkey {
        VK_SHIFT => {
            let sc = (HIWORD(lparam as DWORD) & 0xFF) as UINT;
            match unsafe { MapVirtualKeyW(sc, MAPVK_VSC_TO_VK_EX) } as c_int {
                VK_RSHIFT => Key::RightShift,
                _ => Key::LeftShift,
            }
        },
        VK_CONTROL => if extended { Key::RightControl } else { Key::LeftControl },
        VK_MENU => if extended { Key::RightAlt } else { Key::LeftAlt },
        VK_RETURN if extended => Key::KpEnter,
        _ => key_from_vkey(vkey),
    }
}
