//! Input normalization: turning raw platform transitions into deduplicated,
//! modifier-annotated callbacks and pollable state.

mod keys;
mod state;
mod cursor_mode;

pub use self::keys::{Action, Key, KeyState, Modifiers, MouseButton, KEY_COUNT, MOUSE_BUTTON_COUNT};
pub use self::state::InputState;
pub(crate) use self::cursor_mode::{
    PointerGrab, set_native_cursor_pos, center_cursor, capture_cursor, release_cursor,
    update_cursor_image, set_cursor_mode, disable_cursor, enable_cursor,
    cursor_pos, set_cursor_pos, set_raw_mouse_motion,
};

use crate::os::Platform;
use crate::window::Window;
use crate::Vec2;

/// What happens to the cursor over a window.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum CursorMode {
    /// Visible and free to move.
    Normal,
    /// Invisible over the content area, but free to move.
    Hidden,
    /// Invisible and locked to the window. The reported position is virtual
    /// and unbounded, which suits camera controls.
    Disabled,
    /// Visible but confined to the content area.
    Captured,
}

/// Per-window input settings, as given to `Display::set_input_mode()`.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum InputMode {
    #[allow(missing_docs)]
    Cursor(CursorMode),
    /// Keep released keys pressed until they are polled.
    StickyKeys(bool),
    /// Keep released mouse buttons pressed until they are polled.
    StickyMouseButtons(bool),
    /// Report Caps Lock and Num Lock in modifiers.
    LockKeyMods(bool),
    /// Report unaccelerated motion while the cursor is disabled.
    RawMouseMotion(bool),
}

/// Reports a key transition.
pub(crate) fn input_key(window: &mut Window, key: Key, scancode: i32, action: Action, mods: Modifiers) {
    let action = match window.input.process_key(key, action) {
        Some(a) => a,
        None => return,
    };
    let mods = window.input.filter_mods(mods);
    fire!(window, key, key, scancode, action, mods);
}

/// Reports a typed character. Control characters are dropped.
pub(crate) fn input_char(window: &mut Window, codepoint: char, mods: Modifiers, plain: bool) {
    let cp = codepoint as u32;
    if cp < 32 || (cp > 126 && cp < 160) {
        return;
    }
    let mods = window.input.filter_mods(mods);
    fire!(window, char_mods, codepoint, mods);
    if plain {
        fire!(window, char, codepoint);
    }
}

/// Reports a mouse button transition.
pub(crate) fn input_mouse_click(window: &mut Window, button: MouseButton, action: Action, mods: Modifiers) {
    let action = match window.input.process_button(button, action) {
        Some(a) => a,
        None => return,
    };
    let mods = window.input.filter_mods(mods);
    fire!(window, mouse_button, button, action, mods);
}

/// Reports a cursor position, unless it is the one reported last.
pub(crate) fn input_cursor_pos(window: &mut Window, pos: Vec2<f64>) {
    if window.input.virtual_cursor_pos == pos {
        return;
    }
    window.input.virtual_cursor_pos = pos;
    fire!(window, cursor_pos, pos);
}

pub(crate) fn input_cursor_enter(window: &mut Window, entered: bool) {
    window.input.cursor_tracked = entered;
    fire!(window, cursor_enter, entered);
}

pub(crate) fn input_scroll(window: &mut Window, offset: Vec2<f64>) {
    fire!(window, scroll, offset);
}

/// Reports a focus change. Losing focus releases every key and button that
/// is still held, since their release will be delivered elsewhere.
pub(crate) fn input_focus(platform: &dyn Platform, window: &mut Window, focused: bool) {
    window.focused = focused;
    fire!(window, focus, focused);

    if focused {
        return;
    }
    for key in window.input.pressed_keys() {
        let scancode = platform.key_scancode(key).unwrap_or(-1);
        input_key(window, key, scancode, Action::Release, Modifiers::empty());
    }
    for button in window.input.pressed_buttons() {
        input_mouse_click(window, button, Action::Release, Modifiers::empty());
    }
}

/// The user asked to close the window.
pub(crate) fn input_close_request(window: &mut Window) {
    window.should_close = true;
    fire!(window, close);
}
