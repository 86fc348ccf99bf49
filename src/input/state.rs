//! Per-window key and button tables, and the rules that turn raw platform
//! transitions into the actions reported to callbacks.

use super::keys::{Action, Key, KeyState, Modifiers, MouseButton, KEY_COUNT, MOUSE_BUTTON_COUNT};
use super::CursorMode;
use crate::Vec2;

/// A window's input state.
#[derive(Debug, Clone)]
pub struct InputState {
    keys: [KeyState; KEY_COUNT],
    buttons: [KeyState; MOUSE_BUTTON_COUNT],
    sticky_keys: bool,
    sticky_buttons: bool,
    pub(crate) lock_key_mods: bool,
    pub(crate) raw_mouse_motion: bool,
    pub(crate) cursor_mode: CursorMode,
    /// Reported position while the cursor is disabled.
    pub(crate) virtual_cursor_pos: Vec2<f64>,
    /// Last position the platform reported or was told about.
    pub(crate) last_cursor_pos: Vec2<f64>,
    pub(crate) cursor_tracked: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            keys: [KeyState::Release; KEY_COUNT],
            buttons: [KeyState::Release; MOUSE_BUTTON_COUNT],
            sticky_keys: false,
            sticky_buttons: false,
            lock_key_mods: false,
            raw_mouse_motion: false,
            cursor_mode: CursorMode::Normal,
            virtual_cursor_pos: Vec2::zero(),
            last_cursor_pos: Vec2::zero(),
            cursor_tracked: false,
        }
    }
}

impl InputState {
    /// The table entry for `key`. `Unknown` is always `Release`.
    pub fn key_state(&self, key: Key) -> KeyState {
        key.index().map(|i| self.keys[i]).unwrap_or(KeyState::Release)
    }
    /// The table entry for `button`.
    pub fn button_state(&self, button: MouseButton) -> KeyState {
        self.buttons[button.index()]
    }
    #[allow(missing_docs)]
    pub fn sticky_keys(&self) -> bool { self.sticky_keys }
    #[allow(missing_docs)]
    pub fn sticky_buttons(&self) -> bool { self.sticky_buttons }
    #[allow(missing_docs)]
    pub fn lock_key_mods(&self) -> bool { self.lock_key_mods }
    #[allow(missing_docs)]
    pub fn raw_mouse_motion(&self) -> bool { self.raw_mouse_motion }
    #[allow(missing_docs)]
    pub fn cursor_mode(&self) -> CursorMode { self.cursor_mode }
    /// Whether the pointer is known to be inside the window.
    pub fn cursor_inside(&self) -> bool { self.cursor_tracked }

    /// Strips lock modifiers unless they were asked for.
    pub(crate) fn filter_mods(&self, mods: Modifiers) -> Modifiers {
        if self.lock_key_mods {
            mods
        } else {
            mods - (Modifiers::CAPS_LOCK | Modifiers::NUM_LOCK)
        }
    }

    /// Updates the key table and returns what to report, or `None` if the
    /// transition must be swallowed.
    pub(crate) fn process_key(&mut self, key: Key, action: Action) -> Option<Action> {
        let i = match key.index() {
            Some(i) => i,
            None => return Some(action),
        };
        let mut action = action;
        match action {
            Action::Release => {
                if self.keys[i] == KeyState::Release {
                    return None;
                }
                self.keys[i] = if self.sticky_keys { KeyState::Stick } else { KeyState::Release };
            },
            Action::Press => {
                if self.keys[i] == KeyState::Press {
                    action = Action::Repeat;
                }
                self.keys[i] = KeyState::Press;
            },
            Action::Repeat => {
                self.keys[i] = KeyState::Press;
            },
        }
        Some(action)
    }

    /// Updates the button table and returns what to report, or `None` if the
    /// transition must be swallowed. Buttons never repeat.
    pub(crate) fn process_button(&mut self, button: MouseButton, action: Action) -> Option<Action> {
        let i = button.index();
        match action {
            Action::Release => {
                if self.buttons[i] == KeyState::Release {
                    return None;
                }
                self.buttons[i] = if self.sticky_buttons { KeyState::Stick } else { KeyState::Release };
                Some(Action::Release)
            },
            Action::Press | Action::Repeat => {
                self.buttons[i] = KeyState::Press;
                Some(Action::Press)
            },
        }
    }

    /// Polls a key: a `Stick` entry reports `Press` once, then drains.
    pub(crate) fn poll_key(&mut self, key: Key) -> Action {
        let i = match key.index() {
            Some(i) => i,
            None => return Action::Release,
        };
        match self.keys[i] {
            KeyState::Stick => {
                self.keys[i] = KeyState::Release;
                Action::Press
            },
            KeyState::Press => Action::Press,
            KeyState::Release => Action::Release,
        }
    }

    /// Polls a button, with the same draining as keys.
    pub(crate) fn poll_button(&mut self, button: MouseButton) -> Action {
        let i = button.index();
        match self.buttons[i] {
            KeyState::Stick => {
                self.buttons[i] = KeyState::Release;
                Action::Press
            },
            KeyState::Press => Action::Press,
            KeyState::Release => Action::Release,
        }
    }

    pub(crate) fn set_sticky_keys(&mut self, enabled: bool) {
        if self.sticky_keys == enabled {
            return;
        }
        if !enabled {
            for state in self.keys.iter_mut().filter(|s| **s == KeyState::Stick) {
                *state = KeyState::Release;
            }
        }
        self.sticky_keys = enabled;
    }

    pub(crate) fn set_sticky_buttons(&mut self, enabled: bool) {
        if self.sticky_buttons == enabled {
            return;
        }
        if !enabled {
            for state in self.buttons.iter_mut().filter(|s| **s == KeyState::Stick) {
                *state = KeyState::Release;
            }
        }
        self.sticky_buttons = enabled;
    }

    /// Keys currently held down, by increasing code.
    pub(crate) fn pressed_keys(&self) -> Vec<Key> {
        Key::ALL.iter().cloned().filter(|k| self.key_state(*k) == KeyState::Press).collect()
    }

    /// Buttons currently held down.
    pub(crate) fn pressed_buttons(&self) -> Vec<MouseButton> {
        MouseButton::ALL.iter().cloned().filter(|b| self.button_state(*b) == KeyState::Press).collect()
    }
}
