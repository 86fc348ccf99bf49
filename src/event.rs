//! Messages decoded from the native queue.
//!
//! Backends turn whatever their window system sends into `Message`s; the
//! event pump turns `Message`s into state changes and callbacks. Nothing is
//! queued in between.

use crate::input::{Action, Key, MouseButton};
use crate::window::WindowId;
use crate::{Extent2, Vec2};

/// How a window was resized.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum ResizeKind {
    /// Back to normal from iconified or maximized.
    Restored,
    #[allow(missing_docs)]
    Iconified,
    #[allow(missing_docs)]
    Maximized,
    /// Any other size change.
    Other,
}

/// Raw pointer motion, unaffected by acceleration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RawMotion {
    /// Offset since the last report.
    Relative(Vec2<f64>),
    /// Position relative to the content area, as some devices (tablets,
    /// remote desktops) report.
    Absolute(Vec2<f64>),
}

/// A decoded window system message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The application was asked to quit.
    Quit,
    /// Posted by `post_empty_event()`, only to wake up a waiting pump.
    Empty,
    /// The user asked to close the window.
    CloseRequested(WindowId),
    #[allow(missing_docs)]
    Focus { window: WindowId, focused: bool },
    /// A physical key changed state. `Repeat` comes from auto-repeat.
    Key { window: WindowId, key: Key, scancode: i32, action: Action },
    /// Text input. `plain` is `false` for characters typed with Alt or
    /// Control held, which only the "char with modifiers" callback sees.
    Char { window: WindowId, codepoint: char, plain: bool },
    #[allow(missing_docs)]
    MouseButton { window: WindowId, button: MouseButton, action: Action },
    /// Pointer position, relative to the content area.
    CursorMoved { window: WindowId, position: Vec2<f64> },
    #[allow(missing_docs)]
    RawMotion { window: WindowId, motion: RawMotion },
    #[allow(missing_docs)]
    CursorLeft { window: WindowId },
    #[allow(missing_docs)]
    Scroll { window: WindowId, offset: Vec2<f64> },
    #[allow(missing_docs)]
    Resized { window: WindowId, size: Extent2<u32>, kind: ResizeKind },
    /// Position of the content area.
    Moved { window: WindowId, position: Vec2<i32> },
    /// Part of the content area needs to be redrawn.
    Damaged(WindowId),
    /// The pointer is over the content area and the cursor image must be set.
    SetCursor(WindowId),
    /// Monitors were connected, disconnected or reconfigured.
    MonitorsChanged,
}

impl Message {
    /// The window this message is about, if any.
    pub fn window(&self) -> Option<WindowId> {
        match *self {
            Message::Quit | Message::Empty | Message::MonitorsChanged => None,
            Message::CloseRequested(w) | Message::Damaged(w) | Message::SetCursor(w) => Some(w),
            Message::Focus { window, .. }
            | Message::Key { window, .. }
            | Message::Char { window, .. }
            | Message::MouseButton { window, .. }
            | Message::CursorMoved { window, .. }
            | Message::RawMotion { window, .. }
            | Message::CursorLeft { window }
            | Message::Scroll { window, .. }
            | Message::Resized { window, .. }
            | Message::Moved { window, .. } => Some(window),
        }
    }
}
