//! Platform backends.
//!
//! The rest of the crate only talks to the window system through the
//! `Platform` trait (one object per `Display`) and the `NativeContext` trait
//! (one object per window context).

use std::any::Any;
use std::fmt::Debug;
use std::os::raw::c_void;

use crate::cursor::{CursorId, CursorImage, CursorSource};
use crate::error::Result;
use crate::event::Message;
use crate::fbconfig::FramebufferConfig;
use crate::gl::{ContextConfig, ContextCreationApi};
use crate::input::{Key, Modifiers};
use crate::monitor::{MonitorInfo, VideoMode};
use crate::timeout::Timeout;
use crate::window::{WindowId, WindowSettings};
use crate::{Extent2, Vec2};

pub mod headless;

#[cfg(windows)]
pub mod windows;

/// What a backend needs to know to create a native window.
#[derive(Debug, Clone, Copy)]
pub struct NativeWindowDesc<'a> {
    #[allow(missing_docs)]
    pub title: &'a str,
    /// Size of the content area.
    pub size: Extent2<u32>,
    #[allow(missing_docs)]
    pub settings: &'a WindowSettings,
    /// The monitor to cover, for full screen windows.
    pub monitor: Option<&'a MonitorInfo>,
    /// Whether the framebuffer should be composited with the desktop.
    pub transparent: bool,
}

/// The window system, as seen by a `Display`.
///
/// Window and cursor methods receive identifiers that were handed to
/// `create_window()`/`create_cursor()` and not yet destroyed. Monitor methods
/// receive `MonitorInfo::native_id` values.
pub trait Platform {
    /// A short name for logs.
    fn name(&self) -> &'static str;

    #[allow(missing_docs)]
    fn create_window(&mut self, id: WindowId, desc: &NativeWindowDesc) -> Result<()>;
    #[allow(missing_docs)]
    fn destroy_window(&mut self, id: WindowId);
    #[allow(missing_docs)]
    fn show_window(&mut self, id: WindowId);
    /// Brings the window to front and gives it input focus.
    fn focus_window(&mut self, id: WindowId);
    #[allow(missing_docs)]
    fn iconify_window(&mut self, id: WindowId);
    #[allow(missing_docs)]
    fn is_focused(&self, id: WindowId) -> bool;
    /// Position of the content area.
    fn window_pos(&self, id: WindowId) -> Vec2<i32>;
    /// Size of the content area.
    fn window_size(&self, id: WindowId) -> Extent2<u32>;
    /// Size of the framebuffer, in pixels.
    fn framebuffer_size(&self, id: WindowId) -> Extent2<u32>;
    /// Makes the window cover the monitor.
    fn fit_to_monitor(&mut self, id: WindowId, monitor: &MonitorInfo, mode: &VideoMode) -> Result<()>;
    /// Gives back the window its decorations, position and size.
    fn set_windowed(&mut self, id: WindowId, pos: Vec2<i32>, size: Extent2<u32>) -> Result<()>;

    /// Pointer position relative to the content area.
    fn cursor_pos(&self, id: WindowId) -> Vec2<f64>;
    #[allow(missing_docs)]
    fn set_cursor_pos(&mut self, id: WindowId, pos: Vec2<f64>);
    /// Whether the pointer is over the window's content area and not covered
    /// by another window.
    fn cursor_in_content_area(&self, id: WindowId) -> bool;
    /// Confines the pointer to the window's content area, or releases it.
    fn clip_cursor(&mut self, id: Option<WindowId>);
    #[allow(missing_docs)]
    fn set_cursor_image(&mut self, id: WindowId, image: CursorImage);
    #[allow(missing_docs)]
    fn raw_mouse_motion_supported(&self) -> bool;
    #[allow(missing_docs)]
    fn set_raw_mouse_motion(&mut self, id: WindowId, enabled: bool);
    #[allow(missing_docs)]
    fn create_cursor(&mut self, id: CursorId, source: &CursorSource) -> Result<()>;
    #[allow(missing_docs)]
    fn destroy_cursor(&mut self, id: CursorId);

    /// Modifier keys held right now, lock keys included.
    fn key_modifiers(&self) -> Modifiers;
    /// Whether the key is physically held right now.
    fn is_key_down(&self, key: Key) -> bool;
    /// The platform scancode of a key, if it has one.
    fn key_scancode(&self, key: Key) -> Option<i32>;

    /// Connected monitors, primary first.
    fn monitors(&mut self) -> Result<Vec<MonitorInfo>>;
    /// Every mode a monitor supports, in any order.
    fn video_modes(&mut self, monitor: &str) -> Result<Vec<VideoMode>>;
    #[allow(missing_docs)]
    fn current_video_mode(&mut self, monitor: &str) -> Result<VideoMode>;
    #[allow(missing_docs)]
    fn set_video_mode(&mut self, monitor: &str, mode: &VideoMode) -> Result<()>;
    /// Goes back to the mode the monitor had before `set_video_mode()`.
    fn restore_video_mode(&mut self, monitor: &str);

    /// Pixel formats usable for a context on this window.
    fn framebuffer_configs(&mut self, id: WindowId, ctx: &ContextConfig) -> Result<Vec<FramebufferConfig>>;
    /// Creates a context on the window, with the pixel format chosen among
    /// `framebuffer_configs()`.
    fn create_context(&mut self, id: WindowId, fb: &FramebufferConfig, ctx: &ContextConfig, share: Option<&dyn NativeContext>) -> Result<Box<dyn NativeContext>>;

    /// Pops the next message, without blocking.
    fn next_message(&mut self) -> Option<Message>;
    /// Blocks until a message is available or the timeout expires.
    fn wait_messages(&mut self, timeout: Timeout);
    /// Wakes up a thread blocked in `wait_messages()`.
    fn post_empty_event(&self);
}

/// A native rendering context.
///
/// Methods take `&self` since contexts are shared with render threads;
/// implementations must tolerate `destroy()` being called more than once.
pub trait NativeContext: Debug + Send + Sync {
    /// The API the context was created with. Never changes.
    fn creation_api(&self) -> ContextCreationApi;
    /// Binds the context to the calling thread.
    fn make_current(&self) -> Result<()>;
    /// Unbinds whatever context of this API is bound to the calling thread.
    fn detach(&self) -> Result<()>;
    #[allow(missing_docs)]
    fn swap_buffers(&self) -> Result<()>;
    /// Whether `set_swap_interval()` does anything.
    fn swap_interval_supported(&self) -> bool;
    #[allow(missing_docs)]
    fn set_swap_interval(&self, interval: i32) -> Result<()>;
    /// Searches the platform's own extension string (WGL, GLX, EGL...).
    fn extension_supported(&self, name: &str) -> bool;
    /// Needs the context to be current on the calling thread.
    fn get_proc_address(&self, name: &str) -> Option<*const c_void>;
    #[allow(missing_docs)]
    fn destroy(&self);
    #[allow(missing_docs)]
    fn as_any(&self) -> &dyn Any;
}
