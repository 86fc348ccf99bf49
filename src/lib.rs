//! DWC - Display, Window and Context
//!
//! A platform layer for desktop windows and their OpenGL/OpenGL ES
//! rendering contexts: window and context creation, pixel format and video
//! mode selection, per-thread current contexts, keyboard and mouse input
//! normalization, cursor modes, monitors, and an event pump.
//!
//! Everything starts with a `Display`:
//!
//! ```no_run
//! use dwc::{Display, Extent2, InitHints};
//!
//! let mut display = Display::new(&InitHints::default()).unwrap();
//! display.hints_mut().context.major = 3;
//! display.hints_mut().context.minor = 3;
//! let window = display.create_window(Extent2::new(800, 600), "Hello", None, None).unwrap();
//! display.make_context_current(Some(window)).unwrap();
//! while !display.should_close(window).unwrap() {
//!     display.swap_buffers(window).unwrap();
//!     display.wait_events().unwrap();
//! }
//! ```
//!
//! The `Null` platform (see `Display::headless()`) has no native windows
//! and is driven by a `HeadlessProbe`, which makes it suitable for tests.

#![doc(html_root_url = "https://docs.rs/dwc/0.1.0")]
#![warn(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate log;
extern crate vek;

pub use vek::{Vec2, Extent2, Rgba};

/// Any field of a hint, framebuffer config or video mode set to this value
/// is ignored when matching.
pub const DONT_CARE: i32 = -1;

pub mod error;
pub use error::{ErrorKind, Error, Result};
pub mod timeout;
pub use timeout::Timeout;
#[macro_use]
pub mod window;
pub use window::{Window, WindowId, WindowSettings, Callbacks};
pub mod hint;
pub use hint::{InitHints, PlatformChoice, WindowHints};
pub mod image;
pub use image::{Image, RgbaImage};
pub mod fbconfig;
pub use fbconfig::{FramebufferConfig, select_framebuffer_config};
pub mod monitor;
pub use monitor::{Monitor, MonitorId, MonitorEvent, MonitorInfo, VideoMode, select_video_mode};
pub mod cursor;
pub use cursor::{Cursor, CursorId, CursorImage, StandardCursor};
pub mod event;
pub mod gl;
pub use gl::{ClientApi, ContextConfig, ContextAttribs, ContextCreationApi, ContextHandle, ContextState, Profile, Robustness, ReleaseBehavior};
pub mod input;
pub use input::{Action, CursorMode, InputMode, Key, KeyState, Modifiers, MouseButton};
pub mod os;
pub use os::headless::{HeadlessDriver, HeadlessMonitor, HeadlessProbe, NativeCall};
mod display;
pub use display::Display;
mod pump;
mod registry;
mod version_cmp;
