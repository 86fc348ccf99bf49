//! Hints affect this crate's behaviour, either globally (`InitHints`) or for
//! the next windows to be created (`WindowHints`).
//!
//! Window hints are copied when a window is created and never looked at again
//! by that window, so changing them afterwards only affects future windows.

use crate::fbconfig::FramebufferConfig;
use crate::gl::ContextConfig;
use crate::window::WindowSettings;
use crate::DONT_CARE;

/// Which platform backend a `Display` should run on.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum PlatformChoice {
    /// The native backend for the target, if one was compiled in.
    Any,
    /// The Win32 + WGL backend. Only available on Windows targets.
    Win32,
    /// The headless backend, which has no native windows and a scripted
    /// message queue. Available everywhere.
    Null,
}

impl Default for PlatformChoice {
    fn default() -> Self {
        PlatformChoice::Any
    }
}

/// Library-wide settings, consumed by `Display::new()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitHints {
    /// The backend to initialize.
    pub platform: PlatformChoice,
}

/// Everything that affects how the next window is created.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowHints {
    /// Window behaviour.
    pub window: WindowSettings,
    /// The desired framebuffer attributes. `DONT_CARE` fields are ignored when
    /// ranking pixel formats.
    pub framebuffer: FramebufferConfig,
    /// The desired rendering context.
    pub context: ContextConfig,
    /// The desired refresh rate of full screen windows, or `DONT_CARE`.
    pub refresh_rate: i32,
}

impl Default for WindowHints {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            framebuffer: FramebufferConfig::default(),
            context: ContextConfig::default(),
            refresh_rate: DONT_CARE,
        }
    }
}
