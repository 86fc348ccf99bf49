//! Windows, their creation settings, and their callbacks.

use std::fmt;
use std::sync::Arc;

use crate::cursor::CursorId;
use crate::gl::{ClientApi, Context, ContextAttribs};
use crate::input::{Action, InputState, Key, Modifiers, MouseButton};
use crate::monitor::{MonitorId, VideoMode};
use crate::{Extent2, Vec2};

/// Identifies a window created by a `Display`.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct WindowId(pub(crate) u64);

/// How a window behaves, decided at creation time.
///
/// The `Default` implementation mirrors what most desktop applications want:
/// a visible, decorated, resizable window that takes focus.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct WindowSettings {
    /// If `false`, the window won't be resizable, not even manually by
    /// the user.
    pub resizable: bool,
    /// Show the window right after creating it.
    pub visible: bool,
    /// Title bar and borders.
    pub decorated: bool,
    /// Give input focus to the window when it is shown.
    pub focused: bool,
    /// Iconify a full screen window when it loses focus.
    pub auto_iconify: bool,
    /// Keep the window above others.
    pub floating: bool,
    /// Create the window maximized.
    pub maximized: bool,
    /// Move the cursor to the middle of a new full screen window.
    pub center_cursor: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            resizable: true,
            visible: true,
            decorated: true,
            focused: true,
            auto_iconify: true,
            floating: false,
            maximized: false,
            center_cursor: true,
        }
    }
}

macro_rules! callbacks {
    ($($(#[$m:meta])* $field:ident: $set:ident($($arg:ty),*),)+) => {
        /// Closures the event pump calls, at most one per kind of event.
        ///
        /// Setters replace the previous closure and return `self` so that
        /// they can be chained.
        #[derive(Default)]
        pub struct Callbacks {
            $(pub(crate) $field: Option<Box<dyn FnMut(WindowId $(, $arg)*)>>,)+
        }

        impl Callbacks {
            $(
                $(#[$m])*
                pub fn $set<F: FnMut(WindowId $(, $arg)*) + 'static>(&mut self, f: F) -> &mut Self {
                    self.$field = Some(Box::new(f));
                    self
                }
            )+
            /// Removes every callback.
            pub fn clear(&mut self) {
                *self = Self::default();
            }
        }

        impl fmt::Debug for Callbacks {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.debug_struct("Callbacks")
                    $(.field(stringify!($field), &self.$field.is_some()))+
                    .finish()
            }
        }
    };
}

callbacks!{
    /// The user asked to close the window. The close flag is already set.
    close: on_close(),
    /// The content area moved, in screen coordinates.
    pos: on_pos(Vec2<i32>),
    /// The content area was resized, in screen coordinates.
    size: on_size(Extent2<u32>),
    /// The framebuffer was resized, in pixels.
    framebuffer_size: on_framebuffer_size(Extent2<u32>),
    /// The content area needs to be redrawn.
    refresh: on_refresh(),
    /// The window gained (`true`) or lost input focus.
    focus: on_focus(bool),
    /// The window was iconified (`true`) or restored.
    iconify: on_iconify(bool),
    /// The window was maximized (`true`) or restored.
    maximize: on_maximize(bool),
    /// A key was pressed, repeated or released. Also gets the scancode and modifiers.
    key: on_key(Key, i32, Action, Modifiers),
    /// A character was typed, without Alt or Control.
    char: on_char(char),
    /// A character was typed, with whatever modifiers were held.
    char_mods: on_char_mods(char, Modifiers),
    /// A mouse button was pressed or released.
    mouse_button: on_mouse_button(MouseButton, Action, Modifiers),
    /// The cursor moved, relative to the content area.
    cursor_pos: on_cursor_pos(Vec2<f64>),
    /// The cursor entered (`true`) or left the content area.
    cursor_enter: on_cursor_enter(bool),
    /// A scroll wheel or touchpad scrolled.
    scroll: on_scroll(Vec2<f64>),
}

/// Calls a window callback, if one is set.
macro_rules! fire {
    ($window:expr, $field:ident $(, $arg:expr)*) => {{
        let id = $window.id();
        if let Some(cb) = $window.callbacks.$field.as_mut() {
            cb(id $(, $arg)*);
        }
    }};
}

/// A window, as the `Display` sees it.
#[derive(Debug)]
pub struct Window {
    id: WindowId,
    pub(crate) title: String,
    pub(crate) settings: WindowSettings,
    pub(crate) client: ClientApi,
    pub(crate) doublebuffer: bool,
    pub(crate) video_mode: VideoMode,
    pub(crate) monitor: Option<MonitorId>,
    pub(crate) cursor: Option<CursorId>,
    pub(crate) context: Option<Arc<Context>>,
    pub(crate) input: InputState,
    pub(crate) should_close: bool,
    pub(crate) size: Extent2<u32>,
    pub(crate) framebuffer_size: Extent2<u32>,
    pub(crate) pos: Vec2<i32>,
    pub(crate) focused: bool,
    pub(crate) iconified: bool,
    pub(crate) maximized: bool,
    pub(crate) callbacks: Callbacks,
}

impl Window {
    pub(crate) fn new(id: WindowId, title: &str, settings: WindowSettings, client: ClientApi, doublebuffer: bool, video_mode: VideoMode) -> Self {
        Self {
            id,
            title: title.to_owned(),
            settings,
            client,
            doublebuffer,
            video_mode,
            monitor: None,
            cursor: None,
            context: None,
            input: InputState::default(),
            should_close: false,
            size: Extent2::new(video_mode.width.max(0) as u32, video_mode.height.max(0) as u32),
            framebuffer_size: Extent2::new(video_mode.width.max(0) as u32, video_mode.height.max(0) as u32),
            pos: Vec2::zero(),
            focused: false,
            iconified: false,
            maximized: false,
            callbacks: Callbacks::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn id(&self) -> WindowId { self.id }
    #[allow(missing_docs)]
    pub fn title(&self) -> &str { &self.title }
    /// The settings the window was created with.
    pub fn settings(&self) -> &WindowSettings { &self.settings }
    /// Last known size of the content area.
    pub fn size(&self) -> Extent2<u32> { self.size }
    /// Last known size of the framebuffer.
    pub fn framebuffer_size(&self) -> Extent2<u32> { self.framebuffer_size }
    /// Last known position of the content area.
    pub fn position(&self) -> Vec2<i32> { self.pos }
    #[allow(missing_docs)]
    pub fn is_focused(&self) -> bool { self.focused }
    #[allow(missing_docs)]
    pub fn is_iconified(&self) -> bool { self.iconified }
    #[allow(missing_docs)]
    pub fn is_maximized(&self) -> bool { self.maximized }
    /// The monitor this window is full screen on, if any.
    pub fn monitor(&self) -> Option<MonitorId> { self.monitor }
    /// The video mode requested for full screen.
    pub fn video_mode(&self) -> VideoMode { self.video_mode }
    /// The cursor shown over the content area, unless it's the default one.
    pub fn cursor(&self) -> Option<CursorId> { self.cursor }
    #[allow(missing_docs)]
    pub fn should_close(&self) -> bool { self.should_close }
    /// Keys, buttons and cursor state.
    pub fn input(&self) -> &InputState { &self.input }
    #[allow(missing_docs)]
    pub fn client_api(&self) -> ClientApi { self.client }
    /// What the driver reported about this window's context, if it has one.
    pub fn context_attribs(&self) -> Option<ContextAttribs> {
        self.context.as_ref().map(|c| c.attribs())
    }
    /// Closures called for this window's events.
    pub fn callbacks_mut(&mut self) -> &mut Callbacks { &mut self.callbacks }
}
