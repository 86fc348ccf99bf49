//! The `Display`: the entry point that owns the platform backend and every
//! window, cursor and monitor created through it.

use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;
use std::os::raw::c_void;
use std::sync::Arc;

use crate::cursor::{Cursor, CursorId, CursorImage, CursorSource, StandardCursor};
use crate::error::{self, Error, ErrorKind, Result};
use crate::fbconfig::select_framebuffer_config;
use crate::gl::{self, Context, ContextAttribs, ContextHandle, ContextState};
use crate::hint::{InitHints, PlatformChoice, WindowHints};
use crate::image::RgbaImage;
use crate::input::{self, Action, InputMode, Key, MouseButton};
use crate::monitor::{self, Monitor, MonitorEvent, MonitorId, VideoMode};
use crate::os::headless::{HeadlessPlatform, HeadlessProbe};
use crate::os::{NativeWindowDesc, Platform};
use crate::registry::Registry;
use crate::window::{Callbacks, Window, WindowId};
use crate::{Extent2, Vec2, DONT_CARE};

/// The connection to the window system.
///
/// A `Display` stays on the thread that created it. Contexts of its windows
/// may still be used from other threads through `ContextHandle`s.
pub struct Display {
    pub(crate) platform: Box<dyn Platform>,
    pub(crate) registry: Registry,
    hints: WindowHints,
    error_callback: Option<Box<dyn Fn(&Error)>>,
    pub(crate) monitor_callback: Option<Box<dyn FnMut(MonitorId, MonitorEvent)>>,
    alive: bool,
    _not_send: PhantomData<*const ()>,
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Display")
            .field("platform", &self.platform.name())
            .field("registry", &self.registry)
            .field("hints", &self.hints)
            .field("alive", &self.alive)
            .finish()
    }
}

#[cfg(windows)]
fn native_platform() -> Result<Box<dyn Platform>> {
    Ok(Box::new(crate::os::windows::Win32Platform::new()?))
}

#[cfg(not(windows))]
fn native_platform() -> Result<Box<dyn Platform>> {
    Err(Error::new(ErrorKind::PlatformUnavailable, "The Win32 platform is only available on Windows"))
}

impl Display {
    /// Connects to the platform selected by `hints`.
    pub fn new(hints: &InitHints) -> Result<Self> {
        let platform: Box<dyn Platform> = match hints.platform {
            PlatformChoice::Null => Box::new(HeadlessPlatform::new().0),
            PlatformChoice::Win32 | PlatformChoice::Any => native_platform()?,
        };
        Self::with_platform(platform)
    }

    /// Uses the given backend.
    pub fn with_platform(platform: Box<dyn Platform>) -> Result<Self> {
        let mut display = Self {
            platform,
            registry: Registry::new(),
            hints: WindowHints::default(),
            error_callback: None,
            monitor_callback: None,
            alive: true,
            _not_send: PhantomData,
        };
        display.refresh_monitors()?;
        info!("Display initialized on the {} platform, with {} monitor(s)", display.platform.name(), display.registry.monitors.len());
        Ok(display)
    }

    /// A display over the headless backend, along with the probe that
    /// scripts it.
    pub fn headless() -> Result<(Self, HeadlessProbe)> {
        let (platform, probe) = HeadlessPlatform::new();
        Ok((Self::with_platform(Box::new(platform))?, probe))
    }

    pub(crate) fn check_alive(&self) -> Result<()> {
        if self.alive {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::NotInitialized, "The display was terminated"))
        }
    }

    fn report_error(&self, e: &Error) {
        error!("{}", e);
        self.registry.slots.record_error(e);
        if let Some(cb) = self.error_callback.as_ref() {
            cb(e);
        }
    }

    /// Records the error of a failed operation, tells the error callback,
    /// and passes the result through.
    pub(crate) fn report<T>(&self, r: Result<T>) -> Result<T> {
        if let Err(ref e) = r {
            self.report_error(e);
        }
        r
    }

    fn run<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let r = self.check_alive().and_then(|()| f(self));
        self.report(r)
    }

    fn run_mut<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let r = self.check_alive().and_then(|()| f(self));
        self.report(r)
    }

    /// The last error that happened on the calling thread, if any. It is
    /// cleared by this call.
    pub fn take_error(&self) -> Option<Error> {
        self.registry.slots.take_error()
    }

    /// Sets a closure called with every error, on the thread it happens.
    pub fn set_error_callback<F: Fn(&Error) + 'static>(&mut self, f: F) {
        self.error_callback = Some(Box::new(f));
    }
    #[allow(missing_docs)]
    pub fn clear_error_callback(&mut self) {
        self.error_callback = None;
    }

    /// Sets a closure called when monitors are connected or disconnected.
    pub fn set_monitor_callback<F: FnMut(MonitorId, MonitorEvent) + 'static>(&mut self, f: F) {
        self.monitor_callback = Some(Box::new(f));
    }
    #[allow(missing_docs)]
    pub fn clear_monitor_callback(&mut self) {
        self.monitor_callback = None;
    }

    /// Hints for the next windows to be created.
    pub fn hints(&self) -> &WindowHints { &self.hints }
    /// Hints for the next windows to be created. Windows that exist already
    /// are not affected.
    pub fn hints_mut(&mut self) -> &mut WindowHints { &mut self.hints }
    /// Resets the window hints to their defaults.
    pub fn default_window_hints(&mut self) {
        self.hints = WindowHints::default();
    }

    /// Creates a window (full screen on `monitor`, if given) and, unless the
    /// client API hint is `NoApi`, its context. The context shares objects
    /// with the context of `share`, if given.
    ///
    /// On failure, nothing created so far survives.
    pub fn create_window(&mut self, size: Extent2<u32>, title: &str, monitor: Option<MonitorId>, share: Option<WindowId>) -> Result<WindowId> {
        self.run_mut(|d| d.create_window_inner(size, title, monitor, share))
    }

    fn create_window_inner(&mut self, size: Extent2<u32>, title: &str, monitor: Option<MonitorId>, share: Option<WindowId>) -> Result<WindowId> {
        let extent = window_extent(size)?;
        let hints = self.hints.clone();
        let share = match share {
            Some(s) => match self.registry.window(s)?.context {
                Some(ref c) => Some(c.clone()),
                None => return Err(Error::no_window_context()),
            },
            None => None,
        };
        hints.context.validate(share.as_ref().map(|c| c.attribs()).as_ref())?;
        let monitor_index = match monitor {
            Some(m) => Some(self.registry.monitor_index(m)?),
            None => None,
        };

        let video_mode = VideoMode {
            width: extent.w,
            height: extent.h,
            red_bits: hints.framebuffer.red_bits,
            green_bits: hints.framebuffer.green_bits,
            blue_bits: hints.framebuffer.blue_bits,
            refresh_rate: hints.refresh_rate,
        };
        let id = self.registry.next_window_id();
        let mut window = Window::new(id, title, hints.window, hints.context.client, hints.framebuffer.doublebuffer, video_mode);
        window.monitor = monitor;
        self.registry.windows.insert(0, window);

        match self.init_window(id, size, &hints, monitor_index, share) {
            Ok(()) => {
                debug!("Created window {:?} `{}`", id, title);
                Ok(id)
            },
            Err(e) => {
                debug!("Unwinding creation of window {:?}", id);
                self.destroy_window_inner(id);
                Err(e)
            },
        }
    }

    fn init_window(&mut self, id: WindowId, size: Extent2<u32>, hints: &WindowHints, monitor_index: Option<usize>, share: Option<Arc<Context>>) -> Result<()> {
        let monitor_info = monitor_index.map(|i| self.registry.monitors[i].info.clone());
        let title = self.registry.window(id)?.title.clone();
        let desc = NativeWindowDesc {
            title: &title,
            size,
            settings: &hints.window,
            monitor: monitor_info.as_ref(),
            transparent: hints.framebuffer.transparent,
        };
        self.platform.create_window(id, &desc)?;

        if hints.context.client != gl::ClientApi::NoApi {
            let configs = self.platform.framebuffer_configs(id, &hints.context)?;
            let fb = match select_framebuffer_config(&hints.framebuffer, &configs) {
                Some(fb) => *fb,
                None => return Err(Error::new(ErrorKind::FormatUnavailable, "Failed to find a suitable pixel format")),
            };
            debug!("Window {:?} uses pixel format {:?}", id, fb);
            let native = self.platform.create_context(id, &fb, &hints.context, share.as_ref().map(|c| c.native()))?;
            let context = Arc::new(Context::new(id, fb.doublebuffer, native, hints.context));
            self.registry.window_mut(id)?.context = Some(context.clone());
            gl::refresh_attribs(&context, &hints.context, &self.registry.slots)?;
        }

        let platform = &mut *self.platform;
        let Registry { windows, monitors, .. } = &mut self.registry;
        let window = match windows.iter_mut().find(|w| w.id() == id) {
            Some(w) => w,
            None => return Err(Error::invalid_handle(format!("{:?} does not exist", id))),
        };
        match monitor_index {
            Some(i) => {
                platform.show_window(id);
                platform.focus_window(id);
                monitor::acquire_monitor(platform, &mut monitors[i], window)?;
                if hints.window.center_cursor {
                    input::center_cursor(platform, window);
                }
            },
            None => if hints.window.visible {
                platform.show_window(id);
                if hints.window.focused {
                    platform.focus_window(id);
                }
            },
        }
        window.size = platform.window_size(id);
        window.framebuffer_size = platform.framebuffer_size(id);
        window.pos = platform.window_pos(id);
        Ok(())
    }

    /// Destroys a window and its context. If the context is current on the
    /// calling thread, no context is current afterwards.
    pub fn destroy_window(&mut self, id: WindowId) -> Result<()> {
        self.run_mut(|d| {
            d.registry.window(id)?;
            d.destroy_window_inner(id);
            Ok(())
        })
    }

    fn destroy_window_inner(&mut self, id: WindowId) {
        let platform = &mut *self.platform;
        let Registry { windows, monitors, grab, slots, .. } = &mut self.registry;
        let index = match windows.iter().position(|w| w.id() == id) {
            Some(i) => i,
            None => return,
        };
        {
            let window = &mut windows[index];
            // No events while tearing down.
            window.callbacks.clear();

            if let Some(m) = window.monitor.and_then(|m| monitors.iter_mut().find(|x| x.id() == m)) {
                monitor::release_monitor(platform, m, id);
            }
            if let Some(context) = window.context.take() {
                if let Err(e) = gl::unbind_everywhere(slots, &context) {
                    warn!("Failed to unbind the context of window {:?}: {}", id, e);
                }
                context.destroy();
            }
            if grab.disabled_window == Some(id) {
                input::enable_cursor(platform, grab, window);
            }
            if grab.captured_window == Some(id) {
                input::release_cursor(platform, grab);
            }
        }
        platform.destroy_window(id);
        windows.remove(index);
        debug!("Destroyed window {:?}", id);
    }

    /// A live window.
    pub fn window(&self, id: WindowId) -> Result<&Window> {
        let r = self.check_alive().and_then(|()| self.registry.window(id));
        self.report(r)
    }

    /// A live window.
    pub fn window_mut(&mut self, id: WindowId) -> Result<&mut Window> {
        if let Err(e) = self.check_alive().and_then(|()| self.registry.window(id).map(|_| ())) {
            self.report_error(&e);
            return Err(e);
        }
        self.registry.window_mut(id)
    }

    /// Every live window, most recently created first.
    pub fn windows(&self) -> &[Window] {
        &self.registry.windows
    }

    /// The callbacks of a window.
    pub fn callbacks_mut(&mut self, id: WindowId) -> Result<&mut Callbacks> {
        self.window_mut(id).map(|w| w.callbacks_mut())
    }

    /// Whether the user asked to close the window.
    pub fn should_close(&self, id: WindowId) -> Result<bool> {
        self.run(|d| Ok(d.registry.window(id)?.should_close))
    }

    #[allow(missing_docs)]
    pub fn set_should_close(&mut self, id: WindowId, value: bool) -> Result<()> {
        self.run_mut(|d| {
            d.registry.window_mut(id)?.should_close = value;
            Ok(())
        })
    }

    /// Makes a window full screen on `monitor`, or windowed at `pos` with
    /// `size` if `monitor` is `None`. For full screen windows, `size` and
    /// `refresh_rate` select the video mode.
    pub fn set_window_monitor(&mut self, id: WindowId, monitor: Option<MonitorId>, pos: Vec2<i32>, size: Extent2<u32>, refresh_rate: i32) -> Result<()> {
        self.run_mut(|d| {
            let extent = window_extent(size)?;
            if refresh_rate < 0 && refresh_rate != DONT_CARE {
                return error::invalid_value(format!("Invalid refresh rate {}", refresh_rate));
            }
            let new_index = match monitor {
                Some(m) => Some(d.registry.monitor_index(m)?),
                None => None,
            };

            let platform = &mut *d.platform;
            let Registry { windows, monitors, .. } = &mut d.registry;
            let window = match windows.iter_mut().find(|w| w.id() == id) {
                Some(w) => w,
                None => return Err(Error::invalid_handle(format!("{:?} does not exist", id))),
            };
            window.video_mode.width = extent.w;
            window.video_mode.height = extent.h;
            window.video_mode.refresh_rate = refresh_rate;

            if window.monitor == monitor {
                match new_index {
                    Some(i) => if monitors[i].window == Some(id) {
                        monitor::acquire_monitor(platform, &mut monitors[i], window)?;
                    },
                    None => {
                        platform.set_windowed(id, pos, size)?;
                        window.size = platform.window_size(id);
                        window.framebuffer_size = platform.framebuffer_size(id);
                        window.pos = platform.window_pos(id);
                    },
                }
                return Ok(());
            }

            if let Some(m) = window.monitor.and_then(|m| monitors.iter_mut().find(|x| x.id() == m)) {
                monitor::release_monitor(platform, m, id);
            }
            window.monitor = monitor;
            match new_index {
                Some(i) => monitor::acquire_monitor(platform, &mut monitors[i], window)?,
                None => {
                    platform.set_windowed(id, pos, size)?;
                    window.size = platform.window_size(id);
                    window.framebuffer_size = platform.framebuffer_size(id);
                    window.pos = platform.window_pos(id);
                },
            }
            Ok(())
        })
    }

    /// Makes the context of `window` current on the calling thread, or makes
    /// no context current.
    pub fn make_context_current(&self, window: Option<WindowId>) -> Result<()> {
        self.run(|d| {
            let target = match window {
                Some(id) => Some(d.window_context(id)?),
                None => None,
            };
            gl::make_current(&d.registry.slots, target.as_ref())
        })
    }

    fn window_context(&self, id: WindowId) -> Result<Arc<Context>> {
        match self.registry.window(id)?.context {
            Some(ref c) => Ok(c.clone()),
            None => Err(Error::no_window_context()),
        }
    }

    /// The window whose context is current on the calling thread.
    pub fn current_context(&self) -> Option<WindowId> {
        self.registry.slots.current_context().map(|c| c.window())
    }

    /// A handle to the context of `window`, which may be sent to another thread.
    pub fn context_handle(&self, window: WindowId) -> Result<ContextHandle> {
        self.run(|d| Ok(ContextHandle::new(d.window_context(window)?, d.registry.slots.clone())))
    }

    /// Queries the driver again for what the context of `window` is, and
    /// reapplies its swap interval. The context must not be current on
    /// another thread.
    pub fn refresh_context_attribs(&self, window: WindowId) -> Result<ContextAttribs> {
        self.run(|d| {
            let context = d.window_context(window)?;
            gl::refresh_attribs(&context, context.config(), &d.registry.slots)?;
            Ok(context.attribs())
        })
    }

    /// Where the context of `window` is in its life.
    pub fn context_state(&self, window: WindowId) -> Result<ContextState> {
        self.run(|d| Ok(match d.registry.window(window)?.context {
            Some(ref c) => c.state(),
            None => ContextState::Uncreated,
        }))
    }

    /// Presents the back buffer of `window`. Does nothing, apart from
    /// logging, while no context is current on the calling thread.
    pub fn swap_buffers(&self, window: WindowId) -> Result<()> {
        self.run(|d| {
            let context = d.window_context(window)?;
            gl::swap_buffers(&d.registry.slots, &context)
        })
    }

    /// Sets the swap interval of the context current on the calling thread.
    pub fn set_swap_interval(&self, interval: i32) -> Result<()> {
        self.run(|d| gl::set_swap_interval(&d.registry.slots, interval))
    }

    /// Whether the context current on the calling thread supports an
    /// extension, either through the client API or the platform API.
    pub fn extension_supported(&self, name: &str) -> Result<bool> {
        self.run(|d| gl::current_extension_supported(&d.registry.slots, name))
    }

    /// Retrieves a function of the context current on the calling thread.
    pub fn get_proc_address(&self, name: &str) -> Result<Option<*const c_void>> {
        self.run(|d| gl::current_proc_address(&d.registry.slots, name))
    }

    /// Polls a key: `Press` if it is held or was released while sticky keys
    /// were on and not polled since.
    pub fn get_key(&mut self, window: WindowId, key: Key) -> Result<Action> {
        self.run_mut(|d| {
            if key == Key::Unknown {
                return error::invalid_enum("Invalid key Unknown");
            }
            Ok(d.registry.window_mut(window)?.input.poll_key(key))
        })
    }

    /// Polls a mouse button, the same way as keys.
    pub fn get_mouse_button(&mut self, window: WindowId, button: MouseButton) -> Result<Action> {
        self.run_mut(|d| Ok(d.registry.window_mut(window)?.input.poll_button(button)))
    }

    /// Changes an input setting of a window.
    pub fn set_input_mode(&mut self, window: WindowId, mode: InputMode) -> Result<()> {
        self.run_mut(|d| {
            let platform = &mut *d.platform;
            let Registry { windows, grab, .. } = &mut d.registry;
            let w = match windows.iter_mut().find(|w| w.id() == window) {
                Some(w) => w,
                None => return Err(Error::invalid_handle(format!("{:?} does not exist", window))),
            };
            match mode {
                InputMode::Cursor(m) => input::set_cursor_mode(platform, grab, w, m),
                InputMode::StickyKeys(on) => w.input.set_sticky_keys(on),
                InputMode::StickyMouseButtons(on) => w.input.set_sticky_buttons(on),
                InputMode::LockKeyMods(on) => w.input.lock_key_mods = on,
                InputMode::RawMouseMotion(on) => input::set_raw_mouse_motion(platform, grab, w, on)?,
            }
            Ok(())
        })
    }

    /// Whether raw mouse motion can be enabled.
    pub fn raw_mouse_motion_supported(&self) -> bool {
        self.platform.raw_mouse_motion_supported()
    }

    /// The cursor position relative to the content area. Virtual while the
    /// cursor is disabled.
    pub fn cursor_pos(&self, window: WindowId) -> Result<Vec2<f64>> {
        self.run(|d| Ok(input::cursor_pos(&*d.platform, d.registry.window(window)?)))
    }

    /// Moves the cursor. Does nothing unless the window is focused.
    pub fn set_cursor_pos(&mut self, window: WindowId, pos: Vec2<f64>) -> Result<()> {
        self.run_mut(|d| {
            let w = d.registry.window_mut(window)?;
            input::set_cursor_pos(&mut *d.platform, w, pos)
        })
    }

    /// Creates a cursor from an image. `hotspot` is in pixels from the top
    /// left corner.
    pub fn create_cursor(&mut self, image: RgbaImage, hotspot: Vec2<i32>) -> Result<CursorId> {
        self.run_mut(|d| {
            image.validate()?;
            d.add_cursor(CursorSource::Image { image, hotspot })
        })
    }

    /// Creates a cursor with a standard shape.
    pub fn create_standard_cursor(&mut self, shape: StandardCursor) -> Result<CursorId> {
        self.run_mut(|d| d.add_cursor(CursorSource::Standard(shape)))
    }

    fn add_cursor(&mut self, source: CursorSource) -> Result<CursorId> {
        let id = self.registry.next_cursor_id();
        self.platform.create_cursor(id, &source)?;
        self.registry.cursors.insert(0, Cursor { id, source });
        Ok(id)
    }

    /// Destroys a cursor. Windows using it go back to the default cursor.
    pub fn destroy_cursor(&mut self, id: CursorId) -> Result<()> {
        self.run_mut(|d| {
            let index = d.registry.cursor_index(id)?;
            d.destroy_cursor_at(index);
            Ok(())
        })
    }

    fn destroy_cursor_at(&mut self, index: usize) {
        let id = self.registry.cursors[index].id();
        let platform = &mut *self.platform;
        for window in self.registry.windows.iter_mut().filter(|w| w.cursor == Some(id)) {
            window.cursor = None;
            if platform.cursor_in_content_area(window.id()) {
                input::update_cursor_image(platform, window);
            }
        }
        platform.destroy_cursor(id);
        self.registry.cursors.remove(index);
    }

    /// Live cursors, most recently created first.
    pub fn cursors(&self) -> &[Cursor] {
        &self.registry.cursors
    }

    /// Sets the cursor shown over a window, or goes back to the default one.
    pub fn set_cursor(&mut self, window: WindowId, cursor: Option<CursorId>) -> Result<()> {
        self.run_mut(|d| {
            if let Some(c) = cursor {
                d.registry.cursor_index(c)?;
            }
            let w = d.registry.window_mut(window)?;
            w.cursor = cursor;
            if d.platform.cursor_in_content_area(window) {
                input::update_cursor_image(&mut *d.platform, w);
            }
            Ok(())
        })
    }

    /// The image a window's cursor mode and cursor call for.
    pub fn cursor_image(&self, window: WindowId) -> Result<CursorImage> {
        self.run(|d| {
            let w = d.registry.window(window)?;
            Ok(match w.input.cursor_mode() {
                input::CursorMode::Hidden | input::CursorMode::Disabled => CursorImage::Hidden,
                _ => w.cursor.map(CursorImage::Custom).unwrap_or(CursorImage::Arrow),
            })
        })
    }

    /// Connected monitors, primary first.
    pub fn monitors(&self) -> &[Monitor] {
        &self.registry.monitors
    }

    #[allow(missing_docs)]
    pub fn primary_monitor(&self) -> Option<&Monitor> {
        self.registry.monitors.first()
    }

    /// A connected monitor.
    pub fn monitor(&self, id: MonitorId) -> Result<&Monitor> {
        let r = self.check_alive()
            .and_then(|()| self.registry.monitor_index(id))
            .map(|i| &self.registry.monitors[i]);
        self.report(r)
    }

    /// The video modes a monitor supports, sorted and without duplicates.
    pub fn video_modes(&mut self, id: MonitorId) -> Result<Vec<VideoMode>> {
        self.run_mut(|d| {
            let i = d.registry.monitor_index(id)?;
            Ok(d.registry.monitors[i].video_modes(&mut *d.platform)?.to_vec())
        })
    }

    /// The mode a monitor is in.
    pub fn video_mode(&mut self, id: MonitorId) -> Result<VideoMode> {
        self.run_mut(|d| {
            let i = d.registry.monitor_index(id)?;
            let native_id = d.registry.monitors[i].info.native_id.clone();
            d.platform.current_video_mode(&native_id)
        })
    }

    /// Destroys every window and cursor. Any later call fails with
    /// `NotInitialized`. Dropping the display does this too.
    pub fn terminate(&mut self) {
        if !self.alive {
            return;
        }
        self.error_callback = None;
        self.monitor_callback = None;
        if let Err(e) = gl::make_current(&self.registry.slots, None) {
            warn!("Failed to release the current context: {}", e);
        }
        while let Some(id) = self.registry.windows.first().map(|w| w.id()) {
            self.destroy_window_inner(id);
        }
        while !self.registry.cursors.is_empty() {
            self.destroy_cursor_at(0);
        }
        self.alive = false;
        info!("Display terminated");
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// A window size as video mode dimensions, which must be positive and fit
/// in an `i32`.
fn window_extent(size: Extent2<u32>) -> Result<Extent2<i32>> {
    match (i32::try_from(size.w), i32::try_from(size.h)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok(Extent2::new(w, h)),
        _ => error::invalid_value(format!("Invalid window size {}x{}", size.w, size.h)),
    }
}
