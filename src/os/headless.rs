//! The headless backend.
//!
//! There are no native windows: window state lives in memory and reacts to
//! the messages that go through the queue, the way a window manager would.
//! Messages, monitors, pixel formats and the GL driver are all scripted
//! through a `HeadlessProbe`, which may be used from any thread.
//!
//! The GL driver is real as far as callers can tell: `get_proc_address()`
//! hands out actual `extern "system"` functions, which answer for whichever
//! headless context is current on the calling thread.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::{NativeContext, NativeWindowDesc, Platform};
use crate::cursor::{CursorId, CursorImage, CursorSource};
use crate::error::{self, Error, Result};
use crate::event::{Message, ResizeKind};
use crate::fbconfig::FramebufferConfig;
use crate::gl::consts::*;
use crate::gl::{string_in_extension_string, ContextConfig, ContextCreationApi};
use crate::gl::{ClearFn, GetIntegervFn, GetStringFn, GetStringiFn};
use crate::input::{Action, Key, Modifiers};
use crate::monitor::{MonitorInfo, VideoMode};
use crate::timeout::Timeout;
use crate::window::WindowId;
use crate::{Extent2, Vec2};

/// Native calls the headless backend received, in order.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum NativeCall {
    CreateWindow(WindowId),
    DestroyWindow(WindowId),
    ShowWindow(WindowId),
    FocusWindow(WindowId),
    IconifyWindow(WindowId),
    FitToMonitor(WindowId, String),
    SetWindowed(WindowId),
    SetCursorPos(WindowId, Vec2<f64>),
    ClipCursor(Option<WindowId>),
    SetCursorImage(WindowId, CursorImage),
    SetRawMouseMotion(WindowId, bool),
    CreateCursor(CursorId),
    DestroyCursor(CursorId),
    SetVideoMode(String, VideoMode),
    RestoreVideoMode(String),
    CreateContext(WindowId),
    MakeCurrent(WindowId),
    Detach(WindowId),
    SwapBuffers(WindowId),
    SetSwapInterval(WindowId, i32),
    Clear(WindowId),
    DestroyContext(WindowId),
}

/// What a headless window looks like from the outside.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    #[allow(missing_docs)]
    pub title: String,
    #[allow(missing_docs)]
    pub pos: Vec2<i32>,
    #[allow(missing_docs)]
    pub size: Extent2<u32>,
    #[allow(missing_docs)]
    pub visible: bool,
    #[allow(missing_docs)]
    pub focused: bool,
    #[allow(missing_docs)]
    pub iconified: bool,
    #[allow(missing_docs)]
    pub cursor_pos: Vec2<f64>,
    /// Whether the pointer is over the content area.
    pub cursor_inside: bool,
    #[allow(missing_docs)]
    pub cursor_image: CursorImage,
    #[allow(missing_docs)]
    pub raw_motion: bool,
    /// Native id of the monitor this window covers.
    pub monitor: Option<String>,
}

/// A scripted monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMonitor {
    #[allow(missing_docs)]
    pub info: MonitorInfo,
    /// Supported modes, in any order.
    pub modes: Vec<VideoMode>,
    /// The mode the monitor is in.
    pub current: VideoMode,
    /// The mode `restore_video_mode()` goes back to.
    pub desktop: VideoMode,
}

impl HeadlessMonitor {
    /// A monitor supporting `modes`, currently in the last one.
    pub fn new(native_id: &str, name: &str, modes: Vec<VideoMode>) -> Self {
        let current = modes.last().cloned().unwrap_or_else(|| VideoMode::with_size(0, 0));
        Self {
            info: MonitorInfo {
                native_id: native_id.to_owned(),
                name: name.to_owned(),
                position: Vec2::zero(),
                physical_size_mm: Extent2::new(600, 340),
            },
            modes,
            current,
            desktop: current,
        }
    }
}

/// What the scripted GL driver answers. Copied into each new context.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessDriver {
    /// `GL_VERSION`. An empty string makes `glGetString` return NULL.
    pub version: String,
    /// `GL_CONTEXT_FLAGS`.
    pub context_flags: i32,
    /// `GL_CONTEXT_PROFILE_MASK`.
    pub profile_mask: i32,
    /// `GL_EXTENSIONS`, both as a list and as a string.
    pub extensions: Vec<String>,
    /// `GL_RESET_NOTIFICATION_STRATEGY_ARB`.
    pub reset_strategy: i32,
    /// `GL_CONTEXT_RELEASE_BEHAVIOR`.
    pub release_behavior: i32,
    /// Extensions of the context creation API itself.
    pub platform_extensions: Vec<String>,
    /// Whether swap intervals are supported.
    pub swap_control: bool,
    /// Functions `get_proc_address()` pretends not to know.
    pub missing_entry_points: Vec<String>,
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self {
            version: "4.6.0 Headless".to_owned(),
            context_flags: 0,
            profile_mask: GL_CONTEXT_CORE_PROFILE_BIT,
            extensions: vec!["GL_KHR_debug".to_owned()],
            reset_strategy: GL_NO_RESET_NOTIFICATION_ARB,
            release_behavior: GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH,
            platform_extensions: vec!["HEADLESS_swap_control".to_owned()],
            swap_control: true,
            missing_entry_points: Vec::new(),
        }
    }
}

fn default_framebuffer_configs() -> Vec<FramebufferConfig> {
    let base = FramebufferConfig::default();
    vec![
        FramebufferConfig { handle: 1, ..base },
        FramebufferConfig { handle: 2, samples: 4, ..base },
        FramebufferConfig { handle: 3, red_bits: 5, green_bits: 6, blue_bits: 5, alpha_bits: 0, depth_bits: 16, stencil_bits: 0, doublebuffer: false, ..base },
        FramebufferConfig { handle: 4, srgb: true, ..base },
    ]
}

fn default_monitors() -> Vec<HeadlessMonitor> {
    let mode = |width, height, refresh_rate| VideoMode { width, height, red_bits: 8, green_bits: 8, blue_bits: 8, refresh_rate };
    let mut m = HeadlessMonitor::new("HEADLESS-0", "Headless Monitor", vec![
        mode(640, 480, 60), mode(1280, 720, 60), mode(1920, 1080, 144), mode(1920, 1080, 60),
    ]);
    m.info.physical_size_mm = Extent2::new(527, 296);
    vec![m]
}

#[derive(Debug)]
struct State {
    queue: VecDeque<Message>,
    windows: HashMap<WindowId, HeadlessWindow>,
    cursors: HashMap<CursorId, CursorSource>,
    monitors: Vec<HeadlessMonitor>,
    framebuffer_configs: Vec<FramebufferConfig>,
    driver: HeadlessDriver,
    modifiers: Modifiers,
    keys_down: HashSet<Key>,
    raw_motion_supported: bool,
    next_context_error: Option<Error>,
    calls: Vec<NativeCall>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
    fn record(&self, call: NativeCall) {
        trace!("headless: {:?}", call);
        self.lock().calls.push(call);
    }
    fn post(&self, msg: Message) {
        self.lock().queue.push_back(msg);
        self.wake.notify_all();
    }
}

/// The headless `Platform`.
#[derive(Debug)]
pub struct HeadlessPlatform {
    shared: Arc<Shared>,
}

/// Scripts a `HeadlessPlatform` and observes what was done to it.
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    shared: Arc<Shared>,
}

impl HeadlessPlatform {
    /// Creates the platform, along with the probe that drives it.
    pub fn new() -> (Self, HeadlessProbe) {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                windows: HashMap::new(),
                cursors: HashMap::new(),
                monitors: default_monitors(),
                framebuffer_configs: default_framebuffer_configs(),
                driver: HeadlessDriver::default(),
                modifiers: Modifiers::empty(),
                keys_down: HashSet::new(),
                raw_motion_supported: true,
                next_context_error: None,
                calls: Vec::new(),
            }),
            wake: Condvar::new(),
        });
        (Self { shared: shared.clone() }, HeadlessProbe { shared })
    }

    fn with_window<R>(&self, id: WindowId, f: impl FnOnce(&mut HeadlessWindow) -> R) -> Option<R> {
        self.shared.lock().windows.get_mut(&id).map(f)
    }
}

impl HeadlessProbe {
    /// Queues a message, waking up a waiting pump.
    pub fn post(&self, msg: Message) {
        self.shared.post(msg);
    }
    /// Same as `Display::post_empty_event()`, from any thread.
    pub fn post_empty_event(&self) {
        self.shared.post(Message::Empty);
    }
    /// Number of messages not yet pumped.
    pub fn pending(&self) -> usize {
        self.shared.lock().queue.len()
    }
    /// Replaces the pixel formats offered for new contexts.
    pub fn set_framebuffer_configs(&self, configs: Vec<FramebufferConfig>) {
        self.shared.lock().framebuffer_configs = configs;
    }
    /// Replaces the driver behaviour of contexts created from now on.
    pub fn set_driver(&self, driver: HeadlessDriver) {
        self.shared.lock().driver = driver;
    }
    /// Makes the next context creation fail with `error`.
    pub fn fail_next_context(&self, error: Error) {
        self.shared.lock().next_context_error = Some(error);
    }
    /// Replaces the connected monitors. Post `Message::MonitorsChanged` to
    /// let the display know.
    pub fn set_monitors(&self, monitors: Vec<HeadlessMonitor>) {
        self.shared.lock().monitors = monitors;
    }
    /// The monitor with the given native id, as it is now.
    pub fn monitor(&self, native_id: &str) -> Option<HeadlessMonitor> {
        self.shared.lock().monitors.iter().find(|m| m.info.native_id == native_id).cloned()
    }
    /// Sets the live modifier state.
    pub fn set_modifiers(&self, mods: Modifiers) {
        self.shared.lock().modifiers = mods;
    }
    /// Sets whether a key is physically held, without generating messages.
    pub fn set_key_down(&self, key: Key, down: bool) {
        let mut state = self.shared.lock();
        if down {
            state.keys_down.insert(key);
        } else {
            state.keys_down.remove(&key);
        }
    }
    #[allow(missing_docs)]
    pub fn set_raw_motion_supported(&self, supported: bool) {
        self.shared.lock().raw_motion_supported = supported;
    }
    /// Moves the pointer over (or out of) a window without generating messages.
    pub fn set_cursor_inside(&self, id: WindowId, inside: bool) {
        if let Some(w) = self.shared.lock().windows.get_mut(&id) {
            w.cursor_inside = inside;
        }
    }
    /// The state of a live window.
    pub fn window(&self, id: WindowId) -> Option<HeadlessWindow> {
        self.shared.lock().windows.get(&id).cloned()
    }
    /// Native calls received so far.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.shared.lock().calls.clone()
    }
    /// Native calls received so far, forgetting them.
    pub fn take_calls(&self) -> Vec<NativeCall> {
        ::std::mem::replace(&mut self.shared.lock().calls, Vec::new())
    }
}

/// Applies what a message means for window state, as a window manager would
/// have before sending it.
fn emulate(state: &mut State, msg: &Message) {
    match *msg {
        Message::Focus { window, focused } => {
            for (id, w) in state.windows.iter_mut() {
                if *id == window {
                    w.focused = focused;
                } else if focused {
                    w.focused = false;
                }
            }
        },
        Message::CursorMoved { window, position } => if let Some(w) = state.windows.get_mut(&window) {
            w.cursor_pos = position;
            w.cursor_inside = true;
        },
        Message::CursorLeft { window } => if let Some(w) = state.windows.get_mut(&window) {
            w.cursor_inside = false;
        },
        Message::Resized { window, size, kind } => if let Some(w) = state.windows.get_mut(&window) {
            w.size = size;
            w.iconified = kind == ResizeKind::Iconified;
        },
        Message::Moved { window, position } => if let Some(w) = state.windows.get_mut(&window) {
            w.pos = position;
        },
        Message::Key { key, action, .. } => match action {
            Action::Release => { state.keys_down.remove(&key); },
            Action::Press | Action::Repeat => { state.keys_down.insert(key); },
        },
        _ => (),
    }
}

impl Platform for HeadlessPlatform {
    fn name(&self) -> &'static str { "headless" }

    fn create_window(&mut self, id: WindowId, desc: &NativeWindowDesc) -> Result<()> {
        let mut state = self.shared.lock();
        let pos = desc.monitor.map(|m| m.position).unwrap_or_else(Vec2::zero);
        state.windows.insert(id, HeadlessWindow {
            title: desc.title.to_owned(),
            pos,
            size: desc.size,
            visible: false,
            focused: false,
            iconified: false,
            cursor_pos: Vec2::zero(),
            cursor_inside: false,
            cursor_image: CursorImage::Arrow,
            raw_motion: false,
            monitor: desc.monitor.map(|m| m.native_id.clone()),
        });
        state.calls.push(NativeCall::CreateWindow(id));
        Ok(())
    }
    fn destroy_window(&mut self, id: WindowId) {
        let mut state = self.shared.lock();
        state.windows.remove(&id);
        state.queue.retain(|m| m.window() != Some(id));
        state.calls.push(NativeCall::DestroyWindow(id));
    }
    fn show_window(&mut self, id: WindowId) {
        self.with_window(id, |w| w.visible = true);
        self.shared.record(NativeCall::ShowWindow(id));
    }
    fn focus_window(&mut self, id: WindowId) {
        let mut state = self.shared.lock();
        let previous: Vec<WindowId> = state.windows.iter().filter(|(k, w)| w.focused && **k != id).map(|(k, _)| *k).collect();
        for window in previous {
            state.queue.push_back(Message::Focus { window, focused: false });
        }
        state.queue.push_back(Message::Focus { window: id, focused: true });
        // The window manager acts right away; the messages only notify.
        for (k, w) in state.windows.iter_mut() {
            w.focused = *k == id;
        }
        state.calls.push(NativeCall::FocusWindow(id));
        drop(state);
        self.shared.wake.notify_all();
    }
    fn iconify_window(&mut self, id: WindowId) {
        self.shared.lock().calls.push(NativeCall::IconifyWindow(id));
        self.shared.post(Message::Resized { window: id, size: Extent2::new(0, 0), kind: ResizeKind::Iconified });
    }
    fn is_focused(&self, id: WindowId) -> bool {
        self.with_window(id, |w| w.focused).unwrap_or(false)
    }
    fn window_pos(&self, id: WindowId) -> Vec2<i32> {
        self.with_window(id, |w| w.pos).unwrap_or_else(Vec2::zero)
    }
    fn window_size(&self, id: WindowId) -> Extent2<u32> {
        self.with_window(id, |w| w.size).unwrap_or_else(|| Extent2::new(0, 0))
    }
    fn framebuffer_size(&self, id: WindowId) -> Extent2<u32> {
        self.window_size(id)
    }
    fn fit_to_monitor(&mut self, id: WindowId, monitor: &MonitorInfo, mode: &VideoMode) -> Result<()> {
        self.with_window(id, |w| {
            w.pos = monitor.position;
            w.size = Extent2::new(mode.width.max(0) as u32, mode.height.max(0) as u32);
            w.monitor = Some(monitor.native_id.clone());
        });
        self.shared.record(NativeCall::FitToMonitor(id, monitor.native_id.clone()));
        Ok(())
    }
    fn set_windowed(&mut self, id: WindowId, pos: Vec2<i32>, size: Extent2<u32>) -> Result<()> {
        self.with_window(id, |w| {
            w.pos = pos;
            w.size = size;
            w.monitor = None;
        });
        self.shared.record(NativeCall::SetWindowed(id));
        Ok(())
    }

    fn cursor_pos(&self, id: WindowId) -> Vec2<f64> {
        self.with_window(id, |w| w.cursor_pos).unwrap_or_else(Vec2::zero)
    }
    fn set_cursor_pos(&mut self, id: WindowId, pos: Vec2<f64>) {
        self.with_window(id, |w| w.cursor_pos = pos);
        self.shared.record(NativeCall::SetCursorPos(id, pos));
    }
    fn cursor_in_content_area(&self, id: WindowId) -> bool {
        self.with_window(id, |w| w.cursor_inside).unwrap_or(false)
    }
    fn clip_cursor(&mut self, id: Option<WindowId>) {
        self.shared.record(NativeCall::ClipCursor(id));
    }
    fn set_cursor_image(&mut self, id: WindowId, image: CursorImage) {
        self.with_window(id, |w| w.cursor_image = image);
        self.shared.record(NativeCall::SetCursorImage(id, image));
    }
    fn raw_mouse_motion_supported(&self) -> bool {
        self.shared.lock().raw_motion_supported
    }
    fn set_raw_mouse_motion(&mut self, id: WindowId, enabled: bool) {
        self.with_window(id, |w| w.raw_motion = enabled);
        self.shared.record(NativeCall::SetRawMouseMotion(id, enabled));
    }
    fn create_cursor(&mut self, id: CursorId, source: &CursorSource) -> Result<()> {
        let mut state = self.shared.lock();
        state.cursors.insert(id, source.clone());
        state.calls.push(NativeCall::CreateCursor(id));
        Ok(())
    }
    fn destroy_cursor(&mut self, id: CursorId) {
        let mut state = self.shared.lock();
        state.cursors.remove(&id);
        state.calls.push(NativeCall::DestroyCursor(id));
    }

    fn key_modifiers(&self) -> Modifiers {
        self.shared.lock().modifiers
    }
    fn is_key_down(&self, key: Key) -> bool {
        self.shared.lock().keys_down.contains(&key)
    }
    fn key_scancode(&self, key: Key) -> Option<i32> {
        match key {
            Key::Unknown => None,
            k => Some(k.code()),
        }
    }

    fn monitors(&mut self) -> Result<Vec<MonitorInfo>> {
        Ok(self.shared.lock().monitors.iter().map(|m| m.info.clone()).collect())
    }
    fn video_modes(&mut self, monitor: &str) -> Result<Vec<VideoMode>> {
        match self.shared.lock().monitors.iter().find(|m| m.info.native_id == monitor) {
            Some(m) => Ok(m.modes.clone()),
            None => error::platform_failed(format!("Monitor `{}` is not connected", monitor)),
        }
    }
    fn current_video_mode(&mut self, monitor: &str) -> Result<VideoMode> {
        match self.shared.lock().monitors.iter().find(|m| m.info.native_id == monitor) {
            Some(m) => Ok(m.current),
            None => error::platform_failed(format!("Monitor `{}` is not connected", monitor)),
        }
    }
    fn set_video_mode(&mut self, monitor: &str, mode: &VideoMode) -> Result<()> {
        let mut state = self.shared.lock();
        match state.monitors.iter_mut().find(|m| m.info.native_id == monitor) {
            Some(m) => m.current = *mode,
            None => return error::platform_failed(format!("Monitor `{}` is not connected", monitor)),
        }
        state.calls.push(NativeCall::SetVideoMode(monitor.to_owned(), *mode));
        Ok(())
    }
    fn restore_video_mode(&mut self, monitor: &str) {
        let mut state = self.shared.lock();
        if let Some(m) = state.monitors.iter_mut().find(|m| m.info.native_id == monitor) {
            m.current = m.desktop;
        }
        state.calls.push(NativeCall::RestoreVideoMode(monitor.to_owned()));
    }

    fn framebuffer_configs(&mut self, _id: WindowId, _ctx: &ContextConfig) -> Result<Vec<FramebufferConfig>> {
        Ok(self.shared.lock().framebuffer_configs.clone())
    }
    fn create_context(&mut self, id: WindowId, fb: &FramebufferConfig, ctx: &ContextConfig, share: Option<&dyn NativeContext>) -> Result<Box<dyn NativeContext>> {
        if let Some(share) = share {
            match share.as_any().downcast_ref::<HeadlessContext>() {
                Some(s) if !s.destroyed.load(Ordering::SeqCst) => (),
                _ => return error::invalid_value("Cannot share objects with this context"),
            }
        }
        let mut state = self.shared.lock();
        if let Some(e) = state.next_context_error.take() {
            return Err(e);
        }
        let driver = DriverState::new(id, &state.driver, self.shared.clone())?;
        state.calls.push(NativeCall::CreateContext(id));
        trace!("headless: context for {:?} uses pixel format {}", id, fb.handle);
        Ok(Box::new(HeadlessContext {
            window: id,
            api: ctx.source,
            swap_control: state.driver.swap_control,
            platform_extensions: state.driver.platform_extensions.join(" "),
            driver: Arc::new(driver),
            destroyed: AtomicBool::new(false),
        }))
    }

    fn next_message(&mut self) -> Option<Message> {
        let mut state = self.shared.lock();
        let msg = state.queue.pop_front()?;
        emulate(&mut state, &msg);
        Some(msg)
    }
    fn wait_messages(&mut self, timeout: Timeout) {
        let deadline = timeout.deadline(Instant::now());
        let mut state = self.shared.lock();
        while state.queue.is_empty() {
            match deadline {
                None => {
                    state = self.shared.wake.wait(state).unwrap_or_else(PoisonError::into_inner);
                },
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    state = self.shared.wake.wait_timeout(state, deadline - now)
                        .map(|(s, _)| s)
                        .unwrap_or_else(|e| e.into_inner().0);
                },
            }
        }
    }
    fn post_empty_event(&self) {
        self.shared.post(Message::Empty);
    }
}

/// What a headless context's GL functions answer.
#[derive(Debug)]
struct DriverState {
    window: WindowId,
    version: Option<CString>,
    extensions: Vec<CString>,
    extension_string: CString,
    context_flags: i32,
    profile_mask: i32,
    reset_strategy: i32,
    release_behavior: i32,
    missing_entry_points: Vec<String>,
    shared: Arc<Shared>,
}

impl DriverState {
    fn new(window: WindowId, driver: &HeadlessDriver, shared: Arc<Shared>) -> Result<Self> {
        let c = |s: &str| CString::new(s).map_err(|_| Error::invalid_value(format!("`{}` contains a NUL byte", s)));
        let version = if driver.version.is_empty() { None } else { Some(c(&driver.version)?) };
        let extensions = driver.extensions.iter().map(|e| c(e)).collect::<Result<Vec<_>>>()?;
        Ok(Self {
            window,
            version,
            extensions,
            extension_string: c(&driver.extensions.join(" "))?,
            context_flags: driver.context_flags,
            profile_mask: driver.profile_mask,
            reset_strategy: driver.reset_strategy,
            release_behavior: driver.release_behavior,
            missing_entry_points: driver.missing_entry_points.clone(),
            shared,
        })
    }
    fn integer(&self, pname: u32) -> i32 {
        match pname {
            GL_NUM_EXTENSIONS => self.extensions.len() as i32,
            GL_CONTEXT_FLAGS => self.context_flags,
            GL_CONTEXT_PROFILE_MASK => self.profile_mask,
            GL_RESET_NOTIFICATION_STRATEGY_ARB => self.reset_strategy,
            GL_CONTEXT_RELEASE_BEHAVIOR => self.release_behavior,
            _ => 0,
        }
    }
    fn string(&self, name: u32) -> *const u8 {
        match name {
            GL_VERSION => self.version.as_ref().map(|s| s.as_ptr() as *const u8).unwrap_or(ptr::null()),
            GL_EXTENSIONS => self.extension_string.as_ptr() as *const u8,
            _ => ptr::null(),
        }
    }
    fn string_i(&self, name: u32, index: u32) -> *const u8 {
        match name {
            GL_EXTENSIONS => self.extensions.get(index as usize).map(|s| s.as_ptr() as *const u8).unwrap_or(ptr::null()),
            _ => ptr::null(),
        }
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Arc<DriverState>>> = RefCell::new(None);
}

fn with_current<R>(f: impl FnOnce(&DriverState) -> R) -> Option<R> {
    CURRENT.with(|c| c.borrow().as_ref().map(|d| f(d)))
}

unsafe extern "system" fn headless_get_integerv(pname: u32, data: *mut i32) {
    if let Some(v) = with_current(|d| d.integer(pname)) {
        if !data.is_null() {
            *data = v;
        }
    }
}

unsafe extern "system" fn headless_get_string(name: u32) -> *const u8 {
    with_current(|d| d.string(name)).unwrap_or(ptr::null())
}

unsafe extern "system" fn headless_get_stringi(name: u32, index: u32) -> *const u8 {
    with_current(|d| d.string_i(name, index)).unwrap_or(ptr::null())
}

unsafe extern "system" fn headless_clear(_mask: u32) {
    with_current(|d| d.shared.record(NativeCall::Clear(d.window)));
}

/// A headless rendering context.
#[derive(Debug)]
pub struct HeadlessContext {
    window: WindowId,
    api: ContextCreationApi,
    swap_control: bool,
    platform_extensions: String,
    driver: Arc<DriverState>,
    destroyed: AtomicBool,
}

impl HeadlessContext {
    fn record(&self, call: NativeCall) {
        self.driver.shared.record(call);
    }
    fn is_current_here(&self) -> bool {
        CURRENT.with(|c| c.borrow().as_ref().map_or(false, |d| Arc::ptr_eq(d, &self.driver)))
    }
}

impl NativeContext for HeadlessContext {
    fn creation_api(&self) -> ContextCreationApi { self.api }
    fn make_current(&self) -> Result<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return error::platform_failed("Failed to make context current: it was destroyed");
        }
        CURRENT.with(|c| *c.borrow_mut() = Some(self.driver.clone()));
        self.record(NativeCall::MakeCurrent(self.window));
        Ok(())
    }
    fn detach(&self) -> Result<()> {
        CURRENT.with(|c| *c.borrow_mut() = None);
        self.record(NativeCall::Detach(self.window));
        Ok(())
    }
    fn swap_buffers(&self) -> Result<()> {
        self.record(NativeCall::SwapBuffers(self.window));
        Ok(())
    }
    fn swap_interval_supported(&self) -> bool {
        self.swap_control
    }
    fn set_swap_interval(&self, interval: i32) -> Result<()> {
        self.record(NativeCall::SetSwapInterval(self.window, interval));
        Ok(())
    }
    fn extension_supported(&self, name: &str) -> bool {
        string_in_extension_string(name, &self.platform_extensions)
    }
    fn get_proc_address(&self, name: &str) -> Option<*const c_void> {
        if !self.is_current_here() || self.driver.missing_entry_points.iter().any(|m| m == name) {
            return None;
        }
        match name {
            "glGetIntegerv" => Some(headless_get_integerv as GetIntegervFn as *const c_void),
            "glGetString" => Some(headless_get_string as GetStringFn as *const c_void),
            "glGetStringi" => Some(headless_get_stringi as GetStringiFn as *const c_void),
            "glClear" => Some(headless_clear as ClearFn as *const c_void),
            _ => None,
        }
    }
    fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.is_current_here() {
            CURRENT.with(|c| *c.borrow_mut() = None);
        }
        self.record(NativeCall::DestroyContext(self.window));
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}
