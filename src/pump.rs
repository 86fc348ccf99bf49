//! The event pump: drains the native message queue and turns each message
//! into window state changes and callbacks, synchronously.

use crate::display::Display;
use crate::error::{self, Result};
use crate::event::{Message, RawMotion, ResizeKind};
use crate::input::{self, CursorMode, Key, KeyState};
use crate::monitor::{self, Monitor, MonitorEvent, MonitorInfo};
use crate::os::Platform;
use crate::registry::Registry;
use crate::timeout::Timeout;
use crate::window::Window;

impl Display {
    /// Processes every pending event, without blocking.
    pub fn poll_events(&mut self) -> Result<()> {
        let r = self.check_alive();
        if r.is_ok() {
            self.drain();
        }
        self.report(r)
    }

    /// Blocks until at least one event is available, then processes every
    /// pending event.
    pub fn wait_events(&mut self) -> Result<()> {
        self.wait(Timeout::Infinite)
    }

    /// Same as `wait_events()`, but gives up waiting after `seconds`, which
    /// must be finite and positive or zero. Expiring is not an error.
    pub fn wait_events_timeout(&mut self, seconds: f64) -> Result<()> {
        match Timeout::from_secs_f64(seconds) {
            Some(timeout) => self.wait(timeout),
            None => {
                let r = error::invalid_value(format!("Invalid time {}", seconds));
                self.report(r)
            },
        }
    }

    /// Wakes up a thread blocked in `wait_events()`.
    pub fn post_empty_event(&self) -> Result<()> {
        let r = self.check_alive();
        if r.is_ok() {
            self.platform.post_empty_event();
        }
        self.report(r)
    }

    fn wait(&mut self, timeout: Timeout) -> Result<()> {
        let r = self.check_alive();
        if r.is_ok() {
            trace!("Waiting for messages ({:?})", timeout);
            self.platform.wait_messages(timeout);
            self.drain();
        }
        self.report(r)
    }

    fn drain(&mut self) {
        while let Some(msg) = self.platform.next_message() {
            trace!("Dispatching {:?}", msg);
            let r = self.dispatch(msg);
            let _ = self.report(r);
        }
        self.reconcile();
    }

    fn dispatch(&mut self, msg: Message) -> Result<()> {
        match msg {
            Message::Empty => Ok(()),
            Message::Quit => {
                for window in self.registry.windows.iter_mut() {
                    input::input_close_request(window);
                }
                Ok(())
            },
            Message::MonitorsChanged => self.refresh_monitors(),
            msg => {
                let id = match msg.window() {
                    Some(id) => id,
                    None => return Ok(()),
                };
                let Registry { windows, monitors, grab, .. } = &mut self.registry;
                let window = match windows.iter_mut().find(|w| w.id() == id) {
                    Some(w) => w,
                    None => {
                        trace!("Dropping message for destroyed window {:?}", id);
                        return Ok(());
                    },
                };
                dispatch_to_window(&mut *self.platform, monitors, grab, window, msg)
            },
        }
    }

    /// Catches up on what the platform doesn't report reliably.
    fn reconcile(&mut self) {
        let platform = &mut *self.platform;
        let Registry { windows, grab, .. } = &mut self.registry;

        // Pressing both Shift keys and releasing one only reports the last release.
        if let Some(window) = windows.iter_mut().find(|w| platform.is_focused(w.id())) {
            for &key in &[Key::LeftShift, Key::RightShift] {
                if window.input.key_state(key) != KeyState::Press || platform.is_key_down(key) {
                    continue;
                }
                warn!("Missed the release of {:?} on window {:?}", key, window.id());
                let scancode = platform.key_scancode(key).unwrap_or(-1);
                let mods = platform.key_modifiers();
                input::input_key(window, key, scancode, crate::input::Action::Release, mods);
            }
        }

        if let Some(id) = grab.disabled_window {
            if let Some(window) = windows.iter_mut().find(|w| w.id() == id) {
                let size = platform.window_size(id);
                let center = crate::Vec2::new(f64::from(size.w) / 2., f64::from(size.h) / 2.);
                if window.input.last_cursor_pos != center {
                    input::set_native_cursor_pos(platform, window, center);
                }
            }
        }
    }

    /// Enumerates monitors again, keeping the identity of those still
    /// connected and fixing up the full screen windows of those gone.
    pub(crate) fn refresh_monitors(&mut self) -> Result<()> {
        let infos = self.platform.monitors()?;
        let events = update_monitors(&mut *self.platform, &mut self.registry, infos);
        if let Some(cb) = self.monitor_callback.as_mut() {
            for (id, event) in events {
                cb(id, event);
            }
        }
        Ok(())
    }
}

fn update_monitors(platform: &mut dyn Platform, registry: &mut Registry, infos: Vec<MonitorInfo>) -> Vec<(crate::MonitorId, MonitorEvent)> {
    let mut events = Vec::new();
    let mut old: Vec<Monitor> = registry.monitors.drain(..).collect();
    let mut monitors = Vec::with_capacity(infos.len());

    for info in infos {
        match old.iter().position(|m| m.info.native_id == info.native_id) {
            Some(i) => {
                let mut m = old.remove(i);
                m.info = info;
                monitors.push(m);
            },
            None => {
                let m = Monitor::new(registry.next_monitor_id(), info);
                info!("Monitor `{}` connected", m.name());
                events.push((m.id(), MonitorEvent::Connected));
                monitors.push(m);
            },
        }
    }

    for gone in old {
        info!("Monitor `{}` disconnected", gone.name());
        for window in registry.windows.iter_mut().filter(|w| w.monitor == Some(gone.id())) {
            let (pos, size) = (window.pos, window.size);
            debug!("Window {:?} leaves full screen: its monitor is gone", window.id());
            window.monitor = None;
            if let Err(e) = platform.set_windowed(window.id(), pos, size) {
                warn!("Failed to make window {:?} windowed: {}", window.id(), e);
            }
        }
        events.push((gone.id(), MonitorEvent::Disconnected));
    }

    registry.monitors = monitors;
    events
}

fn find_monitor<'a>(monitors: &'a mut [Monitor], window: &Window) -> Option<&'a mut Monitor> {
    let id = window.monitor?;
    monitors.iter_mut().find(|m| m.id() == id)
}

fn dispatch_to_window(platform: &mut dyn Platform, monitors: &mut [Monitor], grab: &mut input::PointerGrab, window: &mut Window, msg: Message) -> Result<()> {
    let id = window.id();
    match msg {
        Message::CloseRequested(_) => input::input_close_request(window),
        Message::Focus { focused: true, .. } => {
            input::input_focus(platform, window, true);
            match window.input.cursor_mode {
                CursorMode::Disabled => input::disable_cursor(platform, grab, window),
                CursorMode::Captured => input::capture_cursor(platform, grab, id),
                _ => (),
            }
        },
        Message::Focus { focused: false, .. } => {
            match window.input.cursor_mode {
                CursorMode::Disabled => input::enable_cursor(platform, grab, window),
                CursorMode::Captured => input::release_cursor(platform, grab),
                _ => (),
            }
            if window.monitor.is_some() && window.settings.auto_iconify {
                platform.iconify_window(id);
            }
            input::input_focus(platform, window, false);
        },
        Message::Key { key, scancode, action, .. } => {
            let mods = platform.key_modifiers();
            input::input_key(window, key, scancode, action, mods);
        },
        Message::Char { codepoint, plain, .. } => {
            let mods = platform.key_modifiers();
            input::input_char(window, codepoint, mods, plain);
        },
        Message::MouseButton { button, action, .. } => {
            let mods = platform.key_modifiers();
            input::input_mouse_click(window, button, action, mods);
        },
        Message::CursorMoved { position, .. } => {
            if !window.input.cursor_tracked {
                input::input_cursor_enter(window, true);
            }
            if window.input.cursor_mode == CursorMode::Disabled {
                // Raw motion, or another window holding the pointer, leaves
                // the reference position alone.
                if grab.disabled_window != Some(id) || window.input.raw_mouse_motion {
                    return Ok(());
                }
                let delta = position - window.input.last_cursor_pos;
                let pos = window.input.virtual_cursor_pos + delta;
                input::input_cursor_pos(window, pos);
            } else {
                input::input_cursor_pos(window, position);
            }
            window.input.last_cursor_pos = position;
        },
        Message::RawMotion { motion, .. } => {
            if grab.disabled_window != Some(id) || !window.input.raw_mouse_motion {
                return Ok(());
            }
            let delta = match motion {
                RawMotion::Relative(d) => d,
                RawMotion::Absolute(p) => p - window.input.last_cursor_pos,
            };
            let pos = window.input.virtual_cursor_pos + delta;
            input::input_cursor_pos(window, pos);
            window.input.last_cursor_pos += delta;
        },
        Message::CursorLeft { .. } => input::input_cursor_enter(window, false),
        Message::Scroll { offset, .. } => input::input_scroll(window, offset),
        Message::Resized { size, kind, .. } => {
            let iconified = kind == ResizeKind::Iconified;
            let maximized = kind == ResizeKind::Maximized || (window.maximized && kind != ResizeKind::Restored);

            if grab.captured_window == Some(id) {
                input::capture_cursor(platform, grab, id);
            }
            if window.iconified != iconified {
                fire!(window, iconify, iconified);
            }
            if window.maximized != maximized {
                fire!(window, maximize, maximized);
            }
            if window.size != size {
                window.size = size;
                window.framebuffer_size = platform.framebuffer_size(id);
                let fb = window.framebuffer_size;
                fire!(window, framebuffer_size, fb);
                fire!(window, size, size);
            }

            let was_iconified = window.iconified;
            window.iconified = iconified;
            window.maximized = maximized;
            if was_iconified != iconified {
                if let Some(monitor) = find_monitor(monitors, window) {
                    if iconified {
                        monitor::release_monitor(platform, monitor, id);
                    } else {
                        monitor::acquire_monitor(platform, monitor, window)?;
                    }
                }
            }
        },
        Message::Moved { position, .. } => {
            window.pos = position;
            fire!(window, pos, position);
        },
        Message::Damaged(_) => fire!(window, refresh),
        Message::SetCursor(_) => input::update_cursor_image(platform, window),
        Message::Quit | Message::Empty | Message::MonitorsChanged => (),
    }
    Ok(())
}
