//! The cursor mode state machine.
//!
//! At most one window has its cursor disabled, and at most one has it
//! confined, at any time. Both only take effect while the window is focused;
//! losing focus undoes them and gaining it back re-applies them.

use super::CursorMode;
use crate::cursor::CursorImage;
use crate::error::{self, Result};
use crate::os::Platform;
use crate::window::{Window, WindowId};
use crate::Vec2;

/// Which windows hold the pointer.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct PointerGrab {
    pub disabled_window: Option<WindowId>,
    pub captured_window: Option<WindowId>,
    /// Where to put the pointer back when the disabled window lets it go.
    pub restore_pos: Vec2<f64>,
}

/// Moves the real pointer, and remembers it was moved there.
pub(crate) fn set_native_cursor_pos(platform: &mut dyn Platform, window: &mut Window, pos: Vec2<f64>) {
    platform.set_cursor_pos(window.id(), pos);
    window.input.last_cursor_pos = pos;
}

pub(crate) fn center_cursor(platform: &mut dyn Platform, window: &mut Window) {
    let size = platform.window_size(window.id());
    let center = Vec2::new(f64::from(size.w) / 2., f64::from(size.h) / 2.);
    set_native_cursor_pos(platform, window, center);
}

pub(crate) fn capture_cursor(platform: &mut dyn Platform, grab: &mut PointerGrab, id: WindowId) {
    platform.clip_cursor(Some(id));
    grab.captured_window = Some(id);
}

pub(crate) fn release_cursor(platform: &mut dyn Platform, grab: &mut PointerGrab) {
    platform.clip_cursor(None);
    grab.captured_window = None;
}

/// Shows the image the window's cursor mode calls for.
pub(crate) fn update_cursor_image(platform: &mut dyn Platform, window: &Window) {
    let image = match window.input.cursor_mode {
        CursorMode::Normal | CursorMode::Captured => match window.cursor {
            Some(c) => CursorImage::Custom(c),
            None => CursorImage::Arrow,
        },
        CursorMode::Hidden | CursorMode::Disabled => CursorImage::Hidden,
    };
    platform.set_cursor_image(window.id(), image);
}

/// Switches a window to another cursor mode. Switching to the current mode
/// does nothing.
pub(crate) fn set_cursor_mode(platform: &mut dyn Platform, grab: &mut PointerGrab, window: &mut Window, mode: CursorMode) {
    if window.input.cursor_mode == mode {
        return;
    }
    let id = window.id();
    debug!("Cursor mode of window {:?}: {:?} -> {:?}", id, window.input.cursor_mode, mode);
    window.input.cursor_mode = mode;
    window.input.virtual_cursor_pos = platform.cursor_pos(id);

    if platform.is_focused(id) {
        if mode == CursorMode::Disabled {
            grab.restore_pos = platform.cursor_pos(id);
            center_cursor(platform, window);
            if window.input.raw_mouse_motion {
                platform.set_raw_mouse_motion(id, true);
            }
        } else if grab.disabled_window == Some(id) && window.input.raw_mouse_motion {
            platform.set_raw_mouse_motion(id, false);
        }

        if mode == CursorMode::Disabled || mode == CursorMode::Captured {
            capture_cursor(platform, grab, id);
        } else {
            release_cursor(platform, grab);
        }

        if mode == CursorMode::Disabled {
            grab.disabled_window = Some(id);
        } else if grab.disabled_window == Some(id) {
            grab.disabled_window = None;
            let restore = grab.restore_pos;
            set_native_cursor_pos(platform, window, restore);
        }
    }

    if platform.cursor_in_content_area(id) {
        update_cursor_image(platform, window);
    }
}

/// Applies the disabled mode of a window that just gained focus.
pub(crate) fn disable_cursor(platform: &mut dyn Platform, grab: &mut PointerGrab, window: &mut Window) {
    let id = window.id();
    grab.disabled_window = Some(id);
    grab.restore_pos = platform.cursor_pos(id);
    update_cursor_image(platform, window);
    center_cursor(platform, window);
    capture_cursor(platform, grab, id);
    if window.input.raw_mouse_motion {
        platform.set_raw_mouse_motion(id, true);
    }
}

/// Undoes the disabled mode of a window that just lost focus.
pub(crate) fn enable_cursor(platform: &mut dyn Platform, grab: &mut PointerGrab, window: &mut Window) {
    let id = window.id();
    if window.input.raw_mouse_motion {
        platform.set_raw_mouse_motion(id, false);
    }
    grab.disabled_window = None;
    release_cursor(platform, grab);
    let restore = grab.restore_pos;
    set_native_cursor_pos(platform, window, restore);
    update_cursor_image(platform, window);
}

/// The cursor position as reported to users: virtual while disabled.
pub(crate) fn cursor_pos(platform: &dyn Platform, window: &Window) -> Vec2<f64> {
    if window.input.cursor_mode == CursorMode::Disabled {
        window.input.virtual_cursor_pos
    } else {
        platform.cursor_pos(window.id())
    }
}

/// Moves the cursor, which only works while the window is focused.
pub(crate) fn set_cursor_pos(platform: &mut dyn Platform, window: &mut Window, pos: Vec2<f64>) -> Result<()> {
    if !pos.x.is_finite() || !pos.y.is_finite() {
        return error::invalid_value(format!("Invalid cursor position {}, {}", pos.x, pos.y));
    }
    if !platform.is_focused(window.id()) {
        return Ok(());
    }
    if window.input.cursor_mode == CursorMode::Disabled {
        window.input.virtual_cursor_pos = pos;
    } else {
        set_native_cursor_pos(platform, window, pos);
    }
    Ok(())
}

/// Turns raw mouse motion on or off. It only reaches the platform while the
/// window's cursor is disabled.
pub(crate) fn set_raw_mouse_motion(platform: &mut dyn Platform, grab: &PointerGrab, window: &mut Window, enabled: bool) -> Result<()> {
    if !platform.raw_mouse_motion_supported() {
        return error::platform_failed("Raw mouse motion is not supported on this system");
    }
    if window.input.raw_mouse_motion == enabled {
        return Ok(());
    }
    window.input.raw_mouse_motion = enabled;
    if grab.disabled_window == Some(window.id()) {
        platform.set_raw_mouse_motion(window.id(), enabled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::ClientApi;
    use crate::monitor::VideoMode;
    use crate::os::headless::{HeadlessPlatform, HeadlessProbe, NativeCall};
    use crate::os::NativeWindowDesc;
    use crate::window::WindowSettings;
    use crate::Extent2;
    use pretty_assertions::assert_eq;

    fn setup() -> (HeadlessPlatform, HeadlessProbe, Window) {
        let (mut platform, probe) = HeadlessPlatform::new();
        let id = WindowId(1);
        let settings = WindowSettings::default();
        let desc = NativeWindowDesc { title: "cursor", size: Extent2::new(200, 100), settings: &settings, monitor: None, transparent: false };
        platform.create_window(id, &desc).unwrap();
        let window = Window::new(id, "cursor", settings, ClientApi::NoApi, false, VideoMode::with_size(200, 100));
        probe.take_calls();
        (platform, probe, window)
    }

    #[test]
    fn unfocused_windows_only_remember_the_mode() {
        let (mut platform, probe, mut window) = setup();
        let mut grab = PointerGrab::default();
        set_cursor_mode(&mut platform, &mut grab, &mut window, CursorMode::Disabled);
        assert_eq!(window.input.cursor_mode, CursorMode::Disabled);
        assert_eq!(grab, PointerGrab::default());
        assert!(probe.take_calls().is_empty());
    }

    #[test]
    fn same_mode_is_a_no_op() {
        let (mut platform, probe, mut window) = setup();
        let id = window.id();
        let mut grab = PointerGrab::default();
        platform.focus_window(id);
        probe.take_calls();

        set_cursor_mode(&mut platform, &mut grab, &mut window, CursorMode::Captured);
        assert_eq!(probe.take_calls(), vec![NativeCall::ClipCursor(Some(id))]);
        assert_eq!(grab.captured_window, Some(id));

        set_cursor_mode(&mut platform, &mut grab, &mut window, CursorMode::Captured);
        assert!(probe.take_calls().is_empty());

        set_cursor_mode(&mut platform, &mut grab, &mut window, CursorMode::Normal);
        assert_eq!(probe.take_calls(), vec![NativeCall::ClipCursor(None)]);
        assert_eq!(grab.captured_window, None);
    }

    #[test]
    fn disabling_centers_and_enabling_restores() {
        let (mut platform, probe, mut window) = setup();
        let id = window.id();
        let mut grab = PointerGrab::default();
        platform.focus_window(id);
        platform.set_cursor_pos(id, Vec2::new(12., 34.));
        probe.take_calls();

        set_cursor_mode(&mut platform, &mut grab, &mut window, CursorMode::Disabled);
        assert_eq!(grab.disabled_window, Some(id));
        assert_eq!(grab.restore_pos, Vec2::new(12., 34.));
        assert_eq!(window.input.virtual_cursor_pos, Vec2::new(12., 34.));
        assert_eq!(platform.cursor_pos(id), Vec2::new(100., 50.));

        set_cursor_mode(&mut platform, &mut grab, &mut window, CursorMode::Normal);
        assert_eq!(grab.disabled_window, None);
        assert_eq!(platform.cursor_pos(id), Vec2::new(12., 34.));
    }
}
