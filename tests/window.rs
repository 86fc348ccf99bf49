mod common;

use dwc::event::{Message, RawMotion, ResizeKind};
use dwc::*;
use pretty_assertions::assert_eq;

use crate::common::Log;

fn mode(width: i32, height: i32, refresh_rate: i32) -> VideoMode {
    VideoMode { width, height, red_bits: 8, green_bits: 8, blue_bits: 8, refresh_rate }
}

fn focused_window(display: &mut Display) -> WindowId {
    let w = display.create_window(Extent2::new(640, 480), "window", None, None).unwrap();
    display.poll_events().unwrap();
    w
}

fn cursor_log(display: &mut Display, w: WindowId) -> Log<Vec2<f64>> {
    let log = Log::new();
    let l = log.clone();
    display.callbacks_mut(w).unwrap().on_cursor_pos(move |_, pos| l.push(pos));
    log
}

#[test]
fn window_sizes_must_be_positive() {
    let (mut display, probe) = common::headless();
    for &size in &[Extent2::new(0, 480), Extent2::new(640, 0), Extent2::new(::std::u32::MAX, 480), Extent2::new(640, 1 << 31)] {
        let e = display.create_window(size, "empty or huge", None, None).unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidValue);
    }
    assert!(probe.calls().is_empty());
}

#[test]
fn windows_are_listed_most_recent_first() {
    let (mut display, probe) = common::headless();
    let a = focused_window(&mut display);
    let b = focused_window(&mut display);
    let ids: Vec<_> = display.windows().iter().map(|w| w.id()).collect();
    assert_eq!(ids, vec![b, a]);

    let window = display.window(b).unwrap();
    assert_eq!(window.title(), "window");
    assert_eq!(window.size(), Extent2::new(640, 480));
    assert!(window.is_focused());
    assert!(!display.window(a).unwrap().is_focused());
    assert_eq!(probe.window(b).map(|w| w.visible), Some(true));

    display.destroy_window(a).unwrap();
    assert_eq!(display.destroy_window(a).unwrap_err().kind, ErrorKind::InvalidHandle);
    assert_eq!(display.take_error().map(|e| e.kind), Some(ErrorKind::InvalidHandle));
}

#[test]
fn hidden_windows_are_not_shown() {
    let (mut display, probe) = common::headless();
    display.hints_mut().window.visible = false;
    let w = display.create_window(Extent2::new(320, 200), "hidden", None, None).unwrap();
    assert_eq!(probe.window(w).map(|w| w.visible), Some(false));
    assert!(!probe.calls().contains(&NativeCall::ShowWindow(w)));
}

#[test]
fn monitor_video_modes() {
    let (mut display, _probe) = common::headless();
    let primary = display.primary_monitor().unwrap().id();
    assert_eq!(display.monitors().len(), 1);
    assert_eq!(display.monitor(primary).unwrap().name(), "Headless Monitor");
    assert_eq!(display.monitor(primary).unwrap().physical_size_mm(), Extent2::new(527, 296));

    assert_eq!(display.video_modes(primary).unwrap(), vec![
        mode(640, 480, 60),
        mode(1280, 720, 60),
        mode(1920, 1080, 60),
        mode(1920, 1080, 144),
    ]);
    assert_eq!(display.video_mode(primary).unwrap(), mode(1920, 1080, 60));
}

#[test]
fn full_screen_windows_take_the_closest_mode() {
    let (mut display, probe) = common::headless();
    let primary = display.primary_monitor().unwrap().id();

    let w = display.create_window(Extent2::new(1920, 1080), "full screen", Some(primary), None).unwrap();
    let calls = probe.take_calls();
    assert!(calls.contains(&NativeCall::SetVideoMode("HEADLESS-0".to_owned(), mode(1920, 1080, 144))));
    assert!(calls.contains(&NativeCall::FitToMonitor(w, "HEADLESS-0".to_owned())));
    assert!(calls.contains(&NativeCall::SetCursorPos(w, Vec2::new(960., 540.))));
    assert_eq!(display.monitor(primary).unwrap().fullscreen_window(), Some(w));
    assert_eq!(display.window(w).unwrap().monitor(), Some(primary));
    assert_eq!(display.video_mode(primary).unwrap(), mode(1920, 1080, 144));

    display.destroy_window(w).unwrap();
    assert!(probe.take_calls().contains(&NativeCall::RestoreVideoMode("HEADLESS-0".to_owned())));
    assert_eq!(display.video_mode(primary).unwrap(), mode(1920, 1080, 60));
    assert_eq!(display.monitor(primary).unwrap().fullscreen_window(), None);
}

#[test]
fn the_current_mode_is_not_set_again() {
    let (mut display, probe) = common::headless();
    let primary = display.primary_monitor().unwrap().id();
    display.hints_mut().refresh_rate = 60;

    display.create_window(Extent2::new(1920, 1080), "full screen", Some(primary), None).unwrap();
    assert!(!probe.calls().iter().any(|c| matches!(c, NativeCall::SetVideoMode(..))));
}

#[test]
fn moving_between_full_screen_and_windowed() {
    let (mut display, probe) = common::headless();
    let primary = display.primary_monitor().unwrap().id();
    let w = focused_window(&mut display);
    probe.take_calls();

    display.set_window_monitor(w, Some(primary), Vec2::zero(), Extent2::new(1280, 720), 60).unwrap();
    assert_eq!(probe.take_calls(), vec![
        NativeCall::SetVideoMode("HEADLESS-0".to_owned(), mode(1280, 720, 60)),
        NativeCall::FitToMonitor(w, "HEADLESS-0".to_owned()),
    ]);
    assert_eq!(display.window(w).unwrap().size(), Extent2::new(1280, 720));

    display.set_window_monitor(w, None, Vec2::new(100, 50), Extent2::new(800, 600), DONT_CARE).unwrap();
    assert_eq!(probe.take_calls(), vec![
        NativeCall::RestoreVideoMode("HEADLESS-0".to_owned()),
        NativeCall::SetWindowed(w),
    ]);
    let window = display.window(w).unwrap();
    assert_eq!(window.monitor(), None);
    assert_eq!(window.position(), Vec2::new(100, 50));
    assert_eq!(window.size(), Extent2::new(800, 600));

    let e = display.set_window_monitor(w, None, Vec2::zero(), Extent2::new(800, 600), -5).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidValue);

    // Too large for a video mode: never mistaken for a don't-care size.
    probe.take_calls();
    let e = display.set_window_monitor(w, Some(primary), Vec2::zero(), Extent2::new(::std::u32::MAX, 1080), DONT_CARE).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidValue);
    assert!(probe.take_calls().is_empty());
    assert_eq!(display.window(w).unwrap().monitor(), None);
}

#[test]
fn full_screen_windows_iconify_when_unfocused() {
    let (mut display, probe) = common::headless();
    let primary = display.primary_monitor().unwrap().id();
    let w = display.create_window(Extent2::new(1920, 1080), "full screen", Some(primary), None).unwrap();
    display.poll_events().unwrap();
    probe.take_calls();

    probe.post(Message::Focus { window: w, focused: false });
    display.poll_events().unwrap();
    let calls = probe.take_calls();
    assert!(calls.contains(&NativeCall::IconifyWindow(w)));
    assert!(calls.contains(&NativeCall::RestoreVideoMode("HEADLESS-0".to_owned())));
    assert!(display.window(w).unwrap().is_iconified());
    assert_eq!(display.monitor(primary).unwrap().fullscreen_window(), None);

    probe.post(Message::Resized { window: w, size: Extent2::new(1920, 1080), kind: ResizeKind::Restored });
    display.poll_events().unwrap();
    assert!(probe.take_calls().contains(&NativeCall::SetVideoMode("HEADLESS-0".to_owned(), mode(1920, 1080, 144))));
    assert_eq!(display.monitor(primary).unwrap().fullscreen_window(), Some(w));
}

#[test]
fn monitors_come_and_go() {
    let (mut display, probe) = common::headless();
    let events = Log::new();
    let l = events.clone();
    display.set_monitor_callback(move |id, event| l.push((id, event)));

    let first = display.primary_monitor().unwrap().id();
    let original = probe.monitor("HEADLESS-0").unwrap();
    let second = HeadlessMonitor::new("HEADLESS-1", "Second Monitor", vec![mode(1024, 768, 75)]);

    probe.set_monitors(vec![original, second.clone()]);
    probe.post(Message::MonitorsChanged);
    display.poll_events().unwrap();

    let ids: Vec<_> = display.monitors().iter().map(|m| m.id()).collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], first);
    let added = ids[1];
    assert_eq!(events.take(), vec![(added, MonitorEvent::Connected)]);

    let w = display.create_window(Extent2::new(640, 480), "full screen", Some(first), None).unwrap();
    display.poll_events().unwrap();
    probe.take_calls();

    probe.set_monitors(vec![second]);
    probe.post(Message::MonitorsChanged);
    display.poll_events().unwrap();

    assert_eq!(events.take(), vec![(first, MonitorEvent::Disconnected)]);
    assert_eq!(display.primary_monitor().map(|m| m.id()), Some(added));
    assert_eq!(display.monitor(first).unwrap_err().kind, ErrorKind::InvalidHandle);
    assert_eq!(display.window(w).unwrap().monitor(), None);
    assert!(probe.take_calls().contains(&NativeCall::SetWindowed(w)));
}

#[test]
fn disabled_cursors_report_virtual_positions() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    probe.set_cursor_inside(w, true);
    let positions = cursor_log(&mut display, w);
    probe.take_calls();

    display.set_input_mode(w, InputMode::Cursor(CursorMode::Disabled)).unwrap();
    assert_eq!(probe.take_calls(), vec![
        NativeCall::SetCursorPos(w, Vec2::new(320., 240.)),
        NativeCall::ClipCursor(Some(w)),
        NativeCall::SetCursorImage(w, CursorImage::Hidden),
    ]);
    assert_eq!(display.cursor_image(w).unwrap(), CursorImage::Hidden);
    assert_eq!(display.cursor_pos(w).unwrap(), Vec2::new(0., 0.));

    probe.post(Message::CursorMoved { window: w, position: Vec2::new(330., 250.) });
    display.poll_events().unwrap();
    // The pointer goes back to the center after each batch.
    assert_eq!(probe.window(w).unwrap().cursor_pos, Vec2::new(320., 240.));
    probe.post(Message::CursorMoved { window: w, position: Vec2::new(325., 240.) });
    display.poll_events().unwrap();

    assert_eq!(positions.take(), vec![Vec2::new(10., 10.), Vec2::new(15., 10.)]);
    assert_eq!(display.cursor_pos(w).unwrap(), Vec2::new(15., 10.));

    display.set_cursor_pos(w, Vec2::new(-100., 3.)).unwrap();
    assert_eq!(display.cursor_pos(w).unwrap(), Vec2::new(-100., 3.));
}

#[test]
fn focus_loss_lets_the_pointer_go() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let positions = cursor_log(&mut display, w);
    display.set_input_mode(w, InputMode::Cursor(CursorMode::Disabled)).unwrap();
    probe.take_calls();

    probe.post(Message::Focus { window: w, focused: false });
    display.poll_events().unwrap();
    let calls = probe.take_calls();
    assert!(calls.contains(&NativeCall::ClipCursor(None)));
    assert!(calls.contains(&NativeCall::SetCursorPos(w, Vec2::new(0., 0.))));

    // Motion is ignored until the window gets the pointer back.
    probe.post(Message::CursorMoved { window: w, position: Vec2::new(400., 300.) });
    display.poll_events().unwrap();
    assert!(positions.take().is_empty());

    probe.post(Message::Focus { window: w, focused: true });
    display.poll_events().unwrap();
    assert!(probe.take_calls().contains(&NativeCall::ClipCursor(Some(w))));

    display.set_input_mode(w, InputMode::Cursor(CursorMode::Normal)).unwrap();
    assert!(probe.take_calls().contains(&NativeCall::ClipCursor(None)));
    assert_eq!(display.window(w).unwrap().input().cursor_mode(), CursorMode::Normal);
}

#[test]
fn raw_motion_while_disabled() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let positions = cursor_log(&mut display, w);

    probe.set_raw_motion_supported(false);
    assert!(!display.raw_mouse_motion_supported());
    let e = display.set_input_mode(w, InputMode::RawMouseMotion(true)).unwrap_err();
    assert_eq!(e.kind, ErrorKind::PlatformError);

    probe.set_raw_motion_supported(true);
    probe.take_calls();
    display.set_input_mode(w, InputMode::RawMouseMotion(true)).unwrap();
    // Nothing to do until the cursor is disabled.
    assert!(probe.take_calls().is_empty());

    display.set_input_mode(w, InputMode::Cursor(CursorMode::Disabled)).unwrap();
    assert!(probe.take_calls().contains(&NativeCall::SetRawMouseMotion(w, true)));

    probe.post(Message::RawMotion { window: w, motion: RawMotion::Relative(Vec2::new(3., 4.)) });
    probe.post(Message::CursorMoved { window: w, position: Vec2::new(500., 400.) });
    display.poll_events().unwrap();
    probe.post(Message::RawMotion { window: w, motion: RawMotion::Absolute(Vec2::new(322., 240.)) });
    display.poll_events().unwrap();
    assert_eq!(positions.take(), vec![Vec2::new(3., 4.), Vec2::new(5., 4.)]);

    probe.post(Message::Focus { window: w, focused: false });
    display.poll_events().unwrap();
    assert!(probe.take_calls().contains(&NativeCall::SetRawMouseMotion(w, false)));
}

#[test]
fn hidden_and_captured_cursors() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    probe.set_cursor_inside(w, true);
    probe.take_calls();

    display.set_input_mode(w, InputMode::Cursor(CursorMode::Hidden)).unwrap();
    assert_eq!(probe.window(w).unwrap().cursor_image, CursorImage::Hidden);
    assert_eq!(display.cursor_image(w).unwrap(), CursorImage::Hidden);

    display.set_input_mode(w, InputMode::Cursor(CursorMode::Captured)).unwrap();
    assert_eq!(probe.window(w).unwrap().cursor_image, CursorImage::Arrow);
    assert!(probe.take_calls().contains(&NativeCall::ClipCursor(Some(w))));

    probe.post(Message::Focus { window: w, focused: false });
    display.poll_events().unwrap();
    assert!(probe.take_calls().contains(&NativeCall::ClipCursor(None)));
}

#[test]
fn cursor_positions_only_move_for_focused_windows() {
    let (mut display, probe) = common::headless();
    let a = focused_window(&mut display);
    let b = focused_window(&mut display);
    probe.take_calls();

    display.set_cursor_pos(a, Vec2::new(1., 2.)).unwrap();
    assert!(probe.take_calls().is_empty());
    display.set_cursor_pos(b, Vec2::new(1., 2.)).unwrap();
    assert_eq!(probe.take_calls(), vec![NativeCall::SetCursorPos(b, Vec2::new(1., 2.))]);
    assert_eq!(display.cursor_pos(b).unwrap(), Vec2::new(1., 2.));

    let e = display.set_cursor_pos(b, Vec2::new(::std::f64::NAN, 0.)).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidValue);
}

#[test]
fn custom_cursors() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    probe.set_cursor_inside(w, true);

    let image = RgbaImage::new(Extent2::new(2, 2), vec![Rgba::new(255, 0, 0, 255); 4]).unwrap();
    let c = display.create_cursor(image, Vec2::new(1, 1)).unwrap();
    let ibeam = display.create_standard_cursor(StandardCursor::IBeam).unwrap();
    let ids: Vec<_> = display.cursors().iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![ibeam, c]);

    display.set_cursor(w, Some(c)).unwrap();
    assert_eq!(display.cursor_image(w).unwrap(), CursorImage::Custom(c));
    assert_eq!(probe.window(w).unwrap().cursor_image, CursorImage::Custom(c));

    probe.take_calls();
    display.destroy_cursor(c).unwrap();
    assert_eq!(probe.take_calls(), vec![
        NativeCall::SetCursorImage(w, CursorImage::Arrow),
        NativeCall::DestroyCursor(c),
    ]);
    assert_eq!(display.window(w).unwrap().cursor(), None);
    assert_eq!(display.cursor_image(w).unwrap(), CursorImage::Arrow);
    assert_eq!(display.set_cursor(w, Some(c)).unwrap_err().kind, ErrorKind::InvalidHandle);

    let broken = Image { pixels: Vec::new(), size: Extent2::new(2, 2) };
    assert_eq!(display.create_cursor(broken, Vec2::zero()).unwrap_err().kind, ErrorKind::InvalidValue);
}

#[test]
fn terminating_destroys_cursors_and_windows() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let c = display.create_standard_cursor(StandardCursor::Crosshair).unwrap();
    probe.take_calls();

    drop(display);
    let calls = probe.take_calls();
    assert!(calls.contains(&NativeCall::DestroyWindow(w)));
    assert!(calls.contains(&NativeCall::DestroyCursor(c)));
    assert_eq!(probe.window(w), None);
}
