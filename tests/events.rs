mod common;

use std::thread;
use std::time::{Duration, Instant};

use dwc::event::{Message, RawMotion, ResizeKind};
use dwc::*;
use pretty_assertions::assert_eq;

use crate::common::Log;

/// A focused window, with the focus change already pumped.
fn focused_window(display: &mut Display) -> WindowId {
    let w = display.create_window(Extent2::new(640, 480), "events", None, None).unwrap();
    display.poll_events().unwrap();
    assert!(display.window(w).unwrap().is_focused());
    w
}

fn key(window: WindowId, key: Key, action: Action) -> Message {
    Message::Key { window, key, scancode: key.code(), action }
}

fn key_log(display: &mut Display, w: WindowId) -> Log<(Key, Action)> {
    let log = Log::new();
    let l = log.clone();
    display.callbacks_mut(w).unwrap().on_key(move |_, key, _, action, _| l.push((key, action)));
    log
}

#[test]
fn polling_an_empty_queue_returns_at_once() {
    let (mut display, probe) = common::headless();
    let start = Instant::now();
    display.poll_events().unwrap();
    assert_eq!(probe.pending(), 0);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn wait_timeout_waits_at_least_that_long() {
    let (mut display, _probe) = common::headless();
    let _w = focused_window(&mut display);

    let start = Instant::now();
    display.wait_events_timeout(0.05).unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(50), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "{:?}", elapsed);
}

#[test]
fn invalid_timeouts_are_rejected() {
    let (mut display, _probe) = common::headless();
    for &t in &[-1., ::std::f64::NAN, ::std::f64::INFINITY] {
        assert_eq!(display.wait_events_timeout(t).unwrap_err().kind, ErrorKind::InvalidValue);
    }
    display.wait_events_timeout(0.).unwrap();
}

#[test]
fn huge_timeouts_wait_until_woken() {
    let (mut display, _probe) = common::headless();
    for &t in &[1e19, 1e20, ::std::f64::MAX] {
        display.post_empty_event().unwrap();
        display.wait_events_timeout(t).unwrap();
    }
    assert!(display.take_error().is_none());
}

#[test]
fn empty_events_wake_up_a_waiting_pump() {
    let (mut display, probe) = common::headless();
    let waker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        probe.post_empty_event();
    });
    let start = Instant::now();
    display.wait_events().unwrap();
    assert!(start.elapsed() < Duration::from_secs(10));
    waker.join().unwrap();

    // From the display's own thread too.
    display.post_empty_event().unwrap();
    display.wait_events().unwrap();
}

#[test]
fn key_presses_repeat_and_releases_deduplicate() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let keys = key_log(&mut display, w);

    probe.post(key(w, Key::A, Action::Press));
    probe.post(key(w, Key::A, Action::Press));
    probe.post(key(w, Key::A, Action::Release));
    probe.post(key(w, Key::A, Action::Release));
    display.poll_events().unwrap();

    assert_eq!(keys.take(), vec![(Key::A, Action::Press), (Key::A, Action::Repeat), (Key::A, Action::Release)]);
    assert_eq!(display.get_key(w, Key::A).unwrap(), Action::Release);
    assert_eq!(display.get_key(w, Key::Unknown).unwrap_err().kind, ErrorKind::InvalidEnum);
}

#[test]
fn unknown_keys_are_reported_but_not_tracked() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let keys = key_log(&mut display, w);

    probe.post(key(w, Key::Unknown, Action::Press));
    probe.post(key(w, Key::Unknown, Action::Press));
    display.poll_events().unwrap();
    assert_eq!(keys.take(), vec![(Key::Unknown, Action::Press), (Key::Unknown, Action::Press)]);
}

#[test]
fn sticky_keys_hold_until_polled() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    display.set_input_mode(w, InputMode::StickyKeys(true)).unwrap();
    display.set_input_mode(w, InputMode::StickyKeys(true)).unwrap();

    probe.post(key(w, Key::Space, Action::Press));
    probe.post(key(w, Key::Space, Action::Release));
    display.poll_events().unwrap();

    assert_eq!(display.window(w).unwrap().input().key_state(Key::Space), KeyState::Stick);
    assert_eq!(display.get_key(w, Key::Space).unwrap(), Action::Press);
    assert_eq!(display.get_key(w, Key::Space).unwrap(), Action::Release);
}

#[test]
fn turning_sticky_keys_off_drops_stuck_keys() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    display.set_input_mode(w, InputMode::StickyKeys(true)).unwrap();
    display.set_input_mode(w, InputMode::StickyMouseButtons(true)).unwrap();

    probe.post(key(w, Key::Q, Action::Press));
    probe.post(key(w, Key::Q, Action::Release));
    probe.post(Message::MouseButton { window: w, button: MouseButton::Left, action: Action::Press });
    probe.post(Message::MouseButton { window: w, button: MouseButton::Left, action: Action::Release });
    display.poll_events().unwrap();

    display.set_input_mode(w, InputMode::StickyKeys(false)).unwrap();
    assert_eq!(display.get_key(w, Key::Q).unwrap(), Action::Release);
    assert_eq!(display.get_mouse_button(w, MouseButton::Left).unwrap(), Action::Press);
    assert_eq!(display.get_mouse_button(w, MouseButton::Left).unwrap(), Action::Release);
}

#[test]
fn losing_focus_releases_held_keys_and_buttons() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let keys = key_log(&mut display, w);
    let buttons = Log::new();
    let focus = Log::new();
    {
        let (b, f) = (buttons.clone(), focus.clone());
        display.callbacks_mut(w).unwrap()
            .on_mouse_button(move |_, button, action, _| b.push((button, action)))
            .on_focus(move |_, focused| f.push(focused));
    }

    probe.post(key(w, Key::W, Action::Press));
    probe.post(key(w, Key::LeftShift, Action::Press));
    probe.post(Message::MouseButton { window: w, button: MouseButton::Right, action: Action::Press });
    display.poll_events().unwrap();
    keys.take();
    buttons.take();

    probe.post(Message::Focus { window: w, focused: false });
    display.poll_events().unwrap();

    assert_eq!(focus.take(), vec![false]);
    assert_eq!(keys.take(), vec![(Key::W, Action::Release), (Key::LeftShift, Action::Release)]);
    assert_eq!(buttons.take(), vec![(MouseButton::Right, Action::Release)]);
    assert_eq!(display.get_key(w, Key::W).unwrap(), Action::Release);
    assert!(!display.window(w).unwrap().is_focused());
}

#[test]
fn missed_shift_releases_are_caught_up() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let keys = key_log(&mut display, w);

    probe.post(key(w, Key::LeftShift, Action::Press));
    probe.post(key(w, Key::RightShift, Action::Press));
    probe.post(key(w, Key::RightShift, Action::Release));
    display.poll_events().unwrap();
    assert_eq!(keys.take(), vec![
        (Key::LeftShift, Action::Press),
        (Key::RightShift, Action::Press),
        (Key::RightShift, Action::Release),
    ]);

    // Left Shift went up without a message.
    probe.set_key_down(Key::LeftShift, false);
    display.poll_events().unwrap();
    assert_eq!(keys.take(), vec![(Key::LeftShift, Action::Release)]);
    assert_eq!(display.get_key(w, Key::LeftShift).unwrap(), Action::Release);
}

#[test]
fn lock_modifiers_are_opt_in() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let mods = Log::new();
    let m = mods.clone();
    display.callbacks_mut(w).unwrap().on_key(move |_, _, _, _, mods| m.push(mods));

    probe.set_modifiers(Modifiers::SHIFT | Modifiers::CAPS_LOCK);
    probe.post(key(w, Key::B, Action::Press));
    display.poll_events().unwrap();
    display.set_input_mode(w, InputMode::LockKeyMods(true)).unwrap();
    probe.post(key(w, Key::B, Action::Release));
    display.poll_events().unwrap();

    assert_eq!(mods.take(), vec![Modifiers::SHIFT, Modifiers::SHIFT | Modifiers::CAPS_LOCK]);
}

#[test]
fn characters() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let plain = Log::new();
    let with_mods = Log::new();
    {
        let (p, m) = (plain.clone(), with_mods.clone());
        display.callbacks_mut(w).unwrap()
            .on_char(move |_, c| p.push(c))
            .on_char_mods(move |_, c, _| m.push(c));
    }

    probe.post(Message::Char { window: w, codepoint: 'é', plain: true });
    probe.post(Message::Char { window: w, codepoint: 'c', plain: false });
    probe.post(Message::Char { window: w, codepoint: '\u{7}', plain: true });
    display.poll_events().unwrap();

    assert_eq!(plain.take(), vec!['é']);
    assert_eq!(with_mods.take(), vec!['é', 'c']);
}

#[test]
fn close_requests_set_the_flag() {
    let (mut display, probe) = common::headless();
    let a = focused_window(&mut display);
    let b = focused_window(&mut display);
    let closed = Log::new();
    let c = closed.clone();
    display.callbacks_mut(a).unwrap().on_close(move |id| c.push(id));

    probe.post(Message::CloseRequested(a));
    display.poll_events().unwrap();
    assert!(display.should_close(a).unwrap());
    assert!(!display.should_close(b).unwrap());
    assert_eq!(closed.take(), vec![a]);

    display.set_should_close(a, false).unwrap();
    assert!(!display.should_close(a).unwrap());
}

#[test]
fn quit_asks_every_window_to_close() {
    let (mut display, probe) = common::headless();
    let a = focused_window(&mut display);
    let b = focused_window(&mut display);

    probe.post(Message::Quit);
    display.poll_events().unwrap();
    assert!(display.should_close(a).unwrap());
    assert!(display.should_close(b).unwrap());
}

#[test]
fn messages_for_destroyed_windows_are_dropped() {
    let (mut display, probe) = common::headless();
    let a = focused_window(&mut display);
    let b = focused_window(&mut display);
    display.destroy_window(a).unwrap();

    probe.post(Message::CloseRequested(a));
    probe.post(Message::CloseRequested(b));
    display.poll_events().unwrap();
    assert!(display.should_close(b).unwrap());
    assert_eq!(display.take_error(), None);
}

#[test]
fn resizes_and_moves() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let sizes = Log::new();
    let iconified = Log::new();
    let positions = Log::new();
    {
        let (s, i, p) = (sizes.clone(), iconified.clone(), positions.clone());
        display.callbacks_mut(w).unwrap()
            .on_size(move |_, size| s.push(size))
            .on_iconify(move |_, on| i.push(on))
            .on_pos(move |_, pos| p.push(pos));
    }

    probe.post(Message::Resized { window: w, size: Extent2::new(800, 600), kind: ResizeKind::Other });
    probe.post(Message::Resized { window: w, size: Extent2::new(800, 600), kind: ResizeKind::Other });
    probe.post(Message::Moved { window: w, position: Vec2::new(10, 20) });
    display.poll_events().unwrap();
    assert_eq!(sizes.take(), vec![Extent2::new(800, 600)]);
    assert_eq!(positions.take(), vec![Vec2::new(10, 20)]);
    assert_eq!(display.window(w).unwrap().size(), Extent2::new(800, 600));
    assert_eq!(display.window(w).unwrap().framebuffer_size(), Extent2::new(800, 600));

    probe.post(Message::Resized { window: w, size: Extent2::new(0, 0), kind: ResizeKind::Iconified });
    display.poll_events().unwrap();
    assert!(display.window(w).unwrap().is_iconified());
    probe.post(Message::Resized { window: w, size: Extent2::new(800, 600), kind: ResizeKind::Restored });
    display.poll_events().unwrap();
    assert!(!display.window(w).unwrap().is_iconified());
    assert_eq!(iconified.take(), vec![true, false]);
}

#[test]
fn cursor_enter_leave_and_scroll() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let enter = Log::new();
    let scroll = Log::new();
    {
        let (e, s) = (enter.clone(), scroll.clone());
        display.callbacks_mut(w).unwrap()
            .on_cursor_enter(move |_, inside| e.push(inside))
            .on_scroll(move |_, offset| s.push(offset));
    }

    probe.post(Message::CursorMoved { window: w, position: Vec2::new(5., 5.) });
    probe.post(Message::CursorMoved { window: w, position: Vec2::new(6., 5.) });
    probe.post(Message::Scroll { window: w, offset: Vec2::new(0., -1.) });
    probe.post(Message::CursorLeft { window: w });
    display.poll_events().unwrap();

    assert_eq!(enter.take(), vec![true, false]);
    assert_eq!(scroll.take(), vec![Vec2::new(0., -1.)]);
    assert_eq!(display.cursor_pos(w).unwrap(), Vec2::new(6., 5.));
}

#[test]
fn callbacks_may_be_cleared() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let keys = key_log(&mut display, w);
    display.callbacks_mut(w).unwrap().clear();

    probe.post(key(w, Key::Z, Action::Press));
    display.poll_events().unwrap();
    assert!(keys.take().is_empty());
    assert_eq!(display.get_key(w, Key::Z).unwrap(), Action::Press);
}

#[test]
fn terminating_refuses_further_use() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    display.terminate();

    assert!(display.windows().is_empty());
    assert!(probe.calls().contains(&NativeCall::DestroyWindow(w)));
    assert_eq!(display.poll_events().unwrap_err().kind, ErrorKind::NotInitialized);
    assert_eq!(display.create_window(Extent2::new(1, 1), "late", None, None).unwrap_err().kind, ErrorKind::NotInitialized);
    // Terminating twice is harmless.
    display.terminate();
}

#[test]
fn raw_motion_is_ignored_while_the_cursor_is_enabled() {
    let (mut display, probe) = common::headless();
    let w = focused_window(&mut display);
    let moved = Log::new();
    let m = moved.clone();
    display.callbacks_mut(w).unwrap().on_cursor_pos(move |_, p| m.push(p));

    probe.post(Message::RawMotion { window: w, motion: RawMotion::Relative(Vec2::new(1., 1.)) });
    display.poll_events().unwrap();
    assert!(moved.take().is_empty());
}
