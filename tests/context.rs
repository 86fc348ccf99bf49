mod common;

use std::sync::mpsc;
use std::thread;

use dwc::*;
use pretty_assertions::assert_eq;

fn window(display: &mut Display, title: &str) -> WindowId {
    display.create_window(Extent2::new(640, 480), title, None, None).unwrap()
}

#[test]
fn creation_introspects_then_releases_the_new_context() {
    let (mut display, probe) = common::headless();
    let w = window(&mut display, "main");

    assert_eq!(probe.take_calls(), vec![
        NativeCall::CreateWindow(w),
        NativeCall::CreateContext(w),
        NativeCall::MakeCurrent(w),
        NativeCall::Clear(w),
        NativeCall::SwapBuffers(w),
        NativeCall::Detach(w),
        NativeCall::ShowWindow(w),
        NativeCall::FocusWindow(w),
    ]);
    assert_eq!(display.current_context(), None);
    assert_eq!(display.context_state(w).unwrap(), ContextState::NotCurrent);

    let attribs = display.window(w).unwrap().context_attribs().unwrap();
    assert_eq!((attribs.client, attribs.major, attribs.minor), (ClientApi::OpenGl, 4, 6));
    assert_eq!(attribs.profile, Profile::Core);
}

#[test]
fn make_current_and_release() {
    let (mut display, probe) = common::headless();
    let w = window(&mut display, "main");
    probe.take_calls();

    display.make_context_current(Some(w)).unwrap();
    assert_eq!(display.current_context(), Some(w));
    assert_eq!(display.context_state(w).unwrap(), ContextState::Current(thread::current().id()));

    // Already current: nothing to do.
    display.make_context_current(Some(w)).unwrap();

    display.make_context_current(None).unwrap();
    assert_eq!(display.current_context(), None);
    assert_eq!(display.context_state(w).unwrap(), ContextState::NotCurrent);
    assert_eq!(probe.take_calls(), vec![NativeCall::MakeCurrent(w), NativeCall::Detach(w)]);
}

#[test]
fn switching_between_creation_apis_detaches_first() {
    let (mut display, probe) = common::headless();
    let a = window(&mut display, "native");
    display.hints_mut().context.source = ContextCreationApi::Egl;
    let b = window(&mut display, "egl");
    let c = window(&mut display, "egl too");

    display.make_context_current(Some(a)).unwrap();
    probe.take_calls();

    display.make_context_current(Some(b)).unwrap();
    assert_eq!(probe.take_calls(), vec![NativeCall::Detach(a), NativeCall::MakeCurrent(b)]);
    assert_eq!(display.context_state(a).unwrap(), ContextState::NotCurrent);

    // Same API: binding the new one is enough.
    display.make_context_current(Some(c)).unwrap();
    assert_eq!(probe.take_calls(), vec![NativeCall::MakeCurrent(c)]);
    assert_eq!(display.current_context(), Some(c));
}

#[test]
fn a_context_is_current_on_one_thread_at_most() {
    let (mut display, _probe) = common::headless();
    let w = window(&mut display, "shared");
    let handle = display.context_handle(w).unwrap();

    let (bound_tx, bound_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let render = thread::spawn(move || {
        handle.make_current().unwrap();
        assert!(handle.is_current());
        bound_tx.send(()).unwrap();
        done_rx.recv().unwrap();
        handle.release().unwrap();
        assert!(!handle.is_current());
    });

    bound_rx.recv().unwrap();
    let e = display.make_context_current(Some(w)).unwrap_err();
    assert_eq!(e.kind, ErrorKind::PlatformError);
    assert_eq!(display.take_error().map(|e| e.kind), Some(ErrorKind::PlatformError));
    assert_eq!(display.current_context(), None);

    done_tx.send(()).unwrap();
    render.join().unwrap();

    assert_eq!(display.context_state(w).unwrap(), ContextState::NotCurrent);
    display.make_context_current(Some(w)).unwrap();
    assert_eq!(display.current_context(), Some(w));
}

#[test]
fn destroying_the_current_window_leaves_no_current_context() {
    let (mut display, probe) = common::headless();
    let w = window(&mut display, "doomed");
    display.make_context_current(Some(w)).unwrap();
    probe.take_calls();

    display.destroy_window(w).unwrap();
    assert_eq!(display.current_context(), None);
    assert_eq!(probe.take_calls(), vec![
        NativeCall::Detach(w),
        NativeCall::DestroyContext(w),
        NativeCall::DestroyWindow(w),
    ]);
    assert_eq!(display.context_state(w).unwrap_err().kind, ErrorKind::InvalidHandle);
    assert_eq!(display.make_context_current(Some(w)).unwrap_err().kind, ErrorKind::InvalidHandle);
}

#[test]
fn versioned_profiles() {
    let (mut display, _probe) = common::headless();
    {
        let hints = &mut display.hints_mut().context;
        hints.major = 3;
        hints.minor = 2;
        hints.profile = Profile::Core;
    }
    let w = window(&mut display, "core");
    assert_eq!(display.window(w).unwrap().context_attribs().map(|a| a.profile), Some(Profile::Core));

    {
        let hints = &mut display.hints_mut().context;
        hints.major = 2;
        hints.minor = 0;
    }
    let e = display.create_window(Extent2::new(640, 480), "too old for profiles", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidValue);
    assert_eq!(display.windows().len(), 1);
}

#[test]
fn invalid_versions_never_reach_the_platform() {
    let (mut display, probe) = common::headless();
    for &(client, major, minor) in &[
        (ClientApi::OpenGl, 1, 6),
        (ClientApi::OpenGl, 2, 2),
        (ClientApi::OpenGl, 3, 4),
        (ClientApi::OpenGl, 0, 0),
        (ClientApi::OpenGlEs, 1, 2),
        (ClientApi::OpenGlEs, 2, 1),
    ] {
        let hints = &mut display.hints_mut().context;
        hints.client = client;
        hints.major = major;
        hints.minor = minor;
        let e = display.create_window(Extent2::new(640, 480), "invalid", None, None).unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidValue, "{:?} {}.{}", client, major, minor);
    }
    assert!(probe.calls().is_empty());
}

#[test]
fn older_driver_versions_are_unavailable() {
    let (mut display, probe) = common::headless();
    probe.set_driver(HeadlessDriver { version: "2.1.0 Headless".to_owned(), ..HeadlessDriver::default() });
    display.hints_mut().context.major = 3;
    display.hints_mut().context.minor = 3;

    let e = display.create_window(Extent2::new(640, 480), "unavailable", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::VersionUnavailable);
    assert!(display.windows().is_empty());

    let calls = probe.take_calls();
    let w = match calls[0] {
        NativeCall::CreateWindow(w) => w,
        ref other => panic!("unexpected first call {:?}", other),
    };
    assert_eq!(calls, vec![
        NativeCall::CreateWindow(w),
        NativeCall::CreateContext(w),
        NativeCall::MakeCurrent(w),
        NativeCall::Detach(w),
        NativeCall::DestroyContext(w),
        NativeCall::DestroyWindow(w),
    ]);
}

#[test]
fn failed_creation_restores_the_previous_context() {
    let (mut display, probe) = common::headless();
    let a = window(&mut display, "survivor");
    display.make_context_current(Some(a)).unwrap();

    probe.set_driver(HeadlessDriver { version: String::new(), ..HeadlessDriver::default() });
    let e = display.create_window(Extent2::new(640, 480), "no version string", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::PlatformError);
    assert_eq!(display.current_context(), Some(a));
    assert_eq!(display.windows().len(), 1);
}

#[test]
fn context_creation_failures_unwind_the_window() {
    let (mut display, probe) = common::headless();
    probe.fail_next_context(ErrorKind::ApiUnavailable.into());

    let e = display.create_window(Extent2::new(640, 480), "unwound", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::ApiUnavailable);
    assert!(display.windows().is_empty());
    let calls = probe.take_calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[1], NativeCall::DestroyWindow(_)));

    // The failure was only for one context.
    window(&mut display, "fine");
}

#[test]
fn no_pixel_format_is_format_unavailable() {
    let (mut display, probe) = common::headless();
    probe.set_framebuffer_configs(Vec::new());
    let e = display.create_window(Extent2::new(640, 480), "formatless", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::FormatUnavailable);
    assert!(display.windows().is_empty());
}

#[test]
fn windows_without_api_have_no_context() {
    let (mut display, probe) = common::headless();
    display.hints_mut().context.client = ClientApi::NoApi;
    let w = window(&mut display, "bare");

    assert!(!probe.calls().contains(&NativeCall::CreateContext(w)));
    assert_eq!(display.context_state(w).unwrap(), ContextState::Uncreated);
    assert_eq!(display.make_context_current(Some(w)).unwrap_err().kind, ErrorKind::NoWindowContext);
    assert_eq!(display.swap_buffers(w).unwrap_err().kind, ErrorKind::NoWindowContext);
    assert_eq!(display.context_handle(w).unwrap_err().kind, ErrorKind::NoWindowContext);

    display.default_window_hints();
    let e = display.create_window(Extent2::new(640, 480), "sharing", None, Some(w)).unwrap_err();
    assert_eq!(e.kind, ErrorKind::NoWindowContext);
}

#[test]
fn sharing_needs_matching_apis() {
    let (mut display, _probe) = common::headless();
    let a = window(&mut display, "first");
    let b = display.create_window(Extent2::new(640, 480), "second", None, Some(a)).unwrap();
    assert_eq!(display.context_state(b).unwrap(), ContextState::NotCurrent);

    display.hints_mut().context.source = ContextCreationApi::Egl;
    let e = display.create_window(Extent2::new(640, 480), "mismatch", None, Some(a)).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidEnum);
}

#[test]
fn swapping_without_a_current_context_does_nothing() {
    let (mut display, probe) = common::headless();
    let w = window(&mut display, "swap");
    probe.take_calls();

    display.swap_buffers(w).unwrap();
    assert!(probe.take_calls().is_empty());

    display.make_context_current(Some(w)).unwrap();
    display.swap_buffers(w).unwrap();
    assert_eq!(probe.take_calls(), vec![NativeCall::MakeCurrent(w), NativeCall::SwapBuffers(w)]);
}

#[test]
fn queries_need_a_current_context() {
    let (mut display, probe) = common::headless();
    let w = window(&mut display, "queries");

    assert_eq!(display.set_swap_interval(1).unwrap_err().kind, ErrorKind::NoCurrentContext);
    assert_eq!(display.extension_supported("GL_KHR_debug").unwrap_err().kind, ErrorKind::NoCurrentContext);
    assert_eq!(display.get_proc_address("glClear").unwrap_err().kind, ErrorKind::NoCurrentContext);

    display.make_context_current(Some(w)).unwrap();
    probe.take_calls();
    display.set_swap_interval(1).unwrap();
    assert_eq!(probe.take_calls(), vec![NativeCall::SetSwapInterval(w, 1)]);

    assert!(display.extension_supported("GL_KHR_debug").unwrap());
    assert!(display.extension_supported("HEADLESS_swap_control").unwrap());
    assert!(!display.extension_supported("GL_KHR").unwrap());
    assert_eq!(display.extension_supported("").unwrap_err().kind, ErrorKind::InvalidValue);

    assert!(display.get_proc_address("glClear").unwrap().is_some());
    assert_eq!(display.get_proc_address("glNotAFunction").unwrap(), None);
}

#[test]
fn errors_are_kept_per_thread_until_taken() {
    let (mut display, _probe) = common::headless();
    let seen = common::Log::new();
    let log = seen.clone();
    display.set_error_callback(move |e| log.push(e.kind));

    assert_eq!(display.take_error(), None);
    assert!(display.set_swap_interval(0).is_err());
    assert_eq!(seen.take(), vec![ErrorKind::NoCurrentContext]);
    assert_eq!(display.take_error().map(|e| e.kind), Some(ErrorKind::NoCurrentContext));
    assert_eq!(display.take_error(), None);
}

const FLAG_FORWARD_COMPATIBLE: i32 = 0x0001;
const FLAG_DEBUG: i32 = 0x0002;
const FLAG_NO_ERROR: i32 = 0x0008;
const PROFILE_CORE: i32 = 0x0001;
const PROFILE_COMPAT: i32 = 0x0002;
const LOSE_CONTEXT_ON_RESET: i32 = 0x8252;
const NO_RESET_NOTIFICATION: i32 = 0x8261;
const RELEASE_NONE: i32 = 0;

fn extensions(names: &[&str]) -> Vec<String> {
    names.iter().map(|&n| n.to_owned()).collect()
}

fn attribs(display: &Display, w: WindowId) -> ContextAttribs {
    display.window(w).unwrap().context_attribs().unwrap()
}

/// Checks that creation failed after the context was made current, and
/// that everything was torn down again.
fn assert_unwound(display: &Display, probe: &HeadlessProbe) {
    assert!(display.windows().is_empty());
    let calls = probe.take_calls();
    let w = match calls[0] {
        NativeCall::CreateWindow(w) => w,
        ref other => panic!("unexpected first call {:?}", other),
    };
    assert_eq!(calls, vec![
        NativeCall::CreateWindow(w),
        NativeCall::CreateContext(w),
        NativeCall::MakeCurrent(w),
        NativeCall::Detach(w),
        NativeCall::DestroyContext(w),
        NativeCall::DestroyWindow(w),
    ]);
}

#[test]
fn context_flags_are_read_back() {
    let (mut display, probe) = common::headless();
    probe.set_driver(HeadlessDriver { context_flags: FLAG_FORWARD_COMPATIBLE | FLAG_NO_ERROR, ..HeadlessDriver::default() });
    let w = window(&mut display, "flags");
    let a = attribs(&display, w);
    assert_eq!((a.forward, a.debug, a.no_error), (true, false, true));

    probe.set_driver(HeadlessDriver { context_flags: FLAG_DEBUG, ..HeadlessDriver::default() });
    let w = window(&mut display, "debug flag");
    let a = attribs(&display, w);
    assert_eq!((a.forward, a.debug, a.no_error), (false, true, false));
}

#[test]
fn debug_output_stands_in_for_the_debug_flag() {
    let (mut display, probe) = common::headless();
    probe.set_driver(HeadlessDriver { extensions: extensions(&["GL_ARB_debug_output"]), ..HeadlessDriver::default() });

    display.hints_mut().context.debug = true;
    let w = window(&mut display, "debug requested");
    assert!(attribs(&display, w).debug);

    // The extension alone says nothing unless debugging was asked for.
    display.hints_mut().context.debug = false;
    let w = window(&mut display, "debug not requested");
    assert!(!attribs(&display, w).debug);

    probe.set_driver(HeadlessDriver::default());
    display.hints_mut().context.debug = true;
    let w = window(&mut display, "no debug output");
    assert!(!attribs(&display, w).debug);
}

#[test]
fn profiles_come_from_the_mask_or_the_compatibility_extension() {
    let (mut display, probe) = common::headless();

    probe.set_driver(HeadlessDriver { profile_mask: PROFILE_COMPAT, ..HeadlessDriver::default() });
    let w = window(&mut display, "compat mask");
    assert_eq!(attribs(&display, w).profile, Profile::Compat);

    probe.set_driver(HeadlessDriver { profile_mask: 0, extensions: extensions(&["GL_ARB_compatibility"]), ..HeadlessDriver::default() });
    let w = window(&mut display, "empty mask");
    assert_eq!(attribs(&display, w).profile, Profile::Compat);

    probe.set_driver(HeadlessDriver { profile_mask: 0, ..HeadlessDriver::default() });
    let w = window(&mut display, "nothing known");
    assert_eq!(attribs(&display, w).profile, Profile::Any);

    // No profiles before 3.2.
    probe.set_driver(HeadlessDriver { version: "3.1.0 Headless".to_owned(), profile_mask: PROFILE_CORE, ..HeadlessDriver::default() });
    let w = window(&mut display, "3.1");
    let a = attribs(&display, w);
    assert_eq!((a.major, a.minor, a.profile), (3, 1, Profile::Any));
}

#[test]
fn robustness_and_release_behavior_need_their_extensions() {
    let (mut display, probe) = common::headless();
    let w = window(&mut display, "plain");
    let a = attribs(&display, w);
    assert_eq!((a.robustness, a.release), (Robustness::None, ReleaseBehavior::Any));

    probe.set_driver(HeadlessDriver {
        extensions: extensions(&["GL_ARB_robustness", "GL_KHR_context_flush_control"]),
        reset_strategy: LOSE_CONTEXT_ON_RESET,
        release_behavior: RELEASE_NONE,
        ..HeadlessDriver::default()
    });
    let w = window(&mut display, "robust");
    let a = attribs(&display, w);
    assert_eq!((a.robustness, a.release), (Robustness::LoseContextOnReset, ReleaseBehavior::None));
}

#[test]
fn es_contexts_use_the_ext_robustness_extension() {
    let (mut display, probe) = common::headless();
    probe.set_driver(HeadlessDriver {
        version: "OpenGL ES 3.2 Headless".to_owned(),
        extensions: extensions(&["GL_EXT_robustness"]),
        reset_strategy: NO_RESET_NOTIFICATION,
        ..HeadlessDriver::default()
    });
    display.hints_mut().context.client = ClientApi::OpenGlEs;
    let w = window(&mut display, "es");
    let a = attribs(&display, w);
    assert_eq!((a.client, a.major, a.minor), (ClientApi::OpenGlEs, 3, 2));
    assert_eq!(a.robustness, Robustness::NoResetNotification);
    assert_eq!(a.profile, Profile::Any);
}

#[test]
fn old_contexts_search_the_extension_string() {
    let (mut display, probe) = common::headless();
    probe.set_driver(HeadlessDriver {
        version: "2.1 Headless".to_owned(),
        extensions: extensions(&["GL_ARB_robustness_isolation", "GL_EXT_framebuffer_object"]),
        missing_entry_points: extensions(&["glGetStringi"]),
        ..HeadlessDriver::default()
    });
    let w = window(&mut display, "2.1");
    let a = attribs(&display, w);
    assert_eq!((a.major, a.minor), (2, 1));
    assert_eq!(a.robustness, Robustness::None);

    display.make_context_current(Some(w)).unwrap();
    assert!(display.extension_supported("GL_EXT_framebuffer_object").unwrap());
    assert!(display.extension_supported("GL_ARB_robustness_isolation").unwrap());
    assert!(!display.extension_supported("GL_ARB_robustness").unwrap());
    assert!(!display.extension_supported("GL_EXT_framebuffer").unwrap());
    assert!(display.extension_supported("HEADLESS_swap_control").unwrap());
}

#[test]
fn missing_entry_points_are_platform_errors() {
    let (mut display, probe) = common::headless();
    for name in &["glGetIntegerv", "glGetString", "glGetStringi"] {
        probe.set_driver(HeadlessDriver { missing_entry_points: extensions(&[*name]), ..HeadlessDriver::default() });
        let e = display.create_window(Extent2::new(640, 480), name, None, None).unwrap_err();
        assert_eq!(e.kind, ErrorKind::PlatformError, "{}", name);
        assert_unwound(&display, &probe);
    }
    assert_eq!(display.current_context(), None);
}

#[test]
fn version_strings_without_digits_are_platform_errors() {
    let (mut display, probe) = common::headless();
    probe.set_driver(HeadlessDriver { version: "Headless GL".to_owned(), ..HeadlessDriver::default() });
    let e = display.create_window(Extent2::new(640, 480), "versionless", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::PlatformError);
    assert_unwound(&display, &probe);
}

#[test]
fn swap_intervals_are_ignored_without_swap_control() {
    let (mut display, probe) = common::headless();
    probe.set_driver(HeadlessDriver { swap_control: false, ..HeadlessDriver::default() });
    let w = window(&mut display, "no swap control");
    display.make_context_current(Some(w)).unwrap();
    probe.take_calls();

    display.set_swap_interval(1).unwrap();
    assert!(probe.take_calls().is_empty());
    assert!(display.take_error().is_none());

    display.refresh_context_attribs(w).unwrap();
    assert_eq!(probe.take_calls(), vec![NativeCall::Clear(w), NativeCall::SwapBuffers(w)]);
}

#[test]
fn refreshing_reapplies_the_swap_interval() {
    let (mut display, probe) = common::headless();
    let w = window(&mut display, "refresh");

    // Not current: bound for the refresh, then released again.
    probe.take_calls();
    assert_eq!(display.refresh_context_attribs(w).unwrap(), attribs(&display, w));
    assert_eq!(probe.take_calls(), vec![
        NativeCall::MakeCurrent(w),
        NativeCall::Clear(w),
        NativeCall::SwapBuffers(w),
        NativeCall::Detach(w),
    ]);

    display.make_context_current(Some(w)).unwrap();
    display.set_swap_interval(2).unwrap();
    probe.take_calls();

    let a = display.refresh_context_attribs(w).unwrap();
    assert_eq!((a.major, a.minor, a.profile), (4, 6, Profile::Core));
    assert_eq!(probe.take_calls(), vec![
        NativeCall::Clear(w),
        NativeCall::SwapBuffers(w),
        NativeCall::SetSwapInterval(w, 2),
    ]);
    assert_eq!(display.current_context(), Some(w));
}

#[test]
fn render_threads_take_their_own_errors() {
    let (mut display, _probe) = common::headless();
    let w = window(&mut display, "busy");
    display.make_context_current(Some(w)).unwrap();
    let handle = display.context_handle(w).unwrap();

    thread::spawn(move || {
        assert_eq!(handle.make_current().unwrap_err().kind, ErrorKind::PlatformError);
        assert_eq!(handle.take_error().map(|e| e.kind), Some(ErrorKind::PlatformError));
        assert!(handle.take_error().is_none());
    }).join().unwrap();

    assert!(display.take_error().is_none());
}
