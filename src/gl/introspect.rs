//! Asking a freshly created context what it actually is.

use std::ffi::CStr;
use std::fmt;
use std::mem;
use std::os::raw::{c_char, c_void};
use std::sync::Arc;

use super::context::{make_current, Context};
use super::{ClientApi, ContextConfig, Profile, ReleaseBehavior, Robustness};
use crate::error::{self, Error, Result};
use crate::registry::ThreadSlots;
use crate::version_cmp;

pub(crate) type GetIntegervFn = unsafe extern "system" fn(u32, *mut i32);
pub(crate) type GetStringFn = unsafe extern "system" fn(u32) -> *const u8;
pub(crate) type GetStringiFn = unsafe extern "system" fn(u32, u32) -> *const u8;
pub(crate) type ClearFn = unsafe extern "system" fn(u32);

#[allow(dead_code)]
pub(crate) mod consts {
    pub const GL_VERSION: u32 = 0x1F02;
    pub const GL_EXTENSIONS: u32 = 0x1F03;
    pub const GL_NUM_EXTENSIONS: u32 = 0x821D;
    pub const GL_CONTEXT_FLAGS: u32 = 0x821E;
    pub const GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT: i32 = 0x0000_0001;
    pub const GL_CONTEXT_FLAG_DEBUG_BIT: i32 = 0x0000_0002;
    pub const GL_CONTEXT_FLAG_NO_ERROR_BIT_KHR: i32 = 0x0000_0008;
    pub const GL_CONTEXT_PROFILE_MASK: u32 = 0x9126;
    pub const GL_CONTEXT_CORE_PROFILE_BIT: i32 = 0x0000_0001;
    pub const GL_CONTEXT_COMPATIBILITY_PROFILE_BIT: i32 = 0x0000_0002;
    pub const GL_RESET_NOTIFICATION_STRATEGY_ARB: u32 = 0x8256;
    pub const GL_LOSE_CONTEXT_ON_RESET_ARB: i32 = 0x8252;
    pub const GL_NO_RESET_NOTIFICATION_ARB: i32 = 0x8261;
    pub const GL_CONTEXT_RELEASE_BEHAVIOR: u32 = 0x82FB;
    pub const GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH: i32 = 0x82FC;
    pub const GL_NONE: i32 = 0;
    pub const GL_COLOR_BUFFER_BIT: u32 = 0x0000_4000;
}

use self::consts::*;

/// The functions needed to query a context, resolved once it was current.
#[derive(Copy, Clone)]
pub(crate) struct EntryPoints {
    pub get_integerv: GetIntegervFn,
    pub get_string: GetStringFn,
    pub get_stringi: Option<GetStringiFn>,
}

impl fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EntryPoints")
            .field("get_integerv", &(self.get_integerv as *const c_void))
            .field("get_string", &(self.get_string as *const c_void))
            .field("get_stringi", &self.get_stringi.map(|p| p as *const c_void))
            .finish()
    }
}

macro_rules! gl_proc {
    ($context:expr, $name:literal, $Fn:ty) => {
        $context.native().get_proc_address($name)
            .map(|p| unsafe { mem::transmute::<*const c_void, $Fn>(p) })
    };
}

impl EntryPoints {
    fn integer(&self, pname: u32) -> i32 {
        let mut value = 0;
        unsafe { (self.get_integerv)(pname, &mut value) };
        value
    }
    fn string(&self, name: u32) -> Option<String> {
        let p = unsafe { (self.get_string)(name) };
        string_from_gl(p)
    }
    fn string_i(&self, name: u32, index: u32) -> Option<String> {
        let f = self.get_stringi?;
        let p = unsafe { f(name, index) };
        string_from_gl(p)
    }
}

fn string_from_gl(p: *const u8) -> Option<String> {
    if p.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(p as *const c_char) }.to_string_lossy().into_owned())
}

const ES_PREFIXES: &[&str] = &["OpenGL ES-CM ", "OpenGL ES-CL ", "OpenGL ES "];

/// Parses a `GL_VERSION` string into the client API it reveals and its
/// `major.minor.revision` numbers, which are `None` if the string has no
/// leading digits. Missing minor or revision numbers are zero.
pub fn parse_version(version: &str) -> (ClientApi, Option<(i32, i32, i32)>) {
    let mut client = ClientApi::OpenGl;
    let mut rest = version;
    for prefix in ES_PREFIXES {
        if rest.starts_with(prefix) {
            rest = &rest[prefix.len()..];
            client = ClientApi::OpenGlEs;
            break;
        }
    }

    fn digits(s: &str) -> (Option<i32>, &str) {
        let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or_else(|| s.len());
        if end == 0 {
            return (None, s);
        }
        (s[..end].parse().ok(), &s[end..])
    }

    let (major, rest) = digits(rest.trim_start());
    let major = match major {
        Some(m) => m,
        None => return (client, None),
    };
    let mut numbers = [major, 0, 0];
    let mut rest = rest;
    for n in numbers.iter_mut().skip(1) {
        if !rest.starts_with('.') {
            break;
        }
        match digits(&rest[1..]) {
            (Some(v), r) => { *n = v; rest = r; },
            (None, _) => break,
        }
    }
    (client, Some((numbers[0], numbers[1], numbers[2])))
}

/// Whole-word search in a space-separated extension list.
pub(crate) fn string_in_extension_string(name: &str, extensions: &str) -> bool {
    extensions.split(' ').any(|e| e == name)
}

/// Whether the context supports `name`. The context must be current on the
/// calling thread.
pub(crate) fn extension_supported(context: &Context, name: &str) -> Result<bool> {
    if name.is_empty() {
        return error::invalid_value("Extension name cannot be an empty string");
    }
    let entry = match context.entry_points() {
        Some(e) => e,
        None => return error::platform_failed("The context was not introspected"),
    };

    if context.attribs().major >= 3 {
        let count = entry.integer(GL_NUM_EXTENSIONS);
        for i in 0..count.max(0) as u32 {
            match entry.string_i(GL_EXTENSIONS, i) {
                Some(ref e) if e == name => return Ok(true),
                Some(_) => (),
                None => return error::platform_failed("Extension string retrieval is broken"),
            }
        }
    } else {
        match entry.string(GL_EXTENSIONS) {
            Some(ref extensions) => if string_in_extension_string(name, extensions) {
                return Ok(true);
            },
            None => return error::platform_failed("Extension string retrieval is broken"),
        }
    }

    Ok(context.native().extension_supported(name))
}

/// Reads the attributes the driver actually gave to a new context, checks
/// them against what was requested, and clears its framebuffer.
///
/// The context is made current for the duration of the call, then whatever
/// was current before is restored.
pub(crate) fn refresh_attribs(context: &Arc<Context>, config: &ContextConfig, slots: &ThreadSlots) -> Result<()> {
    let previous = slots.current_context();
    make_current(slots, Some(context))?;
    let result = query(context, config);
    let restored = make_current(slots, previous.as_ref());
    result?;
    restored
}

fn query(context: &Context, config: &ContextConfig) -> Result<()> {
    let broken = || Error::platform("Entry point retrieval is broken");
    let get_integerv = gl_proc!(context, "glGetIntegerv", GetIntegervFn).ok_or_else(broken)?;
    let get_string = gl_proc!(context, "glGetString", GetStringFn).ok_or_else(broken)?;
    let mut entry = EntryPoints { get_integerv, get_string, get_stringi: None };

    let version = match entry.string(GL_VERSION) {
        Some(v) => v,
        None => return error::platform_failed(match config.client {
            ClientApi::OpenGlEs => "OpenGL ES version string retrieval is broken",
            _ => "OpenGL version string retrieval is broken",
        }),
    };
    let (client, numbers) = parse_version(&version);
    let api_name = if client == ClientApi::OpenGlEs { "OpenGL ES" } else { "OpenGL" };
    let (major, minor, revision) = match numbers {
        Some(n) => n,
        None => return error::platform_failed(format!("No version found in {} version string `{}`", api_name, version)),
    };

    if version_cmp::lt((major, minor), (config.major, config.minor)) {
        // Backends without versioned context creation get whatever the driver gives.
        return error::version_unavailable(format!(
            "Requested {} version {}.{}, got version {}.{}", api_name, config.major, config.minor, major, minor
        ));
    }

    if major >= 3 {
        entry.get_stringi = Some(gl_proc!(context, "glGetStringi", GetStringiFn).ok_or_else(broken)?);
    }

    let mut attribs = context.attribs();
    attribs.client = client;
    attribs.major = major;
    attribs.minor = minor;
    attribs.revision = revision;
    context.set_entry_points(entry);
    context.set_attribs(attribs);

    if client == ClientApi::OpenGl {
        if major >= 3 {
            let flags = entry.integer(GL_CONTEXT_FLAGS);
            if flags & GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT != 0 {
                attribs.forward = true;
            }
            if flags & GL_CONTEXT_FLAG_DEBUG_BIT != 0 {
                attribs.debug = true;
            } else if config.debug && extension_supported(context, "GL_ARB_debug_output")? {
                // Drivers older than KHR_debug don't set the flag.
                attribs.debug = true;
            }
            if flags & GL_CONTEXT_FLAG_NO_ERROR_BIT_KHR != 0 {
                attribs.no_error = true;
            }
        }

        if version_cmp::ge((major, minor), (3, 2)) {
            let mask = entry.integer(GL_CONTEXT_PROFILE_MASK);
            if mask & GL_CONTEXT_COMPATIBILITY_PROFILE_BIT != 0 {
                attribs.profile = Profile::Compat;
            } else if mask & GL_CONTEXT_CORE_PROFILE_BIT != 0 {
                attribs.profile = Profile::Core;
            } else if extension_supported(context, "GL_ARB_compatibility")? {
                // Some drivers leave the mask empty when no version was requested.
                attribs.profile = Profile::Compat;
            }
        }

        if extension_supported(context, "GL_ARB_robustness")? {
            attribs.robustness = reset_strategy(&entry).unwrap_or(attribs.robustness);
        }
    } else if extension_supported(context, "GL_EXT_robustness")? {
        attribs.robustness = reset_strategy(&entry).unwrap_or(attribs.robustness);
    }

    if extension_supported(context, "GL_KHR_context_flush_control")? {
        match entry.integer(GL_CONTEXT_RELEASE_BEHAVIOR) {
            GL_NONE => attribs.release = ReleaseBehavior::None,
            GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH => attribs.release = ReleaseBehavior::Flush,
            _ => (),
        }
    }

    context.set_attribs(attribs);
    info!("Context of window {:?} is {} {}.{}.{} ({:?} profile, forward: {}, debug: {}, no-error: {}, {:?}, release: {:?})",
        context.window(), api_name, major, minor, revision, attribs.profile,
        attribs.forward, attribs.debug, attribs.no_error, attribs.robustness, attribs.release
    );

    // Don't show whatever the previous owner of this memory left there.
    match gl_proc!(context, "glClear", ClearFn) {
        Some(clear) => unsafe { clear(GL_COLOR_BUFFER_BIT) },
        None => warn!("glClear is not available; the framebuffer of window {:?} may show garbage", context.window()),
    }
    if context.is_doublebuffered() {
        context.native().swap_buffers()?;
    }

    if context.native().swap_interval_supported() {
        if let Some(interval) = context.swap_interval() {
            context.native().set_swap_interval(interval)?;
        }
    }
    Ok(())
}

fn reset_strategy(entry: &EntryPoints) -> Option<Robustness> {
    match entry.integer(GL_RESET_NOTIFICATION_STRATEGY_ARB) {
        GL_LOSE_CONTEXT_ON_RESET_ARB => Some(Robustness::LoseContextOnReset),
        GL_NO_RESET_NOTIFICATION_ARB => Some(Robustness::NoResetNotification),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_versions() {
        assert_eq!(parse_version("4.6.0 NVIDIA 535.54.03"), (ClientApi::OpenGl, Some((4, 6, 0))));
        assert_eq!(parse_version("3.3 (Core Profile) Mesa 23.1.4"), (ClientApi::OpenGl, Some((3, 3, 0))));
        assert_eq!(parse_version("2"), (ClientApi::OpenGl, Some((2, 0, 0))));
        assert_eq!(parse_version("1.5.Build 12"), (ClientApi::OpenGl, Some((1, 5, 0))));
    }

    #[test]
    fn es_prefixes_are_skipped() {
        assert_eq!(parse_version("OpenGL ES 3.2 V@0502.0"), (ClientApi::OpenGlEs, Some((3, 2, 0))));
        assert_eq!(parse_version("OpenGL ES-CM 1.1"), (ClientApi::OpenGlEs, Some((1, 1, 0))));
        assert_eq!(parse_version("OpenGL ES-CL 1.0"), (ClientApi::OpenGlEs, Some((1, 0, 0))));
    }

    #[test]
    fn strings_without_digits_have_no_version() {
        assert_eq!(parse_version("Mesa"), (ClientApi::OpenGl, None));
        assert_eq!(parse_version("OpenGL ES beta"), (ClientApi::OpenGlEs, None));
        assert_eq!(parse_version(""), (ClientApi::OpenGl, None));
    }

    #[test]
    fn extension_lists_match_whole_words() {
        let list = "GL_ARB_debug_output GL_ARB_robustness_isolation GL_KHR_debug";
        assert!(string_in_extension_string("GL_KHR_debug", list));
        assert!(string_in_extension_string("GL_ARB_debug_output", list));
        assert!(!string_in_extension_string("GL_ARB_robustness", list));
        assert!(!string_in_extension_string("GL_ARB_debug", list));
    }
}
