use std::any::Any;
use std::os::raw::*;
use std::mem;
use std::ptr;
use std::ffi::{CStr, CString};
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use super::winapi_utils::*;
use self::consts::*;
use crate::error::{self, Error, ErrorKind, Result};
use crate::fbconfig::FramebufferConfig;
use crate::gl::{ClientApi, ContextConfig, ContextCreationApi, Profile, ReleaseBehavior, Robustness, string_in_extension_string};
use crate::os::NativeContext;

// extern "C" fns implement Debug, but not extern "system" fns. Urgh.
#[allow(non_snake_case)]
#[derive(Copy, Clone, Default)]
pub struct WglFns {
    pub wglGetExtensionsStringARB: Option<unsafe extern "system" fn(HDC) -> *const c_char>,
    pub wglGetExtensionsStringEXT: Option<unsafe extern "system" fn() -> *const c_char>,
    pub wglCreateContextAttribsARB: Option<unsafe extern "system" fn(HDC, HGLRC, *const c_int) -> HGLRC>,
    pub wglGetPixelFormatAttribivARB: Option<unsafe extern "system" fn(HDC, c_int, c_int, UINT, *const c_int, *mut c_int) -> BOOL>,
    pub wglSwapIntervalEXT: Option<unsafe extern "system" fn(c_int) -> BOOL>,
}

impl Debug for WglFns {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        #[allow(non_snake_case)]
        let &Self {
            wglGetExtensionsStringARB,
            wglGetExtensionsStringEXT,
            wglCreateContextAttribsARB,
            wglGetPixelFormatAttribivARB,
            wglSwapIntervalEXT,
        } = self;
        f.debug_struct("WglFns")
            .field("wglGetExtensionsStringARB",    &wglGetExtensionsStringARB   .map(|f| f as *const c_void))
            .field("wglGetExtensionsStringEXT",    &wglGetExtensionsStringEXT   .map(|f| f as *const c_void))
            .field("wglCreateContextAttribsARB",   &wglCreateContextAttribsARB  .map(|f| f as *const c_void))
            .field("wglGetPixelFormatAttribivARB", &wglGetPixelFormatAttribivARB.map(|f| f as *const c_void))
            .field("wglSwapIntervalEXT",           &wglSwapIntervalEXT          .map(|f| f as *const c_void))
            .finish()
    }
}

#[allow(non_snake_case)]
#[derive(Debug)]
pub struct Wgl {
    pub fns: WglFns,
    pub opengl32: HMODULE,
    pub extensions: String,
    pub WGL_ARB_create_context: bool,
    pub WGL_ARB_create_context_profile: bool,
    pub WGL_ARB_create_context_robustness: bool,
    pub WGL_ARB_create_context_no_error: bool,
    pub WGL_ARB_context_flush_control: bool,
    pub WGL_EXT_create_context_es2_profile: bool,
    pub WGL_ARB_multisample: bool,
    pub WGL_ARB_pixel_format: bool,
    pub WGL_EXT_swap_control: bool,
    pub WGL_EXT_colorspace: bool,
    pub WGL_ARB_framebuffer_sRGB: bool,
    pub WGL_EXT_framebuffer_sRGB: bool,
}

/// Hidden window with a legacy context current, needed to load WGL
/// extensions. Everything is torn down on drop.
struct DummyContext {
    hinstance: HINSTANCE,
    class_atom: ATOM,
    hwnd: HWND,
    hdc: HDC,
    hglrc: HGLRC,
}

impl Drop for DummyContext {
    fn drop(&mut self) {
        unsafe {
            if !self.hglrc.is_null() {
                wglMakeCurrent(self.hdc, ptr::null_mut());
                wglDeleteContext(self.hglrc);
            }
            // The DC belongs to the CS_OWNDC window, so it is not released.
            if !self.hwnd.is_null() {
                DestroyWindow(self.hwnd);
            }
            UnregisterClassW(MAKEINTATOM(self.class_atom), self.hinstance);
        }
    }
}

impl DummyContext {
    unsafe fn new() -> Result<Self> {
        let hinstance = GetModuleHandleW(ptr::null());
        let classname = to_wide_with_nul("DWC dummy OpenGL context window");
        let wclass = WNDCLASSEXW {
            cbSize: mem::size_of::<WNDCLASSEXW>() as _,
            hInstance: hinstance,
            lpfnWndProc: Some(DefWindowProcW),
            lpszClassName: classname.as_ptr(),
            style: CS_OWNDC,
            cbClsExtra: 0,
            cbWndExtra: 0,
            hIcon: ptr::null_mut(),
            hIconSm: ptr::null_mut(),
            hCursor: ptr::null_mut(),
            hbrBackground: ptr::null_mut(),
            lpszMenuName: ptr::null(),
        };
        let class_atom = RegisterClassExW(&wclass);
        if class_atom == 0 {
            return winapi_fail("RegisterClassExW");
        }
        let mut dummy = DummyContext {
            hinstance, class_atom,
            hwnd: ptr::null_mut(),
            hdc: ptr::null_mut(),
            hglrc: ptr::null_mut(),
        };

        dummy.hwnd = CreateWindowExW(
            WS_EX_OVERLAPPEDWINDOW,
            MAKEINTATOM(class_atom),
            ptr::null_mut(), // No title
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT, CW_USEDEFAULT, 1, 1,
            ptr::null_mut(), // No parent
            ptr::null_mut(), // No menu
            hinstance,
            ptr::null_mut(),
        );
        if dummy.hwnd.is_null() {
            return winapi_fail("CreateWindowExW");
        }
        dummy.hdc = GetDC(dummy.hwnd);
        if dummy.hdc.is_null() {
            return winapi_fail("GetDC");
        }

        let pfd = PIXELFORMATDESCRIPTOR {
            nSize: mem::size_of::<PIXELFORMATDESCRIPTOR>() as _,
            nVersion: 1,
            dwFlags: PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER,
            iPixelType: PFD_TYPE_RGBA,
            cColorBits: 24,
            .. mem::zeroed()
        };
        let i_pixel_format = ChoosePixelFormat(dummy.hdc, &pfd);
        if i_pixel_format == 0 {
            return winapi_fail("ChoosePixelFormat");
        }
        if SetPixelFormat(dummy.hdc, i_pixel_format, &pfd) == FALSE {
            return winapi_fail("SetPixelFormat");
        }
        dummy.hglrc = wglCreateContext(dummy.hdc);
        if dummy.hglrc.is_null() {
            return winapi_fail("wglCreateContext");
        }
        if wglMakeCurrent(dummy.hdc, dummy.hglrc) == FALSE {
            return winapi_fail("wglMakeCurrent");
        }
        Ok(dummy)
    }
}

unsafe fn get_fn(name: &[u8]) -> Option<&c_void> {
    debug_assert_eq!(Some(&0), name.last());
    match wglGetProcAddress(name.as_ptr() as _) as usize {
        0 => None,
        f => Some(mem::transmute(f)),
    }
}

unsafe fn string_from_wgl(s: *const c_char) -> String {
    if s.is_null() {
        String::new()
    } else {
        CStr::from_ptr(s).to_string_lossy().into_owned()
    }
}

impl Wgl {
    pub fn new() -> Result<Self> {
        // Extension functions are only loadable with a context current, so
        // create a legacy one on a hidden window, then get rid of everything.
        unsafe {
            let opengl32 = LoadLibraryA(b"opengl32.dll\0".as_ptr() as _);
            if opengl32.is_null() {
                return Err(Error::new(ErrorKind::ApiUnavailable, "Failed to load opengl32.dll"));
            }
            let dummy = match DummyContext::new() {
                Ok(d) => d,
                Err(e) => {
                    FreeLibrary(opengl32);
                    return Err(e);
                },
            };

            let fns = WglFns {
                wglGetExtensionsStringARB: mem::transmute(get_fn(b"wglGetExtensionsStringARB\0")),
                wglGetExtensionsStringEXT: mem::transmute(get_fn(b"wglGetExtensionsStringEXT\0")),
                wglCreateContextAttribsARB: mem::transmute(get_fn(b"wglCreateContextAttribsARB\0")),
                wglGetPixelFormatAttribivARB: mem::transmute(get_fn(b"wglGetPixelFormatAttribivARB\0")),
                wglSwapIntervalEXT: mem::transmute(get_fn(b"wglSwapIntervalEXT\0")),
            };
            let extensions = match (fns.wglGetExtensionsStringARB, fns.wglGetExtensionsStringEXT) {
                (Some(f), _) => string_from_wgl(f(dummy.hdc)),
                (None, Some(f)) => string_from_wgl(f()),
                (None, None) => String::new(),
            };
            drop(dummy);

            let has = |name: &str| string_in_extension_string(name, &extensions);
            let wgl = Wgl {
                fns,
                opengl32,
                WGL_ARB_create_context: has("WGL_ARB_create_context") && fns.wglCreateContextAttribsARB.is_some(),
                WGL_ARB_create_context_profile: has("WGL_ARB_create_context_profile"),
                WGL_ARB_create_context_robustness: has("WGL_ARB_create_context_robustness"),
                WGL_ARB_create_context_no_error: has("WGL_ARB_create_context_no_error"),
                WGL_ARB_context_flush_control: has("WGL_ARB_context_flush_control"),
                WGL_EXT_create_context_es2_profile: has("WGL_EXT_create_context_es2_profile"),
                WGL_ARB_multisample: has("WGL_ARB_multisample"),
                WGL_ARB_pixel_format: has("WGL_ARB_pixel_format") && fns.wglGetPixelFormatAttribivARB.is_some(),
                WGL_EXT_swap_control: has("WGL_EXT_swap_control") && fns.wglSwapIntervalEXT.is_some(),
                WGL_EXT_colorspace: has("WGL_EXT_colorspace"),
                WGL_ARB_framebuffer_sRGB: has("WGL_ARB_framebuffer_sRGB"),
                WGL_EXT_framebuffer_sRGB: has("WGL_EXT_framebuffer_sRGB"),
                extensions,
            };
            debug!("WGL: {:?}", wgl.fns);
            Ok(wgl)
        }
    }

    fn pixel_format_count(&self, hdc: HDC) -> Result<c_int> {
        if self.WGL_ARB_pixel_format {
            return Ok(self.pixel_format_attribs(hdc, 1, &[WGL_NUMBER_PIXEL_FORMATS_ARB])?[0]);
        }
        let n = unsafe { DescribePixelFormat(hdc, 1, mem::size_of::<PIXELFORMATDESCRIPTOR>() as _, ptr::null_mut()) };
        if n == 0 {
            return winapi_fail("DescribePixelFormat");
        }
        Ok(n)
    }

    fn pixel_format_attribs(&self, hdc: HDC, format: c_int, names: &[c_int]) -> Result<Vec<c_int>> {
        let f = self.fns.wglGetPixelFormatAttribivARB.ok_or_else(|| Error::platform("wglGetPixelFormatAttribivARB is missing"))?;
        let mut values = vec![0; names.len()];
        let is_ok = unsafe {
            f(hdc, format, 0, names.len() as _, names.as_ptr(), values.as_mut_ptr())
        };
        if is_ok == FALSE {
            return winapi_fail("wglGetPixelFormatAttribivARB");
        }
        Ok(values)
    }

    /// Lists the window's usable pixel formats. `handle` is the format index.
    pub fn framebuffer_configs(&self, hdc: HDC, ctx: &ContextConfig) -> Result<Vec<FramebufferConfig>> {
        let count = self.pixel_format_count(hdc)?;
        let mut configs = Vec::with_capacity(count as usize);
        for i in 1..=count {
            let config = if self.WGL_ARB_pixel_format {
                self.describe_arb(hdc, i, ctx)?
            } else {
                describe_legacy(hdc, i)?
            };
            if let Some(mut config) = config {
                config.handle = i as usize;
                configs.push(config);
            }
        }
        debug!("WGL: {} usable pixel formats out of {}", configs.len(), count);
        Ok(configs)
    }

    fn describe_arb(&self, hdc: HDC, format: c_int, ctx: &ContextConfig) -> Result<Option<FramebufferConfig>> {
        let mut names = vec![
            WGL_SUPPORT_OPENGL_ARB, WGL_DRAW_TO_WINDOW_ARB, WGL_PIXEL_TYPE_ARB, WGL_ACCELERATION_ARB,
            WGL_RED_BITS_ARB, WGL_GREEN_BITS_ARB, WGL_BLUE_BITS_ARB, WGL_ALPHA_BITS_ARB,
            WGL_DEPTH_BITS_ARB, WGL_STENCIL_BITS_ARB,
            WGL_ACCUM_RED_BITS_ARB, WGL_ACCUM_GREEN_BITS_ARB, WGL_ACCUM_BLUE_BITS_ARB, WGL_ACCUM_ALPHA_BITS_ARB,
            WGL_AUX_BUFFERS_ARB, WGL_STEREO_ARB, WGL_DOUBLE_BUFFER_ARB,
        ];
        if self.WGL_ARB_multisample {
            names.push(WGL_SAMPLES_ARB);
        }
        if ctx.client == ClientApi::OpenGl {
            if self.WGL_ARB_framebuffer_sRGB || self.WGL_EXT_framebuffer_sRGB {
                names.push(WGL_FRAMEBUFFER_SRGB_CAPABLE_ARB);
            }
        } else if self.WGL_EXT_colorspace {
            names.push(WGL_COLORSPACE_EXT);
        }
        let values = self.pixel_format_attribs(hdc, format, &names)?;
        let get = |name: c_int| names.iter().position(|n| *n == name).map(|i| values[i]).unwrap_or(0);

        if get(WGL_SUPPORT_OPENGL_ARB) == 0 || get(WGL_DRAW_TO_WINDOW_ARB) == 0 {
            return Ok(None);
        }
        if get(WGL_PIXEL_TYPE_ARB) != WGL_TYPE_RGBA_ARB || get(WGL_ACCELERATION_ARB) == WGL_NO_ACCELERATION_ARB {
            return Ok(None);
        }
        let srgb = if ctx.client == ClientApi::OpenGl {
            get(WGL_FRAMEBUFFER_SRGB_CAPABLE_ARB) != 0
        } else {
            get(WGL_COLORSPACE_EXT) == WGL_COLORSPACE_SRGB_EXT
        };
        Ok(Some(FramebufferConfig {
            red_bits: get(WGL_RED_BITS_ARB),
            green_bits: get(WGL_GREEN_BITS_ARB),
            blue_bits: get(WGL_BLUE_BITS_ARB),
            alpha_bits: get(WGL_ALPHA_BITS_ARB),
            depth_bits: get(WGL_DEPTH_BITS_ARB),
            stencil_bits: get(WGL_STENCIL_BITS_ARB),
            accum_red_bits: get(WGL_ACCUM_RED_BITS_ARB),
            accum_green_bits: get(WGL_ACCUM_GREEN_BITS_ARB),
            accum_blue_bits: get(WGL_ACCUM_BLUE_BITS_ARB),
            accum_alpha_bits: get(WGL_ACCUM_ALPHA_BITS_ARB),
            aux_buffers: get(WGL_AUX_BUFFERS_ARB),
            samples: get(WGL_SAMPLES_ARB),
            stereo: get(WGL_STEREO_ARB) != 0,
            doublebuffer: get(WGL_DOUBLE_BUFFER_ARB) != 0,
            srgb,
            transparent: false,
            handle: 0,
        }))
    }

    /// Sets the pixel format on the window and creates a context for it.
    pub fn create_context(&self, hdc: HDC, fb: &FramebufferConfig, ctx: &ContextConfig, share: Option<HGLRC>) -> Result<HGLRC> {
        if ctx.source != ContextCreationApi::Native {
            return Err(Error::new(ErrorKind::ApiUnavailable, format!("{:?} is not available on Win32", ctx.source)));
        }
        unsafe {
            let format = fb.handle as c_int;
            let mut pfd: PIXELFORMATDESCRIPTOR = mem::zeroed();
            if DescribePixelFormat(hdc, format, mem::size_of_val(&pfd) as _, &mut pfd) == 0 {
                return winapi_fail("DescribePixelFormat");
            }
            if SetPixelFormat(hdc, format, &pfd) == FALSE {
                return winapi_fail("SetPixelFormat");
            }
        }

        match ctx.client {
            ClientApi::OpenGl => {
                if ctx.forward && !self.WGL_ARB_create_context {
                    return error::version_unavailable("A forward compatible OpenGL context requested but WGL_ARB_create_context is unavailable");
                }
                if ctx.profile != Profile::Any && !self.WGL_ARB_create_context_profile {
                    return error::version_unavailable("OpenGL profile requested but WGL_ARB_create_context_profile is unavailable");
                }
            },
            _ => {
                if !self.WGL_ARB_create_context || !self.WGL_ARB_create_context_profile || !self.WGL_EXT_create_context_es2_profile {
                    return Err(Error::new(ErrorKind::ApiUnavailable, "OpenGL ES requested but WGL_ARB_create_context_es2_profile is unavailable"));
                }
            },
        }

        let share = share.unwrap_or(ptr::null_mut());
        if !self.WGL_ARB_create_context {
            return unsafe { create_legacy(hdc, share) };
        }

        let mut attribs: Vec<c_int> = Vec::with_capacity(16);
        let mut flags = 0;
        let mut mask = 0;
        if ctx.client == ClientApi::OpenGlEs {
            mask |= WGL_CONTEXT_ES2_PROFILE_BIT_EXT;
        } else {
            if ctx.forward {
                flags |= WGL_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB;
            }
            match ctx.profile {
                Profile::Core => mask |= WGL_CONTEXT_CORE_PROFILE_BIT_ARB,
                Profile::Compat => mask |= WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB,
                Profile::Any => (),
            }
        }
        if ctx.debug {
            flags |= WGL_CONTEXT_DEBUG_BIT_ARB;
        }
        if ctx.robustness != Robustness::None && self.WGL_ARB_create_context_robustness {
            attribs.push(WGL_CONTEXT_RESET_NOTIFICATION_STRATEGY_ARB);
            attribs.push(match ctx.robustness {
                Robustness::LoseContextOnReset => WGL_LOSE_CONTEXT_ON_RESET_ARB,
                _ => WGL_NO_RESET_NOTIFICATION_ARB,
            });
            flags |= WGL_CONTEXT_ROBUST_ACCESS_BIT_ARB;
        }
        if ctx.release != ReleaseBehavior::Any && self.WGL_ARB_context_flush_control {
            attribs.push(WGL_CONTEXT_RELEASE_BEHAVIOR_ARB);
            attribs.push(match ctx.release {
                ReleaseBehavior::None => WGL_CONTEXT_RELEASE_BEHAVIOR_NONE_ARB,
                _ => WGL_CONTEXT_RELEASE_BEHAVIOR_FLUSH_ARB,
            });
        }
        if ctx.no_error && self.WGL_ARB_create_context_no_error {
            attribs.push(WGL_CONTEXT_OPENGL_NO_ERROR_ARB);
            attribs.push(TRUE);
        }
        // 1.0 is the default, and asking for it explicitly breaks some drivers.
        if ctx.major != 1 || ctx.minor != 0 {
            attribs.extend_from_slice(&[WGL_CONTEXT_MAJOR_VERSION_ARB, ctx.major, WGL_CONTEXT_MINOR_VERSION_ARB, ctx.minor]);
        }
        if flags != 0 {
            attribs.extend_from_slice(&[WGL_CONTEXT_FLAGS_ARB, flags]);
        }
        if mask != 0 {
            attribs.extend_from_slice(&[WGL_CONTEXT_PROFILE_MASK_ARB, mask]);
        }
        attribs.push(0);

        let create = self.fns.wglCreateContextAttribsARB.ok_or_else(|| Error::platform("wglCreateContextAttribsARB is missing"))?;
        let hglrc = unsafe { create(hdc, share, attribs.as_ptr()) };
        if !hglrc.is_null() {
            return Ok(hglrc);
        }
        let code = unsafe { GetLastError() };
        match code {
            ERROR_INVALID_VERSION_ARB => error::version_unavailable(format!("Driver does not support {:?} version {}.{}", ctx.client, ctx.major, ctx.minor)),
            ERROR_INVALID_PROFILE_ARB => error::version_unavailable(format!("Driver does not support the requested {:?} profile", ctx.profile)),
            ERROR_INCOMPATIBLE_DEVICE_CONTEXTS_ARB => error::invalid_value("The share context is not compatible with the requested one"),
            _ => error::platform_failed(format!("wglCreateContextAttribsARB failed (error 0x{:08X})", code)),
        }
    }
}

impl Drop for Wgl {
    fn drop(&mut self) {
        unsafe {
            FreeLibrary(self.opengl32);
        }
    }
}

unsafe fn create_legacy(hdc: HDC, share: HGLRC) -> Result<HGLRC> {
    let hglrc = wglCreateContext(hdc);
    if hglrc.is_null() {
        return winapi_fail("wglCreateContext");
    }
    if !share.is_null() && wglShareLists(share, hglrc) == FALSE {
        let e = last_error("wglShareLists");
        wglDeleteContext(hglrc);
        return Err(e);
    }
    Ok(hglrc)
}

fn describe_legacy(hdc: HDC, format: c_int) -> Result<Option<FramebufferConfig>> {
    let mut pfd: PIXELFORMATDESCRIPTOR = unsafe { mem::zeroed() };
    if unsafe { DescribePixelFormat(hdc, format, mem::size_of_val(&pfd) as _, &mut pfd) } == 0 {
        return winapi_fail("DescribePixelFormat");
    }
    if pfd.dwFlags & PFD_DRAW_TO_WINDOW == 0 || pfd.dwFlags & PFD_SUPPORT_OPENGL == 0 {
        return Ok(None);
    }
    if pfd.dwFlags & PFD_GENERIC_ACCELERATED == 0 && pfd.dwFlags & PFD_GENERIC_FORMAT != 0 {
        return Ok(None);
    }
    if pfd.iPixelType != PFD_TYPE_RGBA {
        return Ok(None);
    }
    Ok(Some(FramebufferConfig {
        red_bits: pfd.cRedBits as _,
        green_bits: pfd.cGreenBits as _,
        blue_bits: pfd.cBlueBits as _,
        alpha_bits: pfd.cAlphaBits as _,
        depth_bits: pfd.cDepthBits as _,
        stencil_bits: pfd.cStencilBits as _,
        accum_red_bits: pfd.cAccumRedBits as _,
        accum_green_bits: pfd.cAccumGreenBits as _,
        accum_blue_bits: pfd.cAccumBlueBits as _,
        accum_alpha_bits: pfd.cAccumAlphaBits as _,
        aux_buffers: pfd.cAuxBuffers as _,
        samples: 0,
        stereo: pfd.dwFlags & PFD_STEREO != 0,
        doublebuffer: pfd.dwFlags & PFD_DOUBLEBUFFER != 0,
        srgb: false,
        transparent: false,
        handle: 0,
    }))
}

/// A WGL context on a CS_OWNDC window.
pub struct WglContext {
    pub hdc: HDC,
    pub hglrc: HGLRC,
    pub opengl32: HMODULE,
    pub swap_interval: Option<unsafe extern "system" fn(c_int) -> BOOL>,
    pub extensions: String,
    pub destroyed: AtomicBool,
}

impl Debug for WglContext {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("WglContext")
            .field("hdc", &self.hdc)
            .field("hglrc", &self.hglrc)
            .field("swap_interval", &self.swap_interval.map(|f| f as *const c_void))
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

// The handles are only ever used with WGL calls, which are thread-safe.
unsafe impl Send for WglContext {}
unsafe impl Sync for WglContext {}

impl WglContext {
    fn check_alive(&self) -> Result<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(Error::invalid_handle("The WGL context was destroyed"));
        }
        Ok(())
    }
}

impl NativeContext for WglContext {
    fn creation_api(&self) -> ContextCreationApi { ContextCreationApi::Native }
    fn make_current(&self) -> Result<()> {
        self.check_alive()?;
        if unsafe { wglMakeCurrent(self.hdc, self.hglrc) } == FALSE {
            return winapi_fail("wglMakeCurrent");
        }
        Ok(())
    }
    fn detach(&self) -> Result<()> {
        if unsafe { wglMakeCurrent(ptr::null_mut(), ptr::null_mut()) } == FALSE {
            return winapi_fail("wglMakeCurrent");
        }
        Ok(())
    }
    fn swap_buffers(&self) -> Result<()> {
        self.check_alive()?;
        if unsafe { SwapBuffers(self.hdc) } == FALSE {
            return winapi_fail("SwapBuffers");
        }
        Ok(())
    }
    fn swap_interval_supported(&self) -> bool {
        self.swap_interval.is_some()
    }
    fn set_swap_interval(&self, interval: i32) -> Result<()> {
        let f = match self.swap_interval {
            Some(f) => f,
            None => return error::platform_failed("WGL_EXT_swap_control is unavailable"),
        };
        if unsafe { f(interval) } == FALSE {
            return winapi_fail("wglSwapIntervalEXT");
        }
        Ok(())
    }
    fn extension_supported(&self, name: &str) -> bool {
        string_in_extension_string(name, &self.extensions)
    }
    fn get_proc_address(&self, name: &str) -> Option<*const c_void> {
        let name = CString::new(name).ok()?;
        unsafe {
            // wglGetProcAddress only knows about extension functions, and
            // some drivers return small integers instead of NULL.
            let f = match wglGetProcAddress(name.as_ptr()) as isize {
                0 | 1 | 2 | 3 | -1 => GetProcAddress(self.opengl32, name.as_ptr()) as *const c_void,
                f => f as *const c_void,
            };
            if f.is_null() { None } else { Some(f) }
        }
    }
    fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        unsafe {
            if wglGetCurrentContext() == self.hglrc {
                wglMakeCurrent(ptr::null_mut(), ptr::null_mut());
            }
            if wglDeleteContext(self.hglrc) == FALSE {
                warn!("{}", last_error("wglDeleteContext"));
            }
        }
    }
    fn as_any(&self) -> &dyn Any { self }
}

#[allow(dead_code)]
#[allow(non_upper_case_globals)]
pub mod consts {
    use super::*;

    pub const WGL_CONTEXT_DEBUG_BIT_ARB: c_int =         0x00000001;
    pub const WGL_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: c_int = 0x00000002;
    pub const WGL_CONTEXT_MAJOR_VERSION_ARB: c_int =     0x2091;
    pub const WGL_CONTEXT_MINOR_VERSION_ARB: c_int =     0x2092;
    pub const WGL_CONTEXT_FLAGS_ARB: c_int =             0x2094;
    pub const WGL_CONTEXT_OPENGL_NO_ERROR_ARB: c_int =   0x31B3;
    pub const WGL_CONTEXT_PROFILE_MASK_ARB: c_int =      0x9126;
    pub const WGL_CONTEXT_CORE_PROFILE_BIT_ARB: c_int =  0x00000001;
    pub const WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: c_int = 0x00000002;
    pub const WGL_CONTEXT_ROBUST_ACCESS_BIT_ARB: c_int = 0x00000004;
    pub const WGL_LOSE_CONTEXT_ON_RESET_ARB: c_int =     0x8252;
    pub const WGL_CONTEXT_RESET_NOTIFICATION_STRATEGY_ARB: c_int = 0x8256;
    pub const WGL_NO_RESET_NOTIFICATION_ARB: c_int =     0x8261;
    pub const WGL_CONTEXT_RELEASE_BEHAVIOR_ARB: c_int =  0x2097;
    pub const WGL_CONTEXT_RELEASE_BEHAVIOR_NONE_ARB: c_int = 0;
    pub const WGL_CONTEXT_RELEASE_BEHAVIOR_FLUSH_ARB: c_int = 0x2098;
    pub const WGL_CONTEXT_ES2_PROFILE_BIT_EXT: c_int =   0x00000004;

    // GetLastError() values, with the customer bit and facility set.
    pub const ERROR_INVALID_VERSION_ARB: DWORD =         0xC0072095;
    pub const ERROR_INVALID_PROFILE_ARB: DWORD =         0xC0072096;
    pub const ERROR_INCOMPATIBLE_DEVICE_CONTEXTS_ARB: DWORD = 0xC0072054;

    pub const WGL_FRAMEBUFFER_SRGB_CAPABLE_ARB: c_int =  0x20A9;
    pub const WGL_SAMPLES_ARB: c_int =                   0x2042;

    pub const WGL_NUMBER_PIXEL_FORMATS_ARB: c_int =      0x2000;
    pub const WGL_DRAW_TO_WINDOW_ARB: c_int =            0x2001;
    pub const WGL_ACCELERATION_ARB: c_int =              0x2003;
    pub const WGL_SUPPORT_OPENGL_ARB: c_int =            0x2010;
    pub const WGL_DOUBLE_BUFFER_ARB: c_int =             0x2011;
    pub const WGL_STEREO_ARB: c_int =                    0x2012;
    pub const WGL_PIXEL_TYPE_ARB: c_int =                0x2013;
    pub const WGL_RED_BITS_ARB: c_int =                  0x2015;
    pub const WGL_GREEN_BITS_ARB: c_int =                0x2017;
    pub const WGL_BLUE_BITS_ARB: c_int =                 0x2019;
    pub const WGL_ALPHA_BITS_ARB: c_int =                0x201B;
    pub const WGL_ACCUM_RED_BITS_ARB: c_int =            0x201E;
    pub const WGL_ACCUM_GREEN_BITS_ARB: c_int =          0x201F;
    pub const WGL_ACCUM_BLUE_BITS_ARB: c_int =           0x2020;
    pub const WGL_ACCUM_ALPHA_BITS_ARB: c_int =          0x2021;
    pub const WGL_DEPTH_BITS_ARB: c_int =                0x2022;
    pub const WGL_STENCIL_BITS_ARB: c_int =              0x2023;
    pub const WGL_AUX_BUFFERS_ARB: c_int =               0x2024;
    pub const WGL_NO_ACCELERATION_ARB: c_int =           0x2025;
    pub const WGL_TYPE_RGBA_ARB: c_int =                 0x202B;

    pub const WGL_COLORSPACE_EXT: c_int =                0x3087;
    pub const WGL_COLORSPACE_SRGB_EXT: c_int =           0x3089;
}
