//! The Win32 backend: windows, WGL contexts, display modes and input.

use std::collections::HashMap;
use std::mem;
use std::os::raw::c_int;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};

use crate::cursor::{CursorId, CursorImage, CursorSource, StandardCursor};
use crate::error::{Error, ErrorKind, Result};
use crate::event::Message;
use crate::fbconfig::FramebufferConfig;
use crate::gl::ContextConfig;
use crate::image::RgbaImage;
use crate::input::{Key, Modifiers};
use crate::monitor::{MonitorInfo, VideoMode};
use crate::timeout::Timeout;
use crate::window::{WindowId, WindowSettings};
use crate::{Extent2, Vec2};
use super::{NativeContext, NativeWindowDesc, Platform};

mod winapi_utils;
mod keymap;
mod monitor;
mod wgl;
mod wndproc;

use self::winapi_utils::*;
use self::wgl::{Wgl, WglContext};

// Class names are process-wide, and nobody said we couldn't have multiple
// platforms.
static CLASSNAME_TOKEN: AtomicU32 = AtomicU32::new(0);

fn window_style(settings: &WindowSettings, fullscreen: bool) -> DWORD {
    let mut style = WS_CLIPSIBLINGS | WS_CLIPCHILDREN;
    if fullscreen {
        style |= WS_POPUP;
    } else {
        style |= WS_SYSMENU | WS_MINIMIZEBOX;
        if settings.decorated {
            style |= WS_CAPTION;
            if settings.resizable {
                style |= WS_MAXIMIZEBOX | WS_THICKFRAME;
            }
        } else {
            style |= WS_POPUP;
        }
    }
    style
}

fn window_ex_style(settings: &WindowSettings, fullscreen: bool) -> DWORD {
    let mut style = WS_EX_APPWINDOW;
    if fullscreen || settings.floating {
        style |= WS_EX_TOPMOST;
    }
    style
}

#[derive(Debug)]
struct Win32Window {
    hwnd: HWND,
    /// Owned by the window, since its class has CS_OWNDC.
    hdc: HDC,
    settings: WindowSettings,
    fullscreen: bool,
}

#[derive(Debug)]
struct Win32Cursor {
    handle: HCURSOR,
    /// Standard cursors belong to the system and must not be destroyed.
    shared: bool,
}

/// The Win32 platform. Must be used from the thread that created it.
#[derive(Debug)]
pub struct Win32Platform {
    hinstance: HINSTANCE,
    class_atom: ATOM,
    /// Hidden window that receives empty events and display changes.
    helper: HWND,
    wgl: Result<Wgl>,
    windows: HashMap<WindowId, Win32Window>,
    cursors: HashMap<CursorId, Win32Cursor>,
    raw_input_window: Option<HWND>,
}

impl Drop for Win32Platform {
    fn drop(&mut self) {
        let ids: Vec<_> = self.windows.keys().cloned().collect();
        for id in ids {
            self.destroy_window(id);
        }
        let cursors: Vec<_> = self.cursors.keys().cloned().collect();
        for id in cursors {
            self.destroy_cursor(id);
        }
        unsafe {
            DestroyWindow(self.helper);
            UnregisterClassW(MAKEINTATOM(self.class_atom), self.hinstance);
        }
    }
}

impl Win32Platform {
    /// Registers the window class and loads WGL. A machine without OpenGL
    /// still gets windows; context creation fails later instead.
    pub fn new() -> Result<Self> {
        let hinstance = unsafe { GetModuleHandleW(ptr::null()) };
        let token = CLASSNAME_TOKEN.fetch_add(1, AtomicOrdering::SeqCst);
        let classname = to_wide_with_nul(&format!("DWC WNDCLASS {}", token));
        let wclass = WNDCLASSEXW {
            cbSize: mem::size_of::<WNDCLASSEXW>() as _,
            hInstance: hinstance,
            lpfnWndProc: Some(wndproc::wndproc),
            lpszClassName: classname.as_ptr(),
            style: CS_HREDRAW | CS_VREDRAW | CS_OWNDC,
            cbClsExtra: 0,
            cbWndExtra: 0,
            hIcon: ptr::null_mut(),
            hIconSm: ptr::null_mut(),
            hCursor: unsafe { LoadCursorW(ptr::null_mut(), IDC_ARROW) },
            hbrBackground: ptr::null_mut(),
            lpszMenuName: ptr::null(),
        };
        let class_atom = unsafe { RegisterClassExW(&wclass) };
        if class_atom == 0 {
            return winapi_fail("RegisterClassExW");
        }

        let title = to_wide_with_nul("DWC message window");
        let helper = unsafe {
            CreateWindowExW(
                WS_EX_OVERLAPPEDWINDOW,
                MAKEINTATOM(class_atom),
                title.as_ptr(),
                WS_CLIPSIBLINGS | WS_CLIPCHILDREN,
                0, 0, 1, 1,
                ptr::null_mut(), ptr::null_mut(), hinstance, ptr::null_mut(),
            )
        };
        if helper.is_null() {
            let e = last_error("CreateWindowExW");
            unsafe { UnregisterClassW(MAKEINTATOM(class_atom), hinstance); }
            return Err(e);
        }
        wndproc::set_helper(helper);

        let wgl = Wgl::new();
        if let Err(ref e) = wgl {
            warn!("WGL is unavailable: {}", e);
        }

        Ok(Self {
            hinstance, class_atom, helper, wgl,
            windows: HashMap::new(),
            cursors: HashMap::new(),
            raw_input_window: None,
        })
    }

    fn wgl(&self) -> Result<&Wgl> {
        self.wgl.as_ref().map_err(Clone::clone)
    }

    fn hwnd(&self, id: WindowId) -> HWND {
        self.windows.get(&id).map(|w| w.hwnd).unwrap_or(ptr::null_mut())
    }

    fn client_rect_on_screen(&self, id: WindowId) -> RECT {
        let hwnd = self.hwnd(id);
        unsafe {
            let mut rect: RECT = mem::zeroed();
            GetClientRect(hwnd, &mut rect);
            let mut tl = POINT { x: rect.left, y: rect.top };
            let mut br = POINT { x: rect.right, y: rect.bottom };
            ClientToScreen(hwnd, &mut tl);
            ClientToScreen(hwnd, &mut br);
            RECT { left: tl.x, top: tl.y, right: br.x, bottom: br.y }
        }
    }

    fn cursor_handle(&self, image: CursorImage) -> HCURSOR {
        match image {
            CursorImage::Arrow => unsafe { LoadCursorW(ptr::null_mut(), IDC_ARROW) },
            CursorImage::Hidden => ptr::null_mut(),
            CursorImage::Custom(id) => match self.cursors.get(&id) {
                Some(c) => c.handle,
                None => unsafe { LoadCursorW(ptr::null_mut(), IDC_ARROW) },
            },
        }
    }
}

/// Builds an alpha-blended cursor from a top-down RGBA image.
fn create_image_cursor(image: &RgbaImage, hotspot: Vec2<i32>) -> Result<HCURSOR> {
    let (w, h) = (image.size.w as i32, image.size.h as i32);
    unsafe {
        let mut bi: BITMAPV5HEADER = mem::zeroed();
        bi.bV5Size = mem::size_of::<BITMAPV5HEADER>() as _;
        bi.bV5Width = w;
        bi.bV5Height = -h;
        bi.bV5Planes = 1;
        bi.bV5BitCount = 32;
        bi.bV5Compression = BI_BITFIELDS;
        bi.bV5RedMask = 0x00ff0000;
        bi.bV5GreenMask = 0x0000ff00;
        bi.bV5BlueMask = 0x000000ff;
        bi.bV5AlphaMask = 0xff000000;

        let mut target: *mut u8 = ptr::null_mut();
        let dc = GetDC(ptr::null_mut());
        let color = CreateDIBSection(dc, &bi as *const _ as *const BITMAPINFO, DIB_RGB_COLORS, &mut target as *mut *mut u8 as *mut _, ptr::null_mut(), 0);
        ReleaseDC(ptr::null_mut(), dc);
        if color.is_null() {
            return winapi_fail("CreateDIBSection");
        }
        let mask = CreateBitmap(w, h, 1, 1, ptr::null());
        if mask.is_null() {
            let e = last_error("CreateBitmap");
            DeleteObject(color as _);
            return Err(e);
        }

        let bgra = ::std::slice::from_raw_parts_mut(target, image.pixels.len() * 4);
        for (dst, src) in bgra.chunks_mut(4).zip(image.pixels.iter()) {
            dst[0] = src.b;
            dst[1] = src.g;
            dst[2] = src.r;
            dst[3] = src.a;
        }

        let mut ii = ICONINFO {
            fIcon: FALSE,
            xHotspot: hotspot.x as _,
            yHotspot: hotspot.y as _,
            hbmMask: mask,
            hbmColor: color,
        };
        let handle = CreateIconIndirect(&mut ii);
        DeleteObject(color as _);
        DeleteObject(mask as _);
        if handle.is_null() {
            return winapi_fail("CreateIconIndirect");
        }
        Ok(handle)
    }
}

fn standard_cursor(shape: StandardCursor) -> LPCWSTR {
    match shape {
        StandardCursor::Arrow => IDC_ARROW,
        StandardCursor::IBeam => IDC_IBEAM,
        StandardCursor::Crosshair => IDC_CROSS,
        StandardCursor::PointingHand => IDC_HAND,
        StandardCursor::ResizeEW => IDC_SIZEWE,
        StandardCursor::ResizeNS => IDC_SIZENS,
        StandardCursor::ResizeNWSE => IDC_SIZENWSE,
        StandardCursor::ResizeNESW => IDC_SIZENESW,
        StandardCursor::ResizeAll => IDC_SIZEALL,
        StandardCursor::NotAllowed => IDC_NO,
    }
}

fn key_pressed(vkey: c_int) -> bool {
    unsafe { GetKeyState(vkey) as u16 & 0x8000 != 0 }
}

fn key_toggled(vkey: c_int) -> bool {
    unsafe { GetKeyState(vkey) & 1 != 0 }
}

const MAPVK_VK_TO_VSC_EX: UINT = 4;

impl Platform for Win32Platform {
    fn name(&self) -> &'static str { "Win32" }

    fn create_window(&mut self, id: WindowId, desc: &NativeWindowDesc) -> Result<()> {
        let fullscreen = desc.monitor.is_some();
        let mut style = window_style(desc.settings, fullscreen);
        let ex_style = window_ex_style(desc.settings, fullscreen);

        let (x, y, w, h) = match desc.monitor {
            // The monitor is fit later, once the video mode is set.
            Some(m) => (m.position.x, m.position.y, desc.size.w as i32, desc.size.h as i32),
            None => {
                if desc.settings.maximized {
                    style |= WS_MAXIMIZE;
                }
                let mut rect = RECT { left: 0, top: 0, right: desc.size.w as _, bottom: desc.size.h as _ };
                unsafe { AdjustWindowRectEx(&mut rect, style, FALSE, ex_style); }
                (CW_USEDEFAULT, CW_USEDEFAULT, rect.right - rect.left, rect.bottom - rect.top)
            },
        };

        let title = to_wide_with_nul(desc.title);
        let hwnd = unsafe {
            CreateWindowExW(
                ex_style,
                MAKEINTATOM(self.class_atom),
                title.as_ptr(),
                style,
                x, y, w, h,
                ptr::null_mut(), // No parent
                ptr::null_mut(), // No menu
                self.hinstance,
                id.0 as usize as LPVOID,
            )
        };
        if hwnd.is_null() {
            return winapi_fail("CreateWindowExW");
        }
        let hdc = unsafe { GetDC(hwnd) };
        if hdc.is_null() {
            let e = last_error("GetDC");
            unsafe { DestroyWindow(hwnd); }
            wndproc::forget_window(hwnd, id);
            return Err(e);
        }
        debug!("Win32: window {:?} is HWND {:?}", id, hwnd);
        self.windows.insert(id, Win32Window { hwnd, hdc, settings: *desc.settings, fullscreen });
        Ok(())
    }
    fn destroy_window(&mut self, id: WindowId) {
        let window = match self.windows.remove(&id) {
            Some(w) => w,
            None => return,
        };
        if self.raw_input_window == Some(window.hwnd) {
            self.set_raw_mouse_motion(id, false);
        }
        unsafe {
            if DestroyWindow(window.hwnd) == FALSE {
                warn!("{}", last_error("DestroyWindow"));
            }
        }
        wndproc::forget_window(window.hwnd, id);
    }
    fn show_window(&mut self, id: WindowId) {
        unsafe { ShowWindow(self.hwnd(id), SW_SHOWNA); }
    }
    fn focus_window(&mut self, id: WindowId) {
        let hwnd = self.hwnd(id);
        unsafe {
            BringWindowToTop(hwnd);
            SetForegroundWindow(hwnd);
            SetFocus(hwnd);
        }
    }
    fn iconify_window(&mut self, id: WindowId) {
        unsafe { ShowWindow(self.hwnd(id), SW_MINIMIZE); }
    }
    fn is_focused(&self, id: WindowId) -> bool {
        let hwnd = self.hwnd(id);
        !hwnd.is_null() && unsafe { GetActiveWindow() } == hwnd
    }
    fn window_pos(&self, id: WindowId) -> Vec2<i32> {
        let mut p = POINT { x: 0, y: 0 };
        unsafe { ClientToScreen(self.hwnd(id), &mut p); }
        Vec2::new(p.x, p.y)
    }
    fn window_size(&self, id: WindowId) -> Extent2<u32> {
        let mut rect: RECT = unsafe { mem::zeroed() };
        unsafe { GetClientRect(self.hwnd(id), &mut rect); }
        Extent2::new((rect.right - rect.left).max(0) as u32, (rect.bottom - rect.top).max(0) as u32)
    }
    fn framebuffer_size(&self, id: WindowId) -> Extent2<u32> {
        self.window_size(id)
    }
    fn fit_to_monitor(&mut self, id: WindowId, monitor: &MonitorInfo, mode: &VideoMode) -> Result<()> {
        let window = match self.windows.get_mut(&id) {
            Some(w) => w,
            None => return Err(Error::invalid_handle(format!("No native window for {:?}", id))),
        };
        window.fullscreen = true;
        let (hwnd, style) = (window.hwnd, window_style(&window.settings, true));
        let rect = monitor::monitor_rect(monitor, mode);
        unsafe {
            SetWindowLongW(hwnd, GWL_STYLE, style as LONG);
            if SetWindowPos(hwnd, HWND_TOPMOST, rect.left, rect.top, rect.right - rect.left, rect.bottom - rect.top,
                SWP_SHOWWINDOW | SWP_NOACTIVATE | SWP_NOCOPYBITS | SWP_FRAMECHANGED) == FALSE
            {
                return winapi_fail("SetWindowPos");
            }
        }
        Ok(())
    }
    fn set_windowed(&mut self, id: WindowId, pos: Vec2<i32>, size: Extent2<u32>) -> Result<()> {
        let window = match self.windows.get_mut(&id) {
            Some(w) => w,
            None => return Err(Error::invalid_handle(format!("No native window for {:?}", id))),
        };
        window.fullscreen = false;
        let hwnd = window.hwnd;
        let style = window_style(&window.settings, false);
        let ex_style = window_ex_style(&window.settings, false);
        let after = if window.settings.floating { HWND_TOPMOST } else { HWND_NOTOPMOST };
        let mut rect = RECT { left: pos.x, top: pos.y, right: pos.x + size.w as i32, bottom: pos.y + size.h as i32 };
        unsafe {
            SetWindowLongW(hwnd, GWL_STYLE, style as LONG);
            AdjustWindowRectEx(&mut rect, style, FALSE, ex_style);
            if SetWindowPos(hwnd, after, rect.left, rect.top, rect.right - rect.left, rect.bottom - rect.top,
                SWP_NOACTIVATE | SWP_NOCOPYBITS | SWP_FRAMECHANGED) == FALSE
            {
                return winapi_fail("SetWindowPos");
            }
        }
        Ok(())
    }

    fn cursor_pos(&self, id: WindowId) -> Vec2<f64> {
        let mut p = POINT { x: 0, y: 0 };
        unsafe {
            if GetCursorPos(&mut p) == FALSE {
                return Vec2::zero();
            }
            ScreenToClient(self.hwnd(id), &mut p);
        }
        Vec2::new(f64::from(p.x), f64::from(p.y))
    }
    fn set_cursor_pos(&mut self, id: WindowId, pos: Vec2<f64>) {
        let mut p = POINT { x: pos.x as i32, y: pos.y as i32 };
        unsafe {
            ClientToScreen(self.hwnd(id), &mut p);
            SetCursorPos(p.x, p.y);
        }
    }
    fn cursor_in_content_area(&self, id: WindowId) -> bool {
        let hwnd = self.hwnd(id);
        let mut p = POINT { x: 0, y: 0 };
        unsafe {
            if GetCursorPos(&mut p) == FALSE || WindowFromPoint(p) != hwnd {
                return false;
            }
            let rect = self.client_rect_on_screen(id);
            PtInRect(&rect, p) != FALSE
        }
    }
    fn clip_cursor(&mut self, id: Option<WindowId>) {
        unsafe {
            match id {
                Some(id) => {
                    let rect = self.client_rect_on_screen(id);
                    ClipCursor(&rect);
                },
                None => {
                    ClipCursor(ptr::null());
                },
            }
        }
    }
    fn set_cursor_image(&mut self, id: WindowId, image: CursorImage) {
        let hwnd = self.hwnd(id);
        let handle = self.cursor_handle(image);
        wndproc::with_window(hwnd, |w| w.cursor = handle);
        if self.cursor_in_content_area(id) {
            unsafe { SetCursor(handle); }
        }
    }
    fn raw_mouse_motion_supported(&self) -> bool {
        true
    }
    fn set_raw_mouse_motion(&mut self, id: WindowId, enabled: bool) {
        let hwnd = self.hwnd(id);
        let rid = RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_GENERIC_MOUSE,
            dwFlags: if enabled { 0 } else { RIDEV_REMOVE },
            hwndTarget: if enabled { hwnd } else { ptr::null_mut() },
        };
        let is_ok = unsafe { RegisterRawInputDevices(&rid, 1, mem::size_of::<RAWINPUTDEVICE>() as _) };
        if is_ok == FALSE {
            error!("{}", last_error(if enabled { "Registering raw input" } else { "Removing raw input" }));
            return;
        }
        wndproc::with_window(hwnd, |w| w.raw_motion = enabled);
        self.raw_input_window = if enabled { Some(hwnd) } else { None };
    }
    fn create_cursor(&mut self, id: CursorId, source: &CursorSource) -> Result<()> {
        let cursor = match *source {
            CursorSource::Image { ref image, hotspot } => Win32Cursor {
                handle: create_image_cursor(image, hotspot)?,
                shared: false,
            },
            CursorSource::Standard(shape) => {
                let handle = unsafe { LoadCursorW(ptr::null_mut(), standard_cursor(shape)) };
                if handle.is_null() {
                    return Err(Error::new(ErrorKind::CursorUnavailable, format!("Win32: failed to load standard cursor {:?}", shape)));
                }
                Win32Cursor { handle, shared: true }
            },
        };
        self.cursors.insert(id, cursor);
        Ok(())
    }
    fn destroy_cursor(&mut self, id: CursorId) {
        if let Some(cursor) = self.cursors.remove(&id) {
            if !cursor.shared {
                unsafe { DestroyIcon(cursor.handle); }
            }
        }
    }

    fn key_modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::empty();
        mods.set(Modifiers::SHIFT, key_pressed(VK_SHIFT));
        mods.set(Modifiers::CONTROL, key_pressed(VK_CONTROL));
        mods.set(Modifiers::ALT, key_pressed(VK_MENU));
        mods.set(Modifiers::SUPER, key_pressed(VK_LWIN) || key_pressed(VK_RWIN));
        mods.set(Modifiers::CAPS_LOCK, key_toggled(VK_CAPITAL));
        mods.set(Modifiers::NUM_LOCK, key_toggled(VK_NUMLOCK));
        mods
    }
    fn is_key_down(&self, key: Key) -> bool {
        let vkey = match key {
            Key::KpEnter => VK_RETURN,
            key => match keymap::vkey_from_key(key) {
                Some(v) => v,
                None => return false,
            },
        };
        key_pressed(vkey)
    }
    fn key_scancode(&self, key: Key) -> Option<i32> {
        if key == Key::KpEnter {
            return Some(0x11C);
        }
        let vkey = keymap::vkey_from_key(key)?;
        let sc = unsafe { MapVirtualKeyW(vkey as UINT, MAPVK_VK_TO_VSC_EX) };
        match sc {
            0 => None,
            sc if sc & 0xFF00 != 0 => Some(((sc & 0xFF) | 0x100) as i32),
            sc => Some(sc as i32),
        }
    }

    fn monitors(&mut self) -> Result<Vec<MonitorInfo>> {
        Ok(monitor::enumerate())
    }
    fn video_modes(&mut self, monitor: &str) -> Result<Vec<VideoMode>> {
        monitor::video_modes(monitor)
    }
    fn current_video_mode(&mut self, monitor: &str) -> Result<VideoMode> {
        monitor::current_video_mode(monitor)
    }
    fn set_video_mode(&mut self, monitor: &str, mode: &VideoMode) -> Result<()> {
        monitor::set_video_mode(monitor, mode)
    }
    fn restore_video_mode(&mut self, monitor: &str) {
        monitor::restore_video_mode(monitor)
    }

    fn framebuffer_configs(&mut self, id: WindowId, ctx: &ContextConfig) -> Result<Vec<FramebufferConfig>> {
        let hdc = self.windows.get(&id).map(|w| w.hdc).ok_or_else(|| Error::invalid_handle(format!("No native window for {:?}", id)))?;
        self.wgl()?.framebuffer_configs(hdc, ctx)
    }
    fn create_context(&mut self, id: WindowId, fb: &FramebufferConfig, ctx: &ContextConfig, share: Option<&dyn NativeContext>) -> Result<Box<dyn NativeContext>> {
        let hdc = self.windows.get(&id).map(|w| w.hdc).ok_or_else(|| Error::invalid_handle(format!("No native window for {:?}", id)))?;
        let share = match share {
            None => None,
            Some(share) => match share.as_any().downcast_ref::<WglContext>() {
                Some(s) if !s.destroyed.load(AtomicOrdering::SeqCst) => Some(s.hglrc),
                _ => return Err(Error::invalid_value("Cannot share objects with this context")),
            },
        };
        let wgl = self.wgl()?;
        let hglrc = wgl.create_context(hdc, fb, ctx, share)?;
        debug!("WGL: context {:?} for window {:?} uses pixel format {}", hglrc, id, fb.handle);
        Ok(Box::new(WglContext {
            hdc, hglrc,
            opengl32: wgl.opengl32,
            swap_interval: if wgl.WGL_EXT_swap_control { wgl.fns.wglSwapIntervalEXT } else { None },
            extensions: wgl.extensions.clone(),
            destroyed: AtomicBool::new(false),
        }))
    }

    fn next_message(&mut self) -> Option<Message> {
        if let Some(msg) = wndproc::pop_message() {
            return Some(msg);
        }
        loop {
            let mut msg: MSG = unsafe { mem::zeroed() };
            if unsafe { PeekMessageW(&mut msg, ptr::null_mut(), 0, 0, PM_REMOVE) } == FALSE {
                return None;
            }
            if msg.message == WM_QUIT {
                return Some(Message::Quit);
            }
            if msg.hwnd == self.helper && msg.message == WM_NULL {
                return Some(Message::Empty);
            }
            unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            if let Some(msg) = wndproc::pop_message() {
                return Some(msg);
            }
        }
    }
    fn wait_messages(&mut self, timeout: Timeout) {
        if wndproc::has_messages() {
            return;
        }
        unsafe {
            match timeout {
                Timeout::Infinite => {
                    WaitMessage();
                },
                Timeout::Set(d) => {
                    let ms = d.as_millis().min(u128::from(INFINITE - 1)) as DWORD;
                    MsgWaitForMultipleObjects(0, ptr::null(), FALSE, ms, QS_ALLEVENTS);
                },
            }
        }
    }
    fn post_empty_event(&self) {
        unsafe {
            PostMessageW(self.helper, WM_NULL, 0, 0);
        }
    }
}
