use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::mem;
use std::ptr;
use super::keymap;
use super::winapi_utils as w32;
use self::w32::{
    HWND, UINT, WPARAM, LPARAM, LRESULT, DWORD, HCURSOR, POINT, MSG,
    DefWindowProcW, LOWORD, HIWORD, GET_X_LPARAM, GET_Y_LPARAM, GET_XBUTTON_WPARAM, GET_WHEEL_DELTA_WPARAM,
};
use crate::event::{Message, RawMotion, ResizeKind};
use crate::input::{Action, Key, MouseButton};
use crate::window::WindowId;
use crate::{Extent2, Vec2};

/// What the window procedure needs to know about a window.
#[derive(Debug)]
pub struct WindowState {
    pub id: WindowId,
    /// What WM_SETCURSOR shows over the content area. Null hides the cursor.
    pub cursor: HCURSOR,
    pub raw_motion: bool,
    cursor_tracked: bool,
    high_surrogate: Option<u16>,
    iconified: bool,
    maximized: bool,
}

thread_local! {
    static QUEUE: RefCell<VecDeque<Message>> = RefCell::new(VecDeque::new());
    static WINDOWS: RefCell<HashMap<usize, WindowState>> = RefCell::new(HashMap::new());
    static HELPER: Cell<usize> = Cell::new(0);
}

pub fn pop_message() -> Option<Message> {
    QUEUE.with(|q| q.borrow_mut().pop_front())
}

pub fn has_messages() -> bool {
    QUEUE.with(|q| !q.borrow().is_empty())
}

fn push(msg: Message) {
    QUEUE.with(|q| q.borrow_mut().push_back(msg));
}

pub fn set_helper(hwnd: HWND) {
    HELPER.with(|h| h.set(hwnd as usize));
}

/// Runs `f` on the state of a window created by this thread. The borrow
/// must not outlive a call that may send messages.
pub fn with_window<T, F: FnOnce(&mut WindowState) -> T>(hwnd: HWND, f: F) -> Option<T> {
    WINDOWS.with(|w| w.borrow_mut().get_mut(&(hwnd as usize)).map(f))
}

/// Drops the window's state and whatever it left in the queue.
pub fn forget_window(hwnd: HWND, id: WindowId) {
    WINDOWS.with(|w| w.borrow_mut().remove(&(hwnd as usize)));
    QUEUE.with(|q| q.borrow_mut().retain(|m| m.window() != Some(id)));
}

fn window_id(hwnd: HWND) -> Option<WindowId> {
    with_window(hwnd, |w| w.id)
}

fn pressed(msg: UINT) -> Action {
    match msg {
        w32::WM_LBUTTONUP | w32::WM_MBUTTONUP | w32::WM_RBUTTONUP | w32::WM_XBUTTONUP => Action::Release,
        _ => Action::Press,
    }
}

fn key_message(window: WindowId, wparam: WPARAM, lparam: LPARAM) {
    let flags = HIWORD(lparam as DWORD);
    let action = if flags & w32::KF_UP != 0 {
        Action::Release
    } else if flags & w32::KF_REPEAT != 0 {
        Action::Repeat
    } else {
        Action::Press
    };
    let vkey = wparam as i32;
    let scancode = keymap::scancode(lparam);

    // AltGr sends a fake left Control press right before the right Alt one.
    if vkey == w32::VK_CONTROL && flags & w32::KF_EXTENDED == 0 {
        let time = unsafe { w32::GetMessageTime() };
        let mut next: MSG = unsafe { mem::zeroed() };
        let peeked = unsafe { w32::PeekMessageW(&mut next, ptr::null_mut(), 0, 0, w32::PM_NOREMOVE) };
        if peeked != w32::FALSE {
            let is_key = match next.message {
                w32::WM_KEYDOWN | w32::WM_SYSKEYDOWN | w32::WM_KEYUP | w32::WM_SYSKEYUP => true,
                _ => false,
            };
            if is_key && next.wParam as i32 == w32::VK_MENU && HIWORD(next.lParam as DWORD) & w32::KF_EXTENDED != 0 && next.time as i32 == time {
                return;
            }
        }
    }

    match vkey {
        // Windows only reports the release of the last Shift key.
        w32::VK_SHIFT if action == Action::Release => {
            push(Message::Key { window, key: Key::LeftShift, scancode, action });
            push(Message::Key { window, key: Key::RightShift, scancode, action });
        },
        // Print Screen only ever sends a release.
        w32::VK_SNAPSHOT => {
            push(Message::Key { window, key: Key::PrintScreen, scancode, action: Action::Press });
            push(Message::Key { window, key: Key::PrintScreen, scancode, action: Action::Release });
        },
        _ => {
            let key = keymap::key_from_message(wparam, lparam);
            push(Message::Key { window, key, scancode, action });
        },
    }
}

fn char_message(hwnd: HWND, window: WindowId, unit: u16, plain: bool) {
    let high = with_window(hwnd, |w| w.high_surrogate.take()).and_then(|h| h);
    let codepoint = match unit {
        0xD800..=0xDBFF => {
            with_window(hwnd, |w| w.high_surrogate = Some(unit));
            return;
        },
        0xDC00..=0xDFFF => match high {
            Some(high) => (((u32::from(high) - 0xD800) << 10) | (u32::from(unit) - 0xDC00)) + 0x10000,
            None => return,
        },
        _ => u32::from(unit),
    };
    if let Some(codepoint) = ::std::char::from_u32(codepoint) {
        push(Message::Char { window, codepoint, plain });
    }
}

fn raw_input(hwnd: HWND, window: WindowId, lparam: LPARAM) {
    let handle = lparam as w32::HRAWINPUT;
    let header_size = mem::size_of::<w32::RAWINPUTHEADER>() as UINT;
    let mut size: UINT = 0;
    unsafe {
        w32::GetRawInputData(handle, w32::RID_INPUT, ptr::null_mut(), &mut size, header_size);
    }
    if size == 0 {
        return;
    }
    let mut data: Vec<u8> = vec![0; size as usize];
    let read = unsafe {
        w32::GetRawInputData(handle, w32::RID_INPUT, data.as_mut_ptr() as _, &mut size, header_size)
    };
    if read == !0 || (read as usize) < mem::size_of::<w32::RAWINPUTHEADER>() {
        warn!("Failed to retrieve raw input data");
        return;
    }
    let raw = unsafe { &*(data.as_ptr() as *const w32::RAWINPUT) };
    if raw.header.dwType != w32::RIM_TYPEMOUSE {
        return;
    }
    let mouse = unsafe { raw.data.mouse() };
    let motion = if mouse.usFlags & w32::MOUSE_MOVE_ABSOLUTE != 0 {
        // Normalized to [0, 65535] over the primary monitor or the virtual desktop.
        let (x, y, w, h) = unsafe {
            if mouse.usFlags & w32::MOUSE_VIRTUAL_DESKTOP != 0 {
                (
                    w32::GetSystemMetrics(w32::SM_XVIRTUALSCREEN), w32::GetSystemMetrics(w32::SM_YVIRTUALSCREEN),
                    w32::GetSystemMetrics(w32::SM_CXVIRTUALSCREEN), w32::GetSystemMetrics(w32::SM_CYVIRTUALSCREEN),
                )
            } else {
                (0, 0, w32::GetSystemMetrics(w32::SM_CXSCREEN), w32::GetSystemMetrics(w32::SM_CYSCREEN))
            }
        };
        let mut p = POINT {
            x: x + (f64::from(mouse.lLastX) / 65535. * f64::from(w)) as i32,
            y: y + (f64::from(mouse.lLastY) / 65535. * f64::from(h)) as i32,
        };
        unsafe {
            w32::ScreenToClient(hwnd, &mut p);
        }
        RawMotion::Absolute(Vec2::new(f64::from(p.x), f64::from(p.y)))
    } else {
        if mouse.lLastX == 0 && mouse.lLastY == 0 {
            return;
        }
        RawMotion::Relative(Vec2::new(f64::from(mouse.lLastX), f64::from(mouse.lLastY)))
    };
    push(Message::RawMotion { window, motion });
}

pub unsafe extern "system" fn wndproc(hwnd: HWND, msg: UINT, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let default_window_proc = || DefWindowProcW(hwnd, msg, wparam, lparam);

    match msg {
        // The window id is the creation parameter.
        w32::WM_NCCREATE => {
            let cs = &*(lparam as *const w32::CREATESTRUCTW);
            let id = WindowId(cs.lpCreateParams as usize as u64);
            WINDOWS.with(|w| w.borrow_mut().insert(hwnd as usize, WindowState {
                id,
                cursor: w32::LoadCursorW(ptr::null_mut(), w32::IDC_ARROW),
                raw_motion: false,
                cursor_tracked: false,
                high_surrogate: None,
                iconified: false,
                maximized: false,
            }));
            return default_window_proc();
        },
        w32::WM_DISPLAYCHANGE => {
            if HELPER.with(|h| h.get()) == hwnd as usize {
                push(Message::MonitorsChanged);
            }
            return default_window_proc();
        },
        _ => (),
    }

    let window = match window_id(hwnd) {
        Some(id) => id,
        None => return default_window_proc(),
    };

    match msg {
        w32::WM_CLOSE => {
            push(Message::CloseRequested(window));
            0
        },
        w32::WM_SETFOCUS => {
            push(Message::Focus { window, focused: true });
            0
        },
        w32::WM_KILLFOCUS => {
            push(Message::Focus { window, focused: false });
            0
        },
        w32::WM_KEYDOWN | w32::WM_SYSKEYDOWN | w32::WM_KEYUP | w32::WM_SYSKEYUP => {
            // Keys consumed by an IME.
            if wparam as i32 != w32::VK_PROCESSKEY {
                key_message(window, wparam, lparam);
            }
            default_window_proc()
        },
        w32::WM_CHAR | w32::WM_SYSCHAR => {
            char_message(hwnd, window, wparam as u16, msg == w32::WM_CHAR);
            0
        },
        w32::WM_UNICHAR => {
            // Tells the sender we understand WM_UNICHAR.
            if wparam == w32::UNICODE_NOCHAR {
                return w32::TRUE as LRESULT;
            }
            if let Some(codepoint) = ::std::char::from_u32(wparam as u32) {
                push(Message::Char { window, codepoint, plain: true });
            }
            0
        },
        w32::WM_LBUTTONDOWN
        | w32::WM_LBUTTONUP
        | w32::WM_MBUTTONDOWN
        | w32::WM_MBUTTONUP
        | w32::WM_RBUTTONDOWN
        | w32::WM_RBUTTONUP
        | w32::WM_XBUTTONDOWN
        | w32::WM_XBUTTONUP => {
            let button = match msg {
                w32::WM_LBUTTONDOWN | w32::WM_LBUTTONUP => MouseButton::Left,
                w32::WM_MBUTTONDOWN | w32::WM_MBUTTONUP => MouseButton::Middle,
                w32::WM_RBUTTONDOWN | w32::WM_RBUTTONUP => MouseButton::Right,
                _ => match GET_XBUTTON_WPARAM(wparam) {
                    w32::XBUTTON1 => MouseButton::Button4,
                    _ => MouseButton::Button5,
                },
            };
            let action = pressed(msg);
            // Keep receiving releases outside of the window.
            let held = (wparam as DWORD) & (w32::MK_LBUTTON | w32::MK_MBUTTON | w32::MK_RBUTTON | w32::MK_XBUTTON1 | w32::MK_XBUTTON2) as DWORD;
            if action == Action::Press {
                w32::SetCapture(hwnd);
            } else if held == 0 {
                w32::ReleaseCapture();
            }
            push(Message::MouseButton { window, button, action });
            match msg {
                w32::WM_XBUTTONDOWN | w32::WM_XBUTTONUP => w32::TRUE as LRESULT,
                _ => 0,
            }
        },
        w32::WM_MOUSEMOVE => {
            let was_tracked = with_window(hwnd, |w| mem::replace(&mut w.cursor_tracked, true)).unwrap_or(true);
            if !was_tracked {
                let mut tme = w32::TRACKMOUSEEVENT {
                    cbSize: mem::size_of::<w32::TRACKMOUSEEVENT>() as _,
                    dwFlags: w32::TME_LEAVE,
                    hwndTrack: hwnd,
                    dwHoverTime: 0,
                };
                w32::TrackMouseEvent(&mut tme);
            }
            let position = Vec2::new(f64::from(GET_X_LPARAM(lparam)), f64::from(GET_Y_LPARAM(lparam)));
            push(Message::CursorMoved { window, position });
            0
        },
        w32::WM_INPUT => {
            if with_window(hwnd, |w| w.raw_motion).unwrap_or(false) {
                raw_input(hwnd, window, lparam);
            }
            default_window_proc()
        },
        w32::WM_MOUSELEAVE => {
            with_window(hwnd, |w| w.cursor_tracked = false);
            push(Message::CursorLeft { window });
            0
        },
        w32::WM_MOUSEWHEEL => {
            let delta = f64::from(GET_WHEEL_DELTA_WPARAM(wparam)) / f64::from(w32::WHEEL_DELTA);
            push(Message::Scroll { window, offset: Vec2::new(0., delta) });
            0
        },
        w32::WM_MOUSEHWHEEL => {
            // Positive is right, unlike every other platform.
            let delta = f64::from(GET_WHEEL_DELTA_WPARAM(wparam)) / f64::from(w32::WHEEL_DELTA);
            push(Message::Scroll { window, offset: Vec2::new(-delta, 0.) });
            0
        },
        w32::WM_SIZE => {
            let size = Extent2::new(u32::from(LOWORD(lparam as DWORD)), u32::from(HIWORD(lparam as DWORD)));
            let kind = with_window(hwnd, |w| {
                let kind = match wparam {
                    w32::SIZE_MINIMIZED => ResizeKind::Iconified,
                    w32::SIZE_MAXIMIZED => ResizeKind::Maximized,
                    w32::SIZE_RESTORED if w.iconified || w.maximized => ResizeKind::Restored,
                    _ => ResizeKind::Other,
                };
                w.iconified = kind == ResizeKind::Iconified;
                w.maximized = kind == ResizeKind::Maximized;
                kind
            }).unwrap_or(ResizeKind::Other);
            push(Message::Resized { window, size, kind });
            0
        },
        w32::WM_MOVE => {
            let position = Vec2::new(GET_X_LPARAM(lparam), GET_Y_LPARAM(lparam));
            push(Message::Moved { window, position });
            0
        },
        w32::WM_PAINT => {
            push(Message::Damaged(window));
            default_window_proc()
        },
        w32::WM_ERASEBKGND => w32::TRUE as LRESULT,
        w32::WM_SETCURSOR => {
            if LOWORD(lparam as DWORD) as isize != w32::HTCLIENT {
                return default_window_proc();
            }
            if let Some(cursor) = with_window(hwnd, |w| w.cursor) {
                w32::SetCursor(cursor);
            }
            push(Message::SetCursor(window));
            w32::TRUE as LRESULT
        },
        _ => default_window_proc(),
    }
}
