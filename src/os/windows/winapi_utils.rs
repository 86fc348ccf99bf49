pub use winapi::shared::basetsd::{LONG_PTR, UINT_PTR};
pub use winapi::shared::hidusage::{HID_USAGE_GENERIC_MOUSE, HID_USAGE_PAGE_GENERIC};
pub use winapi::shared::minwindef::*;
pub use winapi::shared::windef::*;
pub use winapi::shared::windowsx::{GET_X_LPARAM, GET_Y_LPARAM};
pub use winapi::shared::winerror::ERROR_SUCCESS;
pub use winapi::um::errhandlingapi::{GetLastError, SetLastError};
pub use winapi::um::libloaderapi::{FreeLibrary, GetModuleHandleW, GetProcAddress, LoadLibraryA};
pub use winapi::um::winbase::{INFINITE, MAKEINTATOM};
pub use winapi::um::wingdi::*;
pub use winapi::um::winnt::{LONG, LPCSTR, LPCWSTR, SHORT, WCHAR};
pub use winapi::um::winuser::*;

use std::iter;
use crate::error::{Error, Result};

pub fn to_wide_with_nul(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(iter::once(0)).collect()
}

pub fn from_wide(s: &[WCHAR]) -> String {
    let end = s.iter().position(|c| *c == 0).unwrap_or_else(|| s.len());
    String::from_utf16_lossy(&s[..end])
}

pub fn last_error(what: &str) -> Error {
    let code = unsafe { GetLastError() };
    Error::platform(format!("{} failed (error 0x{:08X})", what, code))
}

pub fn winapi_fail<T>(what: &str) -> Result<T> {
    Err(last_error(what))
}
