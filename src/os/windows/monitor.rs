use std::mem;
use std::ptr;
use super::winapi_utils::*;
use crate::error::{self, Result};
use crate::monitor::{MonitorInfo, VideoMode};
use crate::{Extent2, Vec2};

fn display_device() -> DISPLAY_DEVICEW {
    let mut dd: DISPLAY_DEVICEW = unsafe { mem::zeroed() };
    dd.cb = mem::size_of::<DISPLAY_DEVICEW>() as _;
    dd
}

fn devmode() -> DEVMODEW {
    let mut dm: DEVMODEW = unsafe { mem::zeroed() };
    dm.dmSize = mem::size_of::<DEVMODEW>() as _;
    dm
}

/// Active display adapters and the first monitor on each, primary first.
/// `native_id` is the adapter's device name, which mode changes need.
pub fn enumerate() -> Vec<MonitorInfo> {
    let mut monitors = Vec::new();
    for adapter_index in 0.. {
        let mut adapter = display_device();
        if unsafe { EnumDisplayDevicesW(ptr::null(), adapter_index, &mut adapter, 0) } == FALSE {
            break;
        }
        if adapter.StateFlags & DISPLAY_DEVICE_ACTIVE == 0 {
            continue;
        }
        let mut display = display_device();
        let name = if unsafe { EnumDisplayDevicesW(adapter.DeviceName.as_ptr(), 0, &mut display, 0) } != FALSE {
            from_wide(&display.DeviceString)
        } else {
            from_wide(&adapter.DeviceString)
        };
        let info = MonitorInfo {
            native_id: from_wide(&adapter.DeviceName),
            name,
            position: position(&adapter.DeviceName),
            physical_size_mm: physical_size(&adapter.DeviceName),
        };
        if adapter.StateFlags & DISPLAY_DEVICE_PRIMARY_DEVICE != 0 {
            monitors.insert(0, info);
        } else {
            monitors.push(info);
        }
    }
    monitors
}

fn position(adapter: &[WCHAR]) -> Vec2<i32> {
    let mut dm = devmode();
    if unsafe { EnumDisplaySettingsExW(adapter.as_ptr(), ENUM_CURRENT_SETTINGS, &mut dm, EDS_ROTATEDMODE) } == FALSE {
        return Vec2::zero();
    }
    let p = unsafe { dm.u1.s2().dmPosition };
    Vec2::new(p.x, p.y)
}

fn physical_size(adapter: &[WCHAR]) -> Extent2<i32> {
    let driver = to_wide_with_nul("DISPLAY");
    unsafe {
        let dc = CreateDCW(driver.as_ptr(), adapter.as_ptr(), ptr::null(), ptr::null());
        if dc.is_null() {
            return Extent2::new(0, 0);
        }
        let size = Extent2::new(GetDeviceCaps(dc, HORZSIZE), GetDeviceCaps(dc, VERTSIZE));
        DeleteDC(dc);
        size
    }
}

/// Splits a pixel depth into channel depths, giving leftovers to green
/// first. 32-bit modes have 24 bits of color.
fn split_bpp(bpp: u32) -> (i32, i32, i32) {
    let bpp = if bpp == 32 { 24 } else { bpp as i32 };
    let mut red = bpp / 3;
    let blue = red;
    let mut green = red;
    let delta = bpp - red * 3;
    if delta >= 1 {
        green += 1;
    }
    if delta == 2 {
        red += 1;
    }
    (red, green, blue)
}

fn mode_from_devmode(dm: &DEVMODEW) -> VideoMode {
    let (red_bits, green_bits, blue_bits) = split_bpp(dm.dmBitsPerPel);
    VideoMode {
        width: dm.dmPelsWidth as _,
        height: dm.dmPelsHeight as _,
        red_bits, green_bits, blue_bits,
        refresh_rate: dm.dmDisplayFrequency as _,
    }
}

pub fn video_modes(adapter: &str) -> Result<Vec<VideoMode>> {
    let name = to_wide_with_nul(adapter);
    let mut modes = Vec::new();
    for index in 0.. {
        let mut dm = devmode();
        if unsafe { EnumDisplaySettingsW(name.as_ptr(), index, &mut dm) } == FALSE {
            break;
        }
        // Palettized modes.
        if dm.dmBitsPerPel < 15 {
            continue;
        }
        // Modes the driver lists but refuses to set.
        let test = unsafe { ChangeDisplaySettingsExW(name.as_ptr(), &mut dm, ptr::null_mut(), CDS_TEST, ptr::null_mut()) };
        if test != DISP_CHANGE_SUCCESSFUL {
            continue;
        }
        modes.push(mode_from_devmode(&dm));
    }
    if modes.is_empty() {
        modes.push(current_video_mode(adapter)?);
    }
    Ok(modes)
}

pub fn current_video_mode(adapter: &str) -> Result<VideoMode> {
    let name = to_wide_with_nul(adapter);
    let mut dm = devmode();
    if unsafe { EnumDisplaySettingsW(name.as_ptr(), ENUM_CURRENT_SETTINGS, &mut dm) } == FALSE {
        return error::platform_failed(format!("Failed to query the video mode of `{}`", adapter));
    }
    Ok(mode_from_devmode(&dm))
}

pub fn set_video_mode(adapter: &str, mode: &VideoMode) -> Result<()> {
    let name = to_wide_with_nul(adapter);
    let mut dm = devmode();
    dm.dmFields = DM_PELSWIDTH | DM_PELSHEIGHT | DM_BITSPERPEL | DM_DISPLAYFREQUENCY;
    dm.dmPelsWidth = mode.width as _;
    dm.dmPelsHeight = mode.height as _;
    dm.dmBitsPerPel = match mode.red_bits + mode.green_bits + mode.blue_bits {
        bpp if bpp < 15 || bpp >= 24 => 32,
        bpp => bpp as _,
    };
    dm.dmDisplayFrequency = mode.refresh_rate as _;

    let result = unsafe { ChangeDisplaySettingsExW(name.as_ptr(), &mut dm, ptr::null_mut(), CDS_FULLSCREEN, ptr::null_mut()) };
    let reason = match result {
        DISP_CHANGE_SUCCESSFUL => return Ok(()),
        DISP_CHANGE_BADDUALVIEW => "the system uses DualView",
        DISP_CHANGE_BADFLAGS => "invalid flags",
        DISP_CHANGE_BADMODE => "graphics mode not supported",
        DISP_CHANGE_BADPARAM => "invalid parameter",
        DISP_CHANGE_FAILED => "graphics mode failed",
        DISP_CHANGE_NOTUPDATED => "failed to write to registry",
        DISP_CHANGE_RESTART => "computer restart required",
        _ => "unknown error",
    };
    error::platform_failed(format!("Failed to set video mode of `{}`: {}", adapter, reason))
}

pub fn restore_video_mode(adapter: &str) {
    let name = to_wide_with_nul(adapter);
    unsafe {
        ChangeDisplaySettingsExW(name.as_ptr(), ptr::null_mut(), ptr::null_mut(), CDS_FULLSCREEN, ptr::null_mut());
    }
}

/// Virtual desktop rectangle of a monitor.
pub fn monitor_rect(info: &MonitorInfo, mode: &VideoMode) -> RECT {
    RECT {
        left: info.position.x,
        top: info.position.y,
        right: info.position.x + mode.width,
        bottom: info.position.y + mode.height,
    }
}
