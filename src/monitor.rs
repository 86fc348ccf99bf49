//! Monitors, their video modes, and picking the mode closest to a request.

use std::cmp::Ordering;
use crate::error::Result;
use crate::os::Platform;
use crate::window::{Window, WindowId};
use crate::{Extent2, Vec2, DONT_CARE};

/// Identifies a monitor for as long as it stays connected.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonitorId(pub(crate) u64);

/// Whether a monitor was plugged in or out.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum MonitorEvent {
    #[allow(missing_docs)]
    Connected,
    #[allow(missing_docs)]
    Disconnected,
}

/// A display mode. Any field of a requested mode may be `DONT_CARE`.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct VideoMode {
    #[allow(missing_docs)]
    pub width: i32,
    #[allow(missing_docs)]
    pub height: i32,
    #[allow(missing_docs)]
    pub red_bits: i32,
    #[allow(missing_docs)]
    pub green_bits: i32,
    #[allow(missing_docs)]
    pub blue_bits: i32,
    /// In Hertz.
    pub refresh_rate: i32,
}

impl VideoMode {
    /// A mode of the given size where everything else is `DONT_CARE`.
    pub fn with_size(width: i32, height: i32) -> Self {
        Self {
            width, height,
            red_bits: DONT_CARE,
            green_bits: DONT_CARE,
            blue_bits: DONT_CARE,
            refresh_rate: DONT_CARE,
        }
    }
    fn bpp(&self) -> i32 {
        self.red_bits + self.green_bits + self.blue_bits
    }
    /// The order in which a monitor lists its modes: by total bit depth,
    /// then area, then width, then refresh rate.
    pub fn cmp_listing(&self, other: &Self) -> Ordering {
        self.bpp().cmp(&other.bpp())
            .then_with(|| (i64::from(self.width) * i64::from(self.height)).cmp(&(i64::from(other.width) * i64::from(other.height))))
            .then_with(|| self.width.cmp(&other.width))
            .then_with(|| self.refresh_rate.cmp(&other.refresh_rate))
    }
}

/// Sorts modes the way monitors list them and drops duplicates.
pub fn sort_video_modes(modes: &mut Vec<VideoMode>) {
    modes.sort_by(|a, b| a.cmp_listing(b).then_with(|| (a.red_bits, a.green_bits, a.height).cmp(&(b.red_bits, b.green_bits, b.height))));
    modes.dedup();
}

/// Picks the mode closest to `desired`, comparing color depth first, then
/// size, then refresh rate. Ties keep the earliest mode.
///
/// When the desired refresh rate is `DONT_CARE`, higher refresh rates win.
pub fn select_video_mode<'a>(modes: &'a [VideoMode], desired: &VideoMode) -> Option<&'a VideoMode> {
    let mut best: Option<(&VideoMode, (u64, u64, u64))> = None;

    let channel = |desired: i32, current: i32| -> u64 {
        if desired == DONT_CARE { 0 } else { (i64::from(current) - i64::from(desired)).abs() as u64 }
    };
    let squared = |desired: i32, current: i32| -> u64 {
        if desired == DONT_CARE { 0 } else { let d = (i64::from(current) - i64::from(desired)).abs() as u64; d * d }
    };

    for current in modes {
        let color_diff = channel(desired.red_bits, current.red_bits)
            + channel(desired.green_bits, current.green_bits)
            + channel(desired.blue_bits, current.blue_bits);
        let size_diff = squared(desired.width, current.width).saturating_add(squared(desired.height, current.height));
        let rate_diff = if desired.refresh_rate == DONT_CARE {
            u64::from(::std::u32::MAX) - current.refresh_rate.max(0) as u64
        } else {
            (i64::from(current.refresh_rate) - i64::from(desired.refresh_rate)).abs() as u64
        };
        let s = (color_diff, size_diff, rate_diff);
        match best {
            Some((_, ref b)) if *b <= s => (),
            _ => best = Some((current, s)),
        }
    }
    best.map(|(m, _)| m)
}

/// What a platform reports about a connected monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Stable platform name used to match monitors across re-enumerations.
    pub native_id: String,
    /// Human-readable name.
    pub name: String,
    /// Position of the monitor on the virtual desktop.
    pub position: Vec2<i32>,
    /// Physical size in millimeters.
    pub physical_size_mm: Extent2<i32>,
}

/// A connected monitor.
#[derive(Debug)]
pub struct Monitor {
    id: MonitorId,
    pub(crate) info: MonitorInfo,
    modes: Option<Vec<VideoMode>>,
    pub(crate) window: Option<WindowId>,
}

impl Monitor {
    pub(crate) fn new(id: MonitorId, info: MonitorInfo) -> Self {
        Self { id, info, modes: None, window: None, }
    }
    #[allow(missing_docs)]
    pub fn id(&self) -> MonitorId { self.id }
    #[allow(missing_docs)]
    pub fn name(&self) -> &str { &self.info.name }
    #[allow(missing_docs)]
    pub fn position(&self) -> Vec2<i32> { self.info.position }
    /// Physical size in millimeters.
    pub fn physical_size_mm(&self) -> Extent2<i32> { self.info.physical_size_mm }
    /// The full screen window currently on this monitor, if any.
    pub fn fullscreen_window(&self) -> Option<WindowId> { self.window }
    /// The cached video modes, if they were queried already.
    pub fn cached_video_modes(&self) -> Option<&[VideoMode]> { self.modes.as_ref().map(|m| m.as_slice()) }

    pub(crate) fn video_modes(&mut self, platform: &mut dyn Platform) -> Result<&[VideoMode]> {
        if self.modes.is_none() {
            let mut modes = platform.video_modes(&self.info.native_id)?;
            sort_video_modes(&mut modes);
            debug!("Monitor `{}` has {} distinct video modes", self.info.name, modes.len());
            self.modes = Some(modes);
        }
        Ok(self.modes.as_ref().map(|m| m.as_slice()).unwrap_or(&[]))
    }

    /// Sets the mode closest to `desired`, unless it is the current one already.
    pub(crate) fn set_video_mode(&mut self, platform: &mut dyn Platform, desired: &VideoMode) -> Result<()> {
        let best = match select_video_mode(self.video_modes(platform)?, desired) {
            Some(m) => *m,
            None => return crate::error::platform_failed(format!("Monitor `{}` reports no video modes", self.info.name)),
        };
        let current = platform.current_video_mode(&self.info.native_id)?;
        if current.cmp_listing(&best) == Ordering::Equal {
            return Ok(());
        }
        debug!("Switching monitor `{}` to {:?}", self.info.name, best);
        platform.set_video_mode(&self.info.native_id, &best)
    }
}

/// Gives the monitor to a full screen window: switches to the window's
/// video mode and makes the window cover the monitor.
pub(crate) fn acquire_monitor(platform: &mut dyn Platform, monitor: &mut Monitor, window: &mut Window) -> Result<()> {
    let desired = window.video_mode;
    monitor.set_video_mode(platform, &desired)?;
    match monitor.window {
        Some(other) if other != window.id() => warn!("Window {:?} takes monitor `{}` over from window {:?}", window.id(), monitor.info.name, other),
        _ => (),
    }
    debug!("Window {:?} acquires monitor `{}`", window.id(), monitor.info.name);
    monitor.window = Some(window.id());
    let mode = platform.current_video_mode(&monitor.info.native_id)?;
    platform.fit_to_monitor(window.id(), &monitor.info, &mode)?;
    window.size = platform.window_size(window.id());
    window.framebuffer_size = platform.framebuffer_size(window.id());
    window.pos = platform.window_pos(window.id());
    Ok(())
}

/// Takes the monitor back from a full screen window and restores its
/// original video mode. Does nothing if another window owns the monitor.
pub(crate) fn release_monitor(platform: &mut dyn Platform, monitor: &mut Monitor, window: WindowId) {
    if monitor.window != Some(window) {
        return;
    }
    debug!("Window {:?} releases monitor `{}`", window, monitor.info.name);
    monitor.window = None;
    platform.restore_video_mode(&monitor.info.native_id);
}
