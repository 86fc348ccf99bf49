//! Framebuffer (pixel format) configurations, and picking the one closest to
//! what the user asked for.

use std::convert::TryFrom;

use crate::DONT_CARE;

/// A set of framebuffer attributes.
///
/// The same type describes both what the user desires (where any integer
/// field may be `DONT_CARE`) and what the platform has available (where
/// `handle` identifies the native pixel format).
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct FramebufferConfig {
    /// Number of bits used for storing the red channel. Often set to 8.
    pub red_bits: i32,
    /// Number of bits used for storing the green channel. Often set to 8.
    pub green_bits: i32,
    /// Number of bits used for storing the blue channel. Often set to 8.
    pub blue_bits: i32,
    /// Number of bits used for storing the alpha channel. Often set to 8.
    pub alpha_bits: i32,
    /// Number of bits used for storing per-fragment depth values.
    /// Often set to 24.
    pub depth_bits: i32,
    /// Number of bits used for storing per-fragment "stencil" values.
    pub stencil_bits: i32,
    /// Number of bits used for storing the red channel in the accumulation buffer, if any.
    pub accum_red_bits: i32,
    /// Number of bits used for storing the green channel in the accumulation buffer, if any.
    pub accum_green_bits: i32,
    /// Number of bits used for storing the blue channel in the accumulation buffer, if any.
    pub accum_blue_bits: i32,
    /// Number of bits used for storing the alpha channel in the accumulation buffer, if any.
    pub accum_alpha_bits: i32,
    /// Number of auxiliary image buffers.
    /// This was deprecated since OpenGL 3.0.
    pub aux_buffers: i32,
    /// Number of samples per pixel for multisampling. Zero disables it.
    pub samples: i32,
    /// Left and right buffers instead of a single one.
    pub stereo: bool,
    /// Use double-buffering ? Defaults to `true` because
    /// not enabling this has been deprecated long ago.
    pub doublebuffer: bool,
    /// sRGB-capable framebuffer.
    pub srgb: bool,
    /// Framebuffer whose alpha channel is used for compositing with the desktop.
    pub transparent: bool,
    /// Platform-specific identifier of an available pixel format. Ignored
    /// in desired configurations.
    pub handle: usize,
}

impl Default for FramebufferConfig {
    fn default() -> Self {
        Self {
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
            accum_red_bits: 0,
            accum_green_bits: 0,
            accum_blue_bits: 0,
            accum_alpha_bits: 0,
            aux_buffers: 0,
            samples: 0,
            stereo: false,
            doublebuffer: true,
            srgb: false,
            transparent: false,
            handle: 0,
        }
    }
}

/// How far a candidate is from the desired configuration. Lower is better,
/// compared field by field in declaration order.
#[derive(Debug, Copy, Clone, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FramebufferScore {
    /// Buffers that were requested but are absent.
    pub missing: u32,
    /// Squared distance over the red, green and blue bit depths.
    pub color_diff: u64,
    /// Squared distance over every other bit depth, plus sRGB.
    pub extra_diff: u64,
}

fn squared(desired: i32, current: i32) -> u64 {
    if desired == DONT_CARE {
        return 0;
    }
    let d = (i64::from(desired) - i64::from(current)).abs() as u64;
    d * d
}

/// Scores `current` against `desired`.
pub fn score(desired: &FramebufferConfig, current: &FramebufferConfig) -> FramebufferScore {
    let mut missing = 0;

    // Not every pixel format API treats these as hard requirements.
    if desired.stereo && !current.stereo {
        missing += 1;
    }
    if desired.doublebuffer != current.doublebuffer {
        missing += 1;
    }

    if desired.alpha_bits > 0 && current.alpha_bits == 0 {
        missing += 1;
    }
    if desired.depth_bits > 0 && current.depth_bits == 0 {
        missing += 1;
    }
    if desired.stencil_bits > 0 && current.stencil_bits == 0 {
        missing += 1;
    }
    if desired.samples > 0 && current.samples == 0 {
        missing += 1;
    }
    if desired.transparent != current.transparent {
        missing += 1;
    }
    if desired.aux_buffers > 0 && current.aux_buffers < desired.aux_buffers {
        let deficit = i64::from(desired.aux_buffers) - i64::from(current.aux_buffers);
        missing = u32::try_from(deficit).unwrap_or(u32::MAX).saturating_add(missing);
    }

    let color_diff = [
        (desired.red_bits, current.red_bits),
        (desired.green_bits, current.green_bits),
        (desired.blue_bits, current.blue_bits),
    ].iter().fold(0u64, |sum, &(d, c)| sum.saturating_add(squared(d, c)));

    let mut extra_diff = [
        (desired.alpha_bits, current.alpha_bits),
        (desired.depth_bits, current.depth_bits),
        (desired.stencil_bits, current.stencil_bits),
        (desired.accum_red_bits, current.accum_red_bits),
        (desired.accum_green_bits, current.accum_green_bits),
        (desired.accum_blue_bits, current.accum_blue_bits),
        (desired.accum_alpha_bits, current.accum_alpha_bits),
        (desired.samples, current.samples),
    ].iter().fold(0u64, |sum, &(d, c)| sum.saturating_add(squared(d, c)));
    if desired.srgb && !current.srgb {
        extra_diff = extra_diff.saturating_add(1);
    }

    FramebufferScore { missing, color_diff, extra_diff }
}

/// Picks the candidate closest to `desired`.
///
/// Candidates are ranked first by missing buffers, then by color channel
/// distance, then by everything else. Ties keep the earliest candidate.
/// Returns `None` only if `candidates` is empty.
pub fn select_framebuffer_config<'a>(desired: &FramebufferConfig, candidates: &'a [FramebufferConfig]) -> Option<&'a FramebufferConfig> {
    let mut best: Option<(&FramebufferConfig, FramebufferScore)> = None;
    for candidate in candidates {
        let s = score(desired, candidate);
        match best {
            Some((_, ref best_score)) if *best_score <= s => (),
            _ => best = Some((candidate, s)),
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with(f: impl FnOnce(&mut FramebufferConfig)) -> FramebufferConfig {
        let mut c = FramebufferConfig::default();
        f(&mut c);
        c
    }

    #[test]
    fn empty_list_has_no_match() {
        assert_eq!(select_framebuffer_config(&FramebufferConfig::default(), &[]), None);
    }

    #[test]
    fn non_empty_list_always_matches() {
        let desired = with(|c| { c.stereo = true; c.doublebuffer = false; });
        let candidates = [with(|c| c.handle = 7)];
        assert_eq!(select_framebuffer_config(&desired, &candidates).map(|c| c.handle), Some(7));
    }

    #[test]
    fn missing_buffers_dominate_color_distance() {
        let desired = FramebufferConfig::default();
        // Perfect colors but no depth buffer.
        let a = with(|c| { c.depth_bits = 0; c.handle = 1; });
        // Awful colors but every buffer present.
        let b = with(|c| { c.red_bits = 1; c.green_bits = 1; c.blue_bits = 1; c.handle = 2; });
        assert_eq!(score(&desired, &a).missing, 1);
        assert_eq!(score(&desired, &b).missing, 0);
        assert_eq!(select_framebuffer_config(&desired, &[a, b]).map(|c| c.handle), Some(2));
    }

    #[test]
    fn zero_missing_is_preferred_whenever_available() {
        let desired = with(|c| c.samples = 4);
        let candidates = [
            with(|c| { c.samples = 0; c.handle = 1; }),
            with(|c| { c.samples = 16; c.depth_bits = 16; c.handle = 2; }),
            with(|c| { c.samples = 0; c.alpha_bits = 0; c.handle = 3; }),
        ];
        let best = select_framebuffer_config(&desired, &candidates).unwrap();
        assert_eq!(score(&desired, best).missing, 0);
        assert_eq!(best.handle, 2);
    }

    #[test]
    fn color_distance_dominates_extra_distance() {
        let desired = FramebufferConfig::default();
        let a = with(|c| { c.red_bits = 5; c.green_bits = 6; c.blue_bits = 5; c.handle = 1; });
        let b = with(|c| { c.depth_bits = 16; c.stencil_bits = 1; c.handle = 2; });
        assert_eq!(select_framebuffer_config(&desired, &[a, b]).map(|c| c.handle), Some(2));
    }

    #[test]
    fn dont_care_channels_are_ignored() {
        let desired = with(|c| { c.red_bits = DONT_CARE; c.depth_bits = DONT_CARE; });
        let current = with(|c| { c.red_bits = 2; c.depth_bits = 32; });
        assert_eq!(score(&desired, &current), FramebufferScore::default());
    }

    #[test]
    fn aux_deficit_and_srgb() {
        let desired = with(|c| { c.aux_buffers = 3; c.srgb = true; });
        let current = with(|c| c.aux_buffers = 1);
        let s = score(&desired, &current);
        assert_eq!(s.missing, 2);
        assert_eq!(s.extra_diff, 1);
    }

    #[test]
    fn extreme_hints_saturate() {
        let desired = with(|c| {
            c.depth_bits = i32::MAX;
            c.stencil_bits = i32::MAX;
            c.accum_red_bits = i32::MAX;
            c.accum_green_bits = i32::MAX;
            c.accum_blue_bits = i32::MAX;
            c.accum_alpha_bits = i32::MAX;
            c.samples = i32::MAX;
            c.aux_buffers = i32::MAX;
        });
        let current = with(|c| { c.red_bits = i32::MIN; c.aux_buffers = i32::MIN; c.handle = 1; });
        let s = score(&desired, &current);
        assert_eq!(s.missing, u32::MAX);
        assert_eq!(s.extra_diff, u64::MAX);
        assert!(s.color_diff > 0);
        assert_eq!(select_framebuffer_config(&desired, &[current]).map(|c| c.handle), Some(1));
    }

    #[test]
    fn ties_keep_first_candidate() {
        let desired = FramebufferConfig::default();
        let candidates = [with(|c| c.handle = 4), with(|c| c.handle = 5)];
        assert_eq!(select_framebuffer_config(&desired, &candidates).map(|c| c.handle), Some(4));
    }
}
