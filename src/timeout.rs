//! The Timeout enum, which is either a fixed duration or infinite.

use std::time::{Duration, Instant};

/// Bounds how long a wait may block: either a fixed duration or infinite.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Timeout {
    /// Wait at most this long.
    Set(Duration),
    /// Wait until something happens.
    Infinite,
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Timeout::Set(d)
    }
}

impl Timeout {
    /// Converts a timeout in seconds, rejecting negative, NaN and infinite values.
    /// Values too large for a `Duration` become `Infinite`.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !(secs.is_finite() && secs >= 0.) {
            return None;
        }
        Some(match Duration::try_from_secs_f64(secs) {
            Ok(d) => Timeout::Set(d),
            Err(_) => Timeout::Infinite,
        })
    }
    /// The instant at which a wait started `now` should give up, if any.
    /// `None` also when the deadline is past what an `Instant` can hold.
    pub fn deadline(&self, now: Instant) -> Option<Instant> {
        match *self {
            Timeout::Set(d) => now.checked_add(d),
            Timeout::Infinite => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_and_negative() {
        assert_eq!(Timeout::from_secs_f64(-0.5), None);
        assert_eq!(Timeout::from_secs_f64(::std::f64::NAN), None);
        assert_eq!(Timeout::from_secs_f64(::std::f64::INFINITY), None);
        assert_eq!(Timeout::from_secs_f64(0.), Some(Timeout::Set(Duration::from_secs(0))));
    }

    #[test]
    fn huge_timeouts_saturate() {
        assert_eq!(Timeout::from_secs_f64(1e20), Some(Timeout::Infinite));
        assert_eq!(Timeout::from_secs_f64(::std::f64::MAX), Some(Timeout::Infinite));
        assert_eq!(Timeout::from_secs_f64(1e19), Some(Timeout::Set(Duration::from_secs(10_000_000_000_000_000_000))));
    }

    #[test]
    fn deadline_past_instant_range_is_none() {
        let now = Instant::now();
        assert_eq!(Timeout::Set(Duration::from_secs(::std::u64::MAX)).deadline(now), None);
        assert_eq!(Timeout::Infinite.deadline(now), None);
        assert_eq!(Timeout::Set(Duration::from_secs(1)).deadline(now), Some(now + Duration::from_secs(1)));
    }
}
