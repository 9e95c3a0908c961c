// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic nanosecond timestamps and signed durations.
//!
//! [`HostTime`] is a point on the compositor's monotonic clock, in
//! nanoseconds. A value of zero means "not recorded" in the dump and trace
//! schema, matching how predictors and fences report missing timestamps.
//!
//! [`Duration`] is a signed span in the same units. Classification works on
//! signed deltas (actual minus predicted), so both types are backed by `i64`.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time on the monotonic clock, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub i64);

impl HostTime {
    /// The "not recorded" timestamp.
    pub const ZERO: Self = Self(0);

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> i64 {
        self.0
    }

    /// Creates a timestamp from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * 1_000_000)
    }

    /// Returns `true` if this timestamp was never recorded.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns the signed duration from `earlier` to `self`.
    #[inline]
    #[must_use]
    pub const fn signed_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        let d = self.0.saturating_sub(earlier.0);
        if d < 0 { Duration::ZERO } else { Duration(d) }
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Milliseconds elapsed from `base` to `self`, clamped at zero.
    ///
    /// Used to print timestamps relative to a common origin.
    #[inline]
    #[must_use]
    pub fn millis_since(self, base: Self) -> f64 {
        self.saturating_duration_since(base).as_millis_f64()
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// A signed span of time, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub i64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> i64 {
        self.0
    }

    /// Creates a duration from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * 1_000_000)
    }

    /// Creates a duration from whole microseconds.
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros * 1_000)
    }

    /// Returns the absolute value, saturating at `i64::MAX`.
    #[inline]
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Returns `true` if the span is strictly positive.
    #[inline]
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Returns the span in fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_constructors_agree() {
        assert_eq!(HostTime::from_millis(20), HostTime(20_000_000));
        assert_eq!(Duration::from_millis(2), Duration(2_000_000));
        assert_eq!(Duration::from_micros(1500), Duration(1_500_000));
    }

    #[test]
    fn signed_deltas() {
        let predicted = HostTime::from_millis(20);
        let late = HostTime::from_millis(25);
        let early = HostTime::from_millis(15);
        assert_eq!(late - predicted, Duration::from_millis(5));
        assert_eq!(early - predicted, Duration::from_millis(-5));
        assert_eq!((early - predicted).abs(), Duration::from_millis(5));
        assert!(!(early - predicted).is_positive());
    }

    #[test]
    fn saturating_duration_since_clamps() {
        let t = HostTime(1000);
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
        assert_eq!(t.saturating_duration_since(HostTime(400)), Duration(600));
        assert_eq!(t.signed_duration_since(HostTime(1500)), Duration(-500));
    }

    #[test]
    fn millis_since_base() {
        let base = HostTime::from_millis(100);
        assert!((HostTime::from_millis(110).millis_since(base) - 10.0).abs() < 1e-9);
        assert!(HostTime::from_millis(90).millis_since(base).abs() < 1e-9);
    }

    #[test]
    fn host_time_duration_ops() {
        let t = HostTime(1000);
        let d = Duration(200);
        assert_eq!((t + d).nanos(), 1200);
        assert_eq!((t - d).nanos(), 800);
        assert_eq!(HostTime(i64::MAX).checked_add(Duration(1)), None);
        assert_eq!(Duration(i64::MIN).abs(), Duration(i64::MAX));
    }
}
