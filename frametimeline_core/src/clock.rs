// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time sources for prediction retention.
//!
//! [`TokenStore`](crate::token::TokenStore) stamps every prediction with the
//! time it was issued and prunes by age, so it needs a clock. Production code
//! uses [`MonotonicClock`]; tests and trace replay drive a [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use crate::time::{Duration, HostTime};

/// A monotonic time source.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> HostTime;
}

/// Reads `std::time::Instant`, reported relative to when the clock was
/// created.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose zero is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> HostTime {
        let elapsed = self.origin.elapsed().as_nanos();
        HostTime(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub const fn new(start: HostTime) -> Self {
        Self {
            now: AtomicI64::new(start.0),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, t: HostTime) {
        self.now.store(t.0, Ordering::Release);
    }

    /// Moves the clock forward by `d`.
    pub fn advance(&self, d: Duration) {
        self.now.fetch_add(d.0, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.now.load(Ordering::Acquire))
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> HostTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a, "{b:?} < {a:?}");
    }

    #[test]
    fn manual_clock_set_and_advance() {
        let clock = ManualClock::new(HostTime::from_millis(5));
        assert_eq!(clock.now(), HostTime::from_millis(5));
        clock.advance(Duration::from_millis(120));
        assert_eq!(clock.now(), HostTime::from_millis(125));
        clock.set(HostTime(7));
        assert_eq!(clock.now(), HostTime(7));
    }

    #[test]
    fn shared_clock_reads_through_arc() {
        let clock = std::sync::Arc::new(ManualClock::new(HostTime(1)));
        let shared: &dyn Clock = &clock;
        clock.advance(Duration(9));
        assert_eq!(shared.now(), HostTime(10));
    }
}
