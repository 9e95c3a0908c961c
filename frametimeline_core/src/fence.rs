// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Present-completion signals.
//!
//! The true present time of a compositor cycle is only known once the display
//! reports it, possibly several vsyncs later. A [`PresentFence`] is polled,
//! never waited on: the timeline checks pending fences each time a cycle is
//! presented and leaves unsignaled ones for later.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::time::HostTime;

/// The state of a present fence at the moment it was polled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FenceStatus {
    /// The frame has not reached the display yet.
    Pending,
    /// The frame was presented at the given time.
    Signaled(HostTime),
    /// The fence will never report a time (e.g. the display was torn down).
    Invalid,
}

/// An asynchronous indicator that a frame has reached the display.
pub trait PresentFence: Send + Sync {
    /// Polls the fence without blocking.
    fn status(&self) -> FenceStatus;
}

const PENDING: i64 = i64::MAX;
const INVALID: i64 = -1;

/// A [`PresentFence`] backed by an atomic cell.
///
/// The producer that learns the present time (typically the display driver
/// callback) calls [`signal`](Self::signal); the timeline polls it.
pub struct FenceCell {
    signal_time: AtomicI64,
}

impl Default for FenceCell {
    fn default() -> Self {
        Self::new()
    }
}

impl FenceCell {
    /// Creates an unsignaled fence.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            signal_time: AtomicI64::new(PENDING),
        }
    }

    /// Creates a fence that has already signaled at `t`.
    #[must_use]
    pub fn signaled(t: HostTime) -> Self {
        let fence = Self::new();
        fence.signal(t);
        fence
    }

    /// Records the present time.
    ///
    /// A fence signals at most once; later calls are ignored.
    pub fn signal(&self, t: HostTime) {
        debug_assert!(
            t.0 != PENDING && t.0 != INVALID,
            "present time {t:?} collides with a fence marker"
        );
        let _ = self.signal_time.compare_exchange(
            PENDING,
            t.0,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Marks the fence as never going to signal.
    pub fn invalidate(&self) {
        let _ = self.signal_time.compare_exchange(
            PENDING,
            INVALID,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

impl PresentFence for FenceCell {
    fn status(&self) -> FenceStatus {
        match self.signal_time.load(Ordering::Acquire) {
            PENDING => FenceStatus::Pending,
            INVALID => FenceStatus::Invalid,
            t => FenceStatus::Signaled(HostTime(t)),
        }
    }
}

impl fmt::Debug for FenceCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FenceCell").field(&self.status()).finish()
    }
}
