// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aggregate jank statistics and grading.
//!
//! [`JankTracker`] implements [`JankStats`] and is handed to a
//! [`FrameTimeline`](frametimeline_core::timeline::FrameTimeline) with
//! `with_stats`. It tallies every finalized frame per layer and per jank
//! reason, keeps a rolling ring buffer of present-to-present deltas for HUD
//! sparklines, and grades the janky-cycle rate.
//!
//! All methods take `&self`; the tracker is shared between the timeline and
//! whatever reads the report.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use frametimeline_core::jank::JankType;
use frametimeline_core::stats::JankStats;
use frametimeline_core::time::HostTime;
use frametimeline_core::trace::{DisplayFrameRecord, SurfaceFrameRecord};

/// Number of distinct [`JankType`] reasons.
const REASON_COUNT: usize = JankType::all().bits().count_ones() as usize;

/// Letter grade for jank rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum JankGrade {
    /// Essentially jank-free.
    A,
    /// Occasional jank.
    B,
    /// Noticeable jank.
    C,
    /// Janky.
    D,
}

impl JankGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Grades a janky-cycles-per-1000 rate.
    #[must_use]
    pub fn for_rate(janky_per_1000: f64) -> Self {
        if janky_per_1000 < 1.0 {
            Self::A
        } else if janky_per_1000 < 10.0 {
            Self::B
        } else if janky_per_1000 < 50.0 {
            Self::C
        } else {
            Self::D
        }
    }
}

/// Frame counts for one population (all cycles, or one layer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    /// Frames observed.
    pub total: u64,
    /// Frames whose jank set was non-empty.
    pub janky: u64,
}

impl Tally {
    fn observe(&mut self, janky: bool) {
        self.total = self.total.saturating_add(1);
        if janky {
            self.janky = self.janky.saturating_add(1);
        }
    }

    /// Janky frames per 1000 observed, or 0 when nothing was observed.
    #[must_use]
    pub fn janky_per_1000(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.janky as f64 * 1000.0 / self.total as f64
        }
    }
}

/// Aggregated report returned by [`JankTracker::report`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JankReport {
    /// Grade of the compositor-cycle jank rate.
    pub grade: JankGrade,
    /// Janky compositor cycles per 1000 finalized.
    pub janky_per_1000: f64,
    /// Compositor cycle counts.
    pub display_frames: Tally,
    /// Layer frame counts over every layer.
    pub surface_frames: Tally,
}

/// Thread-safe jank statistics collector with an `N`-entry present-delta
/// history.
pub struct JankTracker<const N: usize = 64> {
    inner: Mutex<Inner<N>>,
}

struct Inner<const N: usize> {
    display_frames: Tally,
    surface_frames: Tally,
    layers: BTreeMap<String, Tally>,
    reasons: [u64; REASON_COUNT],
    deltas_ms: [f64; N],
    cursor: usize,
    last_present: HostTime,
}

impl<const N: usize> core::fmt::Debug for JankTracker<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.lock();
        f.debug_struct("JankTracker")
            .field("display_frames", &inner.display_frames)
            .field("surface_frames", &inner.surface_frames)
            .field("layers", &inner.layers.len())
            .finish_non_exhaustive()
    }
}

impl<const N: usize> Default for JankTracker<N> {
    fn default() -> Self {
        Self::new(16.67)
    }
}

impl<const N: usize> JankTracker<N> {
    /// Creates a tracker with `seed_delta_ms` prefilled in the ring buffer.
    #[must_use]
    pub const fn new(seed_delta_ms: f64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                display_frames: Tally { total: 0, janky: 0 },
                surface_frames: Tally { total: 0, janky: 0 },
                layers: BTreeMap::new(),
                reasons: [0; REASON_COUNT],
                deltas_ms: [seed_delta_ms; N],
                cursor: 0,
                last_present: HostTime::ZERO,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<N>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current aggregate report.
    #[must_use]
    pub fn report(&self) -> JankReport {
        let inner = self.lock();
        let janky_per_1000 = inner.display_frames.janky_per_1000();
        JankReport {
            grade: JankGrade::for_rate(janky_per_1000),
            janky_per_1000,
            display_frames: inner.display_frames,
            surface_frames: inner.surface_frames,
        }
    }

    /// Counts for one layer, by layer name.
    #[must_use]
    pub fn layer(&self, layer_name: &str) -> Option<Tally> {
        self.lock().layers.get(layer_name).copied()
    }

    /// Counts for every layer seen, ordered by layer name.
    #[must_use]
    pub fn layers(&self) -> Vec<(String, Tally)> {
        self.lock()
            .layers
            .iter()
            .map(|(name, tally)| (name.clone(), *tally))
            .collect()
    }

    /// How many frames (cycles and layer frames) carried `reason`.
    ///
    /// `reason` should be a single flag; for a combination the count of its
    /// lowest set flag is returned.
    #[must_use]
    pub fn reason_count(&self, reason: JankType) -> u64 {
        if reason.is_empty() {
            return 0;
        }
        self.lock().reasons[reason.bits().trailing_zeros() as usize]
    }

    /// Non-zero per-reason counts, in bit order.
    #[must_use]
    pub fn reason_counts(&self) -> Vec<(JankType, u64)> {
        let inner = self.lock();
        JankType::all()
            .iter()
            .map(|flag| (flag, inner.reasons[flag.bits().trailing_zeros() as usize]))
            .filter(|&(_, count)| count > 0)
            .collect()
    }

    /// Returns ring-buffer present deltas oldest→newest.
    #[must_use]
    pub fn present_deltas(&self) -> [f64; N] {
        let inner = self.lock();
        core::array::from_fn(|i| inner.deltas_ms[(inner.cursor + i) % N])
    }

    /// Returns an ASCII sparkline over [`present_deltas`](Self::present_deltas).
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let span = max_ms - min_ms;
        self.present_deltas()
            .into_iter()
            .map(|delta| {
                let t = if span > 0.0 {
                    (delta.clamp(min_ms, max_ms) - min_ms) / span
                } else {
                    0.0
                };
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "index is clamped to ASCII level count"
                )]
                let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
                LEVELS[level] as char
            })
            .collect()
    }

    /// Clears every count. The delta history is kept.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.display_frames = Tally::default();
        inner.surface_frames = Tally::default();
        inner.layers.clear();
        inner.reasons = [0; REASON_COUNT];
    }
}

impl<const N: usize> Inner<N> {
    fn count_reasons(&mut self, jank: JankType) {
        for flag in jank.iter() {
            let slot = &mut self.reasons[flag.bits().trailing_zeros() as usize];
            *slot = slot.saturating_add(1);
        }
    }

    fn push_delta(&mut self, delta_ms: f64) {
        if N == 0 {
            return;
        }
        self.deltas_ms[self.cursor] = delta_ms;
        self.cursor = (self.cursor + 1) % N;
    }
}

impl<const N: usize> JankStats for JankTracker<N> {
    fn record_display_frame(&self, record: &DisplayFrameRecord) {
        let Some(jank) = record.jank else {
            tracing::debug!(token = record.token.0, "ignoring unclassified cycle");
            return;
        };
        let mut inner = self.lock();
        inner.display_frames.observe(jank.is_janky());
        inner.count_reasons(jank);

        let present = record.actuals.present_time;
        if present.is_zero() {
            return;
        }
        if !inner.last_present.is_zero() && present > inner.last_present {
            let delta = (present - inner.last_present).as_millis_f64();
            inner.push_delta(delta);
        }
        inner.last_present = present;
    }

    fn record_surface_frame(&self, record: &SurfaceFrameRecord) {
        let Some(jank) = record.jank else {
            tracing::debug!(layer = %record.layer_name, "ignoring unclassified layer frame");
            return;
        };
        let mut inner = self.lock();
        inner.surface_frames.observe(jank.is_janky());
        inner.count_reasons(jank);
        match inner.layers.get_mut(&record.layer_name) {
            Some(tally) => tally.observe(jank.is_janky()),
            None => {
                let mut tally = Tally::default();
                tally.observe(jank.is_janky());
                inner.layers.insert(record.layer_name.clone(), tally);
            }
        }
    }
}
