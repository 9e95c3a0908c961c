// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned views of timeline state for diagnostics.
//!
//! A [`TimelineSnapshot`] is captured under the timeline lock and owns all of
//! its data, so it can be rendered at leisure. Capturing twice without any
//! intervening timeline calls yields equal snapshots.

use crate::display_frame::DisplayFrame;
use crate::time::HostTime;
use crate::trace::{DisplayFrameRecord, SurfaceFrameRecord};

/// Which cycles a snapshot includes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DumpFilter {
    /// Every retained cycle, followed by cycles still awaiting their present
    /// fence.
    #[default]
    All,
    /// Retained cycles that are janky or contain a janky layer frame.
    JankOnly,
}

/// One cycle within a [`TimelineSnapshot`].
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayFrameSnapshot {
    /// Position in history, oldest first. Pending cycles continue the count.
    pub index: usize,
    /// The cycle itself.
    pub record: DisplayFrameRecord,
    /// Its layer frames, in submission order.
    pub surface_frames: Vec<SurfaceFrameRecord>,
    /// Whether the cycle is still waiting for its present fence.
    pub pending: bool,
}

impl DisplayFrameSnapshot {
    fn capture(index: usize, frame: &DisplayFrame, pending: bool) -> Self {
        Self {
            index,
            record: frame.record(),
            surface_frames: frame.surface_records(),
            pending,
        }
    }
}

/// Point-in-time view of the timeline.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TimelineSnapshot {
    /// Smallest timestamp across the included cycles; dumps print times
    /// relative to it. Zero when nothing is included.
    pub base_time: HostTime,
    /// Included cycles.
    pub frames: Vec<DisplayFrameSnapshot>,
}

impl TimelineSnapshot {
    /// Returns `true` if no cycle is included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of included cycles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn capture<'a>(
        history: impl ExactSizeIterator<Item = &'a DisplayFrame>,
        pending: impl Iterator<Item = &'a DisplayFrame>,
        filter: DumpFilter,
    ) -> Self {
        let history_len = history.len();
        let mut base_time: Option<HostTime> = None;
        let mut frames = Vec::new();
        let mut include = |index: usize, frame: &DisplayFrame, pending: bool| {
            base_time = base_time.into_iter().chain(frame.base_time()).min();
            frames.push(DisplayFrameSnapshot::capture(index, frame, pending));
        };

        for (index, frame) in history.enumerate() {
            if filter == DumpFilter::All || frame.is_janky() {
                include(index, frame, false);
            }
        }
        if filter == DumpFilter::All {
            for (offset, frame) in pending.enumerate() {
                include(history_len + offset, frame, true);
            }
        }

        Self {
            base_time: base_time.unwrap_or_default(),
            frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jank::JankType;
    use crate::time::Duration;
    use crate::timing::{JankThresholds, PredictionState, TimelineItem};
    use crate::token::Token;

    fn cycle(token: i64, start_ms: i64, present_ms: i64) -> DisplayFrame {
        let mut df = DisplayFrame::new(JankThresholds::default(), 1);
        df.begin(
            Token(token),
            (PredictionState::Valid, TimelineItem::from_millis(start_ms, 10, 20)),
            HostTime::from_millis(start_ms),
            Duration::from_millis(11),
        );
        df.set_actual_end_time(HostTime::from_millis(10));
        df.finalize(HostTime::from_millis(present_ms));
        df
    }

    #[test]
    fn all_lists_history_then_pending() {
        let history = [cycle(1, 3, 20), cycle(2, 4, 20)];
        let pending = [cycle(3, 1, 20)];
        let snapshot = TimelineSnapshot::capture(history.iter(), pending.iter(), DumpFilter::All);

        let tokens: Vec<_> = snapshot.frames.iter().map(|f| f.record.token).collect();
        assert_eq!(tokens, [Token(1), Token(2), Token(3)]);
        assert_eq!(snapshot.frames[2].index, 2);
        assert!(snapshot.frames[2].pending);
        assert_eq!(snapshot.base_time, HostTime::from_millis(1));
    }

    #[test]
    fn jank_only_skips_clean_and_pending_cycles() {
        let history = [cycle(1, 3, 20), cycle(2, 3, 25)];
        let pending = [cycle(3, 1, 25)];
        let snapshot =
            TimelineSnapshot::capture(history.iter(), pending.iter(), DumpFilter::JankOnly);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.frames[0].index, 1);
        assert_eq!(snapshot.frames[0].record.jank, Some(JankType::PREDICTION_ERROR));
        assert_eq!(snapshot.base_time, HostTime::from_millis(3));
    }

    #[test]
    fn empty_snapshot_has_zero_base() {
        let none: [DisplayFrame; 0] = [];
        let snapshot = TimelineSnapshot::capture(none.iter(), none.iter(), DumpFilter::All);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.base_time, HostTime::ZERO);
    }
}
