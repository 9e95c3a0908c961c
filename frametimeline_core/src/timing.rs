// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Predicted and actual frame timing, and deadline classification.
//!
//! This module defines the values that flow between the predictor, the frame
//! records, and the classifiers:
//!
//! - [`TimelineItem`] — start/end/present timestamps, used both for
//!   predictions and actuals
//! - [`PredictionState`] — whether predictions were attached to a frame
//! - [`JankThresholds`] — per-comparison tolerances
//! - [`FrameStartMetadata`], [`FrameReadyMetadata`], [`FramePresentMetadata`]
//!   — the outcome of comparing each actual timestamp to its prediction
//!
//! # Comparison rules
//!
//! Every comparison takes `delta = actual - predicted`. A delta whose
//! magnitude is within the threshold is on time. Outside the threshold, a
//! positive delta is late and a negative one is early. Finishing early is not
//! a separate outcome: [`FrameReadyMetadata`] folds it into on-time.

use core::fmt;

use crate::time::{Duration, HostTime};

/// Start, end, and present timestamps for one frame.
///
/// For a compositor cycle, `start_time` is the wake-up, `end_time` is when the
/// composited frame was handed to the display, and `present_time` is when it
/// reached the screen. For a layer frame, `end_time` is when its buffer was
/// ready (queued and acquire fence signaled).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimelineItem {
    /// When work on the frame started.
    pub start_time: HostTime,
    /// When work on the frame finished.
    pub end_time: HostTime,
    /// When the frame was presented.
    pub present_time: HostTime,
}

impl TimelineItem {
    /// Creates a timeline item from its three timestamps.
    #[must_use]
    pub const fn new(start_time: HostTime, end_time: HostTime, present_time: HostTime) -> Self {
        Self {
            start_time,
            end_time,
            present_time,
        }
    }

    /// Creates a timeline item from millisecond offsets.
    #[must_use]
    pub const fn from_millis(start: i64, end: i64, present: i64) -> Self {
        Self::new(
            HostTime::from_millis(start),
            HostTime::from_millis(end),
            HostTime::from_millis(present),
        )
    }
}

/// Whether a frame carries usable predictions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PredictionState {
    /// Predictions were resolved from the token manager.
    Valid,
    /// A token was supplied but the token manager no longer holds it.
    Expired,
    /// No token was supplied, or the token was never issued.
    None,
}

impl PredictionState {
    /// Returns a short label for dumps and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::Expired => "Expired",
            Self::None => "None",
        }
    }
}

impl fmt::Display for PredictionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a frame was presented relative to its predicted present time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FramePresentMetadata {
    /// Presented within the present threshold.
    OnTimePresent,
    /// Presented after the predicted time plus the threshold.
    LatePresent,
    /// Presented before the predicted time minus the threshold.
    EarlyPresent,
    /// Not classified, or no predictions to compare against.
    #[default]
    UnknownPresent,
}

impl FramePresentMetadata {
    /// Returns a short label for dumps and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTimePresent => "On Time Present",
            Self::LatePresent => "Late Present",
            Self::EarlyPresent => "Early Present",
            Self::UnknownPresent => "Unknown Present",
        }
    }
}

impl fmt::Display for FramePresentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a frame finished relative to its predicted end time.
///
/// Finishing early counts as on time: the goal of every stage is to finish
/// before its deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FrameReadyMetadata {
    /// Finished at or before the deadline plus the threshold.
    OnTimeFinish,
    /// Finished after the deadline plus the threshold.
    LateFinish,
    /// Not classified, or no predictions to compare against.
    #[default]
    UnknownFinish,
}

impl FrameReadyMetadata {
    /// Returns a short label for dumps and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTimeFinish => "On Time Finish",
            Self::LateFinish => "Late Finish",
            Self::UnknownFinish => "Unknown Finish",
        }
    }
}

impl fmt::Display for FrameReadyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a frame started relative to its predicted start time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FrameStartMetadata {
    /// Started within the start threshold.
    OnTimeStart,
    /// Started after the predicted time plus the threshold.
    LateStart,
    /// Started before the predicted time minus the threshold.
    EarlyStart,
    /// Not classified, or no predictions to compare against.
    #[default]
    UnknownStart,
}

impl FrameStartMetadata {
    /// Returns a short label for dumps and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTimeStart => "On Time Start",
            Self::LateStart => "Late Start",
            Self::EarlyStart => "Early Start",
            Self::UnknownStart => "Unknown Start",
        }
    }
}

impl fmt::Display for FrameStartMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tolerances applied when comparing actual timestamps to predictions.
///
/// A timestamp whose distance from its prediction is at most the matching
/// threshold is on time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JankThresholds {
    /// Tolerance on the present time.
    pub present: Duration,
    /// Tolerance on the end (deadline) time.
    pub deadline: Duration,
    /// Tolerance on the start time.
    pub start: Duration,
}

impl JankThresholds {
    /// The default tolerance for every comparison.
    pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(2);

    /// Creates thresholds with 2 ms for every comparison.
    #[must_use]
    pub const fn new() -> Self {
        Self::uniform(Self::DEFAULT_THRESHOLD)
    }

    /// Creates thresholds that use `threshold` for every comparison.
    #[must_use]
    pub const fn uniform(threshold: Duration) -> Self {
        Self {
            present: threshold,
            deadline: threshold,
            start: threshold,
        }
    }
}

impl Default for JankThresholds {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies an actual start time against its prediction.
#[must_use]
pub fn classify_start(
    actual: HostTime,
    predicted: HostTime,
    threshold: Duration,
) -> FrameStartMetadata {
    let delta = actual - predicted;
    if delta.abs() <= threshold {
        FrameStartMetadata::OnTimeStart
    } else if delta.is_positive() {
        FrameStartMetadata::LateStart
    } else {
        FrameStartMetadata::EarlyStart
    }
}

/// Classifies an actual end time against its predicted deadline.
#[must_use]
pub fn classify_ready(
    actual: HostTime,
    predicted: HostTime,
    threshold: Duration,
) -> FrameReadyMetadata {
    if actual - predicted > threshold {
        FrameReadyMetadata::LateFinish
    } else {
        FrameReadyMetadata::OnTimeFinish
    }
}

/// Classifies an actual present time against its prediction.
#[must_use]
pub fn classify_present(
    actual: HostTime,
    predicted: HostTime,
    threshold: Duration,
) -> FramePresentMetadata {
    let delta = actual - predicted;
    if delta.abs() <= threshold {
        FramePresentMetadata::OnTimePresent
    } else if delta.is_positive() {
        FramePresentMetadata::LatePresent
    } else {
        FramePresentMetadata::EarlyPresent
    }
}

/// Returns `true` if a present delta is within `threshold` of a whole number
/// of vsync periods.
///
/// An aligned miss means the frame landed on a real vsync, just not the
/// predicted one; a misaligned miss means the prediction itself was off.
/// A zero or negative period counts as aligned.
#[must_use]
pub fn is_vsync_aligned(present_delta: Duration, vsync_period: Duration, threshold: Duration) -> bool {
    if !vsync_period.is_positive() {
        return true;
    }
    let to_vsync = present_delta.abs().0 % vsync_period.0;
    to_vsync < threshold.0 || to_vsync >= vsync_period.0 - threshold.0
}

/// Smallest recorded timestamp of a frame.
///
/// The predicted start counts only when predictions are valid; each actual
/// timestamp counts only when it was recorded. Returns `None` if nothing is
/// recorded.
#[must_use]
pub fn min_time(
    prediction_state: PredictionState,
    predictions: &TimelineItem,
    actuals: &TimelineItem,
) -> Option<HostTime> {
    let predicted = (prediction_state == PredictionState::Valid).then_some(predictions.start_time);
    [actuals.start_time, actuals.end_time, actuals.present_time]
        .into_iter()
        .filter(|t| !t.is_zero())
        .chain(predicted)
        .min()
}
