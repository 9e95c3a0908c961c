// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One layer's frame within a compositor cycle.
//!
//! A [`SurfaceFrame`] is created by the timeline when a layer submits a
//! buffer, filled in by the submission pipeline as the buffer is queued,
//! acquired, and latched, and classified exactly once when the compositor
//! cycle it was attached to is finalized.
//!
//! Identity and predictions are fixed at construction. Everything the
//! pipeline writes afterwards lives behind the frame's own lock, so producer
//! threads never contend with the timeline lock.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::jank::JankType;
use crate::time::{Duration, HostTime};
use crate::timing::{
    FramePresentMetadata, FrameReadyMetadata, FrameStartMetadata, JankThresholds,
    PredictionState, TimelineItem, classify_present, classify_ready, classify_start,
    is_vsync_aligned, min_time,
};
use crate::token::Token;
use crate::trace::SurfaceFrameRecord;

/// What the compositor did with a layer's buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PresentState {
    /// The buffer was latched and presented.
    Presented,
    /// The buffer was dropped.
    Dropped,
    /// The compositor has not handled the buffer yet.
    #[default]
    Unknown,
}

impl PresentState {
    /// Returns a short label for dumps and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Presented => "Presented",
            Self::Dropped => "Dropped",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PresentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields written after construction.
#[derive(Debug, Default)]
struct SurfaceFrameState {
    present_state: PresentState,
    actual_start: Option<HostTime>,
    actual_queue: Option<HostTime>,
    acquire_fence: Option<HostTime>,
    last_latch: HostTime,
    actual_present: HostTime,
    gpu_composition: bool,
    start: FrameStartMetadata,
    ready: FrameReadyMetadata,
    present: FramePresentMetadata,
    jank: Option<JankType>,
}

impl SurfaceFrameState {
    /// The buffer is ready once it is both queued and its acquire fence has
    /// signaled.
    fn actual_end(&self) -> Option<HostTime> {
        self.actual_queue.max(self.acquire_fence)
    }

    fn actuals(&self) -> TimelineItem {
        TimelineItem {
            start_time: self.actual_start.unwrap_or_default(),
            end_time: self.actual_end().unwrap_or_default(),
            present_time: self.actual_present,
        }
    }
}

/// Timing record for one layer's contribution to a compositor cycle.
///
/// Shared between the layer that submitted the buffer and the cycle it was
/// attached to; hold it in an [`Arc`](std::sync::Arc).
pub struct SurfaceFrame {
    token: Option<Token>,
    owner_pid: u32,
    owner_uid: u32,
    layer_name: String,
    debug_name: String,
    prediction_state: PredictionState,
    predictions: TimelineItem,
    thresholds: JankThresholds,
    state: Mutex<SurfaceFrameState>,
}

impl fmt::Debug for SurfaceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceFrame")
            .field("token", &self.token)
            .field("layer_name", &self.layer_name)
            .field("prediction_state", &self.prediction_state)
            .field("jank", &self.jank_type())
            .finish_non_exhaustive()
    }
}

impl SurfaceFrame {
    #[expect(
        clippy::too_many_arguments,
        reason = "identity and resolved predictions are all fixed at construction"
    )]
    pub(crate) fn new(
        token: Option<Token>,
        owner_pid: u32,
        owner_uid: u32,
        layer_name: String,
        debug_name: String,
        prediction_state: PredictionState,
        predictions: TimelineItem,
        thresholds: JankThresholds,
    ) -> Self {
        Self {
            token,
            owner_pid,
            owner_uid,
            layer_name,
            debug_name,
            prediction_state,
            predictions,
            thresholds,
            state: Mutex::new(SurfaceFrameState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceFrameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Identity --

    /// The prediction token the layer supplied, if any.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.token
    }

    /// Process id of the layer's owner.
    #[must_use]
    pub fn owner_pid(&self) -> u32 {
        self.owner_pid
    }

    /// User id of the layer's owner.
    #[must_use]
    pub fn owner_uid(&self) -> u32 {
        self.owner_uid
    }

    /// Name of the layer.
    #[must_use]
    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    /// Human-readable name for diagnostics.
    #[must_use]
    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// Whether predictions were attached at construction.
    #[must_use]
    pub fn prediction_state(&self) -> PredictionState {
        self.prediction_state
    }

    /// The predicted start, ready, and present times.
    #[must_use]
    pub fn predictions(&self) -> TimelineItem {
        self.predictions
    }

    // -- Pipeline setters --

    /// Records when the application started work on the frame.
    ///
    /// Set at most once.
    pub fn set_actual_start_time(&self, t: HostTime) {
        let mut state = self.lock();
        debug_assert!(
            state.actual_start.is_none(),
            "actual start time of {} set twice",
            self.layer_name
        );
        state.actual_start = Some(t);
    }

    /// Records when the buffer was queued.
    ///
    /// Set at most once.
    pub fn set_actual_queue_time(&self, t: HostTime) {
        let mut state = self.lock();
        debug_assert!(
            state.actual_queue.is_none(),
            "actual queue time of {} set twice",
            self.layer_name
        );
        state.actual_queue = Some(t);
    }

    /// Records when the buffer's acquire fence signaled.
    ///
    /// Set at most once.
    pub fn set_acquire_fence_time(&self, t: HostTime) {
        let mut state = self.lock();
        debug_assert!(
            state.acquire_fence.is_none(),
            "acquire fence time of {} set twice",
            self.layer_name
        );
        state.acquire_fence = Some(t);
    }

    /// Records whether the compositor presented or dropped the buffer.
    ///
    /// `last_latch_time` is when the previous buffer of the same layer was
    /// latched, or [`HostTime::ZERO`] if unknown. Transitions out of
    /// [`PresentState::Unknown`] exactly once.
    pub fn set_present_state(&self, present_state: PresentState, last_latch_time: HostTime) {
        let mut state = self.lock();
        debug_assert!(
            state.present_state == PresentState::Unknown,
            "present state of {} already {}",
            self.layer_name,
            state.present_state
        );
        debug_assert!(
            present_state != PresentState::Unknown,
            "present state cannot return to Unknown"
        );
        state.present_state = present_state;
        state.last_latch = last_latch_time;
    }

    pub(crate) fn set_gpu_composition(&self, gpu_composition: bool) {
        self.lock().gpu_composition = gpu_composition;
    }

    // -- Readers --

    /// Whether the buffer was presented or dropped.
    #[must_use]
    pub fn present_state(&self) -> PresentState {
        self.lock().present_state
    }

    /// The actual start, ready, and present times recorded so far.
    #[must_use]
    pub fn actuals(&self) -> TimelineItem {
        self.lock().actuals()
    }

    /// Jank reasons, or `None` until the enclosing cycle is finalized.
    #[must_use]
    pub fn jank_type(&self) -> Option<JankType> {
        self.lock().jank
    }

    /// Start classification.
    #[must_use]
    pub fn start_metadata(&self) -> FrameStartMetadata {
        self.lock().start
    }

    /// Finish classification.
    #[must_use]
    pub fn ready_metadata(&self) -> FrameReadyMetadata {
        self.lock().ready
    }

    /// Present classification.
    #[must_use]
    pub fn present_metadata(&self) -> FramePresentMetadata {
        self.lock().present
    }

    /// Whether the enclosing cycle was composited on the GPU.
    #[must_use]
    pub fn gpu_composition(&self) -> bool {
        self.lock().gpu_composition
    }

    /// Smallest recorded timestamp, used as an origin for diagnostics.
    #[must_use]
    pub fn base_time(&self) -> Option<HostTime> {
        let actuals = self.lock().actuals();
        min_time(self.prediction_state, &self.predictions, &actuals)
    }

    /// Snapshot of the frame for traces and dumps.
    #[must_use]
    pub fn record(&self, display_frame_token: Token) -> SurfaceFrameRecord {
        let state = self.lock();
        SurfaceFrameRecord {
            token: self.token,
            display_frame_token,
            owner_pid: self.owner_pid,
            owner_uid: self.owner_uid,
            layer_name: self.layer_name.clone(),
            debug_name: self.debug_name.clone(),
            present_state: state.present_state,
            prediction_state: self.prediction_state,
            predictions: self.predictions,
            actuals: state.actuals(),
            last_latch_time: state.last_latch,
            start: state.start,
            ready: state.ready,
            present: state.present,
            jank: state.jank,
            gpu_composition: state.gpu_composition,
        }
    }

    // -- Classification --

    /// Sets the present time and classifies the frame.
    ///
    /// `display_jank` is the enclosing cycle's classification; every bit of it
    /// is carried into this frame's jank set.
    pub(crate) fn finalize(
        &self,
        present_time: HostTime,
        display_jank: JankType,
        vsync_period: Duration,
    ) {
        let mut state = self.lock();
        debug_assert!(
            state.jank.is_none(),
            "surface frame {} finalized twice",
            self.layer_name
        );
        if state.present_state != PresentState::Dropped {
            state.actual_present = present_time;
        }
        let own = self.classify(&mut state, display_jank, vsync_period);
        state.jank = Some(own | display_jank);
    }

    /// Classifies the frame for a cycle whose present time will never be
    /// known. Metadata stays unknown.
    pub(crate) fn finalize_unknown(&self, display_jank: JankType) {
        let mut state = self.lock();
        debug_assert!(
            state.jank.is_none(),
            "surface frame {} finalized twice",
            self.layer_name
        );
        let own = if state.present_state == PresentState::Dropped {
            JankType::DROPPED
        } else {
            JankType::UNKNOWN
        };
        state.jank = Some(own | display_jank);
    }

    /// Fills in the metadata and returns this frame's own jank reasons.
    fn classify(
        &self,
        state: &mut SurfaceFrameState,
        display_jank: JankType,
        vsync_period: Duration,
    ) -> JankType {
        if state.present_state == PresentState::Dropped {
            return JankType::DROPPED;
        }
        match self.prediction_state {
            PredictionState::None => return JankType::empty(),
            PredictionState::Expired => return JankType::UNKNOWN,
            PredictionState::Valid => {}
        }

        let predictions = &self.predictions;
        let thresholds = &self.thresholds;
        state.start = state
            .actual_start
            .map_or(FrameStartMetadata::UnknownStart, |t| {
                classify_start(t, predictions.start_time, thresholds.start)
            });
        state.ready = state
            .actual_end()
            .map_or(FrameReadyMetadata::UnknownFinish, |t| {
                classify_ready(t, predictions.end_time, thresholds.deadline)
            });
        state.present = classify_present(
            state.actual_present,
            predictions.present_time,
            thresholds.present,
        );

        let present_delta = state.actual_present - predictions.present_time;
        let aligned = is_vsync_aligned(present_delta, vsync_period, thresholds.present);
        let mut jank = JankType::empty();
        match state.present {
            FramePresentMetadata::OnTimePresent | FramePresentMetadata::UnknownPresent => {}
            FramePresentMetadata::EarlyPresent => {
                jank |= match state.ready {
                    FrameReadyMetadata::OnTimeFinish if aligned => JankType::COMPOSITOR_SCHEDULING,
                    FrameReadyMetadata::OnTimeFinish => JankType::PREDICTION_ERROR,
                    _ => JankType::UNKNOWN,
                };
            }
            FramePresentMetadata::LatePresent => {
                // The previous buffer was latched after this one was due, so
                // this one sat in the queue behind it.
                if !state.last_latch.is_zero() && predictions.end_time <= state.last_latch {
                    jank |= JankType::BUFFER_STUFFING;
                }
                // A janky cycle explains the late present on its own.
                if display_jank.is_empty() {
                    match state.ready {
                        FrameReadyMetadata::OnTimeFinish
                            if jank.contains(JankType::BUFFER_STUFFING) => {}
                        FrameReadyMetadata::OnTimeFinish if aligned => {
                            jank |= JankType::COMPOSITOR_SCHEDULING;
                        }
                        FrameReadyMetadata::OnTimeFinish => jank |= JankType::PREDICTION_ERROR,
                        FrameReadyMetadata::LateFinish => jank |= JankType::APP_DEADLINE_MISSED,
                        FrameReadyMetadata::UnknownFinish => jank |= JankType::UNKNOWN,
                    }
                }
            }
        }
        jank
    }
}
