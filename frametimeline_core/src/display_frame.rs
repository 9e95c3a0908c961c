// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One compositor cycle.
//!
//! A [`DisplayFrame`] aggregates the cycle's own predictions and actuals with
//! the [`SurfaceFrame`]s composited into it. Classification runs top-down:
//! the cycle classifies itself first, then hands its jank set to every
//! attached layer frame.

use std::sync::Arc;

use crate::jank::JankType;
use crate::surface_frame::SurfaceFrame;
use crate::time::{Duration, HostTime};
use crate::timing::{
    FramePresentMetadata, FrameReadyMetadata, FrameStartMetadata, JankThresholds,
    PredictionState, TimelineItem, classify_present, classify_ready, classify_start,
    is_vsync_aligned, min_time,
};
use crate::token::Token;
use crate::trace::{DisplayFrameRecord, SurfaceFrameRecord};

/// Timing record for one compositor cycle.
///
/// Owned by the timeline; readers get [`DisplayFrameRecord`]s.
#[derive(Debug)]
pub struct DisplayFrame {
    token: Token,
    compositor_pid: u32,
    vsync_period: Duration,
    prediction_state: PredictionState,
    predictions: TimelineItem,
    actuals: TimelineItem,
    thresholds: JankThresholds,
    gpu_composition: bool,
    start: FrameStartMetadata,
    ready: FrameReadyMetadata,
    present: FramePresentMetadata,
    jank: Option<JankType>,
    surface_frames: Vec<Arc<SurfaceFrame>>,
}

impl DisplayFrame {
    /// Creates a cycle that has not woken yet.
    ///
    /// A layer frame can arrive before the compositor wakes; the cycle exists
    /// from that point and is filled in by [`begin`](Self::begin).
    pub(crate) fn new(thresholds: JankThresholds, compositor_pid: u32) -> Self {
        Self {
            token: Token::INVALID,
            compositor_pid,
            vsync_period: Duration::ZERO,
            prediction_state: PredictionState::None,
            predictions: TimelineItem::default(),
            actuals: TimelineItem::default(),
            thresholds,
            gpu_composition: false,
            start: FrameStartMetadata::default(),
            ready: FrameReadyMetadata::default(),
            present: FramePresentMetadata::default(),
            jank: None,
            surface_frames: Vec::new(),
        }
    }

    /// Records the cycle's identity and its actual start.
    pub(crate) fn begin(
        &mut self,
        token: Token,
        (prediction_state, predictions): (PredictionState, TimelineItem),
        wakeup_time: HostTime,
        vsync_period: Duration,
    ) {
        self.token = token;
        self.prediction_state = prediction_state;
        self.predictions = predictions;
        self.actuals.start_time = wakeup_time;
        self.vsync_period = vsync_period;
    }

    /// Appends a layer frame; submission order is kept.
    pub(crate) fn attach(&mut self, surface_frame: Arc<SurfaceFrame>) {
        debug_assert!(self.jank.is_none(), "attach after finalize");
        self.surface_frames.push(surface_frame);
    }

    /// Records when the compositor handed the frame to the display.
    pub(crate) fn set_actual_end_time(&mut self, t: HostTime) {
        self.actuals.end_time = t;
    }

    pub(crate) fn set_gpu_composition(&mut self, gpu_composition: bool) {
        self.gpu_composition = gpu_composition;
    }

    // -- Accessors --

    /// The cycle's prediction token, or [`Token::INVALID`].
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    /// Whether the cycle had predictions.
    #[must_use]
    pub fn prediction_state(&self) -> PredictionState {
        self.prediction_state
    }

    /// Predicted wake-up, hand-off, and present times.
    #[must_use]
    pub fn predictions(&self) -> TimelineItem {
        self.predictions
    }

    /// Actual wake-up, hand-off, and present times.
    #[must_use]
    pub fn actuals(&self) -> TimelineItem {
        self.actuals
    }

    /// Vsync period observed during the cycle.
    #[must_use]
    pub fn vsync_period(&self) -> Duration {
        self.vsync_period
    }

    /// Whether the cycle was composited on the GPU.
    #[must_use]
    pub fn gpu_composition(&self) -> bool {
        self.gpu_composition
    }

    /// Jank reasons, or `None` until finalized.
    #[must_use]
    pub fn jank_type(&self) -> Option<JankType> {
        self.jank
    }

    /// Start classification.
    #[must_use]
    pub fn start_metadata(&self) -> FrameStartMetadata {
        self.start
    }

    /// Finish classification.
    #[must_use]
    pub fn ready_metadata(&self) -> FrameReadyMetadata {
        self.ready
    }

    /// Present classification.
    #[must_use]
    pub fn present_metadata(&self) -> FramePresentMetadata {
        self.present
    }

    /// Layer frames in submission order.
    #[must_use]
    pub fn surface_frames(&self) -> &[Arc<SurfaceFrame>] {
        &self.surface_frames
    }

    /// Returns `true` if the cycle or any of its layer frames is janky.
    #[must_use]
    pub fn is_janky(&self) -> bool {
        self.jank.is_some_and(JankType::is_janky)
            || self
                .surface_frames
                .iter()
                .any(|sf| sf.jank_type().is_some_and(JankType::is_janky))
    }

    /// Smallest recorded timestamp across the cycle and its layer frames.
    #[must_use]
    pub fn base_time(&self) -> Option<HostTime> {
        let own = min_time(self.prediction_state, &self.predictions, &self.actuals);
        self.surface_frames
            .iter()
            .filter_map(|sf| sf.base_time())
            .chain(own)
            .min()
    }

    /// Snapshot of the cycle for traces and dumps.
    #[must_use]
    pub fn record(&self) -> DisplayFrameRecord {
        DisplayFrameRecord {
            token: self.token,
            compositor_pid: self.compositor_pid,
            vsync_period: self.vsync_period,
            prediction_state: self.prediction_state,
            predictions: self.predictions,
            actuals: self.actuals,
            start: self.start,
            ready: self.ready,
            present: self.present,
            jank: self.jank,
            gpu_composition: self.gpu_composition,
            surface_frame_count: self.surface_frames.len(),
        }
    }

    /// Snapshots of the layer frames, tagged with this cycle's token.
    #[must_use]
    pub fn surface_records(&self) -> Vec<SurfaceFrameRecord> {
        self.surface_frames
            .iter()
            .map(|sf| sf.record(self.token))
            .collect()
    }

    // -- Finalize --

    /// Sets the present time, classifies the cycle, and then every attached
    /// layer frame.
    ///
    /// If no hand-off time was recorded, the present time stands in for it.
    pub(crate) fn finalize(&mut self, present_time: HostTime) {
        debug_assert!(self.jank.is_none(), "display frame {} finalized twice", self.token);
        self.actuals.present_time = present_time;
        if self.actuals.end_time.is_zero() {
            self.actuals.end_time = present_time;
        }
        let jank = self.classify();
        self.jank = Some(jank);
        for sf in &self.surface_frames {
            sf.set_gpu_composition(self.gpu_composition);
            sf.finalize(present_time, jank, self.vsync_period);
        }
    }

    /// Finalizes a cycle whose present fence will never signal.
    pub(crate) fn finalize_unknown(&mut self) {
        debug_assert!(self.jank.is_none(), "display frame {} finalized twice", self.token);
        self.present = FramePresentMetadata::UnknownPresent;
        self.jank = Some(JankType::UNKNOWN);
        for sf in &self.surface_frames {
            sf.set_gpu_composition(self.gpu_composition);
            sf.finalize_unknown(JankType::UNKNOWN);
        }
    }

    fn classify(&mut self) -> JankType {
        match self.prediction_state {
            PredictionState::None => return JankType::empty(),
            PredictionState::Expired => return JankType::UNKNOWN,
            PredictionState::Valid => {}
        }

        let predictions = self.predictions;
        let actuals = self.actuals;
        let thresholds = self.thresholds;
        self.start = classify_start(actuals.start_time, predictions.start_time, thresholds.start);
        self.ready = if actuals.end_time.is_zero() {
            FrameReadyMetadata::UnknownFinish
        } else {
            classify_ready(actuals.end_time, predictions.end_time, thresholds.deadline)
        };
        self.present = classify_present(
            actuals.present_time,
            predictions.present_time,
            thresholds.present,
        );

        let present_delta = actuals.present_time - predictions.present_time;
        let aligned = is_vsync_aligned(present_delta, self.vsync_period, thresholds.present);
        match (self.present, self.ready) {
            (FramePresentMetadata::OnTimePresent | FramePresentMetadata::UnknownPresent, _) => {
                JankType::empty()
            }
            (_, FrameReadyMetadata::UnknownFinish) => JankType::UNKNOWN,
            (FramePresentMetadata::EarlyPresent, FrameReadyMetadata::OnTimeFinish) => {
                if aligned {
                    JankType::COMPOSITOR_SCHEDULING
                } else {
                    JankType::PREDICTION_ERROR
                }
            }
            (FramePresentMetadata::EarlyPresent, FrameReadyMetadata::LateFinish) => {
                JankType::COMPOSITOR_SCHEDULING
            }
            (FramePresentMetadata::LatePresent, FrameReadyMetadata::OnTimeFinish) => {
                // Composition was on time and the frame still landed on a
                // later vsync: the display held it.
                if aligned {
                    JankType::DISPLAY_HAL
                } else {
                    JankType::PREDICTION_ERROR
                }
            }
            (FramePresentMetadata::LatePresent, FrameReadyMetadata::LateFinish) => {
                if self.start == FrameStartMetadata::LateStart {
                    JankType::COMPOSITOR_SCHEDULING
                } else if self.gpu_composition {
                    JankType::COMPOSITOR_GPU_DEADLINE_MISSED
                } else {
                    JankType::COMPOSITOR_CPU_DEADLINE_MISSED
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface_frame::PresentState;
    use crate::surface_frame::tests::frame;

    const VSYNC: Duration = Duration::from_millis(11);

    fn woken(predictions: TimelineItem, wakeup_ms: i64) -> DisplayFrame {
        let mut df = DisplayFrame::new(JankThresholds::default(), 1000);
        df.begin(
            Token(7),
            (PredictionState::Valid, predictions),
            HostTime::from_millis(wakeup_ms),
            VSYNC,
        );
        df
    }

    fn finalized(wakeup: i64, end: i64, present: i64, gpu: bool) -> DisplayFrame {
        let mut df = woken(TimelineItem::from_millis(0, 10, 20), wakeup);
        df.set_actual_end_time(HostTime::from_millis(end));
        df.set_gpu_composition(gpu);
        df.finalize(HostTime::from_millis(present));
        df
    }

    #[test]
    fn on_time_cycle_has_no_jank() {
        let df = finalized(0, 10, 20, false);
        assert_eq!(df.jank_type(), Some(JankType::empty()));
        assert_eq!(df.start_metadata(), FrameStartMetadata::OnTimeStart);
        assert_eq!(df.ready_metadata(), FrameReadyMetadata::OnTimeFinish);
        assert_eq!(df.present_metadata(), FramePresentMetadata::OnTimePresent);
        assert!(!df.is_janky());
    }

    #[test]
    fn late_present_with_on_time_finish() {
        assert_eq!(
            finalized(0, 10, 31, false).jank_type(),
            Some(JankType::DISPLAY_HAL)
        );
        assert_eq!(
            finalized(0, 10, 25, false).jank_type(),
            Some(JankType::PREDICTION_ERROR)
        );
    }

    #[test]
    fn late_finish_blames_composition_path() {
        assert_eq!(
            finalized(0, 20, 31, false).jank_type(),
            Some(JankType::COMPOSITOR_CPU_DEADLINE_MISSED)
        );
        assert_eq!(
            finalized(0, 20, 31, true).jank_type(),
            Some(JankType::COMPOSITOR_GPU_DEADLINE_MISSED)
        );
        let late_start = finalized(5, 20, 31, true);
        assert_eq!(late_start.start_metadata(), FrameStartMetadata::LateStart);
        assert_eq!(late_start.jank_type(), Some(JankType::COMPOSITOR_SCHEDULING));
    }

    #[test]
    fn early_present() {
        assert_eq!(
            finalized(0, 5, 9, false).jank_type(),
            Some(JankType::COMPOSITOR_SCHEDULING)
        );
        assert_eq!(
            finalized(0, 5, 14, false).jank_type(),
            Some(JankType::PREDICTION_ERROR)
        );
    }

    #[test]
    fn missing_end_time_defaults_to_present() {
        let mut df = woken(TimelineItem::from_millis(0, 10, 20), 0);
        df.finalize(HostTime::from_millis(20));
        assert_eq!(df.actuals().end_time, HostTime::from_millis(20));
        assert_eq!(df.ready_metadata(), FrameReadyMetadata::LateFinish);
    }

    #[test]
    fn unwoken_cycle_degrades_gracefully() {
        let mut df = DisplayFrame::new(JankThresholds::default(), 1000);
        df.finalize(HostTime::from_millis(20));
        assert_eq!(df.token(), Token::INVALID);
        assert_eq!(df.jank_type(), Some(JankType::empty()));
        assert_eq!(df.present_metadata(), FramePresentMetadata::UnknownPresent);
    }

    #[test]
    fn expired_predictions_are_unknown_jank() {
        let mut df = DisplayFrame::new(JankThresholds::default(), 1000);
        df.begin(
            Token(3),
            (PredictionState::Expired, TimelineItem::default()),
            HostTime::from_millis(1),
            VSYNC,
        );
        df.finalize(HostTime::from_millis(20));
        assert_eq!(df.jank_type(), Some(JankType::UNKNOWN));
    }

    #[test]
    fn layer_frames_inherit_cycle_jank_in_order() {
        let mut df = woken(TimelineItem::from_millis(0, 10, 20), 0);
        let a = Arc::new(frame(
            PredictionState::Valid,
            TimelineItem::from_millis(0, 10, 20),
        ));
        a.set_actual_queue_time(HostTime::from_millis(10));
        a.set_present_state(PresentState::Presented, HostTime::ZERO);
        let b = Arc::new(frame(PredictionState::None, TimelineItem::default()));
        df.attach(Arc::clone(&a));
        df.attach(Arc::clone(&b));
        df.set_actual_end_time(HostTime::from_millis(20));
        df.set_gpu_composition(true);
        df.finalize(HostTime::from_millis(31));

        assert_eq!(
            df.jank_type(),
            Some(JankType::COMPOSITOR_GPU_DEADLINE_MISSED)
        );
        for sf in df.surface_frames() {
            let jank = sf.jank_type().unwrap_or_default();
            assert!(
                jank.contains(JankType::COMPOSITOR_GPU_DEADLINE_MISSED),
                "{jank}"
            );
            assert!(sf.gpu_composition());
        }
        assert!(Arc::ptr_eq(&df.surface_frames()[0], &a));
        let records = df.surface_records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.display_frame_token == Token(7)));
        assert_eq!(df.record().surface_frame_count, 2);
    }

    #[test]
    fn janky_if_any_layer_is_janky() {
        let mut df = woken(TimelineItem::from_millis(0, 10, 20), 0);
        let sf = Arc::new(frame(
            PredictionState::Valid,
            TimelineItem::from_millis(0, 10, 20),
        ));
        sf.set_present_state(PresentState::Dropped, HostTime::ZERO);
        df.attach(sf);
        df.set_actual_end_time(HostTime::from_millis(10));
        df.finalize(HostTime::from_millis(20));
        assert_eq!(df.jank_type(), Some(JankType::empty()));
        assert!(df.is_janky());
    }

    #[test]
    fn unknown_present_propagates() {
        let mut df = woken(TimelineItem::from_millis(0, 10, 20), 0);
        let sf = Arc::new(frame(
            PredictionState::Valid,
            TimelineItem::from_millis(0, 10, 20),
        ));
        df.attach(Arc::clone(&sf));
        df.finalize_unknown();
        assert_eq!(df.jank_type(), Some(JankType::UNKNOWN));
        assert_eq!(sf.jank_type(), Some(JankType::UNKNOWN));
    }

    #[test]
    fn base_time_includes_layer_frames() {
        let mut df = woken(TimelineItem::from_millis(5, 10, 20), 6);
        let sf = Arc::new(frame(
            PredictionState::Valid,
            TimelineItem::from_millis(2, 10, 20),
        ));
        df.attach(sf);
        assert_eq!(df.base_time(), Some(HostTime::from_millis(2)));
    }
}
