// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sample records shared by the sink tests.

use frametimeline_core::jank::JankType;
use frametimeline_core::surface_frame::PresentState;
use frametimeline_core::time::{Duration, HostTime};
use frametimeline_core::timing::{
    FramePresentMetadata, FrameReadyMetadata, FrameStartMetadata, PredictionState, TimelineItem,
};
use frametimeline_core::token::Token;
use frametimeline_core::trace::{DisplayFrameRecord, SurfaceFrameRecord};

/// A late, GPU-composited cycle at t = 1 s.
pub(crate) fn display_record() -> DisplayFrameRecord {
    DisplayFrameRecord {
        token: Token(3),
        compositor_pid: 1000,
        vsync_period: Duration::from_millis(11),
        prediction_state: PredictionState::Valid,
        predictions: TimelineItem::from_millis(1000, 1010, 1020),
        actuals: TimelineItem::from_millis(1000, 1021, 1031),
        start: FrameStartMetadata::OnTimeStart,
        ready: FrameReadyMetadata::LateFinish,
        present: FramePresentMetadata::LatePresent,
        jank: Some(JankType::COMPOSITOR_GPU_DEADLINE_MISSED),
        gpu_composition: true,
        surface_frame_count: 1,
    }
}

/// The one layer frame of [`display_record`].
pub(crate) fn surface_record() -> SurfaceFrameRecord {
    SurfaceFrameRecord {
        token: Some(Token(2)),
        display_frame_token: Token(3),
        owner_pid: 42,
        owner_uid: 10_042,
        layer_name: "com.example/Main#0".into(),
        debug_name: "Main".into(),
        present_state: PresentState::Presented,
        prediction_state: PredictionState::Valid,
        predictions: TimelineItem::from_millis(996, 1008, 1020),
        actuals: TimelineItem::from_millis(997, 1007, 1031),
        last_latch_time: HostTime::from_millis(990),
        start: FrameStartMetadata::OnTimeStart,
        ready: FrameReadyMetadata::OnTimeFinish,
        present: FramePresentMetadata::LatePresent,
        jank: Some(JankType::COMPOSITOR_GPU_DEADLINE_MISSED),
        gpu_composition: true,
    }
}

/// A layer frame that never had predictions and was dropped.
pub(crate) fn dropped_surface_record() -> SurfaceFrameRecord {
    SurfaceFrameRecord {
        token: None,
        layer_name: "com.example/Overlay#1".into(),
        debug_name: "Overlay".into(),
        present_state: PresentState::Dropped,
        prediction_state: PredictionState::None,
        predictions: TimelineItem::default(),
        actuals: TimelineItem::new(HostTime::ZERO, HostTime::from_millis(1005), HostTime::ZERO),
        last_latch_time: HostTime::ZERO,
        start: FrameStartMetadata::UnknownStart,
        ready: FrameReadyMetadata::UnknownFinish,
        present: FramePresentMetadata::UnknownPresent,
        jank: Some(JankType::DROPPED),
        gpu_composition: false,
        ..surface_record()
    }
}
