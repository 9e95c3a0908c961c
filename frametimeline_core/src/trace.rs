// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame timeline trace events.
//!
//! Every finalized compositor cycle produces one [`DisplayFrameRecord`], and
//! every layer frame composited into it produces one [`SurfaceFrameRecord`]
//! carrying the cycle's token so the two can be joined downstream. Records are
//! emitted after classification, so they always carry the final jank set.
//!
//! [`TraceSink`] receives the records. All methods default to no-ops.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and the sink is dropped
//! on construction. When **on**, each method performs a single `Option`
//! branch before dispatching.
//!
//! The same record types back timeline snapshots and the statistics
//! collector, so they also describe frames that are not yet classified; for
//! those, `jank` is `None`.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use crate::jank::JankType;
use crate::surface_frame::PresentState;
use crate::time::{Duration, HostTime};
use crate::timing::{
    FramePresentMetadata, FrameReadyMetadata, FrameStartMetadata, PredictionState, TimelineItem,
};
use crate::token::Token;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Timing and classification of one compositor cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayFrameRecord {
    /// The cycle's prediction token, or [`Token::INVALID`] if the cycle never
    /// woke with one.
    pub token: Token,
    /// Process id of the compositor, for correlating with other traces.
    pub compositor_pid: u32,
    /// Vsync period observed during the cycle.
    pub vsync_period: Duration,
    /// Whether the cycle had predictions.
    pub prediction_state: PredictionState,
    /// Predicted wake-up, hand-off, and present times.
    pub predictions: TimelineItem,
    /// Actual wake-up, hand-off, and present times.
    pub actuals: TimelineItem,
    /// Start classification.
    pub start: FrameStartMetadata,
    /// Finish classification.
    pub ready: FrameReadyMetadata,
    /// Present classification.
    pub present: FramePresentMetadata,
    /// Jank reasons, or `None` while the cycle awaits its present fence.
    pub jank: Option<JankType>,
    /// Whether the cycle was composited on the GPU.
    pub gpu_composition: bool,
    /// Number of layer frames composited into the cycle.
    pub surface_frame_count: usize,
}

impl DisplayFrameRecord {
    /// Returns `true` if the cycle was classified as janky.
    #[must_use]
    pub fn is_janky(&self) -> bool {
        self.jank.is_some_and(JankType::is_janky)
    }
}

/// Timing and classification of one layer's frame within a cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceFrameRecord {
    /// The frame's own prediction token, if the layer supplied one.
    pub token: Option<Token>,
    /// Token of the compositor cycle the frame was composited into.
    pub display_frame_token: Token,
    /// Process id of the layer's owner.
    pub owner_pid: u32,
    /// User id of the layer's owner.
    pub owner_uid: u32,
    /// Name of the layer.
    pub layer_name: String,
    /// Human-readable name for diagnostics.
    pub debug_name: String,
    /// Whether the buffer was presented or dropped.
    pub present_state: PresentState,
    /// Whether the frame had predictions.
    pub prediction_state: PredictionState,
    /// Predicted start, ready, and present times.
    pub predictions: TimelineItem,
    /// Actual start, ready, and present times.
    pub actuals: TimelineItem,
    /// When the previous buffer of the same layer was latched.
    pub last_latch_time: HostTime,
    /// Start classification.
    pub start: FrameStartMetadata,
    /// Finish classification.
    pub ready: FrameReadyMetadata,
    /// Present classification.
    pub present: FramePresentMetadata,
    /// Jank reasons, or `None` before the enclosing cycle is finalized.
    pub jank: Option<JankType>,
    /// Whether the enclosing cycle was composited on the GPU.
    pub gpu_composition: bool,
}

impl SurfaceFrameRecord {
    /// Returns `true` if the frame was classified as janky.
    #[must_use]
    pub fn is_janky(&self) -> bool {
        self.jank.is_some_and(JankType::is_janky)
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives frame timeline records.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called once per finalized compositor cycle, before its layer frames.
    fn on_display_frame(&mut self, e: &DisplayFrameRecord) {
        _ = e;
    }

    /// Called once per finalized layer frame.
    fn on_surface_frame(&mut self, e: &SurfaceFrameRecord) {
        _ = e;
    }
}

impl<A: TraceSink, B: TraceSink> TraceSink for (A, B) {
    fn on_display_frame(&mut self, e: &DisplayFrameRecord) {
        self.0.on_display_frame(e);
        self.1.on_display_frame(e);
    }

    fn on_surface_frame(&mut self, e: &SurfaceFrameRecord) {
        self.0.on_surface_frame(e);
        self.1.on_surface_frame(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Owner of an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink + Send>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::none()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink + Send>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {}
        }
    }

    /// Returns `true` if events will reach a sink.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`DisplayFrameRecord`].
    #[inline]
    pub fn display_frame(&mut self, e: &DisplayFrameRecord) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_display_frame(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceFrameRecord`].
    #[inline]
    pub fn surface_frame(&mut self, e: &SurfaceFrameRecord) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface_frame(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
