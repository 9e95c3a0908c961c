// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The timeline orchestrator.
//!
//! [`FrameTimeline`] sequences compositor cycles: it resolves prediction
//! tokens, builds the current [`DisplayFrame`], parks presented cycles until
//! their present fence signals, and keeps a bounded history of finalized
//! cycles for diagnostics.
//!
//! # Lock domains
//!
//! - The token manager has its own lock; tokens are resolved before the
//!   timeline lock is taken.
//! - The timeline lock guards the current cycle, the pending set, and
//!   history. Fences are polled under it, never waited on.
//! - Each [`SurfaceFrame`] has its own lock for pipeline writes.
//! - The [`Tracer`] has its own lock. Records are built under the timeline
//!   lock and dispatched after it is released.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use frametimeline_core::fence::FenceCell;
//! use frametimeline_core::surface_frame::PresentState;
//! use frametimeline_core::time::{Duration, HostTime};
//! use frametimeline_core::timeline::{FrameTimeline, TimelineConfig};
//! use frametimeline_core::timing::TimelineItem;
//! use frametimeline_core::token::TokenManager;
//!
//! let timeline = FrameTimeline::new(TimelineConfig::new());
//! let token = timeline
//!     .token_manager()
//!     .generate_token(TimelineItem::from_millis(0, 10, 20));
//!
//! timeline.wake(token, HostTime::from_millis(0), Duration::from_millis(11));
//! let layer = timeline.create_surface_frame(Some(token), 42, 10_042, "Main#0", "Main");
//! layer.set_actual_queue_time(HostTime::from_millis(8));
//! layer.set_present_state(PresentState::Presented, HostTime::ZERO);
//! timeline.attach(Arc::clone(&layer));
//!
//! let fence = Arc::new(FenceCell::new());
//! timeline.present(HostTime::from_millis(10), Some(fence.clone()));
//! assert_eq!(timeline.pending_len(), 1);
//!
//! fence.signal(HostTime::from_millis(20));
//! timeline.flush_pending();
//! assert_eq!(timeline.history_len(), 1);
//! assert!(layer.jank_type().is_some());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::display_frame::DisplayFrame;
use crate::fence::{FenceStatus, PresentFence};
use crate::snapshot::{DumpFilter, TimelineSnapshot};
use crate::stats::JankStats;
use crate::surface_frame::SurfaceFrame;
use crate::time::{Duration, HostTime};
use crate::timing::JankThresholds;
use crate::token::{Token, TokenManager, TokenStore};
use crate::trace::{DisplayFrameRecord, SurfaceFrameRecord, TraceSink, Tracer};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`FrameTimeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Classification tolerances. Fixed for the timeline's lifetime.
    pub thresholds: JankThresholds,
    /// Number of finalized cycles retained in history.
    pub max_display_frames: usize,
    /// Bound on cycles awaiting a present fence. When exceeded, the oldest
    /// is finalized as an unknown present. `None` leaves the pending set
    /// unbounded.
    pub max_pending_presents: Option<usize>,
    /// Process id of the compositor, copied into display-frame records.
    pub compositor_pid: u32,
}

impl TimelineConfig {
    /// Default history capacity.
    pub const DEFAULT_MAX_DISPLAY_FRAMES: usize = 64;

    /// Default configuration: 2 ms thresholds, 64 retained cycles, no
    /// pending bound.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            thresholds: JankThresholds::new(),
            max_display_frames: Self::DEFAULT_MAX_DISPLAY_FRAMES,
            max_pending_presents: None,
            compositor_pid: 0,
        }
    }

    /// Configuration for tests and trace replay: small history, and a pending
    /// bound so a lost fence cannot grow memory.
    #[must_use]
    pub const fn bounded() -> Self {
        Self::new()
            .with_max_display_frames(8)
            .with_max_pending_presents(4)
    }

    /// Sets the classification tolerances.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: JankThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the history capacity.
    #[must_use]
    pub const fn with_max_display_frames(mut self, max: usize) -> Self {
        self.max_display_frames = max;
        self
    }

    /// Bounds the pending set.
    #[must_use]
    pub const fn with_max_pending_presents(mut self, max: usize) -> Self {
        self.max_pending_presents = Some(max);
        self
    }

    /// Sets the compositor process id.
    #[must_use]
    pub const fn with_compositor_pid(mut self, pid: u32) -> Self {
        self.compositor_pid = pid;
        self
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

struct PendingPresent {
    fence: Arc<dyn PresentFence>,
    frame: DisplayFrame,
}

/// Records of frames finalized under the lock, dispatched after release.
struct Outbox {
    enabled: bool,
    frames: Vec<(DisplayFrameRecord, Vec<SurfaceFrameRecord>)>,
}

impl Outbox {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            frames: Vec::new(),
        }
    }

    fn push(&mut self, frame: &DisplayFrame) {
        if self.enabled {
            self.frames.push((frame.record(), frame.surface_records()));
        }
    }
}

struct TimelineState {
    current: Option<DisplayFrame>,
    history: VecDeque<DisplayFrame>,
    pending: VecDeque<PendingPresent>,
    max_display_frames: usize,
}

impl TimelineState {
    /// Moves a finalized cycle into history, evicting the oldest at capacity.
    fn retire(&mut self, frame: DisplayFrame, outbox: &mut Outbox) {
        outbox.push(&frame);
        if self.max_display_frames == 0 {
            self.history.clear();
            return;
        }
        while self.history.len() >= self.max_display_frames {
            if let Some(evicted) = self.history.pop_front() {
                tracing::debug!(token = %evicted.token(), "evicted display frame from history");
            }
        }
        self.history.push_back(frame);
    }

    /// Finalizes every pending cycle whose fence has resolved.
    fn flush_pending(&mut self, outbox: &mut Outbox) {
        let pending = std::mem::take(&mut self.pending);
        for PendingPresent { fence, mut frame } in pending {
            match fence.status() {
                FenceStatus::Pending => self.pending.push_back(PendingPresent { fence, frame }),
                FenceStatus::Signaled(present_time) => {
                    frame.finalize(present_time);
                    self.retire(frame, outbox);
                }
                FenceStatus::Invalid => {
                    tracing::debug!(token = %frame.token(), "present fence is invalid");
                    frame.finalize_unknown();
                    self.retire(frame, outbox);
                }
            }
        }
    }

    /// Finalizes the oldest pending cycles until at most `max` remain.
    fn bound_pending(&mut self, max: usize, outbox: &mut Outbox) {
        while self.pending.len() > max {
            let Some(PendingPresent { mut frame, .. }) = self.pending.pop_front() else {
                break;
            };
            tracing::debug!(
                token = %frame.token(),
                max,
                "pending presents over capacity, finalizing oldest as unknown"
            );
            frame.finalize_unknown();
            self.retire(frame, outbox);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameTimeline
// ---------------------------------------------------------------------------

/// Tracks compositor cycles and the layer frames composited into them.
///
/// All methods take `&self`; share the timeline between the compositor
/// thread and buffer-submission threads behind an [`Arc`].
pub struct FrameTimeline<T: TokenManager = TokenStore> {
    config: TimelineConfig,
    token_manager: T,
    state: Mutex<TimelineState>,
    tracer: Mutex<Tracer>,
    stats: Option<Arc<dyn JankStats>>,
}

impl<T: TokenManager + fmt::Debug> fmt::Debug for FrameTimeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTimeline")
            .field("config", &self.config)
            .field("token_manager", &self.token_manager)
            .field("history_len", &self.history_len())
            .field("pending_len", &self.pending_len())
            .finish_non_exhaustive()
    }
}

impl FrameTimeline {
    /// Creates a timeline with its own [`TokenStore`].
    #[must_use]
    pub fn new(config: TimelineConfig) -> Self {
        Self::with_token_manager(config, TokenStore::new())
    }
}

impl<T: TokenManager> FrameTimeline<T> {
    /// Creates a timeline that resolves tokens through `token_manager`.
    #[must_use]
    pub fn with_token_manager(config: TimelineConfig, token_manager: T) -> Self {
        Self {
            config,
            token_manager,
            state: Mutex::new(TimelineState {
                current: None,
                history: VecDeque::new(),
                pending: VecDeque::new(),
                max_display_frames: config.max_display_frames,
            }),
            tracer: Mutex::new(Tracer::none()),
            stats: None,
        }
    }

    /// Sends finalized-frame records to `sink`.
    ///
    /// Records only flow when the `trace` feature is enabled.
    #[must_use]
    pub fn with_trace_sink(self, sink: Box<dyn TraceSink + Send>) -> Self {
        self.set_tracer(Tracer::new(sink));
        self
    }

    /// Sends every finalized frame to `stats`.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<dyn JankStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Replaces the tracer.
    pub fn set_tracer(&self, tracer: Tracer) {
        *self.tracer.lock().unwrap_or_else(PoisonError::into_inner) = tracer;
    }

    /// The token manager predictions are resolved through.
    pub fn token_manager(&self) -> &T {
        &self.token_manager
    }

    /// The configuration this timeline was created with.
    #[must_use]
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, TimelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_display_frame(&self) -> DisplayFrame {
        DisplayFrame::new(self.config.thresholds, self.config.compositor_pid)
    }

    fn outbox(&self) -> Outbox {
        let traced = self
            .tracer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_enabled();
        Outbox::new(traced || self.stats.is_some())
    }

    fn dispatch(&self, outbox: Outbox) {
        if outbox.frames.is_empty() {
            return;
        }
        {
            let mut tracer = self.tracer.lock().unwrap_or_else(PoisonError::into_inner);
            for (display, surfaces) in &outbox.frames {
                tracer.display_frame(display);
                for surface in surfaces {
                    tracer.surface_frame(surface);
                }
            }
        }
        if let Some(stats) = &self.stats {
            for (display, surfaces) in &outbox.frames {
                stats.record_display_frame(display);
                for surface in surfaces {
                    stats.record_surface_frame(surface);
                }
            }
        }
    }

    // -- Cycle lifecycle --

    /// Starts the current cycle.
    ///
    /// Creates the current cycle if no layer frame has created it yet.
    pub fn wake(&self, token: Token, wakeup_time: HostTime, vsync_period: Duration) {
        let resolved = self.token_manager.resolve_state(Some(token));
        let mut state = self.lock();
        state
            .current
            .get_or_insert_with(|| self.new_display_frame())
            .begin(token, resolved, wakeup_time, vsync_period);
    }

    /// Creates a layer frame seeded with the predictions behind `token`.
    ///
    /// The frame belongs to no cycle until it is [attached](Self::attach).
    pub fn create_surface_frame(
        &self,
        token: Option<Token>,
        owner_pid: u32,
        owner_uid: u32,
        layer_name: impl Into<String>,
        debug_name: impl Into<String>,
    ) -> Arc<SurfaceFrame> {
        let (prediction_state, predictions) = self.token_manager.resolve_state(token);
        Arc::new(SurfaceFrame::new(
            token,
            owner_pid,
            owner_uid,
            layer_name.into(),
            debug_name.into(),
            prediction_state,
            predictions,
            self.config.thresholds,
        ))
    }

    /// Attaches a layer frame to the current cycle, creating the cycle if the
    /// compositor has not woken yet.
    pub fn attach(&self, surface_frame: Arc<SurfaceFrame>) {
        let mut state = self.lock();
        state
            .current
            .get_or_insert_with(|| self.new_display_frame())
            .attach(surface_frame);
    }

    /// Marks the current cycle as composited on the GPU.
    pub fn set_gpu_composition(&self, gpu_composition: bool) {
        let mut state = self.lock();
        match &mut state.current {
            Some(frame) => frame.set_gpu_composition(gpu_composition),
            None => tracing::debug!("gpu composition set without a current cycle"),
        }
    }

    /// Ends the current cycle.
    ///
    /// `sf_present_time` is when the compositor handed the frame to the
    /// display. Without a fence the cycle is finalized with that time at
    /// once. With a fence the cycle is parked until the fence signals. Either
    /// way, pending cycles whose fences have resolved are finalized.
    pub fn present(&self, sf_present_time: HostTime, fence: Option<Arc<dyn PresentFence>>) {
        let mut outbox = self.outbox();
        {
            let mut state = self.lock();
            match state.current.take() {
                None => tracing::debug!("present without a current cycle"),
                Some(mut frame) => {
                    frame.set_actual_end_time(sf_present_time);
                    match fence {
                        Some(fence) => state.pending.push_back(PendingPresent { fence, frame }),
                        None => {
                            state.flush_pending(&mut outbox);
                            frame.finalize(sf_present_time);
                            state.retire(frame, &mut outbox);
                        }
                    }
                }
            }
            state.flush_pending(&mut outbox);
            if let Some(max) = self.config.max_pending_presents {
                state.bound_pending(max, &mut outbox);
            }
        }
        self.dispatch(outbox);
    }

    /// Finalizes pending cycles whose fences have resolved.
    pub fn flush_pending(&self) {
        let mut outbox = self.outbox();
        self.lock().flush_pending(&mut outbox);
        self.dispatch(outbox);
    }

    // -- History --

    /// Sets how many finalized cycles are retained.
    ///
    /// Existing history is trimmed on the next insertion, not now.
    pub fn set_history_capacity(&self, capacity: usize) {
        self.lock().max_display_frames = capacity;
    }

    /// Restores the configured history capacity.
    ///
    /// Like [`set_history_capacity`](Self::set_history_capacity), this takes
    /// effect on the next insertion.
    pub fn reset_history_capacity(&self) {
        self.lock().max_display_frames = self.config.max_display_frames;
    }

    /// Current history capacity.
    #[must_use]
    pub fn history_capacity(&self) -> usize {
        self.lock().max_display_frames
    }

    /// Number of finalized cycles retained.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Number of cycles awaiting a present fence.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Captures an owned view of history and pending cycles.
    ///
    /// Pending cycles whose fences have resolved are finalized first.
    #[must_use]
    pub fn snapshot(&self, filter: DumpFilter) -> TimelineSnapshot {
        let mut outbox = self.outbox();
        let snapshot = {
            let mut state = self.lock();
            state.flush_pending(&mut outbox);
            TimelineSnapshot::capture(
                state.history.iter(),
                state.pending.iter().map(|p| &p.frame),
                filter,
            )
        };
        self.dispatch(outbox);
        snapshot
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
