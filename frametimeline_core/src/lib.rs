// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame presentation timing and jank classification for display compositors.
//!
//! `frametimeline_core` records, for every compositor cycle, the timestamps a
//! timing predictor expected and the timestamps that actually happened,
//! groups per-layer submissions under the cycle they were composited into,
//! classifies the deviations into jank categories, and keeps a bounded
//! history for diagnostics and tracing.
//!
//! # Architecture
//!
//! ```text
//!   predictor ──► TokenManager::generate_token() ──► Token
//!                                                      │
//!        ┌─────────────────────────────────────────────┤
//!        ▼                                             ▼
//!   FrameTimeline::wake()                FrameTimeline::create_surface_frame()
//!        │                                             │
//!        ▼                                             ▼
//!   current DisplayFrame ◄──── FrameTimeline::attach(SurfaceFrame)
//!        │
//!        ▼
//!   FrameTimeline::present(fence) ──► pending ──► fence signals
//!        │                                          │
//!        ▼                                          ▼
//!   DisplayFrame::finalize ──► SurfaceFrame::finalize (inherits cycle jank)
//!        │
//!        ▼
//!   history ──► TimelineSnapshot / TraceSink / JankStats
//! ```
//!
//! **[`token`]** — [`TokenStore`](token::TokenStore), a prediction map with a
//! 120 ms retention window, behind the [`TokenManager`](token::TokenManager)
//! trait.
//!
//! **[`surface_frame`]** — One layer's frame: predictions, pipeline
//! timestamps, present state, classification. Guarded by its own lock.
//!
//! **[`display_frame`]** — One compositor cycle and its layer frames.
//!
//! **[`timeline`]** — [`FrameTimeline`](timeline::FrameTimeline), which
//! sequences cycles, polls present fences, and owns history.
//!
//! **[`timing`]** — Timeline items, prediction states, the
//! start/ready/present metadata, thresholds, and the comparison rules.
//!
//! **[`jank`]** — [`JankType`](jank::JankType) flag set.
//!
//! **[`fence`]** — [`PresentFence`](fence::PresentFence) polling trait and
//! the atomic [`FenceCell`](fence::FenceCell).
//!
//! **[`snapshot`]** — Owned, reproducible views for dumps.
//!
//! **[`trace`]** — Record types, the [`TraceSink`](trace::TraceSink) trait,
//! and the zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! **[`stats`]** — [`JankStats`](stats::JankStats) collector trait.
//!
//! **[`clock`]**, **[`time`]** — Nanosecond timestamps and clocks.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod clock;
pub mod display_frame;
pub mod fence;
pub mod jank;
pub mod snapshot;
pub mod stats;
pub mod surface_frame;
pub mod time;
pub mod timeline;
pub mod timing;
pub mod token;
pub mod trace;
