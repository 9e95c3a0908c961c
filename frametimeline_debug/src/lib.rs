// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, Chrome trace export, and text dumps for frame
//! timeline diagnostics.
//!
//! The sinks implement [`TraceSink`](frametimeline_core::trace::TraceSink)
//! for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-frame output.
//! - [`recorder::RecorderSink`] — compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from recorded
//!   bytes, with expected and actual timeline slices per frame.
//!
//! [`dump`] renders [`TimelineSnapshot`](frametimeline_core::snapshot::TimelineSnapshot)s
//! as text, selected by `-all` / `-jank` arguments.

pub mod chrome;
pub mod dump;
pub mod pretty;
pub mod recorder;

#[cfg(test)]
pub(crate) mod test_support;
