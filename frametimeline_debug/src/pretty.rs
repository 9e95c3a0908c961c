// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per
//! finalized frame to a [`Write`](std::io::Write) destination (default:
//! stderr). Times are printed in milliseconds; actual times are followed by
//! their delta from the prediction when one exists.

use std::io::Write;

use frametimeline_core::jank::JankType;
use frametimeline_core::time::HostTime;
use frametimeline_core::timing::PredictionState;
use frametimeline_core::trace::{DisplayFrameRecord, SurfaceFrameRecord, TraceSink};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.0 as f64 / 1_000_000.0
}

/// `12.000ms (+5.000)` with predictions, `12.000ms` without.
fn actual_vs_predicted(state: PredictionState, actual: HostTime, predicted: HostTime) -> String {
    if actual.is_zero() {
        return "-".to_owned();
    }
    if state == PredictionState::Valid {
        let delta = (actual - predicted).as_millis_f64();
        format!("{:.3}ms ({delta:+.3})", ms(actual))
    } else {
        format!("{:.3}ms", ms(actual))
    }
}

fn jank_label(jank: Option<JankType>) -> String {
    match jank {
        Some(j) if j.is_janky() => format!("JANK[{j}]"),
        Some(_) => "ok".to_owned(),
        None => "?".to_owned(),
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_display_frame(&mut self, e: &DisplayFrameRecord) {
        let _ = writeln!(
            self.writer,
            "[display] token={} predictions={} start={} end={} present={} \
             layers={} gpu={} {}",
            e.token,
            e.prediction_state,
            actual_vs_predicted(
                e.prediction_state,
                e.actuals.start_time,
                e.predictions.start_time
            ),
            actual_vs_predicted(e.prediction_state, e.actuals.end_time, e.predictions.end_time),
            actual_vs_predicted(
                e.prediction_state,
                e.actuals.present_time,
                e.predictions.present_time
            ),
            e.surface_frame_count,
            e.gpu_composition,
            jank_label(e.jank),
        );
    }

    fn on_surface_frame(&mut self, e: &SurfaceFrameRecord) {
        let token = e
            .token
            .map_or_else(|| "none".to_owned(), |t| t.to_string());
        let _ = writeln!(
            self.writer,
            "[surface] layer={} token={token} display={} pid={} {} ready={} present={} {}",
            e.layer_name,
            e.display_frame_token,
            e.owner_pid,
            e.present_state,
            actual_vs_predicted(e.prediction_state, e.actuals.end_time, e.predictions.end_time),
            actual_vs_predicted(
                e.prediction_state,
                e.actuals.present_time,
                e.predictions.present_time
            ),
            jank_label(e.jank),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{display_record, dropped_surface_record, surface_record};

    fn printed(f: impl FnOnce(&mut PrettyPrintSink<Vec<u8>>)) -> String {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        f(&mut sink);
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn display_line_shows_deltas_and_jank() {
        let output = printed(|s| s.on_display_frame(&display_record()));
        assert!(output.starts_with("[display] token=3"), "got: {output}");
        assert!(output.contains("present=1031.000ms (+11.000)"), "got: {output}");
        assert!(output.contains("gpu=true"), "got: {output}");
        assert!(
            output.contains("JANK[Compositor GPU Deadline Missed]"),
            "got: {output}"
        );
    }

    #[test]
    fn surface_line_without_predictions() {
        let output = printed(|s| s.on_surface_frame(&dropped_surface_record()));
        assert!(output.contains("token=none"), "got: {output}");
        assert!(output.contains("Dropped"), "got: {output}");
        assert!(output.contains("ready=1005.000ms present=-"), "got: {output}");
    }

    #[test]
    fn one_line_per_event() {
        let output = printed(|s| {
            s.on_display_frame(&display_record());
            s.on_surface_frame(&surface_record());
        });
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn boxed_sink_is_a_tracer_sink() {
        let sink = PrettyPrintSink::new(Box::new(std::io::sink()));
        let _tracer = frametimeline_core::trace::Tracer::new(Box::new(sink));
    }
}
