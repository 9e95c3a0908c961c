// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Every frame becomes up to two complete (`"X"`) slices on its owner's
//! process track: an "Expected Timeline" slice spanning the predicted start
//! to the predicted present, and an "Actual Timeline" slice spanning the
//! actual start to the actual present, carrying the classification as args.
//! Cycles without valid predictions have no expected slice.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use frametimeline_core::jank::JankType;
use frametimeline_core::time::HostTime;
use frametimeline_core::timing::{PredictionState, TimelineItem};

use crate::recorder::{RecordedEvent, decode};

const EXPECTED: &str = "Expected Timeline";
const ACTUAL: &str = "Actual Timeline";

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are written in microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::DisplayFrame(e) => {
                let name = e.token.to_string();
                if e.prediction_state == PredictionState::Valid {
                    events.push(slice(
                        EXPECTED,
                        &name,
                        e.compositor_pid,
                        &e.predictions,
                        json!({ "token": e.token.0 }),
                    ));
                }
                events.push(slice(
                    ACTUAL,
                    &name,
                    e.compositor_pid,
                    &e.actuals,
                    json!({
                        "token": e.token.0,
                        "prediction_state": e.prediction_state.as_str(),
                        "present_type": e.present.as_str(),
                        "on_time_finish": e.ready.as_str(),
                        "gpu_composition": e.gpu_composition,
                        "jank_type": jank_name(e.jank),
                        "layer_count": e.surface_frame_count,
                    }),
                ));
            }
            RecordedEvent::SurfaceFrame(e) => {
                let name = e.token.map_or_else(|| e.layer_name.clone(), |t| t.to_string());
                if e.prediction_state == PredictionState::Valid {
                    events.push(slice(
                        EXPECTED,
                        &name,
                        e.owner_pid,
                        &e.predictions,
                        json!({ "layer_name": e.layer_name }),
                    ));
                }
                events.push(slice(
                    ACTUAL,
                    &name,
                    e.owner_pid,
                    &e.actuals,
                    json!({
                        "layer_name": e.layer_name,
                        "display_frame_token": e.display_frame_token.0,
                        "present_state": e.present_state.as_str(),
                        "prediction_state": e.prediction_state.as_str(),
                        "present_type": e.present.as_str(),
                        "on_time_finish": e.ready.as_str(),
                        "gpu_composition": e.gpu_composition,
                        "jank_type": jank_name(e.jank),
                    }),
                ));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

/// One complete slice. Unset end points collapse onto the start.
fn slice(track: &str, name: &str, pid: u32, item: &TimelineItem, args: Value) -> Value {
    let start = item.start_time;
    let end = if item.present_time.is_zero() {
        item.end_time.max(start)
    } else {
        item.present_time
    };
    json!({
        "ph": "X",
        "name": name,
        "cat": track,
        "ts": to_us(start),
        "dur": to_us(end) - to_us(start),
        "pid": pid,
        "tid": track,
        "args": args,
    })
}

fn jank_name(jank: Option<JankType>) -> String {
    jank.map_or_else(|| "Unclassified".to_owned(), |j| j.to_string())
}

fn to_us(t: HostTime) -> f64 {
    t.0 as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use crate::test_support::{display_record, dropped_surface_record, surface_record};
    use frametimeline_core::trace::TraceSink;

    fn exported(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn frames_become_expected_and_actual_slices() {
        let mut rec = RecorderSink::new();
        rec.on_display_frame(&display_record());
        rec.on_surface_frame(&surface_record());
        let parsed = exported(&rec);
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["cat"], EXPECTED);
        assert_eq!(parsed[0]["name"], "3");
        assert_eq!(parsed[0]["ts"], 1_000_000.0);
        assert_eq!(parsed[0]["dur"], 20_000.0);

        assert_eq!(parsed[1]["cat"], ACTUAL);
        assert_eq!(parsed[1]["dur"], 31_000.0);
        assert_eq!(parsed[1]["pid"], 1000);
        assert_eq!(parsed[1]["args"]["jank_type"], "Compositor GPU Deadline Missed");
        assert_eq!(parsed[1]["args"]["present_type"], "Late Present");

        assert_eq!(parsed[3]["pid"], 42);
        assert_eq!(parsed[3]["args"]["display_frame_token"], 3);
        assert_eq!(parsed[3]["args"]["layer_name"], "com.example/Main#0");
    }

    #[test]
    fn frames_without_predictions_have_no_expected_slice() {
        let mut rec = RecorderSink::new();
        rec.on_surface_frame(&dropped_surface_record());
        let parsed = exported(&rec);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["cat"], ACTUAL);
        assert_eq!(parsed[0]["name"], "com.example/Overlay#1");
        assert_eq!(parsed[0]["args"]["jank_type"], "Dropped Frame");
        assert_eq!(parsed[0]["args"]["present_state"], "Dropped");
    }

    #[test]
    fn export_empty_recording() {
        let parsed = exported(&RecorderSink::new());
        assert!(parsed.is_empty());
    }
}
