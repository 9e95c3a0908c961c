// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes records into a
//! `Vec<u8>` as little-endian fields behind a one-byte tag. Layer and debug
//! names are length-prefixed UTF-8. [`decode`] reads them back as an iterator
//! of [`RecordedEvent`].

use frametimeline_core::jank::JankType;
use frametimeline_core::surface_frame::PresentState;
use frametimeline_core::time::{Duration, HostTime};
use frametimeline_core::timing::{
    FramePresentMetadata, FrameReadyMetadata, FrameStartMetadata, PredictionState, TimelineItem,
};
use frametimeline_core::token::Token;
use frametimeline_core::trace::{DisplayFrameRecord, SurfaceFrameRecord, TraceSink};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_DISPLAY_FRAME: u8 = 1;
const TAG_SURFACE_FRAME: u8 = 2;

// ---------------------------------------------------------------------------
// Enum codes
// ---------------------------------------------------------------------------

fn prediction_code(state: PredictionState) -> u8 {
    match state {
        PredictionState::Valid => 0,
        PredictionState::Expired => 1,
        PredictionState::None => 2,
    }
}

fn prediction_from_code(code: u8) -> PredictionState {
    match code {
        0 => PredictionState::Valid,
        1 => PredictionState::Expired,
        _ => PredictionState::None,
    }
}

fn start_code(start: FrameStartMetadata) -> u8 {
    match start {
        FrameStartMetadata::OnTimeStart => 0,
        FrameStartMetadata::LateStart => 1,
        FrameStartMetadata::EarlyStart => 2,
        FrameStartMetadata::UnknownStart => 3,
    }
}

fn start_from_code(code: u8) -> FrameStartMetadata {
    match code {
        0 => FrameStartMetadata::OnTimeStart,
        1 => FrameStartMetadata::LateStart,
        2 => FrameStartMetadata::EarlyStart,
        _ => FrameStartMetadata::UnknownStart,
    }
}

fn ready_code(ready: FrameReadyMetadata) -> u8 {
    match ready {
        FrameReadyMetadata::OnTimeFinish => 0,
        FrameReadyMetadata::LateFinish => 1,
        FrameReadyMetadata::UnknownFinish => 2,
    }
}

fn ready_from_code(code: u8) -> FrameReadyMetadata {
    match code {
        0 => FrameReadyMetadata::OnTimeFinish,
        1 => FrameReadyMetadata::LateFinish,
        _ => FrameReadyMetadata::UnknownFinish,
    }
}

fn present_code(present: FramePresentMetadata) -> u8 {
    match present {
        FramePresentMetadata::OnTimePresent => 0,
        FramePresentMetadata::LatePresent => 1,
        FramePresentMetadata::EarlyPresent => 2,
        FramePresentMetadata::UnknownPresent => 3,
    }
}

fn present_from_code(code: u8) -> FramePresentMetadata {
    match code {
        0 => FramePresentMetadata::OnTimePresent,
        1 => FramePresentMetadata::LatePresent,
        2 => FramePresentMetadata::EarlyPresent,
        _ => FramePresentMetadata::UnknownPresent,
    }
}

fn present_state_code(state: PresentState) -> u8 {
    match state {
        PresentState::Presented => 0,
        PresentState::Dropped => 1,
        PresentState::Unknown => 2,
    }
}

fn present_state_from_code(code: u8) -> PresentState {
    match code {
        0 => PresentState::Presented,
        1 => PresentState::Dropped,
        _ => PresentState::Unknown,
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes records into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_item(&mut self, item: &TimelineItem) {
        self.write_i64(item.start_time.0);
        self.write_i64(item.end_time.0);
        self.write_i64(item.present_time.0);
    }

    fn write_option_token(&mut self, token: Option<Token>) {
        self.write_bool(token.is_some());
        self.write_i64(token.unwrap_or(Token::INVALID).0);
    }

    fn write_jank(&mut self, jank: Option<JankType>) {
        self.write_bool(jank.is_some());
        self.write_u32(jank.map_or(0, |j| j.bits()));
    }

    fn write_str(&mut self, s: &str) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "names longer than u32::MAX bytes are truncated for recording"
        )]
        let len = s.len().min(u32::MAX as usize) as u32;
        self.write_u32(len);
        self.buf.extend_from_slice(&s.as_bytes()[..len as usize]);
    }
}

impl TraceSink for RecorderSink {
    fn on_display_frame(&mut self, e: &DisplayFrameRecord) {
        self.write_u8(TAG_DISPLAY_FRAME);
        self.write_i64(e.token.0);
        self.write_u32(e.compositor_pid);
        self.write_i64(e.vsync_period.0);
        self.write_u8(prediction_code(e.prediction_state));
        self.write_item(&e.predictions);
        self.write_item(&e.actuals);
        self.write_u8(start_code(e.start));
        self.write_u8(ready_code(e.ready));
        self.write_u8(present_code(e.present));
        self.write_jank(e.jank);
        self.write_bool(e.gpu_composition);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "layer frame count capped at u32::MAX for recording"
        )]
        self.write_u32(e.surface_frame_count.min(u32::MAX as usize) as u32);
    }

    fn on_surface_frame(&mut self, e: &SurfaceFrameRecord) {
        self.write_u8(TAG_SURFACE_FRAME);
        self.write_option_token(e.token);
        self.write_i64(e.display_frame_token.0);
        self.write_u32(e.owner_pid);
        self.write_u32(e.owner_uid);
        self.write_str(&e.layer_name);
        self.write_str(&e.debug_name);
        self.write_u8(present_state_code(e.present_state));
        self.write_u8(prediction_code(e.prediction_state));
        self.write_item(&e.predictions);
        self.write_item(&e.actuals);
        self.write_i64(e.last_latch_time.0);
        self.write_u8(start_code(e.start));
        self.write_u8(ready_code(e.ready));
        self.write_u8(present_code(e.present));
        self.write_jank(e.jank);
        self.write_bool(e.gpu_composition);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`DisplayFrameRecord`].
    DisplayFrame(DisplayFrameRecord),
    /// A [`SurfaceFrameRecord`].
    SurfaceFrame(SurfaceFrameRecord),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_bytes(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.read_bytes(1)?[0])
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.read_bytes(4)?.try_into().ok()?))
    }

    fn read_i64(&mut self) -> Option<i64> {
        Some(i64::from_le_bytes(self.read_bytes(8)?.try_into().ok()?))
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_i64().map(HostTime)
    }

    fn read_item(&mut self) -> Option<TimelineItem> {
        Some(TimelineItem::new(
            self.read_time()?,
            self.read_time()?,
            self.read_time()?,
        ))
    }

    fn read_option_token(&mut self) -> Option<Option<Token>> {
        let present = self.read_bool()?;
        let token = Token(self.read_i64()?);
        Some(present.then_some(token))
    }

    fn read_jank(&mut self) -> Option<Option<JankType>> {
        let present = self.read_bool()?;
        let bits = self.read_u32()?;
        Some(present.then(|| JankType::from_bits_truncate(bits)))
    }

    fn read_string(&mut self) -> Option<String> {
        let len = usize::try_from(self.read_u32()?).ok()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn decode_display_frame(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DisplayFrame(DisplayFrameRecord {
            token: Token(self.read_i64()?),
            compositor_pid: self.read_u32()?,
            vsync_period: Duration(self.read_i64()?),
            prediction_state: prediction_from_code(self.read_u8()?),
            predictions: self.read_item()?,
            actuals: self.read_item()?,
            start: start_from_code(self.read_u8()?),
            ready: ready_from_code(self.read_u8()?),
            present: present_from_code(self.read_u8()?),
            jank: self.read_jank()?,
            gpu_composition: self.read_bool()?,
            surface_frame_count: usize::try_from(self.read_u32()?).ok()?,
        }))
    }

    fn decode_surface_frame(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SurfaceFrame(SurfaceFrameRecord {
            token: self.read_option_token()?,
            display_frame_token: Token(self.read_i64()?),
            owner_pid: self.read_u32()?,
            owner_uid: self.read_u32()?,
            layer_name: self.read_string()?,
            debug_name: self.read_string()?,
            present_state: present_state_from_code(self.read_u8()?),
            prediction_state: prediction_from_code(self.read_u8()?),
            predictions: self.read_item()?,
            actuals: self.read_item()?,
            last_latch_time: self.read_time()?,
            start: start_from_code(self.read_u8()?),
            ready: ready_from_code(self.read_u8()?),
            present: present_from_code(self.read_u8()?),
            jank: self.read_jank()?,
            gpu_composition: self.read_bool()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_DISPLAY_FRAME => self.decode_display_frame(),
            TAG_SURFACE_FRAME => self.decode_surface_frame(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{display_record, dropped_surface_record, surface_record};

    #[test]
    fn records_decode_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_display_frame(&display_record());
        rec.on_surface_frame(&surface_record());
        rec.on_surface_frame(&dropped_surface_record());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            [
                RecordedEvent::DisplayFrame(display_record()),
                RecordedEvent::SurfaceFrame(surface_record()),
                RecordedEvent::SurfaceFrame(dropped_surface_record()),
            ]
        );
    }

    #[test]
    fn unclassified_records_keep_missing_jank() {
        let mut record = surface_record();
        record.jank = None;
        record.token = None;
        let mut rec = RecorderSink::new();
        rec.on_surface_frame(&record);

        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::SurfaceFrame(e)) => {
                assert_eq!(e.jank, None);
                assert_eq!(e.token, None);
            }
            other => panic!("expected SurfaceFrame, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_display_frame(&display_record());
        rec.on_surface_frame(&surface_record());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecordedEvent::DisplayFrame(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn unknown_tag_stops_decoding() {
        assert_eq!(decode(&[0xff, 1, 2, 3]).count(), 0);
    }
}
