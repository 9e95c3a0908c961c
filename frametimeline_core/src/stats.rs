// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aggregate statistics collection.

use crate::trace::{DisplayFrameRecord, SurfaceFrameRecord};

/// Receives every finalized frame for aggregate statistics.
///
/// Called from whichever thread finalized the cycle, after the timeline lock
/// is released. Implementations synchronize internally.
pub trait JankStats: Send + Sync {
    /// Called once per finalized layer frame.
    fn record_surface_frame(&self, record: &SurfaceFrameRecord);

    /// Called once per finalized compositor cycle, before its layer frames.
    fn record_display_frame(&self, record: &DisplayFrameRecord) {
        _ = record;
    }
}
