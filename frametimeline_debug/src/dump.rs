// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text dumps of timeline state.
//!
//! [`DumpArgs::parse`] accepts the `-all` and `-jank` arguments; [`dump`]
//! captures a [`TimelineSnapshot`] and renders it. All times are printed in
//! milliseconds relative to the snapshot's base time, so two dumps of the
//! same state are identical.

use std::fmt::{self, Write};

use frametimeline_core::jank::JankType;
use frametimeline_core::snapshot::{DisplayFrameSnapshot, DumpFilter, TimelineSnapshot};
use frametimeline_core::time::HostTime;
use frametimeline_core::timeline::FrameTimeline;
use frametimeline_core::timing::TimelineItem;
use frametimeline_core::token::TokenManager;
use frametimeline_core::trace::SurfaceFrameRecord;

/// What a dump covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DumpArgs {
    /// Every retained and pending cycle with all its layer frames.
    All,
    /// Retained cycles that are janky or contain a janky layer frame.
    Jank,
}

/// Why dump arguments were rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DumpArgsError {
    /// No arguments were given.
    #[error("missing dump argument (usage: -all | -jank)")]
    Missing,
    /// The first argument is not a known mode.
    #[error("unknown dump argument `{0}` (usage: -all | -jank)")]
    Unknown(String),
}

impl DumpArgs {
    /// Parses the first argument; later arguments are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DumpArgsError`] if there is no argument or it is neither
    /// `-all` nor `-jank`.
    pub fn parse<I, S>(args: I) -> Result<Self, DumpArgsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(first) = args.into_iter().next() else {
            return Err(DumpArgsError::Missing);
        };
        match first.as_ref() {
            "-all" => Ok(Self::All),
            "-jank" => Ok(Self::Jank),
            other => Err(DumpArgsError::Unknown(other.to_owned())),
        }
    }

    /// The snapshot filter for this mode.
    #[must_use]
    pub fn filter(self) -> DumpFilter {
        match self {
            Self::All => DumpFilter::All,
            Self::Jank => DumpFilter::JankOnly,
        }
    }
}

/// Parses `args`, snapshots `timeline`, and renders the result.
///
/// Malformed arguments render the error and usage instead of a dump.
pub fn dump<T, I, S>(timeline: &FrameTimeline<T>, args: I) -> String
where
    T: TokenManager,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    match DumpArgs::parse(args) {
        Ok(args) => render_to_string(&timeline.snapshot(args.filter()), args),
        Err(err) => format!("{err}\n"),
    }
}

/// Renders a snapshot into a new string.
#[must_use]
pub fn render_to_string(snapshot: &TimelineSnapshot, args: DumpArgs) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = render(snapshot, args, &mut out);
    out
}

/// Renders a snapshot.
pub fn render(snapshot: &TimelineSnapshot, args: DumpArgs, out: &mut impl Write) -> fmt::Result {
    let base = snapshot.base_time;
    match args {
        DumpArgs::All => writeln!(out, "Number of display frames : {}", snapshot.len())?,
        DumpArgs::Jank => writeln!(out, "Number of janky display frames : {}", snapshot.len())?,
    }
    for frame in &snapshot.frames {
        render_display_frame(frame, base, args, out)?;
    }
    Ok(())
}

fn render_display_frame(
    frame: &DisplayFrameSnapshot,
    base: HostTime,
    args: DumpArgs,
    out: &mut impl Write,
) -> fmt::Result {
    let e = &frame.record;
    let pending = if frame.pending { " (pending present)" } else { "" };
    writeln!(out, "Display Frame {}{pending}", frame.index)?;
    writeln!(out, "    Token: {}", e.token)?;
    writeln!(out, "    Prediction State: {}", e.prediction_state)?;
    writeln!(out, "    Jank Type: {}", jank_text(e.jank))?;
    writeln!(out, "    Present Metadata: {}", e.present)?;
    writeln!(out, "    Finish Metadata: {}", e.ready)?;
    writeln!(out, "    Start Metadata: {}", e.start)?;
    writeln!(out, "    GPU Composition: {}", e.gpu_composition)?;
    writeln!(
        out,
        "    Vsync Period: {:.2}",
        e.vsync_period.as_millis_f64()
    )?;
    render_table(&e.predictions, &e.actuals, base, "    ", out)?;

    for sf in &frame.surface_frames {
        if args == DumpArgs::Jank && !sf.is_janky() {
            continue;
        }
        render_surface_frame(sf, base, out)?;
    }
    Ok(())
}

fn render_surface_frame(sf: &SurfaceFrameRecord, base: HostTime, out: &mut impl Write) -> fmt::Result {
    const INDENT: &str = "        ";
    writeln!(out, "    Surface Frame - {}", sf.debug_name)?;
    let token = sf.token.map_or_else(|| "none".to_owned(), |t| t.to_string());
    writeln!(out, "{INDENT}Token: {token}")?;
    writeln!(out, "{INDENT}Owner Pid: {}", sf.owner_pid)?;
    writeln!(out, "{INDENT}Owner Uid: {}", sf.owner_uid)?;
    writeln!(out, "{INDENT}Layer Name: {}", sf.layer_name)?;
    writeln!(out, "{INDENT}Present State: {}", sf.present_state)?;
    writeln!(out, "{INDENT}Prediction State: {}", sf.prediction_state)?;
    writeln!(out, "{INDENT}Jank Type: {}", jank_text(sf.jank))?;
    writeln!(out, "{INDENT}Present Metadata: {}", sf.present)?;
    writeln!(out, "{INDENT}Finish Metadata: {}", sf.ready)?;
    writeln!(out, "{INDENT}Start Metadata: {}", sf.start)?;
    writeln!(
        out,
        "{INDENT}Last Latch Time: {}",
        relative(sf.last_latch_time, base)
    )?;
    render_table(&sf.predictions, &sf.actuals, base, INDENT, out)
}

fn render_table(
    predictions: &TimelineItem,
    actuals: &TimelineItem,
    base: HostTime,
    indent: &str,
    out: &mut impl Write,
) -> fmt::Result {
    writeln!(
        out,
        "{indent}{:<10}{:>12}{:>12}{:>12}",
        "", "Start", "End", "Present"
    )?;
    for (label, item) in [("Expected", predictions), ("Actual", actuals)] {
        writeln!(
            out,
            "{indent}{label:<10}{:>12}{:>12}{:>12}",
            relative(item.start_time, base),
            relative(item.end_time, base),
            relative(item.present_time, base),
        )?;
    }
    Ok(())
}

/// Milliseconds since `base`, or `N/A` for an unset timestamp.
fn relative(t: HostTime, base: HostTime) -> String {
    if t.is_zero() {
        "N/A".to_owned()
    } else {
        format!("{:.2}", t.millis_since(base))
    }
}

fn jank_text(jank: Option<JankType>) -> String {
    jank.map_or_else(|| "Pending".to_owned(), |j| j.to_string())
}
