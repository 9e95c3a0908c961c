// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Jank categories.

use core::fmt;

use bitflags::bitflags;

bitflags! {
    /// The set of reasons a frame was janky.
    ///
    /// The empty set means the frame was not janky. A layer frame carries its
    /// own reasons plus every reason of the compositor cycle it was part of.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct JankType: u32 {
        /// The display presented late although composition finished on time.
        const DISPLAY_HAL                    = 1 << 0;
        /// The compositor missed its deadline doing CPU composition.
        const COMPOSITOR_CPU_DEADLINE_MISSED = 1 << 1;
        /// The compositor missed its deadline doing GPU composition.
        const COMPOSITOR_GPU_DEADLINE_MISSED = 1 << 2;
        /// The application missed its buffer deadline.
        const APP_DEADLINE_MISSED            = 1 << 3;
        /// The actual present landed off any vsync the prediction allowed for.
        const PREDICTION_ERROR               = 1 << 4;
        /// The compositor started late or picked the frame up on the wrong vsync.
        const COMPOSITOR_SCHEDULING          = 1 << 5;
        /// The layer's queue was stuffed: an older buffer was latched instead.
        const BUFFER_STUFFING                = 1 << 6;
        /// Jank whose cause cannot be determined.
        const UNKNOWN                        = 1 << 7;
        /// The buffer was dropped and never presented.
        const DROPPED                        = 1 << 8;
    }
}

impl JankType {
    /// Returns `true` if any jank reason is set.
    #[inline]
    #[must_use]
    pub const fn is_janky(self) -> bool {
        !self.is_empty()
    }

    const NAMES: [(Self, &'static str); 9] = [
        (Self::DISPLAY_HAL, "Display HAL"),
        (Self::COMPOSITOR_CPU_DEADLINE_MISSED, "Compositor CPU Deadline Missed"),
        (Self::COMPOSITOR_GPU_DEADLINE_MISSED, "Compositor GPU Deadline Missed"),
        (Self::APP_DEADLINE_MISSED, "App Deadline Missed"),
        (Self::PREDICTION_ERROR, "Prediction Error"),
        (Self::COMPOSITOR_SCHEDULING, "Compositor Scheduling"),
        (Self::BUFFER_STUFFING, "Buffer Stuffing"),
        (Self::UNKNOWN, "Unknown jank"),
        (Self::DROPPED, "Dropped Frame"),
    ];

    /// Iterates the human-readable names of the set reasons, in bit order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl fmt::Display for JankType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_not_janky() {
        assert!(!JankType::empty().is_janky());
        assert!(JankType::DROPPED.is_janky());
        assert_eq!(JankType::default(), JankType::empty());
    }

    #[test]
    fn display_lists_names_in_bit_order() {
        assert_eq!(JankType::empty().to_string(), "None");
        let jank = JankType::BUFFER_STUFFING | JankType::DISPLAY_HAL;
        assert_eq!(jank.to_string(), "Display HAL, Buffer Stuffing");
    }

    #[test]
    fn every_flag_has_a_name() {
        assert_eq!(JankType::all().names().count(), JankType::all().iter().count());
    }
}
