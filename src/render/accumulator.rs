// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Instant;

use super::settings::RunMode;

/// Progressive sample counter. The accumulation image itself lives on the device.
pub struct Accumulator {
    sample_index: u32,
    pub render_start: Instant,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            sample_index: 0,
            render_start: Instant::now(),
        }
    }
}

impl Accumulator {
    /// Number of frames accumulated since the last invalidation.
    pub fn sample_index(&self) -> u32 {
        self.sample_index
    }

    /// Discard progressive state: the next composite fully replaces the accumulation.
    pub fn reset(&mut self) {
        self.sample_index = 0;
        self.render_start = Instant::now();
    }

    /// Advance to the next sample. Preview frames leave the index untouched.
    /// Returns true if the index moved.
    pub fn advance(&mut self, mode: RunMode) -> bool {
        if !mode.is_active() {
            return false;
        }
        self.sample_index = self.sample_index.saturating_add(1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_only_when_active() {
        let mut acc = Accumulator::default();
        assert!(acc.advance(RunMode::Active));
        assert!(acc.advance(RunMode::Active));
        assert_eq!(acc.sample_index(), 2);

        assert!(!acc.advance(RunMode::Preview));
        assert_eq!(acc.sample_index(), 2);
    }

    #[test]
    fn test_reset() {
        let mut acc = Accumulator::default();
        acc.advance(RunMode::Active);
        acc.reset();
        assert_eq!(acc.sample_index(), 0);
    }
}
