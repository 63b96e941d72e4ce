// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use glam::Mat4;

use super::accumulator::Accumulator;

/// Edge-triggered camera change detector.
///
/// Each update tick the camera's world transform is compared against the last
/// one seen. Only a change resets accumulation; a camera that stays put for any
/// number of ticks never does. The very first observation counts as a change.
#[derive(Debug, Default)]
pub struct FrameInvalidationTracker {
    last_transform: Option<Mat4>,
}

impl FrameInvalidationTracker {
    /// Returns true if `transform` differs from the previous observation, in
    /// which case `accumulator` has been reset.
    pub fn observe(&mut self, transform: Mat4, accumulator: &mut Accumulator) -> bool {
        let changed = self.last_transform != Some(transform);
        if changed {
            self.last_transform = Some(transform);
            accumulator.reset();
        }
        changed
    }

    /// Forget the last transform so the next observation invalidates.
    pub fn clear(&mut self) {
        self.last_transform = None;
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::render::settings::RunMode;

    fn advance(acc: &mut Accumulator, frames: u32) {
        for _ in 0..frames {
            acc.advance(RunMode::Active);
        }
    }

    #[test]
    fn test_first_observation_invalidates() {
        let mut tracker = FrameInvalidationTracker::default();
        let mut acc = Accumulator::default();
        assert!(tracker.observe(Mat4::IDENTITY, &mut acc));
        assert!(!tracker.observe(Mat4::IDENTITY, &mut acc));
    }

    #[test]
    fn test_static_camera_keeps_samples() {
        let mut tracker = FrameInvalidationTracker::default();
        let mut acc = Accumulator::default();
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        tracker.observe(transform, &mut acc);

        for i in 1..=50 {
            advance(&mut acc, 1);
            assert!(!tracker.observe(transform, &mut acc));
            assert_eq!(acc.sample_index(), i);
        }
    }

    #[test]
    fn test_every_component_invalidates() {
        let base = Mat4::IDENTITY;
        let moved = Mat4::from_translation(Vec3::X);
        let rotated = Mat4::from_quat(Quat::from_rotation_y(0.1));
        let scaled = Mat4::from_scale(Vec3::splat(2.0));

        for changed in [moved, rotated, scaled] {
            let mut tracker = FrameInvalidationTracker::default();
            let mut acc = Accumulator::default();
            tracker.observe(base, &mut acc);
            advance(&mut acc, 7);

            assert!(tracker.observe(changed, &mut acc));
            assert_eq!(acc.sample_index(), 0);
        }
    }

    #[test]
    fn test_transform_sequence() {
        let a = Mat4::IDENTITY;
        let b = Mat4::from_translation(Vec3::Z);
        // (transform, expected reset)
        let sequence = [(a, true), (a, false), (a, false), (b, true), (b, false), (a, true)];

        let mut tracker = FrameInvalidationTracker::default();
        let mut acc = Accumulator::default();
        for (transform, expect_reset) in sequence {
            let before = acc.sample_index();
            let reset = tracker.observe(transform, &mut acc);
            assert_eq!(reset, expect_reset);
            if reset {
                assert_eq!(acc.sample_index(), 0);
            } else {
                assert_eq!(acc.sample_index(), before);
            }
            advance(&mut acc, 1);
        }
    }

    #[test]
    fn test_clear() {
        let mut tracker = FrameInvalidationTracker::default();
        let mut acc = Accumulator::default();
        tracker.observe(Mat4::IDENTITY, &mut acc);
        tracker.clear();
        assert!(tracker.observe(Mat4::IDENTITY, &mut acc));
    }
}
