// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};

use super::device::{Extent, RenderDevice};
use super::settings::RunMode;

/// Uniforms of the composite pass. Must match the WGSL `CompositeParams` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CompositeParams {
    pub weight: f32,
    /// Non-zero when the blended result is written back into the accumulation image.
    pub commit: u32,
    pub width: u32,
    pub height: u32,
}

impl CompositeParams {
    pub fn commits(&self) -> bool {
        self.commit != 0
    }
}

/// Running-mean weight of the frame traced with `sample_index`.
pub fn blend_weight(sample_index: u32) -> f32 {
    1.0 / (sample_index as f32 + 1.0)
}

/// `accumulation * (1 - w) + frame * w`, written in lerp form so that feeding a
/// constant frame keeps the accumulation exactly at that constant. A full weight
/// replaces stale accumulation outright.
pub fn blend(accumulation: [f32; 4], frame: [f32; 4], weight: f32) -> [f32; 4] {
    if weight >= 1.0 {
        return frame;
    }
    std::array::from_fn(|i| accumulation[i] + (frame[i] - accumulation[i]) * weight)
}

/// Blends each new frame into the accumulation image.
pub struct AccumulationCompositor;

impl AccumulationCompositor {
    /// Active frames commit the blend; preview frames only present it, so the
    /// same running average can be shown repeatedly without drifting.
    pub fn params(sample_index: u32, mode: RunMode, extent: Extent) -> CompositeParams {
        CompositeParams {
            weight: blend_weight(sample_index),
            commit: mode.is_active() as u32,
            width: extent.width,
            height: extent.height,
        }
    }

    pub fn composite<D: RenderDevice>(
        device: &mut D,
        sample_index: u32,
        mode: RunMode,
        extent: Extent,
    ) -> CompositeParams {
        let params = Self::params(sample_index, mode, extent);
        device.composite(&params);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights() {
        assert_eq!(blend_weight(0), 1.0);
        assert_eq!(blend_weight(1), 0.5);
        assert_eq!(blend_weight(3), 0.25);
    }

    #[test]
    fn test_first_frame_replaces() {
        let out = blend([9.0, 9.0, 9.0, 9.0], [0.1, 0.2, 0.3, 1.0], blend_weight(0));
        assert_eq!(out, [0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn test_constant_frames_stay_exact() {
        let k = [0.1, 0.7, 0.333, 1.0];
        let mut acc = [0.0; 4];
        for n in 0..500 {
            acc = blend(acc, k, blend_weight(n));
            assert_eq!(acc, k);
        }
    }

    #[test]
    fn test_running_mean() {
        let frames = [1.0f32, 3.0, 5.0, 7.0];
        let mut acc = [0.0; 4];
        for (n, f) in frames.iter().enumerate() {
            acc = blend(acc, [*f; 4], blend_weight(n as u32));
        }
        assert!((acc[0] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_converges_to_expectation() {
        // Alternating 0/1 has expectation 0.5.
        let mut acc = [0.0; 4];
        for n in 0..10_000u32 {
            let v = (n % 2) as f32;
            acc = blend(acc, [v; 4], blend_weight(n));
        }
        assert!((acc[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_params_commit_by_mode() {
        let extent = Extent::new(4, 4);
        assert!(AccumulationCompositor::params(2, RunMode::Active, extent).commits());
        let preview = AccumulationCompositor::params(2, RunMode::Preview, extent);
        assert!(!preview.commits());
        assert!((preview.weight - 1.0 / 3.0).abs() < f32::EPSILON);
    }
}
