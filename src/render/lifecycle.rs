// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use super::collector::SceneBuffer;
use super::device::{Extent, RenderDevice};

/// Tracks which device resources exist so they are (re)created only when
/// needed and released exactly once.
#[derive(Debug, Default)]
pub struct ResourceLifecycleManager {
    targets: Option<Extent>,
    scene_resident: bool,
}

impl ResourceLifecycleManager {
    /// Make sure the image set matches `extent`. Old content is discarded, not
    /// resampled. Returns true if the images were (re)allocated.
    pub fn ensure_targets<D: RenderDevice>(&mut self, device: &mut D, extent: Extent) -> bool {
        if self.targets == Some(extent) {
            return false;
        }
        if let Some(old) = self.targets.take() {
            log::info!(
                "Output resized {}x{} -> {}x{}, reallocating accumulation",
                old.width,
                old.height,
                extent.width,
                extent.height
            );
            device.release_targets();
        } else {
            log::info!("Allocating accumulation {}x{}", extent.width, extent.height);
        }
        device.allocate_targets(extent);
        self.targets = Some(extent);
        true
    }

    /// Replace the device scene buffer with this frame's snapshot.
    pub fn upload_scene<D: RenderDevice>(&mut self, device: &mut D, buffer: &SceneBuffer) {
        device.upload_scene(buffer.as_slice());
        self.scene_resident = true;
    }

    pub fn targets(&self) -> Option<Extent> {
        self.targets
    }

    pub fn is_resident(&self) -> bool {
        self.targets.is_some() || self.scene_resident
    }

    /// Release everything still resident. Safe to call more than once.
    pub fn release_all<D: RenderDevice>(&mut self, device: &mut D) {
        if self.scene_resident {
            device.release_scene();
            self.scene_resident = false;
        }
        if self.targets.take().is_some() {
            device.release_targets();
        }
    }
}
