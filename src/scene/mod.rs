// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod loader;
pub mod material;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod sphere;
