// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TracerError {
    #[error("no suitable GPU adapter found; the tracer requires Vulkan, Metal, or DX12")]
    NoAdapter,

    #[error("failed to decode environment image {path}")]
    EnvironmentDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("environment image {path} has zero size")]
    EmptyEnvironment { path: PathBuf },

    #[error("unsupported scene format {0:?}, expected .yaml, .yml or .json")]
    UnsupportedSceneFormat(String),

    #[error("invalid output size {0:?}, expected WIDTHxHEIGHT")]
    InvalidSize(String),

    #[error("unknown argument {0:?}")]
    UnknownArgument(String),

    #[error("missing value for {0}")]
    MissingValue(&'static str),
}
