// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(dead_code)]

mod app;
mod camera;
mod cli;
mod constants;
mod error;
mod gpu;
mod headless;
mod input;
mod io;
mod render;
mod scene;
mod shaders;
mod ui;

use std::env;

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();
    let options = cli::parse(env::args().skip(1))?;
    if options.help {
        println!("{}", cli::USAGE);
        return Ok(());
    }
    match &options.headless {
        Some(out) => headless::run(&options, out),
        None => app::run(options.scene.clone(), options.mode),
    }
}
