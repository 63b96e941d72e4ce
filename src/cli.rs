use std::path::PathBuf;

use crate::constants::{DEFAULT_HEADLESS_FRAMES, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::error::TracerError;
use crate::render::device::Extent;
use crate::render::settings::RunMode;

pub const USAGE: &str =
    "usage: sphere-tracer [SCENE] [--headless OUT.png] [--frames N] [--size WxH] [--preview]";

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub scene: Option<String>,
    /// Render offscreen and write a PNG here instead of opening a window.
    pub headless: Option<PathBuf>,
    pub frames: u32,
    pub size: Extent,
    pub mode: RunMode,
    pub help: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scene: None,
            headless: None,
            frames: DEFAULT_HEADLESS_FRAMES,
            size: Extent::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT),
            mode: RunMode::Active,
            help: false,
        }
    }
}

/// Parse arguments (without the program name).
pub fn parse<I>(args: I) -> Result<Options, TracerError>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => {
                let out = args.next().ok_or(TracerError::MissingValue("--headless"))?;
                options.headless = Some(PathBuf::from(out));
            }
            "--frames" => {
                let value = args.next().ok_or(TracerError::MissingValue("--frames"))?;
                options.frames = value
                    .parse()
                    .map_err(|_| TracerError::UnknownArgument(value))?;
            }
            "--size" => {
                let value = args.next().ok_or(TracerError::MissingValue("--size"))?;
                options.size = parse_size(&value)?;
            }
            "--preview" => options.mode = RunMode::Preview,
            "-h" | "--help" => options.help = true,
            _ if arg.starts_with('-') => return Err(TracerError::UnknownArgument(arg)),
            _ if options.scene.is_none() => options.scene = Some(arg),
            _ => return Err(TracerError::UnknownArgument(arg)),
        }
    }

    Ok(options)
}

fn parse_size(value: &str) -> Result<Extent, TracerError> {
    let invalid = || TracerError::InvalidSize(value.to_string());
    let (w, h) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok(Extent::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let options = parse(Vec::new()).unwrap();
        assert_eq!(options, Options::default());
        assert!(options.headless.is_none());
    }

    #[test]
    fn test_full_headless_invocation() {
        let options = parse(args(&[
            "scene.yaml",
            "--headless",
            "out.png",
            "--frames",
            "16",
            "--size",
            "320x240",
            "--preview",
        ]))
        .unwrap();
        assert_eq!(options.scene.as_deref(), Some("scene.yaml"));
        assert_eq!(options.headless, Some(PathBuf::from("out.png")));
        assert_eq!(options.frames, 16);
        assert_eq!(options.size, Extent::new(320, 240));
        assert_eq!(options.mode, RunMode::Preview);
    }

    #[test]
    fn test_bad_size() {
        assert!(matches!(
            parse(args(&["--size", "320"])),
            Err(TracerError::InvalidSize(_))
        ));
        assert!(matches!(
            parse(args(&["--size", "0x10"])),
            Err(TracerError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_missing_value_and_unknown_flag() {
        assert!(matches!(
            parse(args(&["--frames"])),
            Err(TracerError::MissingValue("--frames"))
        ));
        assert!(matches!(
            parse(args(&["--fast"])),
            Err(TracerError::UnknownArgument(_))
        ));
        assert!(matches!(
            parse(args(&["a.yaml", "b.yaml"])),
            Err(TracerError::UnknownArgument(_))
        ));
    }
}
