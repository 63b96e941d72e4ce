use std::path::Path;

use anyhow::{Context, Result};

pub fn save_screenshot(pixels: &[u8], width: u32, height: u32, path: &Path) -> Result<()> {
    let img = image::RgbaImage::from_raw(width, height, pixels.to_vec())
        .context("Failed to create image from pixel data")?;
    img.save(path)
        .with_context(|| format!("Failed to save screenshot to {}", path.display()))?;
    log::info!("Screenshot saved to {}", path.display());
    Ok(())
}

/// Encode linear RGBA32F pixels as sRGB RGBA8, alpha forced opaque.
pub fn encode_srgb8(pixels: &[[f32; 4]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() * 4);
    for p in pixels {
        for c in &p[..3] {
            out.push(linear_to_srgb8(*c));
        }
        out.push(u8::MAX);
    }
    out
}

fn linear_to_srgb8(c: f32) -> u8 {
    let c = if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 };
    let s = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0 + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_endpoints() {
        let bytes = encode_srgb8(&[[0.0, 1.0, 2.0, 0.3], [f32::NAN, -1.0, 0.5, 1.0]]);
        assert_eq!(&bytes[..4], &[0, 255, 255, 255]);
        assert_eq!(bytes[4], 0);
        assert_eq!(bytes[5], 0);
        // 0.5 linear is ~0.735 in sRGB
        assert_eq!(bytes[6], 188);
    }
}
