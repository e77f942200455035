//! Image encoding and decoding.

use crate::renderer::{RenderError, RenderResult};
use clearcam_core::collab::DecodedFrame;
use std::path::Path;

pub const PNG_MIME: &str = "image/png";

/// Encode an RGBA frame as PNG bytes.
pub fn encode_png(frame: &DecodedFrame) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("header: {e}")))?;
        writer
            .write_image_data(&frame.pixels)
            .map_err(|e| RenderError::Encode(format!("data: {e}")))?;
    }
    Ok(png_data)
}

/// Decode PNG, JPEG or WebP bytes into an RGBA frame.
pub fn decode_image(bytes: &[u8]) -> RenderResult<DecodedFrame> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| RenderError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(DecodedFrame {
        width,
        height,
        pixels: image.into_raw(),
    })
}

/// Load an image file as an RGBA frame.
pub fn load_image(path: &Path) -> RenderResult<DecodedFrame> {
    let image = image::open(path)
        .map_err(|e| RenderError::Decode(format!("{}: {}", path.display(), e)))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(DecodedFrame {
        width,
        height,
        pixels: image.into_raw(),
    })
}
