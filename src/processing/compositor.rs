//! Frame compositing and PNG export.
//!
//! The output always has the base image's pixel dimensions. An overlay is
//! stretched to exactly those dimensions and blended source-over; without an
//! overlay the base is re-encoded untouched. Output is always PNG.

use std::io::Cursor;
use std::sync::Arc;
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageFormat};
use tracing::debug;

use crate::utils::{StudioError, StudioResult};

/// Composites `overlay` over `base` and encodes the result as PNG.
pub fn compose(base: &[u8], overlay: Option<&[u8]>) -> StudioResult<Vec<u8>> {
    let base = image::load_from_memory(base)
        .map_err(|e| StudioError::decode(format!("Failed to decode base image: {e}")))?;

    let output = match overlay {
        None => png_compatible(base),
        Some(overlay) => {
            let frame = image::load_from_memory(overlay)
                .map_err(|e| StudioError::decode(format!("Failed to decode overlay image: {e}")))?
                .to_rgba8();

            let mut canvas = base.to_rgba8();
            let (width, height) = canvas.dimensions();
            let frame = if frame.dimensions() == (width, height) {
                frame
            } else {
                debug!(
                    "Stretching overlay {}x{} to {}x{}",
                    frame.width(), frame.height(), width, height
                );
                imageops::resize(&frame, width, height, FilterType::Triangle)
            };

            imageops::overlay(&mut canvas, &frame, 0, 0);
            DynamicImage::ImageRgba8(canvas)
        }
    };

    let mut buf = Vec::new();
    output
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| StudioError::encode(format!("Failed to encode PNG: {e}")))?;
    Ok(buf)
}

/// Runs [`compose`] on the blocking pool so decoding never stalls the runtime.
pub async fn compose_async(base: Arc<Vec<u8>>, overlay: Option<Arc<Vec<u8>>>) -> StudioResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || compose(&base, overlay.as_deref().map(Vec::as_slice)))
        .await
        .map_err(|e| StudioError::encode(format!("Compositing task panicked: {e}")))?
}

// PNG has no float channels; everything else is written as decoded.
fn png_compatible(image: DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::Rgb32F => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgba32F => DynamicImage::ImageRgba16(image.to_rgba16()),
        _ => image,
    }
}
