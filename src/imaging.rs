//! Image I/O: decoding user files, writing results and building previews.

use crate::constants::IMAGE_EXTENSIONS;
use crate::error::{Result, SwapError};
use image::imageops::FilterType;
use image::{ImageReader, RgbImage};
use std::path::Path;

/// True when the path carries one of the accepted image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Decode an image file into an RGB buffer.
///
/// The format is guessed from content, so a `.jpg` that is really a PNG still
/// loads; a file that is not an image at all fails with `SwapError::Image`.
pub fn load(path: &Path) -> Result<RgbImage> {
    if !is_supported_image(path) {
        return Err(SwapError::UnsupportedFormat(path.to_path_buf()));
    }
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image.into_rgb8())
}

/// Write an RGB buffer; the format follows the file extension
pub fn save(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save(path)?;
    Ok(())
}

/// Size of the largest box with `width:height` aspect that fits inside
/// `max_width x max_height`, never larger than the original.
pub fn thumbnail_size(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_height.max(1));
    (w, h)
}

/// Aspect-preserving downscale; images already inside the bounds are
/// returned unchanged.
pub fn thumbnail(image: &RgbImage, max_width: u32, max_height: u32) -> RgbImage {
    let (w, h) = thumbnail_size(image.width(), image.height(), max_width, max_height);
    if (w, h) == image.dimensions() {
        return image.clone();
    }
    image::imageops::resize(image, w, h, FilterType::Triangle)
}
