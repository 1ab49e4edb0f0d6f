//! Decoded frame images

use std::path::Path;
use image::imageops::{self, FilterType};
use image::RgbImage;
use crate::SourceError;

/// Decode an image file (PNG, JPEG, ...) into an RGB buffer
pub fn load(path: &Path) -> Result<RgbImage, SourceError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Nearest-neighbour resize to `width x height`; already-fitting images pass through
pub fn fit(img: RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img;
    }
    imageops::resize(&img, width, height, FilterType::Nearest)
}
