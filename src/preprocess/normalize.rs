use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use tracing::debug;

use super::Orientation;
use crate::error::{Result, ScanError};

/// Upright RGB frame that every downstream coordinate refers to.
///
/// Orientation is already baked in and the longest side is within the
/// configured bound. The buffer is read-only for the rest of the scan.
#[derive(Debug, Clone)]
pub struct NormalizedFrame {
    image: RgbImage,
    scale: f32,
}

impl NormalizedFrame {
    /// Wrap an RGB buffer that is already upright and within bounds
    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image, scale: 1.0 }
    }

    /// Pixel buffer
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Consume the frame, returning its buffer
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Downscale factor applied to the oriented source (1.0 if none)
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

/// `min(1, max_dimension / longest_side)`
pub fn scale_for(width: u32, height: u32, max_dimension: u32) -> f32 {
    let longest = width.max(height);
    if longest > max_dimension {
        max_dimension as f32 / longest as f32
    } else {
        1.0
    }
}

/// Orient and cap a decoded image.
pub fn normalize(
    image: DynamicImage,
    orientation: Orientation,
    max_dimension: u32,
) -> Result<NormalizedFrame> {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(ScanError::invalid_image(format!(
            "image has no pixels ({src_w}x{src_h})"
        )));
    }

    let oriented = orientation.apply(image);
    let (w, h) = oriented.dimensions();
    let scale = scale_for(w, h, max_dimension);

    let rgb = if scale < 1.0 {
        let new_w = ((w as f32 * scale).round() as u32).max(1);
        let new_h = ((h as f32 * scale).round() as u32).max(1);
        debug!(from_w = w, from_h = h, to_w = new_w, to_h = new_h, "downscaling frame");
        oriented
            .resize_exact(new_w, new_h, FilterType::Triangle)
            .to_rgb8()
    } else {
        oriented.to_rgb8()
    };

    debug!(
        width = rgb.width(),
        height = rgb.height(),
        ?orientation,
        scale,
        "frame normalized"
    );
    Ok(NormalizedFrame { image: rgb, scale })
}

/// Decode encoded image bytes, reading the EXIF orientation, then normalize.
pub fn normalize_bytes(bytes: &[u8], max_dimension: u32) -> Result<NormalizedFrame> {
    let image = image::load_from_memory(bytes)?;
    normalize(image, Orientation::read(bytes), max_dimension)
}

/// Read and normalize an image file.
pub fn normalize_path<P: AsRef<Path>>(path: P, max_dimension: u32) -> Result<NormalizedFrame> {
    let bytes = std::fs::read(path)?;
    normalize_bytes(&bytes, max_dimension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn blank(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 200, 200])))
    }

    #[test]
    fn test_scale_for() {
        assert_eq!(scale_for(1000, 500, 4000), 1.0);
        assert_eq!(scale_for(8000, 6000, 4000), 0.5);
        assert_eq!(scale_for(3000, 6000, 2000), 2000.0 / 6000.0);
    }

    #[test]
    fn test_normalize_caps_longest_side() {
        let frame = normalize(blank(1000, 600), Orientation::Normal, 500).unwrap();
        assert_eq!((frame.width(), frame.height()), (500, 300));
        assert_eq!(frame.scale(), 0.5);
    }

    #[test]
    fn test_normalize_keeps_small_images() {
        let frame = normalize(blank(320, 240), Orientation::Normal, 2000).unwrap();
        assert_eq!((frame.width(), frame.height()), (320, 240));
        assert_eq!(frame.scale(), 1.0);
    }

    #[test]
    fn test_normalize_orients_before_capping() {
        let frame = normalize(blank(1000, 600), Orientation::Rotate90, 500).unwrap();
        assert_eq!((frame.width(), frame.height()), (300, 500));
    }

    #[test]
    fn test_normalize_rejects_empty_image() {
        let err = normalize(blank(0, 10), Orientation::Normal, 4000).unwrap_err();
        assert!(matches!(err, ScanError::InvalidImage { .. }));
    }

    #[test]
    fn test_normalize_bytes_rejects_garbage() {
        let err = normalize_bytes(b"definitely not a png", 4000).unwrap_err();
        assert!(matches!(err, ScanError::InvalidImage { .. }));
    }

    #[test]
    fn test_normalize_bytes_png() {
        let mut bytes = Vec::new();
        blank(64, 32)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let frame = normalize_bytes(&bytes, 4000).unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 32));
    }
}
