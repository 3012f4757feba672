use image::RgbImage;

use super::{BoxOrigin, DecodeError, NormalizedBox, Symbol, SymbolDecoder, luma8};

/// QR code decoder backed by `rqrr`.
///
/// Grids whose payload fails to decode are skipped rather than reported as
/// errors, so this backend never fails a pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }
}

impl SymbolDecoder for QrDecoder {
    fn decode(&self, region: &RgbImage) -> Result<Vec<Symbol>, DecodeError> {
        let (width, height) = region.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| luma8(region.get_pixel(x as u32, y as u32).0),
        );

        let mut symbols = Vec::new();
        for grid in prepared.detect_grids() {
            let Ok((_, content)) = grid.decode() else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            let bounds = corners_to_box(&grid.bounds, width, height);
            symbols.push(Symbol::new(content, bounds));
        }
        Ok(symbols)
    }

    fn origin(&self) -> BoxOrigin {
        BoxOrigin::TopLeft
    }
}

/// Axis-aligned box around the four grid corners, normalized to the region
fn corners_to_box(corners: &[rqrr::Point; 4], width: u32, height: u32) -> NormalizedBox {
    let min_x = corners.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = corners.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = corners.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = corners.iter().map(|p| p.y).max().unwrap_or(0);

    let w = width as f32;
    let h = height as f32;
    NormalizedBox::new(
        min_x as f32 / w,
        min_y as f32 / h,
        (max_x - min_x) as f32 / w,
        (max_y - min_y) as f32 / h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_region_has_no_symbols() {
        let region = RgbImage::from_pixel(120, 80, image::Rgb([255, 255, 255]));
        let symbols = QrDecoder::new().decode(&region).unwrap();
        assert!(symbols.is_empty());
    }

    #[test]
    fn test_corners_to_box() {
        let corners = [
            rqrr::Point { x: 10, y: 20 },
            rqrr::Point { x: 50, y: 22 },
            rqrr::Point { x: 48, y: 60 },
            rqrr::Point { x: 12, y: 58 },
        ];
        let b = corners_to_box(&corners, 100, 100);
        assert_eq!(b, NormalizedBox::new(0.10, 0.20, 0.40, 0.40));
    }
}
