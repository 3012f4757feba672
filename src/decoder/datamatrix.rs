use image::RgbImage;
use rxing::common::HybridBinarizer;
use rxing::datamatrix::DataMatrixReader;
use rxing::multi::{GenericMultipleBarcodeReader, MultipleBarcodeReader};
use rxing::{BinaryBitmap, Exceptions, Luma8LuminanceSource, Point};
use tracing::trace;

use super::{BoxOrigin, DecodeError, NormalizedBox, Symbol, SymbolDecoder, luma8};

/// Data Matrix decoder backed by `rxing`.
///
/// Every symbol in the region is returned. A region with no readable symbol
/// yields an empty list.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataMatrixDecoder;

impl DataMatrixDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }
}

impl SymbolDecoder for DataMatrixDecoder {
    fn decode(&self, region: &RgbImage) -> Result<Vec<Symbol>, DecodeError> {
        let (width, height) = region.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let luma: Vec<u8> = region.pixels().map(|p| luma8(p.0)).collect();
        let source = Luma8LuminanceSource::new(luma, width, height);
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
        let mut reader = GenericMultipleBarcodeReader::new(DataMatrixReader);

        let results = match reader.decode_multiple(&mut bitmap) {
            Ok(results) => results,
            Err(Exceptions::NotFoundException(_)) => return Ok(Vec::new()),
            Err(err) => return Err(DecodeError::with_source("data matrix reader failed", err)),
        };
        trace!(found = results.len(), width, height, "data matrix region decoded");

        Ok(results
            .iter()
            .filter(|r| !r.getText().is_empty())
            .map(|r| Symbol::new(r.getText(), points_to_box(r.getPoints(), width, height)))
            .collect())
    }

    fn origin(&self) -> BoxOrigin {
        BoxOrigin::TopLeft
    }
}

/// Axis-aligned box around the result points, normalized to the region.
/// With no points the whole region is used.
fn points_to_box(points: &[Point], width: u32, height: u32) -> NormalizedBox {
    if points.is_empty() {
        return NormalizedBox::new(0.0, 0.0, 1.0, 1.0);
    }
    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let w = width as f32;
    let h = height as f32;
    NormalizedBox::new(min_x / w, min_y / h, (max_x - min_x) / w, (max_y - min_y) / h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rxing::datamatrix::DataMatrixWriter;
    use rxing::{BarcodeFormat, Writer};

    const MODULE: u32 = 8;
    const QUIET: u32 = 40;

    /// Render a Data Matrix symbol at `MODULE` px per module with a white margin
    fn render(value: &str) -> RgbImage {
        let matrix = DataMatrixWriter
            .encode(value, &BarcodeFormat::DATA_MATRIX, 0, 0)
            .unwrap();
        let (mw, mh) = (matrix.getWidth(), matrix.getHeight());
        let mut img = RgbImage::from_pixel(
            mw * MODULE + 2 * QUIET,
            mh * MODULE + 2 * QUIET,
            Rgb([255, 255, 255]),
        );
        for my in 0..mh {
            for mx in 0..mw {
                if !matrix.get(mx, my) {
                    continue;
                }
                for dy in 0..MODULE {
                    for dx in 0..MODULE {
                        let x = QUIET + mx * MODULE + dx;
                        let y = QUIET + my * MODULE + dy;
                        img.put_pixel(x, y, Rgb([0, 0, 0]));
                    }
                }
            }
        }
        img
    }

    #[test]
    fn test_decodes_rendered_symbol() {
        let region = render("TUBE-0042");
        let symbols = DataMatrixDecoder::new().decode(&region).unwrap();
        assert!(!symbols.is_empty());
        assert!(symbols.iter().all(|s| s.value == "TUBE-0042"));

        let b = symbols[0].bounds;
        assert!(b.x > 0.0 && b.y > 0.0);
        assert!(b.x + b.width < 1.0 && b.y + b.height < 1.0);
    }

    #[test]
    fn test_blank_region_has_no_symbols() {
        let region = RgbImage::from_pixel(120, 80, Rgb([255, 255, 255]));
        assert!(DataMatrixDecoder::new().decode(&region).unwrap().is_empty());
    }

    #[test]
    fn test_points_to_box() {
        let points = [
            Point { x: 10.0, y: 20.0 },
            Point { x: 50.0, y: 22.0 },
            Point { x: 48.0, y: 60.0 },
            Point { x: 12.0, y: 58.0 },
        ];
        let b = points_to_box(&points, 100, 100);
        assert_eq!(b, NormalizedBox::new(0.10, 0.20, 0.40, 0.40));
    }

    #[test]
    fn test_no_points_covers_region() {
        assert_eq!(points_to_box(&[], 64, 64), NormalizedBox::new(0.0, 0.0, 1.0, 1.0));
    }
}
