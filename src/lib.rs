//! rack_scan - Batch reading of coded sample tubes from a single rack photo
//!
//! Decodes every 2D code visible in a photo of a rack, escalating from one
//! full-frame decode to progressively finer tiling until enough codes are
//! found, then infers each code's row and column in the rack. Results can be
//! exported as CSV or drawn over the frame.
//!
//! Code recognition itself is delegated to a [`SymbolDecoder`]. The
//! `datamatrix` feature provides one built on `rxing` and the `qr` feature one
//! built on `rqrr`.
//!
//! # Example
//! ```
//! use rack_scan::Scanner;
//! use rack_scan::test_utils::RackScene;
//!
//! let scene = RackScene::new(800, 600).with_grid(2, 3, (150, 150), 250, 120);
//! let scanner = Scanner::new(scene.decoder(0.0));
//! let report = scanner
//!     .scan_image(scene.render().into(), rack_scan::Orientation::Normal)
//!     .unwrap();
//! assert_eq!(report.len(), 6);
//! assert_eq!(report.records[4].slot(), (1, 1));
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Scan settings and their validation
pub mod config;
/// Symbol decoder interface and backends
pub mod decoder;
/// Multi-pass detection (tiling, dispatch, dedup, escalation)
pub mod detector;
/// Error types
pub mod error;
/// CSV export and annotated overlay rendering
pub mod export;
/// Row/column inference
pub mod grid;
/// Core data structures (RawDetection, VialRecord, Rect, Point)
pub mod models;
/// Scanner and scan report
pub mod pipeline;
/// EXIF orientation and frame normalization
pub mod preprocess;
/// Deterministic decoders and synthetic scenes for tests and benches
pub mod test_utils;

use std::path::Path;

pub use config::{MaxDimension, ScanConfig};
pub use decoder::{BoxOrigin, NormalizedBox, Symbol, SymbolDecoder};
pub use error::{CsvError, DecodeError, FontError, Result, ScanError};
pub use models::{Point, RawDetection, Rect, VialRecord};
pub use pipeline::{PassSummary, ScanReport, Scanner};
pub use preprocess::{NormalizedFrame, Orientation};

#[cfg(feature = "datamatrix")]
pub use decoder::datamatrix::DataMatrixDecoder;
#[cfg(feature = "qr")]
pub use decoder::qr::QrDecoder;

/// Scan encoded image bytes with the default configuration
///
/// # Arguments
/// * `bytes` - Encoded image (JPEG, PNG, ...); EXIF orientation is honoured
/// * `decoder` - Symbol decoder to run on each region
///
/// # Returns
/// The report on success, which may hold no records. Fails on undecodable
/// input or when the decoder reports an error.
pub fn scan<D: SymbolDecoder>(bytes: &[u8], decoder: D) -> Result<ScanReport> {
    Scanner::new(decoder).scan_bytes(bytes)
}

/// Scan an image file with the default configuration
pub fn scan_path<D: SymbolDecoder, P: AsRef<Path>>(path: P, decoder: D) -> Result<ScanReport> {
    Scanner::new(decoder).scan_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RackScene, ScriptedDecoder};
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn png(scene: &RackScene) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(scene.render())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_scan_empty_image() {
        let bytes = png(&RackScene::new(64, 64));
        let report = scan(&bytes, ScriptedDecoder::default()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.frame_size, (64, 64));
    }

    #[test]
    fn test_scan_invalid_bytes() {
        let err = scan(b"\x00\x01\x02", ScriptedDecoder::default()).unwrap_err();
        assert!(matches!(err, ScanError::InvalidImage { .. }));
    }

    #[test]
    fn test_scan_png_grid() {
        let scene = RackScene::new(900, 700).with_grid(2, 3, (150, 150), 300, 140);
        let report = scan(&png(&scene), scene.decoder(0.0)).unwrap();
        let values: Vec<&str> = report.records.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["R0C0", "R0C1", "R0C2", "R1C0", "R1C1", "R1C2"]);
        for record in &report.records {
            assert_eq!(record.value, format!("R{}C{}", record.row, record.col));
        }
    }

    #[test]
    fn test_scan_path_missing_file() {
        let err = scan_path("/definitely/not/here.png", ScriptedDecoder::default()).unwrap_err();
        assert!(matches!(err, ScanError::Io(_)));
    }
}
