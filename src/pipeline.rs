use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info, info_span, warn};

use crate::config::ScanConfig;
use crate::decoder::SymbolDecoder;
use crate::detector::dedup::merge;
use crate::detector::dispatch::dispatch;
use crate::detector::escalation::ScanPass;
use crate::detector::tiling::{TileRect, adaptive_grid, plan_tiles};
use crate::error::Result;
use crate::grid::infer_grid;
use crate::models::{RawDetection, VialRecord};
use crate::preprocess::{NormalizedFrame, Orientation, normalize, normalize_bytes, normalize_path};

/// What one decode pass did
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassSummary {
    /// Which pass ran
    pub pass: ScanPass,
    /// Tile grid `(cols, rows)`; `(1, 1)` for the full-frame pass
    pub grid: (usize, usize),
    /// Detections returned by the decoder before dedup
    pub raw_detections: usize,
    /// Unique detections accumulated after merging this pass
    pub unique_after: usize,
}

/// Outcome of a successful scan.
///
/// An empty report is a valid result ("nothing found"), distinct from a
/// scan error.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanReport {
    /// Records in row-major order
    pub records: Vec<VialRecord>,
    /// Final deduplicated detections in pass order
    pub detections: Vec<RawDetection>,
    /// One entry per pass that ran
    pub passes: Vec<PassSummary>,
    /// Normalized frame size `(width, height)`
    pub frame_size: (u32, u32),
    /// Downscale applied by normalization
    pub scale: f32,
}

impl ScanReport {
    /// True when no code survived all passes
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Multi-pass scanner over a symbol decoder
pub struct Scanner<D> {
    decoder: D,
    config: ScanConfig,
}

impl<D: SymbolDecoder> Scanner<D> {
    /// Scanner with the default configuration
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            config: ScanConfig::default(),
        }
    }

    /// Scanner with a custom configuration; fails if it is out of range
    pub fn with_config(decoder: D, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { decoder, config })
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Underlying decoder
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Scan encoded image bytes (EXIF orientation honoured)
    pub fn scan_bytes(&self, bytes: &[u8]) -> Result<ScanReport> {
        let frame = normalize_bytes(bytes, self.config.max_dimension.pixels())?;
        self.scan_frame(&frame)
    }

    /// Scan an image file
    pub fn scan_path<P: AsRef<Path>>(&self, path: P) -> Result<ScanReport> {
        let frame = normalize_path(path, self.config.max_dimension.pixels())?;
        self.scan_frame(&frame)
    }

    /// Scan an already decoded image
    pub fn scan_image(&self, image: DynamicImage, orientation: Orientation) -> Result<ScanReport> {
        let frame = normalize(image, orientation, self.config.max_dimension.pixels())?;
        self.scan_frame(&frame)
    }

    /// Detect and grid a normalized frame
    pub fn scan_frame(&self, frame: &NormalizedFrame) -> Result<ScanReport> {
        let (detections, passes) = self.detect(frame)?;
        let records = infer_grid(&detections, self.config.row_tolerance);

        if records.is_empty() {
            warn!(passes = passes.len(), "scan finished without any code");
        } else {
            info!(
                records = records.len(),
                rows = records.last().map_or(0, |r| r.row + 1),
                "grid inferred"
            );
        }

        Ok(ScanReport {
            records,
            detections,
            passes,
            frame_size: (frame.width(), frame.height()),
            scale: frame.scale(),
        })
    }

    /// Run the escalating decode passes over a frame.
    ///
    /// Passes run one after another; each pass's tiles decode concurrently
    /// and are merged into the running set before the next pass is chosen.
    pub fn detect(&self, frame: &NormalizedFrame) -> Result<(Vec<RawDetection>, Vec<PassSummary>)> {
        let policy = &self.config.escalation;
        let mut running: Vec<RawDetection> = Vec::new();
        let mut passes = Vec::new();
        let mut pass = ScanPass::FullFrame;

        while pass != ScanPass::Done {
            let _span = info_span!("scan_pass", %pass).entered();

            let (grid, tiles) = self.tiles_for(pass, frame);
            let found = dispatch(&self.decoder, frame.image(), &tiles)?;
            let raw_detections = found.len();
            running = merge(running, found, self.config.dedup_radius);

            log_pass(pass, grid, raw_detections, &running);
            passes.push(PassSummary {
                pass,
                grid,
                raw_detections,
                unique_after: running.len(),
            });

            pass = policy.next(pass, running.len());
        }

        Ok((running, passes))
    }

    fn tiles_for(
        &self,
        pass: ScanPass,
        frame: &NormalizedFrame,
    ) -> ((usize, usize), Vec<TileRect>) {
        let (width, height) = (frame.width(), frame.height());
        match self.config.escalation.tiling(pass) {
            Some(tiling) => {
                let (cols, rows) =
                    adaptive_grid(width, height, tiling.tile_size, &self.config.grid_limits);
                let tiles = plan_tiles(width, height, cols, rows, tiling.overlap);
                debug!(cols, rows, tiles = tiles.len(), overlap = tiling.overlap, "tile plan");
                ((cols, rows), tiles)
            }
            None => ((1, 1), vec![TileRect::full(width, height)]),
        }
    }
}

fn log_pass(pass: ScanPass, grid: (usize, usize), raw: usize, running: &[RawDetection]) {
    if running.is_empty() {
        info!(grid = ?grid, raw, "{pass} pass: 0 codes found");
    } else {
        let values: Vec<&str> = running.iter().map(|d| d.value.as_str()).collect();
        info!(
            grid = ?grid,
            raw,
            unique = running.len(),
            "{pass} pass: {} code(s): {}",
            running.len(),
            values.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{NormalizedBox, Symbol};
    use crate::error::ScanError;
    use crate::test_utils::{FailingDecoder, RackScene, ScriptedDecoder};
    use image::RgbImage;

    fn frame(w: u32, h: u32) -> NormalizedFrame {
        NormalizedFrame::from_rgb(RgbImage::new(w, h))
    }

    fn symbols(n: usize) -> Vec<Symbol> {
        (0..n)
            .map(|i| {
                let x = 0.05 + 0.09 * (i % 10) as f32;
                let y = 0.05 + 0.3 * (i / 10) as f32;
                Symbol::new(format!("S{i}"), NormalizedBox::new(x, y, 0.02, 0.02))
            })
            .collect()
    }

    fn pass_kinds(passes: &[PassSummary]) -> Vec<ScanPass> {
        passes.iter().map(|p| p.pass).collect()
    }

    #[test]
    fn test_four_full_frame_codes_trigger_coarse() {
        // Tiles report nothing new; only the full frame sees codes
        let scene = RackScene::new(1000, 1000)
            .with_code("A", 100, 100, 200)
            .with_code("B", 700, 100, 200)
            .with_code("C", 100, 700, 200)
            .with_code("D", 700, 700, 200);
        let decoder = scene.decoder(0.15);
        let scanner = Scanner::new(&decoder);
        let (found, passes) = scanner
            .detect(&NormalizedFrame::from_rgb(scene.render()))
            .unwrap();
        assert_eq!(found.len(), 4);
        assert_eq!(pass_kinds(&passes)[..2], [ScanPass::FullFrame, ScanPass::Coarse]);
    }

    #[test]
    fn test_five_full_frame_codes_skip_coarse() {
        let decoder = ScriptedDecoder::new(symbols(5));
        let scanner = Scanner::new(&decoder);
        let (_, passes) = scanner.detect(&frame(2000, 2000)).unwrap();
        assert_eq!(pass_kinds(&passes), vec![ScanPass::FullFrame, ScanPass::Fine]);
    }

    #[test]
    fn test_ten_full_frame_codes_stop_immediately() {
        let decoder = ScriptedDecoder::new(symbols(10));
        let scanner = Scanner::new(&decoder);
        let (found, passes) = scanner.detect(&frame(2000, 2000)).unwrap();
        assert_eq!(found.len(), 10);
        assert_eq!(pass_kinds(&passes), vec![ScanPass::FullFrame]);
        assert_eq!(decoder.calls(), 1);
    }

    #[test]
    fn test_empty_scan_runs_three_passes_and_succeeds() {
        let decoder = ScriptedDecoder::new(Vec::new());
        let scanner = Scanner::new(&decoder);
        let report = scanner.scan_frame(&frame(600, 600)).unwrap();
        assert!(report.is_empty());
        assert_eq!(
            pass_kinds(&report.passes),
            vec![ScanPass::FullFrame, ScanPass::Coarse, ScanPass::Fine]
        );
        // 1 full frame + 2x2 coarse + 3x3 fine
        assert_eq!(decoder.calls(), 1 + 4 + 9);
        assert_eq!(report.passes[1].grid, (2, 2));
        assert_eq!(report.passes[2].grid, (3, 3));
    }

    #[test]
    fn test_decode_error_in_tiled_pass_fails_scan() {
        let decoder = FailingDecoder::after(1, "tile exploded");
        let scanner = Scanner::new(&decoder);
        let err = scanner.scan_frame(&frame(600, 600)).unwrap_err();
        match err {
            ScanError::Decode(e) => assert_eq!(e.message(), "tile exploded"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_with_config_validates() {
        let config = ScanConfig {
            row_tolerance: 10.0,
            ..ScanConfig::default()
        };
        assert!(Scanner::with_config(ScriptedDecoder::default(), config).is_err());
    }
}
