//! Tile planning for the tiled decode passes.
//!
//! Grid dimensions adapt to the frame so each tile is roughly a target size,
//! within [`GridLimits`]. Tiles overlap their neighbours so a code straddling
//! a nominal boundary lies wholly inside at least one tile.

use crate::error::{Result, ScanError};

/// Bounds on the number of tile columns and rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLimits {
    /// Lower bound for both axes; 2 guarantees the frame is subdivided
    pub min: usize,
    /// Upper bound on columns
    pub max_cols: usize,
    /// Upper bound on rows
    pub max_rows: usize,
}

impl Default for GridLimits {
    fn default() -> Self {
        Self {
            min: 2,
            max_cols: 10,
            max_rows: 14,
        }
    }
}

impl GridLimits {
    /// Check that the bounds are usable
    pub fn validate(&self) -> Result<()> {
        if self.min == 0 || self.max_cols < self.min || self.max_rows < self.min {
            return Err(ScanError::invalid_config(format!(
                "grid limits need 1 <= min <= max_cols/max_rows, \
                 got min={} max_cols={} max_rows={}",
                self.min, self.max_cols, self.max_rows
            )));
        }
        Ok(())
    }
}

/// Integer pixel rectangle of one tile inside the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width (at least 1)
    pub width: u32,
    /// Height (at least 1)
    pub height: u32,
}

impl TileRect {
    /// A single tile covering a whole `width` x `height` frame
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether pixel `(px, py)` falls inside the tile
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

/// Grid dimensions `(cols, rows)` aiming for tiles about `target_tile_size` pixels wide.
///
/// `cols = clamp(ceil(width / T), min, max_cols)`, likewise for rows.
pub fn adaptive_grid(
    width: u32,
    height: u32,
    target_tile_size: u32,
    limits: &GridLimits,
) -> (usize, usize) {
    let target = target_tile_size.max(1) as f32;
    let cols = (width as f32 / target).ceil() as usize;
    let rows = (height as f32 / target).ceil() as usize;
    (
        cols.clamp(limits.min, limits.max_cols),
        rows.clamp(limits.min, limits.max_rows),
    )
}

/// Overlapping tile rectangles covering a `width` x `height` frame, row-major.
///
/// Each nominal cell is padded by `overlap * cell` on every side and clamped
/// to the frame. Origins are floored and far edges ceiled, so the union of
/// the tiles always covers every pixel.
pub fn plan_tiles(
    width: u32,
    height: u32,
    cols: usize,
    rows: usize,
    overlap: f32,
) -> Vec<TileRect> {
    if width == 0 || height == 0 || cols == 0 || rows == 0 {
        return Vec::new();
    }

    let frame_w = width as f32;
    let frame_h = height as f32;
    let tile_w = frame_w / cols as f32;
    let tile_h = frame_h / rows as f32;
    let pad_w = tile_w * overlap;
    let pad_h = tile_h * overlap;

    let mut tiles = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            let x0 = (col as f32 * tile_w - pad_w).max(0.0);
            let y0 = (row as f32 * tile_h - pad_h).max(0.0);
            let x1 = (x0 + tile_w + 2.0 * pad_w).min(frame_w);
            let y1 = (y0 + tile_h + 2.0 * pad_h).min(frame_h);

            let x = (x0.floor() as u32).min(width - 1);
            let y = (y0.floor() as u32).min(height - 1);
            let right = (x1.ceil() as u32).clamp(x + 1, width);
            let bottom = (y1.ceil() as u32).clamp(y + 1, height);

            tiles.push(TileRect {
                x,
                y,
                width: right - x,
                height: bottom - y,
            });
        }
    }
    tiles
}
