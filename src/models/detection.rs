use super::{Point, Rect};

/// A single decoded code, produced by one decoder call and mapped into
/// full-frame pixel space
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawDetection {
    /// Decoded payload
    pub value: String,
    /// Bounding box with non-negative extents
    pub bounding_rect: Rect,
    /// Center of the bounding box
    pub center: Point,
}

impl RawDetection {
    /// Build a detection from a value and a (possibly unstandardized) rect.
    /// The center is derived from the rect.
    pub fn new(value: impl Into<String>, bounding_rect: Rect) -> Self {
        let bounding_rect = bounding_rect.standardized();
        Self {
            value: value.into(),
            center: bounding_rect.center(),
            bounding_rect,
        }
    }

    /// Detection with a square box of side `size` centered on `(x, y)`
    pub fn centered(value: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        let half = size / 2.0;
        Self::new(value, Rect::new(x - half, y - half, size, size))
    }
}

/// A detection assigned to a row/column slot of the rack grid.
///
/// Rows are numbered top-to-bottom and columns left-to-right within a row,
/// both from zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VialRecord {
    /// Decoded payload
    pub value: String,
    /// Row index
    pub row: usize,
    /// Column index within the row
    pub col: usize,
    /// Center of the code in frame pixels
    pub center: Point,
    /// Bounding box in frame pixels
    pub bounding_rect: Rect,
}

impl VialRecord {
    /// Center x coordinate
    pub fn center_x(&self) -> f32 {
        self.center.x
    }

    /// Center y coordinate
    pub fn center_y(&self) -> f32 {
        self.center.y
    }

    /// The `(row, col)` slot
    pub fn slot(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}
