use super::Point;

/// Axis-aligned rectangle in normalized frame pixel space.
///
/// Decoders occasionally report rotated boxes with a negative width or
/// height. Use [`Rect::standardized`] before reading extents; [`Rect::center`]
/// is valid either way.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width (may be negative before standardization)
    pub width: f32,
    /// Height (may be negative before standardization)
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The empty rectangle at the origin
    pub fn zero() -> Self {
        Self::default()
    }

    /// Fold negative extents into the origin so width and height are non-negative
    pub fn standardized(&self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y).translate(self.width / 2.0, self.height / 2.0)
    }

    /// Longest side, by absolute value
    pub fn longest_side(&self) -> f32 {
        self.width.abs().max(self.height.abs())
    }
}
