//! Symbol decoder interface
//!
//! The pipeline does not recognise codes itself. It hands pixel regions to a
//! [`SymbolDecoder`] and maps the normalized boxes it returns back into frame
//! pixels. Backends only need to report the origin convention of their boxes.

#[cfg(feature = "datamatrix")]
/// Data Matrix backend built on `rxing`
pub mod datamatrix;
#[cfg(feature = "qr")]
/// QR backend built on `rqrr`
pub mod qr;

use image::RgbImage;

pub use crate::error::DecodeError;

// Rec. 601 luma in 8.8 fixed point
#[cfg(any(feature = "qr", feature = "datamatrix"))]
pub(crate) fn luma8(rgb: [u8; 3]) -> u8 {
    const COEF_R: u32 = 77;
    const COEF_G: u32 = 150;
    const COEF_B: u32 = 29;
    let lum = (COEF_R * rgb[0] as u32 + COEF_G * rgb[1] as u32 + COEF_B * rgb[2] as u32) >> 8;
    lum.min(255) as u8
}

/// Where a decoder puts the origin of its normalized boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxOrigin {
    /// `y = 0` is the top edge of the region (image convention)
    #[default]
    TopLeft,
    /// `y = 0` is the bottom edge of the region (Quartz/Vision convention)
    BottomLeft,
}

/// Bounding box relative to the decoded region, components in `[0, 1]`.
/// Width and height may be negative for rotated boxes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedBox {
    /// Left edge
    pub x: f32,
    /// Edge nearest the origin on the vertical axis
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl NormalizedBox {
    /// Create a new normalized box
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One code found in a region
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Decoded payload; empty payloads are discarded by the pipeline
    pub value: String,
    /// Location within the region
    pub bounds: NormalizedBox,
}

impl Symbol {
    /// Create a new symbol
    pub fn new(value: impl Into<String>, bounds: NormalizedBox) -> Self {
        Self {
            value: value.into(),
            bounds,
        }
    }
}

/// A code recognition engine.
///
/// Implementations are shared by all tiles of a pass, which decode
/// concurrently, so they must be `Send + Sync`.
pub trait SymbolDecoder: Send + Sync {
    /// Decode every code in `region`
    fn decode(&self, region: &RgbImage) -> Result<Vec<Symbol>, DecodeError>;

    /// Origin convention of the boxes returned by [`SymbolDecoder::decode`]
    fn origin(&self) -> BoxOrigin {
        BoxOrigin::TopLeft
    }
}

impl<T: SymbolDecoder + ?Sized> SymbolDecoder for &T {
    fn decode(&self, region: &RgbImage) -> Result<Vec<Symbol>, DecodeError> {
        (**self).decode(region)
    }

    fn origin(&self) -> BoxOrigin {
        (**self).origin()
    }
}

impl<T: SymbolDecoder + ?Sized> SymbolDecoder for Box<T> {
    fn decode(&self, region: &RgbImage) -> Result<Vec<Symbol>, DecodeError> {
        (**self).decode(region)
    }

    fn origin(&self) -> BoxOrigin {
        (**self).origin()
    }
}
