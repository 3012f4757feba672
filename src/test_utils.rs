//! Deterministic decoders and synthetic rack scenes for tests and benches.
//!
//! [`RackScene`] paints each code as a solid patch whose colour encodes its
//! index. [`SceneDecoder`] recognises a patch only when it lies wholly inside
//! the region and is at least a given fraction of the region's width, which
//! mimics a real engine missing small codes in a full-frame decode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgb, RgbImage};

use crate::decoder::{BoxOrigin, DecodeError, NormalizedBox, Symbol, SymbolDecoder};

/// Returns the same symbols for every region and counts calls
#[derive(Debug, Default)]
pub struct ScriptedDecoder {
    symbols: Vec<Symbol>,
    origin: BoxOrigin,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    /// Decoder that reports `symbols` with a top-left origin
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self {
            symbols,
            origin: BoxOrigin::TopLeft,
            calls: AtomicUsize::new(0),
        }
    }

    /// Report boxes in the given origin convention
    pub fn with_origin(mut self, origin: BoxOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Number of `decode` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SymbolDecoder for ScriptedDecoder {
    fn decode(&self, _region: &RgbImage) -> Result<Vec<Symbol>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.symbols.clone())
    }

    fn origin(&self) -> BoxOrigin {
        self.origin
    }
}

/// Fails every call after the first `succeed_first` calls
#[derive(Debug)]
pub struct FailingDecoder {
    message: String,
    succeed_first: usize,
    calls: AtomicUsize,
}

impl FailingDecoder {
    /// Decoder that always fails with `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self::after(0, message)
    }

    /// Decoder that returns no symbols for `succeed_first` calls, then fails
    pub fn after(succeed_first: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            succeed_first,
            calls: AtomicUsize::new(0),
        }
    }
}

impl SymbolDecoder for FailingDecoder {
    fn decode(&self, _region: &RgbImage) -> Result<Vec<Symbol>, DecodeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.succeed_first {
            Ok(Vec::new())
        } else {
            Err(DecodeError::new(self.message.clone()))
        }
    }
}

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// A square code placed in a scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCode {
    /// Payload
    pub value: String,
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Edge length in pixels
    pub size: u32,
}

/// A synthetic rack photo
#[derive(Debug, Clone)]
pub struct RackScene {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Codes in paint order
    pub codes: Vec<SceneCode>,
}

impl RackScene {
    /// Empty scene
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            codes: Vec::new(),
        }
    }

    /// Add a code with its top-left corner at `(x, y)`
    pub fn with_code(mut self, value: impl Into<String>, x: u32, y: u32, size: u32) -> Self {
        self.codes.push(SceneCode {
            value: value.into(),
            x,
            y,
            size,
        });
        self
    }

    /// Add a `rows` x `cols` block of codes named `R{row}C{col}`, centered on
    /// a lattice starting at `(x0, y0)` with the given pitch
    pub fn with_grid(
        mut self,
        rows: usize,
        cols: usize,
        (x0, y0): (u32, u32),
        pitch: u32,
        size: u32,
    ) -> Self {
        for r in 0..rows {
            for c in 0..cols {
                let cx = x0 + c as u32 * pitch;
                let cy = y0 + r as u32 * pitch;
                self = self.with_code(format!("R{r}C{c}"), cx - size / 2, cy - size / 2, size);
            }
        }
        self
    }

    /// Paint the scene
    pub fn render(&self) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        for (index, code) in self.codes.iter().enumerate() {
            let color = encode_index(index);
            for y in code.y..(code.y + code.size).min(self.height) {
                for x in code.x..(code.x + code.size).min(self.width) {
                    img.put_pixel(x, y, color);
                }
            }
        }
        img
    }

    /// Decoder for this scene that needs codes to be at least
    /// `min_fraction` of a region's width
    pub fn decoder(&self, min_fraction: f32) -> SceneDecoder {
        SceneDecoder {
            codes: self.codes.clone(),
            min_fraction,
            calls: AtomicUsize::new(0),
        }
    }
}

fn encode_index(index: usize) -> Rgb<u8> {
    Rgb([0, (index >> 8) as u8, (index & 0xff) as u8])
}

fn decode_index(pixel: &Rgb<u8>) -> Option<usize> {
    (pixel.0[0] == 0).then(|| ((pixel.0[1] as usize) << 8) | pixel.0[2] as usize)
}

/// Recogniser for patches painted by [`RackScene::render`]
#[derive(Debug)]
pub struct SceneDecoder {
    codes: Vec<SceneCode>,
    min_fraction: f32,
    calls: AtomicUsize,
}

impl SceneDecoder {
    /// Number of `decode` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SymbolDecoder for SceneDecoder {
    fn decode(&self, region: &RgbImage) -> Result<Vec<Symbol>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // index -> (min_x, min_y, max_x, max_y)
        let mut extents: HashMap<usize, (u32, u32, u32, u32)> = HashMap::new();
        for (x, y, pixel) in region.enumerate_pixels() {
            if let Some(index) = decode_index(pixel) {
                let e = extents.entry(index).or_insert((x, y, x, y));
                e.0 = e.0.min(x);
                e.1 = e.1.min(y);
                e.2 = e.2.max(x);
                e.3 = e.3.max(y);
            }
        }

        let rw = region.width() as f32;
        let rh = region.height() as f32;
        let mut found: Vec<(usize, Symbol)> = extents
            .into_iter()
            .filter_map(|(index, (x0, y0, x1, y1))| {
                let code = self.codes.get(index)?;
                let w = x1 - x0 + 1;
                let h = y1 - y0 + 1;
                // Clipped by the region edge
                if w != code.size || h != code.size {
                    return None;
                }
                if (code.size as f32) < self.min_fraction * rw {
                    return None;
                }
                let bounds = NormalizedBox::new(
                    x0 as f32 / rw,
                    y0 as f32 / rh,
                    w as f32 / rw,
                    h as f32 / rh,
                );
                Some((index, Symbol::new(code.value.clone(), bounds)))
            })
            .collect();
        found.sort_by_key(|(index, _)| *index);
        Ok(found.into_iter().map(|(_, symbol)| symbol).collect())
    }
}
