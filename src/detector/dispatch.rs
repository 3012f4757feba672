//! Fan-out of tile regions to the symbol decoder.
//!
//! Every tile of a pass is decoded on the rayon pool and joined before the
//! pass returns. Results are concatenated in tile order, so the output does
//! not depend on which tile finishes first. The first failing tile fails the
//! whole pass and sibling results are discarded.

use std::borrow::Cow;

use image::RgbImage;
use image::imageops;
use rayon::prelude::*;
use tracing::trace;

use super::tiling::TileRect;
use crate::decoder::{BoxOrigin, DecodeError, NormalizedBox, SymbolDecoder};
use crate::models::{RawDetection, Rect};

/// Decode all `tiles` of `frame` concurrently.
pub fn dispatch<D>(
    decoder: &D,
    frame: &RgbImage,
    tiles: &[TileRect],
) -> Result<Vec<RawDetection>, DecodeError>
where
    D: SymbolDecoder + ?Sized,
{
    let per_tile = tiles
        .par_iter()
        .map(|tile| decode_tile(decoder, frame, tile))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(per_tile.into_iter().flatten().collect())
}

/// Decode a single tile and map its symbols into frame pixels
pub fn decode_tile<D>(
    decoder: &D,
    frame: &RgbImage,
    tile: &TileRect,
) -> Result<Vec<RawDetection>, DecodeError>
where
    D: SymbolDecoder + ?Sized,
{
    let region: Cow<'_, RgbImage> = if tile.x == 0
        && tile.y == 0
        && tile.width == frame.width()
        && tile.height == frame.height()
    {
        Cow::Borrowed(frame)
    } else {
        Cow::Owned(imageops::crop_imm(frame, tile.x, tile.y, tile.width, tile.height).to_image())
    };

    let symbols = decoder.decode(&region)?;
    trace!(
        x = tile.x,
        y = tile.y,
        width = tile.width,
        height = tile.height,
        found = symbols.len(),
        "tile decoded"
    );

    let origin = decoder.origin();
    Ok(symbols
        .into_iter()
        .filter(|symbol| !symbol.value.is_empty())
        .map(|symbol| {
            let rect = to_frame_rect(&symbol.bounds, tile, origin);
            RawDetection::new(symbol.value, rect)
        })
        .collect())
}

/// Map a tile-relative normalized box into frame pixel space.
///
/// Bottom-left boxes are flipped with `y' = 1 - y - h` before scaling.
pub fn to_frame_rect(bounds: &NormalizedBox, tile: &TileRect, origin: BoxOrigin) -> Rect {
    let tile_w = tile.width as f32;
    let tile_h = tile.height as f32;
    let y = match origin {
        BoxOrigin::TopLeft => bounds.y,
        BoxOrigin::BottomLeft => 1.0 - bounds.y - bounds.height,
    };
    Rect::new(
        tile.x as f32 + bounds.x * tile_w,
        tile.y as f32 + y * tile_h,
        bounds.width * tile_w,
        bounds.height * tile_h,
    )
    .standardized()
}
