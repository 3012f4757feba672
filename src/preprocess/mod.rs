//! Image normalization
//!
//! Turns an encoded photo into the canonical frame used by the rest of the
//! pipeline:
//! - EXIF orientation baked into the pixels
//! - Longest side capped at the configured maximum dimension

pub mod normalize;
pub mod orientation;

pub use normalize::{NormalizedFrame, normalize, normalize_bytes, normalize_path};
pub use orientation::Orientation;
