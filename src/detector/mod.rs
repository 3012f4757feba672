//! Code detection over a normalized frame
//!
//! This module contains the multi-pass search for codes:
//! - Tile planning (adaptive grid with overlap)
//! - Concurrent dispatch of tiles to the symbol decoder
//! - Proximity deduplication of repeated sightings
//! - The escalation policy choosing the next pass

/// Proximity deduplication of raw detections
pub mod dedup;
/// Concurrent tile decoding and coordinate mapping
pub mod dispatch;
/// Pass sequencing and tiling parameters
pub mod escalation;
/// Adaptive tile grids and overlapping tile rectangles
pub mod tiling;

pub use escalation::{EscalationPolicy, ScanPass, TilePass};
pub use tiling::{GridLimits, TileRect};
