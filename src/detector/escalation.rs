//! Multi-pass escalation policy.
//!
//! A scan starts with one full-frame decode and escalates to finer tiling
//! only while too few unique codes have been found:
//!
//! ```text
//! FullFrame --(< coarse_below)--> Coarse --(< fine_below)--> Fine --> Done
//!     |                              |
//!     +--(< fine_below)--> Fine      +--(otherwise)--> Done
//!     +--(otherwise)-----> Done
//! ```
//!
//! The transition function is pure so the thresholds can be tested without a
//! decoder.

use std::fmt;

use crate::error::{Result, ScanError};

/// One decode pass of a scan, or the terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanPass {
    /// Decode the whole frame at once
    FullFrame,
    /// Tiled decode with large tiles
    Coarse,
    /// Tiled decode with small tiles
    Fine,
    /// No further passes
    Done,
}

impl fmt::Display for ScanPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPass::FullFrame => write!(f, "full-frame"),
            ScanPass::Coarse => write!(f, "coarse"),
            ScanPass::Fine => write!(f, "fine"),
            ScanPass::Done => write!(f, "done"),
        }
    }
}

/// Tiling parameters for one tiled pass
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TilePass {
    /// Target tile edge in pixels
    pub tile_size: u32,
    /// Padding on each side as a fraction of the nominal tile size
    pub overlap: f32,
}

impl TilePass {
    fn validate(&self, name: &str) -> Result<()> {
        if self.tile_size == 0 {
            return Err(ScanError::invalid_config(format!(
                "{name} tile size must be positive"
            )));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(ScanError::invalid_config(format!(
                "{name} overlap must be within 0..1, got {}",
                self.overlap
            )));
        }
        Ok(())
    }
}

/// Thresholds and tiling for the coarse and fine passes.
///
/// The defaults size tiles so that the smallest reliably decodable code
/// covers roughly 8% of a tile's width.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EscalationPolicy {
    /// Run the coarse pass when the full-frame pass found fewer unique codes
    pub coarse_below: usize,
    /// Run the fine pass when fewer unique codes have accumulated
    pub fine_below: usize,
    /// Coarse pass tiling
    pub coarse: TilePass,
    /// Fine pass tiling
    pub fine: TilePass,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            coarse_below: 5,
            fine_below: 10,
            coarse: TilePass {
                tile_size: 300,
                overlap: 0.25,
            },
            fine: TilePass {
                tile_size: 200,
                overlap: 0.30,
            },
        }
    }
}

impl EscalationPolicy {
    /// Next pass after `current` completed with `unique` codes accumulated
    pub fn next(&self, current: ScanPass, unique: usize) -> ScanPass {
        match current {
            ScanPass::FullFrame if unique < self.coarse_below => ScanPass::Coarse,
            ScanPass::FullFrame | ScanPass::Coarse if unique < self.fine_below => ScanPass::Fine,
            _ => ScanPass::Done,
        }
    }

    /// Tiling for a tiled pass; `None` for the full-frame and terminal states
    pub fn tiling(&self, pass: ScanPass) -> Option<TilePass> {
        match pass {
            ScanPass::Coarse => Some(self.coarse),
            ScanPass::Fine => Some(self.fine),
            ScanPass::FullFrame | ScanPass::Done => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.coarse_below == 0 || self.fine_below == 0 {
            return Err(ScanError::invalid_config(
                "escalation thresholds must be at least 1",
            ));
        }
        self.coarse.validate("coarse")?;
        self.fine.validate("fine")
    }
}
