//! Scan configuration.
//!
//! [`ScanConfig`] gathers every tunable of the pipeline: the user-facing row
//! tolerance and maximum dimension, plus the escalation policy, dedup radius
//! and tiling limits. Construct it with [`ScanConfig::default`] or the
//! builder, which validates ranges.
//!
//! # Example
//! ```
//! use rack_scan::config::{MaxDimension, ScanConfig};
//!
//! let config = ScanConfig::builder()
//!     .row_tolerance(150.0)
//!     .max_dimension(MaxDimension::Px2000)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_dimension.pixels(), 2000);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::detector::escalation::EscalationPolicy;
use crate::detector::tiling::GridLimits;
use crate::error::{Result, ScanError};

/// Smallest accepted row tolerance, in pixels.
pub const MIN_ROW_TOLERANCE: f32 = 50.0;
/// Largest accepted row tolerance, in pixels.
pub const MAX_ROW_TOLERANCE: f32 = 300.0;
/// Default row tolerance, in pixels.
pub const DEFAULT_ROW_TOLERANCE: f32 = 100.0;
/// Default dedup radius, in pixels.
pub const DEFAULT_DEDUP_RADIUS: f32 = 60.0;

/// Cap on the longest side of the normalized frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaxDimension {
    /// 2000 px
    Px2000,
    /// 4000 px
    #[default]
    Px4000,
    /// 8000 px
    Px8000,
}

impl MaxDimension {
    /// All accepted values, smallest first
    pub const ALL: [MaxDimension; 3] = [Self::Px2000, Self::Px4000, Self::Px8000];

    /// Bound in pixels
    pub fn pixels(self) -> u32 {
        match self {
            Self::Px2000 => 2000,
            Self::Px4000 => 4000,
            Self::Px8000 => 8000,
        }
    }
}

impl TryFrom<u32> for MaxDimension {
    type Error = ScanError;

    fn try_from(value: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.pixels() == value)
            .ok_or_else(|| {
                ScanError::invalid_config(format!(
                    "max dimension must be 2000, 4000 or 8000, got {value}"
                ))
            })
    }
}

impl FromStr for MaxDimension {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_end_matches("px").trim();
        let value = trimmed.parse::<u32>().map_err(|_| {
            ScanError::invalid_config(format!("max dimension is not a number: {s:?}"))
        })?;
        Self::try_from(value)
    }
}

impl fmt::Display for MaxDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.pixels())
    }
}

/// Pipeline configuration. Immutable once handed to a [`crate::Scanner`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanConfig {
    /// Max vertical distance (px) between a code and its row band's mean Y.
    pub row_tolerance: f32,
    /// Cap on the normalized frame's longest side.
    pub max_dimension: MaxDimension,
    /// When to run the coarse and fine tiled passes, and how to tile them.
    pub escalation: EscalationPolicy,
    /// Two detections with the same value closer than this (px) are one code.
    pub dedup_radius: f32,
    /// Bounds on tile grid dimensions.
    pub grid_limits: GridLimits,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            max_dimension: MaxDimension::default(),
            escalation: EscalationPolicy::default(),
            dedup_radius: DEFAULT_DEDUP_RADIUS,
            grid_limits: GridLimits::default(),
        }
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    #[must_use]
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Check every value against its accepted range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_ROW_TOLERANCE..=MAX_ROW_TOLERANCE).contains(&self.row_tolerance) {
            return Err(ScanError::invalid_config(format!(
                "row tolerance must be within {MIN_ROW_TOLERANCE}..={MAX_ROW_TOLERANCE} px, got {}",
                self.row_tolerance
            )));
        }
        if self.dedup_radius.is_nan() || self.dedup_radius <= 0.0 {
            return Err(ScanError::invalid_config(format!(
                "dedup radius must be positive, got {}",
                self.dedup_radius
            )));
        }
        self.escalation.validate()?;
        self.grid_limits.validate()
    }
}

/// Builder for [`ScanConfig`]. Unset fields keep their defaults.
#[derive(Debug, Default)]
pub struct ScanConfigBuilder {
    row_tolerance: Option<f32>,
    max_dimension: Option<MaxDimension>,
    escalation: Option<EscalationPolicy>,
    dedup_radius: Option<f32>,
    grid_limits: Option<GridLimits>,
}

impl ScanConfigBuilder {
    /// Set the row tolerance in pixels (50..=300).
    #[must_use]
    pub fn row_tolerance(mut self, pixels: f32) -> Self {
        self.row_tolerance = Some(pixels);
        self
    }

    /// Set the maximum frame dimension.
    #[must_use]
    pub fn max_dimension(mut self, max_dimension: MaxDimension) -> Self {
        self.max_dimension = Some(max_dimension);
        self
    }

    /// Replace the escalation policy.
    #[must_use]
    pub fn escalation(mut self, escalation: EscalationPolicy) -> Self {
        self.escalation = Some(escalation);
        self
    }

    /// Set the dedup radius in pixels.
    #[must_use]
    pub fn dedup_radius(mut self, pixels: f32) -> Self {
        self.dedup_radius = Some(pixels);
        self
    }

    /// Replace the tile grid limits.
    #[must_use]
    pub fn grid_limits(mut self, grid_limits: GridLimits) -> Self {
        self.grid_limits = Some(grid_limits);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ScanConfig> {
        let d = ScanConfig::default();
        let config = ScanConfig {
            row_tolerance: self.row_tolerance.unwrap_or(d.row_tolerance),
            max_dimension: self.max_dimension.unwrap_or(d.max_dimension),
            escalation: self.escalation.unwrap_or(d.escalation),
            dedup_radius: self.dedup_radius.unwrap_or(d.dedup_radius),
            grid_limits: self.grid_limits.unwrap_or(d.grid_limits),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::escalation::TilePass;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.row_tolerance, 100.0);
        assert_eq!(config.max_dimension.pixels(), 4000);
        assert_eq!(config.dedup_radius, 60.0);
    }

    #[test]
    fn test_builder_rejects_out_of_range_tolerance() {
        assert!(ScanConfig::builder().row_tolerance(49.0).build().is_err());
        assert!(ScanConfig::builder().row_tolerance(301.0).build().is_err());
        assert!(ScanConfig::builder().row_tolerance(50.0).build().is_ok());
        assert!(ScanConfig::builder().row_tolerance(300.0).build().is_ok());
    }

    #[test]
    fn test_builder_rejects_bad_escalation() {
        let policy = EscalationPolicy {
            coarse: TilePass {
                tile_size: 300,
                overlap: 1.5,
            },
            ..EscalationPolicy::default()
        };
        let err = ScanConfig::builder().escalation(policy).build().unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig { .. }));
    }

    #[test]
    fn test_max_dimension_parsing() {
        assert_eq!(MaxDimension::try_from(8000).unwrap(), MaxDimension::Px8000);
        assert_eq!("2000".parse::<MaxDimension>().unwrap(), MaxDimension::Px2000);
        assert_eq!("4000px".parse::<MaxDimension>().unwrap(), MaxDimension::Px4000);
        assert!(MaxDimension::try_from(3000).is_err());
        assert!("big".parse::<MaxDimension>().is_err());
        assert_eq!(MaxDimension::Px8000.to_string(), "8000px");
    }
}
