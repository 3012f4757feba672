//! Error types for the scan pipeline.
//!
//! A scan either succeeds with a (possibly empty) [`crate::ScanReport`] or
//! fails as a whole with a [`ScanError`]. There is no partial success: a
//! failure in any pass or tile aborts the scan.

use thiserror::Error;

/// Failure reported by a [`crate::decoder::SymbolDecoder`] backend.
///
/// The pipeline never retries; the error surfaces to the caller unchanged.
#[derive(Error, Debug)]
#[error("symbol decoder failed: {message}")]
pub struct DecodeError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DecodeError {
    /// Creates a decode error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a decode error wrapping the backend's own error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The backend's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that abort a scan.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The source could not be turned into a pixel buffer.
    #[error("invalid image: {reason}")]
    InvalidImage {
        /// What went wrong.
        reason: String,
        /// Underlying codec error, when there is one.
        #[source]
        source: Option<image::ImageError>,
    },

    /// The symbol decoder failed on the full frame or on a tile.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Which value and why.
        message: String,
    },

    /// Reading the source file failed.
    #[error("failed to read image source")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Creates an `InvalidImage` error without a codec source.
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates an `InvalidConfig` error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for ScanError {
    fn from(err: image::ImageError) -> Self {
        Self::InvalidImage {
            reason: "could not decode image".to_string(),
            source: Some(err),
        }
    }
}

/// A malformed row in a records CSV.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("csv line {line}: {message}")]
pub struct CsvError {
    /// 1-based line number in the input.
    pub line: usize,
    /// What was wrong with the row.
    pub message: String,
}

/// A label font that could not be loaded.
#[derive(Error, Debug)]
pub enum FontError {
    /// The font file could not be read.
    #[error("failed to read font file")]
    Io(#[from] std::io::Error),

    /// The bytes are not a usable TrueType/OpenType font.
    #[error("not a usable font")]
    Parse(#[from] ab_glyph::InvalidFont),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ScanError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_decode_error_is_transparent() {
        let err: ScanError = DecodeError::new("engine offline").into();
        assert_eq!(err.to_string(), "symbol decoder failed: engine offline");
    }

    #[test]
    fn test_decode_error_keeps_source() {
        let io = std::io::Error::other("socket closed");
        let err = DecodeError::with_source("remote decoder", io);
        assert_eq!(err.message(), "remote decoder");
        assert!(err.source().is_some());
    }
}
