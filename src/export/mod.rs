//! Scan output
//!
//! - CSV export of records, plus a parser to reload an export
//! - Annotated overlay of the records on the normalized frame

pub mod csv;
pub mod overlay;

pub use self::csv::{CSV_HEADER, parse_csv, to_csv, write_csv};
pub use self::overlay::{OverlayStyle, render_overlay};
