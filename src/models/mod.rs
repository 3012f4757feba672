pub mod detection;
pub mod point;
pub mod rect;

pub use detection::{RawDetection, VialRecord};
pub use point::Point;
pub use rect::Rect;
