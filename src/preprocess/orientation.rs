use std::io::Cursor;

use image::DynamicImage;

/// EXIF orientation (tag 0x0112)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// 1: stored upright
    #[default]
    Normal,
    /// 2: mirrored horizontally
    MirrorHorizontal,
    /// 3: rotated 180°
    Rotate180,
    /// 4: mirrored vertically
    MirrorVertical,
    /// 5: transposed (mirrored across the main diagonal)
    Transpose,
    /// 6: needs a 90° clockwise rotation
    Rotate90,
    /// 7: transversed (mirrored across the anti-diagonal)
    Transverse,
    /// 8: needs a 270° clockwise rotation
    Rotate270,
}

impl Orientation {
    /// Map an EXIF orientation value; unknown values are treated as upright
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::MirrorHorizontal,
            3 => Self::Rotate180,
            4 => Self::MirrorVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    /// Read the orientation tag from encoded image bytes.
    /// Missing or unreadable EXIF means [`Orientation::Normal`].
    pub fn read(bytes: &[u8]) -> Self {
        let mut cursor = Cursor::new(bytes);
        let Ok(exif) = exif::Reader::new().read_from_container(&mut cursor) else {
            return Self::Normal;
        };
        exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Self::from_exif)
            .unwrap_or_default()
    }

    /// Whether width and height swap when applied
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }

    /// Bake the orientation into the pixels
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::MirrorHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::MirrorVertical => img.flipv(),
            Self::Transpose => img.rotate90().fliph(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.rotate270().fliph(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}
