//! Annotated overlay of scan records.
//!
//! Each record gets a circle centred on its bounding rect with radius
//! `longest_side / 2 + padding`, and a filled tab just above the circle
//! carrying the label `"{n}: {value}"`, numbered in CSV row order. Label
//! text needs a font; without one only the tab is drawn, sized by the label
//! length.

use std::path::Path;

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_text_mut, text_size};
use imageproc::rect::Rect as PixelRect;
use tracing::{debug, info};

use crate::error::FontError;
use crate::models::VialRecord;

const SYSTEM_FONTS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Colours, sizes and label font for [`render_overlay`]
#[derive(Debug)]
pub struct OverlayStyle {
    /// Circle stroke
    pub circle_color: Rgb<u8>,
    /// Label tab fill
    pub label_color: Rgb<u8>,
    /// Label text
    pub text_color: Rgb<u8>,
    /// Stroke width in pixels
    pub line_width: u32,
    /// Gap between the code and its circle
    pub padding: f32,
    /// Minimum tab height in pixels
    pub label_height: u32,
    /// Tab width per label character when no font is set
    pub char_width: u32,
    /// Label font. `None` skips text rendering.
    pub font: Option<FontVec>,
    /// Label font size in pixels
    pub font_scale: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            circle_color: Rgb([31, 149, 145]),
            label_color: Rgb([166, 33, 59]),
            text_color: Rgb([255, 255, 255]),
            line_width: 3,
            padding: 8.0,
            label_height: 14,
            char_width: 7,
            font: None,
            font_scale: 16.0,
        }
    }
}

impl OverlayStyle {
    /// Default style with labels drawn in the given TrueType/OpenType font
    pub fn with_font_bytes(data: Vec<u8>) -> Result<Self, FontError> {
        let font = FontVec::try_from_vec(data)?;
        Ok(Self {
            font: Some(font),
            ..Self::default()
        })
    }

    /// Default style with labels drawn in the font at `path`
    pub fn with_font_path(path: &Path) -> Result<Self, FontError> {
        let style = Self::with_font_bytes(std::fs::read(path)?)?;
        debug!("Loaded label font: {}", path.display());
        Ok(style)
    }

    /// Default style using the first system font found.
    ///
    /// Falls back to text-less labels when none of the usual locations
    /// holds a readable font.
    pub fn with_system_font() -> Self {
        for path in SYSTEM_FONTS {
            if let Ok(style) = Self::with_font_path(Path::new(path)) {
                info!("Loaded system font: {}", path);
                return style;
            }
        }

        debug!("No system font found, overlay labels will have no text");
        Self::default()
    }
}

/// Draw every record over a copy of `frame`.
///
/// `frame` must be the normalized frame the records were produced from;
/// the output has the same dimensions.
pub fn render_overlay(
    frame: &RgbImage,
    records: &[VialRecord],
    style: &OverlayStyle,
) -> RgbImage {
    let mut canvas = frame.clone();

    for (index, record) in records.iter().enumerate() {
        let rect = record.bounding_rect.standardized();
        let center = rect.center();
        let radius = rect.longest_side() / 2.0 + style.padding;
        let cx = center.x.round() as i32;
        let cy = center.y.round() as i32;

        // Thicken the stroke inwards and outwards around the nominal radius
        let half = style.line_width as i32 / 2;
        for offset in -half..=(style.line_width as i32 - 1 - half) {
            let r = radius.round() as i32 + offset;
            if r > 0 {
                draw_hollow_circle_mut(&mut canvas, (cx, cy), r, style.circle_color);
            }
        }

        let label = format!("{}: {}", index + 1, record.value);
        let (tab_w, tab_h) = match &style.font {
            Some(font) => {
                let (text_w, _) = text_size(style.font_scale, font, &label);
                let text_h = style.font_scale.ceil() as u32 + 2;
                (text_w + 4, style.label_height.max(text_h))
            }
            None => (label.chars().count() as u32 * style.char_width, style.label_height),
        };
        let (tab_w, tab_h) = (tab_w.max(1), tab_h.max(1));
        let tab_x = cx - tab_w as i32 / 2;
        let tab_y = cy - radius.round() as i32 - tab_h as i32 - 3;
        draw_filled_rect_mut(
            &mut canvas,
            PixelRect::at(tab_x, tab_y).of_size(tab_w, tab_h),
            style.label_color,
        );

        if let Some(font) = &style.font {
            draw_text_mut(
                &mut canvas,
                style.text_color,
                tab_x + 2,
                tab_y + 1,
                style.font_scale,
                font,
                &label,
            );
        }
    }

    debug!(records = records.len(), text = style.font.is_some(), "overlay rendered");
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, Rect};

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const FONT: &[u8] = include_bytes!("../../tests/fixtures/DejaVuSans.ttf");

    fn record(value: &str, x: f32, y: f32, size: f32) -> VialRecord {
        VialRecord {
            value: value.to_string(),
            row: 0,
            col: 0,
            center: Point::new(x, y),
            bounding_rect: Rect::new(x - size / 2.0, y - size / 2.0, size, size),
        }
    }

    fn font_style() -> OverlayStyle {
        OverlayStyle::with_font_bytes(FONT.to_vec()).unwrap()
    }

    #[test]
    fn test_no_records_is_identity() {
        let frame = RgbImage::from_pixel(50, 40, WHITE);
        assert_eq!(render_overlay(&frame, &[], &OverlayStyle::default()), frame);
    }

    #[test]
    fn test_circle_and_tab_positions() {
        let frame = RgbImage::from_pixel(200, 200, WHITE);
        let style = OverlayStyle::default();
        let out = render_overlay(&frame, &[record("A", 100.0, 120.0, 40.0)], &style);
        assert_eq!(out.dimensions(), (200, 200));

        // radius = 20 + 8 = 28, so the rightmost point of the circle is x = 128
        assert_eq!(*out.get_pixel(128, 120), style.circle_color);
        // Interior untouched
        assert_eq!(*out.get_pixel(100, 120), WHITE);
        // Tab sits above the circle top (y = 92) ending 3 px higher
        assert_eq!(*out.get_pixel(100, 80), style.label_color);
        assert_eq!(*out.get_pixel(100, 92), style.circle_color);
    }

    #[test]
    fn test_negative_rect_is_folded() {
        let frame = RgbImage::from_pixel(200, 200, WHITE);
        let style = OverlayStyle::default();
        let mut r = record("A", 100.0, 100.0, 40.0);
        r.bounding_rect = Rect::new(120.0, 120.0, -40.0, -40.0);
        let out = render_overlay(&frame, &[r], &style);
        assert_eq!(*out.get_pixel(128, 100), style.circle_color);
    }

    #[test]
    fn test_records_near_edges_are_clipped() {
        let frame = RgbImage::from_pixel(30, 30, WHITE);
        let out = render_overlay(&frame, &[record("edge", 2.0, 2.0, 10.0)], &font_style());
        assert_eq!(out.dimensions(), (30, 30));
    }

    #[test]
    fn test_labels_without_font_only_encode_length() {
        let frame = RgbImage::from_pixel(200, 200, WHITE);
        let style = OverlayStyle::default();
        let a = render_overlay(&frame, &[record("AAAA", 100.0, 120.0, 40.0)], &style);
        let z = render_overlay(&frame, &[record("ZZZZ", 100.0, 120.0, 40.0)], &style);
        assert_eq!(a, z);
    }

    #[test]
    fn test_label_text_distinguishes_values() {
        let frame = RgbImage::from_pixel(200, 200, WHITE);
        let style = font_style();
        let a = render_overlay(&frame, &[record("AAAA", 100.0, 120.0, 40.0)], &style);
        let z = render_overlay(&frame, &[record("ZZZZ", 100.0, 120.0, 40.0)], &style);
        assert_ne!(a, z);

        // Glyphs are painted over the tab fill
        let plain = OverlayStyle::default();
        let untexted = render_overlay(&frame, &[record("AAAA", 100.0, 120.0, 40.0)], &plain);
        assert_ne!(a, untexted);
    }

    #[test]
    fn test_garbage_font_is_rejected() {
        let err = OverlayStyle::with_font_bytes(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, FontError::Parse(_)));
    }

    #[test]
    fn test_missing_font_file_is_io_error() {
        let err = OverlayStyle::with_font_path(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, FontError::Io(_)));
    }
}
