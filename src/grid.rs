//! Row/column inference from unordered detections.
//!
//! Detections are swept top-to-bottom into row bands. A detection joins the
//! open band when its center Y is within `tolerance` of the band's running
//! mean Y; otherwise the band is closed and a new one starts. Within a band,
//! columns are assigned left-to-right.
//!
//! Nothing about the rack (row count, pitch) is known in advance. A tolerance
//! that is too large merges neighbouring rows, one that is too small splits a
//! physical row; it is a user setting, not auto-calibrated.

use std::cmp::Ordering;

use crate::models::{RawDetection, VialRecord};

/// Assign a `(row, col)` slot to every detection.
///
/// Records come back row-major. The result does not depend on the input
/// order: detections are sorted by center Y, then X, then value before
/// banding.
pub fn infer_grid(detections: &[RawDetection], tolerance: f32) -> Vec<VialRecord> {
    let bands = row_bands(detections, tolerance);

    let mut records = Vec::with_capacity(detections.len());
    for (row, mut band) in bands.into_iter().enumerate() {
        band.sort_by(|a, b| cmp_x(a, b));
        for (col, detection) in band.into_iter().enumerate() {
            records.push(VialRecord {
                value: detection.value.clone(),
                row,
                col,
                center: detection.center,
                bounding_rect: detection.bounding_rect,
            });
        }
    }
    records
}

/// Split detections into row bands, top to bottom.
pub fn row_bands(detections: &[RawDetection], tolerance: f32) -> Vec<Vec<&RawDetection>> {
    let mut sorted: Vec<&RawDetection> = detections.iter().collect();
    sorted.sort_by(|a, b| cmp_y(a, b));

    let mut bands: Vec<Vec<&RawDetection>> = Vec::new();
    let mut current: Vec<&RawDetection> = Vec::new();
    let mut mean_y = 0.0f32;

    for detection in sorted {
        let y = detection.center.y;
        if current.is_empty() {
            current.push(detection);
            mean_y = y;
        } else if (y - mean_y).abs() <= tolerance {
            current.push(detection);
            let total: f32 = current.iter().map(|d| d.center.y).sum();
            mean_y = total / current.len() as f32;
        } else {
            bands.push(std::mem::take(&mut current));
            current.push(detection);
            mean_y = y;
        }
    }
    if !current.is_empty() {
        bands.push(current);
    }

    bands
}

fn cmp_y(a: &RawDetection, b: &RawDetection) -> Ordering {
    a.center
        .y
        .total_cmp(&b.center.y)
        .then_with(|| a.center.x.total_cmp(&b.center.x))
        .then_with(|| a.value.cmp(&b.value))
}

fn cmp_x(a: &RawDetection, b: &RawDetection) -> Ordering {
    a.center
        .x
        .total_cmp(&b.center.x)
        .then_with(|| a.center.y.total_cmp(&b.center.y))
        .then_with(|| a.value.cmp(&b.value))
}
