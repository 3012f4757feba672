use crate::models::RawDetection;

/// Remove duplicate detections.
///
/// Two detections are duplicates when their values are equal and their
/// centers are closer than `radius` pixels. The earliest one in input order
/// is kept, so callers control precedence by ordering (full-frame results
/// before coarse before fine).
pub fn dedup(detections: Vec<RawDetection>, radius: f32) -> Vec<RawDetection> {
    let mut keep = vec![true; detections.len()];
    let r2 = radius * radius;

    for i in 0..detections.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..detections.len() {
            if !keep[j] {
                continue;
            }
            if detections[i].value == detections[j].value
                && detections[i].center.distance_squared(&detections[j].center) < r2
            {
                keep[j] = false;
            }
        }
    }

    detections
        .into_iter()
        .enumerate()
        .filter_map(|(index, detection)| keep[index].then_some(detection))
        .collect()
}

/// Merge one pass's detections into the running set.
///
/// Entries already in `running` win over duplicates from `incoming`.
pub fn merge(
    running: Vec<RawDetection>,
    incoming: Vec<RawDetection>,
    radius: f32,
) -> Vec<RawDetection> {
    let mut all = running;
    all.extend(incoming);
    dedup(all, radius)
}
