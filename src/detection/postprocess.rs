use ndarray::{s, ArrayView1, ArrayView2};

use super::preprocess::InputTransform;
use super::types::{BoundingBox, OutputLayout, DARKNET_SCORE_OFFSET};

/// A scored box that passed the confidence filter but not yet NMS
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Decode raw output rows into frame-space candidates.
///
/// Each row contributes one class, kept only when its score is strictly
/// greater than `confidence_threshold`. Boxes are clipped to the frame; rows
/// that clip to nothing or carry non-finite values are dropped.
pub fn decode_candidates(
    rows: ArrayView2<'_, f32>,
    layout: OutputLayout,
    confidence_threshold: f32,
    transform: &InputTransform,
) -> Vec<Candidate> {
    if rows.ncols() < layout.min_columns() {
        return Vec::new();
    }

    rows.outer_iter()
        .filter_map(|row| {
            let (class_id, confidence, (cx, cy, w, h)) = match layout {
                OutputLayout::Darknet => darknet_row(row)?,
                OutputLayout::Ssd => ssd_row(row)?,
            };
            if !confidence.is_finite() || confidence <= confidence_threshold {
                return None;
            }

            let (cx, cy, w, h) = transform.to_frame(cx, cy, w, h);
            let bbox = to_pixel_box(cx, cy, w, h, transform.frame_size)?;
            Some(Candidate {
                class_id,
                confidence,
                bbox,
            })
        })
        .collect()
}

type RawBox = (f32, f32, f32, f32);

/// Best class of a darknet row; the first maximum wins ties
fn darknet_row(row: ArrayView1<'_, f32>) -> Option<(usize, f32, RawBox)> {
    let mut class_id = 0;
    let mut confidence = f32::NEG_INFINITY;
    for (i, score) in row.slice(s![DARKNET_SCORE_OFFSET..]).iter().enumerate() {
        if *score > confidence {
            confidence = *score;
            class_id = i;
        }
    }
    Some((class_id, confidence, (row[0], row[1], row[2], row[3])))
}

/// Class, score and center/size box of an SSD detection row
fn ssd_row(row: ArrayView1<'_, f32>) -> Option<(usize, f32, RawBox)> {
    let label = row[1];
    if !label.is_finite() || label < 0.0 {
        return None;
    }
    let (x1, y1, x2, y2) = (row[3], row[4], row[5], row[6]);
    let raw = ((x1 + x2) / 2.0, (y1 + y2) / 2.0, x2 - x1, y2 - y1);
    Some((label as usize, row[2], raw))
}

/// Truncate a center/size box to integer pixels and clip it to the frame
fn to_pixel_box(cx: f32, cy: f32, w: f32, h: f32, frame_size: (u32, u32)) -> Option<BoundingBox> {
    if ![cx, cy, w, h].iter().all(|v| v.is_finite()) {
        return None;
    }

    // Float-to-int casts saturate, so edges are combined with saturating ops
    let center_x = cx as i64;
    let center_y = cy as i64;
    let width = w as i64;
    let height = h as i64;
    let x = (center_x as f64 - width as f64 / 2.0) as i64;
    let y = (center_y as f64 - height as f64 / 2.0) as i64;

    let left = x.max(0);
    let top = y.max(0);
    let right = x.saturating_add(width).min(frame_size.0 as i64);
    let bottom = y.saturating_add(height).min(frame_size.1 as i64);
    if right <= left || bottom <= top {
        return None;
    }

    Some(BoundingBox::new(
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Greedy non-maximum suppression across all classes.
///
/// Candidates are ordered by descending confidence (ties keep input order);
/// each survivor removes every later candidate whose IoU with it is
/// `>= iou_threshold`. Survivors are returned in that confidence order.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let suppressed = kept
            .iter()
            .any(|survivor| survivor.bbox.iou(&candidate.bbox) >= iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}
