use std::cmp::Ordering;

use super::preprocessing::Letterbox;
use super::{class_label, YoloParams};
use crate::models::{BoundingBox, Detection};

/// Decode a YOLOv8-style output tensor laid out as `[attributes, anchors]`.
///
/// Each anchor column holds `cx, cy, w, h` in model-input pixels followed by
/// one score per class. Boxes are mapped back to original image coordinates.
pub fn decode_predictions(
    output: &[f32],
    attributes: usize,
    anchors: usize,
    params: &YoloParams,
    letterbox: &Letterbox,
    class_names: &[String],
) -> Vec<Detection> {
    if attributes <= 4 || output.len() < attributes * anchors {
        return Vec::new();
    }

    let value = |attr: usize, anchor: usize| output[attr * anchors + anchor];
    let num_classes = attributes - 4;
    let mut detections = Vec::new();

    for anchor in 0..anchors {
        let (class_id, confidence) = (0..num_classes)
            .map(|class| (class, value(4 + class, anchor)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .unwrap_or((0, 0.0));

        if !confidence.is_finite() || confidence < params.conf_threshold {
            continue;
        }

        let cx = value(0, anchor);
        let cy = value(1, anchor);
        let w = value(2, anchor);
        let h = value(3, anchor);

        if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) {
            continue;
        }

        let (x1, y1) = letterbox.to_original(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_original(cx + w / 2.0, cy + h / 2.0);
        let bbox = BoundingBox::from_corners(x1, y1, x2, y2);

        if bbox.area() <= 0.0 {
            continue;
        }

        detections.push(Detection {
            class_id,
            label: class_label(class_names, class_id),
            confidence,
            bbox,
        });
    }

    detections
}

/// Greedy per-class non-max suppression, highest confidence first
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in detections {
        if kept.len() >= max_detections {
            break;
        }

        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });

        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}
