use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::models::Detection;

/// Box colours, cycled by class id
const PALETTE: [[u8; 3]; 8] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [26, 147, 52],
    [0, 212, 187],
];

pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Line thickness proportional to the image size, at least 1px
pub fn line_thickness(width: u32, height: u32) -> u32 {
    ((width + height) / 600).max(1)
}

/// Draw each detection as an outlined box with a filled tab above it
pub fn draw_detections(img: &mut RgbImage, detections: &[Detection]) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let thickness = line_thickness(width, height);

    for detection in detections {
        let color = class_color(detection.class_id);

        let x = (detection.bbox.x.max(0.0) as u32).min(width - 1);
        let y = (detection.bbox.y.max(0.0) as u32).min(height - 1);
        let w = (detection.bbox.width.round() as u32).clamp(1, width - x);
        let h = (detection.bbox.height.round() as u32).clamp(1, height - y);

        for offset in 0..thickness {
            if w <= 2 * offset || h <= 2 * offset {
                break;
            }
            let rect = Rect::at((x + offset) as i32, (y + offset) as i32)
                .of_size(w - 2 * offset, h - 2 * offset);
            draw_hollow_rect_mut(img, rect, color);
        }

        // Tab sits above the box, or inside it when the box touches the top edge
        let tab_h = (thickness * 4).min(h);
        let tab_w = ((w as f32 * detection.confidence.clamp(0.0, 1.0)).round() as u32).max(1);
        let tab_y = if y >= tab_h { y - tab_h } else { y };
        draw_filled_rect_mut(img, Rect::at(x as i32, tab_y as i32).of_size(tab_w, tab_h), color);
    }
}
