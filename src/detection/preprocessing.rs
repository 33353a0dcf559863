use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use image::imageops::FilterType;

/// Grey used by YOLO to pad letterboxed images
pub const LETTERBOX_FILL: u8 = 114;

/// How an image was fitted onto the square model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub original_width: u32,
    pub original_height: u32,
}

impl Letterbox {
    /// Map a point from model-input space back to original image space
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let ox = (x - self.pad_x) / self.scale;
        let oy = (y - self.pad_y) / self.scale;
        (
            ox.clamp(0.0, self.original_width as f32),
            oy.clamp(0.0, self.original_height as f32),
        )
    }
}

/// Resize keeping aspect ratio and centre on a `size` x `size` grey canvas.
/// `size` must be non-zero; [`YoloParams::validate`](super::YoloParams::validate) checks it.
pub fn letterbox(img: &DynamicImage, size: u32) -> (RgbImage, Letterbox) {
    let (width, height) = img.dimensions();

    let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
    let scaled_w = ((width as f32 * scale).round() as u32).clamp(1, size);
    let scaled_h = ((height as f32 * scale).round() as u32).clamp(1, size);

    let rgb = img.to_rgb8();
    let scaled = image::imageops::resize(&rgb, scaled_w, scaled_h, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([LETTERBOX_FILL; 3]));
    let offset_x = (size - scaled_w) / 2;
    let offset_y = (size - scaled_h) / 2;

    image::imageops::overlay(&mut canvas, &scaled, offset_x.into(), offset_y.into());

    let letterbox = Letterbox {
        scale,
        pad_x: offset_x as f32,
        pad_y: offset_y as f32,
        original_width: width,
        original_height: height,
    };

    (canvas, letterbox)
}

/// Planar RGB (CHW) values scaled to [0, 1]
pub fn to_chw_tensor(img: &RgbImage) -> Vec<f32> {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; plane * 3];

    for (x, y, pixel) in img.enumerate_pixels() {
        let idx = (y * width + x) as usize;
        for channel in 0..3 {
            data[channel * plane + idx] = pixel[channel] as f32 / 255.0;
        }
    }

    data
}
