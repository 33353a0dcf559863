use image::DynamicImage;
use serde::Serialize;

/// Message shown in place of an image when the detector produced no output
pub const NO_OUTPUT_MESSAGE: &str = "Detection failed. No output image generated.";

/// Axis-aligned box in pixel coordinates of the original image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Build a box from corner coordinates
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let iy = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;

        if union <= 0.0 {
            return 0.0;
        }

        intersection / union
    }
}

/// A single detected object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub class_id: usize,
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Annotated image read back from the detector's output directory
#[derive(Debug, Clone)]
pub struct AnnotatedImage {
    pub image: DynamicImage,
    /// File name the detector wrote (e.g. "input.jpg")
    pub file_name: String,
}

/// Result of one detect-and-retrieve call
#[derive(Debug, Clone)]
pub enum DetectOutcome {
    /// The detector wrote an annotated image
    Annotated(AnnotatedImage),
    /// The detector ran but wrote nothing we recognise
    Empty,
}

impl DetectOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, DetectOutcome::Empty)
    }

    /// Human-readable failure text for the `Empty` case
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DetectOutcome::Annotated(_) => None,
            DetectOutcome::Empty => Some(NO_OUTPUT_MESSAGE),
        }
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        match self {
            DetectOutcome::Annotated(annotated) => Some(&annotated.image),
            DetectOutcome::Empty => None,
        }
    }

    pub fn into_image(self) -> Option<DynamicImage> {
        match self {
            DetectOutcome::Annotated(annotated) => Some(annotated.image),
            DetectOutcome::Empty => None,
        }
    }
}
