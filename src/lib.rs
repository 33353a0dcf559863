pub mod catalog;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;

pub use catalog::{ExampleCatalog, ExampleEntry};
pub use detection::{load_detector, Detector, DetectorConfig, PredictRequest, SerializedDetector};
pub use error::{DetectError, ErrorKind};
pub use models::{AnnotatedImage, BoundingBox, DetectOutcome, Detection, NO_OUTPUT_MESSAGE};
pub use pipeline::DetectPipeline;

#[cfg(feature = "web")]
pub mod web;
