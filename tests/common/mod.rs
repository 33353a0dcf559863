#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from fod_detect for tests
pub use fod_detect::{
    DetectError, DetectOutcome, DetectPipeline, Detector, ErrorKind, ExampleCatalog, ExampleEntry,
    PredictRequest, SerializedDetector, NO_OUTPUT_MESSAGE,
};
