use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::detection::{Detector, PredictRequest};
use crate::error::DetectError;
use crate::models::{AnnotatedImage, DetectOutcome};

/// File name the input image is persisted under
pub const DEFAULT_INPUT_NAME: &str = "input.jpg";

/// Subdirectory of the scratch area the detector writes into
pub const DEFAULT_OUTPUT_NAME: &str = "detect";

/// Prefix of every per-call scratch directory
pub const SCRATCH_PREFIX: &str = "fod-detect-";

/// Detect-and-retrieve pipeline.
///
/// Each call persists the input to a fresh scratch directory, lets the detector
/// write its annotated output next to it, reads that output back into memory
/// and removes the scratch directory again.
#[derive(Clone)]
pub struct DetectPipeline {
    detector: Arc<dyn Detector>,
    input_name: String,
    output_name: String,
    extensions: Vec<String>,
    scratch_root: Option<PathBuf>,
}

impl DetectPipeline {
    /// Create a pipeline around a loaded detector
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self {
            detector,
            input_name: DEFAULT_INPUT_NAME.to_string(),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            extensions: vec!["jpg".to_string()],
            scratch_root: None,
        }
    }

    /// File name used for the persisted input (its extension picks the encoder)
    pub fn with_input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = name.into();
        self
    }

    /// Name of the output subdirectory handed to the detector
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Extensions (without dot, case-insensitive) accepted as detector output
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Create scratch directories under this directory instead of the system temp dir
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn detector(&self) -> &Arc<dyn Detector> {
        &self.detector
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn scratch_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }

    /// Decode an encoded image (any supported format) and run the pipeline on it
    pub fn run_bytes(&self, bytes: &[u8]) -> Result<DetectOutcome, DetectError> {
        let image = image::load_from_memory(bytes).map_err(DetectError::InvalidImage)?;
        self.run(&image)
    }

    /// Run detection on an in-memory image.
    ///
    /// Returns `Empty` when the detector wrote no matching file. Detector and
    /// I/O failures are returned as errors. The scratch directory is removed
    /// on every path.
    pub fn run(&self, image: &DynamicImage) -> Result<DetectOutcome, DetectError> {
        let scratch = self.scratch_dir().map_err(DetectError::Scratch)?;
        debug!("Scratch directory: {}", scratch.path().display());

        let input_path = scratch.path().join(&self.input_name);
        encodable(image)
            .save(&input_path)
            .map_err(DetectError::PersistInput)?;

        let request = PredictRequest::new(&input_path, scratch.path(), self.output_name.as_str());
        debug!("Running detector: {}", self.detector.name());
        self.detector.predict(&request).map_err(DetectError::Detector)?;

        let outcome = match find_output(&request.output_dir(), &self.extensions).map_err(DetectError::ScanOutput)? {
            Some(path) => {
                let image = image::open(&path).map_err(|source| DetectError::ReadOutput {
                    path: path.clone(),
                    source,
                })?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                debug!("Detector output: {} ({}x{})", file_name, image.width(), image.height());
                DetectOutcome::Annotated(AnnotatedImage { image, file_name })
            }
            None => {
                debug!("Detector wrote no output under {}", request.output_dir().display());
                DetectOutcome::Empty
            }
        };

        // Explicit close so cleanup failures surface; error paths rely on Drop
        scratch.close().map_err(DetectError::Scratch)?;

        Ok(outcome)
    }
}

/// JPEG has no alpha or 16-bit support, so anything else is flattened to RGB8
fn encodable(image: &DynamicImage) -> std::borrow::Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => std::borrow::Cow::Borrowed(image),
        other => std::borrow::Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}

/// Find the detector's output image in `dir`.
///
/// Only regular files whose extension is in `extensions` count. When several
/// match, the lexicographically smallest file name wins. A missing directory
/// means the detector produced nothing.
pub fn find_output(dir: &Path, extensions: &[String]) -> std::io::Result<Option<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut best: Option<PathBuf> = None;

    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| extensions.iter().any(|e| *e == ext));

        if !matches {
            continue;
        }

        if best.as_ref().is_none_or(|b| path.file_name() < b.file_name()) {
            best = Some(path);
        }
    }

    Ok(best)
}
