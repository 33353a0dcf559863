pub mod annotate;
pub mod postprocessing;
pub mod preprocessing;
pub mod ultralytics;

#[cfg(feature = "onnx")]
pub mod onnx;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub use ultralytics::UltralyticsCli;

/// Where a detector reads its input and writes its annotated output.
///
/// A detector must write its result as an image file somewhere under
/// `<project>/<name>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictRequest {
    pub source: PathBuf,
    pub project: PathBuf,
    pub name: String,
}

impl PredictRequest {
    pub fn new(source: impl Into<PathBuf>, project: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            project: project.into(),
            name: name.into(),
        }
    }

    /// Directory the detector is expected to write into
    pub fn output_dir(&self) -> PathBuf {
        self.project.join(&self.name)
    }

    /// Output path for a result that keeps the source's file name
    pub fn output_path_for_source(&self) -> PathBuf {
        let file_name = self
            .source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "output.jpg".into());
        self.output_dir().join(file_name)
    }
}

/// Trait that all detection backends implement
pub trait Detector: Send + Sync {
    /// Run detection on `request.source`, persisting the annotated image
    /// under `request.output_dir()`. Blocks until the detector is done.
    fn predict(&self, request: &PredictRequest) -> Result<()>;

    /// Human-readable name for this backend (used in logs and health output)
    fn name(&self) -> &str;
}

impl<D: Detector + ?Sized> Detector for Arc<D> {
    fn predict(&self, request: &PredictRequest) -> Result<()> {
        (**self).predict(request)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Serializes calls into a detector that is not safe for concurrent use
pub struct SerializedDetector<D> {
    inner: Mutex<D>,
    name: String,
}

impl<D: Detector> SerializedDetector<D> {
    pub fn new(inner: D) -> Self {
        let name = format!("{} (serialized)", inner.name());
        Self {
            inner: Mutex::new(inner),
            name,
        }
    }
}

impl<D: Detector> Detector for SerializedDetector<D> {
    fn predict(&self, request: &PredictRequest) -> Result<()> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("detector lock poisoned by an earlier panic"))?;
        guard.predict(request)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Which detection backend to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Shell out to the Ultralytics `yolo` command-line tool
    Ultralytics,
    /// Run a YOLO ONNX export in-process (requires the `onnx` feature)
    Onnx,
}

/// Detection parameters shared by the backends
#[derive(Debug, Clone, PartialEq)]
pub struct YoloParams {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

impl YoloParams {
    /// Reject parameters no backend can run with
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.input_size > 0, "input size must be at least 1 pixel");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.conf_threshold),
            "confidence threshold {} is outside [0, 1]",
            self.conf_threshold
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.iou_threshold),
            "IoU threshold {} is outside [0, 1]",
            self.iou_threshold
        );
        Ok(())
    }
}

/// Everything needed to initialise a detector once at start-up
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub backend: Backend,
    pub model: PathBuf,
    /// Program used by the Ultralytics backend
    pub program: PathBuf,
    pub params: YoloParams,
    /// Class labels, indexed by class id
    pub class_names: Vec<String>,
    /// Device passed to the Ultralytics CLI ("cpu", "0", ...)
    pub device: Option<String>,
    /// Wrap the backend so that only one prediction runs at a time
    pub serialize: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Ultralytics,
            model: PathBuf::from("best.pt"),
            program: PathBuf::from("yolo"),
            params: YoloParams::default(),
            class_names: Vec::new(),
            device: None,
            serialize: false,
        }
    }
}

/// Label for a class id, falling back to "class N"
pub fn class_label(class_names: &[String], class_id: usize) -> String {
    class_names
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| format!("class {}", class_id))
}

/// Load the configured detector and return a shareable handle to it
pub fn load_detector(config: &DetectorConfig) -> Result<Arc<dyn Detector>> {
    config.params.validate().context("Invalid detector parameters")?;

    let detector: Arc<dyn Detector> = match config.backend {
        Backend::Ultralytics => {
            warn_if_missing(&config.model);
            let mut cli = UltralyticsCli::new(&config.program, &config.model).with_params(config.params.clone());
            if let Some(device) = &config.device {
                cli = cli.with_device(device.clone());
            }
            wrap(cli, config.serialize)
        }
        Backend::Onnx => load_onnx(config)?,
    };

    info!("Detector ready: {}", detector.name());
    Ok(detector)
}

fn wrap<D: Detector + 'static>(detector: D, serialize: bool) -> Arc<dyn Detector> {
    if serialize {
        Arc::new(SerializedDetector::new(detector))
    } else {
        Arc::new(detector)
    }
}

fn warn_if_missing(model: &Path) {
    // Ultralytics resolves bare model names like "yolov8n.pt" by downloading them
    if !model.exists() {
        warn!("Model file {} not found locally; the yolo CLI will try to resolve it", model.display());
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(config: &DetectorConfig) -> Result<Arc<dyn Detector>> {
    // The session is already behind a mutex, so `serialize` changes nothing here
    let detector = onnx::OnnxDetector::load(&config.model, config.params.clone(), config.class_names.clone())?;
    Ok(Arc::new(detector))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(_config: &DetectorConfig) -> Result<Arc<dyn Detector>> {
    anyhow::bail!("the onnx backend is not available: rebuild with `--features onnx`")
}
