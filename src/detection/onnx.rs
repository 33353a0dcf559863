//! In-process YOLO detector running an ONNX export through ONNX Runtime
//!
//! Expects a single input of shape `[1, 3, S, S]` and a single output of
//! shape `[1, 4 + classes, anchors]` (the layout produced by
//! `yolo export format=onnx` for detection models).

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info};

use super::annotate::draw_detections;
use super::postprocessing::{decode_predictions, non_max_suppression};
use super::preprocessing::{letterbox, to_chw_tensor};
use super::{Detector, PredictRequest, YoloParams};

pub struct OnnxDetector {
    session: Mutex<Session>,
    input_name: String,
    params: YoloParams,
    class_names: Vec<String>,
}

impl std::fmt::Debug for OnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetector")
            .field("input_name", &self.input_name)
            .field("params", &self.params)
            .field("class_names", &self.class_names)
            .finish_non_exhaustive()
    }
}

impl OnnxDetector {
    /// Load the model once; the session is reused for every prediction
    pub fn load<P: AsRef<Path>>(model_path: P, params: YoloParams, class_names: Vec<String>) -> Result<Self> {
        let model_path = model_path.as_ref();
        params.validate()?;

        if !model_path.exists() {
            anyhow::bail!("ONNX model not found: {}", model_path.display());
        }

        info!("Loading ONNX detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        debug!("ONNX model input: {}", input_name);

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            params,
            class_names,
        })
    }
}

impl Detector for OnnxDetector {
    fn predict(&self, request: &PredictRequest) -> Result<()> {
        let img = image::open(&request.source)
            .with_context(|| format!("Failed to open {}", request.source.display()))?;

        let size = self.params.input_size;
        let (boxed, letterbox) = letterbox(&img, size);
        let input = Array4::from_shape_vec((1, 3, size as usize, size as usize), to_chw_tensor(&boxed))
            .context("Failed to shape input tensor")?;
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let detections = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))?;

            let outputs = session
                .run(ort::inputs![&self.input_name => input_value])
                .context("Detection inference failed")?;

            let output = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;

            let shape = output.shape().to_vec();
            debug!("Detection output shape: {:?}", shape);

            if shape.len() != 3 || shape[0] != 1 {
                anyhow::bail!("Unexpected output shape {:?}, expected [1, 4 + classes, anchors]", shape);
            }

            let flat: Vec<f32> = output.iter().copied().collect();
            decode_predictions(&flat, shape[1], shape[2], &self.params, &letterbox, &self.class_names)
        };

        let detections = non_max_suppression(detections, self.params.iou_threshold, self.params.max_detections);
        debug!("Kept {} detections after NMS", detections.len());

        let mut annotated = img.to_rgb8();
        draw_detections(&mut annotated, &detections);

        let output_dir = request.output_dir();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let output_path = request.output_path_for_source();
        annotated
            .save(&output_path)
            .with_context(|| format!("Failed to save annotated image to {}", output_path.display()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "onnx-runtime"
    }
}
