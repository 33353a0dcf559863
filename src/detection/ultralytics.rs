use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use super::{Detector, PredictRequest, YoloParams};

/// Number of stderr lines kept in error messages
const STDERR_TAIL_LINES: usize = 20;

/// Detector backed by the Ultralytics `yolo` command-line tool.
///
/// Runs `yolo predict ... save=True project=<dir> name=<name>`, which writes the
/// annotated image to `<dir>/<name>/<source file name>`.
#[derive(Debug, Clone)]
pub struct UltralyticsCli {
    program: PathBuf,
    model: PathBuf,
    params: YoloParams,
    device: Option<String>,
}

impl UltralyticsCli {
    pub fn new(program: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
            params: YoloParams::default(),
            device: None,
        }
    }

    pub fn with_params(mut self, params: YoloParams) -> Self {
        self.params = params;
        self
    }

    /// Select a device ("cpu", "0", ...); the CLI picks one if unset
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn model(&self) -> &Path {
        &self.model
    }

    /// Arguments passed after the program name
    pub fn arguments(&self, request: &PredictRequest) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("predict"),
            key_value("model", self.model.as_os_str()),
            key_value("source", request.source.as_os_str()),
            OsString::from("save=True"),
            key_value("project", request.project.as_os_str()),
            key_value("name", OsStr::new(&request.name)),
            OsString::from("exist_ok=True"),
            OsString::from(format!("conf={}", self.params.conf_threshold)),
            OsString::from(format!("iou={}", self.params.iou_threshold)),
            OsString::from(format!("imgsz={}", self.params.input_size)),
            OsString::from(format!("max_det={}", self.params.max_detections)),
            OsString::from("verbose=False"),
        ];

        if let Some(device) = &self.device {
            args.push(OsString::from(format!("device={}", device)));
        }

        args
    }
}

fn key_value(key: &str, value: &OsStr) -> OsString {
    let mut arg = OsString::from(key);
    arg.push("=");
    arg.push(value);
    arg
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

impl Detector for UltralyticsCli {
    fn predict(&self, request: &PredictRequest) -> Result<()> {
        let args = self.arguments(request);
        debug!("Running {} {:?}", self.program.display(), args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to launch {}", self.program.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr_tail(&output.stderr)
            );
        }

        debug!("yolo stdout: {}", String::from_utf8_lossy(&output.stdout).trim());

        Ok(())
    }

    fn name(&self) -> &str {
        "ultralytics-cli"
    }
}
