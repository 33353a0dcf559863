use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::detection::{Backend, DetectorConfig, YoloParams};

#[derive(Debug, Parser)]
#[command(name = "fod-detect")]
#[command(about = "Foreign Object Debris (FoD) detection demo")]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub detector: DetectorArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the browser UI
    Serve(ServeArgs),
    /// Run detection on a single image file
    Detect(DetectArgs),
}

#[derive(Debug, Args)]
pub struct DetectorArgs {
    /// Detection backend
    #[arg(long, value_enum, default_value_t = Backend::Ultralytics, global = true)]
    pub backend: Backend,

    /// Path to the trained model weights
    #[arg(long, env = "FOD_MODEL", default_value = "best.pt", global = true)]
    pub model: PathBuf,

    /// Ultralytics CLI executable
    #[arg(long, env = "FOD_YOLO_BIN", default_value = "yolo", global = true)]
    pub yolo_bin: PathBuf,

    /// Device for the Ultralytics CLI ("cpu", "0", ...)
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// Minimum confidence for a detection to be drawn
    #[arg(long, default_value_t = 0.25, global = true)]
    pub confidence: f32,

    /// IoU threshold for non-max suppression
    #[arg(long, default_value_t = 0.45, global = true)]
    pub iou: f32,

    /// Square model input size in pixels
    #[arg(long, default_value_t = 640, value_parser = clap::value_parser!(u32).range(1..), global = true)]
    pub image_size: u32,

    /// Comma-separated class labels, indexed by class id
    #[arg(long, value_delimiter = ',', global = true)]
    pub class_names: Vec<String>,

    /// Run at most one prediction at a time
    #[arg(long, global = true)]
    pub serialize: bool,
}

impl DetectorArgs {
    pub fn to_config(&self) -> DetectorConfig {
        DetectorConfig {
            backend: self.backend,
            model: self.model.clone(),
            program: self.yolo_bin.clone(),
            params: YoloParams {
                input_size: self.image_size,
                conf_threshold: self.confidence,
                iou_threshold: self.iou,
                ..YoloParams::default()
            },
            class_names: self.class_names.clone(),
            device: self.device.clone(),
            serialize: self.serialize,
        }
    }
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "FOD_ADDR", default_value = "127.0.0.1:7860")]
    pub addr: SocketAddr,

    /// Directory holding the built-in example images
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub examples_dir: PathBuf,

    /// TOML example catalog (replaces the built-in list)
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Create per-request scratch directories under DIR
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    pub image_path: PathBuf,

    /// Where to write the annotated image
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Create the scratch directory under DIR
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,
}

/// Default log filter when RUST_LOG is unset
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "fod_detect=debug,tower_http=debug"
    } else {
        "fod_detect=info,tower_http=info"
    }
}

/// Install the global tracing subscriber
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    // A subscriber may already be installed (e.g. by tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
