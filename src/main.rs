use anyhow::Context;
use clap::Parser;
use image::ImageReader;
use tracing::info;

use fod_detect::config::{init_logging, Cli, Command, DetectArgs, ServeArgs};
use fod_detect::{load_detector, DetectOutcome, DetectPipeline, Detector};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    // Loaded once, shared by every request
    let detector = load_detector(&args.detector.to_config())?;

    match args.command {
        Command::Serve(serve_args) => serve(detector, serve_args),
        Command::Detect(detect_args) => detect(detector, detect_args),
    }
}

fn detect(detector: Arc<dyn Detector>, args: DetectArgs) -> anyhow::Result<()> {
    info!("Loading image: {:?}", args.image_path);

    let img = ImageReader::open(&args.image_path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;

    info!("Image loaded: {}x{}", img.width(), img.height());

    let mut pipeline = DetectPipeline::new(detector);
    if let Some(dir) = args.scratch_dir {
        pipeline = pipeline.with_scratch_root(dir);
    }

    match pipeline.run(&img)? {
        DetectOutcome::Annotated(annotated) => {
            annotated
                .image
                .save(&args.output)
                .with_context(|| format!("Failed to save {}", args.output.display()))?;
            println!("Annotated image written to {}", args.output.display());
        }
        outcome @ DetectOutcome::Empty => {
            println!("{}", outcome.message().unwrap_or_default());
        }
    }

    Ok(())
}

#[cfg(feature = "web")]
fn serve(detector: Arc<dyn Detector>, args: ServeArgs) -> anyhow::Result<()> {
    use fod_detect::ExampleCatalog;
    use fod_detect::web::{self, AppState};

    let catalog = match &args.catalog {
        Some(path) => ExampleCatalog::load(path)?,
        None => ExampleCatalog::builtin(&args.examples_dir),
    }
    .retain_existing();
    info!("{} example images available", catalog.len());

    let mut pipeline = DetectPipeline::new(detector);
    if let Some(dir) = args.scratch_dir {
        pipeline = pipeline.with_scratch_root(dir);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(web::serve(args.addr, AppState::new(pipeline, catalog)))
}

#[cfg(not(feature = "web"))]
fn serve(_detector: Arc<dyn Detector>, _args: ServeArgs) -> anyhow::Result<()> {
    anyhow::bail!("the web UI is not available: rebuild with `--features web`")
}
