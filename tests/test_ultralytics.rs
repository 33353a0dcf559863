#![cfg(unix)]

mod common;

use common::*;
use fod_detect::detection::{load_detector, Backend, DetectorConfig, UltralyticsCli};
use std::sync::Arc;

#[test]
fn test_arguments_follow_cli_contract() {
    let cli = UltralyticsCli::new("yolo", "best.pt").with_device("cpu");
    let request = PredictRequest::new("/tmp/s/input.jpg", "/tmp/s", "detect");

    let args: Vec<String> = cli
        .arguments(&request)
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    assert_eq!(args[0], "predict");
    for expected in [
        "model=best.pt",
        "source=/tmp/s/input.jpg",
        "save=True",
        "project=/tmp/s",
        "name=detect",
        "exist_ok=True",
        "device=cpu",
    ] {
        assert!(args.iter().any(|a| a == expected), "missing {expected} in {args:?}");
    }
}

#[test]
fn test_pipeline_with_fake_cli() -> anyhow::Result<()> {
    let bin = tempfile::TempDir::new()?;
    let program = write_script(bin.path(), "yolo", FAKE_YOLO)?;

    let detector = UltralyticsCli::new(&program, "best.pt");
    let pipeline = DetectPipeline::new(Arc::new(detector));

    match pipeline.run(&create_test_image(30, 20, [20, 230, 20]))? {
        DetectOutcome::Annotated(annotated) => {
            assert_eq!(annotated.file_name, "input.jpg");
            assert_eq!((annotated.image.width(), annotated.image.height()), (30, 20));
        }
        DetectOutcome::Empty => panic!("fake yolo always writes output"),
    }

    let recorded = std::fs::read_to_string(bin.path().join("args.txt"))?;
    assert!(recorded.starts_with("predict "));
    assert!(recorded.contains("save=True"));
    assert!(recorded.contains("name=detect"));

    Ok(())
}

#[test]
fn test_cli_failure_is_a_detector_error() -> anyhow::Result<()> {
    let bin = tempfile::TempDir::new()?;
    let program = write_script(bin.path(), "yolo", FAILING_YOLO)?;

    let pipeline = DetectPipeline::new(Arc::new(UltralyticsCli::new(&program, "best.pt")));
    let err = pipeline
        .run(&create_test_image(8, 8, [0, 0, 0]))
        .expect_err("non-zero exit must be an error");

    assert_eq!(err.kind(), ErrorKind::Detector);
    assert!(err.to_string().contains("CUDA out of memory"));

    Ok(())
}

#[test]
fn test_missing_program_is_a_detector_error() {
    let detector = UltralyticsCli::new("/nonexistent/yolo", "best.pt");
    let pipeline = DetectPipeline::new(Arc::new(detector));

    let err = pipeline.run(&create_test_image(8, 8, [0, 0, 0])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Detector);
    assert!(err.to_string().contains("Failed to launch"));
}

#[test]
fn test_load_detector_handle() -> anyhow::Result<()> {
    let config = DetectorConfig {
        serialize: true,
        ..DetectorConfig::default()
    };
    let detector = load_detector(&config)?;
    assert_eq!(detector.name(), "ultralytics-cli (serialized)");

    let plain = load_detector(&DetectorConfig::default())?;
    assert_eq!(plain.name(), "ultralytics-cli");

    Ok(())
}

#[cfg(not(feature = "onnx"))]
#[test]
fn test_onnx_backend_requires_feature() {
    let config = DetectorConfig {
        backend: Backend::Onnx,
        ..DetectorConfig::default()
    };
    let err = load_detector(&config).err().expect("onnx is compiled out");
    assert!(err.to_string().contains("--features onnx"));
}

#[cfg(feature = "onnx")]
#[test]
fn test_onnx_backend_reports_missing_model() {
    let config = DetectorConfig {
        backend: Backend::Onnx,
        model: "/nonexistent/best.onnx".into(),
        ..DetectorConfig::default()
    };
    let err = load_detector(&config).err().expect("model does not exist");
    assert!(err.to_string().contains("not found"));
}
