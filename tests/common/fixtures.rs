use anyhow::Result;
use fod_detect::{Detector, PredictRequest};
use image::{DynamicImage, ImageBuffer, Rgb};
use std::sync::Mutex;

/// Creates a solid-colour RGB test image
pub fn create_test_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |_, _| Rgb(color)))
}

/// Encodes an image as PNG bytes, as a browser upload would send it
pub fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("Failed to encode test image");
    buf
}

/// Writes nothing, like a detector that failed silently
pub struct NoOutputDetector;

impl Detector for NoOutputDetector {
    fn predict(&self, _request: &PredictRequest) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "no-output"
    }
}

/// Always fails
pub struct FailingDetector;

impl Detector for FailingDetector {
    fn predict(&self, _request: &PredictRequest) -> Result<()> {
        anyhow::bail!("model exploded")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Writes one fixed image under the given file name
pub struct FixedOutputDetector {
    pub file_name: String,
    pub image: DynamicImage,
}

impl Detector for FixedOutputDetector {
    fn predict(&self, request: &PredictRequest) -> Result<()> {
        let dir = request.output_dir();
        std::fs::create_dir_all(&dir)?;
        self.image.save(dir.join(&self.file_name))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "fixed-output"
    }
}

/// Writes each (file name, image) pair into the output directory
pub struct MultiOutputDetector {
    pub outputs: Vec<(String, DynamicImage)>,
}

impl Detector for MultiOutputDetector {
    fn predict(&self, request: &PredictRequest) -> Result<()> {
        let dir = request.output_dir();
        std::fs::create_dir_all(&dir)?;
        for (name, img) in &self.outputs {
            img.save(dir.join(name))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "multi-output"
    }
}

/// Copies the source image to the output directory, like `yolo predict` with no hits
pub struct CopyDetector;

impl Detector for CopyDetector {
    fn predict(&self, request: &PredictRequest) -> Result<()> {
        std::fs::create_dir_all(request.output_dir())?;
        std::fs::copy(&request.source, request.output_path_for_source())?;
        Ok(())
    }

    fn name(&self) -> &str {
        "copy"
    }
}

/// Records every request (and whether the source existed) before delegating
pub struct RecordingDetector<D> {
    pub inner: D,
    pub requests: Mutex<Vec<(PredictRequest, bool)>>,
}

impl<D: Detector> RecordingDetector<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(PredictRequest, bool)> {
        self.requests.lock().unwrap().clone()
    }
}

impl<D: Detector> Detector for RecordingDetector<D> {
    fn predict(&self, request: &PredictRequest) -> Result<()> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), request.source.is_file()));
        self.inner.predict(request)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Dominant channel of the average colour: 0 = red, 1 = green, 2 = blue
pub fn dominant_channel(img: &DynamicImage) -> usize {
    let rgb = img.to_rgb8();
    let mut sums = [0u64; 3];
    for pixel in rgb.pixels() {
        for (channel, sum) in sums.iter_mut().enumerate() {
            *sum += pixel[channel] as u64;
        }
    }
    (0..3).max_by_key(|&c| sums[c]).unwrap()
}

/// Stand-in for the `yolo` CLI: copies `source` into `project/name/`,
/// and records its arguments next to the script.
#[cfg(unix)]
pub const FAKE_YOLO: &str = r#"#!/bin/sh
set -e
for arg in "$@"; do
  case "$arg" in
    source=*) source="${arg#source=}" ;;
    project=*) project="${arg#project=}" ;;
    name=*) name="${arg#name=}" ;;
  esac
done
echo "$@" > "$(dirname "$0")/args.txt"
mkdir -p "$project/$name"
cp "$source" "$project/$name/"
"#;

/// Exits cleanly without saving anything
#[cfg(unix)]
pub const SILENT_YOLO: &str = "#!/bin/sh\nexit 0\n";

#[cfg(unix)]
pub const FAILING_YOLO: &str = "#!/bin/sh\necho 'CUDA out of memory' >&2\nexit 3\n";

/// Writes an executable script into `dir`
#[cfg(unix)]
pub fn write_script(dir: &std::path::Path, name: &str, contents: &str) -> Result<std::path::PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}
