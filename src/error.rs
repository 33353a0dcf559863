use std::path::PathBuf;

use thiserror::Error;

/// Hard failures of the detect-and-retrieve pipeline.
///
/// "Nothing was produced" is not an error; see [`crate::DetectOutcome::Empty`].
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("input is not a decodable image: {0}")]
    InvalidImage(#[source] image::ImageError),

    #[error("scratch directory error: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("failed to persist input image: {0}")]
    PersistInput(#[source] image::ImageError),

    #[error("detector failed: {0:#}")]
    Detector(anyhow::Error),

    #[error("failed to scan detector output: {0}")]
    ScanOutput(#[source] std::io::Error),

    #[error("failed to read detector output {}: {source}", path.display())]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Coarse classification used by callers that report errors to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied something that is not an image
    BadInput,
    /// The detector itself failed
    Detector,
    /// Scratch storage or output handling failed
    Io,
}

impl DetectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DetectError::InvalidImage(_) => ErrorKind::BadInput,
            DetectError::Detector(_) => ErrorKind::Detector,
            DetectError::Scratch(_)
            | DetectError::PersistInput(_)
            | DetectError::ScanOutput(_)
            | DetectError::ReadOutput { .. } => ErrorKind::Io,
        }
    }
}
