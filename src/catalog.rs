use anyhow::{Context, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Sample images shipped with the demo, in display order
pub const BUILTIN_EXAMPLES: &[(&str, &str)] = &[
    ("Example 1", "image_1.jpg"),
    ("Example 2", "image_2.jpg"),
    ("Example 3", "image_3.jpg"),
    ("Example 4", "image_4.jpg"),
    ("Example 5", "image_5.jpg"),
    ("Example 6", "image_6.jpg"),
    ("Example 7", "image_17.jpg"),
    ("Example 8", "image_8.jpg"),
    ("Example 9", "image_9.jpg"),
    ("Example 10", "image_10.jpg"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "example")]
    examples: Vec<ExampleEntry>,
}

/// Named example images offered in the UI gallery
#[derive(Debug, Clone, Default)]
pub struct ExampleCatalog {
    entries: Vec<ExampleEntry>,
}

impl ExampleCatalog {
    pub fn new(entries: Vec<ExampleEntry>) -> Self {
        Self { entries }
    }

    /// The default sample set, resolved against `base_dir`
    pub fn builtin(base_dir: &Path) -> Self {
        let entries = BUILTIN_EXAMPLES
            .iter()
            .map(|(name, file)| ExampleEntry {
                name: name.to_string(),
                path: base_dir.join(file),
            })
            .collect();
        Self { entries }
    }

    /// Parse a TOML catalog; relative paths are resolved against `base_dir`
    ///
    /// ```toml
    /// [[example]]
    /// name = "Runway"
    /// path = "runway.jpg"
    /// ```
    pub fn from_toml_str(contents: &str, base_dir: &Path) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents).context("Invalid example catalog")?;
        let entries = file
            .examples
            .into_iter()
            .map(|entry| ExampleEntry {
                path: if entry.path.is_absolute() {
                    entry.path
                } else {
                    base_dir.join(entry.path)
                },
                name: entry.name,
            })
            .collect();
        Ok(Self { entries })
    }

    /// Load a TOML catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read example catalog {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&contents, base_dir)
            .with_context(|| format!("Failed to parse example catalog {}", path.display()))
    }

    /// Drop entries whose image file does not exist
    pub fn retain_existing(mut self) -> Self {
        self.entries.retain(|entry| {
            let exists = entry.path.is_file();
            if !exists {
                warn!("Skipping example '{}': {} not found", entry.name, entry.path.display());
            }
            exists
        });
        self
    }

    pub fn entries(&self) -> &[ExampleEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ExampleEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode the image of entry `index`; `Ok(None)` if there is no such entry
    pub fn load_image(&self, index: usize) -> Result<Option<DynamicImage>> {
        let Some(entry) = self.get(index) else {
            return Ok(None);
        };
        let img = image::open(&entry.path)
            .with_context(|| format!("Failed to open example image {:?}", entry.path))?;
        Ok(Some(img))
    }
}
