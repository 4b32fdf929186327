use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Inclusive, 1-based range of PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.start >= 1, "page_range.start must be >= 1 (pages are 1-based)");
        ensure!(
            !self.is_empty(),
            "page_range.start ({}) must be <= page_range.end ({})",
            self.start,
            self.end
        );
        Ok(())
    }
}

impl Default for PageRange {
    fn default() -> Self {
        Self { start: 1, end: 1 }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Settings for one extraction batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub source_document: PathBuf,
    pub output_directory: PathBuf,
    pub temp_directory: PathBuf,
    pub page_range: PageRange,
    pub resolution_dpi: u32,
    pub recognition_timeout_secs: u64,
    pub rasterize_timeout_secs: u64,

    // tesseract flags
    pub language: String,
    pub engine_mode: u8,
    pub segmentation_mode: u8,

    pub csv_name: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            source_document: PathBuf::from("dictionary.pdf"),
            output_directory: PathBuf::from("vocab_output"),
            temp_directory: std::env::temp_dir().join("ocr_pages"),
            page_range: PageRange::default(),
            resolution_dpi: 300,
            recognition_timeout_secs: 120,
            rasterize_timeout_secs: 120,
            language: "eng+chi_tra".to_string(),
            engine_mode: 1,
            segmentation_mode: 4,
            csv_name: "vocab.csv".to_string(),
        }
    }
}

impl ExtractConfig {
    /// Load a config from a JSON file; missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: ExtractConfig = serde_json::from_str(&config_str)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.page_range.validate()?;
        ensure!(self.resolution_dpi > 0, "resolution_dpi must be > 0");
        ensure!(self.recognition_timeout_secs > 0, "recognition_timeout_secs must be > 0");
        ensure!(self.rasterize_timeout_secs > 0, "rasterize_timeout_secs must be > 0");
        ensure!(!self.language.trim().is_empty(), "language must not be empty");
        ensure!(!self.csv_name.trim().is_empty(), "csv_name must not be empty");
        Ok(())
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_secs(self.recognition_timeout_secs)
    }

    pub fn rasterize_timeout(&self) -> Duration {
        Duration::from_secs(self.rasterize_timeout_secs)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_directory.join(&self.csv_name)
    }

    /// Directory holding the per-page "already parsed" markers.
    pub fn pages_dir(&self) -> PathBuf {
        self.output_directory.join("pages")
    }

    pub fn fulltext_dir(&self) -> PathBuf {
        self.output_directory.join("ocr_fulltext")
    }
}

impl fmt::Display for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source={:?} pages={} dpi={} lang={} output={:?}",
            self.source_document,
            self.page_range,
            self.resolution_dpi,
            self.language,
            self.output_directory
        )
    }
}

/// File name shared by every per-page artifact, e.g. `page-007`.
pub fn page_stem(page: u32) -> String {
    format!("page-{:03}", page)
}
