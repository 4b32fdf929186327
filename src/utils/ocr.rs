use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::process::run_with_timeout;
use super::raster::Rasterizer;
use crate::config::{page_stem, ExtractConfig};

/// Anything that can produce the recognized text of a page.
pub trait PageSource {
    /// Text for `page` (1-based). An empty string means the page had nothing
    /// to recognize.
    fn page_text(&self, page: u32) -> Result<String>;
}

/// Runs Tesseract over a page image.
///
/// Requires Tesseract plus the language packs named in `language`:
/// - Linux: sudo apt-get install tesseract-ocr tesseract-ocr-chi-tra
/// - Mac: brew install tesseract tesseract-lang
#[derive(Debug, Clone)]
pub struct Recognizer {
    program: PathBuf,
    language: String,
    engine_mode: u8,
    segmentation_mode: u8,
    timeout: Duration,
}

impl Recognizer {
    pub fn new(language: String, engine_mode: u8, segmentation_mode: u8, timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            language,
            engine_mode,
            segmentation_mode,
            timeout,
        }
    }

    pub fn with_program(mut self, program: PathBuf) -> Self {
        self.program = program;
        self
    }

    /// Recognize the image at `image`, fed to the tool on stdin.
    pub fn recognize(&self, image: &Path) -> Result<String> {
        let input = File::open(image)
            .with_context(|| format!("Failed to open raster image: {:?}", image))?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--oem")
            .arg(self.engine_mode.to_string())
            .arg("--psm")
            .arg(self.segmentation_mode.to_string())
            .stdin(Stdio::from(input))
            .stderr(Stdio::null());

        let stdout = run_with_timeout(cmd, "tesseract", self.timeout)?;
        Ok(decode_lossy(&stdout))
    }
}

/// UTF-8 decode that drops invalid byte sequences instead of failing.
fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// The real pipeline: rasterize a page of the PDF, then recognize it.
#[derive(Debug, Clone)]
pub struct TesseractPageSource {
    pdf: PathBuf,
    rasterizer: Rasterizer,
    recognizer: Recognizer,
}

impl TesseractPageSource {
    pub fn new(pdf: PathBuf, rasterizer: Rasterizer, recognizer: Recognizer) -> Self {
        Self {
            pdf,
            rasterizer,
            recognizer,
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        let rasterizer = Rasterizer::new(
            config.temp_directory.clone(),
            config.resolution_dpi,
            config.rasterize_timeout(),
        );
        let recognizer = Recognizer::new(
            config.language.clone(),
            config.engine_mode,
            config.segmentation_mode,
            config.recognition_timeout(),
        );
        Self::new(config.source_document.clone(), rasterizer, recognizer)
    }
}

impl PageSource for TesseractPageSource {
    fn page_text(&self, page: u32) -> Result<String> {
        let raster = match self.rasterizer.rasterize(&self.pdf, page)? {
            Some(raster) => raster,
            None => return Ok(String::new()),
        };

        let text = self
            .recognizer
            .recognize(&raster.path)
            .with_context(|| format!("OCR failed for page {}", page));

        match fs::remove_file(&raster.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove raster {:?}: {}", raster.path, e),
        }

        let text = text?;
        debug!("Page {}: recognized {} characters", page, text.chars().count());
        Ok(text)
    }
}

/// Reads `page-NNN.txt` dumps written by the full-text export.
///
/// Missing pages read as empty text.
#[derive(Debug, Clone)]
pub struct TextDumpSource {
    dir: PathBuf,
}

impl TextDumpSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn page_path(&self, page: u32) -> PathBuf {
        self.dir.join(format!("{}.txt", page_stem(page)))
    }
}

impl PageSource for TextDumpSource {
    fn page_text(&self, page: u32) -> Result<String> {
        let path = self.page_path(page);
        match fs::read(&path) {
            Ok(bytes) => Ok(decode_lossy(&bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No text dump for page {} at {:?}", page, path);
                Ok(String::new())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read text dump: {:?}", path)),
        }
    }
}

/// In-memory page text, for exercising the pipeline without external tools.
#[derive(Debug, Default)]
pub struct CannedPageSource {
    pages: HashMap<u32, String>,
    failing: HashSet<u32>,
    calls: AtomicUsize,
}

impl CannedPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u32, text: impl Into<String>) -> Self {
        self.pages.insert(page, text.into());
        self
    }

    /// Make `page` fail the way a crashed OCR tool would.
    pub fn with_failure(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    /// Number of `page_text` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageSource for CannedPageSource {
    fn page_text(&self, page: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&page) {
            anyhow::bail!("canned failure for page {}", page);
        }
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decode_lossy_drops_invalid_bytes() {
        let bytes = [b"apple ".as_slice(), &[0xff, 0xfe], "蘋果".as_bytes()].concat();
        assert_eq!(decode_lossy(&bytes), "apple 蘋果");
    }

    #[test]
    fn test_text_dump_source() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("page-002.txt"), "cat [kæt]\n貓\n").unwrap();

        let source = TextDumpSource::new(temp_dir.path().to_path_buf());
        assert_eq!(source.page_text(2).unwrap(), "cat [kæt]\n貓\n");
        assert_eq!(source.page_text(3).unwrap(), "");
    }

    #[test]
    fn test_canned_source_counts_calls() {
        let source = CannedPageSource::new().with_page(1, "apple [ˈæpəl]").with_failure(2);
        assert_eq!(source.page_text(1).unwrap(), "apple [ˈæpəl]");
        assert!(source.page_text(2).is_err());
        assert_eq!(source.page_text(3).unwrap(), "");
        assert_eq!(source.calls(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_recognizer_reads_image_from_stdin() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        // Stand-in for tesseract: echoes its stdin back.
        let stub = temp_dir.path().join("fake-tesseract");
        fs::write(&stub, "#!/bin/sh\ncat\n").unwrap();
        fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

        let image = temp_dir.path().join("page-001.ppm");
        fs::write(&image, "apple [ˈæpəl]\n蘋果\n").unwrap();

        let recognizer = Recognizer::new("eng+chi_tra".to_string(), 1, 4, Duration::from_secs(5))
            .with_program(stub);
        assert_eq!(recognizer.recognize(&image).unwrap(), "apple [ˈæpəl]\n蘋果\n");
    }
}
