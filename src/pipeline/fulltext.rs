use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{page_stem, PageRange};
use crate::utils::PageSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FulltextReport {
    pub written: usize,
    pub skipped: usize,
}

/// Dumps recognized text to `page-NNN.txt`, one file per page, for manual
/// cleanup. Existing files are never overwritten.
#[derive(Debug, Clone)]
pub struct FulltextExporter {
    out_dir: PathBuf,
}

impl FulltextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn page_path(&self, page: u32) -> PathBuf {
        self.out_dir.join(format!("{}.txt", page_stem(page)))
    }

    pub fn export<S: PageSource>(&self, source: &S, range: PageRange) -> Result<FulltextReport> {
        range.validate()?;
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", self.out_dir))?;

        let mut report = FulltextReport::default();
        for page in range.pages() {
            let path = self.page_path(page);
            if path.exists() {
                report.skipped += 1;
                continue;
            }

            info!("OCR page {}/{}...", page, range.end);
            let text = source
                .page_text(page)
                .with_context(|| format!("Failed to get text for page {}", page))?;
            fs::write(&path, text)
                .with_context(|| format!("Failed to write text dump: {:?}", path))?;
            report.written += 1;
        }

        info!(
            "Done. {} pages written, {} already present in {:?}",
            report.written, report.skipped, self.out_dir
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{CannedPageSource, TextDumpSource};
    use tempfile::TempDir;

    #[test]
    fn test_export_skips_existing_pages() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = FulltextExporter::new(temp_dir.path().join("ocr_fulltext"));
        let source = CannedPageSource::new()
            .with_page(1, "apple [ˈæpəl]\n蘋果\n")
            .with_page(2, "cat [kæt]\n貓\n");

        let first = exporter.export(&source, PageRange::new(1, 2)).unwrap();
        assert_eq!(first, FulltextReport { written: 2, skipped: 0 });

        fs::write(exporter.page_path(2), "cat [kæt]\n貓咪\n").unwrap();
        let second = exporter.export(&source, PageRange::new(1, 3)).unwrap();
        assert_eq!(second, FulltextReport { written: 1, skipped: 2 });
        assert_eq!(source.calls(), 3);

        // Hand edits survive and are what a dump source reads back.
        let dumps = TextDumpSource::new(exporter.out_dir().to_path_buf());
        assert_eq!(dumps.page_text(2).unwrap(), "cat [kæt]\n貓咪\n");
        assert_eq!(dumps.page_text(3).unwrap(), "");
    }
}
