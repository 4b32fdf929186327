use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use super::storage::{CsvStore, PageMarkers, PageRecord};
use crate::config::{ExtractConfig, PageRange};
use crate::data::{Deduplicator, Entry};
use crate::parser::{EntryParser, ParseStats};
use crate::utils::PageSource;

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub pages_processed: usize,
    pub pages_skipped: usize,
    pub entries_parsed: usize,
    pub entries_written: usize,
    pub stats: ParseStats,
}

/// Drives page text → entries → unique entries → CSV over a page range.
///
/// Pages with an existing marker are skipped without touching the source,
/// which is what makes an interrupted batch resumable. Any source error
/// aborts the whole batch before anything is written.
pub struct BatchOrchestrator<S: PageSource> {
    source: S,
    parser: EntryParser,
    range: PageRange,
    store: CsvStore,
    markers: PageMarkers,
}

impl<S: PageSource> BatchOrchestrator<S> {
    pub fn new(config: &ExtractConfig, source: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            parser: EntryParser::new(),
            range: config.page_range,
            store: CsvStore::new(config.csv_path()),
            markers: PageMarkers::new(config.pages_dir()),
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn run(&self) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut parsed: Vec<(u32, Vec<Entry>, ParseStats)> = Vec::new();
        info!("Extracting pages {} ({} pages)", self.range, self.range.len());

        for page in self.range.pages() {
            if self.markers.is_done(page) {
                info!("Page {} already parsed, skipping", page);
                report.pages_skipped += 1;
                continue;
            }

            info!("OCR page {}/{}...", page, self.range.end);
            let text = self
                .source
                .page_text(page)
                .with_context(|| format!("Failed to get text for page {}", page))?;

            let (entries, stats) = self.parser.parse_page(page, &text);
            info!("Page {}: {} entries ({})", page, entries.len(), stats);

            report.pages_processed += 1;
            report.entries_parsed += entries.len();
            report.stats += stats;
            parsed.push((page, entries, stats));
        }

        let mut dedup = Deduplicator::new();
        let mut by_page: BTreeMap<u32, (Vec<Entry>, ParseStats)> = BTreeMap::new();
        let mut unique = Vec::new();
        for (page, entries, stats) in parsed {
            let kept: Vec<Entry> = entries.into_iter().filter(|e| dedup.admit(e)).collect();
            unique.extend(kept.iter().cloned());
            by_page.insert(page, (kept, stats));
        }

        report.entries_written = self.store.append(&unique)?;

        // Markers last: a crash before this point leaves the pages to redo.
        let recorded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        for (page, (entries, stats)) in by_page {
            self.markers.write(&PageRecord {
                page,
                entries,
                stats,
                recorded_at,
            })?;
        }

        info!(
            "batch wrote {} rows -> {:?} ({} pages processed, {} skipped)",
            report.entries_written,
            self.store.path(),
            report.pages_processed,
            report.pages_skipped
        );
        if report.stats.dropped_lines() > 0 {
            info!(
                "{} lines dropped ({} unmatched latin, {} orphan chinese)",
                report.stats.dropped_lines(),
                report.stats.unmatched_latin_lines,
                report.stats.orphan_chinese_lines
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::CannedPageSource;
    use std::path::Path;
    use tempfile::TempDir;

    fn config(output: &Path, start: u32, end: u32) -> ExtractConfig {
        ExtractConfig {
            output_directory: output.to_path_buf(),
            page_range: PageRange::new(start, end),
            ..Default::default()
        }
    }

    fn source() -> CannedPageSource {
        CannedPageSource::new()
            .with_page(1, "apple [ˈæpəl]\n蘋果\nbanana [bəˈnænə]\n香蕉\n")
            .with_page(2, "cat [kæt]\n貓\ncat [kæt]\n貓\n")
            .with_page(3, "- 3 -\n")
    }

    #[test]
    fn test_run_parses_and_writes_rows() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path(), 1, 3);
        let orchestrator = BatchOrchestrator::new(&config, source()).unwrap();

        let report = orchestrator.run().unwrap();
        assert_eq!(report.pages_processed, 3);
        assert_eq!(report.entries_parsed, 4);
        assert_eq!(report.entries_written, 3);
        assert_eq!(orchestrator.source().calls(), 3);

        let rows = CsvStore::new(config.csv_path()).read_all().unwrap();
        let headwords: Vec<_> = rows.iter().map(|e| (e.page, e.headword.as_str())).collect();
        assert_eq!(headwords, vec![(1, "apple"), (1, "banana"), (2, "cat")]);

        let markers = PageMarkers::new(config.pages_dir());
        assert!(markers.is_done(3));
        assert_eq!(markers.load(2).unwrap().entries.len(), 1);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path(), 1, 3);

        BatchOrchestrator::new(&config, source()).unwrap().run().unwrap();

        let again = BatchOrchestrator::new(&config, source()).unwrap();
        let report = again.run().unwrap();
        assert_eq!(again.source().calls(), 0);
        assert_eq!(report.pages_skipped, 3);
        assert_eq!(report.entries_written, 0);

        let rows = CsvStore::new(config.csv_path()).read_all().unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_extending_range_only_touches_new_pages() {
        let temp_dir = TempDir::new().unwrap();
        BatchOrchestrator::new(&config(temp_dir.path(), 1, 1), source())
            .unwrap()
            .run()
            .unwrap();

        let config = config(temp_dir.path(), 1, 2);
        let orchestrator = BatchOrchestrator::new(&config, source()).unwrap();
        let report = orchestrator.run().unwrap();
        assert_eq!(orchestrator.source().calls(), 1);
        assert_eq!(report.pages_skipped, 1);

        let raw = std::fs::read_to_string(config.csv_path()).unwrap();
        assert_eq!(raw.matches("page,headword").count(), 1);
        assert_eq!(CsvStore::new(config.csv_path()).read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_source_failure_aborts_batch() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path(), 1, 3);
        let orchestrator = BatchOrchestrator::new(&config, source().with_failure(2)).unwrap();

        assert!(orchestrator.run().is_err());
        assert!(!config.csv_path().exists());
        assert!(!PageMarkers::new(config.pages_dir()).is_done(1));
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        assert!(BatchOrchestrator::new(&config(temp_dir.path(), 4, 2), source()).is_err());
    }
}
