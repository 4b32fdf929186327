use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::page_stem;
use crate::data::{Entry, CSV_COLUMNS};
use crate::parser::ParseStats;

/// Append-only CSV table of entries.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entries` as rows. The header row is written only when the
    /// file did not exist beforehand, even if `entries` is empty.
    pub fn append(&self, entries: &[Entry]) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }

        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open CSV for append: {:?}", self.path))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if write_header {
            writer.write_record(CSV_COLUMNS)?;
        }
        for entry in entries {
            writer
                .serialize(entry)
                .with_context(|| format!("Failed to write row for '{}'", entry.headword))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush CSV: {:?}", self.path))?;

        info!("Appended {} rows to {:?}", entries.len(), self.path);
        Ok(entries.len())
    }

    /// Read every row back.
    pub fn read_all(&self) -> Result<Vec<Entry>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open CSV: {:?}", self.path))?;
        let mut entries = Vec::new();
        for row in reader.deserialize::<Entry>() {
            entries.push(row.with_context(|| format!("Malformed row in {:?}", self.path))?);
        }
        Ok(entries)
    }
}

/// What was extracted from one page, kept as the page's "done" marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: u32,
    pub entries: Vec<Entry>,
    pub stats: ParseStats,
    pub recorded_at: u64,
}

/// One JSON marker per parsed page; its presence means "skip this page".
#[derive(Debug, Clone)]
pub struct PageMarkers {
    dir: PathBuf,
}

impl PageMarkers {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self, page: u32) -> PathBuf {
        self.dir.join(format!("{}.json", page_stem(page)))
    }

    pub fn is_done(&self, page: u32) -> bool {
        self.path(page).exists()
    }

    pub fn write(&self, record: &PageRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create marker directory: {:?}", self.dir))?;

        let path = self.path(record.page);
        let json = serde_json::to_string_pretty(record)
            .with_context(|| "Failed to serialize page record")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write page record: {:?}", path))?;
        Ok(path)
    }

    pub fn load(&self, page: u32) -> Result<PageRecord> {
        let path = self.path(page);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read page record: {:?}", path))?;
        let record = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse page record: {:?}", path))?;
        Ok(record)
    }
}
