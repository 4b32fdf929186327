use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::process::run_with_timeout;
use crate::config::page_stem;

/// A single page rendered to an image file.
#[derive(Debug, Clone)]
pub struct RasterizedPage {
    pub page: u32,
    pub path: PathBuf,
}

/// Renders PDF pages to PPM images with `pdftoppm` (poppler-utils).
#[derive(Debug, Clone)]
pub struct Rasterizer {
    program: PathBuf,
    temp_dir: PathBuf,
    dpi: u32,
    timeout: Duration,
}

impl Rasterizer {
    pub fn new(temp_dir: PathBuf, dpi: u32, timeout: Duration) -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
            temp_dir,
            dpi,
            timeout,
        }
    }

    pub fn with_program(mut self, program: PathBuf) -> Self {
        self.program = program;
        self
    }

    /// Render `page` (1-based) of `pdf`.
    ///
    /// Returns `Ok(None)` if the tool succeeded but no image for the page can
    /// be found, which callers treat as a page without text.
    pub fn rasterize(&self, pdf: &Path, page: u32) -> Result<Option<RasterizedPage>> {
        fs::create_dir_all(&self.temp_dir)
            .with_context(|| format!("Failed to create temp directory: {:?}", self.temp_dir))?;

        let stem = page_stem(page);
        let prefix = self.temp_dir.join(&stem);

        let mut cmd = Command::new(&self.program);
        cmd.arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix)
            .stdin(Stdio::null())
            .stderr(Stdio::null());
        run_with_timeout(cmd, "pdftoppm", self.timeout)?;

        let expected = prefix.with_extension("ppm");
        let path = if expected.exists() {
            expected
        } else {
            match find_raster(&self.temp_dir, &stem) {
                Some(found) => {
                    debug!("Using fallback raster {:?} for page {}", found, page);
                    found
                }
                None => {
                    warn!("pdftoppm produced no image for page {}", page);
                    return Ok(None);
                }
            }
        };

        match image::image_dimensions(&path) {
            Ok((w, h)) => debug!("Rasterized page {} at {} dpi: {}x{}", page, self.dpi, w, h),
            Err(e) => debug!("Could not read raster header {:?}: {}", path, e),
        }

        Ok(Some(RasterizedPage { page, path }))
    }
}

/// Look for any `<stem>*.ppm` directly inside `dir`.
///
/// `pdftoppm` appends page suffixes in some versions even with `-singlefile`.
fn find_raster(dir: &Path, stem: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            let name_matches = path
                .file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|name| name.starts_with(stem));
            name_matches && path.extension().and_then(|s| s.to_str()) == Some("ppm")
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_raster_fallback() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("page-012-12.ppm"), b"P6").unwrap();
        fs::write(temp_dir.path().join("page-013.ppm"), b"P6").unwrap();
        fs::write(temp_dir.path().join("page-012.txt"), b"text").unwrap();

        let found = find_raster(temp_dir.path(), "page-012").unwrap();
        assert_eq!(found.file_name().unwrap(), "page-012-12.ppm");
        assert!(find_raster(temp_dir.path(), "page-014").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_rasterize_with_stub_tool() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        // Stand-in for pdftoppm: writes a 2x3 PPM to `<last arg>.ppm`.
        let stub = temp_dir.path().join("fake-pdftoppm");
        fs::write(
            &stub,
            "#!/bin/sh\nfor last; do :; done\nprintf 'P6\\n2 3\\n255\\n' > \"$last.ppm\"\n",
        )
        .unwrap();
        fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

        let raster_dir = temp_dir.path().join("raster");
        let rasterizer = Rasterizer::new(raster_dir.clone(), 300, Duration::from_secs(5))
            .with_program(stub);
        let page = rasterizer
            .rasterize(Path::new("book.pdf"), 7)
            .unwrap()
            .unwrap();

        assert_eq!(page.path, raster_dir.join("page-007.ppm"));
        assert_eq!(page.page, 7);
    }
}
