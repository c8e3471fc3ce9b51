//! PDF page rasterization

use crate::error::ProcessingError;
use image::DynamicImage;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolution used when none is configured
pub const DEFAULT_DPI: u32 = 200;

/// Turns every page of a PDF into a bitmap, in page order
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, path: &Path) -> Result<Vec<DynamicImage>, ProcessingError>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
///
/// When lopdf can read the page tree, the number of rendered pages is checked
/// against it. Documents lopdf rejects are still handed to pdftoppm.
pub struct PdftoppmRasterizer {
    program: PathBuf,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            program: program.into(),
            dpi: dpi.max(1),
        }
    }

    /// Number of pages in the document's page tree
    pub fn page_count(path: &Path) -> Result<usize, ProcessingError> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| ProcessingError::Rasterization(format!("Failed to load PDF: {}", e)))?;
        Ok(doc.get_pages().len())
    }

    fn render_pages(&self, path: &Path, out_dir: &Path) -> Result<(), ProcessingError> {
        let output = Command::new(&self.program)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(path)
            .arg(out_dir.join("page"))
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ProcessingError::Rasterization(format!(
                    "{} not found; install poppler-utils or set --pdftoppm-path",
                    self.program.display()
                )),
                _ => ProcessingError::Rasterization(format!(
                    "Failed to run {}: {}",
                    self.program.display(),
                    e
                )),
            })?;

        if !output.status.success() {
            return Err(ProcessingError::Rasterization(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm", DEFAULT_DPI)
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn rasterize(&self, path: &Path) -> Result<Vec<DynamicImage>, ProcessingError> {
        // pdftoppm has the final say on documents lopdf cannot read
        let expected = match Self::page_count(path) {
            Ok(0) => {
                return Err(ProcessingError::Rasterization("PDF has no pages".to_string()));
            }
            Ok(count) => Some(count),
            Err(e) => {
                tracing::debug!("Page count unavailable, rendering anyway: {}", e);
                None
            }
        };

        let out_dir = tempfile::tempdir().map_err(|e| {
            ProcessingError::Internal(format!("Failed to create temp directory: {}", e))
        })?;

        tracing::debug!("Rasterizing {:?} pages at {} dpi", expected, self.dpi);
        self.render_pages(path, out_dir.path())?;

        let pages = rendered_pages(out_dir.path())?;
        if pages.is_empty() {
            return Err(ProcessingError::Rasterization(
                "pdftoppm rendered no pages".to_string(),
            ));
        }
        if let Some(expected) = expected.filter(|&n| n != pages.len()) {
            return Err(ProcessingError::Rasterization(format!(
                "Expected {} rendered pages, found {}",
                expected,
                pages.len()
            )));
        }

        pages
            .iter()
            .map(|page| {
                image::open(page).map_err(|e| {
                    ProcessingError::Rasterization(format!(
                        "Failed to decode rendered page {:?}: {}",
                        page.file_name().unwrap_or_default(),
                        e
                    ))
                })
            })
            .collect()
    }
}

/// PNG files written by pdftoppm, sorted by page number.
///
/// pdftoppm zero-pads the number to the width of the page count
/// (`page-01.png` ... `page-12.png`), so names are sorted numerically.
fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, ProcessingError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        ProcessingError::Internal(format!("Failed to list rendered pages: {}", e))
    })?;

    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| ProcessingError::Internal(format!("Failed to list rendered pages: {}", e)))?
            .path();
        if let Some(number) = page_number(&path) {
            pages.push((number, path));
        }
    }

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (_, number) = stem.rsplit_once('-')?;
    number.parse().ok()
}
