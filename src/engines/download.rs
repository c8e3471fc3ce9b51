//! Cached downloads of engine model files

use crate::error::ProcessingError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-user cache directory for model files, `<cache>/ocr-processor[/sub]`
pub fn cache_dir(sub: Option<&str>) -> Result<PathBuf, ProcessingError> {
    let mut dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ocr-processor");
    if let Some(sub) = sub {
        dir = dir.join(sub);
    }

    std::fs::create_dir_all(&dir).map_err(|e| {
        ProcessingError::Initialization(format!("Failed to create cache directory: {}", e))
    })?;

    Ok(dir)
}

/// Return `dir/filename`, downloading it from `url` first when not cached
pub fn ensure_downloaded(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, ProcessingError> {
    let path = dir.join(filename);

    if !path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &path)?;
        tracing::info!("Downloaded {} to {:?}", filename, path);
    } else {
        tracing::info!("Using cached {} from {:?}", filename, path);
    }

    Ok(path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), ProcessingError> {
    let response = ureq::get(url).call().map_err(|e| {
        ProcessingError::Initialization(format!("Failed to download {}: {}", url, e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        ProcessingError::Initialization(format!("Failed to read response body: {}", e))
    })?;

    // Only complete files ever appear under the final name
    let partial = path.with_extension("part");
    let mut file = File::create(&partial).map_err(|e| {
        ProcessingError::Initialization(format!("Failed to create {:?}: {}", partial, e))
    })?;
    file.write_all(&buffer).map_err(|e| {
        ProcessingError::Initialization(format!("Failed to write {:?}: {}", partial, e))
    })?;
    std::fs::rename(&partial, path).map_err(|e| {
        ProcessingError::Initialization(format!("Failed to move {:?} into place: {}", path, e))
    })?;

    Ok(())
}
