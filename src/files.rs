//! Input file checks and file-name helpers

use crate::error::ProcessingError;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

/// Every extension the processor accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx", ".png", ".jpg", ".jpeg"];

/// Extensions accepted by [`validate_image`]
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg"];

/// Prefix used by [`output_filename`] when none is given
pub const DEFAULT_OUTPUT_PREFIX: &str = "processed_";

pub fn supported_extensions() -> Vec<String> {
    SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// Lower-cased extension of the final path component, with its leading dot.
/// Empty when the name has no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Check that `path` exists and carries a supported extension.
///
/// Existence is checked first. Nothing beyond that existence check touches
/// the filesystem.
pub fn validate(path: &Path) -> Result<(), ProcessingError> {
    if !path.exists() {
        return Err(ProcessingError::NotFound(path.to_path_buf()));
    }

    check_extension(path, SUPPORTED_EXTENSIONS)
}

/// Image-only variant of [`validate`]; the extension is checked first.
pub fn validate_image(path: &Path) -> Result<(), ProcessingError> {
    check_extension(path, IMAGE_EXTENSIONS)?;

    if !path.exists() {
        return Err(ProcessingError::NotFound(path.to_path_buf()));
    }

    Ok(())
}

fn check_extension(path: &Path, allowed: &[&str]) -> Result<(), ProcessingError> {
    let extension = extension_of(path);
    if allowed.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ProcessingError::UnsupportedFormat(format!(
            "{} (supported: {})",
            if extension.is_empty() { "<none>" } else { extension.as_str() },
            allowed.join(", ")
        )))
    }
}

/// Read-only snapshot of a file's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub extension: String,
    pub absolute_path: PathBuf,
}

impl FileDescriptor {
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let absolute_path = std::path::absolute(path)?;

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            size_bytes: metadata.len(),
            extension: extension_of(path),
            absolute_path,
        })
    }
}

/// Name of the text file written for `input`: `{prefix}{stem}.txt`
pub fn output_filename(input: &Path, prefix: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{}{}.txt", prefix, stem)
}

/// Create `dir` (and parents) when missing
pub fn ensure_directory(dir: &Path) -> io::Result<&Path> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(dir)
}
