//! The `process` subcommand: extract local files without the HTTP server

use crate::files::{ensure_directory, output_filename};
use crate::processor::{DocumentProcessor, ProcessingResult};
use anyhow::Context;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome for one input file
#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub file: PathBuf,
    #[serde(flatten)]
    pub result: ProcessingResult,
    /// Set when the text was written to disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Process `files` in order, stopping at the first failure.
///
/// With `output_dir` each text lands in `{prefix}{stem}.txt` inside it.
pub fn process_files(
    processor: &DocumentProcessor,
    files: &[PathBuf],
    output_dir: Option<&Path>,
    prefix: &str,
) -> anyhow::Result<Vec<BatchEntry>> {
    if let Some(dir) = output_dir {
        ensure_directory(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let result = processor
            .process(file)
            .with_context(|| format!("Failed to process {}", file.display()))?;

        let output = match output_dir {
            Some(dir) => {
                let target = dir.join(output_filename(file, prefix));
                std::fs::write(&target, &result.text)
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                tracing::info!("Wrote {}", target.display());
                Some(target)
            }
            None => None,
        };

        entries.push(BatchEntry {
            file: file.clone(),
            result,
            output,
        });
    }

    Ok(entries)
}

/// Print one JSON document per entry
pub fn print_entries(entries: &[BatchEntry], mut out: impl Write) -> anyhow::Result<()> {
    for entry in entries {
        serde_json::to_writer(&mut out, entry)?;
        writeln!(out)?;
    }
    Ok(())
}
