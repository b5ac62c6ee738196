use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::common::sha256_file;

pub(crate) const MANIFEST_FILE: &str = "export_manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Complete,
    Failed,
}

/// One successfully written artifact.
#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub level: String,
    pub format: String,
    pub path: String,
    pub records: usize,
    pub bytes: u64,
    pub sha256: String,
}

impl FileEntry {
    /// Build an entry for a file already on disk, hashing its content.
    pub(crate) fn for_file(level: &str, format: &str, output_dir: &Path, relative: &str, records: usize) -> Result<Self> {
        let path = output_dir.join(relative);
        let bytes = std::fs::metadata(&path)
            .with_context(|| format!("Missing export artifact: {}", path.display()))?
            .len();
        Ok(Self {
            level: level.to_string(),
            format: format.to_string(),
            path: relative.to_string(),
            records,
            bytes,
            sha256: sha256_file(&path)?,
        })
    }
}

/// One (level, format) pair that failed to write.
#[derive(Debug, Serialize)]
pub struct FailureEntry {
    pub level: String,
    pub format: String,
    pub error: String,
}

/// Outcome of a full export run, also serialized as the run manifest.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub exports_dir: String,
    pub total_files: usize,
    pub files: Vec<FileEntry>,
    pub failures: Vec<FailureEntry>,
    /// Boundary polygons dropped for lack of a ranked row.
    pub dropped_polygons: usize,
    /// Ranked rows carried through without geometry.
    pub unmatched_rows: usize,
    pub skipped_msa_groups: usize,
}

impl RunSummary {
    /// Write the manifest into the exports directory.
    pub(crate) fn write(&self, output_dir: &Path) -> Result<()> {
        let path = output_dir.join(MANIFEST_FILE);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create manifest: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
        Ok(())
    }
}
