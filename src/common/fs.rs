use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Create the directory if it doesn't exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Error unless the given file already exists.
pub(crate) fn require_file_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("Required input file not found: {}", path.display());
    }
    Ok(())
}
