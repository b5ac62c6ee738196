use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::config::SimplifyConfig;
use crate::export::kml::write_kml_into;
use crate::spatial::JoinedLevel;

/// Write one level as a KMZ archive: a zip holding a single `doc.kml` entry,
/// which is the layout Google Earth expects. Returns the placemark count.
pub(crate) fn write_kmz(joined: &JoinedLevel, simplification: &SimplifyConfig, path: &Path) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create KMZ file: {}", path.display()))?;
    let mut archive = ZipWriter::new(BufWriter::new(file));

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    archive.start_file("doc.kml", options)?;
    let count = write_kml_into(joined, simplification, &mut archive)?;
    archive.finish()?;

    Ok(count)
}
