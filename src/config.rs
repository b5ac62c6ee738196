use std::{fs::File, io::BufReader, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::level::GeoLevel;

/// Output format for one export artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Csv,
    Excel,
    GeoJson,
    Kml,
    Kmz,
}

impl Format {
    pub const ALL: [Format; 5] = [Format::Csv, Format::Excel, Format::GeoJson, Format::Kml, Format::Kmz];

    pub fn to_str(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Excel => "excel",
            Format::GeoJson => "geojson",
            Format::Kml => "kml",
            Format::Kmz => "kmz",
        }
    }

    /// File extension for artifacts of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Excel => "xlsx",
            Format::GeoJson => "geojson",
            Format::Kml => "kml",
            Format::Kmz => "kmz",
        }
    }

    pub fn from_str(s: &str) -> Option<Format> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(Format::Csv),
            "excel" | "xlsx" => Some(Format::Excel),
            "geojson" => Some(Format::GeoJson),
            "kml" => Some(Format::Kml),
            "kmz" => Some(Format::Kmz),
            _ => None,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Geometry simplification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Tolerance for the KML/KMZ path, in coordinate units (degrees).
    /// 0.005 degrees is roughly 500 m at mid-latitudes and keeps tract-level
    /// output well under the 250,000-vertex ceiling of the KML consumer.
    pub kml_tolerance: f64,
    /// Much finer tolerance for the frontend polygon sidecars (~10 m), chosen
    /// to avoid visible gaps between adjacent polygons on screen.
    pub frontend_tolerance: f64,
    /// Guarantee simplified polygons stay non-self-intersecting.
    pub preserve_topology: bool,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            kml_tolerance: 0.005,
            frontend_tolerance: 0.0001,
            preserve_topology: true,
        }
    }
}

/// Run configuration, deserialized from a JSON file given to the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Ranked workbook with one sheet per level (MSA/County/Tract).
    pub rankings_workbook: PathBuf,
    /// Directory containing Tract.shp and County.shp boundary files.
    pub spatial_dir: PathBuf,
    /// Workbook carrying the MasterGeocodeMap sheet (tract -> county/MSA).
    pub geocode_workbook: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_formats")]
    pub formats: Vec<Format>,
    #[serde(default = "default_levels")]
    pub levels: Vec<GeoLevel>,
    #[serde(default)]
    pub simplification: SimplifyConfig,
    /// Write the geoPolygons/regions/regionDetails JSON sidecars for the map UI.
    #[serde(default = "default_true")]
    pub frontend_sidecars: bool,
}

fn default_output_dir() -> PathBuf { PathBuf::from("data/exports") }
fn default_formats() -> Vec<Format> { Format::ALL.to_vec() }
fn default_levels() -> Vec<GeoLevel> { GeoLevel::ALL.to_vec() }
fn default_true() -> bool { true }

impl ExportConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Config file not found: {}", path.display()))?;
        let config: ExportConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: ExportConfig = serde_json::from_str(
            r#"{
                "rankings_workbook": "rankings.xlsx",
                "spatial_dir": "spatial",
                "geocode_workbook": "geocode.xlsx"
            }"#,
        )
        .unwrap();

        assert_eq!(config.formats, Format::ALL.to_vec());
        assert_eq!(config.levels, GeoLevel::ALL.to_vec());
        assert_eq!(config.simplification.kml_tolerance, 0.005);
        assert!(config.simplification.preserve_topology);
        assert!(config.frontend_sidecars);
    }

    #[test]
    fn formats_and_tolerance_are_overridable() {
        let config: ExportConfig = serde_json::from_str(
            r#"{
                "rankings_workbook": "r.xlsx",
                "spatial_dir": "s",
                "geocode_workbook": "g.xlsx",
                "formats": ["csv", "kmz"],
                "levels": ["tract"],
                "simplification": { "kml_tolerance": 0.01, "preserve_topology": false }
            }"#,
        )
        .unwrap();

        assert_eq!(config.formats, vec![Format::Csv, Format::Kmz]);
        assert_eq!(config.levels, vec![GeoLevel::Tract]);
        assert_eq!(config.simplification.kml_tolerance, 0.01);
        assert!(!config.simplification.preserve_topology);
        // unset keys inside the section still default
        assert_eq!(config.simplification.frontend_tolerance, 0.0001);
    }
}
