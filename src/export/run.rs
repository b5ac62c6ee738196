use std::collections::HashMap;

use anyhow::Result;
use log::{info, warn};

use crate::common::{ensure_dir_exists, require_file_exists};
use crate::config::{ExportConfig, Format};
use crate::export::manifest::{FailureEntry, FileEntry, RunStatus, RunSummary};
use crate::export::{write_csv, write_excel, write_frontend_sidecars, write_geojson, write_kml, write_kmz};
use crate::geom::dissolve_tracts_to_msa;
use crate::level::GeoLevel;
use crate::rankings::{RankedLevel, load_ranked_workbook};
use crate::spatial::{BoundaryRecord, GeoHierarchy, join, load_boundaries};

/// Everything the export pipeline consumes, loaded up front.
///
/// Separated from the run itself so callers can assemble inputs without
/// touching the filesystem.
pub struct ExportInputs {
    pub rankings: HashMap<GeoLevel, RankedLevel>,
    pub tract_boundaries: Vec<BoundaryRecord>,
    pub county_boundaries: Vec<BoundaryRecord>,
    pub hierarchy: GeoHierarchy,
}

/// Load all inputs the configured levels need. Any missing input file or
/// sheet is fatal here, before anything is written.
pub fn load_inputs(config: &ExportConfig) -> Result<ExportInputs> {
    require_file_exists(&config.rankings_workbook)?;
    let rankings = load_ranked_workbook(&config.rankings_workbook, &config.levels)?;

    let wants = |level: GeoLevel| config.levels.contains(&level);

    let tract_boundaries = if wants(GeoLevel::Tract) || wants(GeoLevel::Msa) {
        load_boundaries(&config.spatial_dir, GeoLevel::Tract)?
    } else {
        Vec::new()
    };
    let county_boundaries = if wants(GeoLevel::County) {
        load_boundaries(&config.spatial_dir, GeoLevel::County)?
    } else {
        Vec::new()
    };
    let hierarchy = if wants(GeoLevel::Msa) {
        require_file_exists(&config.geocode_workbook)?;
        GeoHierarchy::from_workbook(&config.geocode_workbook)?
    } else if config.frontend_sidecars && config.geocode_workbook.is_file() {
        // Sidecars carry county/MSA ids when the geocode map is around, but
        // can be produced without it
        GeoHierarchy::from_workbook(&config.geocode_workbook)?
    } else {
        GeoHierarchy::default()
    };

    Ok(ExportInputs { rankings, tract_boundaries, county_boundaries, hierarchy })
}

/// Run the full export pipeline: load, join, dissolve, rank and write every
/// configured (level, format) artifact plus the manifest.
pub fn run_exports(config: &ExportConfig) -> Result<RunSummary> {
    let inputs = load_inputs(config)?;
    run_exports_with_inputs(config, inputs)
}

/// Run the pipeline over pre-loaded inputs.
///
/// A failing (level, format) artifact is recorded in the manifest and does
/// not stop the remaining artifacts. Only an unusable output directory or an
/// unwritable manifest is fatal.
pub fn run_exports_with_inputs(config: &ExportConfig, mut inputs: ExportInputs) -> Result<RunSummary> {
    let output_dir = &config.output_dir;
    ensure_dir_exists(output_dir)?;

    let mut files: Vec<FileEntry> = Vec::new();
    let mut failures: Vec<FailureEntry> = Vec::new();
    let mut dropped_polygons = 0;
    let mut unmatched_rows = 0;
    let mut skipped_msa_groups = 0;

    // Dissolve before the per-level loop: the tract join below takes the
    // tract boundaries by value, and the dissolve needs them intact.
    let mut msa_boundaries = Vec::new();
    if config.levels.contains(&GeoLevel::Msa) {
        let (dissolved, skipped) = dissolve_tracts_to_msa(&inputs.tract_boundaries, &inputs.hierarchy);
        skipped_msa_groups += skipped;
        msa_boundaries = dissolved;
    }

    for &level in &config.levels {
        let Some(ranked) = inputs.rankings.get(&level) else {
            failures.push(FailureEntry {
                level: level.to_str().to_string(),
                format: "*".to_string(),
                error: "no rankings loaded for level".to_string(),
            });
            continue;
        };

        let boundaries = match level {
            GeoLevel::Tract => std::mem::take(&mut inputs.tract_boundaries),
            GeoLevel::County => std::mem::take(&mut inputs.county_boundaries),
            GeoLevel::Msa => std::mem::take(&mut msa_boundaries),
        };

        let joined = join(ranked, boundaries);
        dropped_polygons += joined.unmatched_polygons;
        unmatched_rows += joined.unmatched_rows;
        info!("Exporting {} ({} records)", level, joined.records.len());

        for &format in &config.formats {
            let relative = format!("rankings_{}.{}", level.to_str(), format.extension());
            let path = output_dir.join(&relative);
            let result = match format {
                Format::Csv => write_csv(&joined, &path),
                Format::Excel => write_excel(&joined, &path),
                Format::GeoJson => write_geojson(&joined, &path),
                Format::Kml => write_kml(&joined, &config.simplification, &path),
                Format::Kmz => write_kmz(&joined, &config.simplification, &path),
            };
            let entry = result.and_then(|records| {
                FileEntry::for_file(level.to_str(), format.to_str(), output_dir, &relative, records)
            });
            match entry {
                Ok(entry) => files.push(entry),
                Err(error) => {
                    warn!("  {} {} failed: {:#}", level, format, error);
                    failures.push(FailureEntry {
                        level: level.to_str().to_string(),
                        format: format.to_str().to_string(),
                        error: format!("{:#}", error),
                    });
                }
            }
        }

        if config.frontend_sidecars {
            match write_frontend_sidecars(&joined, &inputs.hierarchy, &config.simplification, output_dir) {
                Ok(sidecars) => {
                    for (relative, records) in sidecars {
                        match FileEntry::for_file(level.to_str(), "json", output_dir, &relative, records) {
                            Ok(entry) => files.push(entry),
                            Err(error) => failures.push(FailureEntry {
                                level: level.to_str().to_string(),
                                format: "json".to_string(),
                                error: format!("{:#}", error),
                            }),
                        }
                    }
                }
                Err(error) => {
                    warn!("  {} sidecars failed: {:#}", level, error);
                    failures.push(FailureEntry {
                        level: level.to_str().to_string(),
                        format: "json".to_string(),
                        error: format!("{:#}", error),
                    });
                }
            }
        }
    }

    let status = if files.is_empty() && !failures.is_empty() { RunStatus::Failed } else { RunStatus::Complete };
    let summary = RunSummary {
        status,
        exports_dir: output_dir.display().to_string(),
        total_files: files.len(),
        files,
        failures,
        dropped_polygons,
        unmatched_rows,
        skipped_msa_groups,
    };
    summary.write(output_dir)?;

    info!(
        "Export run {:?}: {} files, {} failures",
        summary.status,
        summary.total_files,
        summary.failures.len(),
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::config::SimplifyConfig;
    use crate::rankings::RankedRecord;

    fn ranked_row(geo_id: &str, probability: f64) -> RankedRecord {
        RankedRecord {
            geo_id: geo_id.to_string(),
            probability,
            prediction: (probability >= 0.5) as u8,
            complement: 1.0 - probability,
            actual: None,
            name: None,
            name_long: None,
        }
    }

    fn square_at(x: f64) -> geo::MultiPolygon<f64> {
        geo::MultiPolygon(vec![geo::Polygon::new(
            geo::LineString::from(vec![(x, 0.0), (x + 1.0, 0.0), (x + 1.0, 1.0), (x, 1.0), (x, 0.0)]),
            vec![],
        )])
    }

    fn boundary(id: &str, x: f64) -> BoundaryRecord {
        BoundaryRecord { geo_id: id.to_string(), name: None, name_long: None, geometry: square_at(x) }
    }

    fn config(output_dir: &Path, levels: Vec<GeoLevel>, formats: Vec<Format>) -> ExportConfig {
        ExportConfig {
            rankings_workbook: "unused.xlsx".into(),
            spatial_dir: "unused".into(),
            geocode_workbook: "unused.xlsx".into(),
            output_dir: output_dir.to_path_buf(),
            formats,
            levels,
            simplification: SimplifyConfig::default(),
            frontend_sidecars: false,
        }
    }

    #[test]
    fn one_failing_format_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), vec![GeoLevel::County], vec![Format::Csv, Format::GeoJson, Format::Kml]);
        // Squat on the geojson output path so File::create fails
        std::fs::create_dir_all(dir.path().join("rankings_county.geojson")).unwrap();

        let inputs = ExportInputs {
            rankings: HashMap::from([(
                GeoLevel::County,
                RankedLevel::new(GeoLevel::County, vec![ranked_row("06037", 0.9)]),
            )]),
            tract_boundaries: Vec::new(),
            county_boundaries: vec![boundary("06037", 0.0)],
            hierarchy: GeoHierarchy::default(),
        };

        let summary = run_exports_with_inputs(&config, inputs).unwrap();
        assert_eq!(summary.status, RunStatus::Complete);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].format, "geojson");
        assert_eq!(summary.total_files, 2);
        assert!(dir.path().join("rankings_county.csv").exists());
        assert!(dir.path().join("rankings_county.kml").exists());
    }

    #[test]
    fn end_to_end_tract_and_msa_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), vec![GeoLevel::Tract, GeoLevel::Msa], Format::ALL.to_vec());
        config.frontend_sidecars = true;

        let inputs = ExportInputs {
            rankings: HashMap::from([
                (
                    GeoLevel::Tract,
                    RankedLevel::new(
                        GeoLevel::Tract,
                        vec![ranked_row("06037100001", 0.9), ranked_row("06037100002", 0.2)],
                    ),
                ),
                (GeoLevel::Msa, RankedLevel::new(GeoLevel::Msa, vec![ranked_row("31080", 0.6)])),
            ]),
            tract_boundaries: vec![boundary("06037100001", 0.0), boundary("06037100002", 1.0)],
            county_boundaries: Vec::new(),
            hierarchy: GeoHierarchy::from_pairs(&[
                ("06037100001", "31080"),
                ("06037100002", "31080"),
            ]),
        };

        let summary = run_exports_with_inputs(&config, inputs).unwrap();
        assert_eq!(summary.status, RunStatus::Complete);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.skipped_msa_groups, 0);

        for level in ["tract", "msa"] {
            for ext in ["csv", "xlsx", "geojson", "kml", "kmz"] {
                let path = dir.path().join(format!("rankings_{level}.{ext}"));
                assert!(path.exists(), "missing rankings_{level}.{ext}");
                assert!(std::fs::metadata(&path).unwrap().len() > 0);
            }
        }
        assert!(dir.path().join("tract_polygons/county_06037.json").exists());

        // The tract level runs first and consumes the tract boundaries; the
        // MSA outline must still come out dissolved from them
        let msa_geojson: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("rankings_msa.geojson")).unwrap()).unwrap();
        let msa_features = msa_geojson["features"].as_array().unwrap();
        assert_eq!(msa_features.len(), 1);
        assert_eq!(msa_features[0]["id"], "31080");

        // Manifest is itself on disk and consistent
        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("export_manifest.json")).unwrap()).unwrap();
        assert_eq!(manifest["status"], "COMPLETE");
        assert_eq!(manifest["total_files"].as_u64().unwrap() as usize, summary.total_files);
        assert_eq!(manifest["files"].as_array().unwrap().len(), summary.total_files);
        for file in manifest["files"].as_array().unwrap() {
            assert_eq!(file["sha256"].as_str().unwrap().len(), 64);
        }
    }

    #[test]
    fn missing_rankings_for_a_level_is_itemized() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), vec![GeoLevel::County], vec![Format::Csv]);
        let inputs = ExportInputs {
            rankings: HashMap::new(),
            tract_boundaries: Vec::new(),
            county_boundaries: Vec::new(),
            hierarchy: GeoHierarchy::default(),
        };

        let summary = run_exports_with_inputs(&config, inputs).unwrap();
        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].format, "*");
    }
}
