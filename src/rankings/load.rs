use std::{collections::HashMap, path::Path};

use ahash::AHashSet;
use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, Xlsx, open_workbook};
use log::{info, warn};

use crate::level::GeoLevel;
use crate::rankings::{RankedLevel, RankedRecord};

/// Resolves logical field names against a sheet's header row once, at load
/// time. Lookups happen here and nowhere else, so a missing required column
/// fails the run immediately instead of surfacing mid-pipeline.
pub(crate) struct ColumnMap {
    header: Vec<String>,
}

impl ColumnMap {
    pub(crate) fn new(header_row: &[Data]) -> Self {
        Self {
            header: header_row.iter().map(|cell| cell_to_string(cell)).collect(),
        }
    }

    /// Find a column by exact name first, then case-insensitively.
    pub(crate) fn find(&self, candidates: &[&str]) -> Option<usize> {
        for name in candidates {
            if let Some(i) = self.header.iter().position(|h| h == name) {
                return Some(i);
            }
        }
        for name in candidates {
            if let Some(i) = self.header.iter().position(|h| h.eq_ignore_ascii_case(name)) {
                return Some(i);
            }
        }
        None
    }

    pub(crate) fn require(&self, logical: &str, candidates: &[&str]) -> Result<usize> {
        self.find(candidates).ok_or_else(|| {
            anyhow::anyhow!(
                "Required column {:?} not found (tried {:?}; available: {:?})",
                logical, candidates, self.header,
            )
        })
    }
}

/// Coerce a workbook cell to trimmed text. Numeric cells holding integral
/// values render without a fractional part, so a GEOID stored as 6037.0
/// comes back as "6037".
pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{:.0}", f),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Coerce a workbook cell to f64, NaN when empty or non-numeric.
pub(crate) fn cell_to_f64(cell: &Data) -> f64 {
    match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Per-level candidates for the geo id column in the ranked workbook.
fn geoid_candidates(level: GeoLevel) -> &'static [&'static str] {
    match level {
        GeoLevel::Tract => &["Tract_GeoID", "GEOID", "CLEAN_Tract Geoid"],
        GeoLevel::County => &["County_GeoID", "GEOID", "Clean_County_GeoID"],
        GeoLevel::Msa => &["Metropolitan Division Code", "CBSA Code", "MSA", "GEOID"],
    }
}

/// Load the ranked workbook: one sheet per requested level, columns
/// `GEOID, P, Prediction-01, 1-P, y_true, NAME/NAMELSAD`.
///
/// A missing sheet or required column is fatal. The redundant `1-P` column is
/// recomputed from `P`; a source value disagreeing beyond float tolerance is
/// reported once per sheet.
pub(crate) fn load_ranked_workbook(
    path: &Path,
    levels: &[GeoLevel],
) -> Result<HashMap<GeoLevel, RankedLevel>> {
    info!("Loading rankings from: {}", path.display());

    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open rankings workbook: {}", path.display()))?;

    let mut rankings = HashMap::new();
    for &level in levels {
        let range = workbook
            .worksheet_range(level.sheet_name())
            .with_context(|| format!("Required sheet {:?} missing from rankings workbook", level.sheet_name()))?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            bail!("Sheet {:?} is empty", level.sheet_name());
        };

        let columns = ColumnMap::new(header);
        let geoid_col = columns.require("geo_id", geoid_candidates(level))?;
        let p_col = columns.require("P", &["P"])?;
        let prediction_col = columns.require("Prediction-01", &["Prediction-01"])?;
        let complement_col = columns.find(&["1-P"]);
        let actual_col = columns.find(&["y_true"]);
        let name_col = columns.find(&["NAME"]);
        let name_long_col = columns.find(&["NAMELSAD"]);

        let mut records = Vec::new();
        let mut seen = AHashSet::new();
        let mut complement_mismatch = false;

        for row in rows {
            let geo_id = row.get(geoid_col).map(cell_to_string).unwrap_or_default();
            if geo_id.is_empty() {
                continue;
            }
            if !seen.insert(geo_id.clone()) {
                warn!("  {}: duplicate geo_id {:?} dropped (keeping first occurrence)", level, geo_id);
                continue;
            }

            let probability = row.get(p_col).map(cell_to_f64).unwrap_or(f64::NAN);
            let complement = 1.0 - probability;
            if let Some(col) = complement_col {
                let source = row.get(col).map(cell_to_f64).unwrap_or(f64::NAN);
                if !complement_mismatch && source.is_finite() && (source - complement).abs() > 1e-6 {
                    warn!("  {}: 1-P column disagrees with P (first at geo_id {:?}); recomputing", level, geo_id);
                    complement_mismatch = true;
                }
            }

            let prediction = row
                .get(prediction_col)
                .map(cell_to_f64)
                .filter(|v| v.is_finite())
                .map(|v| (v != 0.0) as u8)
                .unwrap_or(0);
            let actual = actual_col
                .and_then(|col| row.get(col))
                .map(cell_to_f64)
                .filter(|v| v.is_finite());
            let name = name_col
                .and_then(|col| row.get(col))
                .map(cell_to_string)
                .filter(|s| !s.is_empty());
            let name_long = name_long_col
                .and_then(|col| row.get(col))
                .map(cell_to_string)
                .filter(|s| !s.is_empty());

            records.push(RankedRecord {
                geo_id,
                probability,
                prediction,
                complement,
                actual,
                name,
                name_long,
            });
        }

        info!("  {}: {} rows loaded", level.sheet_name(), records.len());
        rankings.insert(level, RankedLevel::new(level, records));
    }

    Ok(rankings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<Data> {
        names.iter().map(|n| Data::String(n.to_string())).collect()
    }

    #[test]
    fn column_map_prefers_exact_match() {
        let columns = ColumnMap::new(&header(&["GEOID", "Tract_GeoID", "P"]));
        assert_eq!(columns.find(&["Tract_GeoID", "GEOID"]), Some(1));
        assert_eq!(columns.find(&["P"]), Some(2));
    }

    #[test]
    fn column_map_falls_back_to_case_insensitive() {
        let columns = ColumnMap::new(&header(&["geoid", "p"]));
        assert_eq!(columns.find(&["GEOID"]), Some(0));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let columns = ColumnMap::new(&header(&["GEOID"]));
        assert!(columns.require("P", &["P"]).is_err());
    }

    #[test]
    fn integral_float_cells_render_without_fraction() {
        assert_eq!(cell_to_string(&Data::Float(6037.0)), "6037");
        assert_eq!(cell_to_string(&Data::Float(0.25)), "0.25");
        assert_eq!(cell_to_string(&Data::String("  06037  ".into())), "06037");
    }
}
