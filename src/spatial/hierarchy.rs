use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result, bail};
use calamine::{Reader, Xlsx, open_workbook};
use log::{info, warn};

use crate::level::GeoLevel;
use crate::rankings::{ColumnMap, cell_to_string};
use crate::spatial::join::normalize_geo_id;

const GEOCODE_SHEET: &str = "MasterGeocodeMap";

/// Tract -> MSA containment map from the master geocode workbook.
///
/// Counties need no lookup table: a tract GEOID embeds its county GEOID as
/// the first five digits.
#[derive(Debug, Default)]
pub struct GeoHierarchy {
    tract_to_msa: AHashMap<String, String>,
    county_to_msa: AHashMap<String, String>,
    msa_names: AHashMap<String, String>,
}

impl GeoHierarchy {
    /// Load the hierarchy from the MasterGeocodeMap sheet.
    ///
    /// Rows with an empty MSA cell are tracts outside any metro area and are
    /// skipped; they simply never contribute to a dissolved MSA geometry.
    pub(crate) fn from_workbook(path: &Path) -> Result<Self> {
        info!("Loading geocode map from: {}", path.display());

        let mut workbook: Xlsx<_> = open_workbook(path)
            .with_context(|| format!("Failed to open geocode workbook: {}", path.display()))?;
        let range = workbook
            .worksheet_range(GEOCODE_SHEET)
            .with_context(|| format!("Required sheet {:?} missing from geocode workbook", GEOCODE_SHEET))?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            bail!("Sheet {:?} is empty", GEOCODE_SHEET);
        };

        let columns = ColumnMap::new(header);
        let tract_col = columns.require("tract geo_id", &["CLEAN_Tract Geoid", "Tract_GeoID", "GEOID"])?;
        let msa_col = columns.require("msa code", &["Metropolitan Division Code", "CBSA Code"])?;
        let msa_name_col = columns.find(&["Metropolitan Division Title", "CBSA Title"]);

        let mut hierarchy = Self::default();
        for row in rows {
            let tract = row
                .get(tract_col)
                .map(|c| normalize_geo_id(&cell_to_string(c), GeoLevel::Tract.geoid_width()))
                .unwrap_or_default();
            let msa = row
                .get(msa_col)
                .map(|c| normalize_geo_id(&cell_to_string(c), None))
                .unwrap_or_default();
            if tract.is_empty() || msa.is_empty() {
                continue;
            }

            if tract.len() >= 5 {
                hierarchy.county_to_msa.entry(tract[..5].to_string()).or_insert_with(|| msa.clone());
            }
            if let Some(previous) = hierarchy.tract_to_msa.insert(tract.clone(), msa.clone()) {
                if previous != msa {
                    warn!("  tract {} mapped to both MSA {} and {}; keeping {}", tract, previous, msa, msa);
                }
            }
            if let Some(col) = msa_name_col {
                let name = row.get(col).map(cell_to_string).unwrap_or_default();
                if !name.is_empty() {
                    hierarchy.msa_names.entry(msa).or_insert(name);
                }
            }
        }

        info!("  {} tracts mapped to MSAs", hierarchy.tract_to_msa.len());
        Ok(hierarchy)
    }

    pub(crate) fn msa_of_tract(&self, tract_geo_id: &str) -> Option<&str> {
        self.tract_to_msa.get(tract_geo_id).map(String::as_str)
    }

    pub(crate) fn msa_of_county(&self, county_geo_id: &str) -> Option<&str> {
        self.county_to_msa.get(county_geo_id).map(String::as_str)
    }

    pub(crate) fn msa_name(&self, msa_code: &str) -> Option<&str> {
        self.msa_names.get(msa_code).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut county_to_msa = AHashMap::new();
        for (tract, msa) in pairs {
            if tract.len() >= 5 {
                county_to_msa.entry(tract[..5].to_string()).or_insert_with(|| msa.to_string());
            }
        }
        Self {
            tract_to_msa: pairs.iter().map(|(t, m)| (t.to_string(), m.to_string())).collect(),
            county_to_msa,
            msa_names: AHashMap::new(),
        }
    }
}
