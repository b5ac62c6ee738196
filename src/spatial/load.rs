use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;
use shapefile::dbase::{FieldValue, Record};

use crate::common::require_file_exists;
use crate::level::GeoLevel;
use crate::spatial::polygon::{BoundaryRecord, shape_to_multipolygon};

/// Attribute column names resolved once against the first dbase record.
struct FieldMap {
    geoid: &'static str,
    name: Option<&'static str>,
    name_long: Option<&'static str>,
}

impl FieldMap {
    fn resolve(record: &Record) -> Result<Self> {
        fn pick(record: &Record, candidates: &[&'static str]) -> Option<&'static str> {
            candidates.iter().copied().find(|&f| record.get(f).is_some())
        }

        let Some(geoid) = pick(record, &["GEOID", "GEOID20", "GEOID10"]) else {
            bail!("no GEOID field in shapefile attributes");
        };
        Ok(Self {
            geoid,
            name: pick(record, &["NAME", "NAME20", "NAME10"]),
            name_long: pick(record, &["NAMELSAD", "NAMELSAD20", "NAMELSAD10"]),
        })
    }
}

fn get_character_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Some(FieldValue::Numeric(Some(n))) if n.fract() == 0.0 => Some(format!("{:.0}", n)),
        _ => None,
    }
}

/// Load boundary polygons for a level from `{spatial_dir}/{Tract,County}.shp`.
pub(crate) fn load_boundaries(spatial_dir: &Path, level: GeoLevel) -> Result<Vec<BoundaryRecord>> {
    let file = match level {
        GeoLevel::Tract => "Tract.shp",
        GeoLevel::County => "County.shp",
        GeoLevel::Msa => bail!("MSA boundaries are dissolved from tracts, not read from disk"),
    };
    let path = spatial_dir.join(file);
    require_file_exists(&path)?;

    let mut reader = shapefile::Reader::from_path(&path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        items.push(result.context("Error reading shape+record")?);
    }

    let Some((_, first)) = items.first() else {
        bail!("Shapefile is empty: {}", path.display());
    };
    let fields = FieldMap::resolve(first)?;

    let mut boundaries = Vec::with_capacity(items.len());
    for (shape, record) in items {
        let Some(geo_id) = get_character_field(&record, fields.geoid) else {
            bail!("record with empty {} field in {}", fields.geoid, path.display());
        };
        boundaries.push(BoundaryRecord {
            geo_id,
            name: fields.name.and_then(|f| get_character_field(&record, f)),
            name_long: fields.name_long.and_then(|f| get_character_field(&record, f)),
            geometry: shape_to_multipolygon(shape)
                .with_context(|| format!("Bad geometry in {}", path.display()))?,
        });
    }

    info!("  {}: {} boundary polygons loaded", level, boundaries.len());
    Ok(boundaries)
}
