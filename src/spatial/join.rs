use ahash::AHashMap;
use log::warn;

use crate::level::GeoLevel;
use crate::rankings::{RankedLevel, dense_ranks};
use crate::spatial::polygon::BoundaryRecord;

/// One ranked row with its geometry attached, ready for export.
#[derive(Debug, Clone)]
pub struct JoinedRecord {
    pub geo_id: String,
    pub rank: u32,
    pub probability: f64,
    pub prediction: u8,
    pub complement: f64,
    pub actual: Option<f64>,
    pub name: Option<String>,
    pub name_long: Option<String>,
    /// None when no boundary polygon matched; tabular exports keep the row,
    /// spatial exports skip it.
    pub geometry: Option<geo::MultiPolygon<f64>>,
}

/// Join output for one level, sorted by rank ascending.
#[derive(Debug)]
pub struct JoinedLevel {
    pub level: GeoLevel,
    pub records: Vec<JoinedRecord>,
    /// Ranked rows with no matching polygon (kept, geometry None).
    pub unmatched_rows: usize,
    /// Polygons with no matching ranked row (dropped).
    pub unmatched_polygons: usize,
}

/// Canonicalize a geo id from a workbook or attribute table.
///
/// Strips wrapping quote artifacts, collapses float round-trips like
/// "6037.0", and zero-pads digit-only ids to the level's fixed width
/// (tract GEOIDs lose their leading zero the moment a spreadsheet treats
/// them as numbers).
pub(crate) fn normalize_geo_id(raw: &str, width: Option<usize>) -> String {
    let trimmed = raw.trim().trim_matches(|c: char| !c.is_ascii_alphanumeric());

    let mut id = match trimmed.strip_suffix(".0") {
        Some(head) if !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()) => head.to_string(),
        _ => trimmed.to_string(),
    };

    if let Some(width) = width
        && !id.is_empty()
        && id.len() < width
        && id.chars().all(|c| c.is_ascii_digit())
    {
        id = format!("{:0>width$}", id);
    }
    id
}

/// Join ranked rows against boundary polygons on normalized geo id, and
/// assign dense ranks by probability descending.
///
/// Every ranked row survives the join. Boundary polygons without a ranked
/// counterpart are dropped and counted.
pub(crate) fn join(ranked: &RankedLevel, boundaries: Vec<BoundaryRecord>) -> JoinedLevel {
    let width = ranked.level.geoid_width();

    let mut by_id: AHashMap<String, BoundaryRecord> = AHashMap::with_capacity(boundaries.len());
    for boundary in boundaries {
        let id = normalize_geo_id(&boundary.geo_id, width);
        if by_id.insert(id.clone(), boundary).is_some() {
            warn!("  {}: duplicate boundary polygon for {}; keeping last", ranked.level, id);
        }
    }

    let ranks = dense_ranks(&ranked.records.iter().map(|r| r.probability).collect::<Vec<_>>());

    let mut records = Vec::with_capacity(ranked.len());
    let mut unmatched_rows = 0;
    for (record, rank) in ranked.records.iter().zip(ranks) {
        let geo_id = normalize_geo_id(&record.geo_id, width);
        let boundary = by_id.remove(&geo_id);
        if boundary.is_none() {
            unmatched_rows += 1;
        }

        let (geometry, boundary_name, boundary_name_long) = match boundary {
            Some(b) => (Some(b.geometry), b.name, b.name_long),
            None => (None, None, None),
        };
        records.push(JoinedRecord {
            geo_id,
            rank,
            probability: record.probability,
            prediction: record.prediction,
            complement: record.complement,
            actual: record.actual,
            name: record.name.clone().or(boundary_name),
            name_long: record.name_long.clone().or(boundary_name_long),
            geometry,
        });
    }

    let unmatched_polygons = by_id.len();
    if unmatched_rows > 0 || unmatched_polygons > 0 {
        warn!(
            "  {}: {} ranked rows without geometry, {} polygons without rankings",
            ranked.level, unmatched_rows, unmatched_polygons,
        );
    }

    records.sort_by_key(|r| r.rank);
    JoinedLevel { level: ranked.level, records, unmatched_rows, unmatched_polygons }
}
