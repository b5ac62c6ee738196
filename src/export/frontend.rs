use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use geo::Centroid;
use serde_json::{Map, Value, json};

use crate::common::ensure_dir_exists;
use crate::config::SimplifyConfig;
use crate::export::score_to_screen_color;
use crate::geom::{Geom, simplify};
use crate::level::GeoLevel;
use crate::spatial::{GeoHierarchy, JoinedLevel, JoinedRecord};

/// Write the JSON sidecars the map UI loads for one level:
/// `geoPolygons_{level}.json` (simplified FeatureCollection),
/// `mockRegions_{level}.json` (region list with centroid, rank, score and
/// hierarchy ids) and `regionDetails_{level}.json`. For tracts an additional
/// `tract_polygons/county_{id}.json` split lets the UI lazy-load one county
/// at a time.
///
/// Returns (relative path, record count) per file written.
pub(crate) fn write_frontend_sidecars(
    joined: &JoinedLevel,
    hierarchy: &GeoHierarchy,
    simplification: &SimplifyConfig,
    output_dir: &Path,
) -> Result<Vec<(String, usize)>> {
    let level = joined.level.to_str();
    let mut written = Vec::new();

    let mut features = Vec::new();
    let mut regions = Vec::new();
    let mut details = Map::new();
    for record in &joined.records {
        let ids = HierarchyIds::resolve(joined.level, record, hierarchy);

        let shape = record.geometry.as_ref().map(|geometry| {
            simplify(geometry, simplification.frontend_tolerance, simplification.preserve_topology)
        });
        if let Some(shape) = &shape {
            features.push(json!({
                "type": "Feature",
                "properties": {
                    "id": record.geo_id,
                    "countyID": ids.county,
                    "msaID": ids.msa,
                    "msaName": ids.msa_name,
                },
                "geometry": geom_to_geojson(shape),
            }));
        }

        let centroid = shape.as_ref().and_then(geom_centroid);
        regions.push(json!({
            "id": record.geo_id,
            "name": record.name,
            "geoLevel": joined.level.sheet_name().to_uppercase(),
            "rank": record.rank,
            "score": finite(record.probability).unwrap_or(0.0),
            "lat": centroid.map(|c| round6(c.y())),
            "lng": centroid.map(|c| round6(c.x())),
            "countyID": ids.county,
            "msaID": ids.msa,
            "msaName": ids.msa_name,
            "color": score_to_screen_color(record.probability),
        }));
        details.insert(
            record.geo_id.clone(),
            json!({
                "name": record.name,
                "nameLong": record.name_long,
                "rank": record.rank,
                "probability": finite(record.probability),
                "complement": finite(record.complement),
                "prediction": record.prediction,
                "actual": record.actual.and_then(finite),
                "countyID": ids.county,
                "msaID": ids.msa,
            }),
        );
    }

    let feature_count = features.len();
    let collection = json!({ "type": "FeatureCollection", "features": features });
    write_json(output_dir, &format!("geoPolygons_{level}.json"), &collection, &mut written, feature_count)?;
    write_json(output_dir, &format!("mockRegions_{level}.json"), &Value::Array(regions), &mut written, joined.records.len())?;
    write_json(output_dir, &format!("regionDetails_{level}.json"), &Value::Object(details), &mut written, joined.records.len())?;

    if joined.level == GeoLevel::Tract {
        written.extend(write_county_splits(&collection, output_dir)?);
    }
    Ok(written)
}

struct HierarchyIds {
    county: Option<String>,
    msa: Option<String>,
    msa_name: Option<String>,
}

impl HierarchyIds {
    fn resolve(level: GeoLevel, record: &JoinedRecord, hierarchy: &GeoHierarchy) -> Self {
        let (county, msa) = match level {
            GeoLevel::Tract => {
                let county = (record.geo_id.len() >= 5).then(|| record.geo_id[..5].to_string());
                let msa = hierarchy.msa_of_tract(&record.geo_id).map(String::from);
                (county, msa)
            }
            GeoLevel::County => (
                Some(record.geo_id.clone()),
                hierarchy.msa_of_county(&record.geo_id).map(String::from),
            ),
            GeoLevel::Msa => (None, Some(record.geo_id.clone())),
        };
        let msa_name = match level {
            GeoLevel::Msa => record.name.clone().or_else(|| hierarchy.msa_name(&record.geo_id).map(String::from)),
            _ => msa.as_deref().and_then(|code| hierarchy.msa_name(code)).map(String::from),
        };
        Self { county, msa, msa_name }
    }
}

/// Split the tract FeatureCollection by the county prefix of each feature id.
fn write_county_splits(collection: &Value, output_dir: &Path) -> Result<Vec<(String, usize)>> {
    ensure_dir_exists(&output_dir.join("tract_polygons"))?;

    let mut by_county: Map<String, Value> = Map::new();
    if let Some(features) = collection["features"].as_array() {
        for feature in features {
            let Some(tract_id) = feature["properties"]["id"].as_str() else {
                continue;
            };
            if tract_id.len() < 5 {
                continue;
            }
            let entry = by_county
                .entry(tract_id[..5].to_string())
                .or_insert_with(|| json!({ "type": "FeatureCollection", "features": [] }));
            if let Some(list) = entry["features"].as_array_mut() {
                list.push(feature.clone());
            }
        }
    }

    let mut written = Vec::new();
    for (county, tracts) in by_county {
        let count = tracts["features"].as_array().map(Vec::len).unwrap_or(0);
        write_json(output_dir, &format!("tract_polygons/county_{county}.json"), &tracts, &mut written, count)?;
    }
    Ok(written)
}

fn write_json(
    output_dir: &Path,
    relative: &str,
    value: &Value,
    written: &mut Vec<(String, usize)>,
    records: usize,
) -> Result<()> {
    let path = output_dir.join(relative);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create sidecar: {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write sidecar: {}", path.display()))?;
    written.push((relative.to_string(), records));
    Ok(())
}

/// GeoJSON geometry for a simplified shape, coordinates rounded to 6
/// decimals (about 10 cm).
fn geom_to_geojson(shape: &Geom) -> Value {
    match shape {
        Geom::Point(point) => json!({
            "type": "Point",
            "coordinates": [round6(point.x()), round6(point.y())],
        }),
        _ => {
            let coordinates: Vec<Value> = shape
                .polygons()
                .iter()
                .map(|polygon| {
                    let mut rings: Vec<Vec<Vec<f64>>> = Vec::with_capacity(1 + polygon.interiors().len());
                    rings.push(ring_coords(polygon.exterior()));
                    rings.extend(polygon.interiors().iter().map(ring_coords));
                    json!(rings)
                })
                .collect();
            json!({ "type": "MultiPolygon", "coordinates": coordinates })
        }
    }
}

fn ring_coords(ring: &geo::LineString<f64>) -> Vec<Vec<f64>> {
    ring.coords().map(|c| vec![round6(c.x), round6(c.y)]).collect()
}

fn geom_centroid(shape: &Geom) -> Option<geo::Point<f64>> {
    match shape {
        Geom::Polygon(p) => p.centroid(),
        Geom::MultiPolygon(mp) => mp.centroid(),
        Geom::Point(point) => Some(*point),
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
