use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use geo::MultiPolygon;
use geo::orient::{Direction, Orient};
use serde_json::{Value, json};

use crate::export::score_to_screen_color;
use crate::spatial::{JoinedLevel, JoinedRecord};

/// Write one level as a GeoJSON FeatureCollection at full resolution.
///
/// Features are serialized one at a time so the tract level never holds the
/// whole document in memory. Records without geometry are skipped. Returns
/// the feature count.
pub(crate) fn write_geojson(joined: &JoinedLevel, path: &Path) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create GeoJSON file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writer.write_all(br#"{"type":"FeatureCollection","features":["#)?;
    let mut written = 0;
    for record in &joined.records {
        let Some(geometry) = &record.geometry else {
            continue;
        };
        if written > 0 {
            writer.write_all(b",")?;
        }
        serde_json::to_writer(&mut writer, &feature(record, geometry))?;
        written += 1;
    }
    writer.write_all(b"]}")?;
    writer.flush()?;

    Ok(written)
}

fn feature(record: &JoinedRecord, geometry: &MultiPolygon<f64>) -> Value {
    json!({
        "type": "Feature",
        "id": record.geo_id,
        "geometry": multipolygon_to_geojson(geometry),
        "properties": {
            "rank": record.rank,
            "geo_id": record.geo_id,
            "name": record.name,
            "name_long": record.name_long,
            "probability": finite(record.probability),
            "complement": finite(record.complement),
            "prediction": record.prediction,
            "actual": record.actual.and_then(finite),
            "color": score_to_screen_color(record.probability),
        },
    })
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Convert a MultiPolygon to a GeoJSON geometry value with RFC 7946 ring
/// winding (exteriors counter-clockwise, holes clockwise).
pub(crate) fn multipolygon_to_geojson(mp: &MultiPolygon<f64>) -> Value {
    let oriented = mp.orient(Direction::Default);
    let coordinates: Vec<Value> = oriented
        .0
        .iter()
        .map(|polygon| {
            let mut rings: Vec<Vec<Vec<f64>>> = Vec::with_capacity(1 + polygon.interiors().len());
            rings.push(ring_coords(polygon.exterior()));
            rings.extend(polygon.interiors().iter().map(ring_coords));
            json!(rings)
        })
        .collect();
    json!({
        "type": "MultiPolygon",
        "coordinates": coordinates,
    })
}

/// Ring coordinates as [lon, lat] pairs, closed.
fn ring_coords(ring: &geo::LineString<f64>) -> Vec<Vec<f64>> {
    let mut coords: Vec<Vec<f64>> = ring.coords().map(|c| vec![c.x, c.y]).collect();
    if !coords.is_empty() && coords.first() != coords.last() {
        coords.push(coords[0].clone());
    }
    coords
}
