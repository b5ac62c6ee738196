use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use log::info;

use crate::common::escape_xml;
use crate::config::SimplifyConfig;
use crate::export::probability_to_kml_color;
use crate::geom::{Geom, count_vertices, simplify};
use crate::spatial::{JoinedLevel, JoinedRecord};

/// Write one level as a KML document. Returns the placemark count.
pub(crate) fn write_kml(joined: &JoinedLevel, simplification: &SimplifyConfig, path: &Path) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create KML file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let count = write_kml_into(joined, simplification, &mut writer)?;
    writer.flush()?;
    Ok(count)
}

/// Stream a KML document into any writer.
///
/// Geometry is simplified per record just before serialization, so the
/// full-resolution polygons for a level are never duplicated in memory.
/// Records without geometry are skipped.
pub(crate) fn write_kml_into<W: Write>(
    joined: &JoinedLevel,
    simplification: &SimplifyConfig,
    writer: &mut W,
) -> Result<usize> {
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(writer, r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#)?;
    writeln!(writer, "<Document>")?;
    writeln!(writer, "<name>{} rankings</name>", escape_xml(joined.level.sheet_name()))?;

    let mut written = 0;
    let mut vertices_before = 0usize;
    let mut vertices_after = 0usize;
    for record in &joined.records {
        let Some(geometry) = &record.geometry else {
            continue;
        };
        vertices_before += count_vertices(geometry);
        let simplified = simplify(geometry, simplification.kml_tolerance, simplification.preserve_topology);
        vertices_after += simplified.vertex_count();

        write_placemark(writer, record, &simplified)?;
        written += 1;
    }

    writeln!(writer, "</Document>")?;
    writeln!(writer, "</kml>")?;

    if vertices_before > 0 {
        info!(
            "  {}: KML vertices {} -> {} ({:.1}% reduction)",
            joined.level,
            vertices_before,
            vertices_after,
            100.0 * (1.0 - vertices_after as f64 / vertices_before as f64),
        );
    }
    Ok(written)
}

fn write_placemark<W: Write>(writer: &mut W, record: &JoinedRecord, geom: &Geom) -> Result<()> {
    let name = record.name.as_deref().unwrap_or(&record.geo_id);

    writeln!(writer, "<Placemark>")?;
    writeln!(writer, "<name>{}</name>", escape_xml(name))?;
    writeln!(
        writer,
        "<description>Rank: {}\nID: {}\nProbability: {:.4}\nPrediction: {}</description>",
        record.rank,
        escape_xml(&record.geo_id),
        record.probability,
        record.prediction,
    )?;
    writeln!(writer, "<Style>")?;
    writeln!(
        writer,
        "<PolyStyle><color>{}</color><fill>1</fill><outline>1</outline></PolyStyle>",
        probability_to_kml_color(record.probability),
    )?;
    writeln!(writer, "<LineStyle><color>ff000000</color><width>1</width></LineStyle>")?;
    writeln!(writer, "</Style>")?;

    match geom {
        Geom::Point(point) => {
            writeln!(writer, "<Point><coordinates>{},{},0</coordinates></Point>", point.x(), point.y())?;
        }
        _ => {
            writeln!(writer, "<MultiGeometry>")?;
            for polygon in geom.polygons() {
                writeln!(writer, "<Polygon>")?;
                writeln!(writer, "<outerBoundaryIs><LinearRing><coordinates>")?;
                write_ring(writer, polygon.exterior())?;
                writeln!(writer, "</coordinates></LinearRing></outerBoundaryIs>")?;
                for hole in polygon.interiors() {
                    writeln!(writer, "<innerBoundaryIs><LinearRing><coordinates>")?;
                    write_ring(writer, hole)?;
                    writeln!(writer, "</coordinates></LinearRing></innerBoundaryIs>")?;
                }
                writeln!(writer, "</Polygon>")?;
            }
            writeln!(writer, "</MultiGeometry>")?;
        }
    }
    writeln!(writer, "</Placemark>")?;
    Ok(())
}

fn write_ring<W: Write>(writer: &mut W, ring: &geo::LineString<f64>) -> Result<()> {
    for coord in ring.coords() {
        writeln!(writer, "{},{},0", coord.x, coord.y)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::GeoLevel;

    fn level_with(name: &str, geo_id: &str) -> JoinedLevel {
        let square = geo::Polygon::new(
            geo::LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        JoinedLevel {
            level: GeoLevel::County,
            records: vec![JoinedRecord {
                geo_id: geo_id.into(),
                rank: 1,
                probability: 0.9,
                prediction: 1,
                complement: 0.1,
                actual: None,
                name: Some(name.into()),
                name_long: None,
                geometry: Some(geo::MultiPolygon(vec![square])),
            }],
            unmatched_rows: 0,
            unmatched_polygons: 0,
        }
    }

    /// Walk the document tag by tag and check every element is closed in
    /// order. Escaped names would otherwise break nesting silently.
    fn assert_balanced_xml(xml: &str) {
        let mut stack: Vec<&str> = Vec::new();
        let mut rest = xml;
        while let Some(open) = rest.find('<') {
            let close = rest[open..].find('>').expect("unterminated tag") + open;
            let tag = &rest[open + 1..close];
            rest = &rest[close + 1..];
            if tag.starts_with('?') || tag.ends_with('/') {
                continue;
            }
            if let Some(name) = tag.strip_prefix('/') {
                assert_eq!(stack.pop(), Some(name), "mismatched closing tag </{name}>");
            } else {
                stack.push(tag.split_whitespace().next().unwrap_or(tag));
            }
        }
        assert!(stack.is_empty(), "unclosed tags: {stack:?}");
    }

    #[test]
    fn special_characters_are_escaped_in_names() {
        let joined = level_with("Smith & Sons <County>", "06037");
        let mut out = Vec::new();
        write_kml_into(&joined, &SimplifyConfig::default(), &mut out).unwrap();
        let kml = String::from_utf8(out).unwrap();

        assert!(kml.contains("Smith &amp; Sons &lt;County&gt;"));
        assert!(!kml.contains("Smith & Sons"));
    }

    #[test]
    fn document_is_well_formed_with_hostile_names() {
        let joined = level_with("<Placemark>&'\"</Placemark>", "06037");
        let mut out = Vec::new();
        write_kml_into(&joined, &SimplifyConfig::default(), &mut out).unwrap();
        let kml = String::from_utf8(out).unwrap();

        assert_balanced_xml(&kml);
        assert_eq!(kml.matches("<Placemark>").count(), 1);
    }

    #[test]
    fn placemark_carries_style_and_description() {
        let joined = level_with("Los Angeles", "06037");
        let mut out = Vec::new();
        assert_eq!(write_kml_into(&joined, &SimplifyConfig::default(), &mut out).unwrap(), 1);
        let kml = String::from_utf8(out).unwrap();

        assert!(kml.contains("<color>c800ff00</color>"));
        assert!(kml.contains("Rank: 1"));
        assert!(kml.contains("Probability: 0.9000"));
        assert!(kml.contains("<outerBoundaryIs>"));
    }
}
