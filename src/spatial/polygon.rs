use anyhow::{Result, bail};
use shapefile as shp;

/// One boundary polygon with the attributes we carry through the pipeline.
#[derive(Debug, Clone)]
pub struct BoundaryRecord {
    pub geo_id: String,
    pub name: Option<String>,
    pub name_long: Option<String>,
    pub geometry: geo::MultiPolygon<f64>,
}

/// Convert a shapefile shape to geo::MultiPolygon<f64>.
pub(crate) fn shape_to_multipolygon(shape: shp::Shape) -> Result<geo::MultiPolygon<f64>> {
    match shape {
        shp::Shape::Polygon(p) => Ok(rings_to_multipolygon(&p)),
        other => bail!("expected polygon shape, got {}", other),
    }
}

/// Regroup a shapefile polygon's flat ring list into geo polygons.
///
/// Shapefiles store rings as [ext, hole, hole, ..., next ext, ...] with
/// exteriors wound clockwise, so orientation tells exterior from hole.
fn rings_to_multipolygon(p: &shp::Polygon) -> geo::MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<geo::Coord<f64>>) {
        if !coords.is_empty() && coords[0] != coords[coords.len() - 1] {
            coords.push(coords[0]);
        }
    }

    /// Get the signed area of a geo::Coord list (negative for exterior here)
    fn signed_area(pts: &[geo::Coord<f64>]) -> f64 {
        let mut a = 0.0;
        for w in pts.windows(2) {
            a += w[0].x * w[1].y - w[1].x * w[0].y;
        }
        a / 2.0
    }

    let mut polys: Vec<geo::Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<geo::LineString<f64>> = None;
    let mut current_holes: Vec<geo::LineString<f64>> = Vec::new();

    for ring in p.rings() {
        let mut coords: Vec<geo::Coord<f64>> =
            ring.points().iter().map(|pt| geo::Coord { x: pt.x, y: pt.y }).collect();
        ensure_closed(&mut coords);
        let is_exterior = signed_area(&coords) < 0.0;
        let ls = geo::LineString(coords);

        if is_exterior {
            if let Some(ext) = current_exterior.take() {
                polys.push(geo::Polygon::new(ext, std::mem::take(&mut current_holes)));
            }
            current_exterior = Some(ls);
        } else {
            current_holes.push(ls);
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(geo::Polygon::new(ext, current_holes));
    }

    geo::MultiPolygon(polys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::{Point, PolygonRing};

    #[test]
    fn exterior_and_hole_group_into_one_polygon() {
        // Outer ring CW (shapefile exterior), inner ring CCW (hole)
        let outer = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 0.0),
        ];
        let hole = vec![
            Point::new(1.0, 1.0),
            Point::new(3.0, 1.0),
            Point::new(3.0, 3.0),
            Point::new(1.0, 3.0),
            Point::new(1.0, 1.0),
        ];
        let p = shp::Polygon::with_rings(vec![PolygonRing::Outer(outer), PolygonRing::Inner(hole)]);

        let mp = rings_to_multipolygon(&p);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
    }

    #[test]
    fn open_rings_are_closed() {
        let outer = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 0.0),
        ];
        let p = shp::Polygon::with_rings(vec![PolygonRing::Outer(outer)]);
        let mp = rings_to_multipolygon(&p);
        let ring = &mp.0[0].exterior().0;
        assert_eq!(ring.first(), ring.last());
    }
}
