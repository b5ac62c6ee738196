use geo::{Area, Centroid, ConvexHull, LineString, MultiPolygon, Polygon, Simplify, SimplifyVwPreserve};

use crate::geom::Geom;

/// Minimum coordinates for a closed ring (triangle plus closing point).
const MIN_RING_COORDS: usize = 4;

/// Simplify a multipolygon to a target tolerance in coordinate units.
///
/// With `preserve_topology` the Visvalingam-Whyatt variant runs with an
/// areal epsilon of tolerance squared, which never produces
/// self-intersections. Without it each ring gets plain Douglas-Peucker,
/// which is faster and matches the tolerance semantics exactly.
///
/// A shape that collapses entirely degrades to its convex hull, and a hull
/// with no area degrades to a centroid point, so every record keeps some
/// renderable geometry.
pub(crate) fn simplify(mp: &MultiPolygon<f64>, tolerance: f64, preserve_topology: bool) -> Geom {
    if tolerance <= 0.0 {
        return Geom::from_multipolygon(mp.clone());
    }

    let simplified = if preserve_topology {
        mp.simplify_vw_preserve(&(tolerance * tolerance))
    } else {
        simplify_rings(mp, tolerance)
    };

    let valid: Vec<Polygon<f64>> = simplified
        .0
        .into_iter()
        .filter(|p| p.exterior().0.len() >= MIN_RING_COORDS && p.unsigned_area() > 0.0)
        .collect();
    if !valid.is_empty() {
        return Geom::from_multipolygon(MultiPolygon(valid));
    }

    let hull = mp.convex_hull();
    if hull.unsigned_area() > 0.0 {
        return Geom::Polygon(hull);
    }
    match mp.centroid() {
        Some(center) => Geom::Point(center),
        None => Geom::from_multipolygon(mp.clone()),
    }
}

/// Douglas-Peucker on every ring independently.
fn simplify_rings(mp: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    MultiPolygon(
        mp.0.iter()
            .map(|poly| {
                let exterior = poly.exterior().simplify(&tolerance);
                let interiors: Vec<LineString<f64>> =
                    poly.interiors().iter().map(|ring| ring.simplify(&tolerance)).collect();
                Polygon::new(exterior, interiors)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Closed ring of `n` points around a circle of radius `r`.
    fn circle(n: usize, r: f64) -> MultiPolygon<f64> {
        let coords: Vec<(f64, f64)> = (0..=n)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * (i % n) as f64 / n as f64;
                (r * theta.cos(), r * theta.sin())
            })
            .collect();
        MultiPolygon(vec![Polygon::new(LineString::from(coords), vec![])])
    }

    #[test]
    fn dense_ring_drops_well_below_viewer_limits() {
        let dense = circle(10_000, 1.0);
        for preserve in [true, false] {
            let geom = simplify(&dense, 0.005, preserve);
            assert!(
                geom.vertex_count() < 1_000,
                "preserve={}: {} vertices left",
                preserve,
                geom.vertex_count(),
            );
            assert!(geom.vertex_count() >= MIN_RING_COORDS);
            assert!(matches!(geom, Geom::Polygon(_)));
        }
    }

    #[test]
    fn simplified_rings_keep_positive_area() {
        let dense = circle(10_000, 1.0);
        let geom = simplify(&dense, 0.005, true);
        match geom {
            Geom::Polygon(p) => assert!(p.unsigned_area() > 2.0), // circle area is pi
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn zero_tolerance_is_identity() {
        let dense = circle(64, 1.0);
        let geom = simplify(&dense, 0.0, true);
        assert_eq!(geom.vertex_count(), 65);
    }

    #[test]
    fn degenerate_shape_falls_back_to_point() {
        // Collinear ring: zero area, nothing survives simplification
        let flat = MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]),
            vec![],
        )]);
        let geom = simplify(&flat, 0.005, false);
        assert!(matches!(geom, Geom::Point(_)));
    }
}
