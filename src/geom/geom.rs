/// Geometry emitted by simplification.
///
/// Point is the last-resort representation for a shape that collapsed under
/// the simplification tolerance; encoders render it as a marker rather than
/// dropping the record.
#[derive(Debug, Clone)]
pub enum Geom {
    Polygon(geo::Polygon<f64>),
    MultiPolygon(geo::MultiPolygon<f64>),
    Point(geo::Point<f64>),
}

impl Geom {
    /// Wrap a multipolygon, collapsing a single-member one to Polygon.
    pub fn from_multipolygon(mut mp: geo::MultiPolygon<f64>) -> Self {
        if mp.0.len() == 1 {
            return Geom::Polygon(mp.0.remove(0));
        }
        Geom::MultiPolygon(mp)
    }

    /// Total coordinate count across all rings.
    pub fn vertex_count(&self) -> usize {
        match self {
            Geom::Polygon(p) => polygon_vertices(p),
            Geom::MultiPolygon(mp) => mp.0.iter().map(polygon_vertices).sum(),
            Geom::Point(_) => 1,
        }
    }

    /// View as a slice of polygons; empty for a point.
    pub(crate) fn polygons(&self) -> &[geo::Polygon<f64>] {
        match self {
            Geom::Polygon(p) => std::slice::from_ref(p),
            Geom::MultiPolygon(mp) => &mp.0,
            Geom::Point(_) => &[],
        }
    }
}

fn polygon_vertices(p: &geo::Polygon<f64>) -> usize {
    p.exterior().0.len() + p.interiors().iter().map(|ring| ring.0.len()).sum::<usize>()
}

/// Total coordinate count of a raw multipolygon, holes included.
pub(crate) fn count_vertices(mp: &geo::MultiPolygon<f64>) -> usize {
    mp.0.iter().map(polygon_vertices).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> geo::Polygon<f64> {
        geo::Polygon::new(
            geo::LineString::from(vec![(0.0, 0.0), (size, 0.0), (size, size), (0.0, size), (0.0, 0.0)]),
            vec![],
        )
    }

    #[test]
    fn single_member_collapses_to_polygon() {
        let geom = Geom::from_multipolygon(geo::MultiPolygon(vec![square(1.0)]));
        assert!(matches!(geom, Geom::Polygon(_)));
        assert_eq!(geom.vertex_count(), 5);
    }

    #[test]
    fn vertex_count_includes_holes() {
        let with_hole = geo::Polygon::new(
            square(4.0).exterior().clone(),
            vec![geo::LineString::from(vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)])],
        );
        let mp = geo::MultiPolygon(vec![with_hole, square(1.0)]);
        assert_eq!(count_vertices(&mp), 15);
        assert_eq!(Geom::from_multipolygon(mp).vertex_count(), 15);
    }
}
