//! Geometry normalizer — picks one representative coordinate per feature
//! while keeping the original shape intact.

use crate::model::Geometry;

/// Representative coordinate extraction, per shape:
///
/// - point: used directly
/// - polygon: arithmetic mean of the first ring's vertices (a centroid
///   approximation, not area-weighted)
/// - polyline: midpoint vertex of the first non-empty path, falling back
///   to the first then last vertex when the midpoint entry is unusable
///
/// Returns `None` for shapes with no usable vertex; callers count the
/// feature as skipped.
pub fn representative_point(geometry: &Geometry) -> Option<(f64, f64)> {
    match geometry {
        Geometry::Point { x, y } => Some((*x, *y)),

        Geometry::Polygon { rings } => {
            let ring = rings.first()?;
            if ring.is_empty() {
                return None;
            }
            let (sx, sy) = ring
                .iter()
                .fold((0.0, 0.0), |(ax, ay), [x, y]| (ax + x, ay + y));
            let n = ring.len() as f64;
            Some((sx / n, sy / n))
        }

        Geometry::Polyline { paths } => {
            let path = paths.iter().find(|p| !p.is_empty())?;
            let candidates = [
                path.get(path.len() / 2),
                path.first(),
                path.last(),
            ];
            candidates
                .into_iter()
                .flatten()
                .find(|[x, y]| x.is_finite() && y.is_finite())
                .map(|[x, y]| (*x, *y))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_direct() {
        let g = Geometry::Point { x: 54.3, y: 24.4 };
        assert_eq!(representative_point(&g), Some((54.3, 24.4)));
    }

    #[test]
    fn test_polygon_first_ring_mean() {
        let g = Geometry::Polygon {
            rings: vec![
                vec![[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 2.0]],
                // Hole ring, ignored by the representative point.
                vec![[1.0, 1.0], [2.0, 1.0], [2.0, 1.5]],
            ],
        };
        assert_eq!(representative_point(&g), Some((2.0, 1.0)));
    }

    #[test]
    fn test_polyline_midpoint() {
        let g = Geometry::Polyline {
            paths: vec![vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]],
        };
        assert_eq!(representative_point(&g), Some((1.0, 1.0)));
    }

    #[test]
    fn test_polyline_skips_empty_path() {
        let g = Geometry::Polyline {
            paths: vec![vec![], vec![[5.0, 6.0]]],
        };
        assert_eq!(representative_point(&g), Some((5.0, 6.0)));
    }

    #[test]
    fn test_polyline_malformed_midpoint_falls_back() {
        let g = Geometry::Polyline {
            paths: vec![vec![[3.0, 4.0], [f64::NAN, f64::NAN], [7.0, 8.0]]],
        };
        assert_eq!(representative_point(&g), Some((3.0, 4.0)));
    }

    #[test]
    fn test_empty_shapes_skip() {
        assert_eq!(representative_point(&Geometry::Polygon { rings: vec![] }), None);
        assert_eq!(representative_point(&Geometry::Polygon { rings: vec![vec![]] }), None);
        assert_eq!(representative_point(&Geometry::Polyline { paths: vec![] }), None);
        assert_eq!(representative_point(&Geometry::Polyline { paths: vec![vec![]] }), None);
    }
}
