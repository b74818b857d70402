//! Polygons on the unit sphere

use serde::{Deserialize, Serialize};

use super::point::PointOnSphere;
use super::polyline::{distance_to_arc, PolylineOnSphere};
use super::rotation::FiniteRotation;

/// A polygon: one exterior ring plus zero or more interior rings (holes).
///
/// Rings are stored without repeating the first vertex at the end; the closing
/// arc from the last vertex back to the first is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonOnSphere {
    pub exterior: Vec<PointOnSphere>,
    pub interiors: Vec<Vec<PointOnSphere>>,
}

impl PolygonOnSphere {
    /// A polygon without holes
    pub fn new(exterior: Vec<PointOnSphere>) -> Self {
        Self { exterior, interiors: Vec::new() }
    }

    /// A polygon with holes
    pub fn with_interiors(
        exterior: Vec<PointOnSphere>,
        interiors: Vec<Vec<PointOnSphere>>,
    ) -> Self {
        Self { exterior, interiors }
    }

    /// Total vertex count over all rings
    pub fn vertex_count(&self) -> usize {
        self.exterior.len() + self.interiors.iter().map(Vec::len).sum::<usize>()
    }

    /// Rotate every ring; ring count and per-ring vertex counts are unchanged
    pub fn rotated(&self, rotation: &FiniteRotation) -> Self {
        let rotate_ring = |ring: &[PointOnSphere]| -> Vec<PointOnSphere> {
            ring.iter().map(|p| rotation.rotate_point(p)).collect()
        };
        Self {
            exterior: rotate_ring(&self.exterior),
            interiors: self.interiors.iter().map(|ring| rotate_ring(ring)).collect(),
        }
    }

    /// The exterior ring as a closed polyline (first vertex repeated at the end)
    pub fn exterior_as_polyline(&self) -> PolylineOnSphere {
        let mut vertices = self.exterior.clone();
        if let Some(first) = self.exterior.first() {
            vertices.push(*first);
        }
        PolylineOnSphere::new(vertices)
    }

    /// Minimum angular distance from `point` to any ring edge
    pub fn distance_to_boundary(&self, point: &PointOnSphere) -> f64 {
        std::iter::once(&self.exterior)
            .chain(self.interiors.iter())
            .map(|ring| ring_distance(ring, point))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Iterate the edges of a closed ring, including the closing edge
pub fn ring_edges(
    ring: &[PointOnSphere],
) -> impl Iterator<Item = (PointOnSphere, PointOnSphere)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

fn ring_distance(ring: &[PointOnSphere], point: &PointOnSphere) -> f64 {
    ring_edges(ring)
        .map(|(a, b)| distance_to_arc(point, &a, &b))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::distance;

    fn square() -> PolygonOnSphere {
        PolygonOnSphere::with_interiors(
            vec![
                PointOnSphere::from_lat_lon_degrees(-10.0, -10.0),
                PointOnSphere::from_lat_lon_degrees(-10.0, 10.0),
                PointOnSphere::from_lat_lon_degrees(10.0, 10.0),
                PointOnSphere::from_lat_lon_degrees(10.0, -10.0),
            ],
            vec![vec![
                PointOnSphere::from_lat_lon_degrees(-1.0, -1.0),
                PointOnSphere::from_lat_lon_degrees(-1.0, 1.0),
                PointOnSphere::from_lat_lon_degrees(1.0, 0.0),
            ]],
        )
    }

    #[test]
    fn rotation_preserves_ring_structure() {
        let polygon = square();
        let rotation = FiniteRotation::from_euler_pole_degrees(40.0, 70.0, 33.0);
        let rotated = polygon.rotated(&rotation);

        assert_eq!(rotated.exterior.len(), 4);
        assert_eq!(rotated.interiors.len(), 1);
        assert_eq!(rotated.interiors[0].len(), 3);
        assert_eq!(rotated.vertex_count(), polygon.vertex_count());
        for (a, b) in ring_edges(&polygon.exterior).zip(ring_edges(&rotated.exterior)) {
            assert!((distance(a.0, a.1) - distance(b.0, b.1)).abs() < 1e-12);
        }
    }

    #[test]
    fn closed_exterior_polyline_repeats_first_vertex() {
        let polyline = square().exterior_as_polyline();
        assert_eq!(polyline.len(), 5);
        assert_eq!(polyline.first(), polyline.last());
    }

    #[test]
    fn boundary_distance_considers_holes() {
        let polygon = square();
        let centre = PointOnSphere::from_lat_lon_degrees(0.0, 0.0);
        assert!(polygon.distance_to_boundary(&centre) < 1.5f64.to_radians());
    }
}
