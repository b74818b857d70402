//! The closed family of geometries a feature can carry

use serde::{Deserialize, Serialize};

use super::point::{distance, PointOnSphere};
use super::polygon::PolygonOnSphere;
use super::polyline::{MultiPointOnSphere, PolylineOnSphere};
use super::rotation::FiniteRotation;

/// Any geometry on the unit sphere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryOnSphere {
    Point(PointOnSphere),
    MultiPoint(MultiPointOnSphere),
    Polyline(PolylineOnSphere),
    Polygon(PolygonOnSphere),
}

impl GeometryOnSphere {
    /// Rotate rigidly; the kind of geometry and its vertex layout are preserved
    pub fn rotated(&self, rotation: &FiniteRotation) -> GeometryOnSphere {
        match self {
            GeometryOnSphere::Point(p) => GeometryOnSphere::Point(rotation.rotate_point(p)),
            GeometryOnSphere::MultiPoint(m) => GeometryOnSphere::MultiPoint(m.rotated(rotation)),
            GeometryOnSphere::Polyline(l) => GeometryOnSphere::Polyline(l.rotated(rotation)),
            GeometryOnSphere::Polygon(p) => GeometryOnSphere::Polygon(p.rotated(rotation)),
        }
    }

    /// Short name of the geometry variant
    pub fn kind(&self) -> &'static str {
        match self {
            GeometryOnSphere::Point(_) => "point",
            GeometryOnSphere::MultiPoint(_) => "multi-point",
            GeometryOnSphere::Polyline(_) => "polyline",
            GeometryOnSphere::Polygon(_) => "polygon",
        }
    }

    /// Number of vertices (all rings for polygons)
    pub fn vertex_count(&self) -> usize {
        match self {
            GeometryOnSphere::Point(_) => 1,
            GeometryOnSphere::MultiPoint(m) => m.len(),
            GeometryOnSphere::Polyline(l) => l.len(),
            GeometryOnSphere::Polygon(p) => p.vertex_count(),
        }
    }

    /// Every vertex, in storage order
    pub fn vertices(&self) -> Vec<PointOnSphere> {
        match self {
            GeometryOnSphere::Point(p) => vec![*p],
            GeometryOnSphere::MultiPoint(m) => m.points.clone(),
            GeometryOnSphere::Polyline(l) => l.vertices.clone(),
            GeometryOnSphere::Polygon(p) => {
                let mut all = p.exterior.clone();
                for ring in &p.interiors {
                    all.extend_from_slice(ring);
                }
                all
            }
        }
    }

    /// The geometry viewed as a polyline, as used for topological sections.
    ///
    /// Points become single-vertex lines; polygons contribute their closed exterior.
    pub fn as_polyline(&self) -> PolylineOnSphere {
        match self {
            GeometryOnSphere::Point(p) => PolylineOnSphere::new(vec![*p]),
            GeometryOnSphere::MultiPoint(m) => PolylineOnSphere::new(m.points.clone()),
            GeometryOnSphere::Polyline(l) => l.clone(),
            GeometryOnSphere::Polygon(p) => p.exterior_as_polyline(),
        }
    }

    /// Angular distance (radians) from `point` to the nearest part of the geometry.
    ///
    /// Polygon interiors count as distance zero only on the boundary; this is a
    /// proximity measure for hit-testing, not a containment test.
    pub fn distance_to(&self, point: &PointOnSphere) -> f64 {
        match self {
            GeometryOnSphere::Point(p) => distance(*p, *point),
            GeometryOnSphere::MultiPoint(m) => m
                .points
                .iter()
                .map(|p| distance(*p, *point))
                .fold(f64::INFINITY, f64::min),
            GeometryOnSphere::Polyline(l) => l.distance_to(point),
            GeometryOnSphere::Polygon(p) => p.distance_to_boundary(point),
        }
    }

    /// Hit test: `Some(closeness)` in `[0, 1]` (1 = exact hit) when `point` is
    /// within `tolerance` radians of the geometry.
    pub fn test_proximity(&self, point: &PointOnSphere, tolerance: f64) -> Option<f64> {
        let d = self.distance_to(point);
        if d > tolerance {
            return None;
        }
        if tolerance <= 0.0 {
            return Some(1.0);
        }
        Some(1.0 - d / tolerance)
    }
}

impl FiniteRotation {
    /// Rotate any geometry, keeping its variant
    pub fn rotate_geometry(&self, geometry: &GeometryOnSphere) -> GeometryOnSphere {
        geometry.rotated(self)
    }
}

impl From<PointOnSphere> for GeometryOnSphere {
    fn from(p: PointOnSphere) -> Self {
        GeometryOnSphere::Point(p)
    }
}

impl From<PolylineOnSphere> for GeometryOnSphere {
    fn from(l: PolylineOnSphere) -> Self {
        GeometryOnSphere::Polyline(l)
    }
}

impl From<PolygonOnSphere> for GeometryOnSphere {
    fn from(p: PolygonOnSphere) -> Self {
        GeometryOnSphere::Polygon(p)
    }
}

impl From<MultiPointOnSphere> for GeometryOnSphere {
    fn from(m: MultiPointOnSphere) -> Self {
        GeometryOnSphere::MultiPoint(m)
    }
}
