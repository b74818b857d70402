//! Resolved plate polygons and point-in-polygon queries

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::DVec3;
use serde::Serialize;

use crate::constants::ON_BOUNDARY_EPSILON;
use crate::feature::{FeatureHandle, FeatureId};
use crate::geometry::{
    distance_to_arc, ring_edges, PlateId, PointOnSphere, PolygonOnSphere, PolylineOnSphere,
};
use crate::time::GeoTimeInstant;

/// Result of [`PlatePolygon::is_point_in_on_out`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum PointInPolygon {
    Outside = 0,
    Inside = 1,
    OnBoundary = 2,
}

/// The vertices one topological section contributed to a boundary ring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubSegment {
    pub feature_handle: FeatureHandle,
    pub feature_id: FeatureId,
    /// First ring vertex index taken from this section
    pub start: usize,
    /// Number of ring vertices taken from this section
    pub count: usize,
    /// The trimmed section geometry, in ring order
    pub geometry: PolylineOnSphere,
    pub reversed: bool,
}

impl SubSegment {
    /// Indices of this segment's vertices in the ring
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.count
    }
}

/// A closed boundary assembled from the reconstructed geometry of other features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatePolygon {
    pub feature_handle: FeatureHandle,
    pub feature_id: FeatureId,
    pub plate_id: Option<PlateId>,
    pub reconstruction_time: GeoTimeInstant,
    /// Ring vertices; the closing arc back to the first vertex is implicit
    pub vertices: Vec<PointOnSphere>,
    pub sub_segments: Vec<SubSegment>,
    /// 0 when no pole is enclosed, +1 for the north pole, -1 for the south pole
    pub d_pole: i8,
    errors: Vec<String>,
}

impl PlatePolygon {
    pub(crate) fn new(
        feature_handle: FeatureHandle,
        feature_id: FeatureId,
        plate_id: Option<PlateId>,
        reconstruction_time: GeoTimeInstant,
        vertices: Vec<PointOnSphere>,
        sub_segments: Vec<SubSegment>,
        errors: Vec<String>,
    ) -> Self {
        let d_pole = enclosed_pole(&vertices);
        Self {
            feature_handle,
            feature_id,
            plate_id,
            reconstruction_time,
            vertices,
            sub_segments,
            d_pole,
            errors,
        }
    }

    /// Problems met while resolving; empty for a clean resolution
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// True if anything went wrong while resolving
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The ring as a plain polygon
    pub fn as_polygon(&self) -> PolygonOnSphere {
        PolygonOnSphere::new(self.vertices.clone())
    }

    /// Classify `point` against the ring.
    ///
    /// Counts crossings of a meridian ray cast toward a pole. Rings around the
    /// north pole cast toward it and treat an even count as inside, rings
    /// around the south pole do the same toward the south pole.
    pub fn is_point_in_on_out(&self, point: &PointOnSphere) -> PointInPolygon {
        point_in_ring(&self.vertices, self.d_pole, point)
    }
}

/// Which pole (if any) a ring encloses.
///
/// A ring that sweeps a full turn of longitude encloses a pole; the pole on the
/// side of the ring's mean latitude is taken, so the enclosed area is the
/// smaller cap.
pub fn enclosed_pole(ring: &[PointOnSphere]) -> i8 {
    if ring.len() < 3 {
        return 0;
    }

    let swept: f64 = ring_edges(ring)
        .map(|(a, b)| wrap_longitude(a.to_spherical().lon, b.to_spherical().lon))
        .sum();
    if swept.abs() < PI {
        return 0;
    }

    let mean_lat = ring.iter().map(|p| p.to_spherical().lat).sum::<f64>() / ring.len() as f64;
    if mean_lat >= 0.0 {
        1
    } else {
        -1
    }
}

/// Longitude change from `from` to `to` wrapped into `(-π, π]`
fn wrap_longitude(from: f64, to: f64) -> f64 {
    let mut delta = (to - from) % TAU;
    if delta > PI {
        delta -= TAU;
    } else if delta <= -PI {
        delta += TAU;
    }
    delta
}

pub(crate) fn point_in_ring(
    ring: &[PointOnSphere],
    d_pole: i8,
    point: &PointOnSphere,
) -> PointInPolygon {
    if ring.len() < 3 {
        return PointInPolygon::Outside;
    }
    if ring_edges(ring).any(|(a, b)| distance_to_arc(point, &a, &b) < ON_BOUNDARY_EPSILON) {
        return PointInPolygon::OnBoundary;
    }

    let spherical = point.to_spherical();
    if FRAC_PI_2 - spherical.lat.abs() < ON_BOUNDARY_EPSILON {
        // The meridian is undefined at a pole
        let pole = if spherical.lat > 0.0 { 1 } else { -1 };
        return if d_pole == pole { PointInPolygon::Inside } else { PointInPolygon::Outside };
    }

    let toward_north = d_pole >= 0;
    let crossings = ring_edges(ring)
        .filter_map(|(a, b)| meridian_crossing_latitude(&a, &b, spherical.lon))
        .filter(|&lat| if toward_north { lat > spherical.lat } else { lat < spherical.lat })
        .count();

    let inside = if d_pole == 0 { crossings % 2 == 1 } else { crossings % 2 == 0 };
    if inside {
        PointInPolygon::Inside
    } else {
        PointInPolygon::Outside
    }
}

/// Latitude at which the arc `a`→`b` crosses the half meridian at `lon`
fn meridian_crossing_latitude(a: &PointOnSphere, b: &PointOnSphere, lon: f64) -> Option<f64> {
    let (sin_lon, cos_lon) = lon.sin_cos();
    let meridian_normal = DVec3::new(-sin_lon, cos_lon, 0.0);

    let side_a = a.position().dot(meridian_normal);
    let side_b = b.position().dot(meridian_normal);
    // Half-open rule so a vertex on the meridian is counted once
    if (side_a > 0.0) == (side_b > 0.0) {
        return None;
    }

    let crossing = (a.position() * side_b.abs() + b.position() * side_a.abs()).try_normalize()?;
    if crossing.dot(DVec3::new(cos_lon, sin_lon, 0.0)) <= 0.0 {
        // Crosses the opposite half of the great circle
        return None;
    }
    Some(crossing.z.clamp(-1.0, 1.0).asin())
}
