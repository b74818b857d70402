//! Points on the unit sphere

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;

/// Identifier of a rigid tectonic plate
pub type PlateId = u32;

/// A point on the unit sphere in spherical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalPoint {
    /// Latitude in radians (-π/2 to π/2)
    pub lat: f64,
    /// Longitude in radians (-π to π)
    pub lon: f64,
}

impl SphericalPoint {
    /// Create a new spherical point from latitude and longitude in radians
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Create a new spherical point from latitude and longitude in degrees
    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self::new(lat.to_radians(), lon.to_radians())
    }

    /// Convert spherical coordinates to 3D Cartesian coordinates on unit sphere
    pub fn to_cartesian(&self) -> [f64; 3] {
        let x = self.lat.cos() * self.lon.cos();
        let y = self.lat.cos() * self.lon.sin();
        let z = self.lat.sin();
        [x, y, z]
    }

    /// Convert 3D Cartesian coordinates to spherical coordinates
    pub fn from_cartesian(cartesian: [f64; 3]) -> Self {
        let [x, y, z] = cartesian;
        let r = (x * x + y * y + z * z).sqrt();

        // Normalize to unit sphere
        let x = x / r;
        let y = y / r;
        let z = (z / r).clamp(-1.0, 1.0);

        let lat = z.asin();
        let lon = y.atan2(x);

        Self { lat, lon }
    }
}

/// A point on the unit sphere stored as a unit vector.
///
/// This is the representation every geometry and rotation works with;
/// [`SphericalPoint`] is only used at the lat/lon boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointOnSphere(DVec3);

impl PointOnSphere {
    /// Normalise `v` onto the sphere. Returns `None` for a (near) zero vector.
    pub fn new(v: DVec3) -> Option<Self> {
        v.try_normalize().map(Self)
    }

    /// Wrap a vector that is already unit length.
    pub(crate) fn from_unit_vector(v: DVec3) -> Self {
        debug_assert!((v.length() - 1.0).abs() < 1e-6, "not a unit vector: {v:?}");
        Self(v)
    }

    /// The unit vector for a latitude/longitude in radians
    pub fn from_spherical(point: SphericalPoint) -> Self {
        Self(DVec3::from_array(point.to_cartesian()))
    }

    /// The unit vector for a latitude/longitude in degrees
    pub fn from_lat_lon_degrees(lat: f64, lon: f64) -> Self {
        Self::from_spherical(SphericalPoint::from_degrees(lat, lon))
    }

    /// The point at latitude 90
    pub fn north_pole() -> Self {
        Self(DVec3::Z)
    }

    /// The point at latitude -90
    pub fn south_pole() -> Self {
        Self(DVec3::NEG_Z)
    }

    /// The unit position vector
    pub fn position(&self) -> DVec3 {
        self.0
    }

    /// Latitude and longitude in radians
    pub fn to_spherical(&self) -> SphericalPoint {
        SphericalPoint::from_cartesian(self.0.to_array())
    }

    /// Latitude and longitude in degrees
    pub fn to_lat_lon_degrees(&self) -> (f64, f64) {
        let p = self.to_spherical();
        (p.lat.to_degrees(), p.lon.to_degrees())
    }

    /// Cosine of the angle between two points
    pub fn dot(&self, other: &PointOnSphere) -> f64 {
        self.0.dot(other.0)
    }

    /// The diametrically opposite point
    pub fn antipode(&self) -> Self {
        Self(-self.0)
    }

    /// True if the two points are within `tolerance` radians of each other.
    pub fn is_close_to(&self, other: &PointOnSphere, tolerance: f64) -> bool {
        distance(*self, *other) <= tolerance
    }
}

/// Calculate the great circle distance between two points on the unit sphere
pub fn distance(a: PointOnSphere, b: PointOnSphere) -> f64 {
    // atan2 of |a×b| and a·b stays accurate for both tiny and near-antipodal angles
    let cross = a.0.cross(b.0).length();
    let dot = a.0.dot(b.0);
    cross.atan2(dot)
}

/// The point a fraction `t` of the way along the great circle arc from `a` to `b`.
///
/// Falls back to `a` when the endpoints coincide; antipodal endpoints have no
/// unique arc and also return `a`.
pub fn slerp_points(a: PointOnSphere, b: PointOnSphere, t: f64) -> PointOnSphere {
    let angle = distance(a, b);
    let sin_angle = angle.sin();
    if sin_angle < EPSILON {
        return a;
    }
    let wa = ((1.0 - t) * angle).sin() / sin_angle;
    let wb = (t * angle).sin() / sin_angle;
    PointOnSphere::new(a.0 * wa + b.0 * wb).unwrap_or(a)
}

/// Generate random points on the unit sphere
/// Uses a uniform distribution over the sphere surface
pub fn generate_random_points(num_points: usize, seed: u64) -> Vec<PointOnSphere> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(num_points);

    while points.len() < num_points {
        // Rejection sample the unit ball, then project onto the sphere
        let x: f64 = rng.gen_range(-1.0..1.0);
        let y: f64 = rng.gen_range(-1.0..1.0);
        let z: f64 = rng.gen_range(-1.0..1.0);
        let v = DVec3::new(x, y, z);
        let r2 = v.length_squared();
        if r2 > 1e-6 && r2 <= 1.0 {
            points.push(PointOnSphere(v / r2.sqrt()));
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn spherical_to_cartesian_round_trip() {
        let original = SphericalPoint::new(0.5, 1.0);
        let converted = PointOnSphere::from_spherical(original).to_spherical();

        assert!((original.lat - converted.lat).abs() < 1e-10);
        assert!((original.lon - converted.lon).abs() < 1e-10);
    }

    #[test]
    fn zero_vector_is_not_a_point() {
        assert!(PointOnSphere::new(DVec3::ZERO).is_none());
        let p = PointOnSphere::new(DVec3::new(0.0, 0.0, 3.0)).unwrap();
        assert_eq!(p, PointOnSphere::north_pole());
    }

    #[test]
    fn distance_is_symmetric() {
        let a = PointOnSphere::from_lat_lon_degrees(30.0, 60.0);
        let b = PointOnSphere::from_lat_lon_degrees(-20.0, 110.0);

        assert!((distance(a, b) - distance(b, a)).abs() < 1e-15);
    }

    #[test]
    fn distance_to_self_is_zero() {
        let point = PointOnSphere::from_lat_lon_degrees(12.0, -45.0);
        assert!(distance(point, point).abs() < 1e-15);
    }

    #[test]
    fn distance_between_antipodal_points_is_pi() {
        let a = PointOnSphere::from_lat_lon_degrees(0.0, 0.0);
        let b = PointOnSphere::from_lat_lon_degrees(0.0, 180.0);

        assert!((distance(a, b) - PI).abs() < 1e-10);
    }

    #[test]
    fn slerp_midpoint_is_equidistant() {
        let a = PointOnSphere::from_lat_lon_degrees(0.0, 0.0);
        let b = PointOnSphere::from_lat_lon_degrees(0.0, 90.0);
        let mid = slerp_points(a, b, 0.5);

        assert!((distance(a, mid) - distance(mid, b)).abs() < 1e-12);
        let (lat, lon) = mid.to_lat_lon_degrees();
        assert!(lat.abs() < 1e-10);
        assert!((lon - 45.0).abs() < 1e-10);
    }

    #[test]
    fn generate_random_points_is_deterministic_and_unit_length() {
        let first = generate_random_points(50, 123);
        let second = generate_random_points(50, 123);

        assert_eq!(first.len(), 50);
        assert_eq!(first, second);
        for p in &first {
            assert!((p.position().length() - 1.0).abs() < 1e-12);
        }
        assert_ne!(first, generate_random_points(50, 456));
    }
}
