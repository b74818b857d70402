//! Constants used throughout the reconstruction engine

/// Epsilon value for floating point comparisons
pub const EPSILON: f64 = 1e-9;

/// Tolerance (in Ma) under which two geological times are considered coincident
pub const GEO_TIME_EPSILON: f64 = 1e-6;

/// Angular tolerance (radians) for treating two points as the same vertex
/// (vertices within this distance are considered the same)
pub const DEDUPLICATION_EPSILON: f64 = EPSILON * 10000.0;

/// Angular tolerance (radians) under which a point is considered to lie on a
/// polygon boundary
pub const ON_BOUNDARY_EPSILON: f64 = 1e-7;

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Plate id conventionally used for the anchor (fixed) reference frame
pub const DEFAULT_ANCHOR_PLATE_ID: u32 = 0;

/// Default time increment (Ma) used when differencing rotations for velocities
pub const DEFAULT_VELOCITY_DELTA_TIME: f64 = 1.0;
