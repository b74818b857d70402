//! Geometric data structures and algorithms for spherical geometry
//!
//! This module contains all the geometric primitives used by the
//! reconstruction engine, including:
//! - Point representations on a sphere
//! - Finite rotations (unit quaternions with an axis hint)
//! - Multi-points, polylines and polygons
//! - Great circle arc intersection and proximity queries

pub mod point;
pub mod rotation;
pub mod polyline;
pub mod polygon;
pub mod geometry_on_sphere;

// Re-export core types from point module
pub use point::{
    PlateId,
    SphericalPoint,
    PointOnSphere,
    distance,
    slerp_points,
    generate_random_points,
};

pub use rotation::FiniteRotation;

pub use polyline::{
    MultiPointOnSphere,
    PolylineOnSphere,
    PolylineIntersection,
    arc_intersection,
    distance_to_arc,
    polyline_intersections,
};

pub use polygon::{PolygonOnSphere, ring_edges};

pub use geometry_on_sphere::GeometryOnSphere;
