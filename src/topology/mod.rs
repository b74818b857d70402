//! Topological plate boundaries
//!
//! A topological feature describes its boundary as an ordered ring of
//! sections, each referring to another feature whose reconstructed geometry
//! supplies part of the boundary. Resolution happens after the referenced
//! features are reconstructed for the same time step.

pub mod plate_polygon;
pub mod resolver;
pub mod section;

pub use plate_polygon::{enclosed_pole, PlatePolygon, PointInPolygon, SubSegment};
pub use resolver::{resolve_topological_boundary, SectionGeometry, SectionLookup};
pub use section::{trim_section, SectionRelation, TrimmedSection};

/// A resolved boundary as stored in a reconstruction
pub type ResolvedTopologicalBoundary = PlatePolygon;

/// A sub-segment of a resolved boundary
pub type ResolvedTopologicalBoundarySubSegment = SubSegment;
