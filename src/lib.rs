//! # Plate Reconstruction - Plate Motion on the Sphere
//!
//! A reconstruction engine for plate-tectonic models. Given features describing
//! relative plate rotations through geological time, this library provides:
//!
//! - **Rotation graphs** built from total reconstruction sequences
//! - **Reconstruction trees** giving every plate's absolute rotation at any time
//! - **Reconstructed geometries** (points, multi-points, polylines, polygons)
//! - **Paleomagnetic poles**, raster polygon masks, scalar coverages and velocities
//! - **Topological plate boundaries** assembled from other features' geometry
//!
//! ## Features
//!
//! - 🌍 **Spherical geometry**: All calculations work on a unit sphere
//! - 🔄 **Finite rotations**: Quaternion composition and interpolation with axis hints
//! - 🧭 **Any anchor**: Rotation edges are walked in reverse when needed
//! - 🧩 **Topologies**: Sections are intersected and trimmed into closed rings
//! - 🎯 **Queries**: Point-in-polygon with pole enclosure, hit-testing
//! - ⚡ **Parallel**: Optional rayon-backed per-feature pass (`--features parallel`)
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! plate-reconstruction = "0.1"
//! ```
//!
//! ## Basic Usage
//!
//! ```rust
//! use plate_reconstruction::{
//!     names, Feature, FeatureStore, FeatureType, FiniteRotation, IrregularSampling, PointOnSphere,
//!     PropertyValue, ReconstructionConfig, Reconstructor, TimeSample,
//! };
//!
//! let mut store = FeatureStore::new();
//!
//! // Plate 801 turns 50 degrees about the north pole over 100 Myr
//! let pole = |time: f64, angle: f64| {
//!     let rotation = FiniteRotation::from_euler_pole_degrees(90.0, 0.0, angle);
//!     TimeSample::new(PropertyValue::FiniteRotation(rotation), time)
//! };
//! store.insert(
//!     Feature::new("rot-801", FeatureType::TOTAL_RECONSTRUCTION_SEQUENCE)
//!         .with_property(names::FIXED_REFERENCE_FRAME, PropertyValue::PlateId(0))
//!         .with_property(names::MOVING_REFERENCE_FRAME, PropertyValue::PlateId(801))
//!         .with_property(
//!             names::TOTAL_RECONSTRUCTION_POLE,
//!             PropertyValue::IrregularSampling(IrregularSampling::new(vec![
//!                 pole(0.0, 0.0),
//!                 pole(100.0, 50.0),
//!             ])),
//!         ),
//! ).unwrap();
//!
//! let site = store.insert(
//!     Feature::new("site", "gpml:UnclassifiedFeature")
//!         .with_property(names::RECONSTRUCTION_PLATE_ID, PropertyValue::PlateId(801))
//!         .with_property(
//!             names::POSITION,
//!             PropertyValue::Geometry(PointOnSphere::from_lat_lon_degrees(0.0, 0.0).into()),
//!         ),
//! ).unwrap();
//!
//! let mut reconstructor = Reconstructor::new(&store, ReconstructionConfig::new()).unwrap();
//! let reconstruction = reconstructor.reconstruct(&store, 20.0).unwrap();
//!
//! for rfg in reconstruction.feature_geometries_for(site) {
//!     let (lat, lon) = rfg.geometry.vertices()[0].to_lat_lon_degrees();
//!     println!("{} at 20 Ma: ({lat:.2}, {lon:.2})", rfg.feature_id);
//! }
//! ```
//!
//! ## Advanced Configuration
//!
//! ```rust
//! use plate_reconstruction::{
//!     EdgeTieBreak, ReconstructionConfig, VgpRenderSettings, VgpVisibility,
//! };
//!
//! // Reconstruct relative to Africa, preferring the lowest fixed plate on ties
//! let config = ReconstructionConfig::new()
//!     .with_anchor_plate_id(701)
//!     .with_edge_tie_break(EdgeTieBreak::LowestFixedPlateId)
//!     .with_vgp_settings(
//!         VgpRenderSettings::default().with_visibility(VgpVisibility::AlwaysVisible),
//!     )
//!     .with_velocities(true);
//! ```
//!
//! ## Modules
//!
//! - [`geometry`]: Points, polylines, polygons and finite rotations on the unit sphere
//! - [`time`]: Geological time instants and periods
//! - [`feature`]: Feature property model and the feature store
//! - [`graph`]: Rotation graph construction from sequence features
//! - [`tree`]: Absolute rotations resolved for one time and anchor
//! - [`processors`]: Per-feature reconstruction (geometry, VGPs, rasters, coverages, velocities)
//! - [`topology`]: Topological plate boundaries and point-in-polygon queries
//! - [`reconstruction`]: The per-time-step driver and its outputs
//! - [`config`]: Reconstruction settings
//! - [`constants`]: Tolerances and physical constants
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - `reconstruct_timeline.rs` - Reconstructs a small plate model through time

pub mod constants;
pub mod error;
pub mod time;
pub mod geometry;
pub mod feature;
pub mod graph;
pub mod tree;
pub mod processors;
pub mod topology;
pub mod reconstruction;
pub mod config;

// Re-export core types for convenience
pub use constants::*;
pub use error::{ReconstructionError, Result};
pub use time::*;
pub use geometry::*;
pub use feature::*;
pub use graph::*;
pub use tree::*;
pub use processors::*;
pub use topology::*;
pub use reconstruction::*;
pub use config::*;
