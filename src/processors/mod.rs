//! Per-feature processors run against a resolved reconstruction tree
//!
//! Each processor is a pure function of one feature and the tree (plus its own
//! settings), returning `None` when the feature yields nothing at that time.

pub mod reconstruct;
pub mod vgp;
pub mod raster;
pub mod scalar_coverage;
pub mod velocity;

pub use reconstruct::{is_active_at, reconstruct_feature, ReconstructedFeatureGeometry};
pub use vgp::{
    reconstruct_vgp,
    PoleError,
    ReconstructedVirtualGeomagneticPole,
    VgpRenderSettings,
    VgpVisibility,
    VirtualGeomagneticPole,
};
pub use raster::{PolygonRegion, ReconstructRasterPolygons, RotationGroup};
pub use scalar_coverage::{
    find_scalar_coverages,
    is_scalar_coverage_feature,
    reconstruct_scalar_coverages,
    ReconstructedScalarCoverage,
    ScalarCoverage,
    DOMAIN_RANGE_PROPERTIES,
};
pub use velocity::{calculate_velocity_field, plate_velocity, MultiPointVectorField, VelocityVector};
