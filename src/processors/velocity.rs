//! Plate velocities at mesh points
//!
//! Velocities are finite differences of plate rotations: a point at its
//! position for time `t` is carried back to `t + dt` with the plate's stage
//! rotation, and the displacement divided by `dt` gives the velocity.

use glam::DVec3;
use serde::Serialize;

use crate::constants::EARTH_RADIUS_KM;
use crate::feature::finder::{geometry_properties, reconstruction_plate_id};
use crate::feature::{names, Feature, FeatureHandle, FeatureId, FeatureType};
use crate::geometry::{FiniteRotation, GeometryOnSphere, MultiPointOnSphere, PlateId, PointOnSphere};
use crate::time::GeoTimeInstant;
use crate::topology::{PlatePolygon, PointInPolygon};
use crate::tree::ReconstructionTree;

/// Centimetres per kilometre over years per million years
const KM_PER_MYR_TO_CM_PER_YR: f64 = 1e5 / 1e6;

/// Velocity of a point in cm/yr as a cartesian vector tangent to the sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VelocityVector {
    pub velocity: DVec3,
}

impl VelocityVector {
    /// Speed in cm/yr
    pub fn magnitude(&self) -> f64 {
        self.velocity.length()
    }

    /// (north, east) components at `point`
    pub fn north_east(&self, point: &PointOnSphere) -> (f64, f64) {
        let p = point.position();
        let Some(east) = DVec3::Z.cross(p).try_normalize() else {
            // No east at the poles
            return (0.0, 0.0);
        };
        let north = p.cross(east);
        (self.velocity.dot(north), self.velocity.dot(east))
    }
}

/// Velocities of one mesh feature's points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiPointVectorField {
    pub feature_handle: FeatureHandle,
    pub feature_id: FeatureId,
    pub reconstruction_time: GeoTimeInstant,
    pub domain: MultiPointOnSphere,
    /// Plate each point was assigned to
    pub plate_ids: Vec<Option<PlateId>>,
    /// `None` for points without a plate rotation at both times
    pub vectors: Vec<Option<VelocityVector>>,
}

impl MultiPointVectorField {
    /// Number of domain points
    pub fn len(&self) -> usize {
        self.domain.len()
    }

    /// True if the domain has no points
    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }
}

/// Velocity of `point` (at its position for `tree`'s time) on `plate_id`,
/// using `older_tree` resolved `delta_time` Ma earlier
pub fn plate_velocity(
    point: &PointOnSphere,
    plate_id: PlateId,
    tree: &ReconstructionTree,
    older_tree: &ReconstructionTree,
    delta_time: f64,
) -> Option<VelocityVector> {
    let current = tree.absolute_rotation(plate_id)?;
    let older = older_tree.absolute_rotation(plate_id)?;

    let stage = FiniteRotation::compose(older, &current.inverse());
    let displacement = point.position() - stage.rotate_point(point).position();
    let scale = EARTH_RADIUS_KM * KM_PER_MYR_TO_CM_PER_YR / delta_time;
    Some(VelocityVector { velocity: displacement * scale })
}

fn mesh_domain(feature: &Feature, time: &GeoTimeInstant) -> Option<MultiPointOnSphere> {
    let geometries = geometry_properties(feature, Some(time));
    let from_mesh_points = geometries.iter().find_map(|(name, geometry)| match geometry {
        GeometryOnSphere::MultiPoint(points) if name.as_str() == names::MESH_POINTS => {
            Some(points.clone())
        }
        _ => None,
    });
    from_mesh_points.or_else(|| {
        geometries.into_iter().find_map(|(_, geometry)| match geometry {
            GeometryOnSphere::MultiPoint(points) => Some(points),
            _ => None,
        })
    })
}

/// Velocity field of a `gpml:MeshNode` feature.
///
/// Each mesh point takes the plate id of the first boundary containing it,
/// else the feature's own plate id. `delta_time` must be positive.
pub fn calculate_velocity_field(
    handle: FeatureHandle,
    feature: &Feature,
    tree: &ReconstructionTree,
    older_tree: &ReconstructionTree,
    boundaries: &[&PlatePolygon],
    delta_time: f64,
) -> Option<MultiPointVectorField> {
    debug_assert!(delta_time > 0.0, "velocity delta time must be positive");
    if !feature.feature_type().is(FeatureType::MESH_NODE) {
        return None;
    }

    let time = tree.reconstruction_time();
    let domain = mesh_domain(feature, &time)?;
    let own_plate_id = reconstruction_plate_id(feature, Some(&time));

    let plate_ids: Vec<Option<PlateId>> = domain
        .points
        .iter()
        .map(|point| {
            boundaries
                .iter()
                .find(|b| {
                    b.plate_id.is_some() && b.is_point_in_on_out(point) != PointInPolygon::Outside
                })
                .and_then(|b| b.plate_id)
                .or(own_plate_id)
        })
        .collect();

    let vectors = domain
        .points
        .iter()
        .zip(&plate_ids)
        .map(|(point, plate_id)| plate_velocity(point, (*plate_id)?, tree, older_tree, delta_time))
        .collect();

    Some(MultiPointVectorField {
        feature_handle: handle,
        feature_id: feature.id().clone(),
        reconstruction_time: time,
        domain,
        plate_ids,
        vectors,
    })
}
