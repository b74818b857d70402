//! Rotation of a feature's present-day geometries into their position at the
//! reconstruction time

use serde::Serialize;

use crate::feature::finder::{geometry_properties, reconstruction_plate_id};
use crate::feature::{Feature, FeatureHandle, FeatureId, PropertyName};
use crate::geometry::{FiniteRotation, GeometryOnSphere, PlateId};
use crate::time::GeoTimeInstant;
use crate::tree::ReconstructionTree;

pub use crate::feature::finder::is_active_at;

/// One geometry property of a feature, reconstructed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructedFeatureGeometry {
    pub feature_handle: FeatureHandle,
    pub feature_id: FeatureId,
    pub property_name: PropertyName,
    /// `None` when the feature has no `gpml:reconstructionPlateId`
    pub reconstruction_plate_id: Option<PlateId>,
    pub reconstruction_time: GeoTimeInstant,
    pub present_day_geometry: GeometryOnSphere,
    pub geometry: GeometryOnSphere,
}

/// The rotation to apply to a feature with the given plate id.
///
/// A missing plate id means the feature stays at its present-day position;
/// a plate id with no path to the anchor has no rotation at all.
pub(crate) fn rotation_for_plate(
    tree: &ReconstructionTree,
    plate_id: Option<PlateId>,
) -> Option<FiniteRotation> {
    match plate_id {
        None => Some(FiniteRotation::identity()),
        Some(id) => match tree.get_composed_absolute_rotation(id) {
            (rotation, true) => Some(rotation),
            (_, false) => None,
        },
    }
}

/// Reconstruct every geometry property of `feature` with `tree`.
///
/// Returns `None` when the feature's plate has no rotation at the tree's time.
/// Valid-time gating is left to the caller (see [`is_active_at`]).
pub fn reconstruct_feature(
    handle: FeatureHandle,
    feature: &Feature,
    tree: &ReconstructionTree,
) -> Option<Vec<ReconstructedFeatureGeometry>> {
    let time = tree.reconstruction_time();
    let plate_id = reconstruction_plate_id(feature, Some(&time));
    let Some(rotation) = rotation_for_plate(tree, plate_id) else {
        log::debug!(
            "feature `{}`: plate {} has no rotation at {time}",
            feature.id(),
            plate_id.unwrap_or_default()
        );
        return None;
    };

    let reconstructed = geometry_properties(feature, Some(&time))
        .into_iter()
        .map(|(name, present_day)| ReconstructedFeatureGeometry {
            feature_handle: handle,
            feature_id: feature.id().clone(),
            property_name: name.clone(),
            reconstruction_plate_id: plate_id,
            reconstruction_time: time,
            geometry: rotation.rotate_geometry(&present_day),
            present_day_geometry: present_day,
        })
        .collect();

    Some(reconstructed)
}
