//! Raster polygon masks grouped by plate rotation
//!
//! Polygon regions are collected once and filed into one [`RotationGroup`] per
//! plate id, plus a default group for features without a plate id. Moving to
//! a new reconstruction time only refreshes each group's cached rotation; the
//! regions themselves are never rebuilt.

use std::collections::BTreeMap;

use glam::DQuat;

use crate::feature::finder::{geometry_properties, reconstruction_plate_id, valid_time};
use crate::feature::{Feature, FeatureHandle};
use crate::geometry::{GeometryOnSphere, PlateId, PointOnSphere};
use crate::time::{GeoTimeInstant, TimePeriod};
use crate::tree::ReconstructionTree;

/// A present-day polygon (with holes) and the time window it exists in
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRegion {
    pub feature_handle: FeatureHandle,
    pub exterior: Vec<PointOnSphere>,
    pub interiors: Vec<Vec<PointOnSphere>>,
    pub time_of_appearance: GeoTimeInstant,
    pub time_of_disappearance: GeoTimeInstant,
}

impl PolygonRegion {
    /// True if the region exists at `time`
    pub fn is_active_at(&self, time: &GeoTimeInstant) -> bool {
        TimePeriod::new(self.time_of_appearance, self.time_of_disappearance).contains(time)
    }
}

/// Regions sharing one plate's current rotation
#[derive(Debug, Clone, PartialEq)]
pub struct RotationGroup {
    plate_id: Option<PlateId>,
    rotation: DQuat,
    regions: Vec<PolygonRegion>,
}

impl RotationGroup {
    fn new(plate_id: Option<PlateId>) -> Self {
        Self { plate_id, rotation: DQuat::IDENTITY, regions: Vec::new() }
    }

    /// The plate the group rotates with; `None` for unrotated regions
    pub fn plate_id(&self) -> Option<PlateId> {
        self.plate_id
    }

    /// The cached absolute rotation of this group's plate
    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    /// Regions sharing this group's rotation
    pub fn regions(&self) -> &[PolygonRegion] {
        &self.regions
    }

    /// Regions that exist at `time`
    pub fn active_regions<'a>(
        &'a self,
        time: &'a GeoTimeInstant,
    ) -> impl Iterator<Item = &'a PolygonRegion> + 'a {
        self.regions.iter().filter(move |r| r.is_active_at(time))
    }
}

#[derive(Debug, Clone)]
pub struct ReconstructRasterPolygons {
    no_plate_id: RotationGroup,
    groups: BTreeMap<PlateId, RotationGroup>,
}

impl ReconstructRasterPolygons {
    /// Collect the polygon regions of `features` and set each group's
    /// rotation from `tree`
    pub fn from_features<'a>(
        features: impl IntoIterator<Item = (FeatureHandle, &'a Feature)>,
        tree: &ReconstructionTree,
    ) -> Self {
        let mut polygons = Self { no_plate_id: RotationGroup::new(None), groups: BTreeMap::new() };

        for (handle, feature) in features {
            let period = valid_time(feature);
            let plate_id = reconstruction_plate_id(feature, None);

            for (_, geometry) in geometry_properties(feature, None) {
                let GeometryOnSphere::Polygon(polygon) = geometry else {
                    continue;
                };
                let region = PolygonRegion {
                    feature_handle: handle,
                    exterior: polygon.exterior,
                    interiors: polygon.interiors,
                    time_of_appearance: period.begin,
                    time_of_disappearance: period.end,
                };
                match plate_id {
                    Some(id) => polygons
                        .groups
                        .entry(id)
                        .or_insert_with(|| RotationGroup::new(Some(id)))
                        .regions
                        .push(region),
                    None => polygons.no_plate_id.regions.push(region),
                }
            }
        }

        polygons.update_rotations(tree);
        log::debug!(
            "collected {} raster polygon regions in {} rotation groups",
            polygons.num_regions(),
            polygons.groups.len() + 1
        );
        polygons
    }

    /// Refresh every group's cached rotation from `tree`. Regions are untouched.
    ///
    /// Plates without a path to the anchor fall back to the identity.
    pub fn update_rotations(&mut self, tree: &ReconstructionTree) {
        for (plate_id, group) in &mut self.groups {
            let (rotation, reached) = tree.get_composed_absolute_rotation(*plate_id);
            if !reached {
                log::trace!(
                    "raster group for plate {plate_id} has no rotation at {}",
                    tree.reconstruction_time()
                );
            }
            group.rotation = rotation.quat();
        }
    }

    /// The no-plate-id group first, then groups by ascending plate id
    pub fn rotation_groups(&self) -> impl Iterator<Item = &RotationGroup> {
        std::iter::once(&self.no_plate_id).chain(self.groups.values())
    }

    /// The group rotating with `plate_id`
    pub fn group_for_plate(&self, plate_id: PlateId) -> Option<&RotationGroup> {
        self.groups.get(&plate_id)
    }

    /// Number of regions over all groups
    pub fn num_regions(&self) -> usize {
        self.rotation_groups().map(|g| g.regions.len()).sum()
    }
}
