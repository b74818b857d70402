//! Virtual geomagnetic pole reconstruction

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::reconstruct::rotation_for_plate;
use crate::constants::EPSILON;
use crate::feature::finder::{find_double, find_point, reconstruction_plate_id};
use crate::feature::{names, Feature, FeatureHandle, FeatureId};
use crate::geometry::{FiniteRotation, PlateId, PointOnSphere};
use crate::time::{GeoTimeInstant, TimePeriod};
use crate::tree::ReconstructionTree;

/// When a pole is shown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VgpVisibility {
    AlwaysVisible,
    /// Visible while the reconstruction time lies within `[begin, end]`
    TimeWindow { begin: GeoTimeInstant, end: GeoTimeInstant },
    /// Visible within `delta` Ma of the pole's average age
    DeltaTAroundAge { delta: f64 },
}

impl Default for VgpVisibility {
    fn default() -> Self {
        VgpVisibility::DeltaTAroundAge { delta: 5.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VgpRenderSettings {
    pub visibility: VgpVisibility,
    /// Always draw the a95 circle, even when dm/dp are available
    pub use_circular_error: bool,
    /// Applied after the plate rotation
    pub extra_rotation: Option<FiniteRotation>,
}

impl VgpRenderSettings {
    /// Builder-style visibility setter
    pub fn with_visibility(mut self, visibility: VgpVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Report a circular error from `A95` instead of an ellipse
    pub fn with_circular_error(mut self, use_circular_error: bool) -> Self {
        self.use_circular_error = use_circular_error;
        self
    }

    /// Rotation applied after the plate rotation
    pub fn with_extra_rotation(mut self, rotation: FiniteRotation) -> Self {
        self.extra_rotation = Some(rotation);
        self
    }

    /// True if a pole of the given average age is shown at `time`
    pub fn is_visible(&self, average_age: Option<f64>, time: &GeoTimeInstant) -> bool {
        match self.visibility {
            VgpVisibility::AlwaysVisible => true,
            VgpVisibility::TimeWindow { begin, end } => TimePeriod::new(begin, end).contains(time),
            VgpVisibility::DeltaTAroundAge { delta } => match (average_age, time.value()) {
                (Some(age), Some(t)) => (t - age).abs() <= delta,
                _ => false,
            },
        }
    }
}

/// Uncertainty region around a reconstructed pole (angles in radians)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PoleError {
    Circle { radius: f64 },
    Ellipse {
        /// Semi-axis along the great circle through site and pole (dm)
        semi_major: f64,
        /// Semi-axis across it (dp)
        semi_minor: f64,
        /// Unit tangent at the pole pointing toward the site
        major_axis: DVec3,
    },
}

/// The paleomagnetic properties of a VGP feature, angles in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualGeomagneticPole {
    pub pole_position: PointOnSphere,
    pub site_position: Option<PointOnSphere>,
    pub a95: Option<f64>,
    pub dm: Option<f64>,
    pub dp: Option<f64>,
    pub average_age: Option<f64>,
    pub plate_id: Option<PlateId>,
}

impl VirtualGeomagneticPole {
    /// Read the pole properties; a feature without a pole position is not a VGP
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let degrees = |name: &str| find_double(feature, name, None).map(f64::to_radians);
        Some(Self {
            pole_position: find_point(feature, names::POLE_POSITION, None)?,
            site_position: find_point(feature, names::AVERAGE_SAMPLE_SITE_POSITION, None),
            a95: degrees(names::POLE_A95),
            dm: degrees(names::POLE_DM),
            dp: degrees(names::POLE_DP),
            average_age: find_double(feature, names::AVERAGE_AGE, None),
            plate_id: reconstruction_plate_id(feature, None),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructedVirtualGeomagneticPole {
    pub feature_handle: FeatureHandle,
    pub feature_id: FeatureId,
    pub plate_id: Option<PlateId>,
    pub reconstruction_time: GeoTimeInstant,
    pub average_age: Option<f64>,
    pub pole_position: PointOnSphere,
    pub site_position: Option<PointOnSphere>,
    pub error: Option<PoleError>,
}

/// Reconstruct a VGP feature if it is visible at the tree's time.
///
/// Site and pole are rotated by the plate rotation followed by the settings'
/// extra rotation. An ellipse is produced when dm, dp and a site exist (unless
/// circular mode is on), otherwise a circle from a95 if present.
pub fn reconstruct_vgp(
    handle: FeatureHandle,
    feature: &Feature,
    tree: &ReconstructionTree,
    settings: &VgpRenderSettings,
) -> Option<ReconstructedVirtualGeomagneticPole> {
    let vgp = VirtualGeomagneticPole::from_feature(feature)?;
    let time = tree.reconstruction_time();
    if !settings.is_visible(vgp.average_age, &time) {
        return None;
    }

    let plate_rotation = rotation_for_plate(tree, vgp.plate_id)?;
    let rotation = match &settings.extra_rotation {
        Some(extra) => FiniteRotation::compose(extra, &plate_rotation),
        None => plate_rotation,
    };

    let pole_position = rotation.rotate_point(&vgp.pole_position);
    let site_position = vgp.site_position.map(|site| rotation.rotate_point(&site));

    Some(ReconstructedVirtualGeomagneticPole {
        feature_handle: handle,
        feature_id: feature.id().clone(),
        plate_id: vgp.plate_id,
        reconstruction_time: time,
        average_age: vgp.average_age,
        error: pole_error(
            &vgp,
            &pole_position,
            site_position.as_ref(),
            settings.use_circular_error,
        ),
        pole_position,
        site_position,
    })
}

fn pole_error(
    vgp: &VirtualGeomagneticPole,
    pole: &PointOnSphere,
    site: Option<&PointOnSphere>,
    use_circular_error: bool,
) -> Option<PoleError> {
    let circle = vgp.a95.map(|radius| PoleError::Circle { radius });
    if use_circular_error {
        return circle;
    }

    match (vgp.dm, vgp.dp, site) {
        (Some(dm), Some(dp), Some(site)) => {
            let p = pole.position();
            let toward_site = site.position() - p * p.dot(site.position());
            match toward_site.try_normalize() {
                Some(major_axis) if toward_site.length() > EPSILON => {
                    Some(PoleError::Ellipse { semi_major: dm, semi_minor: dp, major_axis })
                }
                // Site at the pole or its antipode: no direction to orient along
                _ => Some(PoleError::Circle { radius: dm.max(dp) }),
            }
        }
        _ => circle,
    }
}
