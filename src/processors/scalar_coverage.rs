//! Scalar coverages: a domain geometry paired with per-point scalar values

use serde::Serialize;

use super::reconstruct::rotation_for_plate;
use crate::feature::finder::reconstruction_plate_id;
use crate::feature::{DataBlock, Feature, FeatureHandle, FeatureId, PropertyName, PropertyValue};
use crate::geometry::{GeometryOnSphere, PlateId};
use crate::time::GeoTimeInstant;
use crate::tree::ReconstructionTree;

/// Recognised (domain, range) property name pairs
pub const DOMAIN_RANGE_PROPERTIES: &[(&str, &str)] = &[
    ("gpml:domainSet", "gpml:rangeSet"),
    ("gml:domainSet", "gml:rangeSet"),
    ("gpml:multiPointDomain", "gpml:multiPointRange"),
];

/// A domain geometry and its matching range values at one time
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarCoverage {
    pub domain_property: PropertyName,
    pub range_property: PropertyName,
    pub domain: GeometryOnSphere,
    pub range: DataBlock,
}

/// Domain/range value pairs whose time-dependent wrappers have the same shape
fn paired_properties<'a>(
    feature: &'a Feature,
) -> impl Iterator<Item = (&'static str, &'static str, &'a PropertyValue, &'a PropertyValue)> + 'a {
    DOMAIN_RANGE_PROPERTIES.iter().flat_map(move |&(domain_name, range_name)| {
        feature
            .properties_named(domain_name)
            .zip(feature.properties_named(range_name))
            .filter(|(domain, range)| domain.wrapper_shape() == range.wrapper_shape())
            .map(move |(domain, range)| (domain_name, range_name, domain, range))
    })
}

/// True if the feature has at least one domain/range pair with matching
/// wrapper structure
pub fn is_scalar_coverage_feature(feature: &Feature) -> bool {
    paired_properties(feature).next().is_some()
}

/// Every well-formed coverage of `feature` at `time`.
///
/// A pair is skipped unless both sides resolve at `time` and every scalar
/// series has one value per domain point.
pub fn find_scalar_coverages(
    feature: &Feature,
    time: Option<&GeoTimeInstant>,
) -> Vec<ScalarCoverage> {
    paired_properties(feature)
        .filter_map(|(domain_name, range_name, domain, range)| {
            let domain = domain.resolve_at(time)?.as_geometry()?;
            let range = range.resolve_at(time)?.as_data_block()?;

            let points = domain.vertex_count();
            if let Some(series) = range.series.iter().find(|s| s.values.len() != points) {
                log::debug!(
                    "feature `{}`: scalar series `{}` has {} values for {points} domain points",
                    feature.id(),
                    series.scalar_type,
                    series.values.len()
                );
                return None;
            }

            Some(ScalarCoverage {
                domain_property: domain_name.into(),
                range_property: range_name.into(),
                domain,
                range: range.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructedScalarCoverage {
    pub feature_handle: FeatureHandle,
    pub feature_id: FeatureId,
    pub domain_property: PropertyName,
    pub range_property: PropertyName,
    pub reconstruction_plate_id: Option<PlateId>,
    pub reconstruction_time: GeoTimeInstant,
    pub present_day_domain: GeometryOnSphere,
    pub domain: GeometryOnSphere,
    pub range: DataBlock,
}

/// Rotate each coverage's domain with the feature's plate; values are kept
/// as they are. `None` when the plate has no rotation.
pub fn reconstruct_scalar_coverages(
    handle: FeatureHandle,
    feature: &Feature,
    tree: &ReconstructionTree,
) -> Option<Vec<ReconstructedScalarCoverage>> {
    let time = tree.reconstruction_time();
    let plate_id = reconstruction_plate_id(feature, Some(&time));
    let rotation = rotation_for_plate(tree, plate_id)?;

    let coverages = find_scalar_coverages(feature, Some(&time))
        .into_iter()
        .map(|coverage| ReconstructedScalarCoverage {
            feature_handle: handle,
            feature_id: feature.id().clone(),
            domain_property: coverage.domain_property,
            range_property: coverage.range_property,
            reconstruction_plate_id: plate_id,
            reconstruction_time: time,
            domain: rotation.rotate_geometry(&coverage.domain),
            present_day_domain: coverage.domain,
            range: coverage.range,
        })
        .collect();
    Some(coverages)
}
