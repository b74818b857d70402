//! Property finders
//!
//! Small lookups shared by the graph populator and the feature processors.
//! Each one dispatches on the property name, unwraps time-dependent wrappers
//! and matches the value variant it needs; anything else is treated as absent.

use super::{names, Feature, PropertyName};
use crate::geometry::{GeometryOnSphere, PlateId, PointOnSphere};
use crate::time::{GeoTimeInstant, TimePeriod};

/// First plate id named `name`, resolved at `time`
pub fn find_plate_id(
    feature: &Feature,
    name: &str,
    time: Option<&GeoTimeInstant>,
) -> Option<PlateId> {
    feature
        .properties_named(name)
        .find_map(|v| v.resolve_at(time).and_then(|v| v.as_plate_id()))
}

/// First double named `name`, resolved at `time`
pub fn find_double(feature: &Feature, name: &str, time: Option<&GeoTimeInstant>) -> Option<f64> {
    feature
        .properties_named(name)
        .find_map(|v| v.resolve_at(time).and_then(|v| v.as_double()))
}

/// First point named `name`, resolved at `time`
pub fn find_point(
    feature: &Feature,
    name: &str,
    time: Option<&GeoTimeInstant>,
) -> Option<PointOnSphere> {
    feature
        .properties_named(name)
        .find_map(|v| v.resolve_at(time).and_then(|v| v.as_point()))
}

/// First time period named `name`
pub fn find_time_period(feature: &Feature, name: &str) -> Option<TimePeriod> {
    feature
        .properties_named(name)
        .find_map(|v| v.resolve_at(None).and_then(|v| v.as_time_period()))
}

/// The feature's `gpml:reconstructionPlateId`
pub fn reconstruction_plate_id(
    feature: &Feature,
    time: Option<&GeoTimeInstant>,
) -> Option<PlateId> {
    find_plate_id(feature, names::RECONSTRUCTION_PLATE_ID, time)
}

/// The feature's `gml:validTime`, unbounded when absent
pub fn valid_time(feature: &Feature) -> TimePeriod {
    find_time_period(feature, names::VALID_TIME).unwrap_or_default()
}

/// True if the feature exists at `time` according to its valid time
pub fn is_active_at(feature: &Feature, time: &GeoTimeInstant) -> bool {
    valid_time(feature).contains(time)
}

/// Every geometry-valued property at `time`, in property order
pub fn geometry_properties<'a>(
    feature: &'a Feature,
    time: Option<&GeoTimeInstant>,
) -> Vec<(&'a PropertyName, GeometryOnSphere)> {
    feature
        .properties
        .iter()
        .filter_map(|p| {
            let geometry = p.value.resolve_at(time)?.as_geometry()?;
            Some((&p.name, geometry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::PropertyValue;
    use crate::geometry::PolylineOnSphere;

    fn sample_feature() -> Feature {
        Feature::new("coast-1", "gpml:Coastline")
            .with_property(
                names::RECONSTRUCTION_PLATE_ID,
                PropertyValue::constant(PropertyValue::PlateId(801)),
            )
            .with_property(
                names::VALID_TIME,
                PropertyValue::TimePeriod(TimePeriod::new(100.0.into(), 0.0.into())),
            )
            .with_property(
                names::CENTER_LINE_OF,
                PropertyValue::constant(PropertyValue::Geometry(
                    PolylineOnSphere::new(vec![
                        PointOnSphere::from_lat_lon_degrees(-30.0, 120.0),
                        PointOnSphere::from_lat_lon_degrees(-25.0, 130.0),
                    ])
                    .into(),
                )),
            )
            .with_property("gml:name", PropertyValue::String("coast".into()))
    }

    #[test]
    fn finds_wrapped_plate_id() {
        assert_eq!(reconstruction_plate_id(&sample_feature(), None), Some(801));
    }

    #[test]
    fn missing_valid_time_is_unbounded() {
        let feature = Feature::new("f", "gpml:Coastline");
        assert!(is_active_at(&feature, &GeoTimeInstant::new(3000.0)));
        assert!(is_active_at(&sample_feature(), &GeoTimeInstant::new(50.0)));
        assert!(!is_active_at(&sample_feature(), &GeoTimeInstant::new(150.0)));
    }

    #[test]
    fn collects_only_geometry_properties() {
        let feature = sample_feature();
        let geometries = geometry_properties(&feature, None);
        assert_eq!(geometries.len(), 1);
        assert_eq!(geometries[0].0.as_str(), names::CENTER_LINE_OF);
        assert_eq!(geometries[0].1.vertex_count(), 2);
    }
}
