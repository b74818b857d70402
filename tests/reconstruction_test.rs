//! End-to-end reconstructions of small plate models
//!
//! These tests build feature stores by hand and check what a reconstruction
//! produces at different times and anchors.

use plate_reconstruction::*;

/// A sequence of poles about the north pole, given as (time, angle in degrees)
fn spin_sequence(id: &str, fixed: PlateId, moving: PlateId, poles: &[(f64, f64)]) -> Feature {
    let samples = poles
        .iter()
        .map(|&(time, angle)| {
            let rotation = FiniteRotation::from_euler_pole_degrees(90.0, 0.0, angle);
            TimeSample::new(PropertyValue::FiniteRotation(rotation), time)
        })
        .collect();
    sequence_with_samples(id, fixed, moving, samples)
}

fn sequence_with_samples(
    id: &str,
    fixed: PlateId,
    moving: PlateId,
    samples: Vec<TimeSample>,
) -> Feature {
    Feature::new(id, FeatureType::TOTAL_RECONSTRUCTION_SEQUENCE)
        .with_property(names::FIXED_REFERENCE_FRAME, PropertyValue::PlateId(fixed))
        .with_property(names::MOVING_REFERENCE_FRAME, PropertyValue::PlateId(moving))
        .with_property(
            names::TOTAL_RECONSTRUCTION_POLE,
            PropertyValue::IrregularSampling(IrregularSampling::new(samples)),
        )
}

fn site(id: &str, plate_id: PlateId, lat: f64, lon: f64) -> Feature {
    let position = PointOnSphere::from_lat_lon_degrees(lat, lon);
    Feature::new(id, "gpml:UnclassifiedFeature")
        .with_property(names::RECONSTRUCTION_PLATE_ID, PropertyValue::PlateId(plate_id))
        .with_property(
            names::POSITION,
            PropertyValue::constant(PropertyValue::Geometry(position.into())),
        )
}

fn position_of(reconstruction: &Reconstruction, handle: FeatureHandle) -> Option<(f64, f64)> {
    let rfg = reconstruction.feature_geometries_for(handle).next()?;
    Some(rfg.geometry.vertices()[0].to_lat_lon_degrees())
}

fn base_store() -> FeatureStore {
    let mut store = FeatureStore::new();
    store.insert(spin_sequence("rot-801", 0, 801, &[(0.0, 0.0), (100.0, 50.0)])).unwrap();
    store
}

#[test]
fn valid_time_limits_when_a_feature_is_reconstructed() {
    let mut store = base_store();
    let handle = store
        .insert(site("island", 801, 0.0, 0.0).with_property(
            names::VALID_TIME,
            PropertyValue::TimePeriod(TimePeriod::new(10.0.into(), 5.0.into())),
        ))
        .unwrap();

    let mut reconstructor = Reconstructor::new(&store, ReconstructionConfig::new()).unwrap();

    let at_7 = reconstructor.reconstruct(&store, 7.0).unwrap();
    let (_, lon) = position_of(&at_7, handle).expect("active at 7 Ma");
    assert!((lon - 3.5).abs() < 1e-9);

    for time in [12.0, 3.0] {
        let reconstruction = reconstructor.reconstruct(&store, time).unwrap();
        assert!(position_of(&reconstruction, handle).is_none(), "inactive at {time} Ma");
        assert_eq!(reconstruction.diagnostics().inactive, 1);
    }

    // Boundaries of the valid time are inclusive
    let at_10 = reconstructor.reconstruct(&store, 10.0).unwrap();
    assert!(position_of(&at_10, handle).is_some());
}

#[test]
fn disabled_samples_are_ignored() {
    let pole = |time: f64, angle: f64| {
        let rotation = FiniteRotation::from_euler_pole_degrees(90.0, 0.0, angle);
        TimeSample::new(PropertyValue::FiniteRotation(rotation), time)
    };

    let mut with_disabled = FeatureStore::new();
    with_disabled
        .insert(sequence_with_samples(
            "rot",
            0,
            801,
            vec![pole(0.0, 0.0), pole(40.0, 170.0).disabled(), pole(100.0, 50.0)],
        ))
        .unwrap();
    let a = with_disabled.insert(site("site", 801, 20.0, 30.0)).unwrap();

    let mut without = FeatureStore::new();
    without
        .insert(sequence_with_samples("rot", 0, 801, vec![pole(0.0, 0.0), pole(100.0, 50.0)]))
        .unwrap();
    let b = without.insert(site("site", 801, 20.0, 30.0)).unwrap();

    let mut ra = Reconstructor::new(&with_disabled, ReconstructionConfig::new()).unwrap();
    let mut rb = Reconstructor::new(&without, ReconstructionConfig::new()).unwrap();
    for time in [0.0, 25.0, 40.0, 60.0, 100.0] {
        let pa = position_of(&ra.reconstruct(&with_disabled, time).unwrap(), a).unwrap();
        let pb = position_of(&rb.reconstruct(&without, time).unwrap(), b).unwrap();
        assert!(
            (pa.0 - pb.0).abs() < 1e-9 && (pa.1 - pb.1).abs() < 1e-9,
            "{time} Ma: {pa:?} vs {pb:?}"
        );
    }
}

#[test]
fn times_outside_the_rotation_model_drop_plate_features() {
    let mut store = base_store();
    let on_plate = store.insert(site("on-plate", 801, 0.0, 0.0)).unwrap();
    let fixed = store
        .insert(Feature::new("no-plate", "gpml:UnclassifiedFeature").with_property(
            names::POSITION,
            PropertyValue::Geometry(PointOnSphere::from_lat_lon_degrees(0.0, 0.0).into()),
        ))
        .unwrap();

    let mut reconstructor = Reconstructor::new(&store, ReconstructionConfig::new()).unwrap();
    let reconstruction = reconstructor.reconstruct(&store, 150.0).unwrap();

    assert!(position_of(&reconstruction, on_plate).is_none());
    assert_eq!(position_of(&reconstruction, fixed), Some((0.0, 0.0)));
    assert_eq!(reconstruction.diagnostics().missing_rotation, 1);
    assert_eq!(reconstruction.diagnostics().unreachable_plate_ids, vec![801]);
}

#[test]
fn chained_plates_compose_rotations() {
    let mut store = base_store();
    store.insert(spin_sequence("rot-802", 801, 802, &[(0.0, 0.0), (100.0, 20.0)])).unwrap();
    let handle = store.insert(site("site", 802, 0.0, 0.0)).unwrap();

    let mut reconstructor = Reconstructor::new(&store, ReconstructionConfig::new()).unwrap();
    let reconstruction = reconstructor.reconstruct(&store, 50.0).unwrap();

    // 25 degrees from 801 plus 10 degrees relative to it
    let (_, lon) = position_of(&reconstruction, handle).unwrap();
    assert!((lon - 35.0).abs() < 1e-9);
    assert_eq!(reconstruction.tree().parent_plate_id(802), Some(801));
}

#[test]
fn changing_the_anchor_walks_edges_in_reverse() {
    let mut store = base_store();
    let handle = store.insert(site("site", 0, 0.0, 0.0)).unwrap();

    let config = ReconstructionConfig::new().with_anchor_plate_id(801);
    let mut reconstructor = Reconstructor::new(&store, config).unwrap();
    let reconstruction = reconstructor.reconstruct(&store, 20.0).unwrap();

    assert_eq!(reconstruction.anchor_plate_id(), 801);
    let (_, lon) = position_of(&reconstruction, handle).unwrap();
    assert!((lon + 10.0).abs() < 1e-9);

    let relative = FiniteRotation::from_euler_pole_degrees(90.0, 0.0, 10.0);
    let (old_root, found) = reconstruction.tree().get_composed_absolute_rotation(0);
    assert!(found);
    assert!(old_root.quat_is_equivalent(&relative.inverse(), 1e-12));

    reconstructor.set_anchor_plate_id(0);
    let reconstruction = reconstructor.reconstruct(&store, 20.0).unwrap();
    assert_eq!(position_of(&reconstruction, handle), Some((0.0, 0.0)));
}

#[test]
fn virtual_geomagnetic_poles_follow_their_plate() {
    let mut store = base_store();
    let vgp = store
        .insert(
            Feature::new("vgp", FeatureType::VIRTUAL_GEOMAGNETIC_POLE)
                .with_property(names::RECONSTRUCTION_PLATE_ID, PropertyValue::PlateId(801))
                .with_property(
                    names::POLE_POSITION,
                    PropertyValue::Geometry(PointOnSphere::from_lat_lon_degrees(80.0, 0.0).into()),
                )
                .with_property(
                    names::AVERAGE_SAMPLE_SITE_POSITION,
                    PropertyValue::Geometry(PointOnSphere::from_lat_lon_degrees(30.0, 0.0).into()),
                )
                .with_property(names::POLE_A95, PropertyValue::Double(5.0))
                .with_property(names::AVERAGE_AGE, PropertyValue::Double(40.0)),
        )
        .unwrap();

    let mut reconstructor = Reconstructor::new(&store, ReconstructionConfig::new()).unwrap();
    let at_42 = reconstructor.reconstruct(&store, 42.0).unwrap();
    let poles: Vec<_> = at_42.virtual_geomagnetic_poles().collect();
    assert_eq!(poles.len(), 1);
    assert_eq!(poles[0].feature_handle, vgp);
    let (lat, lon) = poles[0].pole_position.to_lat_lon_degrees();
    assert!((lat - 80.0).abs() < 1e-9 && (lon - 21.0).abs() < 1e-9);
    let expected_radius = 5.0_f64.to_radians();
    assert!(matches!(
        poles[0].error,
        Some(PoleError::Circle { radius }) if (radius - expected_radius).abs() < 1e-12
    ));

    // Outside the default five Myr window around the pole's age
    let at_60 = reconstructor.reconstruct(&store, 60.0).unwrap();
    assert_eq!(at_60.virtual_geomagnetic_poles().count(), 0);
    assert_eq!(at_60.diagnostics().dropped_features(), 0);

    let always = ReconstructionConfig::new()
        .with_vgp_settings(
            VgpRenderSettings::default().with_visibility(VgpVisibility::AlwaysVisible),
        );
    let mut reconstructor = Reconstructor::new(&store, always).unwrap();
    let at_60 = reconstructor.reconstruct(&store, 60.0).unwrap();
    assert_eq!(at_60.virtual_geomagnetic_poles().count(), 1);
}

#[test]
fn scalar_coverages_keep_their_values() {
    let mut store = base_store();
    let domain = MultiPointOnSphere::new(vec![
        PointOnSphere::from_lat_lon_degrees(0.0, 0.0),
        PointOnSphere::from_lat_lon_degrees(0.0, 10.0),
    ]);
    let range = DataBlock {
        series: vec![ScalarSeries { scalar_type: "gpml:Age".into(), values: vec![12.0, 14.0] }],
    };
    let handle = store
        .insert(
            Feature::new("grid", "gpml:ScalarCoverage")
                .with_property(names::RECONSTRUCTION_PLATE_ID, PropertyValue::PlateId(801))
                .with_property("gpml:domainSet", PropertyValue::Geometry(domain.into()))
                .with_property("gpml:rangeSet", PropertyValue::DataBlock(range.clone())),
        )
        .unwrap();

    let mut reconstructor = Reconstructor::new(&store, ReconstructionConfig::new()).unwrap();
    let reconstruction = reconstructor.reconstruct(&store, 20.0).unwrap();

    let coverages: Vec<_> = reconstruction
        .geometries_for_feature(handle)
        .filter_map(|g| match g {
            ReconstructionGeometry::ScalarCoverage(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(coverages.len(), 1);
    assert_eq!(coverages[0].range, range);
    let (_, lon) = coverages[0].domain.vertices()[1].to_lat_lon_degrees();
    assert!((lon - 20.0).abs() < 1e-9);
}

#[test]
fn raster_rotation_groups_refresh_in_place() {
    let mut store = base_store();
    let ring = |lon: f64| {
        PolygonOnSphere::new(vec![
            PointOnSphere::from_lat_lon_degrees(0.0, lon),
            PointOnSphere::from_lat_lon_degrees(0.0, lon + 10.0),
            PointOnSphere::from_lat_lon_degrees(10.0, lon + 5.0),
        ])
    };
    store
        .insert(
            Feature::new("block", "gpml:ClosedContinentalBoundary")
                .with_property(names::RECONSTRUCTION_PLATE_ID, PropertyValue::PlateId(801))
                .with_property(names::OUTLINE_OF, PropertyValue::Geometry(ring(0.0).into())),
        )
        .unwrap();
    store
        .insert(
            Feature::new("loose", "gpml:ClosedContinentalBoundary")
                .with_property(names::OUTLINE_OF, PropertyValue::Geometry(ring(40.0).into())),
        )
        .unwrap();

    let mut reconstructor = Reconstructor::new(&store, ReconstructionConfig::new()).unwrap();
    let tree_10 = reconstructor.reconstruction_tree(10.0);
    let mut raster = ReconstructRasterPolygons::from_features(store.iter(), &tree_10);

    let plate_ids: Vec<Option<PlateId>> = raster.rotation_groups().map(|g| g.plate_id()).collect();
    assert_eq!(plate_ids, vec![None, Some(801)]);
    assert_eq!(raster.num_regions(), 2);

    let before = raster.group_for_plate(801).unwrap().regions().to_vec();
    let tree_60 = reconstructor.reconstruction_tree(60.0);
    raster.update_rotations(&tree_60);

    let group = raster.group_for_plate(801).unwrap();
    assert_eq!(group.regions(), &before[..]);
    let expected = FiniteRotation::from_euler_pole_degrees(90.0, 0.0, 30.0);
    assert!(FiniteRotation::from_quat(group.rotation()).quat_is_equivalent(&expected, 1e-9));
}

#[test]
fn outputs_serialize_to_json() {
    let mut store = base_store();
    store.insert(site("site", 801, 0.0, 0.0)).unwrap();

    let mut reconstructor = Reconstructor::new(&store, ReconstructionConfig::new()).unwrap();
    let reconstruction = reconstructor.reconstruct(&store, 10.0).unwrap();

    let json = serde_json::to_value(reconstruction.geometries()).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(1));
    assert!(json[0].get("FeatureGeometry").is_some());
}
