//! Timeline example for the plate reconstruction library
//!
//! This example builds a small plate model in memory and walks it back in time:
//! - Rotation sequences for two plates in a chain
//! - A coastline and a topological plate boundary
//! - Velocities sampled on a random mesh
//!
//! Run with `RUST_LOG=debug` to see the per-step summaries.

use plate_reconstruction::*;

fn spin(time: f64, lat: f64, lon: f64, angle: f64) -> TimeSample {
    let rotation = FiniteRotation::from_euler_pole_degrees(lat, lon, angle);
    TimeSample::new(PropertyValue::FiniteRotation(rotation), time)
}

fn sequence(id: &str, fixed: PlateId, moving: PlateId, samples: Vec<TimeSample>) -> Feature {
    Feature::new(id, FeatureType::TOTAL_RECONSTRUCTION_SEQUENCE)
        .with_property(names::FIXED_REFERENCE_FRAME, PropertyValue::PlateId(fixed))
        .with_property(names::MOVING_REFERENCE_FRAME, PropertyValue::PlateId(moving))
        .with_property(
            names::TOTAL_RECONSTRUCTION_POLE,
            PropertyValue::IrregularSampling(IrregularSampling::new(samples)),
        )
}

fn line(id: &str, plate_id: PlateId, points: &[(f64, f64)]) -> Feature {
    let points = points.iter().map(|&(lat, lon)| PointOnSphere::from_lat_lon_degrees(lat, lon));
    let line = PolylineOnSphere::new(points.collect());
    Feature::new(id, "gpml:Coastline")
        .with_property(names::RECONSTRUCTION_PLATE_ID, PropertyValue::PlateId(plate_id))
        .with_property(names::CENTER_LINE_OF, PropertyValue::Geometry(line.into()))
}

fn build_store() -> Result<FeatureStore> {
    let mut store = FeatureStore::new();

    store.insert(sequence(
        "rot-701",
        0,
        701,
        vec![spin(0.0, 90.0, 0.0, 0.0), spin(200.0, 10.0, -30.0, 40.0)],
    ))?;
    store.insert(sequence(
        "rot-801",
        701,
        801,
        vec![
            spin(0.0, 90.0, 0.0, 0.0),
            spin(80.0, -20.0, 40.0, 25.0),
            spin(200.0, -25.0, 45.0, 60.0),
        ],
    ))?;

    store.insert(line("coast-africa", 701, &[(-30.0, 15.0), (-10.0, 10.0), (5.0, 0.0)]))?;
    store.insert(line("coast-india", 801, &[(20.0, 70.0), (10.0, 78.0), (20.0, 88.0)]))?;

    // A rectangular plate closed by four overshooting boundary lines
    for (id, points) in [
        ("ridge-south", [(0.0, 58.0), (0.0, 92.0)]),
        ("trench-east", [(-2.0, 90.0), (32.0, 90.0)]),
        ("trench-north", [(30.0, 92.0), (30.0, 58.0)]),
        ("fault-west", [(32.0, 60.0), (-2.0, 60.0)]),
    ] {
        store.insert(line(id, 801, &points))?;
    }
    store.insert(
        Feature::new("plate-india", FeatureType::TOPOLOGICAL_CLOSED_PLATE_BOUNDARY)
            .with_property(names::RECONSTRUCTION_PLATE_ID, PropertyValue::PlateId(801))
            .with_property(
                names::BOUNDARY,
                PropertyValue::TopologicalPolygon(TopologicalPolygon {
                    sections: ["ridge-south", "trench-east", "trench-north", "fault-west"]
                        .into_iter()
                        .map(TopologicalSection::new)
                        .collect(),
                }),
            ),
    )?;

    store.insert(
        Feature::new("mesh", FeatureType::MESH_NODE)
            .with_property(names::RECONSTRUCTION_PLATE_ID, PropertyValue::PlateId(701))
            .with_property(
                names::MESH_POINTS,
                PropertyValue::Geometry(
                    MultiPointOnSphere::new(generate_random_points(200, 42)).into(),
                ),
            ),
    )?;

    Ok(store)
}

fn main() -> Result<()> {
    env_logger::init();

    println!("🌍 Plate Reconstruction - Timeline Demo");
    println!("=======================================");

    let store = build_store()?;
    let config = ReconstructionConfig::new().with_velocities(true).with_velocity_delta_time(1.0);
    let mut reconstructor = Reconstructor::new(&store, config)?;

    println!(
        "Loaded {} features; rotation graph has {} edges over plates {:?}",
        store.len(),
        reconstructor.graph().num_edges(),
        reconstructor.graph().plate_ids()
    );

    for time in [0.0, 40.0, 80.0, 120.0, 250.0] {
        println!("\n--- {time} Ma ---");
        let reconstruction = reconstructor.reconstruct(&store, time)?;
        display_geometries(&reconstruction);
        display_boundaries(&reconstruction);
        display_velocities(&reconstruction);

        let diagnostics = reconstruction.diagnostics();
        if diagnostics.dropped_features() > 0 || !diagnostics.unreachable_plate_ids.is_empty() {
            println!("⚠️  Diagnostics: {diagnostics:?}");
        } else {
            println!("✅ Every feature reconstructed");
        }
    }

    println!("\n🔧 Reconstructing relative to India (plate 801):");
    reconstructor.set_anchor_plate_id(801);
    let reconstruction = reconstructor.reconstruct(&store, 80.0)?;
    display_geometries(&reconstruction);

    Ok(())
}

fn display_geometries(reconstruction: &Reconstruction) {
    for rfg in reconstruction.feature_geometries() {
        let vertices = rfg.geometry.vertices();
        let Some(first) = vertices.first() else { continue };
        let (lat, lon) = first.to_lat_lon_degrees();
        println!(
            "  {}: {} vertices starting at ({lat:.1}°, {lon:.1}°)",
            rfg.feature_id,
            vertices.len()
        );
    }
}

fn display_boundaries(reconstruction: &Reconstruction) {
    for boundary in reconstruction.resolved_boundaries() {
        println!(
            "  🧩 {} (plate {:?}): {} vertices from {} sections, {} errors",
            boundary.feature_id,
            boundary.plate_id,
            boundary.vertices.len(),
            boundary.sub_segments.len(),
            boundary.errors().len()
        );
    }
}

fn display_velocities(reconstruction: &Reconstruction) {
    for field in reconstruction.vector_fields() {
        let speeds: Vec<f64> =
            field.vectors.iter().flatten().map(VelocityVector::magnitude).collect();
        if speeds.is_empty() {
            println!("  🚀 {}: no velocities", field.feature_id);
            continue;
        }
        let mean = speeds.iter().sum::<f64>() / speeds.len() as f64;
        let max = speeds.iter().copied().fold(0.0, f64::max);
        println!(
            "  🚀 {}: {} points, mean {mean:.2} cm/yr, max {max:.2} cm/yr",
            field.feature_id,
            speeds.len()
        );
    }
}
