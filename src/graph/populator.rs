//! Extraction of total reconstruction sequences from features

use super::builder::{PoleSample, ReconstructionGraphBuilder, TotalReconstructionSequence};
use crate::feature::finder::find_plate_id;
use crate::feature::{names, Feature, IrregularSampling, PropertyValue};

/// Counts of what happened to the features offered to the populator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    /// Sequences inserted into the graph
    pub inserted: usize,
    /// Sequence-like features that were not well-formed
    pub skipped: usize,
}

/// Quick structural check: both reference frames present and at least one
/// finite rotation sample (enabled or not).
pub fn can_process(feature: &Feature) -> bool {
    let has_fixed = find_plate_id(feature, names::FIXED_REFERENCE_FRAME, None).is_some();
    let has_moving = find_plate_id(feature, names::MOVING_REFERENCE_FRAME, None).is_some();
    let has_rotation = find_pole_sampling(feature).is_some_and(|s| {
        s.samples.iter().any(|sample| sample.value.as_finite_rotation().is_some())
    });
    has_fixed && has_moving && has_rotation
}

/// Extract the sequence a feature describes.
///
/// Returns `None` when the fixed or moving frame is missing or fewer than two
/// enabled finite-rotation samples exist. Disabled samples are dropped and the
/// rest are ordered most recent first.
pub fn extract_total_reconstruction_sequence(
    feature: &Feature,
) -> Option<TotalReconstructionSequence> {
    let fixed_plate_id = find_plate_id(feature, names::FIXED_REFERENCE_FRAME, None)?;
    let moving_plate_id = find_plate_id(feature, names::MOVING_REFERENCE_FRAME, None)?;
    let sampling = find_pole_sampling(feature)?;

    let mut pole_samples: Vec<PoleSample> = sampling
        .enabled_samples()
        .filter_map(|s| {
            let rotation = s.value.resolve_at(None)?.as_finite_rotation()?;
            Some(PoleSample { time: s.time, rotation: *rotation })
        })
        .collect();

    if pole_samples.len() < 2 {
        return None;
    }

    // Most recent first; stable so equal times keep file order
    pole_samples.sort_by(|a, b| {
        if a.time.is_strictly_later_than(&b.time) {
            std::cmp::Ordering::Less
        } else if a.time.is_strictly_earlier_than(&b.time) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });

    Some(TotalReconstructionSequence { fixed_plate_id, moving_plate_id, pole_samples })
}

/// Insert every well-formed sequence among `features` into `builder`.
///
/// Malformed sequence features are skipped silently apart from the count.
pub fn populate_graph<'a>(
    builder: &mut ReconstructionGraphBuilder,
    features: impl IntoIterator<Item = &'a Feature>,
) -> PopulateSummary {
    let mut summary = PopulateSummary::default();

    for feature in features {
        match extract_total_reconstruction_sequence(feature) {
            Some(sequence) => {
                builder.insert_sequence(sequence);
                summary.inserted += 1;
            }
            None if can_process(feature) || is_sequence_type(feature) => {
                log::debug!("skipping malformed total reconstruction sequence `{}`", feature.id());
                summary.skipped += 1;
            }
            None => {}
        }
    }

    log::debug!(
        "populated reconstruction graph: {} sequences inserted, {} skipped",
        summary.inserted,
        summary.skipped
    );
    summary
}

fn is_sequence_type(feature: &Feature) -> bool {
    feature
        .feature_type()
        .is(crate::feature::FeatureType::TOTAL_RECONSTRUCTION_SEQUENCE)
}

fn find_pole_sampling(feature: &Feature) -> Option<&IrregularSampling> {
    fn unwrap_sampling(value: &PropertyValue) -> Option<&IrregularSampling> {
        match value {
            PropertyValue::IrregularSampling(sampling) => Some(sampling),
            PropertyValue::ConstantValue { value, .. } => unwrap_sampling(value),
            _ => None,
        }
    }

    feature
        .properties_named(names::TOTAL_RECONSTRUCTION_POLE)
        .find_map(unwrap_sampling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureType, TimeSample};
    use crate::geometry::FiniteRotation;

    fn sequence_feature(id: &str, samples: Vec<TimeSample>) -> Feature {
        Feature::new(id, FeatureType::TOTAL_RECONSTRUCTION_SEQUENCE)
            .with_property(names::FIXED_REFERENCE_FRAME, PropertyValue::PlateId(0))
            .with_property(names::MOVING_REFERENCE_FRAME, PropertyValue::PlateId(701))
            .with_property(
                names::TOTAL_RECONSTRUCTION_POLE,
                PropertyValue::IrregularSampling(IrregularSampling::new(samples)),
            )
    }

    fn pole(time: f64, angle: f64) -> TimeSample {
        let rotation = FiniteRotation::from_euler_pole_degrees(50.0, -30.0, angle);
        TimeSample::new(PropertyValue::FiniteRotation(rotation), time)
    }

    #[test]
    fn extracts_enabled_samples_most_recent_first() {
        let feature =
            sequence_feature("trs", vec![pole(20.0, 10.0), pole(0.0, 0.0), pole(10.0, 5.0)]);
        let sequence = extract_total_reconstruction_sequence(&feature).unwrap();

        assert_eq!(sequence.fixed_plate_id, 0);
        assert_eq!(sequence.moving_plate_id, 701);
        let times: Vec<f64> = sequence.pole_samples.iter().filter_map(|s| s.time.value()).collect();
        assert_eq!(times, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn one_enabled_sample_is_rejected() {
        let feature = sequence_feature("trs", vec![pole(0.0, 0.0), pole(10.0, 5.0).disabled()]);

        assert!(can_process(&feature));
        assert!(extract_total_reconstruction_sequence(&feature).is_none());

        let mut builder = ReconstructionGraphBuilder::new();
        let summary = populate_graph(&mut builder, [&feature]);
        assert_eq!(summary, PopulateSummary { inserted: 0, skipped: 1 });
        assert_eq!(builder.build().num_edges(), 0);
    }

    #[test]
    fn missing_reference_frame_cannot_be_processed() {
        let feature = Feature::new("trs", FeatureType::TOTAL_RECONSTRUCTION_SEQUENCE)
            .with_property(names::FIXED_REFERENCE_FRAME, PropertyValue::PlateId(0))
            .with_property(
                names::TOTAL_RECONSTRUCTION_POLE,
                PropertyValue::IrregularSampling(IrregularSampling::new(vec![
                    pole(0.0, 0.0),
                    pole(10.0, 1.0),
                ])),
            );

        assert!(!can_process(&feature));
        assert!(extract_total_reconstruction_sequence(&feature).is_none());
    }

    #[test]
    fn unrelated_features_are_ignored_without_counting() {
        let coastline = Feature::new("coast", "gpml:Coastline");
        let mut builder = ReconstructionGraphBuilder::new();

        let summary = populate_graph(&mut builder, [&coastline]);
        assert_eq!(summary, PopulateSummary::default());
    }
}
