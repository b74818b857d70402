//! Resolution of topological closed plate boundaries

use std::collections::HashMap;
use std::sync::Arc;

use super::plate_polygon::{PlatePolygon, SubSegment};
use super::section::trim_section;
use crate::constants::DEDUPLICATION_EPSILON;
use crate::feature::finder::reconstruction_plate_id;
use crate::feature::{names, Feature, FeatureHandle, FeatureId, PropertyName, TopologicalSection};
use crate::geometry::polyline::push_distinct;
use crate::geometry::{distance, GeometryOnSphere, PlateId, PolylineOnSphere};
use crate::processors::ReconstructedFeatureGeometry;
use crate::time::GeoTimeInstant;
use crate::tree::ReconstructionTree;

/// A reconstructed geometry available as a topological section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionGeometry {
    pub feature_handle: FeatureHandle,
    pub property_name: PropertyName,
    pub geometry: GeometryOnSphere,
}

/// Reconstructed geometries of one time step indexed by feature id
#[derive(Debug, Clone)]
pub struct SectionLookup {
    reconstruction_time: GeoTimeInstant,
    geometries: HashMap<FeatureId, Vec<SectionGeometry>>,
    tree: Option<Arc<ReconstructionTree>>,
}

impl SectionLookup {
    /// An empty lookup for `reconstruction_time`
    pub fn new(reconstruction_time: GeoTimeInstant) -> Self {
        Self { reconstruction_time, geometries: HashMap::new(), tree: None }
    }

    /// Check boundary plate ids against `tree`; without one every plate id
    /// is taken to have a rotation
    pub fn with_tree(mut self, tree: Arc<ReconstructionTree>) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Index reconstructed feature geometries by their feature id
    pub fn from_feature_geometries<'a>(
        reconstruction_time: GeoTimeInstant,
        geometries: impl IntoIterator<Item = &'a ReconstructedFeatureGeometry>,
    ) -> Self {
        let mut lookup = Self::new(reconstruction_time);
        for rfg in geometries {
            lookup.insert(
                rfg.feature_id.clone(),
                SectionGeometry {
                    feature_handle: rfg.feature_handle,
                    property_name: rfg.property_name.clone(),
                    geometry: rfg.geometry.clone(),
                },
            );
        }
        lookup
    }

    /// Add a geometry for `feature_id` after any already present
    pub fn insert(&mut self, feature_id: FeatureId, geometry: SectionGeometry) {
        self.geometries.entry(feature_id).or_default().push(geometry);
    }

    /// The time the geometries were reconstructed at
    pub fn reconstruction_time(&self) -> GeoTimeInstant {
        self.reconstruction_time
    }

    /// False only when a tree is attached and `plate_id` has no path to its anchor
    pub fn has_rotation(&self, plate_id: PlateId) -> bool {
        self.tree.as_ref().map_or(true, |tree| tree.absolute_rotation(plate_id).is_some())
    }

    /// The geometry a section refers to: the named property if one is given,
    /// else the source feature's first reconstructed geometry
    pub fn find(&self, section: &TopologicalSection) -> Option<&SectionGeometry> {
        let candidates = self.geometries.get(&section.source)?;
        match &section.property {
            Some(name) => candidates.iter().find(|g| &g.property_name == name),
            None => candidates.first(),
        }
    }
}

struct SectionInput<'a> {
    section: &'a TopologicalSection,
    feature_handle: FeatureHandle,
    polyline: PolylineOnSphere,
}

/// Assemble the closed boundary of a topological feature from its sections'
/// reconstructed geometries.
///
/// Returns `None` for features without a topological boundary, or when fewer
/// than three ring vertices remain. Missing sections and ambiguous
/// intersections are recorded in [`PlatePolygon::errors`] and resolution
/// carries on with what is available.
pub fn resolve_topological_boundary(
    handle: FeatureHandle,
    feature: &Feature,
    sections: &SectionLookup,
) -> Option<PlatePolygon> {
    let time = sections.reconstruction_time();
    let topology = feature
        .properties_named(names::BOUNDARY)
        .find_map(|v| v.resolve_at(Some(&time))?.as_topological_polygon())?;

    let mut errors = Vec::new();
    let plate_id = reconstruction_plate_id(feature, Some(&time));
    match plate_id {
        None => errors.push("boundary has no reconstruction plate id".to_string()),
        Some(id) if !sections.has_rotation(id) => {
            errors.push(format!("boundary plate {id} has no rotation at {time}"))
        }
        Some(_) => {}
    }

    let inputs: Vec<SectionInput> = topology
        .sections
        .iter()
        .filter_map(|section| {
            let Some(found) = sections.find(section) else {
                errors.push(format!(
                    "section `{}` has no reconstructed geometry at {time}",
                    section.source
                ));
                return None;
            };
            let polyline = found.geometry.as_polyline();
            let polyline = if section.reverse { polyline.reversed() } else { polyline };
            Some(SectionInput { section, feature_handle: found.feature_handle, polyline })
        })
        .collect();

    let n = inputs.len();
    let mut vertices = Vec::new();
    let mut sub_segments: Vec<SubSegment> = Vec::with_capacity(n);

    for (i, input) in inputs.iter().enumerate() {
        let trimmed = if n < 2 {
            input.polyline.clone()
        } else {
            let prev = &inputs[(i + n - 1) % n];
            let next = &inputs[(i + 1) % n];
            let trimmed = trim_section(&input.polyline, &prev.polyline, &next.polyline, n == 2);
            if trimmed.is_ambiguous() {
                errors.push(format!(
                    "section `{}` crosses its neighbours more than once \
                     ({} before, {} after); left untrimmed",
                    input.section.source, trimmed.prev_intersections, trimmed.next_intersections
                ));
            }
            trimmed.geometry
        };

        let start = vertices.len();
        for vertex in &trimmed.vertices {
            push_distinct(&mut vertices, *vertex);
        }
        sub_segments.push(SubSegment {
            feature_handle: input.feature_handle,
            feature_id: input.section.source.clone(),
            start,
            count: vertices.len() - start,
            geometry: trimmed,
            reversed: input.section.reverse,
        });
    }

    // The ring is implicitly closed
    if vertices.len() > 1 {
        if let (Some(first), Some(last)) = (vertices.first(), vertices.last()) {
            if distance(*first, *last) < DEDUPLICATION_EPSILON {
                vertices.pop();
                if let Some(segment) = sub_segments.iter_mut().rev().find(|s| s.count > 0) {
                    segment.count -= 1;
                }
            }
        }
    }

    if !errors.is_empty() {
        log::warn!("topological boundary `{}` at {time}: {}", feature.id(), errors.join("; "));
    }
    if vertices.len() < 3 {
        log::debug!(
            "topological boundary `{}` has only {} vertices at {time}",
            feature.id(),
            vertices.len()
        );
        return None;
    }

    Some(PlatePolygon::new(
        handle,
        feature.id().clone(),
        plate_id,
        time,
        vertices,
        sub_segments,
        errors,
    ))
}
