//! One time step of a reconstruction
//!
//! A [`Reconstructor`] owns the rotation graph built from a feature store and
//! turns the store into a [`Reconstruction`] for any real time. The order of
//! work within a step is fixed: the tree is resolved first, then ordinary
//! features are reconstructed, then topological boundaries are assembled from
//! those results, then velocity fields are sampled against the boundaries.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ReconstructionConfig;
use crate::error::{ReconstructionError, Result};
use crate::feature::{names, Feature, FeatureHandle, FeatureId, FeatureStore, FeatureType};
use crate::geometry::{GeometryOnSphere, PlateId, PointOnSphere};
use crate::graph::{PopulateSummary, ReconstructionGraph};
use crate::processors::{
    calculate_velocity_field,
    is_active_at,
    is_scalar_coverage_feature,
    reconstruct_feature,
    reconstruct_scalar_coverages,
    reconstruct_vgp,
    MultiPointVectorField,
    ReconstructedFeatureGeometry,
    ReconstructedScalarCoverage,
    ReconstructedVirtualGeomagneticPole,
    VgpRenderSettings,
    VirtualGeomagneticPole,
};
use crate::time::GeoTimeInstant;
use crate::topology::{resolve_topological_boundary, ResolvedTopologicalBoundary, SectionLookup};
use crate::tree::ReconstructionTree;

/// Any output of a reconstruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReconstructionGeometry {
    FeatureGeometry(ReconstructedFeatureGeometry),
    TopologicalBoundary(ResolvedTopologicalBoundary),
    VirtualGeomagneticPole(ReconstructedVirtualGeomagneticPole),
    ScalarCoverage(ReconstructedScalarCoverage),
    VectorField(MultiPointVectorField),
}

impl ReconstructionGeometry {
    /// Handle of the feature this output came from
    pub fn feature_handle(&self) -> FeatureHandle {
        match self {
            ReconstructionGeometry::FeatureGeometry(g) => g.feature_handle,
            ReconstructionGeometry::TopologicalBoundary(b) => b.feature_handle,
            ReconstructionGeometry::VirtualGeomagneticPole(p) => p.feature_handle,
            ReconstructionGeometry::ScalarCoverage(c) => c.feature_handle,
            ReconstructionGeometry::VectorField(f) => f.feature_handle,
        }
    }

    /// Id of the feature this output came from
    pub fn feature_id(&self) -> &FeatureId {
        match self {
            ReconstructionGeometry::FeatureGeometry(g) => &g.feature_id,
            ReconstructionGeometry::TopologicalBoundary(b) => &b.feature_id,
            ReconstructionGeometry::VirtualGeomagneticPole(p) => &p.feature_id,
            ReconstructionGeometry::ScalarCoverage(c) => &c.feature_id,
            ReconstructionGeometry::VectorField(f) => &f.feature_id,
        }
    }

    /// The reconstructed feature geometry, if this is one
    pub fn as_feature_geometry(&self) -> Option<&ReconstructedFeatureGeometry> {
        match self {
            ReconstructionGeometry::FeatureGeometry(g) => Some(g),
            _ => None,
        }
    }

    /// The resolved boundary, if this is one
    pub fn as_topological_boundary(&self) -> Option<&ResolvedTopologicalBoundary> {
        match self {
            ReconstructionGeometry::TopologicalBoundary(b) => Some(b),
            _ => None,
        }
    }

    /// The geometry shown for this output at the reconstruction time
    pub fn geometry(&self) -> GeometryOnSphere {
        match self {
            ReconstructionGeometry::FeatureGeometry(g) => g.geometry.clone(),
            ReconstructionGeometry::TopologicalBoundary(b) => b.as_polygon().into(),
            ReconstructionGeometry::VirtualGeomagneticPole(p) => p.pole_position.into(),
            ReconstructionGeometry::ScalarCoverage(c) => c.domain.clone(),
            ReconstructionGeometry::VectorField(f) => f.domain.clone().into(),
        }
    }

    /// `Some(closeness)` when `point` lies within `tolerance` radians
    pub fn test_proximity(&self, point: &PointOnSphere, tolerance: f64) -> Option<f64> {
        match self {
            ReconstructionGeometry::FeatureGeometry(g) => {
                g.geometry.test_proximity(point, tolerance)
            }
            ReconstructionGeometry::ScalarCoverage(c) => c.domain.test_proximity(point, tolerance),
            _ => self.geometry().test_proximity(point, tolerance),
        }
    }
}

/// What happened to the features that produced no output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconstructionDiagnostics {
    /// Dropped because their plate had no path to the anchor
    pub missing_rotation: usize,
    /// Outside their valid time
    pub inactive: usize,
    /// Lacking required properties, or with unusable property values
    pub malformed: usize,
    /// Sections of resolved boundaries that could not be used as given
    pub unresolved_sections: usize,
    /// Resolved boundaries whose own plate id is missing or has no rotation
    pub unanchored_boundaries: usize,
    /// Rotation sequence features left out of the graph
    pub skipped_rotation_sequences: usize,
    /// Plates in the graph with no path to the anchor at this time
    pub unreachable_plate_ids: Vec<PlateId>,
}

impl ReconstructionDiagnostics {
    /// Features that produced no output for a reason other than valid time
    pub fn dropped_features(&self) -> usize {
        self.missing_rotation + self.malformed
    }
}

/// All outputs of one time step
#[derive(Debug, Clone)]
pub struct Reconstruction {
    reconstruction_time: GeoTimeInstant,
    anchor_plate_id: PlateId,
    tree: Arc<ReconstructionTree>,
    geometries: Vec<ReconstructionGeometry>,
    by_feature: HashMap<FeatureHandle, Vec<usize>>,
    diagnostics: ReconstructionDiagnostics,
}

impl Reconstruction {
    fn new(tree: Arc<ReconstructionTree>) -> Self {
        Self {
            reconstruction_time: tree.reconstruction_time(),
            anchor_plate_id: tree.anchor_plate_id(),
            diagnostics: ReconstructionDiagnostics {
                unreachable_plate_ids: tree.unreachable_plate_ids().to_vec(),
                ..Default::default()
            },
            tree,
            geometries: Vec::new(),
            by_feature: HashMap::new(),
        }
    }

    fn push(&mut self, geometry: ReconstructionGeometry) {
        self.by_feature.entry(geometry.feature_handle()).or_default().push(self.geometries.len());
        self.geometries.push(geometry);
    }

    /// The time of this step
    pub fn reconstruction_time(&self) -> GeoTimeInstant {
        self.reconstruction_time
    }

    /// The plate every output is relative to
    pub fn anchor_plate_id(&self) -> PlateId {
        self.anchor_plate_id
    }

    /// The tree every output of this step was reconstructed with
    pub fn tree(&self) -> &Arc<ReconstructionTree> {
        &self.tree
    }

    /// Outputs in production order
    pub fn geometries(&self) -> &[ReconstructionGeometry] {
        &self.geometries
    }

    /// Number of outputs of every kind
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// True if nothing was reconstructed
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Every output produced from the feature behind `handle`
    pub fn geometries_for_feature(
        &self,
        handle: FeatureHandle,
    ) -> impl Iterator<Item = &ReconstructionGeometry> {
        self.by_feature
            .get(&handle)
            .into_iter()
            .flatten()
            .map(move |&i| &self.geometries[i])
    }

    /// Reconstructed geometries of the feature behind `handle`
    pub fn feature_geometries_for(
        &self,
        handle: FeatureHandle,
    ) -> impl Iterator<Item = &ReconstructedFeatureGeometry> {
        self.geometries_for_feature(handle).filter_map(ReconstructionGeometry::as_feature_geometry)
    }

    /// Every reconstructed feature geometry
    pub fn feature_geometries(&self) -> impl Iterator<Item = &ReconstructedFeatureGeometry> {
        self.geometries.iter().filter_map(ReconstructionGeometry::as_feature_geometry)
    }

    /// Every resolved topological boundary
    pub fn resolved_boundaries(&self) -> impl Iterator<Item = &ResolvedTopologicalBoundary> {
        self.geometries.iter().filter_map(ReconstructionGeometry::as_topological_boundary)
    }

    /// Every reconstructed virtual geomagnetic pole
    pub fn virtual_geomagnetic_poles(
        &self,
    ) -> impl Iterator<Item = &ReconstructedVirtualGeomagneticPole> {
        self.geometries.iter().filter_map(|g| match g {
            ReconstructionGeometry::VirtualGeomagneticPole(p) => Some(p),
            _ => None,
        })
    }

    /// Every velocity field
    pub fn vector_fields(&self) -> impl Iterator<Item = &MultiPointVectorField> {
        self.geometries.iter().filter_map(|g| match g {
            ReconstructionGeometry::VectorField(f) => Some(f),
            _ => None,
        })
    }

    /// Hit test: every output within `tolerance` radians of `point`, closest first
    pub fn geometries_near(
        &self,
        point: &PointOnSphere,
        tolerance: f64,
    ) -> Vec<(&ReconstructionGeometry, f64)> {
        let mut hits: Vec<(&ReconstructionGeometry, f64)> = self
            .geometries
            .iter()
            .filter_map(|g| Some((g, g.test_proximity(point, tolerance)?)))
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits
    }

    /// Counts of features that produced no output
    pub fn diagnostics(&self) -> &ReconstructionDiagnostics {
        &self.diagnostics
    }
}

/// How one feature took part in the per-feature pass
#[derive(Debug)]
enum FeatureOutcome {
    Reconstructed(Vec<ReconstructionGeometry>),
    /// Rotation data, or a kind of feature with nothing to show
    Ignored,
    /// Handled after ordinary features
    Topological,
    MeshNode,
    Inactive,
    Hidden,
    MissingRotation,
    Malformed,
}

fn is_topological(feature: &Feature) -> bool {
    feature.feature_type().is(FeatureType::TOPOLOGICAL_CLOSED_PLATE_BOUNDARY)
        || feature
            .properties_named(names::BOUNDARY)
            .any(|v| v.resolve_at(None).and_then(|v| v.as_topological_polygon()).is_some())
}

fn process_feature(
    handle: FeatureHandle,
    feature: &Feature,
    tree: &ReconstructionTree,
    vgp_settings: &VgpRenderSettings,
) -> FeatureOutcome {
    if feature.feature_type().is(FeatureType::TOTAL_RECONSTRUCTION_SEQUENCE)
        || crate::graph::can_process(feature)
    {
        return FeatureOutcome::Ignored;
    }
    let time = tree.reconstruction_time();
    if !is_active_at(feature, &time) {
        return FeatureOutcome::Inactive;
    }
    if is_topological(feature) {
        return FeatureOutcome::Topological;
    }
    if feature.feature_type().is(FeatureType::MESH_NODE) {
        return FeatureOutcome::MeshNode;
    }

    if feature.feature_type().is(FeatureType::VIRTUAL_GEOMAGNETIC_POLE) {
        let Some(vgp) = VirtualGeomagneticPole::from_feature(feature) else {
            log::debug!(
                "feature `{}`: virtual geomagnetic pole without a pole position",
                feature.id()
            );
            return FeatureOutcome::Malformed;
        };
        if !vgp_settings.is_visible(vgp.average_age, &time) {
            return FeatureOutcome::Hidden;
        }
        return match reconstruct_vgp(handle, feature, tree, vgp_settings) {
            Some(pole) => FeatureOutcome::Reconstructed(vec![
                ReconstructionGeometry::VirtualGeomagneticPole(pole),
            ]),
            None => FeatureOutcome::MissingRotation,
        };
    }

    if is_scalar_coverage_feature(feature) {
        return match reconstruct_scalar_coverages(handle, feature, tree) {
            None => FeatureOutcome::MissingRotation,
            Some(coverages) if coverages.is_empty() => FeatureOutcome::Malformed,
            Some(coverages) => FeatureOutcome::Reconstructed(
                coverages.into_iter().map(ReconstructionGeometry::ScalarCoverage).collect(),
            ),
        };
    }

    match reconstruct_feature(handle, feature, tree) {
        None => FeatureOutcome::MissingRotation,
        Some(geometries) if geometries.is_empty() => FeatureOutcome::Ignored,
        Some(geometries) => FeatureOutcome::Reconstructed(
            geometries.into_iter().map(ReconstructionGeometry::FeatureGeometry).collect(),
        ),
    }
}

#[cfg(feature = "parallel")]
fn process_features(
    store: &FeatureStore,
    tree: &ReconstructionTree,
    vgp: &VgpRenderSettings,
) -> Vec<(FeatureHandle, FeatureOutcome)> {
    use rayon::prelude::*;

    let features: Vec<(FeatureHandle, &Feature)> = store.iter().collect();
    features
        .par_iter()
        .map(|&(handle, feature)| (handle, process_feature(handle, feature, tree, vgp)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn process_features(
    store: &FeatureStore,
    tree: &ReconstructionTree,
    vgp: &VgpRenderSettings,
) -> Vec<(FeatureHandle, FeatureOutcome)> {
    store
        .iter()
        .map(|(handle, feature)| (handle, process_feature(handle, feature, tree, vgp)))
        .collect()
}

/// Key of a cached tree: time bits and anchor
type TreeKey = (u64, PlateId);

/// Drives reconstructions of a feature store
#[derive(Debug)]
pub struct Reconstructor {
    config: ReconstructionConfig,
    graph: ReconstructionGraph,
    graph_summary: PopulateSummary,
    trees: HashMap<TreeKey, Arc<ReconstructionTree>>,
}

impl Reconstructor {
    /// Build the rotation graph from every sequence feature in `store`
    pub fn new(store: &FeatureStore, config: ReconstructionConfig) -> Result<Self> {
        config.validate()?;
        let (graph, graph_summary) = ReconstructionGraph::from_store(store);
        log::debug!(
            "built reconstruction graph: {} edges from {} sequences ({} skipped)",
            graph.num_edges(),
            graph_summary.inserted,
            graph_summary.skipped
        );
        Ok(Self { config, graph, graph_summary, trees: HashMap::new() })
    }

    /// The configuration every reconstruction uses
    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// The rotation graph built from the store's sequences
    pub fn graph(&self) -> &ReconstructionGraph {
        &self.graph
    }

    /// Sequences inserted into and skipped from the graph
    pub fn graph_summary(&self) -> PopulateSummary {
        self.graph_summary
    }

    /// Change the anchor plate for later reconstructions
    pub fn set_anchor_plate_id(&mut self, anchor_plate_id: PlateId) {
        self.config.anchor_plate_id = anchor_plate_id;
    }

    /// Rebuild the graph after sequence features in `store` changed
    pub fn rebuild_graph(&mut self, store: &FeatureStore) {
        let (graph, summary) = ReconstructionGraph::from_store(store);
        log::debug!(
            "rebuilt reconstruction graph: {} edges ({} skipped)",
            graph.num_edges(),
            summary.skipped
        );
        self.graph = graph;
        self.graph_summary = summary;
        self.trees.clear();
    }

    fn tree_key(time: f64, anchor_plate_id: PlateId) -> TreeKey {
        // 0.0 and -0.0 are the same time
        ((time + 0.0).to_bits(), anchor_plate_id)
    }

    /// The tree at `time` for the configured anchor, resolved on first use
    pub fn reconstruction_tree(&mut self, time: f64) -> Arc<ReconstructionTree> {
        let anchor = self.config.anchor_plate_id;
        let graph = &self.graph;
        let policy = self.config.edge_tie_break;
        let resolve = || Arc::new(ReconstructionTree::resolve(graph, time.into(), anchor, policy));
        self.trees.entry(Self::tree_key(time, anchor)).or_insert_with(resolve).clone()
    }

    /// Reconstruct every feature of `store` at `time`.
    ///
    /// Fails only for a non-real time. Features that cannot be reconstructed
    /// are left out and counted in [`Reconstruction::diagnostics`].
    pub fn reconstruct(
        &mut self,
        store: &FeatureStore,
        time: impl Into<GeoTimeInstant>,
    ) -> Result<Reconstruction> {
        let time: GeoTimeInstant = time.into();
        let t = match time.value() {
            Some(t) if t.is_finite() => t,
            _ => return Err(ReconstructionError::NonRealReconstructionTime(time.to_string())),
        };
        self.config.validate()?;

        let dt = self.config.velocity_delta_time;
        let anchor = self.config.anchor_plate_id;
        let mut keep = vec![Self::tree_key(t, anchor)];
        if self.config.calculate_velocities {
            keep.push(Self::tree_key(t + dt, anchor));
        }
        // Trees of other time steps are dropped once a new time is requested
        self.trees.retain(|key, _| keep.contains(key));

        let tree = self.reconstruction_tree(t);
        let mut reconstruction = Reconstruction::new(Arc::clone(&tree));
        reconstruction.diagnostics.skipped_rotation_sequences = self.graph_summary.skipped;

        let mut topological = Vec::new();
        let mut mesh_nodes = Vec::new();
        for (handle, outcome) in process_features(store, &tree, &self.config.vgp) {
            match outcome {
                FeatureOutcome::Reconstructed(geometries) => {
                    for geometry in geometries {
                        reconstruction.push(geometry);
                    }
                }
                FeatureOutcome::Topological => topological.push(handle),
                FeatureOutcome::MeshNode => mesh_nodes.push(handle),
                FeatureOutcome::Inactive => reconstruction.diagnostics.inactive += 1,
                FeatureOutcome::MissingRotation => reconstruction.diagnostics.missing_rotation += 1,
                FeatureOutcome::Malformed => reconstruction.diagnostics.malformed += 1,
                FeatureOutcome::Ignored | FeatureOutcome::Hidden => {}
            }
        }

        if self.config.resolve_topologies && !topological.is_empty() {
            let sections =
                SectionLookup::from_feature_geometries(time, reconstruction.feature_geometries())
                    .with_tree(Arc::clone(&tree));
            for handle in topological {
                let Some(feature) = store.get(handle) else { continue };
                match resolve_topological_boundary(handle, feature, &sections) {
                    Some(boundary) => {
                        // The resolver reports a missing reference frame as one extra error
                        let unanchored = usize::from(
                            boundary.plate_id.map_or(true, |id| !sections.has_rotation(id)),
                        );
                        let diagnostics = &mut reconstruction.diagnostics;
                        diagnostics.unanchored_boundaries += unanchored;
                        diagnostics.unresolved_sections += boundary.errors().len() - unanchored;
                        reconstruction.push(ReconstructionGeometry::TopologicalBoundary(boundary));
                    }
                    None => reconstruction.diagnostics.malformed += 1,
                }
            }
        }

        if self.config.calculate_velocities && !mesh_nodes.is_empty() {
            let older_tree = self.reconstruction_tree(t + dt);
            let fields: Vec<MultiPointVectorField> = {
                let boundaries: Vec<&ResolvedTopologicalBoundary> =
                    reconstruction.resolved_boundaries().collect();
                mesh_nodes
                    .into_iter()
                    .filter_map(|handle| {
                        let feature = store.get(handle)?;
                        let field = calculate_velocity_field(
                            handle,
                            feature,
                            &tree,
                            &older_tree,
                            &boundaries,
                            dt,
                        );
                        if field.is_none() {
                            log::debug!(
                                "feature `{}`: mesh node without a multi-point domain",
                                feature.id()
                            );
                        }
                        field
                    })
                    .collect()
            };
            for field in fields {
                reconstruction.push(ReconstructionGeometry::VectorField(field));
            }
        }

        log::debug!(
            "reconstructed {} geometries at {time} (anchor {anchor}); diagnostics {:?}",
            reconstruction.len(),
            reconstruction.diagnostics
        );
        Ok(reconstruction)
    }
}
