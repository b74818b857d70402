//! Reconstruction tree: absolute plate rotations at one instant
//!
//! A [`ReconstructionTree`] is resolved eagerly from a [`ReconstructionGraph`]
//! for one `(time, anchor plate)` pair and is immutable afterwards, so it can
//! be shared read-only by every feature processor of that time step.
//!
//! Plates are resolved breadth-first outward from the anchor, so each plate
//! hangs off the anchor through the fewest edges. Each edge's pole samples are
//! interpolated at the reconstruction time and composed down the tree:
//!
//! ```text
//! abs(P) = abs(parent(P)) ∘ rel(P → parent(P))
//! ```
//!
//! When no forward edge of a plate leads to an already resolved plate, edges
//! where it is the *fixed* plate are walked in reverse, so any plate can act as
//! anchor:
//!
//! ```text
//! abs(P) = abs(M) ∘ rel(M → P)⁻¹
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::{FiniteRotation, PlateId};
use crate::graph::{EdgeId, PoleSample, ReconstructionGraph, ReconstructionGraphEdge};
use crate::time::GeoTimeInstant;

/// How to order several candidate parent edges of the same moving plate.
///
/// Only candidates whose fixed plate is already in the tree compete, so a
/// shorter path to the anchor always wins over the policy. A candidate with no
/// rotation at the reconstruction time is skipped in favour of the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeTieBreak {
    /// The edge inserted into the graph first
    #[default]
    FirstInserted,
    /// The edge with the lowest fixed plate id, insertion order among equals
    LowestFixedPlateId,
}

/// Interpolate an edge's pole samples (most recent first) at `time`.
///
/// Returns `None` when `time` is later than the most recent sample or older
/// than the oldest one. A sample coincident with `time` is returned exactly.
pub fn interpolate_sequence(
    samples: &[PoleSample],
    time: &GeoTimeInstant,
) -> Option<FiniteRotation> {
    let most_recent = samples.first()?;
    if time.is_strictly_later_than(&most_recent.time) {
        return None;
    }

    if let Some(sample) = samples.iter().find(|s| s.time.is_coincident_with(time)) {
        return Some(sample.rotation);
    }

    samples.windows(2).find_map(|pair| {
        let (younger, older) = (&pair[0], &pair[1]);
        let bracketed = time.is_strictly_earlier_than(&younger.time)
            && time.is_strictly_later_than(&older.time);
        if !bracketed {
            return None;
        }
        // A sentinel-timed bracket has no interpolation parameter
        let (younger_time, older_time) = (younger.time.value()?, older.time.value()?);
        let target = time.value()?;
        Some(FiniteRotation::interpolate(
            &older.rotation,
            &younger.rotation,
            older_time,
            younger_time,
            target,
        ))
    })
}

/// The edge a plate was resolved through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub edge_id: EdgeId,
    pub plate_id: PlateId,
    /// True if the edge was walked from its fixed plate to its moving plate
    pub reversed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ResolvedPlate {
    rotation: FiniteRotation,
    parent: Option<ParentLink>,
}

/// Resolved absolute rotations of every plate for one `(time, anchor)` pair
#[derive(Debug, Clone)]
pub struct ReconstructionTree {
    reconstruction_time: GeoTimeInstant,
    anchor_plate_id: PlateId,
    plates: BTreeMap<PlateId, ResolvedPlate>,
    unreachable: Vec<PlateId>,
}

impl ReconstructionTree {
    /// Resolve every plate of `graph` at `time` relative to `anchor_plate_id`
    pub fn resolve(
        graph: &ReconstructionGraph,
        time: GeoTimeInstant,
        anchor_plate_id: PlateId,
        policy: EdgeTieBreak,
    ) -> Self {
        let mut resolver = Resolver::new(graph, time, anchor_plate_id, policy);
        resolver.run(anchor_plate_id);

        let unreachable: Vec<PlateId> = graph
            .plate_ids()
            .into_iter()
            .filter(|plate_id| !resolver.resolved.contains_key(plate_id))
            .collect();

        log::debug!(
            "resolved reconstruction tree at {time} (anchor {anchor_plate_id}): \
             {} plates, {} unreachable",
            resolver.resolved.len(),
            unreachable.len()
        );

        Self {
            reconstruction_time: time,
            anchor_plate_id,
            plates: resolver.resolved.into_iter().collect(),
            unreachable,
        }
    }

    /// The absolute rotation of `plate_id` and whether it reached the anchor.
    ///
    /// A plate without a path to the anchor yields the identity and `false`.
    pub fn get_composed_absolute_rotation(&self, plate_id: PlateId) -> (FiniteRotation, bool) {
        match self.plates.get(&plate_id) {
            Some(resolved) => (resolved.rotation, true),
            None => (FiniteRotation::identity(), false),
        }
    }

    /// The absolute rotation of `plate_id`, if it reached the anchor
    pub fn absolute_rotation(&self, plate_id: PlateId) -> Option<&FiniteRotation> {
        self.plates.get(&plate_id).map(|r| &r.rotation)
    }

    /// The edge `plate_id` was resolved through; `None` for the anchor
    pub fn parent_link(&self, plate_id: PlateId) -> Option<ParentLink> {
        self.plates.get(&plate_id).and_then(|r| r.parent)
    }

    /// The plate `plate_id` hangs off in the tree
    pub fn parent_plate_id(&self, plate_id: PlateId) -> Option<PlateId> {
        self.parent_link(plate_id).map(|link| link.plate_id)
    }

    /// Graph plates with no path to the anchor, ascending
    pub fn unreachable_plate_ids(&self) -> &[PlateId] {
        &self.unreachable
    }

    /// Resolved plate ids, ascending
    pub fn plate_ids(&self) -> impl Iterator<Item = PlateId> + '_ {
        self.plates.keys().copied()
    }

    /// The time this tree was resolved at
    pub fn reconstruction_time(&self) -> GeoTimeInstant {
        self.reconstruction_time
    }

    /// The plate every rotation is relative to
    pub fn anchor_plate_id(&self) -> PlateId {
        self.anchor_plate_id
    }

    /// Number of resolved plates, anchor included
    pub fn len(&self) -> usize {
        self.plates.len()
    }

    /// Always false once resolved, the anchor is always present
    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }
}

/// Breadth-first resolution state for one tree.
///
/// Plates are resolved in layers outward from the anchor. A plate joins a
/// layer through an edge to a plate of an earlier layer, preferring edges where
/// it is the moving plate over edges walked in reverse.
struct Resolver<'g> {
    graph: &'g ReconstructionGraph,
    time: GeoTimeInstant,
    policy: EdgeTieBreak,
    resolved: HashMap<PlateId, ResolvedPlate>,
    relative: HashMap<EdgeId, Option<FiniteRotation>>,
}

impl<'g> Resolver<'g> {
    fn new(
        graph: &'g ReconstructionGraph,
        time: GeoTimeInstant,
        anchor: PlateId,
        policy: EdgeTieBreak,
    ) -> Self {
        let mut resolved = HashMap::new();
        let root = ResolvedPlate { rotation: FiniteRotation::identity(), parent: None };
        resolved.insert(anchor, root);
        Self { graph, time, policy, resolved, relative: HashMap::new() }
    }

    fn relative_rotation(&mut self, edge: &ReconstructionGraphEdge) -> Option<FiniteRotation> {
        let time = self.time;
        *self
            .relative
            .entry(edge.id)
            .or_insert_with(|| interpolate_sequence(&edge.pole_samples, &time))
    }

    fn run(&mut self, anchor: PlateId) {
        let graph = self.graph;
        let mut frontier = vec![anchor];

        while !frontier.is_empty() {
            let mut neighbours = BTreeSet::new();
            for &plate_id in &frontier {
                neighbours.extend(graph.edges_for_fixed_plate(plate_id).map(|e| e.moving_plate_id));
                neighbours.extend(graph.edges_for_moving_plate(plate_id).map(|e| e.fixed_plate_id));
            }

            // Decide the whole layer before committing it so that a plate only
            // ever hangs off a plate of an earlier layer
            let mut layer = Vec::new();
            for plate_id in neighbours {
                if self.resolved.contains_key(&plate_id) {
                    continue;
                }
                let resolved = self
                    .resolve_through_moving_edges(plate_id)
                    .or_else(|| self.resolve_through_fixed_edges(plate_id));
                if let Some(resolved) = resolved {
                    layer.push((plate_id, resolved));
                }
            }

            frontier = layer.iter().map(|&(plate_id, _)| plate_id).collect();
            self.resolved.extend(layer);
        }
    }

    fn resolve_through_moving_edges(&mut self, plate_id: PlateId) -> Option<ResolvedPlate> {
        let graph = self.graph;
        let mut candidates: Vec<&ReconstructionGraphEdge> = graph
            .edges_for_moving_plate(plate_id)
            .filter(|edge| self.resolved.contains_key(&edge.fixed_plate_id))
            .collect();

        if self.policy == EdgeTieBreak::LowestFixedPlateId {
            candidates.sort_by_key(|edge| edge.fixed_plate_id);
        }

        for edge in candidates {
            let Some(relative) = self.relative_rotation(edge) else { continue };
            let parent = self.resolved.get(&edge.fixed_plate_id)?.rotation;
            log::trace!(
                "plate {plate_id} resolved through fixed plate {} (edge {})",
                edge.fixed_plate_id,
                edge.id
            );
            return Some(ResolvedPlate {
                rotation: FiniteRotation::compose(&parent, &relative),
                parent: Some(ParentLink {
                    edge_id: edge.id,
                    plate_id: edge.fixed_plate_id,
                    reversed: false,
                }),
            });
        }
        None
    }

    fn resolve_through_fixed_edges(&mut self, plate_id: PlateId) -> Option<ResolvedPlate> {
        let graph = self.graph;
        let candidates: Vec<&ReconstructionGraphEdge> = graph
            .edges_for_fixed_plate(plate_id)
            .filter(|edge| self.resolved.contains_key(&edge.moving_plate_id))
            .collect();

        for edge in candidates {
            let Some(relative) = self.relative_rotation(edge) else { continue };
            let child = self.resolved.get(&edge.moving_plate_id)?.rotation;
            log::trace!(
                "plate {plate_id} resolved in reverse through moving plate {}",
                edge.moving_plate_id
            );
            return Some(ResolvedPlate {
                rotation: FiniteRotation::compose(&child, &relative.inverse()),
                parent: Some(ParentLink {
                    edge_id: edge.id,
                    plate_id: edge.moving_plate_id,
                    reversed: true,
                }),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointOnSphere;
    use crate::graph::ReconstructionGraphBuilder;

    const TOLERANCE: f64 = 1e-9;

    fn rotation(angle: f64) -> FiniteRotation {
        FiniteRotation::from_euler_pole_degrees(60.0, 20.0, angle)
    }

    fn samples(times_and_angles: &[(f64, f64)]) -> Vec<PoleSample> {
        times_and_angles.iter().map(|&(t, a)| PoleSample::new(t, rotation(a))).collect()
    }

    fn at(t: f64) -> GeoTimeInstant {
        GeoTimeInstant::new(t)
    }

    fn insert(
        builder: &mut ReconstructionGraphBuilder,
        fixed: PlateId,
        moving: PlateId,
        times_and_angles: &[(f64, f64)],
    ) {
        builder.insert_total_reconstruction_sequence(fixed, moving, samples(times_and_angles));
    }

    #[test]
    fn coincident_sample_is_returned_exactly() {
        let seq = samples(&[(0.0, 0.0), (10.0, 5.0), (20.0, 12.0)]);
        let resolved = interpolate_sequence(&seq, &at(10.0)).unwrap();
        assert_eq!(resolved.quat(), seq[1].rotation.quat());
    }

    #[test]
    fn bracketed_time_interpolates_between_samples() {
        let seq = samples(&[(0.0, 0.0), (10.0, 5.0), (20.0, 12.0)]);
        let resolved = interpolate_sequence(&seq, &at(15.0)).unwrap();

        let angle = resolved.angle().to_degrees();
        assert!(angle > 5.0 && angle < 12.0, "angle {angle} not bracketed");
        assert!((angle - 8.5).abs() < 1e-6);

        let near_younger = interpolate_sequence(&seq, &at(10.0 + 1e-4)).unwrap();
        assert!(near_younger.quat_is_equivalent(&seq[1].rotation, 1e-4));
        let near_older = interpolate_sequence(&seq, &at(20.0 - 1e-4)).unwrap();
        assert!(near_older.quat_is_equivalent(&seq[2].rotation, 1e-4));
    }

    #[test]
    fn times_outside_the_sequence_produce_nothing() {
        let seq = samples(&[(5.0, 1.0), (10.0, 5.0)]);
        assert!(interpolate_sequence(&seq, &at(2.0)).is_none());
        assert!(interpolate_sequence(&seq, &at(11.0)).is_none());
        assert!(interpolate_sequence(&[], &at(0.0)).is_none());
    }

    #[test]
    fn interpolation_keeps_older_axis_hint() {
        let hint = PointOnSphere::from_lat_lon_degrees(-45.0, 90.0);
        let seq = vec![
            PoleSample::new(0.0, FiniteRotation::identity()),
            PoleSample::new(10.0, rotation(4.0).with_axis_hint(Some(hint))),
        ];
        let resolved = interpolate_sequence(&seq, &at(5.0)).unwrap();
        assert_eq!(resolved.axis_hint(), Some(hint));
    }

    fn chain_graph() -> ReconstructionGraph {
        let mut builder = ReconstructionGraphBuilder::new();
        insert(&mut builder, 0, 701, &[(0.0, 0.0), (100.0, 30.0)]);
        insert(&mut builder, 701, 801, &[(0.0, 0.0), (100.0, 10.0)]);
        builder.build()
    }

    #[test]
    fn absolute_rotation_composes_up_the_chain() {
        let graph = chain_graph();
        let tree = ReconstructionTree::resolve(&graph, at(50.0), 0, EdgeTieBreak::default());

        let rel_701 = interpolate_sequence(&graph.edges()[0].pole_samples, &at(50.0)).unwrap();
        let rel_801 = interpolate_sequence(&graph.edges()[1].pole_samples, &at(50.0)).unwrap();
        let expected = FiniteRotation::compose(&rel_701, &rel_801);

        let (abs_801, reached) = tree.get_composed_absolute_rotation(801);
        assert!(reached);
        assert!(abs_801.quat_is_equivalent(&expected, TOLERANCE));
        assert_eq!(tree.parent_plate_id(801), Some(701));
        assert_eq!(tree.parent_plate_id(701), Some(0));
        assert!(tree.absolute_rotation(0).unwrap().is_identity());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn unknown_plate_yields_identity_without_reaching_anchor() {
        let tree =
            ReconstructionTree::resolve(&chain_graph(), at(50.0), 0, EdgeTieBreak::default());
        let (rotation, reached) = tree.get_composed_absolute_rotation(999);
        assert!(!reached);
        assert!(rotation.is_identity());
    }

    #[test]
    fn plates_not_yet_born_are_unreachable() {
        let mut builder = ReconstructionGraphBuilder::new();
        insert(&mut builder, 0, 701, &[(0.0, 0.0), (100.0, 30.0)]);
        insert(&mut builder, 701, 802, &[(20.0, 0.0), (100.0, 10.0)]);
        let tree =
            ReconstructionTree::resolve(&builder.build(), at(10.0), 0, EdgeTieBreak::default());

        assert_eq!(tree.unreachable_plate_ids(), &[802]);
        assert!(tree.absolute_rotation(701).is_some());
    }

    fn ambiguous_graph() -> ReconstructionGraph {
        let mut builder = ReconstructionGraphBuilder::new();
        insert(&mut builder, 0, 501, &[(0.0, 0.0), (100.0, 20.0)]);
        insert(&mut builder, 0, 502, &[(0.0, 0.0), (100.0, 30.0)]);
        insert(&mut builder, 502, 801, &[(0.0, 0.0), (100.0, 10.0)]);
        insert(&mut builder, 501, 801, &[(0.0, 0.0), (100.0, 10.0)]);
        builder.build()
    }

    #[test]
    fn tie_break_policy_selects_parent_edge() {
        let graph = ambiguous_graph();

        let first = ReconstructionTree::resolve(&graph, at(50.0), 0, EdgeTieBreak::FirstInserted);
        assert_eq!(first.parent_plate_id(801), Some(502));
        assert!((first.absolute_rotation(801).unwrap().angle().to_degrees() - 20.0).abs() < 1e-6);

        let lowest =
            ReconstructionTree::resolve(&graph, at(50.0), 0, EdgeTieBreak::LowestFixedPlateId);
        assert_eq!(lowest.parent_plate_id(801), Some(501));
        assert!((lowest.absolute_rotation(801).unwrap().angle().to_degrees() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn fewest_edges_to_the_anchor_win_over_insertion_order() {
        let mut builder = ReconstructionGraphBuilder::new();
        insert(&mut builder, 0, 501, &[(0.0, 0.0), (100.0, 20.0)]);
        insert(&mut builder, 501, 801, &[(0.0, 0.0), (100.0, 10.0)]);
        insert(&mut builder, 0, 801, &[(0.0, 0.0), (100.0, 40.0)]);
        let tree =
            ReconstructionTree::resolve(&builder.build(), at(50.0), 0, EdgeTieBreak::FirstInserted);

        assert_eq!(tree.parent_plate_id(801), Some(0));
        assert_eq!(tree.parent_plate_id(501), Some(0));
    }

    #[test]
    fn tie_break_falls_back_when_preferred_edge_has_no_rotation() {
        let mut builder = ReconstructionGraphBuilder::new();
        insert(&mut builder, 0, 501, &[(0.0, 0.0), (100.0, 20.0)]);
        insert(&mut builder, 0, 502, &[(0.0, 0.0), (100.0, 30.0)]);
        // Preferred by insertion order but not active at 50 Ma
        insert(&mut builder, 501, 801, &[(60.0, 0.0), (100.0, 10.0)]);
        insert(&mut builder, 502, 801, &[(0.0, 0.0), (100.0, 10.0)]);
        let tree =
            ReconstructionTree::resolve(&builder.build(), at(50.0), 0, EdgeTieBreak::FirstInserted);

        assert_eq!(tree.parent_plate_id(801), Some(502));
    }

    #[test]
    fn plate_only_reachable_through_its_child_is_resolved_in_reverse() {
        let mut builder = ReconstructionGraphBuilder::new();
        insert(&mut builder, 901, 801, &[(0.0, 0.0), (100.0, 10.0)]);
        insert(&mut builder, 0, 801, &[(0.0, 0.0), (100.0, 40.0)]);
        let tree =
            ReconstructionTree::resolve(&builder.build(), at(50.0), 0, EdgeTieBreak::FirstInserted);

        assert_eq!(tree.parent_plate_id(801), Some(0));
        let link = tree.parent_link(901).unwrap();
        assert_eq!((link.plate_id, link.reversed), (801, true));
        assert!(tree.unreachable_plate_ids().is_empty());
    }

    #[test]
    fn any_plate_can_be_the_anchor() {
        let graph = chain_graph();
        let tree = ReconstructionTree::resolve(&graph, at(50.0), 701, EdgeTieBreak::default());

        let rel_701 = interpolate_sequence(&graph.edges()[0].pole_samples, &at(50.0)).unwrap();
        let (abs_0, reached) = tree.get_composed_absolute_rotation(0);
        assert!(reached);
        assert!(abs_0.quat_is_equivalent(&rel_701.inverse(), TOLERANCE));
        assert_eq!(tree.parent_link(0).map(|l| l.reversed), Some(true));
        assert!(tree.absolute_rotation(701).unwrap().is_identity());
        assert_eq!(tree.parent_plate_id(801), Some(701));
    }

    #[test]
    fn cycles_terminate_as_unreachable() {
        let mut builder = ReconstructionGraphBuilder::new();
        insert(&mut builder, 2, 1, &[(0.0, 0.0), (100.0, 10.0)]);
        insert(&mut builder, 1, 2, &[(0.0, 0.0), (100.0, 10.0)]);
        let tree =
            ReconstructionTree::resolve(&builder.build(), at(50.0), 0, EdgeTieBreak::default());

        assert_eq!(tree.unreachable_plate_ids(), &[1, 2]);
        assert_eq!(tree.len(), 1);
    }

    /// Two rails of plates joined by rungs in both directions
    fn ladder_graph(rungs: PlateId) -> ReconstructionGraph {
        let mut builder = ReconstructionGraphBuilder::new();
        let seq = || samples(&[(0.0, 0.0), (100.0, 10.0)]);
        for i in 0..rungs {
            let (a, b) = (100 + i, 200 + i);
            builder.insert_total_reconstruction_sequence(a, a + 1, seq());
            builder.insert_total_reconstruction_sequence(b, b + 1, seq());
            builder.insert_total_reconstruction_sequence(a, b, seq());
            builder.insert_total_reconstruction_sequence(b + 1, a, seq());
        }
        builder.build()
    }

    #[test]
    fn cyclic_component_without_the_anchor_resolves_quickly() {
        let graph = ladder_graph(40);
        let started = std::time::Instant::now();
        let tree = ReconstructionTree::resolve(&graph, at(50.0), 0, EdgeTieBreak::default());

        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(tree.unreachable_plate_ids().len(), graph.plate_ids().len());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn cyclic_component_containing_the_anchor_is_fully_resolved() {
        let graph = ladder_graph(40);
        let tree = ReconstructionTree::resolve(&graph, at(50.0), 120, EdgeTieBreak::default());

        assert!(tree.unreachable_plate_ids().is_empty());
        assert_eq!(tree.len(), graph.plate_ids().len());
        for plate_id in graph.plate_ids() {
            let mut hops = 0;
            let mut current = plate_id;
            while let Some(parent) = tree.parent_plate_id(current) {
                current = parent;
                hops += 1;
                assert!(hops <= tree.len(), "parent links of {plate_id} loop");
            }
            assert_eq!(current, 120);
        }
    }
}
