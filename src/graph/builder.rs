//! Reconstruction graph and its builder

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::{FiniteRotation, PlateId};
use crate::time::GeoTimeInstant;

/// One enabled finite-rotation sample of a total reconstruction sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoleSample {
    pub time: GeoTimeInstant,
    pub rotation: FiniteRotation,
}

impl PoleSample {
    /// A rotation sample at `time`
    pub fn new(time: impl Into<GeoTimeInstant>, rotation: FiniteRotation) -> Self {
        Self { time: time.into(), rotation }
    }
}

/// The relative rotation history of a moving plate with respect to a fixed plate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalReconstructionSequence {
    pub fixed_plate_id: PlateId,
    pub moving_plate_id: PlateId,
    /// Enabled samples, most recent (smallest time) first
    pub pole_samples: Vec<PoleSample>,
}

/// Position of an edge in insertion order
pub type EdgeId = usize;

/// A plate-pair edge: the sampled rotation of `moving_plate_id` relative to
/// `fixed_plate_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionGraphEdge {
    pub id: EdgeId,
    pub fixed_plate_id: PlateId,
    pub moving_plate_id: PlateId,
    pub pole_samples: Vec<PoleSample>,
}

/// Directed graph of relative plate rotations.
///
/// Edges are indexed by moving plate (candidate parents, in insertion order)
/// and by fixed plate (for reverse traversal when the anchor is not a root).
#[derive(Debug, Clone, Default)]
pub struct ReconstructionGraph {
    edges: Vec<ReconstructionGraphEdge>,
    by_moving_plate: HashMap<PlateId, Vec<EdgeId>>,
    by_fixed_plate: HashMap<PlateId, Vec<EdgeId>>,
}

impl ReconstructionGraph {
    /// Every edge, indexed by [`EdgeId`]
    pub fn edges(&self) -> &[ReconstructionGraphEdge] {
        &self.edges
    }

    /// The edge with id `id`
    pub fn edge(&self, id: EdgeId) -> Option<&ReconstructionGraphEdge> {
        self.edges.get(id)
    }

    /// Edges whose moving plate is `plate_id`, in insertion order
    pub fn edges_for_moving_plate(
        &self,
        plate_id: PlateId,
    ) -> impl Iterator<Item = &ReconstructionGraphEdge> {
        self.by_moving_plate
            .get(&plate_id)
            .into_iter()
            .flatten()
            .map(|&id| &self.edges[id])
    }

    /// Edges whose fixed plate is `plate_id`, in insertion order
    pub fn edges_for_fixed_plate(
        &self,
        plate_id: PlateId,
    ) -> impl Iterator<Item = &ReconstructionGraphEdge> {
        self.by_fixed_plate
            .get(&plate_id)
            .into_iter()
            .flatten()
            .map(|&id| &self.edges[id])
    }

    /// Number of edges in the graph
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// True if the graph has no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every plate id mentioned by an edge, ascending
    pub fn plate_ids(&self) -> BTreeSet<PlateId> {
        self.edges
            .iter()
            .flat_map(|e| [e.fixed_plate_id, e.moving_plate_id])
            .collect()
    }
}

/// Accumulates total reconstruction sequences into a [`ReconstructionGraph`]
#[derive(Debug, Default)]
pub struct ReconstructionGraphBuilder {
    graph: ReconstructionGraph,
}

impl ReconstructionGraphBuilder {
    /// An empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an edge. Edges may arrive in any order and several may share a
    /// moving plate; no validation happens here.
    pub fn insert_total_reconstruction_sequence(
        &mut self,
        fixed_plate_id: PlateId,
        moving_plate_id: PlateId,
        pole_samples: Vec<PoleSample>,
    ) {
        let id = self.graph.edges.len();
        log::trace!(
            "edge {id}: moving plate {moving_plate_id} relative to fixed plate {fixed_plate_id}"
        );

        let edge = ReconstructionGraphEdge { id, fixed_plate_id, moving_plate_id, pole_samples };
        self.graph.edges.push(edge);
        self.graph.by_moving_plate.entry(moving_plate_id).or_default().push(id);
        self.graph.by_fixed_plate.entry(fixed_plate_id).or_default().push(id);
    }

    /// Append the edge an extracted sequence describes
    pub fn insert_sequence(&mut self, sequence: TotalReconstructionSequence) {
        self.insert_total_reconstruction_sequence(
            sequence.fixed_plate_id,
            sequence.moving_plate_id,
            sequence.pole_samples,
        );
    }

    /// Number of edges inserted so far
    pub fn num_edges(&self) -> usize {
        self.graph.num_edges()
    }

    /// Finish building
    pub fn build(self) -> ReconstructionGraph {
        self.graph
    }
}
