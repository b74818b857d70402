//! Reconstruction graph: relative plate rotations extracted from
//! total reconstruction sequence features

pub mod builder;
pub mod populator;

pub use builder::{
    EdgeId,
    PoleSample,
    ReconstructionGraph,
    ReconstructionGraphBuilder,
    ReconstructionGraphEdge,
    TotalReconstructionSequence,
};
pub use populator::{
    can_process, extract_total_reconstruction_sequence, populate_graph, PopulateSummary,
};

use crate::feature::FeatureStore;

impl ReconstructionGraph {
    /// Build a graph from every well-formed sequence feature in `store`
    pub fn from_store(store: &FeatureStore) -> (ReconstructionGraph, PopulateSummary) {
        let mut builder = ReconstructionGraphBuilder::new();
        let summary = populate_graph(&mut builder, store.iter().map(|(_, feature)| feature));
        (builder.build(), summary)
    }
}
