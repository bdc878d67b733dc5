use std::collections::HashSet;

use drp_core::VertexHash;
use drp_hashgraph::HashGraph;

/// Consumes `(HashGraph, origin, subgraph)` and emits a deterministic
/// sequence of surviving operation vertices, skipping the root and any
/// inert (`value === null`) vertices.
///
/// Implementations must be pure functions of the graph and its resolvers —
/// no I/O, no wall-clock reads — so that every peer that linearizes the
/// same subgraph produces the same order (P4).
pub trait Linearizer {
    fn linearize(
        &self,
        graph: &mut HashGraph,
        origin: Option<&VertexHash>,
        subgraph: Option<&HashSet<VertexHash>>,
    ) -> Vec<VertexHash>;
}
