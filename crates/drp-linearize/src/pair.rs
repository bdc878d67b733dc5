use std::collections::HashSet;

use drp_core::{ConflictAction, VertexHash};
use drp_hashgraph::HashGraph;
use tracing::trace;

use crate::trait_def::Linearizer;

/// Pair-semantics linearizer: conflict resolution is a binary function on
/// two concurrent vertices. Walks the topological order left to right,
/// comparing each not-yet-dropped vertex against every later vertex
/// concurrent with it.
#[derive(Default)]
pub struct PairLinearizer;

impl Linearizer for PairLinearizer {
    fn linearize(
        &self,
        graph: &mut HashGraph,
        origin: Option<&VertexHash>,
        subgraph: Option<&HashSet<VertexHash>>,
    ) -> Vec<VertexHash> {
        let mut order = graph.topological_sort(false, origin, subgraph);
        let n = order.len();
        let mut dropped = vec![false; n];

        let mut i = 0;
        while i < n {
            if dropped[i] {
                i += 1;
                continue;
            }
            let mut j = i + 1;
            while j < n {
                if dropped[j] {
                    j += 1;
                    continue;
                }
                if !graph.is_concurrent(&order[i], &order[j]) {
                    j += 1;
                    continue;
                }

                let vi = graph.get_vertex(&order[i]).expect("vertex in topo order exists");
                let vj = graph.get_vertex(&order[j]).expect("vertex in topo order exists");
                let action = graph.resolve_conflicts(&[vi, vj]);

                match action {
                    ConflictAction::Nop => {
                        j += 1;
                    }
                    ConflictAction::DropLeft => {
                        dropped[i] = true;
                        break;
                    }
                    ConflictAction::DropRight => {
                        dropped[j] = true;
                        j += 1;
                    }
                    ConflictAction::Swap => {
                        trace!(a = %order[i], b = %order[j], "linearizer swap");
                        graph.swap_reachable_predecessors(&order[i], &order[j]);
                        order.swap(i, j);
                        j = i + 1;
                    }
                    ConflictAction::Drop(set) => {
                        // Not emitted by pair resolvers, but handled for
                        // robustness: treat as dropping every named hash.
                        for (idx, hash) in order.iter().enumerate() {
                            if set.contains(hash) {
                                dropped[idx] = true;
                            }
                        }
                        j += 1;
                    }
                }
            }
            i += 1;
        }

        order
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| !dropped[*idx])
            .map(|(_, hash)| hash)
            .filter(|hash| !graph.get_vertex(hash).map(|v| v.is_inert()).unwrap_or(true))
            .collect()
    }
}
