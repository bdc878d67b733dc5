use std::collections::HashSet;

use drp_core::{ConflictAction, VertexHash};
use drp_hashgraph::HashGraph;

use crate::trait_def::Linearizer;

/// Multiple-semantics linearizer: a single conflict set may involve many
/// vertices, so the resolver returns a set of vertex hashes to drop rather
/// than a binary verdict on a single pair. The outer/inner scan structure
/// otherwise matches the pair linearizer.
#[derive(Default)]
pub struct MultipleLinearizer;

impl Linearizer for MultipleLinearizer {
    fn linearize(
        &self,
        graph: &mut HashGraph,
        origin: Option<&VertexHash>,
        subgraph: Option<&HashSet<VertexHash>>,
    ) -> Vec<VertexHash> {
        let order = graph.topological_sort(false, origin, subgraph);
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
                match graph.resolve_conflicts(&[vi, vj]) {
                    ConflictAction::Drop(set) => {
                        for (idx, hash) in order.iter().enumerate() {
                            if set.contains(hash) {
                                dropped[idx] = true;
                            }
                        }
                    }
                    ConflictAction::DropLeft => dropped[i] = true,
                    ConflictAction::DropRight => dropped[j] = true,
                    ConflictAction::Nop | ConflictAction::Swap => {}
                }
                j += 1;
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

#[cfg(test)]
mod tests {
    use super::*;
    use drp_core::{DrpType, Operation, PeerId, SemanticsType};
    use drp_hashgraph::{ConflictResolver, HashGraphConfig, Vertex};
    use std::collections::BTreeSet;

    /// Drops every concurrent vertex but the one with the lowest value.
    struct KeepMinResolver;
    impl ConflictResolver for KeepMinResolver {
        fn resolve(&self, vertices: &[&Vertex]) -> ConflictAction {
            let value_of = |v: &Vertex| -> u8 {
                v.operation
                    .as_ref()
                    .and_then(|op| op.value.as_ref())
                    .and_then(|args| args.first())
                    .and_then(|bytes| bytes.first())
                    .copied()
                    .unwrap_or(0)
            };
            let (a, b) = (vertices[0], vertices[1]);
            if value_of(a) <= value_of(b) {
                ConflictAction::Drop(BTreeSet::from([b.hash.clone()]))
            } else {
                ConflictAction::Drop(BTreeSet::from([a.hash.clone()]))
            }
        }
    }

    fn op(value: u8) -> Operation {
        Operation {
            drp_type: DrpType::Drp,
            op_type: "add".into(),
            value: Some(vec![vec![value]]),
        }
    }

    #[test]
    fn only_minimum_concurrent_value_survives() {
        let mut graph = HashGraph::new(
            PeerId::from("peer-a"),
            None,
            Some(Box::new(KeepMinResolver)),
            SemanticsType::Multiple,
            HashGraphConfig::default(),
        );
        let root = drp_core::root_hash();
        for v in [5u8, 1, 3] {
            let vertex = graph.create_vertex(Some(op(v)), vec![root.clone()], v as i64);
            graph.add_vertex(vertex).unwrap();
        }

        let linearizer = MultipleLinearizer;
        let order = linearizer.linearize(&mut graph, None, None);
        assert_eq!(order.len(), 1);
        let survivor = graph.get_vertex(&order[0]).unwrap();
        let value = survivor.operation.as_ref().unwrap().value.as_ref().unwrap()[0][0];
        assert_eq!(value, 1);
    }
}
