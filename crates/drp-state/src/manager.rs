use std::collections::{HashMap, HashSet};

use drp_acl::ObjectAcl;
use drp_core::{root_hash, DrpError, DrpType, VertexHash};
use drp_hashgraph::HashGraph;
use drp_linearize::Linearizer;
use tracing::debug;

use crate::drp_trait::Drp;

/// Per-vertex snapshots of the DRP and ACL state, plus LCA-based
/// reconstruction for replay. Seeded at the root hash with the object's
/// genesis states.
pub struct StateManager<D: Drp> {
    drp_states: HashMap<VertexHash, D>,
    acl_states: HashMap<VertexHash, ObjectAcl>,
}

impl<D: Drp> StateManager<D> {
    pub fn new(genesis_drp: D, genesis_acl: ObjectAcl) -> Self {
        let root = root_hash();
        let mut drp_states = HashMap::new();
        let mut acl_states = HashMap::new();
        drp_states.insert(root.clone(), genesis_drp);
        acl_states.insert(root, genesis_acl);
        Self { drp_states, acl_states }
    }

    pub fn get_drp_state(&self, hash: &VertexHash) -> Option<&D> {
        self.drp_states.get(hash)
    }

    pub fn get_acl_state(&self, hash: &VertexHash) -> Option<&ObjectAcl> {
        self.acl_states.get(hash)
    }

    /// Records the post-state pair for a newly accepted vertex (I6).
    pub fn record(&mut self, hash: VertexHash, drp: D, acl: ObjectAcl) {
        self.drp_states.insert(hash.clone(), drp);
        self.acl_states.insert(hash, acl);
    }

    /// External override, per the Object façade's `setDRPState`/`setACLState`.
    pub fn set_drp_state(&mut self, hash: VertexHash, drp: D) {
        self.drp_states.insert(hash, drp);
    }

    pub fn set_acl_state(&mut self, hash: VertexHash, acl: ObjectAcl) {
        self.acl_states.insert(hash, acl);
    }

    /// Reconstructs `(drp, acl)` as of just before `dependencies` by
    /// replaying every vertex causally between the dependencies' LCA
    /// (exclusive) and the dependencies themselves (inclusive) onto the
    /// LCA's stored snapshot, in linearized order.
    ///
    /// `drp_linearizer` must match the graph's configured `drp_semantics`
    /// (Pair or Multiple); the ACL is always linearized with `Pair`
    /// semantics per its own conflict resolver.
    pub fn reconstruct(
        &self,
        graph: &mut HashGraph,
        drp_linearizer: &dyn Linearizer,
        acl_linearizer: &dyn Linearizer,
        dependencies: &[VertexHash],
    ) -> Result<(D, ObjectAcl), DrpError> {
        let lca = graph
            .lowest_common_ancestor(dependencies)
            .unwrap_or_else(root_hash);

        let mut drp = self
            .get_drp_state(&lca)
            .cloned()
            .ok_or_else(|| DrpError::StateNotFound(lca.to_string()))?;
        let mut acl = self
            .get_acl_state(&lca)
            .cloned()
            .ok_or_else(|| DrpError::StateNotFound(lca.to_string()))?;

        let subgraph: HashSet<VertexHash> = graph
            .topological_sort(false, Some(&lca), None)
            .into_iter()
            .filter(|h| *h != lca)
            .filter(|h| dependencies.iter().any(|target| graph.is_ancestor(h, target)))
            .collect();

        if subgraph.is_empty() {
            return Ok((drp, acl));
        }

        let acl_subgraph: HashSet<VertexHash> = subgraph
            .iter()
            .filter(|h| {
                graph
                    .get_vertex(h)
                    .and_then(|v| v.operation.as_ref())
                    .map(|op| op.drp_type == DrpType::Acl)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        let drp_subgraph: HashSet<VertexHash> = subgraph.difference(&acl_subgraph).cloned().collect();

        for hash in acl_linearizer.linearize(graph, None, Some(&acl_subgraph)) {
            let vertex = graph.get_vertex(&hash).ok_or_else(|| DrpError::UnknownVertex(hash.to_string()))?;
            if let Some(operation) = &vertex.operation {
                debug!(hash = %hash, op_type = %operation.op_type, "replaying acl operation");
                acl.apply(&vertex.peer_id, operation)?;
            }
        }

        for hash in drp_linearizer.linearize(graph, None, Some(&drp_subgraph)) {
            let vertex = graph.get_vertex(&hash).ok_or_else(|| DrpError::UnknownVertex(hash.to_string()))?;
            if let Some(operation) = &vertex.operation {
                debug!(hash = %hash, op_type = %operation.op_type, "replaying drp operation");
                drp.apply(&vertex.peer_id, operation)?;
            }
        }

        Ok((drp, acl))
    }
}
