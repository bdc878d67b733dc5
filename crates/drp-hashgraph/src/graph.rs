use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use drp_core::{ConflictAction, DrpError, DrpType, Operation, PeerId, SemanticsType, Timestamp, VertexHash};
use tracing::{debug, warn};

use crate::bitset::BitSet;
use crate::config::HashGraphConfig;
use crate::objectset::ObjectSet;
use crate::resolver::ConflictResolver;
use crate::validation::validate_vertex;
use crate::vertex::Vertex;

/// Vertex store, topological sort, causal reachability, and conflict
/// dispatch. The only structure that may mutate a `HashGraph` is the
/// applier that owns it (§4.7) — this type itself has no concept of who is
/// calling it, only append-only graph operations.
pub struct HashGraph {
    local_peer_id: PeerId,
    acl_resolver: Option<Box<dyn ConflictResolver>>,
    drp_resolver: Option<Box<dyn ConflictResolver>>,
    drp_semantics: SemanticsType,
    config: HashGraphConfig,

    vertices: HashMap<VertexHash, Vertex>,
    forward_edges: HashMap<VertexHash, Vec<VertexHash>>,
    frontier: ObjectSet,

    index_of: HashMap<VertexHash, usize>,
    hash_by_index: Vec<VertexHash>,
    pred_bits: HashMap<VertexHash, BitSet>,
}

impl HashGraph {
    pub fn new(
        local_peer_id: PeerId,
        acl_resolver: Option<Box<dyn ConflictResolver>>,
        drp_resolver: Option<Box<dyn ConflictResolver>>,
        drp_semantics: SemanticsType,
        config: HashGraphConfig,
    ) -> Self {
        let root = Vertex::root(&local_peer_id);
        let root_hash = root.hash.clone();

        let mut vertices = HashMap::new();
        vertices.insert(root_hash.clone(), root);

        let mut frontier = ObjectSet::new();
        frontier.insert(root_hash.clone());

        let mut index_of = HashMap::new();
        index_of.insert(root_hash.clone(), 0);

        let mut pred_bits = HashMap::new();
        pred_bits.insert(root_hash.clone(), BitSet::with_capacity(1));

        Self {
            local_peer_id,
            acl_resolver,
            drp_resolver,
            drp_semantics,
            config,
            vertices,
            forward_edges: HashMap::new(),
            frontier,
            index_of,
            hash_by_index: vec![root_hash],
            pred_bits,
        }
    }

    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    pub fn drp_semantics(&self) -> SemanticsType {
        self.drp_semantics
    }

    pub fn frontier(&self) -> Vec<VertexHash> {
        self.frontier.to_vec()
    }

    pub fn get_vertex(&self, hash: &VertexHash) -> Option<&Vertex> {
        self.vertices.get(hash)
    }

    pub fn contains(&self, hash: &VertexHash) -> bool {
        self.vertices.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Builds a vertex with the local peer's identity over the given
    /// dependencies; does not sign it or add it to the graph.
    pub fn create_vertex(
        &self,
        operation: Option<Operation>,
        mut dependencies: Vec<VertexHash>,
        timestamp: Timestamp,
    ) -> Vertex {
        dependencies.sort();
        dependencies.dedup();
        let hash = drp_crypto::vertex_hash(operation.as_ref(), &dependencies, &self.local_peer_id, timestamp);
        Vertex {
            hash,
            peer_id: self.local_peer_id.clone(),
            operation,
            dependencies,
            timestamp,
            signature: None,
        }
    }

    /// Admits `vertex` into the graph. Idempotent: re-adding a known hash
    /// is a no-op, not an error.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<(), DrpError> {
        if self.vertices.contains_key(&vertex.hash) {
            debug!(hash = %vertex.hash, "vertex already present, skipping");
            return Ok(());
        }

        if vertex.dependencies.len() > self.config.max_dependency_count {
            return Err(DrpError::InvalidDependencies(format!(
                "{} dependencies exceeds max {}",
                vertex.dependencies.len(),
                self.config.max_dependency_count
            )));
        }

        validate_vertex(&vertex, &self.vertices)?;

        let idx = self.hash_by_index.len();
        let mut bits = BitSet::with_capacity(idx + 1);
        for dep in &vertex.dependencies {
            if let Some(dep_bits) = self.pred_bits.get(dep) {
                bits.or_with(dep_bits);
            }
            if let Some(dep_idx) = self.index_of.get(dep) {
                bits.set(*dep_idx);
            }
        }

        for dep in &vertex.dependencies {
            self.forward_edges.entry(dep.clone()).or_default().push(vertex.hash.clone());
            self.frontier.remove(dep);
        }
        self.forward_edges.entry(vertex.hash.clone()).or_default();
        self.frontier.insert(vertex.hash.clone());

        self.index_of.insert(vertex.hash.clone(), idx);
        self.hash_by_index.push(vertex.hash.clone());
        self.pred_bits.insert(vertex.hash.clone(), bits);

        debug!(hash = %vertex.hash, peer = %vertex.peer_id, "vertex accepted");
        self.vertices.insert(vertex.hash.clone(), vertex);
        Ok(())
    }

    fn closure_bits(&self, hash: &VertexHash) -> Option<BitSet> {
        let mut bits = self.pred_bits.get(hash)?.clone();
        let idx = *self.index_of.get(hash)?;
        bits.set(idx);
        Some(bits)
    }

    fn hash_at_index(&self, idx: usize) -> Option<VertexHash> {
        self.hash_by_index.get(idx).cloned()
    }

    /// O(1) causal-reachability check via predecessor bitsets.
    pub fn are_causally_related_using_bitsets(&self, a: &VertexHash, b: &VertexHash) -> bool {
        if a == b {
            return true;
        }
        let (idx_a, idx_b) = match (self.index_of.get(a), self.index_of.get(b)) {
            (Some(ia), Some(ib)) => (*ia, *ib),
            _ => return false,
        };
        let pred_a = self.pred_bits.get(a);
        let pred_b = self.pred_bits.get(b);
        pred_a.map(|p| p.get(idx_b)).unwrap_or(false) || pred_b.map(|p| p.get(idx_a)).unwrap_or(false)
    }

    /// BFS reference oracle for causal reachability — used to cross-check
    /// the bitset implementation in tests (P2).
    pub fn are_causally_related_using_bfs(&self, a: &VertexHash, b: &VertexHash) -> bool {
        if a == b {
            return true;
        }
        self.reachable_via_dependencies(b, a) || self.reachable_via_dependencies(a, b)
    }

    fn reachable_via_dependencies(&self, from: &VertexHash, target: &VertexHash) -> bool {
        let mut stack = vec![from.clone()];
        let mut seen = HashSet::new();
        while let Some(cur) = stack.pop() {
            if !seen.insert(cur.clone()) {
                continue;
            }
            let Some(v) = self.vertices.get(&cur) else { continue };
            for dep in &v.dependencies {
                if dep == target {
                    return true;
                }
                stack.push(dep.clone());
            }
        }
        false
    }

    pub fn is_concurrent(&self, a: &VertexHash, b: &VertexHash) -> bool {
        !self.are_causally_related_using_bitsets(a, b)
    }

    /// Deterministic topological order. `origin`, when set, restricts the
    /// sort to the subgraph causally reachable from (and including)
    /// `origin`. `subgraph`, when set, further restricts to that explicit
    /// hash set. `keep_root` controls whether the root hash appears in the
    /// output.
    pub fn topological_sort(
        &self,
        keep_root: bool,
        origin: Option<&VertexHash>,
        subgraph: Option<&HashSet<VertexHash>>,
    ) -> Vec<VertexHash> {
        let eligible: HashSet<VertexHash> = self
            .vertices
            .keys()
            .filter(|h| match origin {
                Some(o) => *h == o || self.are_causally_related_using_bitsets(o, h),
                None => true,
            })
            .filter(|h| subgraph.map(|s| s.contains(*h)).unwrap_or(true))
            .cloned()
            .collect();

        let mut in_degree: HashMap<VertexHash, usize> = HashMap::new();
        for h in &eligible {
            let v = &self.vertices[h];
            let count = v.dependencies.iter().filter(|d| eligible.contains(*d)).count();
            in_degree.insert(h.clone(), count);
        }

        #[derive(Eq, PartialEq)]
        struct Candidate {
            timestamp: Timestamp,
            hash: VertexHash,
        }
        impl Ord for Candidate {
            fn cmp(&self, other: &Self) -> Ordering {
                // Reversed so BinaryHeap (a max-heap) pops the smallest
                // (timestamp, hash) pair first.
                other
                    .timestamp
                    .cmp(&self.timestamp)
                    .then_with(|| other.hash.cmp(&self.hash))
            }
        }
        impl PartialOrd for Candidate {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        let mut ready: BinaryHeap<Candidate> = BinaryHeap::new();
        for h in &eligible {
            if in_degree[h] == 0 {
                ready.push(Candidate {
                    timestamp: self.vertices[h].timestamp,
                    hash: h.clone(),
                });
            }
        }

        let mut order = Vec::with_capacity(eligible.len());
        while let Some(Candidate { hash, .. }) = ready.pop() {
            order.push(hash.clone());
            if let Some(children) = self.forward_edges.get(&hash) {
                for child in children {
                    if !eligible.contains(child) {
                        continue;
                    }
                    let deg = in_degree.get_mut(child).unwrap();
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Candidate {
                            timestamp: self.vertices[child].timestamp,
                            hash: child.clone(),
                        });
                    }
                }
            }
        }

        if keep_root {
            order
        } else {
            order.into_iter().filter(|h| !self.vertices[h].is_root()).collect()
        }
    }

    /// Exchanges the bitset columns for `a` and `b`: every stored
    /// predecessor bitset has its bits at the two vertices' indices
    /// swapped, and the two vertices' own predecessor bitsets trade
    /// places. Used by the pair linearizer's `Swap` action.
    pub fn swap_reachable_predecessors(&mut self, a: &VertexHash, b: &VertexHash) {
        let (idx_a, idx_b) = match (self.index_of.get(a), self.index_of.get(b)) {
            (Some(ia), Some(ib)) => (*ia, *ib),
            _ => return,
        };
        if idx_a == idx_b {
            return;
        }

        for bits in self.pred_bits.values_mut() {
            let bit_a = bits.get(idx_a);
            let bit_b = bits.get(idx_b);
            bits.set_to(idx_a, bit_b);
            bits.set_to(idx_b, bit_a);
        }

        if let (Some(pa), Some(pb)) = (self.pred_bits.remove(a), self.pred_bits.remove(b)) {
            self.pred_bits.insert(a.clone(), pb);
            self.pred_bits.insert(b.clone(), pa);
        }
    }

    /// Whether `ancestor` is `descendant` itself or one of its causal
    /// predecessors. Unlike [`Self::are_causally_related_using_bitsets`],
    /// which is symmetric, this distinguishes direction.
    pub fn is_ancestor(&self, ancestor: &VertexHash, descendant: &VertexHash) -> bool {
        if ancestor == descendant {
            return true;
        }
        let idx = match self.index_of.get(ancestor) {
            Some(i) => *i,
            None => return false,
        };
        self.pred_bits.get(descendant).map(|bits| bits.get(idx)).unwrap_or(false)
    }

    /// Greatest lower bound under causal reachability of the given hashes.
    pub fn lowest_common_ancestor(&self, hashes: &[VertexHash]) -> Option<VertexHash> {
        let mut iter = hashes.iter();
        let mut common = self.closure_bits(iter.next()?)?;
        for h in iter {
            let bits = self.closure_bits(h)?;
            common = common.and(&bits);
        }
        let idx = common.highest_set_bit()?;
        self.hash_at_index(idx)
    }

    /// Dispatches to the DRP or ACL conflict resolver based on the
    /// vertices' `drpType`.
    pub fn resolve_conflicts(&self, vertices: &[&Vertex]) -> ConflictAction {
        let drp_type = vertices.iter().find_map(|v| v.operation.as_ref()).map(|op| op.drp_type);
        match drp_type {
            Some(DrpType::Acl) => self
                .acl_resolver
                .as_ref()
                .map(|r| r.resolve(vertices))
                .unwrap_or_else(|| {
                    warn!("no ACL conflict resolver configured, defaulting to Nop");
                    ConflictAction::Nop
                }),
            Some(DrpType::Drp) => self
                .drp_resolver
                .as_ref()
                .map(|r| r.resolve(vertices))
                .unwrap_or_else(|| {
                    warn!("no DRP conflict resolver configured, defaulting to Nop");
                    ConflictAction::Nop
                }),
            None => ConflictAction::Nop,
        }
    }
}
