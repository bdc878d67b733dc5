use std::collections::HashMap;

use drp_acl::{AclConflictResolver, ObjectAcl};
use drp_core::{root_hash, DrpError, DrpType, Operation, SemanticsType, Timestamp, VertexHash};
use drp_finality::{FinalityConfig, FinalityStore};
use drp_hashgraph::{ConflictResolver, HashGraph, HashGraphConfig, Vertex};
use drp_linearize::{Linearizer, MultipleLinearizer, PairLinearizer};
use drp_state::{Drp, StateManager};
use tracing::{info, warn};

use crate::signer::Signer;

/// Whether `caller` may perform `operation` against the ACL state as it
/// stood just before the operation's dependencies. `grant`/`revoke` are
/// admin-only; `setKey` only requires finality-signer standing, matching
/// [`ObjectAcl::set_key`]'s own internal check — this gate exists so a
/// locally-intercepted call and the same vertex arriving over gossip are
/// authorized identically (I8).
fn is_authorized(pre_acl: &ObjectAcl, caller: &drp_core::PeerId, operation: &Operation) -> bool {
    match operation.drp_type {
        DrpType::Acl if operation.op_type == drp_acl::OP_SET_KEY => pre_acl.query_is_finality_signer(caller),
        DrpType::Acl => pre_acl.query_is_admin(caller),
        DrpType::Drp => pre_acl.query_is_writer(caller),
    }
}

/// Where a batch of vertices notified to subscribers came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

/// Outcome of [`VertexApplier::apply_vertices`].
#[derive(Debug, Default)]
pub struct ApplyResult {
    pub applied: bool,
    pub missing: Vec<VertexHash>,
}

type Subscriber = Box<dyn FnMut(Origin, &[VertexHash]) + Send>;

/// The sole mutator of a `HashGraph` and its `StateManager`. Owns the live
/// DRP and ACL instances, intercepts local operations into signed vertices,
/// and admits remote vertices via validate → authorize → apply → re-finalize.
pub struct VertexApplier<D: Drp> {
    graph: HashGraph,
    state: StateManager<D>,
    finality: FinalityStore,
    drp: D,
    acl: ObjectAcl,
    signer: Box<dyn Signer + Send>,
    drp_linearizer: Box<dyn Linearizer>,
    acl_linearizer: PairLinearizer,
    subscribers: Vec<Subscriber>,
}

impl<D: Drp> VertexApplier<D> {
    pub fn new(
        drp: D,
        acl: ObjectAcl,
        drp_resolver: Box<dyn ConflictResolver>,
        semantics: SemanticsType,
        signer: Box<dyn Signer + Send>,
    ) -> Self {
        let local_peer_id = signer.peer_id();
        let acl_resolver = Box::new(AclConflictResolver::new(acl.resolution()));
        let graph = HashGraph::new(local_peer_id, Some(acl_resolver), Some(drp_resolver), semantics, HashGraphConfig::default());

        let mut finality = FinalityStore::new(FinalityConfig::default());
        finality.initialize(root_hash(), acl.query_finality_group());

        let drp_linearizer: Box<dyn Linearizer> = match semantics {
            SemanticsType::Pair => Box::new(PairLinearizer),
            SemanticsType::Multiple => Box::new(MultipleLinearizer),
        };

        Self {
            graph,
            state: StateManager::new(drp.clone(), acl.clone()),
            finality,
            drp,
            acl,
            signer,
            drp_linearizer,
            acl_linearizer: PairLinearizer,
            subscribers: Vec::new(),
        }
    }

    pub fn graph(&self) -> &HashGraph {
        &self.graph
    }

    pub fn drp(&self) -> &D {
        &self.drp
    }

    pub fn acl(&self) -> &ObjectAcl {
        &self.acl
    }

    pub fn finality(&self) -> &FinalityStore {
        &self.finality
    }

    /// Signs `hash` with this peer's own BLS finality key. Exposed so a
    /// node can produce its own attestation over a vertex it has admitted
    /// before handing it to [`Self::finality_mut`].
    pub fn sign_bls(&self, hash: &VertexHash) -> Result<[u8; drp_core::BLS_SIGNATURE_LEN], DrpError> {
        self.signer.sign_bls(hash)
    }

    pub fn finality_mut(&mut self) -> &mut FinalityStore {
        &mut self.finality
    }

    pub fn get_states(&self, hash: &VertexHash) -> (Option<&ObjectAcl>, Option<&D>) {
        (self.state.get_acl_state(hash), self.state.get_drp_state(hash))
    }

    pub fn set_acl_state(&mut self, hash: VertexHash, acl: ObjectAcl) {
        self.state.set_acl_state(hash, acl);
    }

    pub fn set_drp_state(&mut self, hash: VertexHash, drp: D) {
        self.state.set_drp_state(hash, drp);
    }

    pub fn subscribe(&mut self, callback: Subscriber) {
        self.subscribers.push(callback);
    }

    fn notify(&mut self, origin: Origin, vertices: &[VertexHash]) {
        for callback in &mut self.subscribers {
            callback(origin, vertices);
        }
    }

    // ── 4.7.1 Local operation interception ──────────────────────────────────

    pub fn call_drp(&mut self, op_type: &str, value: Option<Vec<Vec<u8>>>, now: Timestamp) -> Result<(), DrpError> {
        self.call(DrpType::Drp, op_type, value, now)
    }

    pub fn call_acl(&mut self, op_type: &str, value: Option<Vec<Vec<u8>>>, now: Timestamp) -> Result<(), DrpError> {
        self.call(DrpType::Acl, op_type, value, now)
    }

    fn call(&mut self, drp_type: DrpType, op_type: &str, value: Option<Vec<Vec<u8>>>, now: Timestamp) -> Result<(), DrpError> {
        let frontier = self.graph.frontier();
        let timestamp = frontier
            .iter()
            .filter_map(|h| self.graph.get_vertex(h))
            .map(|v| v.timestamp)
            .fold(now, Timestamp::max);

        let operation = Operation { drp_type, op_type: op_type.to_string(), value };

        let pre_drp = self.drp.clone();
        let pre_acl = self.acl.clone();
        let caller = self.graph.local_peer_id().clone();

        if !is_authorized(&pre_acl, &caller, &operation) {
            return Err(DrpError::UnauthorizedOperation {
                peer: caller.to_string(),
                op_type: op_type.to_string(),
            });
        }

        let result = match drp_type {
            DrpType::Drp => self.drp.apply(&caller, &operation),
            DrpType::Acl => self.acl.apply(&caller, &operation),
        };
        if let Err(err) = result {
            self.drp = pre_drp;
            self.acl = pre_acl;
            return Err(err);
        }

        let mut vertex = self.graph.create_vertex(Some(operation), frontier, timestamp);
        vertex.signature = Some(self.signer.sign(&vertex.hash)?);

        self.graph.add_vertex(vertex.clone())?;
        self.state.record(vertex.hash.clone(), self.drp.clone(), self.acl.clone());
        self.finality.initialize(vertex.hash.clone(), pre_acl.query_finality_group());

        info!(hash = %vertex.hash, peer = %caller, "local vertex applied");
        self.notify(Origin::Local, std::slice::from_ref(&vertex.hash));
        Ok(())
    }

    // ── 4.7.2 Remote vertex application ─────────────────────────────────────

    /// Admits `vertices` in an order consistent with their dependencies.
    /// Vertices whose dependencies are not yet known are skipped and their
    /// hashes reported in `missing`; everything else is validated,
    /// authorized against its LCA pre-state, and applied.
    pub fn apply_vertices(&mut self, vertices: Vec<Vertex>, now: Timestamp) -> ApplyResult {
        let mut result = ApplyResult::default();
        let mut pending: HashMap<VertexHash, Vertex> = vertices.into_iter().map(|v| (v.hash.clone(), v)).collect();
        let mut applied_hashes = Vec::new();

        loop {
            let ready: Vec<VertexHash> = pending
                .values()
                .filter(|v| v.dependencies.iter().all(|d| self.graph.contains(d) || !pending.contains_key(d)))
                .map(|v| v.hash.clone())
                .collect();
            if ready.is_empty() {
                break;
            }

            let mut progressed = false;
            for hash in ready {
                let vertex = match pending.remove(&hash) {
                    Some(v) => v,
                    None => continue,
                };
                progressed = true;

                if self.graph.contains(&vertex.hash) {
                    continue;
                }

                let missing_deps: Vec<VertexHash> =
                    vertex.dependencies.iter().filter(|d| !self.graph.contains(d)).cloned().collect();
                if !missing_deps.is_empty() {
                    result.missing.extend(missing_deps);
                    continue;
                }

                match self.admit_remote_vertex(vertex, now) {
                    Ok(true) => {
                        applied_hashes.push(hash);
                        result.applied = true;
                    }
                    Ok(false) => {}
                    Err(err) => {
                        warn!(hash = %hash, error = %err, "rejecting remote vertex");
                    }
                }
            }
            if !progressed {
                break;
            }
        }

        result.missing.extend(pending.into_keys());

        if !applied_hashes.is_empty() {
            self.refresh_live_state_at_frontier();
            self.notify(Origin::Remote, &applied_hashes);
        }
        result
    }

    fn admit_remote_vertex(&mut self, vertex: Vertex, now: Timestamp) -> Result<bool, DrpError> {
        if !vertex.is_root() {
            if vertex.timestamp > now {
                return Err(DrpError::InvalidTimestamp { got: vertex.timestamp, dep: now });
            }
            let signature = vertex
                .signature
                .as_ref()
                .ok_or_else(|| DrpError::InvalidSignature(vertex.hash.to_string()))?;
            let recovered = drp_crypto::recover_peer_id(vertex.hash.as_str().as_bytes(), signature)
                .map_err(|_| DrpError::InvalidSignature(vertex.hash.to_string()))?;
            if recovered != vertex.peer_id {
                return Err(DrpError::InvalidSignature(vertex.hash.to_string()));
            }
        }

        let (_pre_drp, pre_acl) = self.state.reconstruct(
            &mut self.graph,
            self.drp_linearizer.as_ref(),
            &self.acl_linearizer,
            &vertex.dependencies,
        )?;

        if let Some(operation) = &vertex.operation {
            if !is_authorized(&pre_acl, &vertex.peer_id, operation) {
                return Err(DrpError::UnauthorizedOperation {
                    peer: vertex.peer_id.to_string(),
                    op_type: operation.op_type.clone(),
                });
            }
        }

        let hash = vertex.hash.clone();
        let peer_id = vertex.peer_id.clone();
        self.graph.add_vertex(vertex)?;

        let (drp_state, acl_state) = self.state.reconstruct(
            &mut self.graph,
            self.drp_linearizer.as_ref(),
            &self.acl_linearizer,
            &[hash.clone()],
        )?;
        self.finality.initialize(hash.clone(), pre_acl.query_finality_group());
        self.state.record(hash.clone(), drp_state, acl_state);

        info!(hash = %hash, peer = %peer_id, "remote vertex applied");
        Ok(true)
    }

    /// Recomputes the live DRP/ACL instances from the current frontier, per
    /// the LCA-replay contract (§4.7.3).
    fn refresh_live_state_at_frontier(&mut self) {
        let frontier = self.graph.frontier();
        match self.state.reconstruct(&mut self.graph, self.drp_linearizer.as_ref(), &self.acl_linearizer, &frontier) {
            Ok((drp, acl)) => {
                self.drp = drp;
                self.acl = acl;
            }
            Err(err) => warn!(error = %err, "failed to refresh live state at frontier"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drp_acl::ConflictResolutionPolicy;
    use drp_core::{ConflictAction, PeerId};

    #[derive(Clone, Default)]
    struct Counter {
        value: i64,
    }
    impl Drp for Counter {
        fn apply(&mut self, _caller: &PeerId, operation: &Operation) -> Result<(), DrpError> {
            if operation.op_type == "add" {
                let delta = operation.value.as_ref().and_then(|v| v.first()).and_then(|b| b.first()).copied().unwrap_or(0);
                self.value += delta as i64;
            }
            Ok(())
        }
    }

    struct NeverConflicts;
    impl ConflictResolver for NeverConflicts {
        fn resolve(&self, _vertices: &[&Vertex]) -> ConflictAction {
            ConflictAction::Nop
        }
    }

    fn signer() -> Box<dyn Signer + Send> {
        Box::new(crate::local_signer::LocalSigner::generate().unwrap())
    }

    fn new_applier(admin: PeerId, local_signer: Box<dyn Signer + Send>) -> VertexApplier<Counter> {
        let acl = ObjectAcl::new(vec![admin], false, ConflictResolutionPolicy::GrantWins);
        VertexApplier::new(Counter::default(), acl, Box::new(NeverConflicts), SemanticsType::Pair, local_signer)
    }

    #[test]
    fn local_call_emits_a_signed_vertex_and_mutates_state() {
        let signer = signer();
        let peer = signer.peer_id();
        let mut applier = new_applier(peer.clone(), signer);

        applier.call_drp("add", Some(vec![vec![5]]), 100).unwrap();

        assert_eq!(applier.drp().value, 5);
        assert_eq!(applier.graph().len(), 2);
        let frontier = applier.graph().frontier();
        let vertex = applier.graph().get_vertex(&frontier[0]).unwrap();
        assert!(vertex.signature.is_some());
        assert_eq!(vertex.peer_id, peer);
    }

    #[test]
    fn demoted_writer_cannot_call_drp_locally() {
        let signer = signer();
        let peer = signer.peer_id();
        // `admin` alone is seeded into the ACL; `peer` has never held writer
        // rights, simulating a peer whose writer grant was revoked by a
        // remote-merged vertex before this call.
        let admin = PeerId::from("the-actual-admin");
        let mut applier = new_applier(admin, signer);

        let err = applier.call_drp("add", Some(vec![vec![5]]), 100).unwrap_err();
        assert!(matches!(err, DrpError::UnauthorizedOperation { peer: p, .. } if p == peer.to_string()));
        assert_eq!(applier.drp().value, 0);
        assert_eq!(applier.graph().len(), 1);
    }

    #[test]
    fn non_writer_cannot_apply_remote_vertex() {
        let admin_signer = signer();
        let admin = admin_signer.peer_id();
        let mut applier = new_applier(admin, admin_signer);

        let outsider_signer = signer();
        let outsider = outsider_signer.peer_id();
        let dependencies = vec![drp_core::root_hash()];
        let operation = Operation { drp_type: DrpType::Drp, op_type: "add".into(), value: Some(vec![vec![9]]) };
        let timestamp = 1;
        let hash = drp_crypto::vertex_hash(Some(&operation), &dependencies, &outsider, timestamp);
        let mut vertex = Vertex {
            hash,
            peer_id: outsider.clone(),
            operation: Some(operation),
            dependencies,
            timestamp,
            signature: None,
        };
        vertex.signature = Some(outsider_signer.sign(&vertex.hash).unwrap());

        let result = applier.apply_vertices(vec![vertex], 10);
        assert!(!result.applied);
        assert!(result.missing.is_empty());
        assert_eq!(applier.drp().value, 0);
    }

    #[test]
    fn apply_vertices_reports_missing_dependencies() {
        let signer = signer();
        let peer = signer.peer_id();
        let mut applier = new_applier(peer.clone(), signer);

        let dangling = VertexHash("f".repeat(64));
        let operation = Operation { drp_type: DrpType::Drp, op_type: "add".into(), value: Some(vec![vec![1]]) };
        let vertex = applier.graph().create_vertex(Some(operation), vec![dangling.clone()], 1);

        let result = applier.apply_vertices(vec![vertex], 10);
        assert!(!result.applied);
        assert_eq!(result.missing, vec![dangling]);
    }
}
