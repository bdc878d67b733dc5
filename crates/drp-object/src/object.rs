use drp_acl::ObjectAcl;
use drp_core::{DrpError, SemanticsType, Timestamp, VertexHash};
use drp_hashgraph::{ConflictResolver, HashGraph, Vertex};
use drp_state::Drp;

use crate::applier::{ApplyResult, Origin, VertexApplier};
use crate::signer::Signer;

/// Public surface consumed by node-level code: wraps a [`VertexApplier`] and
/// exposes the operations a peer uses to drive one replicated object.
pub struct Object<D: Drp> {
    pub id: VertexHash,
    applier: VertexApplier<D>,
}

impl<D: Drp> Object<D> {
    /// Creates a new object seeded with `drp`/`acl` genesis state.
    pub fn create_object(
        drp: D,
        acl: ObjectAcl,
        drp_resolver: Box<dyn ConflictResolver>,
        semantics: SemanticsType,
        signer: Box<dyn Signer + Send>,
    ) -> Self {
        let applier = VertexApplier::new(drp, acl, drp_resolver, semantics, signer);
        let id = applier.graph().frontier().into_iter().next().unwrap_or_else(drp_core::root_hash);
        Self { id, applier }
    }

    pub fn graph(&self) -> &HashGraph {
        self.applier.graph()
    }

    pub fn drp(&self) -> &D {
        self.applier.drp()
    }

    pub fn acl(&self) -> &ObjectAcl {
        self.applier.acl()
    }

    pub fn vertices(&self) -> Vec<&Vertex> {
        self.applier.graph().frontier().iter().filter_map(|h| self.applier.graph().get_vertex(h)).collect()
    }

    pub fn finality_store(&self) -> &drp_finality::FinalityStore {
        self.applier.finality()
    }

    /// Signs `hash` with this peer's own BLS finality key.
    pub fn sign_bls(&self, hash: &VertexHash) -> Result<[u8; drp_core::BLS_SIGNATURE_LEN], DrpError> {
        self.applier.sign_bls(hash)
    }

    pub fn finality_store_mut(&mut self) -> &mut drp_finality::FinalityStore {
        self.applier.finality_mut()
    }

    pub fn call_drp(&mut self, op_type: &str, value: Option<Vec<Vec<u8>>>, now: Timestamp) -> Result<(), DrpError> {
        self.applier.call_drp(op_type, value, now)
    }

    pub fn call_acl(&mut self, op_type: &str, value: Option<Vec<Vec<u8>>>, now: Timestamp) -> Result<(), DrpError> {
        self.applier.call_acl(op_type, value, now)
    }

    pub fn apply_vertices(&mut self, vertices: Vec<Vertex>, now: Timestamp) -> ApplyResult {
        self.applier.apply_vertices(vertices, now)
    }

    /// Legacy alias for [`Self::apply_vertices`] returning the `[applied,
    /// missing]` tuple shape.
    pub fn merge(&mut self, vertices: Vec<Vertex>, now: Timestamp) -> (bool, Vec<VertexHash>) {
        let result = self.apply_vertices(vertices, now);
        (result.applied, result.missing)
    }

    pub fn get_states(&self, hash: &VertexHash) -> (Option<&ObjectAcl>, Option<&D>) {
        self.applier.get_states(hash)
    }

    pub fn set_acl_state(&mut self, hash: VertexHash, acl: ObjectAcl) {
        self.applier.set_acl_state(hash, acl);
    }

    pub fn set_drp_state(&mut self, hash: VertexHash, drp: D) {
        self.applier.set_drp_state(hash, drp);
    }

    pub fn subscribe(&mut self, callback: Box<dyn FnMut(Origin, &[VertexHash]) + Send>) {
        self.applier.subscribe(callback);
    }
}
