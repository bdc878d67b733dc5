use std::collections::HashMap;

use drp_core::{DrpError, PeerId, VertexHash, BLS_PUBLIC_KEY_LEN, BLS_SIGNATURE_LEN};
use tracing::info;

use crate::attestation::{AggregatedAttestation, FinalityState};
use crate::config::FinalityConfig;

/// Owns one `FinalityState` per vertex and computes quorum against the
/// configured threshold.
#[derive(Default)]
pub struct FinalityStore {
    states: HashMap<VertexHash, FinalityState>,
    config: FinalityConfig,
}

impl FinalityStore {
    pub fn new(config: FinalityConfig) -> Self {
        Self {
            states: HashMap::new(),
            config,
        }
    }

    /// Creates a fresh `FinalityState` for a newly accepted vertex, seeded
    /// from the ACL's finality group at the vertex's pre-state.
    pub fn initialize(&mut self, vertex_hash: VertexHash, signers: Vec<(PeerId, [u8; BLS_PUBLIC_KEY_LEN])>) {
        self.states
            .entry(vertex_hash.clone())
            .or_insert_with(|| FinalityState::new(vertex_hash, signers));
    }

    pub fn get(&self, vertex_hash: &VertexHash) -> Option<&FinalityState> {
        self.states.get(vertex_hash)
    }

    pub fn add_signature(
        &mut self,
        vertex_hash: &VertexHash,
        peer: &PeerId,
        signature: &[u8; BLS_SIGNATURE_LEN],
        verify: bool,
    ) -> Result<bool, DrpError> {
        let state = self
            .states
            .get_mut(vertex_hash)
            .ok_or_else(|| DrpError::StateNotFound(vertex_hash.to_string()))?;
        let accepted = state.add_signature(peer, signature, verify)?;
        if accepted && self.is_finalized(vertex_hash) {
            info!(vertex = %vertex_hash, "vertex reached finality quorum");
        }
        Ok(accepted)
    }

    pub fn merge(&mut self, vertex_hash: &VertexHash, aggregated: &AggregatedAttestation) -> Result<bool, DrpError> {
        let state = self
            .states
            .get_mut(vertex_hash)
            .ok_or_else(|| DrpError::StateNotFound(vertex_hash.to_string()))?;
        let accepted = state.merge(aggregated)?;
        if accepted && self.is_finalized(vertex_hash) {
            info!(vertex = %vertex_hash, "vertex reached finality quorum via merge");
        }
        Ok(accepted)
    }

    /// `ceil(|signers(v)| * threshold)`.
    pub fn quorum(&self, vertex_hash: &VertexHash) -> Option<usize> {
        let state = self.states.get(vertex_hash)?;
        let n = state.signers().len() as f64;
        Some((n * self.config.threshold).ceil() as usize)
    }

    pub fn is_finalized(&self, vertex_hash: &VertexHash) -> bool {
        match (self.states.get(vertex_hash), self.quorum(vertex_hash)) {
            (Some(state), Some(quorum)) => state.signature_count() >= quorum,
            _ => false,
        }
    }

    pub fn number_of_signatures(&self, vertex_hash: &VertexHash) -> usize {
        self.states.get(vertex_hash).map(|s| s.signature_count()).unwrap_or(0)
    }

    /// Garbage-collects the finality bookkeeping for a single vertex. Safe
    /// to call on a hash already finalized or unknown.
    pub fn prune_before(&mut self, vertex_hash: &VertexHash) {
        self.states.remove(vertex_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drp_crypto::BlsKeyPair;

    fn signer(seed: u8) -> (PeerId, [u8; BLS_PUBLIC_KEY_LEN], BlsKeyPair) {
        let kp = BlsKeyPair::from_ikm(&[seed; 32]).unwrap();
        let pk_bytes: [u8; BLS_PUBLIC_KEY_LEN] = kp.public_key.to_bytes();
        (PeerId::from(format!("peer-{seed}")), pk_bytes, kp)
    }

    #[test]
    fn quorum_and_finality_across_two_signatures() {
        let (peer_a, pk_a, kp_a) = signer(1);
        let (peer_b, pk_b, kp_b) = signer(2);

        let mut store = FinalityStore::new(FinalityConfig { threshold: 0.51 });
        let vhash = VertexHash::from_bytes(drp_crypto::sha256(b"v"));
        store.initialize(vhash.clone(), vec![(peer_a.clone(), pk_a), (peer_b.clone(), pk_b)]);

        assert_eq!(store.quorum(&vhash), Some(2));

        let sig_a: [u8; BLS_SIGNATURE_LEN] = kp_a.sign(vhash.as_str().as_bytes()).to_bytes();
        store.add_signature(&vhash, &peer_a, &sig_a, true).unwrap();
        assert!(!store.is_finalized(&vhash));

        let sig_b: [u8; BLS_SIGNATURE_LEN] = kp_b.sign(vhash.as_str().as_bytes()).to_bytes();
        store.add_signature(&vhash, &peer_b, &sig_b, true).unwrap();
        assert!(store.is_finalized(&vhash));
        assert_eq!(store.number_of_signatures(&vhash), 2);
    }

    #[test]
    fn duplicate_signature_is_silent_no_op() {
        let (peer_a, pk_a, kp_a) = signer(1);
        let mut store = FinalityStore::new(FinalityConfig::default());
        let vhash = VertexHash::from_bytes(drp_crypto::sha256(b"v2"));
        store.initialize(vhash.clone(), vec![(peer_a.clone(), pk_a)]);

        let sig: [u8; BLS_SIGNATURE_LEN] = kp_a.sign(vhash.as_str().as_bytes()).to_bytes();
        assert!(store.add_signature(&vhash, &peer_a, &sig, true).unwrap());
        assert!(!store.add_signature(&vhash, &peer_a, &sig, true).unwrap());
    }

    #[test]
    fn unknown_signer_rejected() {
        let (peer_a, pk_a, _kp_a) = signer(1);
        let (peer_b, _, kp_b) = signer(2);
        let mut store = FinalityStore::new(FinalityConfig::default());
        let vhash = VertexHash::from_bytes(drp_crypto::sha256(b"v3"));
        store.initialize(vhash.clone(), vec![(peer_a, pk_a)]);

        let sig: [u8; BLS_SIGNATURE_LEN] = kp_b.sign(vhash.as_str().as_bytes()).to_bytes();
        assert!(matches!(
            store.add_signature(&vhash, &peer_b, &sig, true),
            Err(DrpError::UnknownSigner(_))
        ));
    }
}
