use drp_core::{DrpError, PeerId, VertexHash, BLS_PUBLIC_KEY_LEN, BLS_SIGNATURE_LEN};
use drp_hashgraph::BitSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One peer's signature on a vertex hash, wire-level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attestation {
    pub data: VertexHash,
    pub signature: Vec<u8>,
}

/// A pre-aggregated attestation, as received from another peer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregatedAttestation {
    pub data: VertexHash,
    pub aggregation_bits: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Attestation {
    /// Encodes this attestation for wire transport.
    pub fn to_wire(&self) -> Result<Vec<u8>, DrpError> {
        bincode::serialize(self).map_err(|e| DrpError::Serialization(e.to_string()))
    }

    /// Decodes an attestation previously produced by [`Self::to_wire`].
    pub fn from_wire(bytes: &[u8]) -> Result<Self, DrpError> {
        bincode::deserialize(bytes).map_err(|e| DrpError::Serialization(e.to_string()))
    }
}

impl AggregatedAttestation {
    /// Encodes this aggregate for wire transport.
    pub fn to_wire(&self) -> Result<Vec<u8>, DrpError> {
        bincode::serialize(self).map_err(|e| DrpError::Serialization(e.to_string()))
    }

    /// Decodes an aggregate previously produced by [`Self::to_wire`].
    pub fn from_wire(bytes: &[u8]) -> Result<Self, DrpError> {
        bincode::deserialize(bytes).map_err(|e| DrpError::Serialization(e.to_string()))
    }
}

/// Per-vertex finality bookkeeping: the deterministic signer set derived
/// from the ACL's finality group at the vertex's pre-state, which peers
/// have signed so far, and the running BLS aggregate.
#[derive(Clone, Debug)]
pub struct FinalityState {
    pub vertex_hash: VertexHash,
    signers: Vec<PeerId>,
    signer_indices: HashMap<PeerId, usize>,
    bls_public_keys: HashMap<PeerId, [u8; BLS_PUBLIC_KEY_LEN]>,
    aggregation_bits: BitSet,
    aggregate_signature: Option<[u8; BLS_SIGNATURE_LEN]>,
    signature_count: usize,
}

impl FinalityState {
    /// `signers` need not be pre-sorted; the signer list and index map are
    /// derived here, sorted ascending by peerId for determinism.
    pub fn new(vertex_hash: VertexHash, mut signers: Vec<(PeerId, [u8; BLS_PUBLIC_KEY_LEN])>) -> Self {
        signers.sort_by(|a, b| a.0.cmp(&b.0));
        let mut signer_indices = HashMap::new();
        let mut bls_public_keys = HashMap::new();
        let mut ordered = Vec::with_capacity(signers.len());
        for (idx, (peer, pk)) in signers.into_iter().enumerate() {
            signer_indices.insert(peer.clone(), idx);
            bls_public_keys.insert(peer.clone(), pk);
            ordered.push(peer);
        }

        Self {
            vertex_hash,
            signers: ordered,
            signer_indices,
            bls_public_keys,
            aggregation_bits: BitSet::new(),
            aggregate_signature: None,
            signature_count: 0,
        }
    }

    pub fn signers(&self) -> &[PeerId] {
        &self.signers
    }

    pub fn signature_count(&self) -> usize {
        self.signature_count
    }

    pub fn aggregate_signature(&self) -> Option<&[u8; BLS_SIGNATURE_LEN]> {
        self.aggregate_signature.as_ref()
    }

    pub fn has_signed(&self, peer: &PeerId) -> bool {
        self.signer_indices
            .get(peer)
            .map(|idx| self.aggregation_bits.get(*idx))
            .unwrap_or(false)
    }

    /// Records `peer`'s signature. Returns `Ok(false)` — a silent no-op,
    /// not an error — if the peer already signed (`PeerAlreadySigned`).
    pub fn add_signature(
        &mut self,
        peer: &PeerId,
        signature: &[u8; BLS_SIGNATURE_LEN],
        verify: bool,
    ) -> Result<bool, DrpError> {
        let idx = *self
            .signer_indices
            .get(peer)
            .ok_or_else(|| DrpError::UnknownSigner(peer.to_string()))?;

        if self.aggregation_bits.get(idx) {
            debug!(peer = %peer, vertex = %self.vertex_hash, "peer already signed, ignoring");
            return Ok(false);
        }

        if verify {
            let pk_bytes = &self.bls_public_keys[peer];
            if !verify_attestation(&self.vertex_hash, signature, pk_bytes) {
                warn!(peer = %peer, vertex = %self.vertex_hash, "rejecting invalid BLS attestation");
                return Err(DrpError::InvalidSignature(self.vertex_hash.to_string()));
            }
        }

        self.aggregation_bits.set(idx);
        self.aggregate_signature = Some(match self.aggregate_signature {
            None => *signature,
            Some(existing) => aggregate_raw(&existing, signature)?,
        });
        self.signature_count += 1;
        Ok(true)
    }

    /// Accepts a pre-aggregated attestation, replacing local state, but
    /// only if no aggregate has been merged or accumulated yet
    /// (`AlreadyAggregated` is a silent no-op, not an error).
    pub fn merge(&mut self, aggregated: &AggregatedAttestation) -> Result<bool, DrpError> {
        if self.aggregate_signature.is_some() {
            debug!(vertex = %self.vertex_hash, "finality state already aggregated, ignoring merge");
            return Ok(false);
        }

        let bits = BitSet::from_bytes(&aggregated.aggregation_bits);
        let mut public_keys = Vec::new();
        for (peer, idx) in &self.signer_indices {
            if bits.get(*idx) {
                public_keys.push(&self.bls_public_keys[peer]);
            }
        }
        if public_keys.is_empty() {
            return Err(DrpError::UnknownSigner("empty aggregation bitset".into()));
        }

        let sig_bytes: [u8; BLS_SIGNATURE_LEN] = aggregated
            .signature
            .as_slice()
            .try_into()
            .map_err(|_| DrpError::InvalidSignature(self.vertex_hash.to_string()))?;

        if !verify_aggregate_raw(&self.vertex_hash, &sig_bytes, &public_keys) {
            return Err(DrpError::InvalidSignature(self.vertex_hash.to_string()));
        }

        self.aggregation_bits = bits;
        self.aggregate_signature = Some(sig_bytes);
        self.signature_count = self
            .signer_indices
            .values()
            .filter(|idx| self.aggregation_bits.get(**idx))
            .count();
        Ok(true)
    }
}

fn verify_attestation(vertex_hash: &VertexHash, signature: &[u8; BLS_SIGNATURE_LEN], pk_bytes: &[u8; BLS_PUBLIC_KEY_LEN]) -> bool {
    let Ok(pk) = blst::min_sig::PublicKey::from_bytes(pk_bytes) else {
        return false;
    };
    let Ok(sig) = blst::min_sig::Signature::from_bytes(signature) else {
        return false;
    };
    drp_crypto::bls_verify(vertex_hash.as_str().as_bytes(), &sig, &pk).is_ok()
}

fn verify_aggregate_raw(
    vertex_hash: &VertexHash,
    signature: &[u8; BLS_SIGNATURE_LEN],
    public_keys: &[&[u8; BLS_PUBLIC_KEY_LEN]],
) -> bool {
    let Ok(sig) = blst::min_sig::Signature::from_bytes(signature) else {
        return false;
    };
    let pks: Vec<blst::min_sig::PublicKey> = public_keys
        .iter()
        .filter_map(|b| blst::min_sig::PublicKey::from_bytes(*b).ok())
        .collect();
    if pks.len() != public_keys.len() {
        return false;
    }
    let pk_refs: Vec<&blst::min_sig::PublicKey> = pks.iter().collect();
    drp_crypto::bls_verify_aggregate(vertex_hash.as_str().as_bytes(), &sig, &pk_refs).is_ok()
}

fn aggregate_raw(
    a: &[u8; BLS_SIGNATURE_LEN],
    b: &[u8; BLS_SIGNATURE_LEN],
) -> Result<[u8; BLS_SIGNATURE_LEN], DrpError> {
    let sig_a = blst::min_sig::Signature::from_bytes(a).map_err(|_| DrpError::InvalidSignature("aggregate".into()))?;
    let sig_b = blst::min_sig::Signature::from_bytes(b).map_err(|_| DrpError::InvalidSignature("aggregate".into()))?;
    let agg = drp_crypto::bls_aggregate(&[&sig_a, &sig_b]).map_err(|_| DrpError::InvalidSignature("aggregate".into()))?;
    Ok(agg.to_bytes())
}

#[cfg(test)]
mod wire_tests {
    use super::*;

    #[test]
    fn attestation_wire_round_trip() {
        let attestation = Attestation { data: VertexHash::from_bytes([9u8; 32]), signature: vec![1, 2, 3, 4] };
        let decoded = Attestation::from_wire(&attestation.to_wire().unwrap()).unwrap();
        assert_eq!(decoded.data, attestation.data);
        assert_eq!(decoded.signature, attestation.signature);
    }

    #[test]
    fn aggregated_attestation_wire_round_trip() {
        let aggregated = AggregatedAttestation {
            data: VertexHash::from_bytes([5u8; 32]),
            aggregation_bits: vec![0b11],
            signature: vec![9, 9, 9],
        };
        let decoded = AggregatedAttestation::from_wire(&aggregated.to_wire().unwrap()).unwrap();
        assert_eq!(decoded.aggregation_bits, aggregated.aggregation_bits);
        assert_eq!(decoded.signature, aggregated.signature);
    }
}
