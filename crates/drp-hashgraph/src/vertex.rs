use drp_core::{root_hash, DrpError, Operation, PeerId, Timestamp, VertexHash};
use drp_crypto::Signature;
use serde::{Deserialize, Serialize};

/// A single vertex in the hashgraph: an operation plus its content-addressed
/// identity. The root vertex is the only one with no operation, no
/// dependencies, and no signature.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vertex {
    pub hash: VertexHash,
    pub peer_id: PeerId,
    pub operation: Option<Operation>,
    /// Sorted ascending by hex hash.
    pub dependencies: Vec<VertexHash>,
    pub timestamp: Timestamp,
    pub signature: Option<Signature>,
}

impl Vertex {
    /// Builds the well-known root vertex: fixed hash, empty dependencies,
    /// null operation, zero timestamp, never signed.
    pub fn root(local_peer_id: &PeerId) -> Self {
        Self {
            hash: root_hash(),
            peer_id: local_peer_id.clone(),
            operation: None,
            dependencies: Vec::new(),
            timestamp: 0,
            signature: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.hash == root_hash()
    }

    /// True for the root and for explicit noop vertices — both linearizers
    /// treat these as emitted-but-inert.
    pub fn is_inert(&self) -> bool {
        match &self.operation {
            None => true,
            Some(op) => op.is_inert(),
        }
    }

    /// Encodes this vertex for gossip transport.
    pub fn to_wire(&self) -> Result<Vec<u8>, DrpError> {
        bincode::serialize(self).map_err(|e| DrpError::Serialization(e.to_string()))
    }

    /// Decodes a vertex previously produced by [`Self::to_wire`].
    pub fn from_wire(bytes: &[u8]) -> Result<Self, DrpError> {
        bincode::deserialize(bytes).map_err(|e| DrpError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip_preserves_fields() {
        let peer = PeerId::from("peer-a");
        let operation = Operation {
            drp_type: drp_core::DrpType::Drp,
            op_type: "add".into(),
            value: Some(vec![vec![1, 2, 3]]),
        };
        let vertex = Vertex {
            hash: drp_crypto::vertex_hash(Some(&operation), &[root_hash()], &peer, 7),
            peer_id: peer,
            operation: Some(operation),
            dependencies: vec![root_hash()],
            timestamp: 7,
            signature: None,
        };

        let decoded = Vertex::from_wire(&vertex.to_wire().unwrap()).unwrap();
        assert_eq!(decoded.hash, vertex.hash);
        assert_eq!(decoded.timestamp, vertex.timestamp);
        assert_eq!(decoded.dependencies, vertex.dependencies);
    }
}
