use drp_core::{DrpType, Operation, PeerId, Timestamp, VertexHash};
use sha2::{Digest, Sha256};

fn push_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn push_operation(buf: &mut Vec<u8>, operation: Option<&Operation>) {
    match operation {
        None => buf.push(0),
        Some(op) => {
            buf.push(1);
            buf.push(match op.drp_type {
                DrpType::Acl => 0,
                DrpType::Drp => 1,
            });
            push_bytes(buf, op.op_type.as_bytes());
            match &op.value {
                None => buf.push(0),
                Some(args) => {
                    buf.push(1);
                    buf.extend_from_slice(&(args.len() as u32).to_le_bytes());
                    for arg in args {
                        push_bytes(buf, arg);
                    }
                }
            }
        }
    }
}

/// Builds the canonical byte preimage hashed to produce a vertex's content
/// address. Fields are encoded in the fixed order
/// `{operation, deps, peerId, timestamp}`; `deps` must already be sorted
/// ascending by hex hash, matching the wire ordering rule.
pub fn canonical_preimage(
    operation: Option<&Operation>,
    deps: &[VertexHash],
    peer_id: &PeerId,
    timestamp: Timestamp,
) -> Vec<u8> {
    let mut buf = Vec::new();

    push_operation(&mut buf, operation);

    buf.extend_from_slice(&(deps.len() as u32).to_le_bytes());
    for dep in deps {
        let raw = hex::decode(dep.as_str()).unwrap_or_default();
        push_bytes(&mut buf, &raw);
    }

    push_bytes(&mut buf, peer_id.as_str().as_bytes());
    buf.extend_from_slice(&timestamp.to_le_bytes());

    buf
}

/// SHA-256 over arbitrary bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Derives a vertex's hash from its canonical preimage fields.
pub fn vertex_hash(
    operation: Option<&Operation>,
    deps: &[VertexHash],
    peer_id: &PeerId,
    timestamp: Timestamp,
) -> VertexHash {
    let preimage = canonical_preimage(operation, deps, peer_id, timestamp);
    VertexHash::from_bytes(sha256(&preimage))
}
