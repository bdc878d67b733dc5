use crate::vertex::Vertex;
use drp_core::{DrpError, VertexHash};
use std::collections::HashMap;

/// Validates a candidate vertex before it is admitted to the graph.
///
/// Checks, in order:
/// 1. All dependencies are already known.
/// 2. The declared hash matches the canonical recomputation (skipped for
///    the root, which is never re-signed or re-hashed).
/// 3. Timestamp is not less than any dependency's timestamp (I4).
pub fn validate_vertex(vertex: &Vertex, known: &HashMap<VertexHash, Vertex>) -> Result<(), DrpError> {
    for dep in &vertex.dependencies {
        if !known.contains_key(dep) {
            return Err(DrpError::InvalidDependencies(dep.to_string()));
        }
    }

    if !vertex.is_root() {
        let expected = drp_crypto::vertex_hash(
            vertex.operation.as_ref(),
            &vertex.dependencies,
            &vertex.peer_id,
            vertex.timestamp,
        );
        if expected != vertex.hash {
            return Err(DrpError::InvalidHash {
                computed: expected.to_string(),
                claimed: vertex.hash.to_string(),
            });
        }
    }

    for dep in &vertex.dependencies {
        let dep_vertex = &known[dep];
        if vertex.timestamp < dep_vertex.timestamp {
            return Err(DrpError::InvalidTimestamp {
                got: vertex.timestamp,
                dep: dep_vertex.timestamp,
            });
        }
    }

    Ok(())
}
