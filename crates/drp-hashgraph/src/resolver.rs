use crate::vertex::Vertex;
use drp_core::ConflictAction;

/// Invoked by `HashGraph::resolve_conflicts` to decide how a concurrent
/// group of vertices should be linearized. Implementations must be pure —
/// no I/O, no wall-clock reads — so that every peer derives the same
/// verdict from the same inputs.
pub trait ConflictResolver: Send + Sync {
    fn resolve(&self, vertices: &[&Vertex]) -> ConflictAction;
}
