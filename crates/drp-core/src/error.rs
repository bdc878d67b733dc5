use thiserror::Error;

/// Crate-wide error type for the DRP replication core.
///
/// `PeerAlreadySigned` and `AlreadyAggregated` are deliberately absent: the
/// spec treats a peer re-submitting an attestation it already holds as a
/// silent no-op, not a failure, so those call sites return `Ok(false)`
/// instead of an error variant.
#[derive(Debug, Error)]
pub enum DrpError {
    // ── Hashgraph errors ─────────────────────────────────────────────────────
    #[error("vertex hash mismatch: computed {computed}, claimed {claimed}")]
    InvalidHash { computed: String, claimed: String },

    #[error("unknown dependency vertex: {0}")]
    InvalidDependencies(String),

    #[error("vertex timestamp {got} precedes a dependency's timestamp {dep}")]
    InvalidTimestamp { got: i64, dep: i64 },

    #[error("vertex already exists: {0}")]
    DuplicateVertex(String),

    #[error("unknown vertex: {0}")]
    UnknownVertex(String),

    // ── Signature errors ─────────────────────────────────────────────────────
    #[error("invalid signature on vertex {0}")]
    InvalidSignature(String),

    #[error("unknown signer: {0}")]
    UnknownSigner(String),

    // ── Authorization errors ─────────────────────────────────────────────────
    #[error("peer {peer} is not authorized to perform {op_type}")]
    UnauthorizedOperation { peer: String, op_type: String },

    // ── State errors ─────────────────────────────────────────────────────────
    #[error("no state snapshot recorded for vertex {0}")]
    StateNotFound(String),

    #[error("unregistered operation: {0}")]
    UnknownOperation(String),

    // ── Serialization ────────────────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}
