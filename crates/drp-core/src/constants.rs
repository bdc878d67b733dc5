//! ─── DRP protocol constants ──────────────────────────────────────────────────

// ── Finality ─────────────────────────────────────────────────────────────────

/// Default fraction of the ACL's finality group whose attestations are
/// required before a vertex is considered final.
pub const DEFAULT_FINALITY_THRESHOLD: f64 = 0.51;

// ── Hashgraph ────────────────────────────────────────────────────────────────

/// Width, in bits, of each `BitSet` word. Fixed at 64 (native `u64`).
pub const BITSET_WORD_BITS: usize = 64;

/// Maximum number of dependencies a single vertex may declare. Bounds the
/// cost of canonical-hash preimage construction and causal-reachability
/// queries per vertex.
pub const MAX_DEPENDENCY_COUNT: usize = 64;

// ── Signatures ───────────────────────────────────────────────────────────────

/// Length, in bytes, of a secp256k1 recoverable signature (64-byte compact
/// signature plus a 1-byte recovery id).
pub const SIGNATURE_LEN: usize = 65;

/// Length, in bytes, of a BLS12-381 G1 signature (compressed).
pub const BLS_SIGNATURE_LEN: usize = 48;

/// Length, in bytes, of a BLS12-381 G2 public key (compressed).
pub const BLS_PUBLIC_KEY_LEN: usize = 96;
