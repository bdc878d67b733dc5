use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Milliseconds since the Unix epoch. Vertex timestamps and the local clock
/// both live in this unit.
pub type Timestamp = i64;

// ── PeerId ───────────────────────────────────────────────────────────────────

/// A peer's stable identity, derived externally from its secp256k1 public
/// key. The core treats it as an opaque, ordered string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── VertexHash ───────────────────────────────────────────────────────────────

/// A vertex's content-addressed identity: the hex encoding of its SHA-256
/// canonical hash.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexHash(pub String);

impl VertexHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VertexHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for VertexHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.0;
        write!(f, "VertexHash({}…)", &s[..s.len().min(12)])
    }
}

/// The hash of the single well-known root vertex created at graph
/// construction. Fixed across every hashgraph instance so peers agree on
/// the genesis of their DAG without exchanging it.
pub fn root_hash() -> VertexHash {
    VertexHash("0".repeat(64))
}

// ── DrpType / SemanticsType ───────────────────────────────────────────────────

/// Which replicated object an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrpType {
    Acl,
    Drp,
}

/// How a DRP's conflict resolver combines concurrent operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticsType {
    Pair,
    Multiple,
}

// ── Operation ────────────────────────────────────────────────────────────────

/// The payload carried by a non-root vertex. `value` is the method
/// arguments, pre-serialized to bytes per argument. `None` marks a root or
/// explicit noop vertex — both linearizers treat these as emitted-but-inert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub drp_type: DrpType,
    pub op_type: String,
    pub value: Option<Vec<Vec<u8>>>,
}

impl Operation {
    pub fn is_inert(&self) -> bool {
        self.value.is_none()
    }
}

// ── ConflictAction ───────────────────────────────────────────────────────────

/// The verdict a conflict resolver returns for a concurrent pair or group
/// of vertices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConflictAction {
    Nop,
    DropLeft,
    DropRight,
    Swap,
    /// Multiple semantics only: the full set of vertex hashes to drop from
    /// the concurrent group.
    Drop(BTreeSet<VertexHash>),
}
