use drp_core::VertexHash;
use indexmap::IndexSet;

/// Insertion-ordered set of vertex hashes, used for the hashgraph's frontier.
#[derive(Clone, Debug, Default)]
pub struct ObjectSet {
    inner: IndexSet<VertexHash>,
}

impl ObjectSet {
    pub fn new() -> Self {
        Self {
            inner: IndexSet::new(),
        }
    }

    /// Returns `true` if `hash` was not already present.
    pub fn insert(&mut self, hash: VertexHash) -> bool {
        self.inner.insert(hash)
    }

    /// Returns `true` if `hash` was present and removed, preserving the
    /// relative order of the remaining elements.
    pub fn remove(&mut self, hash: &VertexHash) -> bool {
        self.inner.shift_remove(hash)
    }

    pub fn contains(&self, hash: &VertexHash) -> bool {
        self.inner.contains(hash)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VertexHash> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn to_vec(&self) -> Vec<VertexHash> {
        self.inner.iter().cloned().collect()
    }
}
