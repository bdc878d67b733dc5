use drp_core::MAX_DEPENDENCY_COUNT;

/// Plain configuration passed into `HashGraph::new` — no process-wide
/// singleton backs the graph's limits.
#[derive(Clone, Debug)]
pub struct HashGraphConfig {
    pub max_dependency_count: usize,
}

impl Default for HashGraphConfig {
    fn default() -> Self {
        Self {
            max_dependency_count: MAX_DEPENDENCY_COUNT,
        }
    }
}
