use drp_core::DEFAULT_FINALITY_THRESHOLD;

/// Plain configuration passed into `FinalityStore::new` — no process-wide
/// singleton backs the quorum fraction.
#[derive(Debug, Clone, Copy)]
pub struct FinalityConfig {
    /// Fraction of a vertex's signer set required for finality.
    pub threshold: f64,
}

impl Default for FinalityConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FINALITY_THRESHOLD,
        }
    }
}
