use drp_core::{DrpError, Operation, PeerId};

/// A replicated data type pluggable into a [`crate::manager::StateManager`].
/// Rust has no reflection-based proxy to intercept arbitrary method calls,
/// so a concrete DRP exposes a single dispatch entry point instead: the
/// operation's `opType` and decoded `value` stand in for the method call a
/// dynamic language would intercept directly.
pub trait Drp: Clone {
    fn apply(&mut self, caller: &PeerId, operation: &Operation) -> Result<(), DrpError>;
}
