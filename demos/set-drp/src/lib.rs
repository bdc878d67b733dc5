use std::collections::BTreeSet;

use drp_core::{ConflictAction, DrpError, Operation, PeerId};
use drp_hashgraph::{ConflictResolver, Vertex};
use drp_state::Drp;
use serde::{Deserialize, Serialize};

/// A grow/delete set of `i64` elements. `add` and `delete` on distinct
/// elements always commute; concurrent operations on the same element are
/// left to the deterministic topological tie-break rather than a resolver
/// verdict, so every peer that has seen the same vertices applies them in
/// the same order and converges.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SetDrp {
    pub values: BTreeSet<i64>,
}

impl SetDrp {
    const OP_ADD: &'static str = "add";
    const OP_DELETE: &'static str = "delete";

    pub fn encode(value: i64) -> Vec<Vec<u8>> {
        vec![value.to_be_bytes().to_vec()]
    }

    fn decode_value(operation: &Operation) -> Option<i64> {
        let bytes = operation.value.as_ref()?.first()?;
        let arr: [u8; 8] = bytes.as_slice().try_into().ok()?;
        Some(i64::from_be_bytes(arr))
    }
}

impl Drp for SetDrp {
    fn apply(&mut self, _caller: &PeerId, operation: &Operation) -> Result<(), DrpError> {
        let value = Self::decode_value(operation)
            .ok_or_else(|| DrpError::Serialization(format!("malformed {} operand", operation.op_type)))?;
        match operation.op_type.as_str() {
            Self::OP_ADD => {
                self.values.insert(value);
            }
            Self::OP_DELETE => {
                self.values.remove(&value);
            }
            other => return Err(DrpError::UnknownOperation(other.to_string())),
        }
        Ok(())
    }
}

/// No pair of `SetDrp` operations needs reordering: convergence comes from
/// every peer linearizing the identical deterministic topological order.
pub struct SetDrpResolver;

impl ConflictResolver for SetDrpResolver {
    fn resolve(&self, _vertices: &[&Vertex]) -> ConflictAction {
        ConflictAction::Nop
    }
}
