use drp_core::{ConflictAction, DrpError, Operation, PeerId};
use drp_hashgraph::{ConflictResolver, Vertex};
use drp_state::Drp;
use serde::{Deserialize, Serialize};

/// A counter exercising Pair-semantics conflict resolution: concurrent
/// `add`/`mul` operations are reordered so multiplication always applies to
/// the value as it stood before the addition.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddMulDrp {
    pub value: i64,
}

impl AddMulDrp {
    const OP_ADD: &'static str = "add";
    const OP_MUL: &'static str = "mul";

    pub fn encode(operand: i64) -> Vec<Vec<u8>> {
        vec![operand.to_be_bytes().to_vec()]
    }

    fn decode_operand(operation: &Operation) -> Option<i64> {
        let bytes = operation.value.as_ref()?.first()?;
        let arr: [u8; 8] = bytes.as_slice().try_into().ok()?;
        Some(i64::from_be_bytes(arr))
    }

    /// Encodes this DRP state snapshot for wire transport or storage.
    pub fn to_wire(&self) -> Result<Vec<u8>, DrpError> {
        bincode::serialize(self).map_err(|e| DrpError::Serialization(e.to_string()))
    }

    /// Decodes a snapshot previously produced by [`Self::to_wire`].
    pub fn from_wire(bytes: &[u8]) -> Result<Self, DrpError> {
        bincode::deserialize(bytes).map_err(|e| DrpError::Serialization(e.to_string()))
    }
}

impl Drp for AddMulDrp {
    fn apply(&mut self, _caller: &PeerId, operation: &Operation) -> Result<(), DrpError> {
        let operand = Self::decode_operand(operation)
            .ok_or_else(|| DrpError::Serialization(format!("malformed {} operand", operation.op_type)))?;
        match operation.op_type.as_str() {
            Self::OP_ADD => self.value += operand,
            Self::OP_MUL => self.value *= operand,
            other => return Err(DrpError::UnknownOperation(other.to_string())),
        }
        Ok(())
    }
}

/// `mul` concurrent with `add` always applies first, so multiplication
/// never sees a value the concurrent addition has already folded in: an
/// `add` found ahead of a `mul` in topological order is swapped behind it.
pub struct AddMulResolver;

impl ConflictResolver for AddMulResolver {
    fn resolve(&self, vertices: &[&Vertex]) -> ConflictAction {
        let [a, b] = vertices else { return ConflictAction::Nop };
        let a_op = a.operation.as_ref().map(|op| op.op_type.as_str());
        let b_op = b.operation.as_ref().map(|op| op.op_type.as_str());
        match (a_op, b_op) {
            (Some(AddMulDrp::OP_ADD), Some(AddMulDrp::OP_MUL)) => ConflictAction::Swap,
            _ => ConflictAction::Nop,
        }
    }
}
