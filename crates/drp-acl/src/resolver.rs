use drp_core::ConflictAction;
use drp_hashgraph::{ConflictResolver, Vertex};

use crate::ops::{decode_target_group_args, OP_GRANT, OP_REVOKE, OP_SET_KEY};
use crate::types::ConflictResolutionPolicy;

/// Resolves concurrent ACL operations. `setKey` never conflicts with
/// anything else since it only ever touches the caller's own entry. A
/// `grant` and a `revoke` naming the same peer are the only pair that can
/// actually conflict; everything else is a no-op.
pub struct AclConflictResolver {
    pub policy: ConflictResolutionPolicy,
}

impl AclConflictResolver {
    pub fn new(policy: ConflictResolutionPolicy) -> Self {
        Self { policy }
    }
}

impl ConflictResolver for AclConflictResolver {
    fn resolve(&self, vertices: &[&Vertex]) -> ConflictAction {
        let (a, b) = (vertices[0], vertices[1]);
        let (Some(op_a), Some(op_b)) = (a.operation.as_ref(), b.operation.as_ref()) else {
            return ConflictAction::Nop;
        };

        if op_a.op_type == OP_SET_KEY || op_b.op_type == OP_SET_KEY {
            return ConflictAction::Nop;
        }
        if op_a.op_type == op_b.op_type {
            return ConflictAction::Nop;
        }

        let target_a = op_a.value.as_deref().and_then(decode_target_group_args).map(|(t, _)| t);
        let target_b = op_b.value.as_deref().and_then(decode_target_group_args).map(|(t, _)| t);
        if target_a != target_b {
            return ConflictAction::Nop;
        }

        let a_is_grant = op_a.op_type == OP_GRANT;
        match self.policy {
            ConflictResolutionPolicy::GrantWins => {
                if a_is_grant {
                    ConflictAction::DropRight
                } else {
                    ConflictAction::DropLeft
                }
            }
            ConflictResolutionPolicy::RevokeWins => {
                if a_is_grant {
                    ConflictAction::DropLeft
                } else {
                    ConflictAction::DropRight
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::encode_target_group_args;
    use crate::types::AclGroup;
    use drp_core::{DrpType, Operation, PeerId, VertexHash};

    fn vertex(hash: &str, op_type: &str, target: &PeerId) -> Vertex {
        Vertex {
            hash: VertexHash(hash.into()),
            peer_id: PeerId::from("author"),
            operation: Some(Operation {
                drp_type: DrpType::Acl,
                op_type: op_type.into(),
                value: Some(encode_target_group_args(target, AclGroup::Writer)),
            }),
            dependencies: vec![],
            timestamp: 0,
            signature: None,
        }
    }

    #[test]
    fn grant_wins_drops_the_revoke() {
        let target = PeerId::from("bob");
        let grant = vertex("aaaa", OP_GRANT, &target);
        let revoke = vertex("bbbb", OP_REVOKE, &target);
        let resolver = AclConflictResolver::new(ConflictResolutionPolicy::GrantWins);
        assert_eq!(resolver.resolve(&[&grant, &revoke]), ConflictAction::DropRight);
        assert_eq!(resolver.resolve(&[&revoke, &grant]), ConflictAction::DropLeft);
    }

    #[test]
    fn revoke_wins_drops_the_grant() {
        let target = PeerId::from("bob");
        let grant = vertex("aaaa", OP_GRANT, &target);
        let revoke = vertex("bbbb", OP_REVOKE, &target);
        let resolver = AclConflictResolver::new(ConflictResolutionPolicy::RevokeWins);
        assert_eq!(resolver.resolve(&[&grant, &revoke]), ConflictAction::DropLeft);
    }

    #[test]
    fn different_targets_do_not_conflict() {
        let grant = vertex("aaaa", OP_GRANT, &PeerId::from("bob"));
        let revoke = vertex("bbbb", OP_REVOKE, &PeerId::from("carol"));
        let resolver = AclConflictResolver::new(ConflictResolutionPolicy::GrantWins);
        assert_eq!(resolver.resolve(&[&grant, &revoke]), ConflictAction::Nop);
    }

    #[test]
    fn same_op_type_never_conflicts() {
        let target = PeerId::from("bob");
        let a = vertex("aaaa", OP_GRANT, &target);
        let b = vertex("bbbb", OP_GRANT, &target);
        let resolver = AclConflictResolver::new(ConflictResolutionPolicy::GrantWins);
        assert_eq!(resolver.resolve(&[&a, &b]), ConflictAction::Nop);
    }
}
