use std::collections::BTreeMap;

use drp_core::{DrpError, Operation, PeerId, BLS_PUBLIC_KEY_LEN};
use serde::{Deserialize, Serialize};

use crate::ops::{decode_set_key_args, decode_target_group_args, OP_GRANT, OP_REVOKE, OP_SET_KEY};
use crate::types::{AclEntry, AclGroup, ConflictResolutionPolicy};

/// The access-control object co-located with every DRP. One instance lives
/// alongside each object's hashgraph and is itself replicated with `Pair`
/// semantics through [`crate::resolver::AclConflictResolver`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectAcl {
    entries: BTreeMap<PeerId, AclEntry>,
    permissionless: bool,
    resolution: ConflictResolutionPolicy,
}

impl ObjectAcl {
    /// Seeds the genesis admin set. Admins start out as writers and
    /// finality signers too, since an admin who cannot write or attest
    /// would be unable to bootstrap the object they administer.
    pub fn new(admins: Vec<PeerId>, permissionless: bool, resolution: ConflictResolutionPolicy) -> Self {
        let mut entries = BTreeMap::new();
        for admin in admins {
            entries.insert(
                admin,
                AclEntry {
                    bls_public_key: None,
                    permissions: [AclGroup::Admin, AclGroup::Writer, AclGroup::Finality].into(),
                },
            );
        }
        Self { entries, permissionless, resolution }
    }

    pub fn resolution(&self) -> ConflictResolutionPolicy {
        self.resolution
    }

    pub fn query_is_admin(&self, peer: &PeerId) -> bool {
        self.entries.get(peer).map(|e| e.permissions.contains(&AclGroup::Admin)).unwrap_or(false)
    }

    pub fn query_is_writer(&self, peer: &PeerId) -> bool {
        if self.permissionless {
            return true;
        }
        self.entries.get(peer).map(|e| e.permissions.contains(&AclGroup::Writer)).unwrap_or(false)
    }

    pub fn query_is_finality_signer(&self, peer: &PeerId) -> bool {
        self.entries.get(peer).map(|e| e.permissions.contains(&AclGroup::Finality)).unwrap_or(false)
    }

    pub fn query_finality_group(&self) -> Vec<(PeerId, [u8; BLS_PUBLIC_KEY_LEN])> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.permissions.contains(&AclGroup::Finality))
            .filter_map(|(peer, entry)| entry.bls_public_key.map(|key| (peer.clone(), key)))
            .collect()
    }

    pub fn query_writers(&self) -> Vec<PeerId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.permissions.contains(&AclGroup::Writer))
            .map(|(peer, _)| peer.clone())
            .collect()
    }

    pub fn query_admins(&self) -> Vec<PeerId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.permissions.contains(&AclGroup::Admin))
            .map(|(peer, _)| peer.clone())
            .collect()
    }

    /// Grants `group` to `target`. Only admins may grant. Granting `Writer`
    /// on a permissionless object is meaningless since writing is already
    /// open to everyone, so it is rejected.
    pub fn grant(&mut self, caller: &PeerId, target: PeerId, group: AclGroup) -> Result<(), DrpError> {
        if !self.query_is_admin(caller) {
            return Err(DrpError::UnauthorizedOperation {
                peer: caller.to_string(),
                op_type: "grant".into(),
            });
        }
        if self.permissionless && group == AclGroup::Writer {
            return Err(DrpError::UnauthorizedOperation {
                peer: caller.to_string(),
                op_type: "grant(Writer) on permissionless object".into(),
            });
        }
        self.entries.entry(target).or_default().permissions.insert(group);
        Ok(())
    }

    /// Revokes `group` from `target`. Only admins may revoke. Revoking
    /// `Admin` from an existing admin is a silent no-op: admins cannot be
    /// demoted.
    pub fn revoke(&mut self, caller: &PeerId, target: &PeerId, group: AclGroup) -> Result<(), DrpError> {
        if !self.query_is_admin(caller) {
            return Err(DrpError::UnauthorizedOperation {
                peer: caller.to_string(),
                op_type: "revoke".into(),
            });
        }
        if group == AclGroup::Admin && self.query_is_admin(target) {
            return Ok(());
        }
        if let Some(entry) = self.entries.get_mut(target) {
            entry.permissions.remove(&group);
        }
        Ok(())
    }

    /// Sets the caller's own BLS attestation key. A peer may only set its
    /// own key, and only finality signers have one at all.
    pub fn set_key(&mut self, caller: &PeerId, bls_public_key: [u8; BLS_PUBLIC_KEY_LEN]) -> Result<(), DrpError> {
        if !self.query_is_finality_signer(caller) {
            return Err(DrpError::UnauthorizedOperation {
                peer: caller.to_string(),
                op_type: "setKey".into(),
            });
        }
        self.entries.entry(caller.clone()).or_default().bls_public_key = Some(bls_public_key);
        Ok(())
    }

    /// Encodes this ACL state for wire transport or snapshot storage.
    pub fn to_wire(&self) -> Result<Vec<u8>, DrpError> {
        bincode::serialize(self).map_err(|e| DrpError::Serialization(e.to_string()))
    }

    /// Decodes an `ObjectAcl` previously produced by [`Self::to_wire`].
    pub fn from_wire(bytes: &[u8]) -> Result<Self, DrpError> {
        bincode::deserialize(bytes).map_err(|e| DrpError::Serialization(e.to_string()))
    }

    /// Dispatches a vertex's operation to `grant`/`revoke`/`setKey` by
    /// decoding its wire arguments. `caller` is the vertex's `peer_id`: the
    /// replacement for the implicit `this` a proxy-based interceptor would
    /// bind automatically.
    pub fn apply(&mut self, caller: &PeerId, operation: &Operation) -> Result<(), DrpError> {
        let args = operation
            .value
            .as_deref()
            .ok_or_else(|| DrpError::UnknownOperation(operation.op_type.clone()))?;
        match operation.op_type.as_str() {
            OP_GRANT => {
                let (target, group) = decode_target_group_args(args)
                    .ok_or_else(|| DrpError::Serialization("malformed grant args".into()))?;
                self.grant(caller, target, group)
            }
            OP_REVOKE => {
                let (target, group) = decode_target_group_args(args)
                    .ok_or_else(|| DrpError::Serialization("malformed revoke args".into()))?;
                self.revoke(caller, &target, group)
            }
            OP_SET_KEY => {
                let key = decode_set_key_args(args)
                    .ok_or_else(|| DrpError::Serialization("malformed setKey args".into()))?;
                self.set_key(caller, key)
            }
            other => Err(DrpError::UnknownOperation(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str) -> PeerId {
        PeerId::from(name)
    }

    #[test]
    fn genesis_admins_can_write_and_attest() {
        let acl = ObjectAcl::new(vec![peer("alice")], false, ConflictResolutionPolicy::GrantWins);
        assert!(acl.query_is_admin(&peer("alice")));
        assert!(acl.query_is_writer(&peer("alice")));
        assert!(acl.query_is_finality_signer(&peer("alice")));
        assert!(!acl.query_is_writer(&peer("bob")));
    }

    #[test]
    fn permissionless_object_treats_everyone_as_writer() {
        let acl = ObjectAcl::new(vec![peer("alice")], true, ConflictResolutionPolicy::GrantWins);
        assert!(acl.query_is_writer(&peer("stranger")));
    }

    #[test]
    fn non_admin_cannot_grant() {
        let mut acl = ObjectAcl::new(vec![peer("alice")], false, ConflictResolutionPolicy::GrantWins);
        let err = acl.grant(&peer("bob"), peer("carol"), AclGroup::Writer);
        assert!(err.is_err());
    }

    #[test]
    fn cannot_grant_writer_on_permissionless_object() {
        let mut acl = ObjectAcl::new(vec![peer("alice")], true, ConflictResolutionPolicy::GrantWins);
        let err = acl.grant(&peer("alice"), peer("bob"), AclGroup::Writer);
        assert!(err.is_err());
    }

    #[test]
    fn revoking_admin_from_admin_is_a_silent_no_op() {
        let mut acl = ObjectAcl::new(vec![peer("alice")], false, ConflictResolutionPolicy::GrantWins);
        acl.revoke(&peer("alice"), &peer("alice"), AclGroup::Admin).unwrap();
        assert!(acl.query_is_admin(&peer("alice")));
    }

    #[test]
    fn peer_can_set_its_own_finality_key() {
        let mut acl = ObjectAcl::new(vec![peer("alice")], false, ConflictResolutionPolicy::GrantWins);
        acl.set_key(&peer("alice"), [7u8; BLS_PUBLIC_KEY_LEN]).unwrap();
        assert_eq!(acl.query_finality_group(), vec![(peer("alice"), [7u8; BLS_PUBLIC_KEY_LEN])]);
    }

    #[test]
    fn non_signer_cannot_set_key() {
        let mut acl = ObjectAcl::new(vec![peer("alice")], false, ConflictResolutionPolicy::GrantWins);
        let err = acl.set_key(&peer("bob"), [1u8; BLS_PUBLIC_KEY_LEN]);
        assert!(err.is_err());
    }

    #[test]
    fn wire_round_trip_preserves_state() {
        let mut acl = ObjectAcl::new(vec![peer("alice")], false, ConflictResolutionPolicy::GrantWins);
        acl.grant(&peer("alice"), peer("bob"), AclGroup::Writer).unwrap();
        acl.set_key(&peer("alice"), [3u8; BLS_PUBLIC_KEY_LEN]).unwrap();

        let decoded = ObjectAcl::from_wire(&acl.to_wire().unwrap()).unwrap();
        assert!(decoded.query_is_writer(&peer("bob")));
        assert_eq!(decoded.query_finality_group(), acl.query_finality_group());
    }

    #[test]
    fn apply_dispatches_grant_operation() {
        use crate::ops::encode_target_group_args;
        use drp_core::DrpType;

        let mut acl = ObjectAcl::new(vec![peer("alice")], false, ConflictResolutionPolicy::GrantWins);
        let op = drp_core::Operation {
            drp_type: DrpType::Acl,
            op_type: crate::ops::OP_GRANT.into(),
            value: Some(encode_target_group_args(&peer("bob"), AclGroup::Writer)),
        };
        acl.apply(&peer("alice"), &op).unwrap();
        assert!(acl.query_is_writer(&peer("bob")));
    }
}
