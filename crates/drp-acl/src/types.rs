use drp_core::BLS_PUBLIC_KEY_LEN;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The three permission groups a peer may hold on an object's ACL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AclGroup {
    Admin,
    Finality,
    Writer,
}

/// How concurrent `grant`/`revoke` operations on the same peer are
/// resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictResolutionPolicy {
    GrantWins,
    RevokeWins,
}

/// One peer's membership record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AclEntry {
    pub bls_public_key: Option<[u8; BLS_PUBLIC_KEY_LEN]>,
    pub permissions: BTreeSet<AclGroup>,
}
