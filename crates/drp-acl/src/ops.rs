use drp_core::{PeerId, BLS_PUBLIC_KEY_LEN};

use crate::types::AclGroup;

pub const OP_GRANT: &str = "grant";
pub const OP_REVOKE: &str = "revoke";
pub const OP_SET_KEY: &str = "setKey";

fn encode_group(group: AclGroup) -> u8 {
    match group {
        AclGroup::Admin => 0,
        AclGroup::Finality => 1,
        AclGroup::Writer => 2,
    }
}

fn decode_group(byte: u8) -> Option<AclGroup> {
    match byte {
        0 => Some(AclGroup::Admin),
        1 => Some(AclGroup::Finality),
        2 => Some(AclGroup::Writer),
        _ => None,
    }
}

/// Encodes `grant`/`revoke` arguments as `[targetPeerId, groupTag]`, the
/// shape a vertex's `Operation.value` carries over the wire.
pub fn encode_target_group_args(target: &PeerId, group: AclGroup) -> Vec<Vec<u8>> {
    vec![target.as_str().as_bytes().to_vec(), vec![encode_group(group)]]
}

pub fn decode_target_group_args(args: &[Vec<u8>]) -> Option<(PeerId, AclGroup)> {
    let target = String::from_utf8(args.first()?.clone()).ok()?;
    let group = decode_group(*args.get(1)?.first()?)?;
    Some((PeerId::from(target), group))
}

pub fn encode_set_key_args(bls_public_key: &[u8; BLS_PUBLIC_KEY_LEN]) -> Vec<Vec<u8>> {
    vec![bls_public_key.to_vec()]
}

pub fn decode_set_key_args(args: &[Vec<u8>]) -> Option<[u8; BLS_PUBLIC_KEY_LEN]> {
    let bytes = args.first()?;
    if bytes.len() != BLS_PUBLIC_KEY_LEN {
        return None;
    }
    let mut key = [0u8; BLS_PUBLIC_KEY_LEN];
    key.copy_from_slice(bytes);
    Some(key)
}
