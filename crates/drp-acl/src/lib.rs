pub mod ops;
pub mod resolver;
pub mod state;
pub mod types;

pub use ops::{
    decode_set_key_args, decode_target_group_args, encode_set_key_args, encode_target_group_args,
    OP_GRANT, OP_REVOKE, OP_SET_KEY,
};
pub use resolver::AclConflictResolver;
pub use state::ObjectAcl;
pub use types::{AclEntry, AclGroup, ConflictResolutionPolicy};
