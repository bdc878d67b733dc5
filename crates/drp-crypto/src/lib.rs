pub mod bls;
pub mod hash;
pub mod keypair;

pub use bls::{aggregate as bls_aggregate, verify as bls_verify, verify_aggregate as bls_verify_aggregate, BlsError, BlsKeyPair};
pub use hash::{canonical_preimage, sha256, vertex_hash};
pub use keypair::{peer_id_from_public_key, recover_peer_id, verify as ecdsa_verify, KeyPair, Signature};
