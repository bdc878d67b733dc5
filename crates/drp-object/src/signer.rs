use drp_core::{DrpError, PeerId, VertexHash, BLS_PUBLIC_KEY_LEN, BLS_SIGNATURE_LEN};
use drp_crypto::Signature;

/// Externally supplied identity and signing capability. The core never
/// holds private key material itself; it consumes this trait so a node can
/// back it with a hardware wallet, a keychain service, or a plain in-memory
/// key.
pub trait Signer {
    fn sign(&self, hash: &VertexHash) -> Result<Signature, DrpError>;
    fn sign_bls(&self, hash: &VertexHash) -> Result<[u8; BLS_SIGNATURE_LEN], DrpError>;
    fn public_bls(&self) -> [u8; BLS_PUBLIC_KEY_LEN];
    fn peer_id(&self) -> PeerId;
}
