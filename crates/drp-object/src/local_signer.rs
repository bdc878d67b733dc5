use drp_core::{DrpError, PeerId, VertexHash, BLS_SIGNATURE_LEN};
use drp_crypto::{BlsKeyPair, KeyPair, Signature};

use crate::signer::Signer;

/// A `Signer` backed by an in-process secp256k1 + BLS keypair. Reference
/// implementation for demos and tests; node code is expected to back
/// `Signer` with whatever keychain it actually uses.
pub struct LocalSigner {
    keypair: KeyPair,
    bls_keypair: BlsKeyPair,
}

impl LocalSigner {
    pub fn generate() -> Result<Self, DrpError> {
        let keypair = KeyPair::generate();
        let ikm: [u8; 32] = rand::random();
        let bls_keypair = BlsKeyPair::from_ikm(&ikm).map_err(|e| DrpError::Other(e.to_string()))?;
        Ok(Self { keypair, bls_keypair })
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.keypair.peer_id
    }
}

impl Signer for LocalSigner {
    fn sign(&self, hash: &VertexHash) -> Result<Signature, DrpError> {
        Ok(self.keypair.sign(hash.as_str().as_bytes()))
    }

    fn sign_bls(&self, hash: &VertexHash) -> Result<[u8; BLS_SIGNATURE_LEN], DrpError> {
        Ok(self.bls_keypair.sign(hash.as_str().as_bytes()).to_bytes())
    }

    fn public_bls(&self) -> [u8; drp_core::BLS_PUBLIC_KEY_LEN] {
        self.bls_keypair.public_key.to_bytes()
    }

    fn peer_id(&self) -> PeerId {
        self.keypair.peer_id.clone()
    }
}
