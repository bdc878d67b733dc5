use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::hash::sha256;
use drp_core::PeerId;

/// A recoverable secp256k1 signature: 64-byte compact signature followed by
/// a 1-byte recovery id, matching `SIGNATURE_LEN`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub [u8; 65]);

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}…)", &hex::encode(&self.0[..4]))
    }
}

/// A DRP peer's signing identity: a secp256k1 keypair whose `PeerId` is
/// derived from the SHA-256 hash of the compressed public key.
pub struct KeyPair {
    pub peer_id: PeerId,
    pub public_key: PublicKey,
    secret_key: SecretKey,
}

impl KeyPair {
    /// Generates a fresh secp256k1 keypair.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (sk, pk) = secp.generate_keypair(&mut rng);
        Self::from_keys(sk, pk)
    }

    /// Restores a keypair from a raw 32-byte secret key.
    pub fn from_secret_bytes(sk_bytes: &[u8]) -> Result<Self, secp256k1::Error> {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(sk_bytes)?;
        let pk = PublicKey::from_secret_key(&secp, &sk);
        Ok(Self::from_keys(sk, pk))
    }

    fn from_keys(secret_key: SecretKey, public_key: PublicKey) -> Self {
        let peer_id = peer_id_from_public_key(&public_key);
        Self {
            peer_id,
            public_key,
            secret_key,
        }
    }

    /// Signs a vertex hash preimage, returning a 65-byte recoverable
    /// signature over its SHA-256 digest.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let secp = Secp256k1::signing_only();
        let digest = sha256(message);
        let msg = Message::from_digest(digest);
        let sig = secp.sign_ecdsa_recoverable(&msg, &self.secret_key);
        let (recovery_id, compact) = sig.serialize_compact();
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&compact);
        out[64] = recovery_id.to_i32() as u8;
        Signature(out)
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        let mut bytes = *self.secret_key.as_ref();
        bytes.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ peer_id: {:?} }}", self.peer_id)
    }
}

/// Derives a `PeerId` from a public key: hex SHA-256 of its compressed
/// (33-byte) encoding.
pub fn peer_id_from_public_key(public_key: &PublicKey) -> PeerId {
    let digest = sha256(&public_key.serialize());
    PeerId::from(hex::encode(digest))
}

/// Recovers the signer's public key from a message and recoverable
/// signature, then derives its `PeerId`.
pub fn recover_peer_id(message: &[u8], signature: &Signature) -> Result<PeerId, secp256k1::Error> {
    let secp = Secp256k1::verification_only();
    let digest = sha256(message);
    let msg = Message::from_digest(digest);
    let recovery_id = RecoveryId::from_i32(signature.0[64] as i32)?;
    let recoverable = RecoverableSignature::from_compact(&signature.0[..64], recovery_id)?;
    let public_key = secp.recover_ecdsa(&msg, &recoverable)?;
    Ok(peer_id_from_public_key(&public_key))
}

/// Verifies that `signature` over `message` recovers to `expected_peer`.
pub fn verify(message: &[u8], signature: &Signature, expected_peer: &PeerId) -> bool {
    matches!(recover_peer_id(message, signature), Ok(peer) if &peer == expected_peer)
}
