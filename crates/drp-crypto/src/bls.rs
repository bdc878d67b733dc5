use blst::min_sig::{AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use thiserror::Error;

const DST: &[u8] = b"DRP_BLS_FINALITY_ATTESTATION_V1";

#[derive(Debug, Error)]
pub enum BlsError {
    #[error("invalid BLS key material")]
    InvalidKey,
    #[error("invalid BLS signature")]
    InvalidSignature,
    #[error("cannot aggregate an empty signature set")]
    EmptyAggregate,
}

fn map_err(e: BLST_ERROR) -> BlsError {
    match e {
        BLST_ERROR::BLST_SUCCESS => unreachable!("map_err called on success"),
        _ => BlsError::InvalidSignature,
    }
}

/// A BLS12-381 keypair used to produce finality attestations over vertex
/// hashes.
pub struct BlsKeyPair {
    secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl BlsKeyPair {
    /// Derives a keypair from 32+ bytes of key material (e.g. a CSPRNG seed).
    pub fn from_ikm(ikm: &[u8]) -> Result<Self, BlsError> {
        let secret_key = SecretKey::key_gen(ikm, &[]).map_err(|_| BlsError::InvalidKey)?;
        let public_key = secret_key.sk_to_pk();
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// Signs a vertex hash digest, producing an attestation signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.secret_key.sign(message, DST, &[])
    }
}

/// Verifies a single attestation signature against a signer's public key.
pub fn verify(message: &[u8], signature: &Signature, public_key: &PublicKey) -> Result<(), BlsError> {
    let res = signature.verify(true, message, DST, &[], public_key, true);
    if res == BLST_ERROR::BLST_SUCCESS {
        Ok(())
    } else {
        Err(map_err(res))
    }
}

/// Aggregates a set of attestation signatures over the same message into a
/// single signature.
pub fn aggregate(signatures: &[&Signature]) -> Result<Signature, BlsError> {
    if signatures.is_empty() {
        return Err(BlsError::EmptyAggregate);
    }
    let agg = AggregateSignature::aggregate(signatures, true).map_err(|_| BlsError::InvalidSignature)?;
    Ok(agg.to_signature())
}

/// Verifies an aggregated signature against the set of public keys that
/// contributed to it, all attesting the same message.
pub fn verify_aggregate(
    message: &[u8],
    aggregate: &Signature,
    public_keys: &[&PublicKey],
) -> Result<(), BlsError> {
    if public_keys.is_empty() {
        return Err(BlsError::EmptyAggregate);
    }
    let res = aggregate.fast_aggregate_verify(true, message, DST, public_keys);
    if res == BLST_ERROR::BLST_SUCCESS {
        Ok(())
    } else {
        Err(map_err(res))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair(seed: u8) -> BlsKeyPair {
        let ikm = [seed; 32];
        BlsKeyPair::from_ikm(&ikm).unwrap()
    }

    #[test]
    fn sign_verify_round_trip() {
        let kp = keypair(1);
        let message = b"vertex-hash-digest";
        let sig = kp.sign(message);
        assert!(verify(message, &sig, &kp.public_key).is_ok());
    }

    #[test]
    fn aggregate_verifies_against_all_signers() {
        let signers: Vec<BlsKeyPair> = (1..=3u8).map(keypair).collect();
        let message = b"finalized-vertex";
        let sigs: Vec<Signature> = signers.iter().map(|kp| kp.sign(message)).collect();
        let sig_refs: Vec<&Signature> = sigs.iter().collect();
        let agg = aggregate(&sig_refs).unwrap();

        let pk_refs: Vec<&PublicKey> = signers.iter().map(|kp| &kp.public_key).collect();
        assert!(verify_aggregate(message, &agg, &pk_refs).is_ok());
    }

    #[test]
    fn aggregate_rejects_empty_set() {
        assert!(matches!(aggregate(&[]), Err(BlsError::EmptyAggregate)));
    }
}
