//! secp256k1 validation-code adapter
//!
//! Implements `SignatureOracle`: a credential is the address of a secp256k1
//! key, and a signature verifies iff it is low-s and recovers to that
//! address.

use crate::domain::{keccak256, Address, Hash, SIGNATURE_LENGTH};
use crate::ports::SignatureOracle;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use subtle::Choice;
use tracing::debug;

/// Half of the secp256k1 curve order.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Signature oracle backed by secp256k1 public key recovery.
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaSignatureOracle;

impl EcdsaSignatureOracle {
    /// Create the oracle.
    pub fn new() -> Self {
        Self
    }
}

impl SignatureOracle for EcdsaSignatureOracle {
    fn verify(&self, credential: &Address, message_hash: &Hash, signature: &[u8]) -> bool {
        match recover_address(message_hash, signature) {
            Some(recovered) => recovered == *credential,
            None => {
                debug!("[smc] signature rejected before recovery");
                false
            }
        }
    }
}

/// Recover the signer address of a 65-byte `r || s || v` signature.
///
/// Returns `None` for wrong length, high s, bad recovery id or failed
/// recovery.
pub fn recover_address(message_hash: &Hash, signature: &[u8]) -> Option<Address> {
    if signature.len() != SIGNATURE_LENGTH {
        return None;
    }

    let mut s = [0u8; 32];
    s.copy_from_slice(&signature[32..64]);
    if !is_low_s(&s) {
        return None;
    }

    let recovery_id = parse_recovery_id(signature[64])?;
    let sig = Signature::from_slice(&signature[..64]).ok()?;
    let key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id).ok()?;
    Some(credential_of(&key))
}

/// Credential (address) of a secp256k1 public key.
pub fn credential_of(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    // Skip the 0x04 prefix
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Produce a low-s `r || s || v` signature (v in {27, 28}) over a hash.
pub fn sign_hash(key: &SigningKey, message_hash: &Hash) -> Result<Vec<u8>, k256::ecdsa::Error> {
    let (sig, recid) = key.sign_prehash_recoverable(message_hash)?;
    let (sig, recid) = match sig.normalize_s() {
        // Negating s flips the parity of R's y coordinate
        Some(normalized) => (
            normalized,
            RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced()),
        ),
        None => (sig, recid),
    };

    let mut out = Vec::with_capacity(SIGNATURE_LENGTH);
    out.extend_from_slice(&sig.to_bytes());
    out.push(recid.to_byte() + 27);
    Ok(out)
}

/// Constant-time `s < n/2` check.
fn is_low_s(s: &[u8; 32]) -> bool {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for (s_byte, h_byte) in s.iter().zip(SECP256K1_HALF_ORDER.iter()) {
        let not_decided = !(less | greater);
        less |= not_decided & Choice::from((s_byte < h_byte) as u8);
        greater |= not_decided & Choice::from((s_byte > h_byte) as u8);
    }

    less.into()
}

/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Option<RecoveryId> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return None,
    };
    RecoveryId::from_byte(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::withdraw_message;

    fn key(n: u8) -> SigningKey {
        SigningKey::from_slice(&[n; 32]).unwrap()
    }

    #[test]
    fn test_sign_then_verify() {
        let key = key(1);
        let credential = credential_of(key.verifying_key());
        let message = withdraw_message();
        let signature = sign_hash(&key, &message).unwrap();

        assert_eq!(signature.len(), SIGNATURE_LENGTH);
        assert!(EcdsaSignatureOracle.verify(&credential, &message, &signature));
    }

    #[test]
    fn test_random_keys_verify() {
        for _ in 0..8 {
            let key = SigningKey::random(&mut rand::thread_rng());
            let credential = credential_of(key.verifying_key());
            let message = keccak256(credential.as_slice());
            let signature = sign_hash(&key, &message).unwrap();
            assert_eq!(recover_address(&message, &signature), Some(credential));
        }
    }

    #[test]
    fn test_wrong_credential_rejected() {
        let signature = sign_hash(&key(1), &withdraw_message()).unwrap();
        let other = credential_of(key(2).verifying_key());
        assert!(!EcdsaSignatureOracle.verify(&other, &withdraw_message(), &signature));
    }

    #[test]
    fn test_wrong_message_rejected() {
        let key = key(3);
        let credential = credential_of(key.verifying_key());
        let signature = sign_hash(&key, &withdraw_message()).unwrap();
        assert!(!EcdsaSignatureOracle.verify(&credential, &keccak256(b"other"), &signature));
    }

    #[test]
    fn test_malformed_signatures_rejected() {
        let credential = credential_of(key(4).verifying_key());
        let message = withdraw_message();
        assert!(!EcdsaSignatureOracle.verify(&credential, &message, &[]));
        assert!(!EcdsaSignatureOracle.verify(&credential, &message, &[0u8; 64]));
        assert!(!EcdsaSignatureOracle.verify(&credential, &message, &[0u8; 65]));

        let mut bad_v = sign_hash(&key(4), &message).unwrap();
        bad_v[64] = 5;
        assert!(!EcdsaSignatureOracle.verify(&credential, &message, &bad_v));
    }

    #[test]
    fn test_v_accepts_raw_recovery_id() {
        let key = key(5);
        let credential = credential_of(key.verifying_key());
        let message = withdraw_message();
        let mut signature = sign_hash(&key, &message).unwrap();
        signature[64] -= 27;
        assert!(EcdsaSignatureOracle.verify(&credential, &message, &signature));
    }

    #[test]
    fn test_is_low_s_boundary() {
        assert!(is_low_s(&[0u8; 32]));
        assert!(!is_low_s(&SECP256K1_HALF_ORDER));
        assert!(!is_low_s(&[0xFF; 32]));
    }
}
