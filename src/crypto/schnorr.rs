//! Schnorr signature implementation
//!
//! Uses the secp256k1 curve with Schnorr signatures. Ledger code only sees
//! the [`SignatureScheme`] capability; [`Schnorr`] is the scheme nodes run
//! with unless a caller plugs in another one.

use k256::schnorr::{SigningKey, VerifyingKey, Signature};
use k256::schnorr::signature::{Signer, Verifier};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signature errors
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
}

/// Verification capability over a byte payload.
///
/// Implementations must be pure: the same key, message and signature always
/// produce the same answer, and malformed inputs yield `false` rather than a
/// panic.
pub trait SignatureScheme {
    /// Check `signature` over `message` against the owner key `key`
    fn verify(&self, key: &PublicKey, message: &[u8], signature: &[u8]) -> bool;
}

/// BIP-340 style Schnorr over secp256k1
#[derive(Debug, Clone, Copy, Default)]
pub struct Schnorr;

impl SignatureScheme for Schnorr {
    fn verify(&self, key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        let verifying_key = match VerifyingKey::from_bytes(&key.0) {
            Ok(vk) => vk,
            Err(_) => return false,
        };

        // k256 only accepts exactly 64 signature bytes
        let bytes: &[u8; 64] = match signature.try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let sig = match Signature::try_from(bytes.as_slice()) {
            Ok(s) => s,
            Err(_) => return false,
        };

        verifying_key.verify(message, &sig).is_ok()
    }
}

/// 32-byte private key
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

/// 32-byte public key (x-only for Schnorr)
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "pubkey_serde")] pub [u8; 32]);

/// 64-byte Schnorr signature
#[derive(Clone, PartialEq, Eq)]
pub struct SchnorrSignature(pub [u8; 64]);

mod pubkey_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: String = Deserialize::deserialize(deserializer)?;
        let bytes = hex::decode(encoded).map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("Invalid public key length"));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

impl PrivateKey {
    /// Generate a new random private key
    pub fn generate() -> Self {
        PrivateKey(SigningKey::random(&mut OsRng))
    }

    /// Create from 32 bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, SignatureError> {
        SigningKey::from_bytes(bytes)
            .map(PrivateKey)
            .map_err(|_| SignatureError::InvalidPrivateKey)
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        let bytes = self.0.verifying_key().to_bytes();
        PublicKey(bytes.into())
    }

    /// Sign an arbitrary payload
    pub fn sign(&self, message: &[u8]) -> SchnorrSignature {
        let signature: Signature = self.0.sign(message);
        SchnorrSignature(signature.to_bytes())
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }
}

impl SchnorrSignature {
    /// Export to bytes
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0
    }

    /// Owned byte form stored in transaction inputs
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl std::fmt::Debug for SchnorrSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let private = PrivateKey::generate();
        let public = private.public_key();

        let signature = private.sign(b"test message");

        assert!(Schnorr.verify(&public, b"test message", &signature.to_bytes()));
    }

    #[test]
    fn test_wrong_key_fails() {
        let private1 = PrivateKey::generate();
        let public2 = PrivateKey::generate().public_key();

        let signature = private1.sign(b"test message");

        assert!(!Schnorr.verify(&public2, b"test message", &signature.to_bytes()));
    }

    #[test]
    fn test_wrong_message_fails() {
        let private = PrivateKey::generate();
        let public = private.public_key();

        let signature = private.sign(b"message 1");

        assert!(!Schnorr.verify(&public, b"message 2", &signature.to_bytes()));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let public = PrivateKey::generate().public_key();

        assert!(!Schnorr.verify(&public, b"msg", &[]));
        assert!(!Schnorr.verify(&public, b"msg", &[0xffu8; 5]));
        assert!(!Schnorr.verify(&public, b"msg", &[7u8; 31]));
        assert!(!Schnorr.verify(&public, b"msg", &[7u8; 63]));
        assert!(!Schnorr.verify(&public, b"msg", &[7u8; 65]));
        assert!(!Schnorr.verify(&public, b"msg", &[0u8; 64]));
    }

    #[test]
    fn test_key_serialization() {
        let private = PrivateKey::generate();
        let recovered = PrivateKey::from_bytes(&private.to_bytes()).unwrap();

        assert_eq!(private.public_key(), recovered.public_key());
    }

    #[test]
    fn test_public_key_json_is_hex() {
        let public = PrivateKey::generate().public_key();
        let json = serde_json::to_string(&public).unwrap();

        assert_eq!(json, format!("\"{}\"", hex::encode(public.0)));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, public);
    }
}
