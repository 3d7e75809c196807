//! Ed25519 signing keys for transaction submission.

use crate::AccountId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An Ed25519 key pair used to sign submitted operations.
#[derive(Clone)]
pub struct Keypair(ed25519_dalek::SigningKey);

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Keypair(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Create a keypair from a 32-byte seed (deterministic).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Keypair(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    /// Parse a keypair from a 64-character hex-encoded seed.
    pub fn from_hex(hex: &str) -> Result<Self, KeypairError> {
        if hex.len() != 64 {
            return Err(KeypairError::InvalidSeedLength(hex.len()));
        }

        let mut seed = [0u8; 32];
        hex::decode_to_slice(hex, &mut seed).map_err(|_| KeypairError::InvalidSeedHex)?;
        Ok(Self::from_seed(&seed))
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message).to_bytes())
    }

    /// Get the public key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.0.verifying_key().to_bytes()
    }

    /// The account this keypair controls (address = public key).
    pub fn account_id(&self) -> AccountId {
        AccountId(self.public_key())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({}..)", &hex::encode(self.public_key())[..8])
    }
}

/// An Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Verify this signature over a message against an account's key.
    pub fn verify(&self, account: &AccountId, message: &[u8]) -> bool {
        use ed25519_dalek::Verifier;
        let key = match ed25519_dalek::VerifyingKey::from_bytes(account.as_bytes()) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let sig = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify(message, &sig).is_ok()
    }

    /// Get signature as byte slice.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &hex::encode(self.0)[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        if hex.len() != 128 {
            return Err(serde::de::Error::custom("signature must be 64 bytes"));
        }
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(&hex, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(Signature(bytes))
    }
}

/// Errors that can occur when loading a keypair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeypairError {
    /// Seed hex string has the wrong length.
    #[error("Invalid seed length: expected 64 hex chars, got {0}")]
    InvalidSeedLength(usize),

    /// Seed contains non-hex characters.
    #[error("Invalid seed hex string")]
    InvalidSeedHex,
}
