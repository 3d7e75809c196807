//! Transfer payload construction and signing.
//!
//! The signing message is domain-separated so a transfer signature can
//! never be replayed in another signing context.

use crate::{AccountId, Hash, Keypair, Signature};
use serde::{Deserialize, Serialize};

/// Domain tag for transfer signatures.
///
/// Format: `transfer:` || sender || destination || amount || nonce
pub const DOMAIN_TRANSFER: &[u8] = b"transfer:";

/// An unsigned transfer operation.
///
/// The nonce orders the sender's operations on chain and prevents
/// replay; it must match the account's next expected sequence number
/// at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    /// Sending account (pays fees, provides the nonce).
    pub sender: AccountId,
    /// Receiving account.
    pub destination: AccountId,
    /// Transfer amount in base units.
    pub amount: u64,
    /// Sender sequence number attached to this operation.
    pub nonce: u64,
}

impl TransferPayload {
    /// Build a transfer payload, rejecting degenerate parameters.
    pub fn build(
        sender: AccountId,
        destination: AccountId,
        amount: u64,
        nonce: u64,
    ) -> Result<Self, BuildError> {
        if amount == 0 {
            return Err(BuildError::ZeroAmount);
        }

        Ok(Self {
            sender,
            destination,
            amount,
            nonce,
        })
    }

    /// Build the domain-separated signing message for this payload.
    pub fn signing_bytes(&self) -> Vec<u8> {
        // 9 (tag) + 32 + 32 + 8 + 8 = 89 bytes
        let mut message = Vec::with_capacity(96);
        message.extend_from_slice(DOMAIN_TRANSFER);
        message.extend_from_slice(self.sender.as_bytes());
        message.extend_from_slice(self.destination.as_bytes());
        message.extend_from_slice(&self.amount.to_le_bytes());
        message.extend_from_slice(&self.nonce.to_le_bytes());
        message
    }

    /// Sign the payload with the sender's key.
    pub fn sign(self, keypair: &Keypair) -> SignedTransfer {
        let signature = keypair.sign(&self.signing_bytes());
        SignedTransfer {
            payload: self,
            signature,
        }
    }
}

/// A signed transfer, ready for submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransfer {
    /// The transfer being authorized.
    pub payload: TransferPayload,
    /// Sender signature over the payload's signing bytes.
    pub signature: Signature,
}

impl SignedTransfer {
    /// Canonical byte encoding: signing message followed by signature.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.payload.signing_bytes();
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes
    }

    /// Content hash identifying this operation.
    pub fn hash(&self) -> Hash {
        Hash::from_bytes(&self.to_bytes())
    }

    /// Verify the signature against the sender's account key.
    pub fn verify(&self) -> bool {
        self.signature
            .verify(&self.payload.sender, &self.payload.signing_bytes())
    }
}

/// Errors that can occur when building a transfer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Transfer amount must be non-zero.
    #[error("Transfer amount must be non-zero")]
    ZeroAmount,
}
