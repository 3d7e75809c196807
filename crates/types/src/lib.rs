//! Core types for the txflood submission engine.
//!
//! This crate holds everything shared between the engine and the wire
//! layer: content hashes, account identity, Ed25519 signing, transfer
//! payload construction, and the transaction status lifecycle.

mod account;
mod hash;
mod keypair;
mod status;
mod transfer;

pub use account::{AccountId, BlockHeight};
pub use hash::{Hash, HexError};
pub use keypair::{Keypair, KeypairError, Signature};
pub use status::TxStatus;
pub use transfer::{BuildError, SignedTransfer, TransferPayload, DOMAIN_TRANSFER};
