//! Transaction status lifecycle.

use crate::BlockHeight;
use std::fmt;

/// Lifecycle status of a submitted operation, as observed from the
/// node's status stream.
///
/// `Submitted → Included → Finalized` is the happy path;
/// `Dropped` and `Invalid` are terminal failures. For submission
/// accounting, `Included` is the success transition: a later
/// `Finalized` event never changes an already resolved outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Accepted into the node's pool, not yet in a block.
    Submitted,
    /// Placed into an accepted block at the given height.
    Included(BlockHeight),
    /// The including block became irreversible.
    Finalized(BlockHeight),
    /// Dropped from the pool without inclusion.
    Dropped(String),
    /// Rejected by the network (bad nonce, insufficient balance, ...).
    Invalid(String),
}

impl TxStatus {
    /// Whether this event resolves a submission's outcome.
    ///
    /// `Finalized` counts: if polling missed the `Included` transition,
    /// finality still proves inclusion.
    pub fn is_resolution(&self) -> bool {
        !matches!(self, TxStatus::Submitted)
    }

    /// Whether this event resolves the submission as succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, TxStatus::Included(_) | TxStatus::Finalized(_))
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Submitted => write!(f, "submitted"),
            TxStatus::Included(height) => write!(f, "included at {}", height),
            TxStatus::Finalized(height) => write!(f, "finalized at {}", height),
            TxStatus::Dropped(reason) => write!(f, "dropped: {}", reason),
            TxStatus::Invalid(reason) => write!(f, "invalid: {}", reason),
        }
    }
}
