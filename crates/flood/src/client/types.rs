//! Types for RPC client communication.

use serde::{Deserialize, Serialize};
use txflood_types::{BlockHeight, TxStatus};

/// Request to submit a transaction.
#[derive(Debug, Serialize)]
pub struct SubmitTransactionRequest {
    pub transaction_hex: String,
}

/// Response from transaction submission.
#[derive(Debug, Deserialize)]
pub struct SubmitTransactionResponse {
    pub accepted: bool,
    pub hash: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response from the account sequence endpoint.
#[derive(Debug, Deserialize)]
pub struct AccountSequenceResponse {
    pub sequence: u64,
}

/// Response from the transaction status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionStatusResponse {
    /// Current status of the transaction.
    /// Possible values: "pending", "submitted", "included", "finalized",
    /// "dropped", "invalid", "unknown"
    pub status: String,
    /// Block height where included/finalized (if known).
    #[serde(default)]
    pub height: Option<u64>,
    /// Failure reason for dropped/invalid transactions.
    #[serde(default)]
    pub error: Option<String>,
}

impl TransactionStatusResponse {
    /// Convert to a typed [`TxStatus`] if possible.
    ///
    /// Returns None for unknown statuses, which callers should treat
    /// as "keep polling".
    pub fn to_status(&self) -> Option<TxStatus> {
        let height = || BlockHeight(self.height.unwrap_or(0));
        let reason = |fallback: &str| self.error.clone().unwrap_or_else(|| fallback.to_string());

        match self.status.as_str() {
            "pending" | "submitted" => Some(TxStatus::Submitted),
            "included" => Some(TxStatus::Included(height())),
            "finalized" => Some(TxStatus::Finalized(height())),
            "dropped" => Some(TxStatus::Dropped(reason("dropped from pool"))),
            "invalid" => Some(TxStatus::Invalid(reason("rejected by network"))),
            _ => None,
        }
    }
}
