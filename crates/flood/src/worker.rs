//! One submission task: build, sign, submit, await resolution.

use crate::client::{LedgerClient, Resolution};
use crate::stats::RunStats;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use txflood_types::{AccountId, BlockHeight, Keypair, TransferPayload};

/// Executes one submission from nonce to terminal outcome.
///
/// Every failure on any step is caught here and converted into a
/// counted outcome; nothing propagates to the pacing loop. Exactly one
/// outcome is recorded into the shared stats per worker.
pub(crate) struct SubmissionWorker<C> {
    /// Issuance index (0-based), for logging.
    pub index: u64,
    /// Assigned nonce, or None when each task queries its own.
    pub nonce: Option<u64>,
    pub keypair: Arc<Keypair>,
    pub destination: AccountId,
    pub amount: u64,
    pub client: Arc<C>,
    pub stats: Arc<RunStats>,
}

/// Terminal outcome of one submission task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TaskOutcome {
    /// The operation reached an accepted ledger position.
    Included {
        height: BlockHeight,
        latency: std::time::Duration,
    },
    /// Anything else: build, sign, submit or status failure.
    Failed { reason: String },
}

impl<C: LedgerClient> SubmissionWorker<C> {
    /// Run the task to its terminal outcome, recording it once.
    pub async fn run(self) -> TaskOutcome {
        let outcome = match self.execute().await {
            Ok((nonce, height, latency)) => {
                info!(
                    index = self.index,
                    nonce,
                    height = height.0,
                    latency_ms = latency.as_millis() as u64,
                    "Transaction included"
                );
                self.stats.record_success(latency);
                TaskOutcome::Included { height, latency }
            }
            Err(reason) => {
                warn!(index = self.index, %reason, "Transaction failed");
                self.stats.record_failure();
                TaskOutcome::Failed { reason }
            }
        };

        outcome
    }

    async fn execute(&self) -> Result<(u64, BlockHeight, std::time::Duration), String> {
        // Queried-per-task nonces are best effort: concurrent tasks can
        // observe the same sequence value.
        let nonce = match self.nonce {
            Some(nonce) => nonce,
            None => self
                .client
                .get_account_sequence(&self.keypair.account_id())
                .await
                .map_err(|e| format!("sequence query failed: {e}"))?,
        };

        let payload =
            TransferPayload::build(self.keypair.account_id(), self.destination, self.amount, nonce)
                .map_err(|e| format!("build failed: {e}"))?;
        let signed = payload.sign(&self.keypair);

        let submitted_at = Instant::now();
        let watcher = self
            .client
            .submit_and_watch(&signed)
            .await
            .map_err(|e| format!("submit failed: {e}"))?;
        debug!(index = self.index, nonce, hash = %watcher.hash(), "Transaction submitted");

        match watcher.first_resolution().await {
            Resolution::Included(height) => Ok((nonce, height, submitted_at.elapsed())),
            Resolution::Rejected(reason) => Err(format!("rejected: {reason}")),
            Resolution::SubscriptionLost => {
                Err("status subscription ended before a terminal event".to_string())
            }
        }
    }
}
