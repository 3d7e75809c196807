//! Ledger client abstraction and the status subscription primitive.

use async_trait::async_trait;
use tokio::sync::mpsc;
use txflood_types::{AccountId, BlockHeight, Hash, SignedTransfer, TxStatus};

pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpLedgerClient;

/// Client for the remote ledger node.
///
/// Implementations must be safe to share across concurrently running
/// submission tasks.
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// Query the account's current next sequence number.
    async fn get_account_sequence(&self, account: &AccountId) -> Result<u64, ClientError>;

    /// Submit a signed transfer and subscribe to its status stream.
    ///
    /// Returns once the node has accepted the submission; the watcher
    /// delivers subsequent lifecycle transitions.
    async fn submit_and_watch(&self, tx: &SignedTransfer) -> Result<StatusWatcher, ClientError>;

    /// Release the connection. Idempotent; safe to call with any
    /// number of outstanding watchers.
    async fn disconnect(&self);
}

/// Subscription to one submitted operation's status stream.
///
/// Resolves exactly once, on the first event that settles the outcome:
/// inclusion in a block (success) or a definitive drop/rejection
/// (failure). Later events for the same operation are ignored.
/// Dropping the watcher abandons the subscription; the feeding side
/// observes the closed channel and stops.
#[derive(Debug)]
pub struct StatusWatcher {
    hash: Hash,
    events: mpsc::Receiver<TxStatus>,
}

/// The settled outcome of one watched submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The operation reached an accepted ledger position.
    Included(BlockHeight),
    /// The operation was dropped or rejected by the network.
    Rejected(String),
    /// The status stream ended before any settling event arrived.
    SubscriptionLost,
}

impl StatusWatcher {
    /// Create a watcher over a channel of status events.
    pub fn new(hash: Hash, events: mpsc::Receiver<TxStatus>) -> Self {
        Self { hash, events }
    }

    /// Content hash of the watched operation.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Wait for the first settling status transition.
    ///
    /// Consumes the watcher: once resolved, the subscription is
    /// abandoned and later events (e.g. a finality confirmation) are
    /// never observed by the caller.
    pub async fn first_resolution(mut self) -> Resolution {
        while let Some(event) = self.events.recv().await {
            if !event.is_resolution() {
                continue;
            }
            return match event {
                TxStatus::Included(height) | TxStatus::Finalized(height) => {
                    Resolution::Included(height)
                }
                TxStatus::Dropped(reason) | TxStatus::Invalid(reason) => {
                    Resolution::Rejected(reason)
                }
                TxStatus::Submitted => unreachable!("Submitted is not a resolution"),
            };
        }

        Resolution::SubscriptionLost
    }
}

// Lets callers hold the concrete client in an Arc and still hand it to
// the runner by value.
#[async_trait]
impl<C: LedgerClient> LedgerClient for std::sync::Arc<C> {
    async fn get_account_sequence(&self, account: &AccountId) -> Result<u64, ClientError> {
        (**self).get_account_sequence(account).await
    }

    async fn submit_and_watch(&self, tx: &SignedTransfer) -> Result<StatusWatcher, ClientError> {
        (**self).submit_and_watch(tx).await
    }

    async fn disconnect(&self) {
        (**self).disconnect().await
    }
}

/// Errors from the ledger client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Could not reach the ledger node at all.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Transport-level failure reaching the node.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The node refused the submission outright.
    #[error("Node rejected submission: {0}")]
    Rejected(String),

    /// The node answered with something we could not interpret.
    #[error("Malformed node response: {0}")]
    MalformedResponse(String),
}
