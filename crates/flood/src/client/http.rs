//! HTTP implementation of the ledger client.
//!
//! Submission is a single JSON POST of the hex-encoded transaction.
//! The status subscription is synthesized by polling the node's status
//! endpoint and translating transitions into [`TxStatus`] events; the
//! poll task stops once it has delivered a settling event or the
//! watcher has been dropped.

use crate::client::types::{
    AccountSequenceResponse, SubmitTransactionRequest, SubmitTransactionResponse,
    TransactionStatusResponse,
};
use crate::client::{ClientError, LedgerClient, StatusWatcher};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use txflood_types::{AccountId, Hash, SignedTransfer, TxStatus};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Ledger client over the node's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    base_url: String,
    client: reqwest::Client,
    poll_interval: Duration,
}

impl HttpLedgerClient {
    /// Create a client for the given node endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the status poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The node endpoint this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_status(&self, hash: &Hash) -> Result<TransactionStatusResponse, ClientError> {
        let url = format!("{}/transactions/{}", self.base_url, hash.to_hex());
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Poll the status endpoint, feeding transitions into the watcher
    /// channel until a settling event is delivered or the watcher is
    /// dropped.
    async fn poll_status(self, hash: Hash, events: mpsc::Sender<TxStatus>) {
        if events.send(TxStatus::Submitted).await.is_err() {
            return;
        }

        let mut last_sent = TxStatus::Submitted;
        loop {
            tokio::time::sleep(self.poll_interval).await;

            let status = match self.fetch_status(&hash).await {
                Ok(response) => response.to_status(),
                Err(e) => {
                    // Not indexed yet or transient failure; keep polling.
                    debug!(hash = %hash, error = %e, "Status poll error");
                    continue;
                }
            };

            let Some(status) = status else { continue };
            if status == last_sent {
                continue;
            }

            let settles = status.is_resolution();
            if events.send(status.clone()).await.is_err() {
                // Watcher abandoned the subscription.
                return;
            }
            if settles {
                return;
            }
            last_sent = status;
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn get_account_sequence(&self, account: &AccountId) -> Result<u64, ClientError> {
        let url = format!("{}/accounts/{}/sequence", self.base_url, account.to_hex());
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: AccountSequenceResponse = response.json().await?;
        Ok(body.sequence)
    }

    async fn submit_and_watch(&self, tx: &SignedTransfer) -> Result<StatusWatcher, ClientError> {
        let request = SubmitTransactionRequest {
            transaction_hex: hex::encode(tx.to_bytes()),
        };

        let url = format!("{}/transactions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body: SubmitTransactionResponse = response.json().await?;

        if !body.accepted {
            return Err(ClientError::Rejected(
                body.error.unwrap_or_else(|| "submission refused".to_string()),
            ));
        }

        let hash = tx.hash();
        if body.hash != hash.to_hex() {
            return Err(ClientError::MalformedResponse(format!(
                "node reported hash {} for transaction {}",
                body.hash, hash
            )));
        }

        let (events_tx, events_rx) = mpsc::channel(8);
        tokio::spawn(self.clone().poll_status(hash, events_tx));

        Ok(StatusWatcher::new(hash, events_rx))
    }

    async fn disconnect(&self) {
        // Connections are pooled per request; outstanding poll tasks own
        // their own handle to the pool and wind down on watcher drop.
        debug!(endpoint = %self.base_url, "Ledger client disconnected");
    }
}
