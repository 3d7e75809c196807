//! Scriptable in-memory ledger for engine tests.

use crate::client::{ClientError, LedgerClient, StatusWatcher};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use txflood_types::{AccountId, BlockHeight, Hash, SignedTransfer, TxStatus};

/// One accepted submission, in arrival order.
pub(crate) struct SubmissionRecord {
    pub nonce: u64,
    pub hash: Hash,
    pub at: Instant,
}

/// In-memory ledger with scriptable per-nonce outcomes.
///
/// Every accepted submission completes as `Included` after the
/// configured delay unless its nonce is scripted to fail at submit,
/// be dropped from the pool, or lose its status stream.
pub(crate) struct MockLedger {
    initial_sequence: u64,
    completion_delay: Duration,
    /// Extra random delay on top of `completion_delay`, for
    /// out-of-order completions. Seeded, so runs are reproducible.
    jitter: Option<Mutex<(ChaCha8Rng, Duration)>>,
    delay_overrides: HashMap<u64, Duration>,
    fail_submit: HashSet<u64>,
    unreachable: bool,
    drop_nonces: HashSet<u64>,
    lose_stream_nonces: HashSet<u64>,
    submissions: Mutex<Vec<SubmissionRecord>>,
    sequence_queries: AtomicU64,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: AtomicUsize,
}

impl MockLedger {
    pub fn new(initial_sequence: u64) -> Self {
        Self {
            initial_sequence,
            completion_delay: Duration::from_millis(10),
            jitter: None,
            delay_overrides: HashMap::new(),
            fail_submit: HashSet::new(),
            unreachable: false,
            drop_nonces: HashSet::new(),
            lose_stream_nonces: HashSet::new(),
            submissions: Mutex::new(Vec::new()),
            sequence_queries: AtomicU64::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }

    pub fn with_jitter(mut self, seed: u64, max_extra: Duration) -> Self {
        self.jitter = Some(Mutex::new((ChaCha8Rng::seed_from_u64(seed), max_extra)));
        self
    }

    /// Override the completion delay for one nonce.
    pub fn delay_at(mut self, nonce: u64, delay: Duration) -> Self {
        self.delay_overrides.insert(nonce, delay);
        self
    }

    /// Make every sequence query fail, as an unreachable node would.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Script the submission with this nonce to be refused at submit.
    pub fn fail_submit_at(mut self, nonce: u64) -> Self {
        self.fail_submit.insert(nonce);
        self
    }

    /// Script the submission with this nonce to be dropped from the pool.
    pub fn drop_at(mut self, nonce: u64) -> Self {
        self.drop_nonces.insert(nonce);
        self
    }

    /// Script the status stream for this nonce to end without a
    /// terminal event.
    pub fn lose_stream_at(mut self, nonce: u64) -> Self {
        self.lose_stream_nonces.insert(nonce);
        self
    }

    /// Accepted nonces in arrival order.
    pub fn submitted_nonces(&self) -> Vec<u64> {
        self.submissions.lock().iter().map(|r| r.nonce).collect()
    }

    /// Arrival timestamps, in arrival order.
    pub fn submission_times(&self) -> Vec<Instant> {
        self.submissions.lock().iter().map(|r| r.at).collect()
    }

    /// High-water mark of submitted-but-unresolved operations.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn sequence_queries(&self) -> u64 {
        self.sequence_queries.load(Ordering::SeqCst)
    }

    fn next_delay(&self, nonce: u64) -> Duration {
        if let Some(&delay) = self.delay_overrides.get(&nonce) {
            return delay;
        }
        match &self.jitter {
            Some(jitter) => {
                let mut guard = jitter.lock();
                let max_extra = guard.1;
                self.completion_delay + guard.0.gen_range(Duration::ZERO..max_extra)
            }
            None => self.completion_delay,
        }
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_account_sequence(&self, _account: &AccountId) -> Result<u64, ClientError> {
        self.sequence_queries.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(ClientError::Connection("node unreachable".into()));
        }
        Ok(self.initial_sequence)
    }

    async fn submit_and_watch(&self, tx: &SignedTransfer) -> Result<StatusWatcher, ClientError> {
        assert!(tx.verify(), "mock received an unsigned transfer");
        let nonce = tx.payload.nonce;

        if self.fail_submit.contains(&nonce) {
            return Err(ClientError::Rejected("scripted submit failure".into()));
        }

        let hash = tx.hash();
        self.submissions.lock().push(SubmissionRecord {
            nonce,
            hash,
            at: Instant::now(),
        });

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = self.next_delay(nonce);
        let dropped = self.drop_nonces.contains(&nonce);
        let lose_stream = self.lose_stream_nonces.contains(&nonce);

        let (events_tx, events_rx) = mpsc::channel(8);
        let gauge = CountGuard(Arc::clone(&self.in_flight));
        tokio::spawn(async move {
            let _gauge = gauge;
            tokio::time::sleep(delay).await;

            if lose_stream {
                return;
            }

            let _ = events_tx.send(TxStatus::Submitted).await;
            let terminal = if dropped {
                TxStatus::Dropped("scripted drop".into())
            } else {
                TxStatus::Included(BlockHeight(nonce))
            };
            let _ = events_tx.send(terminal).await;
        });

        Ok(StatusWatcher::new(hash, events_rx))
    }

    async fn disconnect(&self) {}
}

/// Decrements the shared in-flight gauge when the feeder task exits.
struct CountGuard(Arc<AtomicUsize>);

impl Drop for CountGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
