//! The pacing loop that drives a submission run.

use crate::client::{ClientError, LedgerClient};
use crate::config::{ConfigError, NonceMode, SubmissionPlan, Termination};
use crate::limiter::ConcurrencyLimiter;
use crate::nonce::NonceAllocator;
use crate::stats::{RunStats, Summary};
use crate::worker::SubmissionWorker;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use txflood_types::Keypair;

/// Drives one submission run: `Idle → Issuing → Draining → Done`.
///
/// A single control loop owns all pacing decisions. Each admitted
/// submission runs as an independent task; the only shared state is
/// the nonce allocator (exclusive cursor), the concurrency limiter and
/// the atomic stats counters.
pub struct Runner<C> {
    plan: SubmissionPlan,
    keypair: Arc<Keypair>,
    client: Arc<C>,
    stats: Arc<RunStats>,
}

impl<C: LedgerClient> Runner<C> {
    /// Create a runner, validating the plan.
    ///
    /// Plan violations are fatal here, before any issuance.
    pub fn new(plan: SubmissionPlan, keypair: Keypair, client: C) -> Result<Self, RunnerError> {
        plan.validate()?;
        Ok(Self {
            plan,
            keypair: Arc::new(keypair),
            client: Arc::new(client),
            stats: Arc::new(RunStats::default()),
        })
    }

    /// Shared statistics, for live observation during a run.
    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Run without external cancellation.
    pub async fn run_to_completion(self) -> Result<Summary, RunnerError> {
        self.run(CancellationToken::new()).await
    }

    /// Run the plan to its final summary.
    ///
    /// Pacing follows absolute tick deadlines spaced one interval
    /// apart; boundaries missed during a stall are skipped, never
    /// batched, so the emitted rate cannot exceed the configured
    /// maximum. Cancelling the token stops issuance promptly; tasks
    /// already in flight are drained to completion, since submitted
    /// operations are irrevocable and abandoning their watchers would
    /// only lose accounting.
    pub async fn run(self, cancel: CancellationToken) -> Result<Summary, RunnerError> {
        let start = Instant::now();

        // Auto mode seeds the cursor from the chain exactly once. A
        // failure here is fatal: the loop never starts.
        let allocator = match self.plan.nonce_mode {
            NonceMode::Auto => {
                let initial = self
                    .client
                    .get_account_sequence(&self.keypair.account_id())
                    .await
                    .map_err(RunnerError::Connect)?;
                Some(NonceAllocator::new(initial))
            }
            NonceMode::QueryPerTask => None,
        };

        let planned = self.plan.planned_total();
        let interval = self.plan.tick_interval();
        let limiter = ConcurrencyLimiter::new(self.plan.concurrency);

        info!(
            rate = self.plan.rate,
            planned,
            concurrency = self.plan.concurrency,
            nonce_mode = ?self.plan.nonce_mode,
            "Starting submission run"
        );

        // Duration mode gets a child token so the wall-clock cutoff
        // and an external interrupt stop issuance the same way.
        let issue_cancel = cancel.child_token();
        if let Termination::Duration(duration) = self.plan.termination {
            let cutoff = issue_cancel.clone();
            let end = start + duration;
            tokio::spawn(async move {
                sleep_until(end).await;
                cutoff.cancel();
            });
        }

        let progress = self.spawn_progress_reporter(start);

        let mut tasks = JoinSet::new();
        let mut next_tick = start;
        let mut issued = 0u64;

        while issued < planned {
            tokio::select! {
                _ = issue_cancel.cancelled() => break,
                _ = sleep_until(next_tick) => {}
            }

            // Admission can outwait the tick while the bound is held.
            let permit = tokio::select! {
                _ = issue_cancel.cancelled() => break,
                permit = limiter.admit() => permit,
            };

            // Nonce consumption is ordered by this loop alone, so
            // assigned values are strictly increasing in issuance order.
            let nonce = allocator.as_ref().map(|a| a.next());
            self.stats.record_attempt();

            let worker = SubmissionWorker {
                index: issued,
                nonce,
                keypair: Arc::clone(&self.keypair),
                destination: self.plan.destination,
                amount: self.plan.amount,
                client: Arc::clone(&self.client),
                stats: Arc::clone(&self.stats),
            };
            tasks.spawn(async move {
                let _permit = permit;
                worker.run().await;
            });

            issued += 1;
            next_tick += interval;

            // Skip boundaries that elapsed during a stall instead of
            // issuing a catch-up burst for them.
            let now = Instant::now();
            while next_tick <= now {
                next_tick += interval;
            }
        }

        info!(
            issued,
            in_flight = self.stats.in_flight(),
            "Issuance complete, draining in-flight tasks"
        );

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                // The slot was released with the permit; keep the
                // accounting complete for the summary invariant.
                warn!(error = %e, "Submission task panicked");
                self.stats.record_failure();
            }
        }

        progress.abort();
        self.client.disconnect().await;

        let summary = self.stats.snapshot(start.elapsed());
        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Run complete"
        );

        Ok(summary)
    }

    fn spawn_progress_reporter(&self, start: Instant) -> JoinHandle<()> {
        let stats = Arc::clone(&self.stats);
        let interval = self.plan.progress_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                info!(
                    elapsed_secs = start.elapsed().as_secs(),
                    attempted = stats.attempted.load(Ordering::SeqCst),
                    succeeded = stats.succeeded.load(Ordering::SeqCst),
                    failed = stats.failed.load(Ordering::SeqCst),
                    in_flight = stats.in_flight(),
                    "Progress"
                );
            }
        })
    }
}

/// Fatal errors that abort a run before any issuance.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The submission plan is invalid.
    #[error("Invalid submission plan: {0}")]
    Config(#[from] ConfigError),

    /// Could not query the initial account sequence from the node.
    #[error("Failed to reach the ledger node: {0}")]
    Connect(#[source] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockLedger;
    use std::time::Duration;

    const N0: u64 = 100;

    fn plan(termination: Termination) -> SubmissionPlan {
        SubmissionPlan::new(
            Keypair::from_seed(&[2u8; 32]).account_id(),
            termination,
        )
        .with_amount(100)
    }

    fn runner(plan: SubmissionPlan, ledger: &Arc<MockLedger>) -> Runner<Arc<MockLedger>> {
        Runner::new(plan, Keypair::from_seed(&[1u8; 32]), Arc::clone(ledger))
            .expect("plan should validate")
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_mode_issues_exactly_planned() {
        let ledger = Arc::new(MockLedger::new(N0).with_jitter(42, Duration::from_millis(50)));
        let plan = plan(Termination::Count(10)).with_rate(5).with_concurrency(3);

        let summary = runner(plan, &ledger).run_to_completion().await.unwrap();

        assert_eq!(summary.attempted, 10);
        assert_eq!(summary.succeeded, 10);
        assert_eq!(summary.failed, 0);

        // Despite jittered, out-of-order completions, the assigned
        // nonces are exactly n0..n0+10 with no gaps or repeats.
        let mut nonces = ledger.submitted_nonces();
        nonces.sort_unstable();
        assert_eq!(nonces, (N0..N0 + 10).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_mode_plans_ceil_of_rate_times_duration() {
        let ledger = Arc::new(MockLedger::new(N0));
        let plan = plan(Termination::Duration(Duration::from_secs(1))).with_rate(10);

        let summary = runner(plan, &ledger).run_to_completion().await.unwrap();

        assert_eq!(summary.attempted, 10);
        assert_eq!(summary.succeeded, 10);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_mode_seeds_the_cursor_once() {
        let ledger = Arc::new(MockLedger::new(N0));
        let plan = plan(Termination::Count(5)).with_rate(50);

        runner(plan, &ledger).run_to_completion().await.unwrap();

        assert_eq!(ledger.sequence_queries(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_task_does_not_stall_or_gap_later_nonces() {
        let ledger = Arc::new(MockLedger::new(N0).fail_submit_at(N0 + 3));
        let plan = plan(Termination::Count(10)).with_rate(20).with_concurrency(3);

        let summary = runner(plan, &ledger).run_to_completion().await.unwrap();

        assert_eq!(summary.attempted, 10);
        assert_eq!(summary.succeeded, 9);
        assert_eq!(summary.failed, 1);

        // The failed nonce was still consumed; later tasks carried on
        // with consecutive values.
        let mut nonces = ledger.submitted_nonces();
        nonces.sort_unstable();
        let expected: Vec<u64> = (N0..N0 + 10).filter(|&n| n != N0 + 3).collect();
        assert_eq!(nonces, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_one_is_fully_sequential() {
        let ledger = Arc::new(
            MockLedger::new(N0).with_completion_delay(Duration::from_millis(50)),
        );
        let plan = plan(Termination::Count(5)).with_rate(50).with_concurrency(1);

        runner(plan, &ledger).run_to_completion().await.unwrap();

        assert_eq!(ledger.max_in_flight(), 1);
        // Sequential execution means arrival order equals issuance order.
        assert_eq!(ledger.submitted_nonces(), (N0..N0 + 5).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_never_exceeds_bound() {
        let ledger = Arc::new(
            MockLedger::new(N0)
                .with_completion_delay(Duration::from_millis(80))
                .with_jitter(7, Duration::from_millis(40)),
        );
        let plan = plan(Termination::Count(20)).with_rate(100).with_concurrency(3);

        runner(plan, &ledger).run_to_completion().await.unwrap();

        assert!(ledger.max_in_flight() <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accounting_invariant_with_mixed_outcomes() {
        let ledger = Arc::new(
            MockLedger::new(N0)
                .drop_at(N0 + 2)
                .drop_at(N0 + 7)
                .lose_stream_at(N0 + 5),
        );
        let plan = plan(Termination::Count(12)).with_rate(50).with_concurrency(4);

        let summary = runner(plan, &ledger).run_to_completion().await.unwrap();

        assert_eq!(summary.attempted, 12);
        assert_eq!(summary.succeeded, 9);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.attempted, summary.succeeded + summary.failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_issuance_and_drains() {
        let ledger = Arc::new(MockLedger::new(N0));
        let plan = plan(Termination::Count(1000)).with_rate(5);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let summary = runner(plan, &ledger).run(cancel).await.unwrap();

        assert!(summary.attempted >= 1);
        assert!(summary.attempted < 1000, "issuance should stop early");
        // Every admitted task settled before the summary was taken.
        assert_eq!(summary.attempted, summary.succeeded + summary.failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_skips_missed_ticks_without_bursting() {
        // The first two submissions hold both slots long past several
        // tick boundaries; once slots free up, issuance must resume on
        // the boundary grid rather than bursting the missed ticks.
        let ledger = Arc::new(
            MockLedger::new(N0)
                .with_completion_delay(Duration::from_millis(100))
                .delay_at(N0, Duration::from_secs(5))
                .delay_at(N0 + 1, Duration::from_secs(5)),
        );
        let plan = plan(Termination::Count(4)).with_rate(1).with_concurrency(2);

        let summary = runner(plan, &ledger).run_to_completion().await.unwrap();
        assert_eq!(summary.attempted, 4);

        let times = ledger.submission_times();
        assert_eq!(times.len(), 4);
        let gap = times[3].duration_since(times[2]);
        assert!(
            gap >= Duration::from_millis(900),
            "missed ticks must not be batched, got gap {:?}",
            gap
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_per_task_mode_is_best_effort() {
        let ledger = Arc::new(MockLedger::new(7));
        let plan = plan(Termination::Count(5))
            .with_rate(50)
            .with_nonce_mode(NonceMode::QueryPerTask);

        let summary = runner(plan, &ledger).run_to_completion().await.unwrap();

        assert_eq!(summary.attempted, 5);
        // No seeding query; one query per task instead.
        assert_eq!(ledger.sequence_queries(), 5);
        // Concurrent tasks observed the same sequence value: the
        // ordering guarantee does not hold in this mode.
        assert_eq!(ledger.submitted_nonces(), vec![7; 5]);
    }

    #[tokio::test]
    async fn test_invalid_plan_is_fatal_before_issuance() {
        let ledger = Arc::new(MockLedger::new(N0));
        let plan = plan(Termination::Count(10)).with_rate(0);

        let result = Runner::new(plan, Keypair::from_seed(&[1u8; 32]), Arc::clone(&ledger));
        assert!(matches!(
            result,
            Err(RunnerError::Config(ConfigError::ZeroRate))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_fatal_before_issuance() {
        let ledger = Arc::new(MockLedger::new(N0).unreachable());
        let plan = plan(Termination::Count(10));

        let result = runner(plan, &ledger).run_to_completion().await;

        assert!(matches!(result, Err(RunnerError::Connect(_))));
        assert!(ledger.submitted_nonces().is_empty());
    }
}
