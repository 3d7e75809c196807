//! Submission plan configuration.

use std::time::Duration;
use txflood_types::AccountId;

/// Termination condition for a run: a fixed wall-clock duration or a
/// fixed total submission count. Mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Issue until the elapsed time reaches this duration.
    Duration(Duration),
    /// Issue exactly this many submissions.
    Count(u64),
}

/// How nonces are assigned to submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonceMode {
    /// Maintain an owned cursor seeded once from the chain at startup.
    ///
    /// Guarantees nonces are assigned in strictly increasing issuance
    /// order with no gaps or repeats.
    #[default]
    Auto,

    /// Each task queries the node for the sender's current sequence
    /// immediately before building its transfer.
    ///
    /// Best effort only: concurrent tasks can observe the same value,
    /// so the strict-ordering guarantee is forfeited.
    QueryPerTask,
}

/// Immutable configuration for one submission run.
///
/// Created once at startup, validated before any issuance, never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct SubmissionPlan {
    /// Receiving account for every transfer.
    pub destination: AccountId,
    /// Transfer amount in base units.
    pub amount: u64,
    /// Target submissions per second.
    pub rate: u64,
    /// When to stop issuing new submissions.
    pub termination: Termination,
    /// Maximum submissions in flight at once.
    pub concurrency: usize,
    /// Nonce assignment mode.
    pub nonce_mode: NonceMode,
    /// How often to log a progress line.
    pub progress_interval: Duration,
}

impl SubmissionPlan {
    /// Create a plan with default rate, concurrency and nonce mode.
    pub fn new(destination: AccountId, termination: Termination) -> Self {
        Self {
            destination,
            amount: 1,
            rate: 10,
            termination,
            concurrency: 10,
            nonce_mode: NonceMode::default(),
            progress_interval: Duration::from_secs(5),
        }
    }

    /// Set the transfer amount.
    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Set the target submission rate (per second).
    pub fn with_rate(mut self, rate: u64) -> Self {
        self.rate = rate;
        self
    }

    /// Set the concurrency bound.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the nonce assignment mode.
    pub fn with_nonce_mode(mut self, mode: NonceMode) -> Self {
        self.nonce_mode = mode;
        self
    }

    /// Set the progress logging interval.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Validate the plan. Called before any issuance; violations are
    /// fatal to the run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate == 0 {
            return Err(ConfigError::ZeroRate);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.amount == 0 {
            return Err(ConfigError::ZeroAmount);
        }
        match self.termination {
            Termination::Count(0) => Err(ConfigError::ZeroCount),
            Termination::Duration(d) if d.is_zero() => Err(ConfigError::ZeroDuration),
            _ => Ok(()),
        }
    }

    /// Total number of submissions this plan intends to issue.
    ///
    /// Duration mode plans `ceil(duration_secs * rate)`.
    pub fn planned_total(&self) -> u64 {
        match self.termination {
            Termination::Count(count) => count,
            Termination::Duration(duration) => {
                (duration.as_secs_f64() * self.rate as f64).ceil() as u64
            }
        }
    }

    /// Ideal interval between consecutive issuances.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate as f64)
    }
}

/// Errors in a submission plan, detected before any issuance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Rate must be at least 1 per second.
    #[error("Submission rate must be at least 1 per second")]
    ZeroRate,

    /// Concurrency bound must be at least 1.
    #[error("Concurrency bound must be at least 1")]
    ZeroConcurrency,

    /// Transfer amount must be non-zero.
    #[error("Transfer amount must be non-zero")]
    ZeroAmount,

    /// Count mode needs at least one submission.
    #[error("Submission count must be at least 1")]
    ZeroCount,

    /// Duration mode needs a non-zero duration.
    #[error("Run duration must be non-zero")]
    ZeroDuration,
}
