//! Rate-paced transaction flooder for a ledger node.
//!
//! Submits signed transfers at a configured rate with a hard bound on
//! how many may be awaiting their outcome at once, then reports final
//! accounting and inclusion latency percentiles.

pub mod client;
pub mod config;
pub mod limiter;
pub mod nonce;
pub mod runner;
pub mod stats;

mod worker;

pub use client::{ClientError, HttpLedgerClient, LedgerClient, Resolution, StatusWatcher};
pub use config::{ConfigError, NonceMode, SubmissionPlan, Termination};
pub use limiter::ConcurrencyLimiter;
pub use nonce::NonceAllocator;
pub use runner::{Runner, RunnerError};
pub use stats::{LatencySummary, RunStats, Summary};
