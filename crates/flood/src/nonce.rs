//! Nonce allocation for the sending account.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out strictly increasing nonces for the sending account.
///
/// Owns the nonce cursor exclusively; workers never touch it directly.
/// Each call to [`next`](Self::next) consumes exactly one value. The
/// counter itself is atomic, so concurrent callers always receive
/// unique, gap-free values; the stricter guarantee that values are
/// assigned in issuance-index order holds because the single pacing
/// loop is the only caller.
#[derive(Debug)]
pub struct NonceAllocator {
    cursor: AtomicU64,
}

impl NonceAllocator {
    /// Create an allocator seeded with the account's current on-chain
    /// sequence number.
    pub fn new(initial: u64) -> Self {
        Self {
            cursor: AtomicU64::new(initial),
        }
    }

    /// Take the next nonce, advancing the cursor by exactly one.
    pub fn next(&self) -> u64 {
        self.cursor.fetch_add(1, Ordering::SeqCst)
    }

    /// The next value that would be assigned, without consuming it.
    pub fn peek(&self) -> u64 {
        self.cursor.load(Ordering::SeqCst)
    }
}
