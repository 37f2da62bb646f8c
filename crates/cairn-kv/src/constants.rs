//! Bounded limits for the transactional store boundary.
//!
//! Every limit is explicit so resource use stays predictable.

/// Maximum key size in bytes.
///
/// Matches FoundationDB's key size limit.
pub const MAX_KEY_SIZE_BYTES: usize = 10_000;

/// Maximum value size in bytes.
///
/// Matches FoundationDB's value size limit.
pub const MAX_VALUE_SIZE_BYTES: usize = 100_000;

/// Default number of attempts the retry runner makes before giving up.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 100;

/// Default backoff after the first retryable failure (1ms).
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1;

/// Upper bound on the backoff between attempts (1 second).
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 1_000;

/// Width of the operand used by [`Transaction::atomic_add`](crate::Transaction::atomic_add).
pub const ATOMIC_ADD_OPERAND_BYTES: usize = 8;
