use snafu::Snafu;

use crate::constants::MAX_KEY_SIZE_BYTES;
use crate::constants::MAX_VALUE_SIZE_BYTES;

/// Errors returned by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum KvError {
    /// A key this transaction read was written by a transaction that committed
    /// after this one started. The whole transaction should be retried.
    #[snafu(display("transaction conflict: a key read by this transaction was modified concurrently"))]
    Conflict,

    /// The transaction was already committed and cannot be used again.
    #[snafu(display("transaction already committed"))]
    TransactionCommitted,

    /// Key exceeds the store's size limit.
    #[snafu(display("key of {size} bytes exceeds the {max}-byte limit", max = MAX_KEY_SIZE_BYTES))]
    KeyTooLarge {
        /// Actual key size.
        size: usize,
    },

    /// Value exceeds the store's size limit.
    #[snafu(display("value of {size} bytes exceeds the {max}-byte limit", max = MAX_VALUE_SIZE_BYTES))]
    ValueTooLarge {
        /// Actual value size.
        size: usize,
    },

    /// Any other storage failure.
    #[snafu(display("storage operation failed: {reason}"))]
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

/// Errors that may be resolved by running the whole transaction again.
pub trait Retryable {
    /// True when a fresh attempt of the same transaction may succeed.
    fn is_retryable(&self) -> bool;
}

impl Retryable for KvError {
    fn is_retryable(&self) -> bool {
        matches!(self, KvError::Conflict)
    }
}
