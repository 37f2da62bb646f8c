//! High-Contention Allocator (HCA) for directory prefix allocation.
//!
//! This module implements FoundationDB's High-Contention Allocator, which
//! hands out small unique integers from inside ordinary transactions while
//! keeping conflicts between concurrent allocators rare.
//!
//! # Algorithm
//!
//! The allocator keeps two subspaces under its root:
//!
//! - `counters[start]`: how many candidates have been handed out in the window
//!   beginning at `start` (little-endian 64-bit, updated with atomic add)
//! - `recent[n]`: marks candidate `n` as claimed
//!
//! An allocation:
//!
//! 1. Finds the current window start from the last `counters` key (snapshot
//!    read, so it never conflicts).
//! 2. Bumps that window's counter. Once a window is half used the allocator
//!    moves on to the next one, clearing the old counters and claims.
//! 3. Picks random candidates inside the window until it finds one nobody has
//!    claimed. Only the claim key is read with conflict tracking, so two
//!    allocators collide only when they pick the same candidate.
//!
//! # Window Sizing
//!
//! Window size increases as the window start grows:
//! - start < 255: window = 64
//! - start < 65535: window = 1024
//! - start >= 65535: window = 8192
//!
//! # References
//!
//! - [High-Contention Allocator](https://ananthakumaran.in/2018/08/05/high-contention-allocator.html)
//! - [FoundationDB Directory Layer](https://apple.github.io/foundationdb/developer-guide.html)

use cairn_kv::KeyRange;
use cairn_kv::KvError;
use cairn_kv::RangeOptions;
use cairn_kv::Retryable;
use cairn_kv::Transaction;
use cairn_layer::Subspace;
use cairn_layer::SubspaceError;
use cairn_layer::Tuple;
use cairn_layer::TupleError;
use rand::Rng;
use snafu::ResultExt;
use snafu::Snafu;
use tracing::debug;
use tracing::trace;

use crate::constants::HCA_COUNTERS_KEY;
use crate::constants::HCA_INITIAL_WINDOW_SIZE;
use crate::constants::HCA_LARGE_WINDOW_THRESHOLD;
use crate::constants::HCA_MAX_CANDIDATE_PROBES;
use crate::constants::HCA_MAX_WINDOW_ROUNDS;
use crate::constants::HCA_MAX_WINDOW_SIZE;
use crate::constants::HCA_MEDIUM_WINDOW_SIZE;
use crate::constants::HCA_MEDIUM_WINDOW_THRESHOLD;
use crate::constants::HCA_RECENT_KEY;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during prefix allocation.
#[derive(Debug, Snafu)]
pub enum AllocationError {
    /// Every window derivation ended without a free candidate.
    #[snafu(display("allocation gave up after {rounds} window rounds"))]
    WindowRoundsExhausted {
        /// Number of window derivations attempted.
        rounds: u32,
    },

    /// The window start would overflow a 64-bit integer.
    #[snafu(display("allocator counter exhausted"))]
    CounterExhausted,

    /// Invalid state read from storage.
    #[snafu(display("corrupted allocator state: {reason}"))]
    CorruptedState {
        /// Description of the corruption.
        reason: String,
    },

    /// A counter key does not belong to the counters subspace.
    #[snafu(display("invalid allocator key: {source}"))]
    Subspace {
        /// The underlying subspace error.
        source: SubspaceError,
    },

    /// A counter key does not hold an integer window start.
    #[snafu(display("invalid allocator counter key: {source}"))]
    Tuple {
        /// The underlying tuple error.
        source: TupleError,
    },

    /// Storage error during allocation.
    #[snafu(display("storage error: {source}"))]
    Storage {
        /// The underlying KV store error.
        source: KvError,
    },
}

impl From<KvError> for AllocationError {
    fn from(source: KvError) -> Self {
        AllocationError::Storage { source }
    }
}

impl Retryable for AllocationError {
    fn is_retryable(&self) -> bool {
        matches!(self, AllocationError::Storage { source } if source.is_retryable())
    }
}

// =============================================================================
// High-Contention Allocator
// =============================================================================

/// High-Contention Allocator for unique integers.
///
/// The allocator is stateless: everything it knows lives under its subspace,
/// so any number of handles over the same subspace (in any process) share one
/// id space. Aborted transactions leave no trace.
///
/// # Example
///
/// ```ignore
/// use cairn_directory::HighContentionAllocator;
///
/// let allocator = HighContentionAllocator::new(Subspace::new(&Tuple::new().push("ids")));
///
/// // Allocate a unique integer inside a transaction
/// let id = allocator.allocate(&*trx).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighContentionAllocator {
    counters: Subspace,
    recent: Subspace,
}

impl HighContentionAllocator {
    /// Create an allocator rooted at `subspace`.
    pub fn new(subspace: Subspace) -> Self {
        Self {
            counters: subspace.subspace(&Tuple::new().push(HCA_COUNTERS_KEY)),
            recent: subspace.subspace(&Tuple::new().push(HCA_RECENT_KEY)),
        }
    }

    /// Subspace holding the per-window counters.
    pub fn counters(&self) -> &Subspace {
        &self.counters
    }

    /// Subspace holding the claimed candidates.
    pub fn recent(&self) -> &Subspace {
        &self.recent
    }

    /// Allocate an integer that no other committed allocation on this
    /// subspace has returned.
    ///
    /// The result is only reserved once `trx` commits. If the commit fails
    /// with a conflict the caller retries the whole transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, if the allocator state is
    /// corrupted, or if no free candidate is found within
    /// [`HCA_MAX_WINDOW_ROUNDS`] window derivations.
    pub async fn allocate(&self, trx: &dyn Transaction) -> Result<i64, AllocationError> {
        for round in 0..HCA_MAX_WINDOW_ROUNDS {
            let (start, window) = self.find_window(trx).await?;
            if let Some(candidate) = self.probe_window(trx, start, window).await? {
                trace!(candidate, start, window, round, "allocated candidate");
                return Ok(candidate);
            }
            debug!(start, window, round, "re-deriving allocator window");
        }

        Err(AllocationError::WindowRoundsExhausted {
            rounds: HCA_MAX_WINDOW_ROUNDS,
        })
    }

    /// Start of the newest window, read without conflict tracking.
    async fn latest_window_start(&self, trx: &dyn Transaction) -> Result<Option<i64>, AllocationError> {
        let (begin, end) = self.counters.range();
        let latest = trx.get_range(&KeyRange::new(begin, end), RangeOptions::default().limit(1).reverse(), true).await?;

        match latest.first() {
            Some(kv) => {
                let tuple = self.counters.unpack(&kv.key).context(SubspaceSnafu)?;
                Ok(Some(tuple.get_as::<i64>(0).context(TupleSnafu)?))
            }
            None => Ok(None),
        }
    }

    /// Find a window that is less than half used, advancing past full ones.
    async fn find_window(&self, trx: &dyn Transaction) -> Result<(i64, i64), AllocationError> {
        let mut start = self.latest_window_start(trx).await?.unwrap_or(0);
        let mut advanced = false;

        loop {
            let counter_key = self.counters.pack(&Tuple::new().push(start));

            if advanced {
                trx.clear_range(&KeyRange::new(self.counters.raw_prefix(), counter_key.clone()))?;
                let recent_end = self.recent.pack(&Tuple::new().push(start));
                trx.clear_range_no_write_conflict(&KeyRange::new(self.recent.raw_prefix(), recent_end))?;
            }

            trx.atomic_add(&counter_key, 1)?;
            let count = decode_counter(trx.get(&counter_key, true).await?.as_deref())?;
            let window = calculate_window_size(start);

            if count.saturating_mul(2) < window {
                return Ok((start, window));
            }

            start = start.checked_add(window).ok_or(AllocationError::CounterExhausted)?;
            advanced = true;
            debug!(start, window, count, "advancing allocator window");
        }
    }

    /// Try random candidates in `[start, start + window)`.
    ///
    /// Returns `None` when another allocator moved the window past `start` or
    /// when [`HCA_MAX_CANDIDATE_PROBES`] candidates were all taken.
    async fn probe_window(
        &self,
        trx: &dyn Transaction,
        start: i64,
        window: i64,
    ) -> Result<Option<i64>, AllocationError> {
        for _ in 0..HCA_MAX_CANDIDATE_PROBES {
            // ThreadRng is not Send, keep it out of the await points
            let offset = rand::rng().random_range(0..window);
            let candidate = start.saturating_add(offset);
            let candidate_key = self.recent.pack(&Tuple::new().push(candidate));

            let latest = self.latest_window_start(trx).await?;
            let previous = trx.get(&candidate_key, false).await?;
            trx.set_no_write_conflict(&candidate_key, &[])?;

            if latest.is_some_and(|latest| latest > start) {
                return Ok(None);
            }

            if previous.is_none() {
                trx.add_write_conflict_key(&candidate_key)?;
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}

/// Decode a little-endian counter value; a missing value counts as zero.
fn decode_counter(value: Option<&[u8]>) -> Result<i64, AllocationError> {
    let Some(bytes) = value else {
        return Ok(0);
    };
    if bytes.len() > 8 {
        return Err(AllocationError::CorruptedState {
            reason: format!("counter value is {} bytes, expected at most 8", bytes.len()),
        });
    }
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(i64::from_le_bytes(buf))
}

/// Calculate window size based on the window start.
///
/// Larger window starts get larger windows, so a busy id space stays sparse
/// enough for random probing while a quiet one keeps its ids small.
fn calculate_window_size(start: i64) -> i64 {
    if start < HCA_MEDIUM_WINDOW_THRESHOLD {
        HCA_INITIAL_WINDOW_SIZE
    } else if start < HCA_LARGE_WINDOW_THRESHOLD {
        HCA_MEDIUM_WINDOW_SIZE
    } else {
        HCA_MAX_WINDOW_SIZE
    }
}

// =============================================================================
// Tests
// =============================================================================
