//! The transactional store boundary.
//!
//! Everything above this crate talks to storage only through [`Transaction`].
//! The trait mirrors the subset of FoundationDB's transaction API the tuple,
//! allocator and directory layers need: conflicting and snapshot reads,
//! buffered writes, atomic add, and manual control over conflict ranges.

use async_trait::async_trait;

use crate::error::KvError;
use crate::range::KeyRange;
use crate::range::KeyValue;
use crate::range::RangeOptions;

/// A serializable transaction with optimistic conflict detection.
///
/// Reads see the database as of the transaction's read version plus the
/// transaction's own uncommitted writes. Non-snapshot reads add a read
/// conflict range; if any key in such a range is written by another
/// transaction that commits first, [`Transaction::commit`] fails with
/// [`KvError::Conflict`].
///
/// Writes are buffered until commit, so the mutating methods are synchronous.
/// All methods take `&self` so a transaction can be shared through an `Arc`.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Read a single key. `snapshot` reads add no read conflict range.
    async fn get(&self, key: &[u8], snapshot: bool) -> Result<Option<Vec<u8>>, KvError>;

    /// Read the pairs in `range`, ordered by key (descending when
    /// `options.reverse`), stopping after `options.limit` pairs.
    ///
    /// A limited, non-snapshot read only conflicts on the part of the range
    /// it actually returned.
    async fn get_range(&self, range: &KeyRange, options: RangeOptions, snapshot: bool)
    -> Result<Vec<KeyValue>, KvError>;

    /// Write `value` at `key`.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), KvError>;

    /// Remove `key`.
    fn clear(&self, key: &[u8]) -> Result<(), KvError>;

    /// Remove every key in `range`.
    fn clear_range(&self, range: &KeyRange) -> Result<(), KvError>;

    /// Add `delta` to the little-endian 64-bit integer stored at `key`.
    ///
    /// A missing value counts as zero. The addition wraps. No read conflict
    /// is added.
    fn atomic_add(&self, key: &[u8], delta: i64) -> Result<(), KvError>;

    /// Add a write conflict on `key` without writing it.
    fn add_write_conflict_key(&self, key: &[u8]) -> Result<(), KvError>;

    /// Write `value` at `key` without adding a write conflict.
    fn set_no_write_conflict(&self, key: &[u8], value: &[u8]) -> Result<(), KvError>;

    /// Remove every key in `range` without adding a write conflict.
    fn clear_range_no_write_conflict(&self, range: &KeyRange) -> Result<(), KvError>;

    /// Validate reads and apply buffered writes atomically.
    async fn commit(&self) -> Result<(), KvError>;
}

/// A store that hands out transactions.
pub trait Database: Send + Sync {
    /// Transaction type produced by this database.
    type Txn: Transaction + 'static;

    /// Start a new transaction at the current read version.
    fn create_transaction(&self) -> Self::Txn;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: Transaction + ?Sized> Transaction for std::sync::Arc<T> {
    async fn get(&self, key: &[u8], snapshot: bool) -> Result<Option<Vec<u8>>, KvError> {
        (**self).get(key, snapshot).await
    }

    async fn get_range(
        &self,
        range: &KeyRange,
        options: RangeOptions,
        snapshot: bool,
    ) -> Result<Vec<KeyValue>, KvError> {
        (**self).get_range(range, options, snapshot).await
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        (**self).set(key, value)
    }

    fn clear(&self, key: &[u8]) -> Result<(), KvError> {
        (**self).clear(key)
    }

    fn clear_range(&self, range: &KeyRange) -> Result<(), KvError> {
        (**self).clear_range(range)
    }

    fn atomic_add(&self, key: &[u8], delta: i64) -> Result<(), KvError> {
        (**self).atomic_add(key, delta)
    }

    fn add_write_conflict_key(&self, key: &[u8]) -> Result<(), KvError> {
        (**self).add_write_conflict_key(key)
    }

    fn set_no_write_conflict(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        (**self).set_no_write_conflict(key, value)
    }

    fn clear_range_no_write_conflict(&self, range: &KeyRange) -> Result<(), KvError> {
        (**self).clear_range_no_write_conflict(range)
    }

    async fn commit(&self) -> Result<(), KvError> {
        (**self).commit().await
    }
}

impl<D: Database + ?Sized> Database for std::sync::Arc<D> {
    type Txn = D::Txn;

    fn create_transaction(&self) -> Self::Txn {
        (**self).create_transaction()
    }
}
