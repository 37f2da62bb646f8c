//! In-process optimistic MVCC store.
//!
//! [`MemoryDatabase`] keeps committed versions of each key and resolves reads
//! at the transaction's read version. Commit validates the transaction's read
//! conflict ranges against writes committed after that version, then applies
//! the buffered writes at a new version. It never blocks on I/O and is
//! intended for tests and embedding.
//!
//! Open transactions register their read version. After each commit, the
//! histories it touched are pruned to the newest version at or below the
//! oldest registered read version, and tombstones nobody can observe are
//! dropped.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use tracing::trace;

use crate::constants::ATOMIC_ADD_OPERAND_BYTES;
use crate::constants::MAX_KEY_SIZE_BYTES;
use crate::constants::MAX_VALUE_SIZE_BYTES;
use crate::error::KvError;
use crate::range::KeyRange;
use crate::range::KeyValue;
use crate::range::RangeOptions;
use crate::transaction::Database;
use crate::transaction::Transaction;

// =============================================================================
// Versioned storage
// =============================================================================

#[derive(Debug, Default)]
struct KeyHistory {
    /// Committed values in ascending version order. `None` is a tombstone.
    versions: Vec<(u64, Option<Vec<u8>>)>,
    /// Version of the last commit that wrote this key with a write conflict.
    conflict_version: u64,
}

impl KeyHistory {
    fn value_at(&self, version: u64) -> Option<&[u8]> {
        self.versions
            .iter()
            .rev()
            .find(|(v, _)| *v <= version)
            .and_then(|(_, value)| value.as_deref())
    }

    fn latest(&self) -> Option<&[u8]> {
        self.versions.last().and_then(|(_, value)| value.as_deref())
    }

    /// Drop versions no reader at or after `horizon` can observe.
    fn prune(&mut self, horizon: u64) {
        if let Some(newest_visible) = self.versions.iter().rposition(|(v, _)| *v <= horizon) {
            self.versions.drain(..newest_visible);
        }
    }

    /// Nothing left that a reader or a conflict check at `horizon` could see.
    fn is_dead(&self, horizon: u64) -> bool {
        self.conflict_version <= horizon && self.versions.iter().all(|(v, value)| value.is_none() && *v <= horizon)
    }

    /// A single live value; later pruning cannot shrink it further.
    fn is_compact(&self) -> bool {
        matches!(self.versions.as_slice(), [(_, Some(_))])
    }
}

#[derive(Debug, Default)]
struct Store {
    version: u64,
    data: BTreeMap<Vec<u8>, KeyHistory>,
    /// Read versions of open transactions, with a count per version.
    live_reads: BTreeMap<u64, usize>,
    /// Keys whose history may hold versions or tombstones to collect.
    pending_gc: BTreeSet<Vec<u8>>,
}

fn bounds(range: &KeyRange) -> (Bound<&[u8]>, Bound<&[u8]>) {
    (Bound::Included(range.begin.as_slice()), Bound::Excluded(range.end.as_slice()))
}

impl Store {
    fn histories<'a>(&'a self, range: &KeyRange) -> impl Iterator<Item = (&'a Vec<u8>, &'a KeyHistory)> + 'a {
        let iter = if range.is_empty() {
            None
        } else {
            Some(self.data.range::<[u8], _>(bounds(range)))
        };
        iter.into_iter().flatten()
    }

    fn snapshot_range(&self, range: &KeyRange, version: u64) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.histories(range)
            .filter_map(|(k, h)| h.value_at(version).map(|v| (k.clone(), v.to_vec())))
            .collect()
    }

    fn has_conflict(&self, range: &KeyRange, read_version: u64) -> bool {
        self.histories(range).any(|(_, h)| h.conflict_version > read_version)
    }

    fn register_read(&mut self) -> u64 {
        *self.live_reads.entry(self.version).or_default() += 1;
        self.version
    }

    fn release_read(&mut self, read_version: u64) {
        if let Some(count) = self.live_reads.get_mut(&read_version) {
            *count -= 1;
            if *count == 0 {
                self.live_reads.remove(&read_version);
            }
        }
    }

    /// Oldest version any open or future transaction can read at.
    fn horizon(&self) -> u64 {
        self.live_reads.keys().next().map_or(self.version, |&oldest| oldest.min(self.version))
    }

    /// Prune pending histories down to the horizon. Returns the number of
    /// keys removed outright.
    fn collect_garbage(&mut self) -> usize {
        let horizon = self.horizon();
        let mut removed = 0;
        for key in std::mem::take(&mut self.pending_gc) {
            let Some(history) = self.data.get_mut(&key) else {
                continue;
            };
            history.prune(horizon);
            if history.is_dead(horizon) {
                self.data.remove(&key);
                removed += 1;
            } else if !history.is_compact() {
                self.pending_gc.insert(key);
            }
        }
        removed
    }

    fn apply(&mut self, op: WriteOp, version: u64) {
        match op {
            WriteOp::Set { key, value, conflict } => {
                let history = self.data.entry(key.clone()).or_default();
                history.versions.push((version, Some(value)));
                if conflict {
                    history.conflict_version = version;
                }
                self.pending_gc.insert(key);
            }
            WriteOp::Clear { key } => {
                let history = self.data.entry(key.clone()).or_default();
                history.versions.push((version, None));
                history.conflict_version = version;
                self.pending_gc.insert(key);
            }
            WriteOp::ClearRange { range, conflict } => {
                if range.is_empty() {
                    return;
                }
                for (key, history) in self.data.range_mut::<[u8], _>(bounds(&range)) {
                    if history.latest().is_some() {
                        history.versions.push((version, None));
                        if conflict {
                            history.conflict_version = version;
                        }
                        self.pending_gc.insert(key.clone());
                    }
                }
            }
            WriteOp::Add { key, delta } => {
                let history = self.data.entry(key.clone()).or_default();
                let sum = add_le(history.latest(), delta);
                history.versions.push((version, Some(sum)));
                history.conflict_version = version;
                self.pending_gc.insert(key);
            }
            WriteOp::WriteConflict { key } => {
                self.data.entry(key.clone()).or_default().conflict_version = version;
                self.pending_gc.insert(key);
            }
        }
    }
}

/// Little-endian wrapping add, zero-extending or truncating to 8 bytes.
fn add_le(current: Option<&[u8]>, delta: i64) -> Vec<u8> {
    let mut buf = [0u8; ATOMIC_ADD_OPERAND_BYTES];
    if let Some(existing) = current {
        let n = existing.len().min(ATOMIC_ADD_OPERAND_BYTES);
        buf[..n].copy_from_slice(&existing[..n]);
    }
    i64::from_le_bytes(buf).wrapping_add(delta).to_le_bytes().to_vec()
}

// =============================================================================
// Buffered writes
// =============================================================================

#[derive(Debug, Clone)]
enum WriteOp {
    Set { key: Vec<u8>, value: Vec<u8>, conflict: bool },
    Clear { key: Vec<u8> },
    ClearRange { range: KeyRange, conflict: bool },
    Add { key: Vec<u8>, delta: i64 },
    WriteConflict { key: Vec<u8> },
}

/// Net effect of a transaction's writes on one key.
#[derive(Debug, Clone)]
enum KeyWrite {
    /// The key holds this value (or nothing) regardless of the snapshot.
    Value(Option<Vec<u8>>),
    /// The snapshot value plus a pending atomic add.
    Add(i64),
}

impl KeyWrite {
    fn resolve(&self, base: Option<&[u8]>) -> Option<Vec<u8>> {
        match self {
            KeyWrite::Value(value) => value.clone(),
            KeyWrite::Add(delta) => Some(add_le(base, *delta)),
        }
    }
}

#[derive(Debug, Default)]
struct TxnState {
    /// Writes in issue order, replayed against the store at commit.
    ops: Vec<WriteOp>,
    /// Per-key summary of `ops` for read-your-writes lookups.
    overlay: BTreeMap<Vec<u8>, KeyWrite>,
    /// Ranges cleared by this transaction, applied beneath `overlay`.
    cleared: Vec<KeyRange>,
    read_ranges: Vec<KeyRange>,
    committed: bool,
}

impl TxnState {
    fn record(&mut self, op: WriteOp) {
        match &op {
            WriteOp::Set { key, value, .. } => {
                self.overlay.insert(key.clone(), KeyWrite::Value(Some(value.clone())));
            }
            WriteOp::Clear { key } => {
                self.overlay.insert(key.clone(), KeyWrite::Value(None));
            }
            WriteOp::ClearRange { range, .. } => {
                if !range.is_empty() {
                    for (_, write) in self.overlay.range_mut::<[u8], _>(bounds(range)) {
                        *write = KeyWrite::Value(None);
                    }
                    self.cleared.push(range.clone());
                }
            }
            WriteOp::Add { key, delta } => {
                let write = match self.overlay.get(key) {
                    Some(KeyWrite::Value(value)) => KeyWrite::Value(Some(add_le(value.as_deref(), *delta))),
                    Some(KeyWrite::Add(pending)) => KeyWrite::Add(pending.wrapping_add(*delta)),
                    None if self.is_cleared(key) => KeyWrite::Value(Some(add_le(None, *delta))),
                    None => KeyWrite::Add(*delta),
                };
                self.overlay.insert(key.clone(), write);
            }
            WriteOp::WriteConflict { .. } => {}
        }
        self.ops.push(op);
    }

    fn is_cleared(&self, key: &[u8]) -> bool {
        self.cleared.iter().any(|range| range.contains(key))
    }

    /// Value of `key` as this transaction sees it, given the snapshot value.
    fn read_key(&self, key: &[u8], base: Option<Vec<u8>>) -> Option<Vec<u8>> {
        match self.overlay.get(key) {
            Some(write) => write.resolve(base.as_deref()),
            None if self.is_cleared(key) => None,
            None => base,
        }
    }

    /// Layer this transaction's writes over a snapshot view of `range`.
    fn read_view(&self, range: &KeyRange, view: &mut BTreeMap<Vec<u8>, Vec<u8>>) {
        for cleared in &self.cleared {
            view.retain(|k, _| !cleared.contains(k));
        }
        if range.is_empty() {
            return;
        }
        for (key, write) in self.overlay.range::<[u8], _>(bounds(range)) {
            match write.resolve(view.get(key).map(Vec::as_slice)) {
                Some(value) => view.insert(key.clone(), value),
                None => view.remove(key),
            };
        }
    }
}

// =============================================================================
// Public types
// =============================================================================

/// An in-memory, multi-versioned transactional key-value store.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    store: Arc<Mutex<Store>>,
}

impl MemoryDatabase {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Version of the most recent commit.
    pub fn version(&self) -> u64 {
        self.store.lock().version
    }

    /// All live key/value pairs at the latest version, in key order.
    pub fn dump(&self) -> Vec<KeyValue> {
        let store = self.store.lock();
        store
            .data
            .iter()
            .filter_map(|(k, h)| {
                h.latest().map(|v| KeyValue {
                    key: k.clone(),
                    value: v.to_vec(),
                })
            })
            .collect()
    }

    /// Number of live keys at the latest version.
    pub fn len(&self) -> usize {
        self.store.lock().data.values().filter(|h| h.latest().is_some()).count()
    }

    /// True when no live keys exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Database for MemoryDatabase {
    type Txn = MemoryTransaction;

    fn create_transaction(&self) -> MemoryTransaction {
        let read_version = self.store.lock().register_read();
        trace!(read_version, "transaction started");
        MemoryTransaction {
            store: Arc::clone(&self.store),
            read_version,
            state: Mutex::new(TxnState::default()),
        }
    }
}

/// A transaction on a [`MemoryDatabase`].
#[derive(Debug)]
pub struct MemoryTransaction {
    store: Arc<Mutex<Store>>,
    read_version: u64,
    state: Mutex<TxnState>,
}

impl MemoryTransaction {
    /// Version of the database this transaction reads from.
    pub fn read_version(&self) -> u64 {
        self.read_version
    }

    fn push(&self, op: WriteOp) -> Result<(), KvError> {
        let mut state = self.state.lock();
        if state.committed {
            return Err(KvError::TransactionCommitted);
        }
        state.record(op);
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.state.get_mut().committed {
            self.store.lock().release_read(self.read_version);
        }
    }
}

fn check_key(key: &[u8]) -> Result<(), KvError> {
    if key.len() > MAX_KEY_SIZE_BYTES {
        return Err(KvError::KeyTooLarge { size: key.len() });
    }
    Ok(())
}

fn check_value(value: &[u8]) -> Result<(), KvError> {
    if value.len() > MAX_VALUE_SIZE_BYTES {
        return Err(KvError::ValueTooLarge { size: value.len() });
    }
    Ok(())
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(&self, key: &[u8], snapshot: bool) -> Result<Option<Vec<u8>>, KvError> {
        check_key(key)?;
        let base = {
            let store = self.store.lock();
            store.data.get(key).and_then(|h| h.value_at(self.read_version)).map(<[u8]>::to_vec)
        };

        let mut state = self.state.lock();
        if state.committed {
            return Err(KvError::TransactionCommitted);
        }
        let value = state.read_key(key, base);
        if !snapshot {
            state.read_ranges.push(KeyRange::single(key));
        }
        Ok(value)
    }

    async fn get_range(
        &self,
        range: &KeyRange,
        options: RangeOptions,
        snapshot: bool,
    ) -> Result<Vec<KeyValue>, KvError> {
        let mut view = self.store.lock().snapshot_range(range, self.read_version);

        let mut state = self.state.lock();
        if state.committed {
            return Err(KvError::TransactionCommitted);
        }
        state.read_view(range, &mut view);

        let limit = options.limit.filter(|&l| l > 0).unwrap_or(usize::MAX);
        let to_pair = |(key, value): (Vec<u8>, Vec<u8>)| KeyValue { key, value };
        let rows: Vec<KeyValue> = if options.reverse {
            view.into_iter().rev().take(limit).map(to_pair).collect()
        } else {
            view.into_iter().take(limit).map(to_pair).collect()
        };

        if !snapshot {
            // A limited read only depends on the keys up to the last one returned
            let conflict = match rows.last() {
                Some(last) if rows.len() == limit => {
                    if options.reverse {
                        KeyRange::new(last.key.clone(), range.end.clone())
                    } else {
                        let mut end = last.key.clone();
                        end.push(0x00);
                        KeyRange::new(range.begin.clone(), end)
                    }
                }
                _ => range.clone(),
            };
            state.read_ranges.push(conflict);
        }

        Ok(rows)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        check_key(key)?;
        check_value(value)?;
        self.push(WriteOp::Set {
            key: key.to_vec(),
            value: value.to_vec(),
            conflict: true,
        })
    }

    fn clear(&self, key: &[u8]) -> Result<(), KvError> {
        check_key(key)?;
        self.push(WriteOp::Clear { key: key.to_vec() })
    }

    fn clear_range(&self, range: &KeyRange) -> Result<(), KvError> {
        self.push(WriteOp::ClearRange {
            range: range.clone(),
            conflict: true,
        })
    }

    fn atomic_add(&self, key: &[u8], delta: i64) -> Result<(), KvError> {
        check_key(key)?;
        self.push(WriteOp::Add {
            key: key.to_vec(),
            delta,
        })
    }

    fn add_write_conflict_key(&self, key: &[u8]) -> Result<(), KvError> {
        check_key(key)?;
        self.push(WriteOp::WriteConflict { key: key.to_vec() })
    }

    fn set_no_write_conflict(&self, key: &[u8], value: &[u8]) -> Result<(), KvError> {
        check_key(key)?;
        check_value(value)?;
        self.push(WriteOp::Set {
            key: key.to_vec(),
            value: value.to_vec(),
            conflict: false,
        })
    }

    fn clear_range_no_write_conflict(&self, range: &KeyRange) -> Result<(), KvError> {
        self.push(WriteOp::ClearRange {
            range: range.clone(),
            conflict: false,
        })
    }

    async fn commit(&self) -> Result<(), KvError> {
        let mut state = self.state.lock();
        if state.committed {
            return Err(KvError::TransactionCommitted);
        }

        if state.ops.is_empty() {
            state.committed = true;
            self.store.lock().release_read(self.read_version);
            trace!(read_version = self.read_version, "read-only commit");
            return Ok(());
        }

        let mut store = self.store.lock();
        if let Some(range) = state.read_ranges.iter().find(|r| store.has_conflict(r, self.read_version)) {
            debug!(
                read_version = self.read_version,
                store_version = store.version,
                begin = ?range.begin,
                end = ?range.end,
                "transaction conflict detected"
            );
            return Err(KvError::Conflict);
        }

        let version = store.version + 1;
        let ops = std::mem::take(&mut state.ops);
        let op_count = ops.len();
        for op in ops {
            store.apply(op, version);
        }
        store.version = version;
        state.committed = true;
        state.overlay.clear();
        state.cleared.clear();
        store.release_read(self.read_version);
        let collected = store.collect_garbage();

        debug!(version, read_version = self.read_version, op_count, collected, "transaction committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(begin: &[u8], end: &[u8]) -> KeyRange {
        KeyRange::new(begin.to_vec(), end.to_vec())
    }

    async fn seed(db: &MemoryDatabase, pairs: &[(&[u8], &[u8])]) {
        let tr = db.create_transaction();
        for (k, v) in pairs {
            tr.set(k, v).unwrap();
        }
        tr.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_get_commit() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"a", b"1")]).await;

        let tr = db.create_transaction();
        assert_eq!(tr.get(b"a", false).await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(tr.get(b"b", false).await.unwrap(), None);
        assert_eq!(db.version(), 1);
    }

    #[tokio::test]
    async fn test_read_your_writes() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]).await;

        let tr = db.create_transaction();
        tr.set(b"bb", b"x").unwrap();
        tr.clear(b"a").unwrap();
        assert_eq!(tr.get(b"a", true).await.unwrap(), None);
        assert_eq!(tr.get(b"bb", true).await.unwrap(), Some(b"x".to_vec()));

        let rows = tr.get_range(&range(b"a", b"z"), RangeOptions::default(), true).await.unwrap();
        let keys: Vec<&[u8]> = rows.iter().map(|kv| kv.key.as_slice()).collect();
        assert_eq!(keys, vec![&b"b"[..], &b"bb"[..], &b"c"[..]]);

        tr.clear_range(&range(b"b", b"c")).unwrap();
        let rows = tr.get_range(&range(b"a", b"z"), RangeOptions::default(), true).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, b"c".to_vec());
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let db = MemoryDatabase::new();
        let writer = db.create_transaction();
        writer.set(b"k", b"v").unwrap();

        let reader = db.create_transaction();
        assert_eq!(reader.get(b"k", false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reads_are_at_read_version() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"k", b"old")]).await;

        let reader = db.create_transaction();
        seed(&db, &[(b"k", b"new")]).await;
        assert_eq!(reader.get(b"k", true).await.unwrap(), Some(b"old".to_vec()));
    }

    #[tokio::test]
    async fn test_conflicting_read_aborts() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"k", b"0")]).await;

        let t1 = db.create_transaction();
        let t2 = db.create_transaction();
        t1.get(b"k", false).await.unwrap();
        t1.set(b"other", b"1").unwrap();
        t2.set(b"k", b"2").unwrap();
        t2.commit().await.unwrap();

        assert_eq!(t1.commit().await, Err(KvError::Conflict));
    }

    #[tokio::test]
    async fn test_snapshot_read_does_not_conflict() {
        let db = MemoryDatabase::new();
        let t1 = db.create_transaction();
        let t2 = db.create_transaction();
        t1.get(b"k", true).await.unwrap();
        t1.set(b"other", b"1").unwrap();
        t2.set(b"k", b"2").unwrap();
        t2.commit().await.unwrap();

        t1.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_write_without_conflict_range_is_invisible_to_conflicts() {
        let db = MemoryDatabase::new();
        let t1 = db.create_transaction();
        let t2 = db.create_transaction();
        t1.get(b"k", false).await.unwrap();
        t1.set(b"other", b"1").unwrap();
        t2.set_no_write_conflict(b"k", b"2").unwrap();
        t2.commit().await.unwrap();

        t1.commit().await.unwrap();
        let t3 = db.create_transaction();
        assert_eq!(t3.get(b"k", false).await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_explicit_write_conflict_key() {
        let db = MemoryDatabase::new();
        let t1 = db.create_transaction();
        let t2 = db.create_transaction();
        t1.get(b"k", false).await.unwrap();
        t1.set(b"other", b"1").unwrap();
        t2.add_write_conflict_key(b"k").unwrap();
        t2.commit().await.unwrap();

        assert_eq!(t1.commit().await, Err(KvError::Conflict));
        assert!(db.dump().iter().all(|kv| kv.key != b"k".to_vec()));
    }

    #[tokio::test]
    async fn test_range_read_conflicts_with_insert() {
        let db = MemoryDatabase::new();
        let t1 = db.create_transaction();
        let t2 = db.create_transaction();
        t1.get_range(&range(b"a", b"c"), RangeOptions::default(), false).await.unwrap();
        t1.set(b"z", b"1").unwrap();
        t2.set(b"b", b"new").unwrap();
        t2.commit().await.unwrap();

        assert_eq!(t1.commit().await, Err(KvError::Conflict));
    }

    #[tokio::test]
    async fn test_limited_read_narrows_conflict_range() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"a", b"1"), (b"m", b"2")]).await;

        let t1 = db.create_transaction();
        let t2 = db.create_transaction();
        let rows = t1
            .get_range(&range(b"a", b"z"), RangeOptions::default().limit(1), false)
            .await
            .unwrap();
        assert_eq!(rows[0].key, b"a".to_vec());
        t1.set(b"out", b"1").unwrap();

        // Past the last returned key: no conflict
        t2.set(b"q", b"x").unwrap();
        t2.commit().await.unwrap();
        t1.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_reverse_limit_returns_last_key() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]).await;

        let tr = db.create_transaction();
        let rows = tr
            .get_range(&range(b"a", b"z"), RangeOptions::default().limit(1).reverse(), true)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, b"c".to_vec());
    }

    #[tokio::test]
    async fn test_atomic_add() {
        let db = MemoryDatabase::new();
        let tr = db.create_transaction();
        tr.atomic_add(b"n", 5).unwrap();
        tr.atomic_add(b"n", -2).unwrap();
        assert_eq!(tr.get(b"n", true).await.unwrap(), Some(3i64.to_le_bytes().to_vec()));
        tr.commit().await.unwrap();

        // Concurrent adds never conflict with each other
        let t1 = db.create_transaction();
        let t2 = db.create_transaction();
        t1.atomic_add(b"n", 1).unwrap();
        t2.atomic_add(b"n", 1).unwrap();
        t1.commit().await.unwrap();
        t2.commit().await.unwrap();

        let tr = db.create_transaction();
        assert_eq!(tr.get(b"n", false).await.unwrap(), Some(5i64.to_le_bytes().to_vec()));
    }

    #[test]
    fn test_add_le_extends_short_values() {
        assert_eq!(add_le(Some(&[1]), 1), 2i64.to_le_bytes().to_vec());
        assert_eq!(add_le(None, -1), (-1i64).to_le_bytes().to_vec());
        assert_eq!(add_le(Some(&i64::MAX.to_le_bytes()), 1), i64::MIN.to_le_bytes().to_vec());
    }

    #[tokio::test]
    async fn test_read_only_commit_always_succeeds() {
        let db = MemoryDatabase::new();
        let t1 = db.create_transaction();
        t1.get(b"k", false).await.unwrap();
        seed(&db, &[(b"k", b"v")]).await;
        t1.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_committed_transaction_rejects_use() {
        let db = MemoryDatabase::new();
        let tr = db.create_transaction();
        tr.set(b"k", b"v").unwrap();
        tr.commit().await.unwrap();

        assert_eq!(tr.set(b"k", b"w"), Err(KvError::TransactionCommitted));
        assert_eq!(tr.commit().await, Err(KvError::TransactionCommitted));
        assert!(matches!(tr.get(b"k", false).await, Err(KvError::TransactionCommitted)));
    }

    #[tokio::test]
    async fn test_size_limits() {
        let db = MemoryDatabase::new();
        let tr = db.create_transaction();
        let big_key = vec![0u8; MAX_KEY_SIZE_BYTES + 1];
        let big_value = vec![0u8; MAX_VALUE_SIZE_BYTES + 1];
        assert!(matches!(tr.set(&big_key, b"v"), Err(KvError::KeyTooLarge { .. })));
        assert!(matches!(tr.set(b"k", &big_value), Err(KvError::ValueTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_clear_range_without_conflict() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"a", b"1"), (b"b", b"2")]).await;

        let t1 = db.create_transaction();
        let t2 = db.create_transaction();
        t1.get(b"a", false).await.unwrap();
        t1.set(b"z", b"1").unwrap();
        t2.clear_range_no_write_conflict(&range(b"a", b"c")).unwrap();
        t2.commit().await.unwrap();
        t1.commit().await.unwrap();

        assert_eq!(db.len(), 1);
        assert_eq!(db.dump()[0].key, b"z".to_vec());
    }

    fn history_len(db: &MemoryDatabase, key: &[u8]) -> Option<usize> {
        db.store.lock().data.get(key).map(|h| h.versions.len())
    }

    #[tokio::test]
    async fn test_history_is_pruned_without_readers() {
        let db = MemoryDatabase::new();
        for _ in 0..100 {
            let tr = db.create_transaction();
            tr.atomic_add(b"n", 1).unwrap();
            tr.commit().await.unwrap();
        }

        assert_eq!(history_len(&db, b"n"), Some(1));
        assert!(db.store.lock().live_reads.is_empty());
        let tr = db.create_transaction();
        assert_eq!(tr.get(b"n", true).await.unwrap(), Some(100i64.to_le_bytes().to_vec()));
    }

    #[tokio::test]
    async fn test_open_reader_pins_history() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"k", b"v0")]).await;

        let reader = db.create_transaction();
        for value in [b"v1", b"v2", b"v3"] {
            seed(&db, &[(b"k", value)]).await;
        }
        assert_eq!(history_len(&db, b"k"), Some(4));
        assert_eq!(reader.get(b"k", true).await.unwrap(), Some(b"v0".to_vec()));

        drop(reader);
        seed(&db, &[(b"other", b"x")]).await;
        assert_eq!(history_len(&db, b"k"), Some(1));

        let tr = db.create_transaction();
        assert_eq!(tr.get(b"k", true).await.unwrap(), Some(b"v3".to_vec()));
    }

    #[tokio::test]
    async fn test_cleared_keys_are_dropped() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]).await;

        let tr = db.create_transaction();
        tr.clear(b"a").unwrap();
        tr.clear_range(&range(b"b", b"z")).unwrap();
        tr.commit().await.unwrap();

        assert!(db.store.lock().data.is_empty());
        assert!(db.store.lock().pending_gc.is_empty());
    }

    #[tokio::test]
    async fn test_tombstone_survives_for_older_reader() {
        let db = MemoryDatabase::new();
        seed(&db, &[(b"k", b"v")]).await;

        let reader = db.create_transaction();
        let tr = db.create_transaction();
        tr.clear(b"k").unwrap();
        tr.commit().await.unwrap();

        assert_eq!(reader.get(b"k", true).await.unwrap(), Some(b"v".to_vec()));
        reader.commit().await.unwrap();

        seed(&db, &[(b"other", b"x")]).await;
        assert_eq!(history_len(&db, b"k"), None);
    }

    #[tokio::test]
    async fn test_pruning_keeps_conflicts_for_open_readers() {
        let db = MemoryDatabase::new();
        let t1 = db.create_transaction();
        t1.get(b"k", false).await.unwrap();
        t1.set(b"out", b"1").unwrap();

        let t2 = db.create_transaction();
        t2.set(b"k", b"v").unwrap();
        t2.clear(b"k").unwrap();
        t2.commit().await.unwrap();

        assert_eq!(t1.commit().await, Err(KvError::Conflict));
    }

    #[tokio::test]
    async fn test_overlay_tracks_write_order() {
        let db = MemoryDatabase::new();
        let tr = db.create_transaction();
        tr.atomic_add(b"n", 2).unwrap();
        tr.commit().await.unwrap();

        let tr = db.create_transaction();
        tr.atomic_add(b"n", 3).unwrap();
        assert_eq!(tr.get(b"n", true).await.unwrap(), Some(5i64.to_le_bytes().to_vec()));

        tr.clear_range(&range(b"a", b"z")).unwrap();
        assert_eq!(tr.get(b"n", true).await.unwrap(), None);

        tr.atomic_add(b"n", 7).unwrap();
        assert_eq!(tr.get(b"n", true).await.unwrap(), Some(7i64.to_le_bytes().to_vec()));

        tr.set(b"m", b"x").unwrap();
        let rows = tr.get_range(&range(b"a", b"z"), RangeOptions::default(), true).await.unwrap();
        let keys: Vec<&[u8]> = rows.iter().map(|kv| kv.key.as_slice()).collect();
        assert_eq!(keys, vec![&b"m"[..], &b"n"[..]]);

        tr.commit().await.unwrap();
        let tr = db.create_transaction();
        assert_eq!(tr.get(b"n", true).await.unwrap(), Some(7i64.to_le_bytes().to_vec()));
        assert_eq!(tr.get(b"m", true).await.unwrap(), Some(b"x".to_vec()));
    }

    #[tokio::test]
    async fn test_large_transaction_reads_its_writes() {
        let db = MemoryDatabase::new();
        let tr = db.create_transaction();
        for i in 0u32..20_000 {
            tr.set(&i.to_be_bytes(), b"v").unwrap();
            assert_eq!(tr.get(&i.to_be_bytes(), true).await.unwrap(), Some(b"v".to_vec()));
        }
        tr.commit().await.unwrap();
        assert_eq!(db.len(), 20_000);
    }
}
