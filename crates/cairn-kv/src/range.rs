//! Key ranges, key/value pairs and range read options.

/// Half-open key range `[begin, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyRange {
    /// Inclusive start key.
    pub begin: Vec<u8>,
    /// Exclusive end key.
    pub end: Vec<u8>,
}

impl KeyRange {
    /// Range from `begin` (inclusive) to `end` (exclusive).
    pub fn new(begin: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
        }
    }

    /// Range holding exactly `key`.
    pub fn single(key: &[u8]) -> Self {
        let mut end = key.to_vec();
        end.push(0x00);
        Self {
            begin: key.to_vec(),
            end,
        }
    }

    /// True when `key` lies in the range.
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.begin.as_slice() && key < self.end.as_slice()
    }

    /// True when the range holds no keys.
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// True when the two ranges share at least one key.
    pub fn intersects(&self, other: &KeyRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.begin < other.end && other.begin < self.end
    }
}

impl From<(Vec<u8>, Vec<u8>)> for KeyRange {
    fn from((begin, end): (Vec<u8>, Vec<u8>)) -> Self {
        Self { begin, end }
    }
}

/// A key and its value, as returned by range reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// The key.
    pub key: Vec<u8>,
    /// The value.
    pub value: Vec<u8>,
}

/// Options for [`Transaction::get_range`](crate::Transaction::get_range).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeOptions {
    /// Maximum number of pairs to return; `None` returns the whole range.
    pub limit: Option<usize>,
    /// Return pairs in descending key order.
    pub reverse: bool,
}

impl RangeOptions {
    /// Return at most `limit` pairs.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Return pairs in descending key order.
    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }
}
