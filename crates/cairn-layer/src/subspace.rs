//! Prefix-scoped key construction.
//!
//! A [`Subspace`] is a binary prefix plus helpers that pack tuples under it.
//! Every key a subspace produces starts with its prefix, so a single range
//! scan over the prefix sees exactly the keys that belong to it.

use snafu::ResultExt;
use snafu::Snafu;

use crate::tuple::Tuple;
use crate::tuple::TupleError;
use crate::tuple::strinc;

/// First byte of the store's reserved system key range.
pub const SYSTEM_KEY_PREFIX: u8 = 0xFF;

/// Errors produced by subspace operations.
#[derive(Debug, Snafu)]
pub enum SubspaceError {
    /// The prefix lies inside the store's reserved system range.
    #[snafu(display("prefix {} lies in the reserved system key range", hex_escape(prefix)))]
    InvalidPrefix {
        /// The rejected prefix.
        prefix: Vec<u8>,
    },

    /// The key does not start with the subspace prefix.
    #[snafu(display("key {} is outside subspace {}", hex_escape(key), hex_escape(prefix)))]
    KeyOutsideSubspace {
        /// The key that was passed in.
        key: Vec<u8>,
        /// The subspace prefix.
        prefix: Vec<u8>,
    },

    /// The key suffix is not a valid tuple encoding.
    #[snafu(display("cannot decode key suffix: {source}"))]
    Tuple {
        /// Underlying decode error.
        source: TupleError,
    },
}

/// Render bytes FDB-style: printable ASCII as-is, everything else as `\xNN`.
pub fn hex_escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_graphic() && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\x{b:02x}"));
        }
    }
    out
}

/// A binary key prefix with tuple packing helpers.
///
/// Subspaces own their bytes. Two subspaces with equal prefixes are equal and
/// interchangeable.
///
/// # Example
///
/// ```
/// use cairn_layer::{Subspace, Tuple};
///
/// let users = Subspace::new(&Tuple::new().push("users"));
/// let key = users.pack(&Tuple::new().push("alice"));
///
/// assert!(users.contains(&key));
/// assert_eq!(users.unpack(&key).unwrap(), Tuple::new().push("alice"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Subspace {
    prefix: Vec<u8>,
}

impl Subspace {
    /// Subspace whose prefix is the packed tuple.
    pub fn new(prefix: &Tuple) -> Self {
        Self { prefix: prefix.pack() }
    }

    /// Subspace over raw prefix bytes.
    pub fn from_bytes(prefix: impl Into<Vec<u8>>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Subspace over raw prefix bytes, rejecting the reserved system range.
    pub fn checked(prefix: impl Into<Vec<u8>>) -> Result<Self, SubspaceError> {
        let prefix = prefix.into();
        if prefix.first() == Some(&SYSTEM_KEY_PREFIX) {
            return Err(SubspaceError::InvalidPrefix { prefix });
        }
        Ok(Self { prefix })
    }

    /// The subspace covering the whole keyspace.
    pub fn all() -> Self {
        Self::default()
    }

    /// Raw prefix bytes.
    pub fn raw_prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Consume the subspace and return its prefix.
    pub fn into_bytes(self) -> Vec<u8> {
        self.prefix
    }

    /// Child subspace: this prefix followed by the packed `suffix`.
    pub fn subspace(&self, suffix: &Tuple) -> Subspace {
        let mut prefix = self.prefix.clone();
        suffix.pack_into(&mut prefix);
        Subspace { prefix }
    }

    /// Key for `tuple` within this subspace.
    pub fn pack(&self, tuple: &Tuple) -> Vec<u8> {
        let mut key = self.prefix.clone();
        tuple.pack_into(&mut key);
        key
    }

    /// Append the key for `tuple` to `buf`.
    pub fn pack_into(&self, tuple: &Tuple, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.prefix);
        tuple.pack_into(buf);
    }

    /// Decode the tuple part of a key produced by this subspace.
    pub fn unpack(&self, key: &[u8]) -> Result<Tuple, SubspaceError> {
        let suffix = key.strip_prefix(self.prefix.as_slice()).ok_or_else(|| SubspaceError::KeyOutsideSubspace {
            key: key.to_vec(),
            prefix: self.prefix.clone(),
        })?;
        Tuple::unpack(suffix).context(TupleSnafu)
    }

    /// True when `key` starts with this prefix.
    pub fn contains(&self, key: &[u8]) -> bool {
        key.starts_with(&self.prefix)
    }

    /// Range of every tuple key strictly inside the subspace:
    /// `[prefix 0x00, prefix 0xFF)`.
    pub fn range(&self) -> (Vec<u8>, Vec<u8>) {
        let mut start = self.prefix.clone();
        start.push(0x00);
        let mut end = self.prefix.clone();
        end.push(0xFF);
        (start, end)
    }

    /// Range of every key that starts with the prefix, the prefix included.
    ///
    /// An empty or all-`0xFF` prefix has no increment; the end is then the
    /// prefix followed by `0xFF`.
    pub fn prefix_range(&self) -> (Vec<u8>, Vec<u8>) {
        let end = strinc(&self.prefix).unwrap_or_else(|| {
            let mut end = self.prefix.clone();
            end.push(0xFF);
            end
        });
        (self.prefix.clone(), end)
    }
}

impl From<Tuple> for Subspace {
    fn from(tuple: Tuple) -> Self {
        Self::new(&tuple)
    }
}

impl From<&[u8]> for Subspace {
    fn from(prefix: &[u8]) -> Self {
        Self::from_bytes(prefix)
    }
}
