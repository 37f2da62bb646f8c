//! DirectorySubspace - a directory with an allocated prefix.

use cairn_layer::Subspace;
use cairn_layer::SubspaceError;
use cairn_layer::Tuple;

use super::DirectoryLayer;

/// A directory with an allocated prefix, extending Subspace with metadata.
///
/// `DirectorySubspace` provides all the functionality of a `Subspace` for key
/// encoding, plus metadata about the directory (path and layer id).
///
/// # Example
///
/// ```ignore
/// let repos = dir.create_or_open(&*trx, &["apps", "forge", "repos"], None).await?.into_subspace()?;
///
/// // Use subspace operations
/// let key = repos.pack(&Tuple::new().push(repo_id).push("name"));
/// let (start, end) = repos.range();
///
/// // Access metadata
/// println!("Path: {:?}", repos.path());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySubspace {
    /// The underlying subspace with the allocated prefix.
    subspace: Subspace,
    /// Full path to this directory.
    path: Vec<String>,
    /// Layer id, empty when none was given.
    layer: Vec<u8>,
    /// Directory layer that owns this directory's metadata.
    directory_layer: DirectoryLayer,
}

impl DirectorySubspace {
    pub(super) fn new(subspace: Subspace, path: Vec<String>, layer: Vec<u8>, directory_layer: DirectoryLayer) -> Self {
        Self {
            subspace,
            path,
            layer,
            directory_layer,
        }
    }

    /// Get the underlying subspace.
    pub fn subspace(&self) -> &Subspace {
        &self.subspace
    }

    /// Get the directory path.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Get the layer id.
    pub fn layer(&self) -> &[u8] {
        &self.layer
    }

    /// Directory layer this directory belongs to.
    pub fn directory_layer(&self) -> &DirectoryLayer {
        &self.directory_layer
    }

    /// Get the raw prefix bytes.
    pub fn prefix(&self) -> &[u8] {
        self.subspace.raw_prefix()
    }

    /// Pack a key tuple within this directory's subspace.
    pub fn pack(&self, key: &Tuple) -> Vec<u8> {
        self.subspace.pack(key)
    }

    /// Unpack a key from this directory's subspace.
    ///
    /// Returns the key tuple without this directory's prefix.
    pub fn unpack(&self, key: &[u8]) -> Result<Tuple, SubspaceError> {
        self.subspace.unpack(key)
    }

    /// Get the range of all keys in this directory.
    ///
    /// Returns `(start_key, end_key)` where start is inclusive and end is exclusive.
    pub fn range(&self) -> (Vec<u8>, Vec<u8>) {
        self.subspace.range()
    }

    /// Check if a key belongs to this directory.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.subspace.contains(key)
    }

    /// Create a nested subspace within this directory.
    pub fn child(&self, suffix: &Tuple) -> Subspace {
        self.subspace.subspace(suffix)
    }
}
