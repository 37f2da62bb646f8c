//! DirectoryPartition - a directory that owns its own directory layer.

use super::DirectoryLayer;

/// A directory created with the `partition` layer.
///
/// Everything below a partition lives in a nested [`DirectoryLayer`] whose
/// node subspace is `prefix ++ 0xFE` and whose content subspace is `prefix`.
/// All of a partition's descendants therefore share its prefix, and removing
/// the partition clears them in one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPartition {
    path: Vec<String>,
    prefix: Vec<u8>,
    directory_layer: DirectoryLayer,
    parent_layer: DirectoryLayer,
}

impl DirectoryPartition {
    pub(super) fn new(path: Vec<String>, prefix: Vec<u8>, parent_layer: DirectoryLayer) -> Self {
        let directory_layer = DirectoryLayer::for_partition(&prefix, path.clone());
        Self {
            path,
            prefix,
            directory_layer,
            parent_layer,
        }
    }

    /// Absolute path of the partition.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The partition's own directory layer.
    pub fn directory_layer(&self) -> &DirectoryLayer {
        &self.directory_layer
    }

    /// Directory layer holding the partition's own node.
    pub fn parent_layer(&self) -> &DirectoryLayer {
        &self.parent_layer
    }

    pub(crate) fn prefix(&self) -> &[u8] {
        &self.prefix
    }
}
