//! Result of walking a path through the node tree.

use cairn_layer::Subspace;

use crate::constants::PARTITION_LAYER;

/// Metadata of a node that exists.
#[derive(Debug, Clone)]
pub(super) struct FoundNode {
    /// Allocated content prefix.
    pub(super) prefix: Vec<u8>,
    /// Node subspace holding the metadata.
    pub(super) subspace: Subspace,
    /// Layer id, empty when unset.
    pub(super) layer: Vec<u8>,
}

/// Where a path lookup stopped.
///
/// The walk stops at the first missing component or at the first partition,
/// so `current_path` is a prefix of `target_path`.
#[derive(Debug, Clone)]
pub(super) struct Node {
    pub(super) found: Option<FoundNode>,
    pub(super) current_path: Vec<String>,
    pub(super) target_path: Vec<String>,
}

impl Node {
    pub(super) fn exists(&self) -> bool {
        self.found.is_some()
    }

    /// True when the walk stopped at a partition.
    ///
    /// With `include_empty_subpath` the partition itself counts; otherwise
    /// the target must lie strictly below it.
    pub(super) fn is_in_partition(&self, include_empty_subpath: bool) -> bool {
        match &self.found {
            Some(found) => {
                found.layer == PARTITION_LAYER
                    && (include_empty_subpath || self.target_path.len() > self.current_path.len())
            }
            None => false,
        }
    }

    /// Part of the target path below the node.
    pub(super) fn partition_subpath(&self) -> Vec<String> {
        self.target_path[self.current_path.len()..].to_vec()
    }
}
