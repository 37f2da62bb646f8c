//! DirectoryLayer - public API for hierarchical namespace management.

use cairn_kv::KeyRange;
use cairn_kv::RangeOptions;
use cairn_kv::Transaction;
use cairn_layer::Subspace;
use cairn_layer::Tuple;
use cairn_layer::strinc;
use cairn_layer::subspace::hex_escape;
use futures::FutureExt;
use futures::future::BoxFuture;
use snafu::ResultExt;
use tracing::debug;
use tracing::trace;

use super::AllocationSnafu;
use super::Directory;
use super::DirectoryError;
use super::OpenMode;
use super::SubspaceSnafu;
use super::node::FoundNode;
use super::node::Node;
use super::partition::DirectoryPartition;
use super::subspace::DirectorySubspace;
use super::validation::to_owned_path;
use super::validation::validate_path;
use super::validation::validate_path_allow_empty;
use crate::allocator::HighContentionAllocator;
use crate::config::ConfigError;
use crate::config::DirectoryConfig;
use crate::constants::DEFAULT_NODE_PREFIX;
use crate::constants::HCA_KEY;
use crate::constants::LAYER_KEY;
use crate::constants::LAYER_VERSION;
use crate::constants::MAX_LIST_RESULTS;
use crate::constants::PARTITION_LAYER;
use crate::constants::PARTITION_NODE_SUFFIX;
use crate::constants::SUBDIRS_KEY;
use crate::constants::VERSION_KEY;

/// Directory Layer for hierarchical namespace management.
///
/// The Directory Layer maps hierarchical paths to short binary prefixes,
/// enabling efficient multi-tenant namespace isolation.
///
/// The layer itself holds no state besides its subspaces. Every operation
/// runs inside the caller's transaction, so several operations can be
/// combined atomically and conflicts are handled by retrying the whole
/// transaction (see [`cairn_kv::run`]).
///
/// # Thread Safety
///
/// `DirectoryLayer` is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayer {
    /// Subspace for directory metadata.
    node_subspace: Subspace,
    /// Subspace under which prefixes are allocated.
    content_subspace: Subspace,
    /// Node of the root directory.
    root_node: Subspace,
    /// High-contention allocator for prefix allocation.
    allocator: HighContentionAllocator,
    /// Whether `create` accepts caller-chosen prefixes.
    allow_manual_prefixes: bool,
    /// Absolute path of the partition this layer belongs to.
    path: Vec<String>,
}

impl Default for DirectoryLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryLayer {
    /// Create a Directory Layer with the standard layout.
    ///
    /// Metadata lives under the prefix 0xFE and content prefixes are
    /// allocated at the start of the keyspace.
    pub fn new() -> Self {
        Self::with_subspaces(Subspace::from_bytes(vec![DEFAULT_NODE_PREFIX]), Subspace::all(), false)
    }

    /// Create a Directory Layer over explicit node and content subspaces.
    pub fn with_subspaces(node_subspace: Subspace, content_subspace: Subspace, allow_manual_prefixes: bool) -> Self {
        let root_node = node_subspace.subspace(&Tuple::new().push(node_subspace.raw_prefix()));
        let allocator = HighContentionAllocator::new(root_node.subspace(&Tuple::new().push(HCA_KEY)));

        Self {
            node_subspace,
            content_subspace,
            root_node,
            allocator,
            allow_manual_prefixes,
            path: Vec::new(),
        }
    }

    /// Create a Directory Layer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured prefix is not valid hex or lies in the
    /// reserved system range.
    pub fn with_config(config: &DirectoryConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_subspaces(
            config.node_subspace()?,
            config.content_subspace()?,
            config.allow_manual_prefixes,
        ))
    }

    /// Layer nested inside the partition at `path` with content `prefix`.
    pub(super) fn for_partition(prefix: &[u8], path: Vec<String>) -> Self {
        let mut node_prefix = prefix.to_vec();
        node_prefix.push(PARTITION_NODE_SUFFIX);

        let mut layer = Self::with_subspaces(Subspace::from_bytes(node_prefix), Subspace::from_bytes(prefix), false);
        layer.path = path;
        layer
    }

    /// Subspace holding directory metadata.
    pub fn node_subspace(&self) -> &Subspace {
        &self.node_subspace
    }

    /// Subspace under which prefixes are allocated.
    pub fn content_subspace(&self) -> &Subspace {
        &self.content_subspace
    }

    /// Absolute path of the partition this layer belongs to; empty for the
    /// root layer.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    // =========================================================================
    // Public API
    // =========================================================================

    /// Create or open a directory at the given path.
    ///
    /// Missing parent directories are created along the way. If the directory
    /// exists and `layer` is given (and non-empty), the stored layer must
    /// match.
    ///
    /// # Arguments
    ///
    /// * `trx` - Transaction to run in
    /// * `path` - Path components (e.g., `&["apps", "forge"]`)
    /// * `layer` - Layer id for a new directory, or the one to check on open
    ///
    /// # Errors
    ///
    /// Returns an error if path validation fails, the layer doesn't match,
    /// prefix allocation fails, or a storage error occurs.
    pub async fn create_or_open(
        &self,
        trx: &dyn Transaction,
        path: &[&str],
        layer: Option<&[u8]>,
    ) -> Result<Directory, DirectoryError> {
        validate_path(path)?;
        self.create_or_open_at(trx, to_owned_path(path), layer, None, OpenMode::CreateOrOpen).await
    }

    /// Create a new directory.
    ///
    /// # Arguments
    ///
    /// * `trx` - Transaction to run in
    /// * `path` - Path components
    /// * `layer` - Layer id to store with the directory
    /// * `prefix` - Explicit content prefix; requires manual prefixes
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::AlreadyExists`] if the directory exists,
    /// [`DirectoryError::InvalidOperation`] if a prefix is given but manual
    /// prefixes are disabled, and [`DirectoryError::PrefixInUse`] if the
    /// given prefix overlaps another directory.
    pub async fn create(
        &self,
        trx: &dyn Transaction,
        path: &[&str],
        layer: Option<&[u8]>,
        prefix: Option<&[u8]>,
    ) -> Result<Directory, DirectoryError> {
        validate_path(path)?;
        self.create_or_open_at(trx, to_owned_path(path), layer, prefix, OpenMode::Create).await
    }

    /// Open an existing directory.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if the directory doesn't exist
    /// and [`DirectoryError::LayerMismatch`] if `layer` doesn't match.
    pub async fn open(
        &self,
        trx: &dyn Transaction,
        path: &[&str],
        layer: Option<&[u8]>,
    ) -> Result<Directory, DirectoryError> {
        validate_path(path)?;
        self.create_or_open_at(trx, to_owned_path(path), layer, None, OpenMode::Open).await
    }

    /// Check if a directory exists. The root always exists.
    pub async fn exists(&self, trx: &dyn Transaction, path: &[&str]) -> Result<bool, DirectoryError> {
        validate_path_allow_empty(path)?;
        self.exists_at(trx, to_owned_path(path)).await
    }

    /// List immediate subdirectories of a path, sorted by name.
    ///
    /// An empty path lists the root.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if the directory doesn't exist,
    /// or [`DirectoryError::TooManyChildren`] if it has more than
    /// [`MAX_LIST_RESULTS`] subdirectories.
    pub async fn list(&self, trx: &dyn Transaction, path: &[&str]) -> Result<Vec<String>, DirectoryError> {
        validate_path_allow_empty(path)?;
        self.list_at(trx, to_owned_path(path)).await
    }

    /// Move a directory to a new path.
    ///
    /// Only the link from the parent changes; the directory keeps its prefix
    /// and therefore all of its data.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::InvalidOperation`] if either path is the root, the
    ///   destination is inside the source, or the move crosses a partition
    /// - [`DirectoryError::NotFound`] if the source or the destination's
    ///   parent doesn't exist
    /// - [`DirectoryError::AlreadyExists`] if the destination exists
    pub async fn move_to(
        &self,
        trx: &dyn Transaction,
        old_path: &[&str],
        new_path: &[&str],
    ) -> Result<Directory, DirectoryError> {
        validate_path_allow_empty(old_path)?;
        validate_path_allow_empty(new_path)?;
        self.move_at(trx, to_owned_path(old_path), to_owned_path(new_path)).await
    }

    /// Remove a directory, its subdirectories and all of their content.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if the directory doesn't exist and
    /// [`DirectoryError::InvalidOperation`] for the root.
    pub async fn remove(&self, trx: &dyn Transaction, path: &[&str]) -> Result<(), DirectoryError> {
        validate_path_allow_empty(path)?;
        self.remove_at(trx, to_owned_path(path), true).await.map(|_| ())
    }

    /// Like [`DirectoryLayer::remove`], returning `false` when the directory
    /// doesn't exist.
    pub async fn remove_if_exists(&self, trx: &dyn Transaction, path: &[&str]) -> Result<bool, DirectoryError> {
        validate_path_allow_empty(path)?;
        self.remove_at(trx, to_owned_path(path), false).await
    }

    // =========================================================================
    // Operations on validated, layer-relative paths
    // =========================================================================

    pub(super) fn create_or_open_at<'a>(
        &'a self,
        trx: &'a dyn Transaction,
        path: Vec<String>,
        layer: Option<&'a [u8]>,
        prefix: Option<&'a [u8]>,
        mode: OpenMode,
    ) -> BoxFuture<'a, Result<Directory, DirectoryError>> {
        async move {
            if path.is_empty() {
                return Err(DirectoryError::InvalidOperation {
                    reason: "the root directory cannot be opened".to_string(),
                });
            }

            let (owner, node) = self.resolve(trx, path).await?;

            if prefix.is_some() && !owner.allow_manual_prefixes {
                let reason = if owner.path.is_empty() {
                    "cannot specify a prefix unless manual prefixes are enabled"
                } else {
                    "cannot specify a prefix in a partition"
                };
                return Err(DirectoryError::InvalidOperation {
                    reason: reason.to_string(),
                });
            }

            if let Some(found) = node.found {
                if !mode.allow_open() {
                    return Err(DirectoryError::AlreadyExists {
                        path: owner.absolute(&node.target_path),
                    });
                }
                if let Some(expected) = layer.filter(|l| !l.is_empty()) {
                    if found.layer != expected {
                        return Err(DirectoryError::LayerMismatch {
                            path: owner.absolute(&node.target_path),
                            expected: expected.to_vec(),
                            actual: found.layer,
                        });
                    }
                }
                return Ok(owner.contents_of_node(found.prefix, &node.target_path, found.layer));
            }

            if !mode.allow_create() {
                return Err(DirectoryError::NotFound {
                    path: owner.absolute(&node.target_path),
                });
            }

            owner.create_node(trx, node.target_path, layer, prefix).await
        }
        .boxed()
    }

    /// Create the node for `path`, whose parent may still be missing.
    async fn create_node(
        &self,
        trx: &dyn Transaction,
        path: Vec<String>,
        layer: Option<&[u8]>,
        prefix: Option<&[u8]>,
    ) -> Result<Directory, DirectoryError> {
        self.check_version(trx, true).await?;

        let prefix = match prefix {
            Some(prefix) => {
                let prefix = Subspace::checked(prefix).context(SubspaceSnafu)?.into_bytes();
                if !self.is_prefix_free(trx, &prefix, false).await? {
                    return Err(DirectoryError::PrefixInUse { prefix });
                }
                prefix
            }
            None => self.allocate_prefix(trx).await?,
        };

        let (parent, name) = match path.split_last() {
            Some((name, parent)) => (parent, name),
            None => {
                return Err(DirectoryError::InvalidOperation {
                    reason: "the root directory cannot be created".to_string(),
                });
            }
        };

        let parent_prefix = if parent.is_empty() {
            self.node_subspace.raw_prefix().to_vec()
        } else {
            let parent_dir = self.create_or_open_at(trx, parent.to_vec(), None, None, OpenMode::CreateOrOpen).await?;
            parent_dir.prefix().to_vec()
        };
        let parent_node = self.node_with_prefix(&parent_prefix);

        let layer = layer.unwrap_or_default();
        trx.set(&parent_node.pack(&Tuple::new().push(SUBDIRS_KEY).push(name.as_str())), &prefix)?;
        trx.set(&self.node_with_prefix(&prefix).pack(&Tuple::new().push(LAYER_KEY)), layer)?;

        debug!(path = %self.absolute(&path).join("/"), prefix = %hex_escape(&prefix), "created directory");
        Ok(self.contents_of_node(prefix, &path, layer.to_vec()))
    }

    /// Allocate a fresh prefix in the content subspace.
    async fn allocate_prefix(&self, trx: &dyn Transaction) -> Result<Vec<u8>, DirectoryError> {
        let id = self.allocator.allocate(trx).await.context(AllocationSnafu)?;
        let prefix = self.content_subspace.pack(&Tuple::new().push(id));

        let (begin, end) = Subspace::from_bytes(prefix.as_slice()).prefix_range();
        let existing = trx.get_range(&KeyRange::new(begin, end), RangeOptions::default().limit(1), false).await?;
        if !existing.is_empty() {
            // Keys written at this prefix without going through the layer
            return Err(DirectoryError::PrefixInUse { prefix });
        }

        if !self.is_prefix_free(trx, &prefix, true).await? {
            // A manual prefix overlaps the allocator's range
            return Err(DirectoryError::PrefixInUse { prefix });
        }

        Ok(prefix)
    }

    pub(super) async fn exists_at(&self, trx: &dyn Transaction, path: Vec<String>) -> Result<bool, DirectoryError> {
        let (_, node) = self.resolve(trx, path).await?;
        Ok(node.exists())
    }

    pub(super) async fn list_at(&self, trx: &dyn Transaction, path: Vec<String>) -> Result<Vec<String>, DirectoryError> {
        self.list_with_limit(trx, path, MAX_LIST_RESULTS).await
    }

    /// List at most `limit` children, failing rather than truncating.
    pub(super) async fn list_with_limit(
        &self,
        trx: &dyn Transaction,
        path: Vec<String>,
        limit: usize,
    ) -> Result<Vec<String>, DirectoryError> {
        let (owner, node) = self.resolve(trx, path).await?;
        let absolute = owner.absolute(&node.target_path);
        let Some(found) = node.found else {
            return Err(DirectoryError::NotFound { path: absolute });
        };

        // A partition lists the root of its own layer
        let (owner, node_subspace) = if found.layer == PARTITION_LAYER {
            let inner = DirectoryLayer::for_partition(&found.prefix, owner.absolute(&node.current_path));
            let root = inner.root_node.clone();
            (inner, root)
        } else {
            (owner, found.subspace)
        };

        let children = owner.subdirectories(trx, &node_subspace, Some(limit.saturating_add(1))).await?;
        if children.len() > limit {
            return Err(DirectoryError::TooManyChildren { path: absolute, limit });
        }
        Ok(children.into_iter().map(|(name, _)| name).collect())
    }

    pub(super) async fn move_at(
        &self,
        trx: &dyn Transaction,
        old_path: Vec<String>,
        new_path: Vec<String>,
    ) -> Result<Directory, DirectoryError> {
        if old_path.is_empty() || new_path.is_empty() {
            return Err(DirectoryError::InvalidOperation {
                reason: "the root directory cannot be moved".to_string(),
            });
        }

        let mut owner = self.clone();
        let mut old_path = old_path;
        let mut new_path = new_path;

        loop {
            owner.check_version(trx, true).await?;

            if new_path.starts_with(&old_path) {
                return Err(DirectoryError::InvalidOperation {
                    reason: "the destination directory cannot be a subdirectory of the source directory".to_string(),
                });
            }

            let old_node = owner.find(trx, &old_path).await?;
            let new_node = owner.find(trx, &new_path).await?;

            let Some(old_found) = old_node.found.clone() else {
                return Err(DirectoryError::NotFound {
                    path: owner.absolute(&old_path),
                });
            };

            if old_node.is_in_partition(false) || new_node.is_in_partition(false) {
                if !old_node.is_in_partition(false)
                    || !new_node.is_in_partition(false)
                    || old_node.current_path != new_node.current_path
                {
                    return Err(DirectoryError::InvalidOperation {
                        reason: "cannot move between partitions".to_string(),
                    });
                }

                let inner = DirectoryLayer::for_partition(&old_found.prefix, owner.absolute(&old_node.current_path));
                old_path = old_node.partition_subpath();
                new_path = new_node.partition_subpath();
                owner = inner;
                continue;
            }

            if new_node.exists() {
                return Err(DirectoryError::AlreadyExists {
                    path: owner.absolute(&new_path),
                });
            }

            let Some((new_name, new_parent)) = new_path.split_last() else {
                return Err(DirectoryError::InvalidOperation {
                    reason: "the root directory cannot be moved".to_string(),
                });
            };
            let parent_node = owner.find(trx, new_parent).await?;
            let Some(parent_found) = parent_node.found else {
                return Err(DirectoryError::NotFound {
                    path: owner.absolute(new_parent),
                });
            };

            trx.set(
                &parent_found.subspace.pack(&Tuple::new().push(SUBDIRS_KEY).push(new_name.as_str())),
                &old_found.prefix,
            )?;
            owner.remove_from_parent(trx, &old_path).await?;

            debug!(
                from = %owner.absolute(&old_path).join("/"),
                to = %owner.absolute(&new_path).join("/"),
                "moved directory"
            );
            return Ok(owner.contents_of_node(old_found.prefix, &new_path, old_found.layer));
        }
    }

    pub(super) async fn remove_at(
        &self,
        trx: &dyn Transaction,
        path: Vec<String>,
        fail_on_missing: bool,
    ) -> Result<bool, DirectoryError> {
        if path.is_empty() {
            return Err(DirectoryError::InvalidOperation {
                reason: "the root directory cannot be removed".to_string(),
            });
        }

        let (owner, node) = self.resolve(trx, path).await?;
        owner.check_version(trx, true).await?;

        let Some(found) = node.found else {
            if fail_on_missing {
                return Err(DirectoryError::NotFound {
                    path: owner.absolute(&node.target_path),
                });
            }
            return Ok(false);
        };

        owner.remove_recursive(trx, found.prefix).await?;
        owner.remove_from_parent(trx, &node.target_path).await?;

        debug!(path = %owner.absolute(&node.target_path).join("/"), "removed directory");
        Ok(true)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Absolute path for a path relative to this layer.
    fn absolute(&self, path: &[String]) -> Vec<String> {
        let mut full = self.path.clone();
        full.extend_from_slice(path);
        full
    }

    /// Node subspace for a content prefix.
    fn node_with_prefix(&self, prefix: &[u8]) -> Subspace {
        self.node_subspace.subspace(&Tuple::new().push(prefix))
    }

    /// Directory handle for a node.
    fn contents_of_node(&self, prefix: Vec<u8>, path: &[String], layer: Vec<u8>) -> Directory {
        let path = self.absolute(path);
        if layer == PARTITION_LAYER {
            Directory::Partition(DirectoryPartition::new(path, prefix, self.clone()))
        } else {
            Directory::Subspace(DirectorySubspace::new(Subspace::from_bytes(prefix), path, layer, self.clone()))
        }
    }

    /// Check the stored layout version, writing it on first write access.
    async fn check_version(&self, trx: &dyn Transaction, write_access: bool) -> Result<(), DirectoryError> {
        let key = self.root_node.pack(&Tuple::new().push(VERSION_KEY));
        let Some(value) = trx.get(&key, false).await? else {
            if write_access {
                trx.set(&key, &encode_version(LAYER_VERSION))?;
            }
            return Ok(());
        };

        let (major, minor, micro) = decode_version(&value).ok_or_else(|| DirectoryError::CorruptedMetadata {
            path: self.path.clone(),
            reason: format!("version value is {} bytes, expected 12", value.len()),
        })?;

        if major > LAYER_VERSION.0 {
            return Err(DirectoryError::IncompatibleVersion {
                major,
                minor,
                micro,
                access: "read",
            });
        }
        if minor > LAYER_VERSION.1 && write_access {
            return Err(DirectoryError::IncompatibleVersion {
                major,
                minor,
                micro,
                access: "write",
            });
        }
        Ok(())
    }

    /// Walk `path` from the root, stopping at a missing node or a partition.
    async fn find(&self, trx: &dyn Transaction, path: &[String]) -> Result<Node, DirectoryError> {
        let mut found = FoundNode {
            prefix: self.node_subspace.raw_prefix().to_vec(),
            subspace: self.root_node.clone(),
            layer: Vec::new(),
        };

        for (depth, name) in path.iter().enumerate() {
            let link = found.subspace.pack(&Tuple::new().push(SUBDIRS_KEY).push(name.as_str()));
            let current_path = path[..=depth].to_vec();

            let Some(prefix) = trx.get(&link, false).await? else {
                return Ok(Node {
                    found: None,
                    current_path,
                    target_path: path.to_vec(),
                });
            };

            let subspace = self.node_with_prefix(&prefix);
            let layer = trx.get(&subspace.pack(&Tuple::new().push(LAYER_KEY)), false).await?.unwrap_or_default();
            found = FoundNode {
                prefix,
                subspace,
                layer,
            };

            if found.layer == PARTITION_LAYER {
                return Ok(Node {
                    found: Some(found),
                    current_path,
                    target_path: path.to_vec(),
                });
            }
        }

        Ok(Node {
            found: Some(found),
            current_path: path.to_vec(),
            target_path: path.to_vec(),
        })
    }

    /// Find `path`, descending into partitions until the owning layer is
    /// reached. The returned node's paths are relative to the returned layer.
    ///
    /// A partition's own node belongs to the outer layer, so a path that ends
    /// at a partition stops there.
    async fn resolve(&self, trx: &dyn Transaction, path: Vec<String>) -> Result<(DirectoryLayer, Node), DirectoryError> {
        let mut owner = self.clone();
        let mut path = path;

        loop {
            owner.check_version(trx, false).await?;
            let node = owner.find(trx, &path).await?;

            match &node.found {
                Some(found) if node.is_in_partition(false) => {
                    trace!(partition = %owner.absolute(&node.current_path).join("/"), "descending into partition");
                    let inner = DirectoryLayer::for_partition(&found.prefix, owner.absolute(&node.current_path));
                    path = node.partition_subpath();
                    owner = inner;
                }
                _ => return Ok((owner, node)),
            }
        }
    }

    /// Child names and prefixes of a node, sorted by name.
    async fn subdirectories(
        &self,
        trx: &dyn Transaction,
        node: &Subspace,
        limit: Option<usize>,
    ) -> Result<Vec<(String, Vec<u8>)>, DirectoryError> {
        let subdirs = node.subspace(&Tuple::new().push(SUBDIRS_KEY));
        let (begin, end) = subdirs.range();
        let options = RangeOptions {
            limit,
            reverse: false,
        };

        let mut children = Vec::new();
        for kv in trx.get_range(&KeyRange::new(begin, end), options, false).await? {
            let name = subdirs
                .unpack(&kv.key)
                .context(SubspaceSnafu)?
                .get_as::<String>(0)
                .map_err(|e| DirectoryError::CorruptedMetadata {
                    path: self.path.clone(),
                    reason: format!("invalid subdirectory key {}: {e}", hex_escape(&kv.key)),
                })?;
            children.push((name, kv.value));
        }
        Ok(children)
    }

    /// Delete a node, every descendant node and all of their content.
    async fn remove_recursive(&self, trx: &dyn Transaction, prefix: Vec<u8>) -> Result<(), DirectoryError> {
        let mut pending = vec![prefix];

        while let Some(prefix) = pending.pop() {
            let node = self.node_with_prefix(&prefix);
            for (_, child) in self.subdirectories(trx, &node, None).await? {
                pending.push(child);
            }

            let (begin, end) = Subspace::from_bytes(prefix.as_slice()).prefix_range();
            trx.clear_range(&KeyRange::new(begin, end))?;
            let (begin, end) = node.range();
            trx.clear_range(&KeyRange::new(begin, end))?;
        }

        Ok(())
    }

    /// Delete the link from `path`'s parent to `path`.
    async fn remove_from_parent(&self, trx: &dyn Transaction, path: &[String]) -> Result<(), DirectoryError> {
        let Some((name, parent_path)) = path.split_last() else {
            return Ok(());
        };
        let parent = self.find(trx, parent_path).await?;
        if let Some(found) = parent.found {
            trx.clear(&found.subspace.pack(&Tuple::new().push(SUBDIRS_KEY).push(name.as_str())))?;
        }
        Ok(())
    }

    /// Node whose content prefix is a prefix of `key`, if any.
    async fn node_containing_key(
        &self,
        trx: &dyn Transaction,
        key: &[u8],
        snapshot: bool,
    ) -> Result<Option<Vec<u8>>, DirectoryError> {
        if key.starts_with(self.node_subspace.raw_prefix()) {
            return Ok(Some(self.node_subspace.raw_prefix().to_vec()));
        }

        let (begin, _) = self.node_subspace.range();
        let mut end = self.node_subspace.pack(&Tuple::new().push(key));
        end.push(0x00);

        let previous =
            trx.get_range(&KeyRange::new(begin, end), RangeOptions::default().limit(1).reverse(), snapshot).await?;
        if let Some(kv) = previous.first() {
            let previous_prefix =
                self.node_subspace.unpack(&kv.key).context(SubspaceSnafu)?.get_as::<Vec<u8>>(0).map_err(|e| {
                    DirectoryError::CorruptedMetadata {
                        path: self.path.clone(),
                        reason: format!("invalid node key {}: {e}", hex_escape(&kv.key)),
                    }
                })?;
            if key.starts_with(&previous_prefix) {
                return Ok(Some(previous_prefix));
            }
        }
        Ok(None)
    }

    /// True when no directory's prefix overlaps `prefix`.
    async fn is_prefix_free(&self, trx: &dyn Transaction, prefix: &[u8], snapshot: bool) -> Result<bool, DirectoryError> {
        if prefix.is_empty() {
            return Ok(false);
        }
        if self.node_containing_key(trx, prefix, snapshot).await?.is_some() {
            return Ok(false);
        }
        let Some(end) = strinc(prefix) else {
            return Ok(false);
        };

        let range = KeyRange::new(
            self.node_subspace.pack(&Tuple::new().push(prefix)),
            self.node_subspace.pack(&Tuple::new().push(end)),
        );
        Ok(trx.get_range(&range, RangeOptions::default().limit(1), snapshot).await?.is_empty())
    }
}

fn encode_version((major, minor, micro): (u32, u32, u32)) -> Vec<u8> {
    let mut value = Vec::with_capacity(12);
    value.extend_from_slice(&major.to_le_bytes());
    value.extend_from_slice(&minor.to_le_bytes());
    value.extend_from_slice(&micro.to_le_bytes());
    value
}

fn decode_version(value: &[u8]) -> Option<(u32, u32, u32)> {
    if value.len() != 12 {
        return None;
    }
    let word = |i: usize| value.get(i * 4..i * 4 + 4).and_then(|b| b.try_into().ok()).map(u32::from_le_bytes);
    Some((word(0)?, word(1)?, word(2)?))
}
