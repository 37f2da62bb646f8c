//! FoundationDB-style Directory Layer for hierarchical namespace management.
//!
//! The Directory Layer provides a hierarchical namespace on top of the flat
//! key-value store, mapping human-readable paths to short binary prefixes.
//!
//! # Benefits
//!
//! - **Short prefixes**: allocated prefixes are a few bytes instead of the path
//! - **Guaranteed isolation**: each directory has a unique prefix
//! - **Discoverability**: list all directories at any level
//! - **Cheap renames**: moving a directory rewrites one link, not its data
//!
//! # Persisted layout
//!
//! ```text
//! node_subspace            = 0xFE  (default)
//! content_subspace         = ""    (default)
//! root_node                = node_subspace[node_subspace.prefix]
//! root_node["version"]     = <u32 LE major><u32 LE minor><u32 LE micro>
//! root_node["hca"]         = allocator subspace
//! node(P)                  = node_subspace[P]
//! node(P)[0][name]         = child prefix
//! node(P)["layer"]         = layer id bytes
//! ```
//!
//! The layout is bit-compatible with the other FoundationDB bindings.
//!
//! # Example
//!
//! ```ignore
//! use cairn_directory::DirectoryLayer;
//!
//! let dir = DirectoryLayer::new();
//!
//! // Create application directories
//! let repos = dir.create_or_open(&*trx, &["apps", "forge", "repos"], None).await?;
//!
//! // Use the directory's subspace for keys
//! let key = repos.pack(&Tuple::new().push(repo_id).push("metadata"))?;
//! trx.set(&key, value)?;
//!
//! // List all app directories
//! let apps = dir.list(&*trx, &["apps"]).await?;
//! // => ["forge", ...]
//! ```
//!
//! # References
//!
//! - [FoundationDB Directory Layer](https://apple.github.io/foundationdb/developer-guide.html)
//! - [Directory Layer Specification](https://github.com/apple/foundationdb/blob/main/design/directory-layer.md)

mod layer;
mod node;
mod partition;
mod subspace;
mod validation;


use cairn_kv::KvError;
use cairn_kv::Retryable;
use cairn_kv::Transaction;
use cairn_layer::Subspace;
use cairn_layer::SubspaceError;
use cairn_layer::Tuple;
use cairn_layer::subspace::hex_escape;
pub use layer::DirectoryLayer;
pub use partition::DirectoryPartition;
use snafu::Snafu;
pub use subspace::DirectorySubspace;
use validation::to_owned_path;
use validation::validate_path;
use validation::validate_path_allow_empty;

use crate::allocator::AllocationError;
use crate::constants::PARTITION_LAYER;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during directory operations.
#[derive(Debug, Snafu)]
pub enum DirectoryError {
    /// Path component is invalid (empty or too long).
    #[snafu(display("invalid path component: '{}' - {}", component, reason))]
    InvalidPath {
        /// The invalid component.
        component: String,
        /// Why it's invalid.
        reason: String,
    },

    /// Path exceeds maximum depth.
    #[snafu(display("path depth {} exceeds maximum of {}", depth, max))]
    PathTooDeep {
        /// Actual depth.
        depth: u32,
        /// Maximum allowed depth.
        max: u32,
    },

    /// Directory not found at the specified path.
    #[snafu(display("directory not found: /{}", path.join("/")))]
    NotFound {
        /// The path that was not found.
        path: Vec<String>,
    },

    /// Directory already exists at the specified path.
    #[snafu(display("directory already exists: /{}", path.join("/")))]
    AlreadyExists {
        /// The path that already exists.
        path: Vec<String>,
    },

    /// Layer id mismatch when opening a directory with a specific layer.
    #[snafu(display(
        "layer mismatch for /{}: expected '{}', found '{}'",
        path.join("/"),
        hex_escape(expected),
        hex_escape(actual)
    ))]
    LayerMismatch {
        /// The path with mismatched layer.
        path: Vec<String>,
        /// Layer id the caller asked for.
        expected: Vec<u8>,
        /// Layer id stored in the directory.
        actual: Vec<u8>,
    },

    /// The directory has more subdirectories than one listing may return.
    #[snafu(display("directory /{} has more than {} subdirectories", path.join("/"), limit))]
    TooManyChildren {
        /// The directory being listed.
        path: Vec<String>,
        /// Maximum number of names a listing returns.
        limit: usize,
    },

    /// The operation is not allowed on this directory.
    #[snafu(display("invalid directory operation: {reason}"))]
    InvalidOperation {
        /// Why the operation was rejected.
        reason: String,
    },

    /// The prefix overlaps an existing directory or existing data.
    #[snafu(display("prefix {} is already in use", hex_escape(prefix)))]
    PrefixInUse {
        /// The conflicting prefix.
        prefix: Vec<u8>,
    },

    /// The stored layout version is newer than this implementation.
    #[snafu(display(
        "cannot {access} directory layout version {major}.{minor}.{micro} with layer version {}.{}.{}",
        crate::constants::LAYER_VERSION.0,
        crate::constants::LAYER_VERSION.1,
        crate::constants::LAYER_VERSION.2
    ))]
    IncompatibleVersion {
        /// Stored major version.
        major: u32,
        /// Stored minor version.
        minor: u32,
        /// Stored micro version.
        micro: u32,
        /// Access that was refused ("read" or "write").
        access: &'static str,
    },

    /// Directory metadata is corrupted.
    #[snafu(display("corrupted directory metadata for /{}: {}", path.join("/"), reason))]
    CorruptedMetadata {
        /// The path with corrupted metadata.
        path: Vec<String>,
        /// Description of the corruption.
        reason: String,
    },

    /// Prefix allocation failed.
    #[snafu(display("prefix allocation failed: {}", source))]
    Allocation {
        /// The underlying allocation error.
        source: AllocationError,
    },

    /// A key or prefix could not be handled by its subspace.
    #[snafu(display("subspace error: {}", source))]
    Subspace {
        /// The underlying subspace error.
        source: SubspaceError,
    },

    /// Storage error during directory operation.
    #[snafu(display("storage error: {}", source))]
    Storage {
        /// The underlying KV store error.
        source: KvError,
    },
}

impl From<KvError> for DirectoryError {
    fn from(source: KvError) -> Self {
        DirectoryError::Storage { source }
    }
}

impl Retryable for DirectoryError {
    fn is_retryable(&self) -> bool {
        match self {
            DirectoryError::Storage { source } => source.is_retryable(),
            DirectoryError::Allocation { source } => source.is_retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// Directory
// =============================================================================

/// A directory returned by the directory layer.
///
/// Ordinary directories carry a content subspace for application keys.
/// Partitions own a nested directory layer instead; their content cannot be
/// used to build keys directly.
///
/// Every directory remembers the [`DirectoryLayer`] that owns it, so the
/// operations below resolve relative paths against that owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directory {
    /// A directory with a usable content subspace.
    Subspace(DirectorySubspace),
    /// A directory that owns an independent directory layer.
    Partition(DirectoryPartition),
}

impl Directory {
    /// Absolute path of the directory.
    pub fn path(&self) -> &[String] {
        match self {
            Directory::Subspace(d) => d.path(),
            Directory::Partition(p) => p.path(),
        }
    }

    /// Layer id stored with the directory.
    pub fn layer(&self) -> &[u8] {
        match self {
            Directory::Subspace(d) => d.layer(),
            Directory::Partition(_) => PARTITION_LAYER,
        }
    }

    /// True for partitions.
    pub fn is_partition(&self) -> bool {
        matches!(self, Directory::Partition(_))
    }

    /// Content subspace of an ordinary directory.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::InvalidOperation`] for partitions.
    pub fn subspace(&self) -> Result<&Subspace, DirectoryError> {
        match self {
            Directory::Subspace(d) => Ok(d.subspace()),
            Directory::Partition(p) => Err(partition_content_error(p.path())),
        }
    }

    /// Consume the directory, returning it as an ordinary directory.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::InvalidOperation`] for partitions.
    pub fn into_subspace(self) -> Result<DirectorySubspace, DirectoryError> {
        match self {
            Directory::Subspace(d) => Ok(d),
            Directory::Partition(p) => Err(partition_content_error(p.path())),
        }
    }

    /// Pack a key tuple within the directory's content subspace.
    pub fn pack(&self, key: &Tuple) -> Result<Vec<u8>, DirectoryError> {
        Ok(self.subspace()?.pack(key))
    }

    /// Unpack a key from the directory's content subspace.
    pub fn unpack(&self, key: &[u8]) -> Result<Tuple, DirectoryError> {
        self.subspace()?.unpack(key).map_err(|source| DirectoryError::Subspace { source })
    }

    /// Range of all tuple keys in the directory's content subspace.
    pub fn range(&self) -> Result<(Vec<u8>, Vec<u8>), DirectoryError> {
        Ok(self.subspace()?.range())
    }

    /// Check if a key belongs to the directory's content subspace.
    pub fn contains(&self, key: &[u8]) -> Result<bool, DirectoryError> {
        Ok(self.subspace()?.contains(key))
    }

    /// Allocated prefix, partitions included.
    pub(crate) fn prefix(&self) -> &[u8] {
        match self {
            Directory::Subspace(d) => d.subspace().raw_prefix(),
            Directory::Partition(p) => p.prefix(),
        }
    }

    /// Layer that resolves `path` relative to this directory.
    ///
    /// A partition resolves its own path (the empty relative path) in its
    /// parent layer and everything below it in its own layer.
    fn layer_for_path(&self, path: &[&str]) -> &DirectoryLayer {
        match self {
            Directory::Subspace(d) => d.directory_layer(),
            Directory::Partition(p) if path.is_empty() => p.parent_layer(),
            Directory::Partition(p) => p.directory_layer(),
        }
    }

    /// `path` relative to `layer`, prefixed with this directory's own path.
    fn partition_subpath(&self, path: &[&str], layer: &DirectoryLayer) -> Vec<String> {
        let mut full = self.path()[layer.path().len()..].to_vec();
        full.extend(path.iter().map(|c| (*c).to_string()));
        full
    }

    /// Create or open a subdirectory.
    ///
    /// # Errors
    ///
    /// See [`DirectoryLayer::create_or_open`].
    pub async fn create_or_open(
        &self,
        trx: &dyn Transaction,
        path: &[&str],
        layer: Option<&[u8]>,
    ) -> Result<Directory, DirectoryError> {
        validate_path(path)?;
        let owner = self.layer_for_path(path);
        owner.create_or_open_at(trx, self.partition_subpath(path, owner), layer, None, OpenMode::CreateOrOpen).await
    }

    /// Create a subdirectory that must not exist yet.
    ///
    /// # Errors
    ///
    /// See [`DirectoryLayer::create`].
    pub async fn create(
        &self,
        trx: &dyn Transaction,
        path: &[&str],
        layer: Option<&[u8]>,
        prefix: Option<&[u8]>,
    ) -> Result<Directory, DirectoryError> {
        validate_path(path)?;
        let owner = self.layer_for_path(path);
        owner.create_or_open_at(trx, self.partition_subpath(path, owner), layer, prefix, OpenMode::Create).await
    }

    /// Open an existing subdirectory.
    ///
    /// # Errors
    ///
    /// See [`DirectoryLayer::open`].
    pub async fn open(
        &self,
        trx: &dyn Transaction,
        path: &[&str],
        layer: Option<&[u8]>,
    ) -> Result<Directory, DirectoryError> {
        validate_path(path)?;
        let owner = self.layer_for_path(path);
        owner.create_or_open_at(trx, self.partition_subpath(path, owner), layer, None, OpenMode::Open).await
    }

    /// Check whether a subdirectory (or this directory, for an empty path)
    /// exists.
    pub async fn exists(&self, trx: &dyn Transaction, path: &[&str]) -> Result<bool, DirectoryError> {
        validate_path_allow_empty(path)?;
        let owner = self.layer_for_path(path);
        owner.exists_at(trx, self.partition_subpath(path, owner)).await
    }

    /// Names of the immediate subdirectories of `path`, sorted.
    pub async fn list(&self, trx: &dyn Transaction, path: &[&str]) -> Result<Vec<String>, DirectoryError> {
        validate_path_allow_empty(path)?;
        let owner = self.layer_for_path(path);
        owner.list_at(trx, self.partition_subpath(path, owner)).await
    }

    /// Move this directory to `new_path`, an absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::InvalidOperation`] if `new_path` lies outside
    /// the partition that owns this directory, plus everything
    /// [`DirectoryLayer::move_to`] returns.
    pub async fn move_to(&self, trx: &dyn Transaction, new_path: &[&str]) -> Result<Directory, DirectoryError> {
        validate_path_allow_empty(new_path)?;
        let owner = self.layer_for_path(&[]);
        let base = owner.path();

        let same_partition =
            new_path.len() >= base.len() && base.iter().zip(new_path).all(|(a, b)| a.as_str() == *b);
        if !same_partition {
            return Err(DirectoryError::InvalidOperation {
                reason: "cannot move between partitions".to_string(),
            });
        }

        let old = self.path()[base.len()..].to_vec();
        let new = to_owned_path(&new_path[base.len()..]);
        owner.move_at(trx, old, new).await
    }

    /// Remove a subdirectory, or this directory for an empty path, with all
    /// of its content.
    pub async fn remove(&self, trx: &dyn Transaction, path: &[&str]) -> Result<(), DirectoryError> {
        validate_path_allow_empty(path)?;
        let owner = self.layer_for_path(path);
        owner.remove_at(trx, self.partition_subpath(path, owner), true).await.map(|_| ())
    }

    /// Like [`Directory::remove`], returning `false` when nothing was there.
    pub async fn remove_if_exists(&self, trx: &dyn Transaction, path: &[&str]) -> Result<bool, DirectoryError> {
        validate_path_allow_empty(path)?;
        let owner = self.layer_for_path(path);
        owner.remove_at(trx, self.partition_subpath(path, owner), false).await
    }
}

fn partition_content_error(path: &[String]) -> DirectoryError {
    DirectoryError::InvalidOperation {
        reason: format!("cannot use the content of partition /{} as a subspace", path.join("/")),
    }
}

/// What `create_or_open_at` may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenMode {
    CreateOrOpen,
    Create,
    Open,
}

impl OpenMode {
    fn allow_create(self) -> bool {
        matches!(self, OpenMode::CreateOrOpen | OpenMode::Create)
    }

    fn allow_open(self) -> bool {
        matches!(self, OpenMode::CreateOrOpen | OpenMode::Open)
    }
}
