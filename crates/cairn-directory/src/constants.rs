//! Limits and persisted-layout constants for the allocator and directory layer.
//!
//! The layout constants must match other FoundationDB directory layer
//! implementations byte for byte; changing them orphans existing data.

// =============================================================================
// High-Contention Allocator
// =============================================================================

/// Window size while the window start is below [`HCA_MEDIUM_WINDOW_THRESHOLD`].
pub const HCA_INITIAL_WINDOW_SIZE: i64 = 64;

/// Window start below which [`HCA_INITIAL_WINDOW_SIZE`] applies.
pub const HCA_MEDIUM_WINDOW_THRESHOLD: i64 = 255;

/// Window size while the window start is below [`HCA_LARGE_WINDOW_THRESHOLD`].
pub const HCA_MEDIUM_WINDOW_SIZE: i64 = 1024;

/// Window start below which [`HCA_MEDIUM_WINDOW_SIZE`] applies.
pub const HCA_LARGE_WINDOW_THRESHOLD: i64 = 65535;

/// Window size for all larger window starts.
pub const HCA_MAX_WINDOW_SIZE: i64 = 8192;

/// Random candidates tried in one window before the window is re-derived.
pub const HCA_MAX_CANDIDATE_PROBES: u32 = 1024;

/// Window derivations attempted by one allocation before giving up.
pub const HCA_MAX_WINDOW_ROUNDS: u32 = 64;

/// Tuple element selecting the allocator's `counters` subspace.
pub const HCA_COUNTERS_KEY: i64 = 0;

/// Tuple element selecting the allocator's `recent` subspace.
pub const HCA_RECENT_KEY: i64 = 1;

// =============================================================================
// Directory layout
// =============================================================================

/// Default node subspace prefix.
pub const DEFAULT_NODE_PREFIX: u8 = 0xFE;

/// Byte appended to a partition's prefix to form its node subspace.
pub const PARTITION_NODE_SUFFIX: u8 = 0xFE;

/// Layer id marking a directory as a partition.
pub const PARTITION_LAYER: &[u8] = b"partition";

/// Tuple element under a node that holds its child links.
pub const SUBDIRS_KEY: i64 = 0;

/// Byte-string key under a node holding its layer id.
pub const LAYER_KEY: &[u8] = b"layer";

/// Byte-string key under the root node holding the layout version.
pub const VERSION_KEY: &[u8] = b"version";

/// Byte-string key under the root node holding the allocator subspace.
pub const HCA_KEY: &[u8] = b"hca";

/// Layout version written by this implementation: (major, minor, micro).
pub const LAYER_VERSION: (u32, u32, u32) = (1, 0, 0);

// =============================================================================
// Path limits
// =============================================================================

/// Maximum number of components in a directory path.
pub const MAX_DIRECTORY_DEPTH: u32 = 256;

/// Maximum length of a single path component in bytes.
pub const MAX_PATH_COMPONENT_LENGTH_BYTES: u32 = 1024;

/// Maximum number of names returned by one `list` call.
pub const MAX_LIST_RESULTS: usize = 10_000;
