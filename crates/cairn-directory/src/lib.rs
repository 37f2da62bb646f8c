//! Directory layer and high-contention allocator for cairn.
//!
//! The [`DirectoryLayer`] maps human-readable paths such as
//! `["apps", "forge", "repos"]` to short allocated key prefixes. Prefixes come
//! from a [`HighContentionAllocator`], which hands out unique integers from
//! inside ordinary transactions with few conflicts between concurrent
//! allocators.
//!
//! Both run entirely inside a caller-supplied [`cairn_kv::Transaction`] and
//! store their state in the FoundationDB layout, so data written here is
//! readable by other FoundationDB directory layer implementations.

pub mod allocator;
pub mod config;
pub mod constants;
pub mod directory;

pub use allocator::AllocationError;
pub use allocator::HighContentionAllocator;
pub use config::CairnConfig;
pub use config::ConfigError;
pub use config::DirectoryConfig;
pub use directory::Directory;
pub use directory::DirectoryError;
pub use directory::DirectoryLayer;
pub use directory::DirectoryPartition;
pub use directory::DirectorySubspace;
