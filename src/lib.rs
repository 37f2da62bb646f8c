//! cairn: order-preserving tuple keys and a FoundationDB-compatible directory
//! layer.
//!
//! This crate re-exports the workspace crates so applications depend on one
//! name:
//!
//! - [`layer`]: tuple encoding and subspaces
//! - [`kv`]: the transaction boundary, an in-memory store and the retry runner
//! - [`directory`]: the high-contention allocator and the directory layer
//!
//! # Example
//!
//! ```
//! use cairn::prelude::*;
//!
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! # block_on(async {
//! let db = MemoryDatabase::new();
//! let dir = DirectoryLayer::new();
//!
//! let repos = run(&db, &RetryConfig::default(), |tr| {
//!     let dir = &dir;
//!     async move { dir.create_or_open(&*tr, &["apps", "forge", "repos"], None).await }
//! })
//! .await
//! .unwrap();
//!
//! let key = repos.pack(&Tuple::new().push("repo-1").push("metadata")).unwrap();
//! assert!(repos.contains(&key).unwrap());
//! # });
//! ```

pub use cairn_directory as directory;
pub use cairn_kv as kv;
pub use cairn_layer as layer;

/// The types most applications need.
pub mod prelude {
    pub use cairn_directory::CairnConfig;
    pub use cairn_directory::Directory;
    pub use cairn_directory::DirectoryError;
    pub use cairn_directory::DirectoryLayer;
    pub use cairn_directory::HighContentionAllocator;
    pub use cairn_kv::Database;
    pub use cairn_kv::KvError;
    pub use cairn_kv::MemoryDatabase;
    pub use cairn_kv::RetryConfig;
    pub use cairn_kv::Retryable;
    pub use cairn_kv::Transaction;
    pub use cairn_kv::run;
    pub use cairn_layer::Element;
    pub use cairn_layer::Subspace;
    pub use cairn_layer::Tuple;
}
