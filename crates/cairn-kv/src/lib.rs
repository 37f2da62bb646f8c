//! Transactional key-value boundary for cairn.
//!
//! The tuple, allocator and directory layers never touch storage directly.
//! They run their logic inside a caller-supplied [`Transaction`], which
//! provides the FoundationDB-style primitives they need:
//!
//! - conflicting and snapshot reads, point and range
//! - buffered writes, with or without write conflict ranges
//! - little-endian atomic add
//! - explicit write conflict keys
//!
//! [`MemoryDatabase`] is an in-process implementation with optimistic
//! multi-version concurrency control. [`run`] is the retry loop callers wrap
//! their transactional work in.

pub mod config;
pub mod constants;
mod error;
pub mod memory;
mod range;
mod retry;
mod transaction;

pub use config::RetryConfig;
pub use config::RetryConfigError;
pub use error::KvError;
pub use error::Retryable;
pub use memory::MemoryDatabase;
pub use memory::MemoryTransaction;
pub use range::KeyRange;
pub use range::KeyValue;
pub use range::RangeOptions;
pub use retry::run;
pub use transaction::Database;
pub use transaction::Transaction;
