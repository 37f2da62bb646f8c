//! Order-preserving key encoding for cairn.
//!
//! This crate provides the two pure building blocks every other cairn layer
//! sits on:
//!
//! - **Tuple encoding**: order-preserving serialization of composite keys
//! - **Subspaces**: prefix-scoped key construction and range helpers
//!
//! # Architecture
//!
//! ```text
//! Application Layer (directories, indexes, ...)
//!          ↓
//! ┌─────────────────────────────────────┐
//! │         Subspace Layer              │  Namespace isolation
//! │  ┌─────────────────────────────┐   │
//! │  │       Tuple Layer           │   │  Ordered key encoding
//! │  └─────────────────────────────┘   │
//! └─────────────────────────────────────┘
//!          ↓
//!    Transactional KV store
//! ```
//!
//! # FoundationDB Compatibility
//!
//! The tuple encoding follows the [FoundationDB Tuple Layer specification](
//! https://github.com/apple/foundationdb/blob/main/design/tuple.md), so keys
//! written here can be read by other FoundationDB bindings and vice versa.
//!
//! # Example
//!
//! ```
//! use cairn_layer::{Subspace, Tuple};
//!
//! let users = Subspace::new(&Tuple::new().push("users"));
//! let key = users.pack(&Tuple::new().push("alice").push("profile"));
//!
//! let (start, end) = users.subspace(&Tuple::new().push("alice")).range();
//! assert!(key >= start && key < end);
//! ```

pub mod subspace;
pub mod tuple;

#[cfg(test)]
mod proptest;

pub use subspace::Subspace;
pub use subspace::SubspaceError;
pub use tuple::DecodeMode;
pub use tuple::Element;
pub use tuple::FromElement;
pub use tuple::Tuple;
pub use tuple::TupleError;
pub use tuple::strinc;
