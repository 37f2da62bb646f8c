//! FoundationDB-compatible tuple encoding layer.
//!
//! This module provides order-preserving serialization of composite keys following
//! the [FoundationDB Tuple Layer specification](
//! https://github.com/apple/foundationdb/blob/main/design/tuple.md).
//!
//! # Design Goals
//!
//! 1. **Lexicographic ordering**: Packed bytes sort in the same order as the original tuple
//!    elements, enabling efficient range scans.
//!
//! 2. **Type-tagged encoding**: Each element is prefixed with a type code, allowing heterogeneous
//!    tuples and unambiguous decoding.
//!
//! 3. **Null-safe**: Embedded null bytes are escaped to preserve ordering.
//!
//! 4. **Pure**: Encoding is a function of the element values only. NaN payloads are
//!    canonicalized so every NaN packs to the same bytes.
//!
//! # Type Codes
//!
//! | Code | Type | Description |
//! |------|------|-------------|
//! | 0x00 | Null | Null/None value (`0x00 0xFF` inside a nested tuple) |
//! | 0x01 | Bytes | Byte string with null escaping |
//! | 0x02 | String | UTF-8 string with null escaping |
//! | 0x03 | Nested | Nested tuple, terminated by `0x00` |
//! | 0x0B | NegIntBig | Negative integer longer than 8 bytes |
//! | 0x0C-0x13 | NegInt | Negative integers (size = 0x14 - code) |
//! | 0x14 | IntZero | Integer zero (also `false`) |
//! | 0x15-0x1C | PosInt | Positive integers (size = code - 0x14) |
//! | 0x1D | PosIntBig | Positive integer longer than 8 bytes |
//! | 0x20 | Float | IEEE-754 single precision |
//! | 0x21 | Double | IEEE-754 double precision |
//! | 0x30 | Uuid | 128-bit UUID, RFC-4122 byte order |
//! | 0x31 | Uuid64 | 64-bit UUID, big-endian |
//!
//! Booleans have no code of their own: they are written as the integers 0 and 1.
//!
//! # Integer Encoding
//!
//! - Zero: Single byte 0x14
//! - Positive: 0x14 + size_in_bytes, then big-endian bytes
//! - Negative: 0x14 - size_in_bytes, then one's complement big-endian
//!
//! This ensures: INT_MIN < -1 < 0 < 1 < INT_MAX in lexicographic order.
//!
//! # Example
//!
//! ```
//! use cairn_layer::Tuple;
//!
//! let tuple = Tuple::new()
//!     .push("users")
//!     .push(42i64)
//!     .push("profile");
//!
//! let packed = tuple.pack();
//! let unpacked = Tuple::unpack(&packed).unwrap();
//!
//! assert_eq!(tuple, unpacked);
//! ```

mod convert;
mod decoding;
mod element;
mod encoding;
pub mod escape;
mod tuple_type;

#[cfg(test)]
mod tests;

pub use convert::FromElement;
pub use decoding::DecodeMode;
pub use element::Element;
use snafu::Snafu;
pub use tuple_type::Tuple;
pub use tuple_type::strinc;

// =============================================================================
// Type Codes
// =============================================================================

/// Null value type code.
pub(crate) const NULL_CODE: u8 = 0x00;

/// Byte string type code.
pub(crate) const BYTES_CODE: u8 = 0x01;

/// UTF-8 string type code.
pub(crate) const STRING_CODE: u8 = 0x02;

/// Nested tuple start type code. Shared with the legacy UUID code on decode.
pub(crate) const NESTED_CODE: u8 = 0x03;

/// Negative integer with a length byte (magnitude wider than 8 bytes).
pub(crate) const NEG_INT_BIG_CODE: u8 = 0x0B;

/// Integer zero type code (pivot point for integer encoding).
pub(crate) const INT_ZERO_CODE: u8 = 0x14;

/// Positive integer with a length byte (magnitude wider than 8 bytes).
pub(crate) const POS_INT_BIG_CODE: u8 = 0x1D;

/// 32-bit float type code.
pub(crate) const FLOAT_CODE: u8 = 0x20;

/// 64-bit double type code.
pub(crate) const DOUBLE_CODE: u8 = 0x21;

/// 128-bit UUID type code.
pub(crate) const UUID_CODE: u8 = 0x30;

/// 64-bit UUID type code.
pub(crate) const UUID64_CODE: u8 = 0x31;

/// Escape byte that follows an embedded 0x00.
pub(crate) const NULL_ESCAPE: u8 = 0xFF;

/// Widest integer magnitude the codec accepts, in bytes.
pub(crate) const MAX_INT_BYTES: usize = 16;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during tuple decoding and typed element access.
///
/// Every variant except [`TupleError::TypeMismatch`] means the input bytes are
/// not a valid encoding. None of them are retryable.
#[derive(Debug, Snafu)]
pub enum TupleError {
    /// Unexpected end of input while decoding.
    #[snafu(display("malformed encoding: unexpected end of input at offset {offset}"))]
    UnexpectedEnd {
        /// Byte offset where the error occurred.
        offset: usize,
    },

    /// Unknown type code encountered.
    #[snafu(display("malformed encoding: unknown type code 0x{code:02X} at offset {offset}"))]
    UnknownTypeCode {
        /// The unknown type code.
        code: u8,
        /// Byte offset where the error occurred.
        offset: usize,
    },

    /// Invalid UTF-8 string data.
    #[snafu(display("malformed encoding: invalid UTF-8 at offset {offset}: {source}"))]
    InvalidUtf8 {
        /// Byte offset where the error occurred.
        offset: usize,
        /// The underlying UTF-8 error.
        source: std::str::Utf8Error,
    },

    /// Missing null terminator for byte/string element.
    #[snafu(display("malformed encoding: missing null terminator at offset {offset}"))]
    MissingTerminator {
        /// Byte offset where the error occurred.
        offset: usize,
    },

    /// Integer wider than the codec supports.
    #[snafu(display("malformed encoding: integer of {size} bytes at offset {offset} exceeds the 16-byte limit"))]
    IntegerOverflow {
        /// Byte offset where the error occurred.
        offset: usize,
        /// Declared magnitude width.
        size: usize,
    },

    /// Nested tuple not properly terminated.
    #[snafu(display("malformed encoding: unterminated nested tuple at offset {offset}"))]
    UnterminatedNested {
        /// Byte offset where the error occurred.
        offset: usize,
    },

    /// A decoded element could not be converted to the requested type.
    #[snafu(display("type mismatch: cannot read {found} as {expected}"))]
    TypeMismatch {
        /// Name of the requested type.
        expected: &'static str,
        /// Kind of the element that was found.
        found: &'static str,
    },

    /// Tuple index out of range for a typed access.
    #[snafu(display("tuple has {len} elements, no element at index {index}"))]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Tuple length.
        len: usize,
    },
}

impl TupleError {
    /// True when the error describes corrupt or truncated bytes rather than a
    /// caller-side type request.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, TupleError::TypeMismatch { .. } | TupleError::IndexOutOfRange { .. })
    }
}
