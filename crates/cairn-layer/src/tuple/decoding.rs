use snafu::ResultExt;
use uuid::Uuid;

use super::BYTES_CODE;
use super::DOUBLE_CODE;
use super::FLOAT_CODE;
use super::INT_ZERO_CODE;
use super::InvalidUtf8Snafu;
use super::MAX_INT_BYTES;
use super::NEG_INT_BIG_CODE;
use super::NESTED_CODE;
use super::NULL_CODE;
use super::POS_INT_BIG_CODE;
use super::STRING_CODE;
use super::TupleError;
use super::UUID_CODE;
use super::UUID64_CODE;
use super::element::Element;
use super::escape::TERMINATOR;
use super::escape::is_escaped_null;
use super::escape::unescape_terminated;
use super::tuple_type::Tuple;

/// How the decoder interprets type code `0x03`.
///
/// Current writers use `0x03` for nested tuples. Some old writers used the
/// same code for a 16-byte UUID; data written by them can only be read with
/// [`DecodeMode::LegacyUuid`], which gives up nested tuples in exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// `0x03` starts a nested tuple.
    #[default]
    Standard,
    /// `0x03` is followed by a 16-byte UUID.
    LegacyUuid,
}

// =============================================================================
// Decoding Functions
// =============================================================================

/// Decode a single element from bytes at the given offset.
///
/// Returns the decoded element and the number of bytes consumed.
pub(super) fn decode_element(data: &[u8], offset: usize, mode: DecodeMode) -> Result<(Element, usize), TupleError> {
    let Some(&code) = data.get(offset) else {
        return Err(TupleError::UnexpectedEnd { offset });
    };

    match code {
        NULL_CODE => Ok((Element::Null, 1)),

        BYTES_CODE => {
            let (bytes, consumed) = unescape_terminated(data, offset + 1)?;
            Ok((Element::Bytes(bytes), consumed + 1))
        }

        STRING_CODE => {
            let (bytes, consumed) = unescape_terminated(data, offset + 1)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| e.utf8_error())
                .context(InvalidUtf8Snafu { offset })?;
            Ok((Element::String(s), consumed + 1))
        }

        NESTED_CODE if mode == DecodeMode::LegacyUuid => {
            let payload = fixed(data, offset, 16)?;
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(payload);
            Ok((Element::Uuid(Uuid::from_bytes(bytes)), 17))
        }

        NESTED_CODE => {
            let (tuple, consumed) = decode_nested_tuple(data, offset + 1, mode)?;
            Ok((Element::Tuple(tuple), consumed + 1))
        }

        NEG_INT_BIG_CODE..=POS_INT_BIG_CODE => {
            let (n, consumed) = decode_int(data, offset)?;
            Ok((Element::Int(n), consumed))
        }

        FLOAT_CODE => {
            let payload = fixed(data, offset, 4)?;
            Ok((Element::Float(decode_float(payload)), 5))
        }

        DOUBLE_CODE => {
            let payload = fixed(data, offset, 8)?;
            Ok((Element::Double(decode_double(payload)), 9))
        }

        UUID_CODE => {
            let payload = fixed(data, offset, 16)?;
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(payload);
            Ok((Element::Uuid(Uuid::from_bytes(bytes)), 17))
        }

        UUID64_CODE => {
            let payload = fixed(data, offset, 8)?;
            Ok((Element::Uuid64(decode_uint_be(payload) as u64), 9))
        }

        _ => Err(TupleError::UnknownTypeCode { code, offset }),
    }
}

/// Slice `len` payload bytes that follow the type code at `offset`.
fn fixed(data: &[u8], offset: usize, len: usize) -> Result<&[u8], TupleError> {
    data.get(offset + 1..offset + 1 + len).ok_or(TupleError::UnexpectedEnd { offset })
}

/// Decode an integer from the FDB encoding.
fn decode_int(data: &[u8], offset: usize) -> Result<(i128, usize), TupleError> {
    let code = data[offset];

    if code == INT_ZERO_CODE {
        return Ok((0, 1));
    }

    let (negative, size, header) = match code {
        POS_INT_BIG_CODE => {
            let len = *data.get(offset + 1).ok_or(TupleError::UnexpectedEnd { offset })?;
            (false, len as usize, 2)
        }
        NEG_INT_BIG_CODE => {
            let len = *data.get(offset + 1).ok_or(TupleError::UnexpectedEnd { offset })?;
            (true, (len ^ 0xFF) as usize, 2)
        }
        c if c > INT_ZERO_CODE => (false, (c - INT_ZERO_CODE) as usize, 1),
        c => (true, (INT_ZERO_CODE - c) as usize, 1),
    };

    if size > MAX_INT_BYTES {
        return Err(TupleError::IntegerOverflow { offset, size });
    }

    let start = offset + header;
    let payload = data.get(start..start + size).ok_or(TupleError::UnexpectedEnd { offset })?;

    if !negative {
        let n = decode_uint_be(payload);
        let n = i128::try_from(n).map_err(|_| TupleError::IntegerOverflow { offset, size })?;
        return Ok((n, header + size));
    }

    // Undo one's complement
    let complement = decode_uint_be(payload);
    let mask = if size == MAX_INT_BYTES {
        u128::MAX
    } else {
        (1u128 << (size * 8)) - 1
    };
    let magnitude = (!complement) & mask;

    let n = if magnitude == i128::MIN.unsigned_abs() {
        i128::MIN
    } else {
        let m = i128::try_from(magnitude).map_err(|_| TupleError::IntegerOverflow { offset, size })?;
        -m
    };

    Ok((n, header + size))
}

/// Decode an unsigned integer from big-endian bytes.
fn decode_uint_be(data: &[u8]) -> u128 {
    data.iter().fold(0u128, |acc, &b| (acc << 8) | u128::from(b))
}

/// Decode a 32-bit float from FDB encoding.
fn decode_float(data: &[u8]) -> f32 {
    let transformed = decode_uint_be(data) as u32;

    let bits = if (transformed & 0x8000_0000) != 0 {
        // Was positive (sign bit is now set from XOR)
        transformed ^ 0x8000_0000
    } else {
        // Was negative (all bits were flipped)
        !transformed
    };

    f32::from_bits(bits)
}

/// Decode a 64-bit double from FDB encoding.
fn decode_double(data: &[u8]) -> f64 {
    let transformed = decode_uint_be(data) as u64;

    let bits = if (transformed & 0x8000_0000_0000_0000) != 0 {
        transformed ^ 0x8000_0000_0000_0000
    } else {
        !transformed
    };

    f64::from_bits(bits)
}

/// Decode the body of a nested tuple, up to and including its terminator.
fn decode_nested_tuple(data: &[u8], start: usize, mode: DecodeMode) -> Result<(Tuple, usize), TupleError> {
    let mut tuple = Tuple::new();
    let mut i = start;

    while i < data.len() {
        if is_escaped_null(data, i) {
            tuple.push_mut(Element::Null);
            i += 2;
        } else if data[i] == TERMINATOR {
            return Ok((tuple, i - start + 1));
        } else {
            let (elem, consumed) = decode_element(data, i, mode)?;
            tuple.push_mut(elem);
            i += consumed;
        }
    }

    Err(TupleError::UnterminatedNested { offset: start })
}
