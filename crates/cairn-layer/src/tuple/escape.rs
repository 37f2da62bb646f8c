//! Null-byte escaping for terminated payloads.
//!
//! Byte strings, unicode strings and nested tuples are framed by a trailing
//! `0x00`. To keep that terminator unambiguous every `0x00` inside the payload
//! is written as `0x00 0xFF`. Because `0xFF` is greater than every type code,
//! the escaped form still sorts after a terminator followed by any further
//! element, so ordering survives the transform.
//!
//! The functions here operate on raw payload bytes only; type codes and the
//! terminator are written by the caller.

use super::NULL_ESCAPE;
use super::TupleError;

/// Terminator byte that ends an escaped payload.
pub const TERMINATOR: u8 = 0x00;

/// Append `payload` to `buf`, replacing every `0x00` with `0x00 0xFF`.
pub fn escape_into(payload: &[u8], buf: &mut Vec<u8>) {
    buf.reserve(payload.len());
    for &b in payload {
        buf.push(b);
        if b == TERMINATOR {
            buf.push(NULL_ESCAPE);
        }
    }
}

/// Return the escaped form of `payload` without a terminator.
#[cfg(test)]
fn escape(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(payload.len());
    escape_into(payload, &mut buf);
    buf
}

/// Read an escaped payload starting at `start` up to its terminator.
///
/// Returns the unescaped bytes and the number of input bytes consumed,
/// including the terminator.
pub fn unescape_terminated(data: &[u8], start: usize) -> Result<(Vec<u8>, usize), TupleError> {
    let mut result = Vec::new();
    let mut i = start;

    while i < data.len() {
        let b = data[i];

        if b == TERMINATOR {
            if data.get(i + 1) == Some(&NULL_ESCAPE) {
                result.push(TERMINATOR);
                i += 2;
            } else {
                return Ok((result, i - start + 1));
            }
        } else {
            result.push(b);
            i += 1;
        }
    }

    Err(TupleError::MissingTerminator { offset: start })
}

/// True when the escaped sequence `0x00 0xFF` starts at `index`.
pub(crate) fn is_escaped_null(data: &[u8], index: usize) -> bool {
    data.get(index) == Some(&TERMINATOR) && data.get(index + 1) == Some(&NULL_ESCAPE)
}
