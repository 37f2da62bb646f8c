use super::BYTES_CODE;
use super::DOUBLE_CODE;
use super::FLOAT_CODE;
use super::INT_ZERO_CODE;
use super::NEG_INT_BIG_CODE;
use super::NESTED_CODE;
use super::NULL_CODE;
use super::NULL_ESCAPE;
use super::POS_INT_BIG_CODE;
use super::STRING_CODE;
use super::UUID_CODE;
use super::UUID64_CODE;
use super::element::Element;
use super::element::canonical_f32;
use super::element::canonical_f64;
use super::escape::TERMINATOR;
use super::escape::escape_into;

// =============================================================================
// Encoding Functions
// =============================================================================

impl Element {
    /// Pack this element into a byte buffer as a top-level element.
    pub fn pack_into(&self, buf: &mut Vec<u8>) {
        self.encode_into(buf, false);
    }

    /// Pack this element on its own.
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.pack_into(&mut buf);
        buf
    }

    /// Encode, escaping nulls when written inside a nested tuple.
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>, nested: bool) {
        match self {
            Element::Null => {
                buf.push(NULL_CODE);
                if nested {
                    buf.push(NULL_ESCAPE);
                }
            }

            Element::Bytes(b) => {
                buf.push(BYTES_CODE);
                escape_into(b, buf);
                buf.push(TERMINATOR);
            }

            Element::String(s) => {
                buf.push(STRING_CODE);
                escape_into(s.as_bytes(), buf);
                buf.push(TERMINATOR);
            }

            Element::Tuple(t) => {
                buf.push(NESTED_CODE);
                for elem in t.iter() {
                    elem.encode_into(buf, true);
                }
                buf.push(TERMINATOR);
            }

            Element::Int(n) => encode_int(*n, buf),

            Element::Float(f) => {
                buf.push(FLOAT_CODE);
                buf.extend_from_slice(&encode_float(*f));
            }

            Element::Double(d) => {
                buf.push(DOUBLE_CODE);
                buf.extend_from_slice(&encode_double(*d));
            }

            Element::Uuid(u) => {
                buf.push(UUID_CODE);
                buf.extend_from_slice(u.as_bytes());
            }

            Element::Uuid64(u) => {
                buf.push(UUID64_CODE);
                buf.extend_from_slice(&u.to_be_bytes());
            }
        }
    }
}

/// Encode an integer using the FDB integer encoding.
///
/// Magnitudes of up to 8 bytes use the single-byte size codes `0x0C..=0x1C`.
/// Wider magnitudes use `0x1D` / `0x0B` followed by a length byte (inverted
/// for negatives so longer negatives sort first).
fn encode_int(n: i128, buf: &mut Vec<u8>) {
    if n == 0 {
        buf.push(INT_ZERO_CODE);
        return;
    }

    let magnitude = n.unsigned_abs();
    let size = byte_len(magnitude);
    let be = magnitude.to_be_bytes();
    let significant = &be[be.len() - size..];

    if n > 0 {
        if size <= 8 {
            buf.push(INT_ZERO_CODE + size as u8);
        } else {
            buf.push(POS_INT_BIG_CODE);
            buf.push(size as u8);
        }
        buf.extend_from_slice(significant);
    } else {
        if size <= 8 {
            buf.push(INT_ZERO_CODE - size as u8);
        } else {
            buf.push(NEG_INT_BIG_CODE);
            buf.push(size as u8 ^ 0xFF);
        }
        // One's complement so larger magnitudes sort first
        buf.extend(significant.iter().map(|b| !b));
    }
}

/// Number of bytes needed to hold `n` (at least 1 for non-zero values).
fn byte_len(n: u128) -> usize {
    let bits = 128 - n.leading_zeros() as usize;
    bits.div_ceil(8)
}

/// Encode a 32-bit float for lexicographic ordering.
///
/// NaN is canonicalized first. Non-negative values have the sign bit flipped;
/// negative values have every bit inverted.
pub(crate) fn encode_float(f: f32) -> [u8; 4] {
    let bits = canonical_f32(f).to_bits();
    let transformed = if (bits & 0x8000_0000) != 0 {
        !bits
    } else {
        bits ^ 0x8000_0000
    };
    transformed.to_be_bytes()
}

/// Encode a 64-bit double for lexicographic ordering.
pub(crate) fn encode_double(d: f64) -> [u8; 8] {
    let bits = canonical_f64(d).to_bits();
    let transformed = if (bits & 0x8000_0000_0000_0000) != 0 {
        !bits
    } else {
        bits ^ 0x8000_0000_0000_0000
    };
    transformed.to_be_bytes()
}
