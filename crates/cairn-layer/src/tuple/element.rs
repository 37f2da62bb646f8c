use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use uuid::Uuid;

use super::TupleError;
use super::convert::FromElement;
use super::tuple_type::Tuple;

// =============================================================================
// Element Type
// =============================================================================

/// A single typed value within a tuple.
///
/// Elements order first by kind, in the same order as their type codes, and
/// then by value. This is exactly the byte order of their packed form, so
/// `a.cmp(&b) == a.pack().cmp(&b.pack())` for any two elements.
///
/// Booleans are stored as the integers `0` and `1`; `Element::from(true)`
/// yields `Element::Int(1)`.
#[derive(Debug, Clone)]
pub enum Element {
    /// Null/None value.
    Null,
    /// Raw byte string.
    Bytes(Vec<u8>),
    /// UTF-8 string.
    String(String),
    /// Nested tuple.
    Tuple(Tuple),
    /// Signed integer.
    Int(i128),
    /// 32-bit IEEE-754 float.
    Float(f32),
    /// 64-bit IEEE-754 float.
    Double(f64),
    /// 128-bit UUID.
    Uuid(Uuid),
    /// 64-bit UUID.
    Uuid64(u64),
}

impl Element {
    /// Short name of the element kind, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Null => "null",
            Element::Bytes(_) => "bytes",
            Element::String(_) => "string",
            Element::Tuple(_) => "tuple",
            Element::Int(_) => "int",
            Element::Float(_) => "float",
            Element::Double(_) => "double",
            Element::Uuid(_) => "uuid",
            Element::Uuid64(_) => "uuid64",
        }
    }

    /// Check if this element is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Element::Null)
    }

    /// Convert to a concrete Rust type, failing with
    /// [`TupleError::TypeMismatch`] if the element cannot represent it.
    pub fn to<T: FromElement>(&self) -> Result<T, TupleError> {
        T::from_element(self)
    }

    /// Borrow the string value, if this is a string element.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Element::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the byte value, if this is a bytes element.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Element::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Integer value, if this is an integer element.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Element::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Rank of the element kind in the cross-type order.
    fn rank(&self) -> u8 {
        match self {
            Element::Null => 0,
            Element::Bytes(_) => 1,
            Element::String(_) => 2,
            Element::Tuple(_) => 3,
            Element::Int(_) => 4,
            Element::Float(_) => 5,
            Element::Double(_) => 6,
            Element::Uuid(_) => 7,
            Element::Uuid64(_) => 8,
        }
    }
}

/// Replace any NaN with the quiet NaN the codec writes.
pub(crate) fn canonical_f32(f: f32) -> f32 {
    if f.is_nan() { f32::from_bits(0x7FC0_0000) } else { f }
}

/// Replace any NaN with the quiet NaN the codec writes.
pub(crate) fn canonical_f64(d: f64) -> f64 {
    if d.is_nan() {
        f64::from_bits(0x7FF8_0000_0000_0000)
    } else {
        d
    }
}

// =============================================================================
// Ordering and Equality
// =============================================================================

impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Element::Null, Element::Null) => Ordering::Equal,
            (Element::Bytes(a), Element::Bytes(b)) => a.cmp(b),
            (Element::String(a), Element::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Element::Tuple(a), Element::Tuple(b)) => a.cmp(b),
            (Element::Int(a), Element::Int(b)) => a.cmp(b),
            (Element::Float(a), Element::Float(b)) => canonical_f32(*a).total_cmp(&canonical_f32(*b)),
            (Element::Double(a), Element::Double(b)) => canonical_f64(*a).total_cmp(&canonical_f64(*b)),
            (Element::Uuid(a), Element::Uuid(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Element::Uuid64(a), Element::Uuid64(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Element::Null => {}
            Element::Bytes(b) => b.hash(state),
            Element::String(s) => s.hash(state),
            Element::Tuple(t) => t.hash(state),
            Element::Int(n) => n.hash(state),
            Element::Float(f) => canonical_f32(*f).to_bits().hash(state),
            Element::Double(d) => canonical_f64(*d).to_bits().hash(state),
            Element::Uuid(u) => u.hash(state),
            Element::Uuid64(u) => u.hash(state),
        }
    }
}

// =============================================================================
// Conversions into Element
// =============================================================================

impl From<()> for Element {
    fn from(_: ()) -> Self {
        Element::Null
    }
}

impl From<Vec<u8>> for Element {
    fn from(v: Vec<u8>) -> Self {
        Element::Bytes(v)
    }
}

impl From<&[u8]> for Element {
    fn from(v: &[u8]) -> Self {
        Element::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Element {
    fn from(v: &[u8; N]) -> Self {
        Element::Bytes(v.to_vec())
    }
}

impl From<String> for Element {
    fn from(s: String) -> Self {
        Element::String(s)
    }
}

impl From<&str> for Element {
    fn from(s: &str) -> Self {
        Element::String(s.to_string())
    }
}

impl From<&String> for Element {
    fn from(s: &String) -> Self {
        Element::String(s.clone())
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Element {
                fn from(n: $t) -> Self {
                    Element::Int(i128::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<bool> for Element {
    fn from(b: bool) -> Self {
        Element::Int(i128::from(b))
    }
}

impl From<f32> for Element {
    fn from(f: f32) -> Self {
        Element::Float(f)
    }
}

impl From<f64> for Element {
    fn from(d: f64) -> Self {
        Element::Double(d)
    }
}

impl From<Uuid> for Element {
    fn from(u: Uuid) -> Self {
        Element::Uuid(u)
    }
}

impl From<Tuple> for Element {
    fn from(t: Tuple) -> Self {
        Element::Tuple(t)
    }
}

impl<T: Into<Element>> From<Option<T>> for Element {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Element::Null,
        }
    }
}

// =============================================================================
// Display
// =============================================================================

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Null => write!(f, "null"),
            Element::Bytes(b) => {
                write!(f, "b\"")?;
                for &byte in b {
                    if (byte.is_ascii_graphic() && byte != b'"' && byte != b'\\') || byte == b' ' {
                        write!(f, "{}", byte as char)?;
                    } else {
                        write!(f, "\\x{byte:02x}")?;
                    }
                }
                write!(f, "\"")
            }
            Element::String(s) => write!(f, "{s:?}"),
            Element::Tuple(t) => write!(f, "{t}"),
            Element::Int(n) => write!(f, "{n}"),
            Element::Float(x) => write!(f, "{x}f32"),
            Element::Double(x) => write!(f, "{x}"),
            Element::Uuid(u) => write!(f, "{u}"),
            Element::Uuid64(u) => write!(f, "uuid64:{u:016x}"),
        }
    }
}
