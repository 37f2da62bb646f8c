use std::fmt;

use super::TupleError;
use super::convert::FromElement;
use super::decoding::DecodeMode;
use super::decoding::decode_element;
use super::element::Element;

// =============================================================================
// Tuple Type
// =============================================================================

/// An ordered collection of typed elements that can be packed into bytes.
///
/// Tuples are the fundamental building block for structured keys. When packed,
/// they produce bytes that sort lexicographically in the same order as the
/// original tuple elements, so the derived `Ord` agrees with `pack()`.
///
/// # Example
///
/// ```
/// use cairn_layer::Tuple;
///
/// let t1 = Tuple::new().push("users").push(1i64);
/// let t2 = Tuple::new().push("users").push(2i64);
///
/// assert!(t1 < t2);
/// assert!(t1.pack() < t2.pack());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tuple {
    elements: Vec<Element>,
}

impl Tuple {
    /// Create a new empty tuple.
    pub fn new() -> Self {
        Self { elements: Vec::new() }
    }

    /// Create a tuple with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
        }
    }

    /// Push an element onto the tuple (builder pattern).
    pub fn push<E: Into<Element>>(mut self, element: E) -> Self {
        self.elements.push(element.into());
        self
    }

    /// Push an element onto the tuple (mutating).
    pub fn push_mut<E: Into<Element>>(&mut self, element: E) {
        self.elements.push(element.into());
    }

    /// Get the number of elements in the tuple.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the tuple is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get an element by index.
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Read the element at `index` as `T`.
    ///
    /// Fails with [`TupleError::IndexOutOfRange`] past the end and
    /// [`TupleError::TypeMismatch`] when the element cannot become a `T`.
    pub fn get_as<T: FromElement>(&self, index: usize) -> Result<T, TupleError> {
        let element = self.elements.get(index).ok_or(TupleError::IndexOutOfRange {
            index,
            len: self.elements.len(),
        })?;
        T::from_element(element)
    }

    /// Get an iterator over the elements.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Borrow the elements as a slice.
    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    /// Concatenate two tuples.
    pub fn concat(mut self, other: &Tuple) -> Self {
        self.elements.extend(other.elements.iter().cloned());
        self
    }

    /// Pack the tuple into bytes.
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.elements.len() * 8);
        self.pack_into(&mut buf);
        buf
    }

    /// Pack the tuple into an existing buffer.
    pub fn pack_into(&self, buf: &mut Vec<u8>) {
        for elem in &self.elements {
            elem.encode_into(buf, false);
        }
    }

    /// Unpack a tuple from bytes in the standard decode mode.
    pub fn unpack(data: &[u8]) -> Result<Self, TupleError> {
        Self::unpack_with(data, DecodeMode::Standard)
    }

    /// Unpack a tuple from bytes using an explicit decode mode.
    pub fn unpack_with(data: &[u8], mode: DecodeMode) -> Result<Self, TupleError> {
        let (tuple, _) = Self::unpack_from(data, 0, mode)?;
        Ok(tuple)
    }

    /// Unpack a tuple from bytes, returning how many bytes were consumed.
    pub fn unpack_partial(data: &[u8]) -> Result<(Self, usize), TupleError> {
        Self::unpack_from(data, 0, DecodeMode::Standard)
    }

    fn unpack_from(data: &[u8], start: usize, mode: DecodeMode) -> Result<(Self, usize), TupleError> {
        let mut tuple = Tuple::new();
        let mut offset = start;

        while offset < data.len() {
            let (elem, consumed) = decode_element(data, offset, mode)?;
            tuple.elements.push(elem);
            offset += consumed;
        }

        Ok((tuple, offset - start))
    }

    /// Key range of every tuple that strictly extends this one.
    ///
    /// Returns `(pack() ++ 0x00, pack() ++ 0xFF)`. The packed tuple itself is
    /// not inside the range.
    pub fn range(&self) -> (Vec<u8>, Vec<u8>) {
        let packed = self.pack();
        let mut start = packed.clone();
        start.push(0x00);
        let mut end = packed;
        end.push(0xFF);
        (start, end)
    }

    /// Smallest key greater than every key prefixed by the packed tuple.
    ///
    /// Returns `None` when the packed form is empty or all `0xFF`.
    pub fn strinc(&self) -> Option<Vec<u8>> {
        strinc(&self.pack())
    }
}

/// Increment a byte string to get a strict upper bound (FDB strinc).
///
/// Trailing `0xFF` bytes are dropped and the last remaining byte is
/// incremented. Returns `None` if no byte can be incremented.
pub fn strinc(key: &[u8]) -> Option<Vec<u8>> {
    let last = key.iter().rposition(|&b| b != 0xFF)?;
    let mut out = key[..=last].to_vec();
    out[last] += 1;
    Some(out)
}

// =============================================================================
// Conversions
// =============================================================================

impl FromIterator<Element> for Tuple {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Tuple {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl From<Vec<Element>> for Tuple {
    fn from(elements: Vec<Element>) -> Self {
        Self { elements }
    }
}

macro_rules! impl_from_rust_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Element>),+> From<($($name,)+)> for Tuple {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Self {
                Self {
                    elements: vec![$($name.into()),+],
                }
            }
        }
    };
}

impl_from_rust_tuple!(A);
impl_from_rust_tuple!(A, B);
impl_from_rust_tuple!(A, B, C);
impl_from_rust_tuple!(A, B, C, D);
impl_from_rust_tuple!(A, B, C, D, E);
impl_from_rust_tuple!(A, B, C, D, E, F);

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, elem) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{elem}")?;
        }
        if self.elements.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}
