//! Checked conversions from decoded elements into Rust types.

use uuid::Uuid;

use super::TupleError;
use super::element::Element;
use super::tuple_type::Tuple;

/// A Rust type that can be read out of a decoded [`Element`].
///
/// Decoded tuples are dynamically typed; implementations fail with
/// [`TupleError::TypeMismatch`] when the element cannot represent the target
/// type exactly.
pub trait FromElement: Sized {
    /// Name used in type-mismatch errors.
    const TYPE_NAME: &'static str;

    /// Convert a borrowed element.
    fn from_element(element: &Element) -> Result<Self, TupleError>;
}

fn mismatch<T: FromElement>(element: &Element) -> TupleError {
    TupleError::TypeMismatch {
        expected: T::TYPE_NAME,
        found: element.kind(),
    }
}

/// Integer view of an element. Numeric text is accepted.
fn integer_of(element: &Element) -> Option<i128> {
    match element {
        Element::Int(n) => Some(*n),
        Element::String(s) => s.parse::<i128>().ok(),
        _ => None,
    }
}

macro_rules! impl_from_element_int {
    ($($t:ty),*) => {
        $(
            impl FromElement for $t {
                const TYPE_NAME: &'static str = stringify!($t);

                fn from_element(element: &Element) -> Result<Self, TupleError> {
                    integer_of(element)
                        .and_then(|n| <$t>::try_from(n).ok())
                        .ok_or_else(|| mismatch::<$t>(element))
                }
            }
        )*
    };
}

impl_from_element_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl FromElement for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Int(0) => Ok(false),
            Element::Int(1) => Ok(true),
            _ => Err(mismatch::<bool>(element)),
        }
    }
}

impl FromElement for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Float(f) => Ok(*f),
            _ => Err(mismatch::<f32>(element)),
        }
    }
}

impl FromElement for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Double(d) => Ok(*d),
            Element::Float(f) => Ok(f64::from(*f)),
            _ => Err(mismatch::<f64>(element)),
        }
    }
}

impl FromElement for String {
    const TYPE_NAME: &'static str = "string";

    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::String(s) => Ok(s.clone()),
            _ => Err(mismatch::<String>(element)),
        }
    }
}

impl FromElement for Vec<u8> {
    const TYPE_NAME: &'static str = "bytes";

    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Bytes(b) => Ok(b.clone()),
            _ => Err(mismatch::<Vec<u8>>(element)),
        }
    }
}

impl FromElement for Uuid {
    const TYPE_NAME: &'static str = "uuid";

    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Uuid(u) => Ok(*u),
            _ => Err(mismatch::<Uuid>(element)),
        }
    }
}

impl FromElement for Tuple {
    const TYPE_NAME: &'static str = "tuple";

    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Tuple(t) => Ok(t.clone()),
            _ => Err(mismatch::<Tuple>(element)),
        }
    }
}

impl FromElement for Element {
    const TYPE_NAME: &'static str = "element";

    fn from_element(element: &Element) -> Result<Self, TupleError> {
        Ok(element.clone())
    }
}

impl<T: FromElement> FromElement for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_element(element: &Element) -> Result<Self, TupleError> {
        match element {
            Element::Null => Ok(None),
            other => T::from_element(other).map(Some),
        }
    }
}
