use uuid::Uuid;

use super::*;

fn roundtrip(t: &Tuple) -> Tuple {
    Tuple::unpack(&t.pack()).unwrap()
}

#[test]
fn test_empty_tuple() {
    let t = Tuple::new();
    assert!(t.is_empty());
    assert_eq!(t.len(), 0);

    let packed = t.pack();
    assert!(packed.is_empty());
    assert_eq!(Tuple::unpack(&packed).unwrap(), t);
}

#[test]
fn test_null_element() {
    let t = Tuple::new().push(());
    assert_eq!(t.pack(), vec![NULL_CODE]);
    assert_eq!(roundtrip(&t).get(0), Some(&Element::Null));
}

#[test]
fn test_string_element() {
    let t = Tuple::new().push("hello");
    let packed = t.pack();

    assert_eq!(packed[0], STRING_CODE);
    assert_eq!(&packed[1..6], b"hello");
    assert_eq!(packed[6], 0x00);
    assert_eq!(roundtrip(&t), t);
}

#[test]
fn test_string_with_null_byte_is_escaped() {
    let t = Tuple::new().push("A\x00B");
    assert_eq!(t.pack(), vec![0x02, 0x41, 0x00, 0xFF, 0x42, 0x00]);
    assert_eq!(roundtrip(&t), t);
}

#[test]
fn test_bytes_element() {
    let t = Tuple::new().push(vec![1u8, 0, 3]);
    assert_eq!(t.pack(), vec![BYTES_CODE, 1, 0x00, 0xFF, 3, 0x00]);
    assert_eq!(roundtrip(&t).get(0), Some(&Element::Bytes(vec![1, 0, 3])));
}

#[test]
fn test_integer_literals() {
    assert_eq!(Tuple::new().push(0i64).pack(), vec![0x14]);
    assert_eq!(Tuple::new().push(-1i64).pack(), vec![0x13, 0xFE]);
    assert_eq!(Tuple::new().push(255i64).pack(), vec![0x15, 0xFF]);
    assert_eq!(Tuple::new().push(256i64).pack(), vec![0x16, 0x01, 0x00]);
}

#[test]
fn test_integer_extremes_roundtrip() {
    for n in [i128::MIN, i128::MIN + 1, i64::MIN as i128, -1, 0, 1, u64::MAX as i128, i128::MAX] {
        let t = Tuple::new().push(n);
        assert_eq!(roundtrip(&t).get_as::<i128>(0).unwrap(), n, "roundtrip of {n}");
    }
}

#[test]
fn test_integer_ordering() {
    let values: Vec<i128> = vec![
        i128::MIN,
        -(1i128 << 80),
        -(u64::MAX as i128) - 1,
        -(u64::MAX as i128),
        i64::MIN as i128,
        -256,
        -255,
        -1,
        0,
        1,
        255,
        256,
        i64::MAX as i128,
        u64::MAX as i128,
        u64::MAX as i128 + 1,
        1i128 << 80,
        i128::MAX,
    ];
    let packed: Vec<Vec<u8>> = values.iter().map(|&n| Tuple::new().push(n).pack()).collect();
    for i in 1..packed.len() {
        assert!(packed[i - 1] < packed[i], "{} should sort before {}", values[i - 1], values[i]);
    }
}

#[test]
fn test_bool_is_stored_as_int() {
    assert_eq!(Tuple::new().push(false).pack(), vec![0x14]);
    assert_eq!(Tuple::new().push(true).pack(), vec![0x15, 0x01]);

    let t = roundtrip(&Tuple::new().push(true));
    assert!(t.get_as::<bool>(0).unwrap());
    assert_eq!(t.get(0), Some(&Element::Int(1)));
}

#[test]
fn test_float_and_double_roundtrip() {
    let t = Tuple::new().push(1.5f32).push(-2.25f64).push(f64::INFINITY).push(f32::NEG_INFINITY);
    assert_eq!(roundtrip(&t), t);
}

#[test]
fn test_nan_is_canonical() {
    let quiet = Tuple::new().push(f64::NAN).pack();
    let other = Tuple::new().push(f64::from_bits(0x7FF0_0000_0000_0001)).pack();
    let negative = Tuple::new().push(-f64::NAN).pack();
    assert_eq!(quiet, other);
    assert_eq!(quiet, negative);

    let quiet32 = Tuple::new().push(f32::NAN).pack();
    let other32 = Tuple::new().push(f32::from_bits(0xFFC0_0001)).pack();
    assert_eq!(quiet32, other32);

    let decoded = Tuple::unpack(&quiet).unwrap();
    assert!(decoded.get_as::<f64>(0).unwrap().is_nan());
    assert_eq!(decoded, Tuple::new().push(f64::NAN));
}

#[test]
fn test_negative_zero_sorts_before_zero() {
    assert!(Tuple::new().push(-0.0f64).pack() < Tuple::new().push(0.0f64).pack());
    assert!(Tuple::new().push(-0.0f64) < Tuple::new().push(0.0f64));
}

#[test]
fn test_uuid_elements() {
    let u = Uuid::from_bytes([0x11; 16]);
    let t = Tuple::new().push(u).push(Element::Uuid64(0x0102_0304_0506_0708));
    let packed = t.pack();
    assert_eq!(packed[0], UUID_CODE);
    assert_eq!(&packed[1..17], &[0x11; 16]);
    assert_eq!(packed[17], UUID64_CODE);
    assert_eq!(&packed[18..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(roundtrip(&t), t);
}

#[test]
fn test_legacy_uuid_decode_mode() {
    let mut data = vec![NESTED_CODE];
    data.extend_from_slice(&[0xAB; 16]);

    let legacy = Tuple::unpack_with(&data, DecodeMode::LegacyUuid).unwrap();
    assert_eq!(legacy.get_as::<Uuid>(0).unwrap(), Uuid::from_bytes([0xAB; 16]));

    // In the standard mode the same bytes are an unterminated nested tuple.
    assert!(Tuple::unpack(&data).is_err());
}

#[test]
fn test_nested_tuple() {
    let inner = Tuple::new().push("a").push(1i64);
    let t = Tuple::new().push(inner.clone()).push("b");
    let packed = t.pack();
    assert_eq!(packed[0], NESTED_CODE);
    assert_eq!(roundtrip(&t).get_as::<Tuple>(0).unwrap(), inner);
}

#[test]
fn test_nested_tuple_with_null() {
    let inner = Tuple::new().push(()).push("x");
    let t = Tuple::new().push(inner);
    let packed = t.pack();
    assert_eq!(&packed[..3], &[NESTED_CODE, 0x00, 0xFF]);
    assert_eq!(*packed.last().unwrap(), 0x00);
    assert_eq!(roundtrip(&t), t);
}

#[test]
fn test_deeply_nested_tuple() {
    let mut t = Tuple::new().push(1i64);
    for _ in 0..32 {
        t = Tuple::new().push(t).push(());
    }
    assert_eq!(roundtrip(&t), t);
}

#[test]
fn test_cross_type_order() {
    let ordered = vec![
        Tuple::new().push(()),
        Tuple::new().push(b"z".as_slice()),
        Tuple::new().push("a"),
        Tuple::new().push(Tuple::new()),
        Tuple::new().push(-5i64),
        Tuple::new().push(0i64),
        Tuple::new().push(5i64),
        Tuple::new().push(1.0f32),
        Tuple::new().push(1.0f64),
        Tuple::new().push(Uuid::nil()),
        Tuple::new().push(Element::Uuid64(0)),
    ];
    for pair in ordered.windows(2) {
        assert!(pair[0] < pair[1], "{} < {}", pair[0], pair[1]);
        assert!(pair[0].pack() < pair[1].pack(), "packed {} < {}", pair[0], pair[1]);
    }
}

#[test]
fn test_prefix_tuple_sorts_first() {
    let short = Tuple::new().push("a");
    let long = Tuple::new().push("a").push(());
    assert!(short < long);
    assert!(short.pack() < long.pack());
}

#[test]
fn test_range_excludes_self() {
    let t = Tuple::new().push("users");
    let (start, end) = t.range();
    let child = t.clone().push(1i64).pack();
    assert!(start <= child && child < end);
    assert!(t.pack() < start);
}

#[test]
fn test_strinc() {
    assert_eq!(strinc(b"abc"), Some(b"abd".to_vec()));
    assert_eq!(strinc(&[0x01, 0xFF, 0xFF]), Some(vec![0x02]));
    assert_eq!(strinc(&[0xFF, 0xFF]), None);
    assert_eq!(strinc(&[]), None);
}

#[test]
fn test_get_as_errors() {
    let t = Tuple::new().push("abc");
    assert!(matches!(t.get_as::<i64>(0), Err(TupleError::TypeMismatch { .. })));
    assert!(matches!(t.get_as::<String>(3), Err(TupleError::IndexOutOfRange { index: 3, len: 1 })));
}

#[test]
fn test_get_as_numeric_text() {
    let t = Tuple::new().push("12").push("-7").push(" 12 ").push("12abc").push("");
    assert_eq!(t.get_as::<i64>(0).unwrap(), 12);
    assert_eq!(t.get_as::<i32>(1).unwrap(), -7);
    for index in 2..5 {
        assert!(matches!(t.get_as::<i64>(index), Err(TupleError::TypeMismatch { .. })));
    }
}

#[test]
fn test_error_unexpected_end() {
    assert!(matches!(Tuple::unpack(&[0x16, 0x01]), Err(TupleError::UnexpectedEnd { offset: 0 })));
    assert!(matches!(Tuple::unpack(&[FLOAT_CODE, 0x00]), Err(TupleError::UnexpectedEnd { .. })));
    assert!(matches!(Tuple::unpack(&[DOUBLE_CODE]), Err(TupleError::UnexpectedEnd { .. })));
    assert!(matches!(Tuple::unpack(&[UUID_CODE, 1, 2]), Err(TupleError::UnexpectedEnd { .. })));
}

#[test]
fn test_error_unknown_type_code() {
    let err = Tuple::unpack(&[0x14, 0x40]).unwrap_err();
    assert!(matches!(err, TupleError::UnknownTypeCode { code: 0x40, offset: 1 }));
    assert!(err.is_malformed());
}

#[test]
fn test_error_invalid_utf8() {
    let data = [STRING_CODE, 0xC3, 0x28, 0x00];
    assert!(matches!(Tuple::unpack(&data), Err(TupleError::InvalidUtf8 { .. })));
}

#[test]
fn test_error_missing_terminator() {
    assert!(matches!(Tuple::unpack(&[BYTES_CODE, 0x61]), Err(TupleError::MissingTerminator { .. })));
}

#[test]
fn test_error_unterminated_nested() {
    assert!(matches!(
        Tuple::unpack(&[NESTED_CODE, 0x15, 0x01]),
        Err(TupleError::UnterminatedNested { .. })
    ));
}

#[test]
fn test_error_integer_too_wide() {
    let mut data = vec![POS_INT_BIG_CODE, 17];
    data.extend_from_slice(&[0x01; 17]);
    assert!(matches!(Tuple::unpack(&data), Err(TupleError::IntegerOverflow { size: 17, .. })));

    // 16 bytes above i128::MAX
    let mut data = vec![POS_INT_BIG_CODE, 16];
    data.extend_from_slice(&[0xFF; 16]);
    assert!(matches!(Tuple::unpack(&data), Err(TupleError::IntegerOverflow { .. })));
}

#[test]
fn test_unpack_partial_reports_consumed() {
    let packed = Tuple::new().push("a").push(1i64).pack();
    let (t, consumed) = Tuple::unpack_partial(&packed).unwrap();
    assert_eq!(consumed, packed.len());
    assert_eq!(t.len(), 2);
}

#[test]
fn test_from_rust_tuples() {
    let t: Tuple = ("dir", 7i64, true).into();
    assert_eq!(t, Tuple::new().push("dir").push(7i64).push(1i64));
}

#[test]
fn test_collect_and_iterate() {
    let t: Tuple = vec![Element::from(1i64), Element::from("x")].into_iter().collect();
    assert_eq!(t.iter().count(), 2);
    let kinds: Vec<&str> = (&t).into_iter().map(Element::kind).collect();
    assert_eq!(kinds, vec!["int", "string"]);
}

#[test]
fn test_display() {
    let t = Tuple::new().push("a").push(1i64).push(());
    assert_eq!(t.to_string(), "(\"a\", 1, null)");
    assert_eq!(Tuple::new().push(2i64).to_string(), "(2,)");
}
