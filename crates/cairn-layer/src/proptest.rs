//! Property-based tests for the tuple encoding layer.
//!
//! These tests verify the key invariants of the FoundationDB-compatible tuple
//! encoding:
//!
//! 1. **Roundtrip**: unpack(pack(x)) == x for all tuples
//! 2. **Ordering**: pack(a) < pack(b) iff a < b
//! 3. **Prefix stability**: pack(a) is a prefix of pack(a ++ b)
//! 4. **Subspace containment**: a subspace contains every key it packs

use proptest::prelude::*;
use uuid::Uuid;

use crate::Element;
use crate::Subspace;
use crate::Tuple;

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Strategy for scalar elements.
fn arb_scalar() -> impl Strategy<Value = Element> {
    prop_oneof![
        Just(Element::Null),
        "[a-zA-Z0-9_]{0,20}".prop_map(Element::String),
        // Any unicode, embedded NULs included
        any::<String>().prop_map(Element::String),
        prop::collection::vec(any::<u8>(), 0..50).prop_map(Element::Bytes),
        any::<i64>().prop_map(|n| Element::Int(n.into())),
        any::<i128>().prop_map(Element::Int),
        (-1000i64..1000i64).prop_map(|n| Element::Int(n.into())),
        any::<bool>().prop_map(Element::from),
        any::<f32>().prop_map(Element::Float),
        any::<f64>().prop_map(Element::Double),
        any::<[u8; 16]>().prop_map(|b| Element::Uuid(Uuid::from_bytes(b))),
        any::<u64>().prop_map(Element::Uuid64),
    ]
}

/// Strategy for elements including nested tuples a few levels deep.
fn arb_element() -> impl Strategy<Value = Element> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(|elements| Element::Tuple(elements.into_iter().collect()))
    })
}

/// Strategy for generating tuples with 0-5 elements.
fn arb_tuple() -> impl Strategy<Value = Tuple> {
    prop::collection::vec(arb_element(), 0..5).prop_map(|elements| elements.into_iter().collect())
}

/// Strategy for generating simple string tuples.
fn arb_string_tuple() -> impl Strategy<Value = Tuple> {
    prop::collection::vec("[a-z]{1,5}", 1..4)
        .prop_map(|strings| strings.into_iter().map(Element::String).collect())
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// Property: pack followed by unpack is identity.
    #[test]
    fn prop_roundtrip(tuple in arb_tuple()) {
        let packed = tuple.pack();
        let unpacked = Tuple::unpack(&packed).expect("unpack should succeed");
        prop_assert_eq!(tuple, unpacked, "roundtrip failed");
    }

    /// Property: semantic order equals byte order, across all element kinds.
    #[test]
    fn prop_order_matches_bytes(a in arb_tuple(), b in arb_tuple()) {
        prop_assert_eq!(a.cmp(&b), a.pack().cmp(&b.pack()), "order mismatch for {} vs {}", a, b);
    }

    /// Property: integer encoding preserves ordering over the full i128 range.
    #[test]
    fn prop_int_ordering(a in any::<i128>(), b in any::<i128>()) {
        let packed_a = Tuple::new().push(a).pack();
        let packed_b = Tuple::new().push(b).pack();
        prop_assert_eq!(a.cmp(&b), packed_a.cmp(&packed_b));
    }

    /// Property: double encoding follows IEEE total order.
    #[test]
    fn prop_double_ordering(a in any::<f64>(), b in any::<f64>()) {
        prop_assume!(!a.is_nan() && !b.is_nan());
        let packed_a = Tuple::new().push(a).pack();
        let packed_b = Tuple::new().push(b).pack();
        prop_assert_eq!(a.total_cmp(&b), packed_a.cmp(&packed_b));
    }

    /// Property: string encoding preserves byte order, NULs included.
    #[test]
    fn prop_string_ordering(a in any::<String>(), b in any::<String>()) {
        let packed_a = Tuple::new().push(a.as_str()).pack();
        let packed_b = Tuple::new().push(b.as_str()).pack();
        prop_assert_eq!(a.as_bytes().cmp(b.as_bytes()), packed_a.cmp(&packed_b));
    }

    /// Property: a packed tuple is a prefix of any extension of it.
    #[test]
    fn prop_prefix_stability(prefix in arb_tuple(), suffix in arb_tuple()) {
        let packed_prefix = prefix.pack();
        let packed_combined = prefix.concat(&suffix).pack();
        prop_assert!(packed_combined.starts_with(&packed_prefix));
    }

    /// Property: `Tuple::range` captures every strict extension.
    #[test]
    fn prop_range_captures_extensions(prefix in arb_string_tuple(), suffix in arb_string_tuple()) {
        let (start, end) = prefix.range();
        let key = prefix.concat(&suffix).pack();
        prop_assert!(key >= start && key < end);
    }

    /// Property: subspace pack/unpack roundtrip.
    #[test]
    fn prop_subspace_roundtrip(prefix in arb_tuple(), key in arb_tuple()) {
        let subspace = Subspace::new(&prefix);
        let packed = subspace.pack(&key);
        prop_assert!(subspace.contains(&packed));
        let unpacked = subspace.unpack(&packed).expect("unpack should succeed");
        prop_assert_eq!(key, unpacked);
    }

    /// Property: disjoint prefixes never contain each other's keys.
    #[test]
    fn prop_subspace_isolation(
        prefix1 in "[a-m]{1,3}",
        prefix2 in "[n-z]{1,3}",
        key in arb_string_tuple()
    ) {
        let sub1 = Subspace::new(&Tuple::new().push(prefix1.as_str()));
        let sub2 = Subspace::new(&Tuple::new().push(prefix2.as_str()));

        let key1 = sub1.pack(&key);
        let key2 = sub2.pack(&key);

        prop_assert!(sub1.contains(&key1));
        prop_assert!(!sub1.contains(&key2));
        prop_assert!(sub2.contains(&key2));
        prop_assert!(!sub2.contains(&key1));
    }

    /// Property: keys of a child subspace are inside the parent's range.
    #[test]
    fn prop_nested_subspace_hierarchy(
        outer in arb_string_tuple(),
        inner in arb_string_tuple(),
        key in arb_string_tuple()
    ) {
        let outer = Subspace::new(&outer);
        let inner = outer.subspace(&inner);
        let packed = inner.pack(&key);
        let (start, end) = outer.range();

        prop_assert!(inner.contains(&packed));
        prop_assert!(outer.contains(&packed));
        prop_assert!(packed >= start && packed < end);
    }

    /// Property: the same tuple always produces the same bytes.
    #[test]
    fn prop_deterministic(tuple in arb_tuple()) {
        prop_assert_eq!(tuple.pack(), tuple.clone().pack());
    }
}

// =============================================================================
// Additional Non-Proptest Tests
// =============================================================================

#[test]
fn test_special_strings_roundtrip() {
    for s in ["", "\x00", "\x00\x00", "a\x00b", "\x00a\x00", "\u{1F600}"] {
        let tuple = Tuple::new().push(s);
        assert_eq!(Tuple::unpack(&tuple.pack()).unwrap(), tuple, "roundtrip of {s:?}");
    }
}
