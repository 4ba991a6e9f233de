//! Property tests: evolve keeps the source's key set, shares untouched values and only calls
//! leaves for keys the source actually has.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use data_evolve::processing::{evolve, evolve_map, evolver};
use data_evolve::transform::{leaves, TransformationSpec};
use data_evolve::types::{Map, Value};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::list),
            prop::collection::vec(("[a-e]", inner), 0..4)
                .prop_map(|entries| Value::map(entries.into_iter().collect())),
        ]
    })
}

/// A record keyed by short names, so spec keys and record keys overlap often.
fn arb_record() -> impl Strategy<Value = Map> {
    prop::collection::vec(("[a-f]{1,2}", arb_value()), 0..8)
        .prop_map(|entries| entries.into_iter().collect())
}

fn arb_spec_keys() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-f]{1,2}", 0..8)
}

fn obj<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::map(Map::from(entries))
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// An empty spec copies every value by reference.
    #[test]
    fn empty_spec_is_identity_by_reference(record in arb_record()) {
        let out = evolve_map(&TransformationSpec::new(), &record);

        prop_assert_eq!(out.keys().collect::<Vec<_>>(), record.keys().collect::<Vec<_>>());
        for ((_, a), (_, b)) in out.iter().zip(record.iter()) {
            prop_assert!(a.ptr_eq(b));
        }
    }

    /// Leaves apply to present keys only; everything else is shared.
    #[test]
    fn leaves_apply_only_to_present_keys(record in arb_record(), spec_keys in arb_spec_keys()) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut spec = TransformationSpec::new();
        for key in &spec_keys {
            let calls = Arc::clone(&calls);
            spec = spec.leaf(key.clone(), move |_: &Value| {
                calls.fetch_add(1, Ordering::SeqCst);
                Value::from("evolved")
            });
        }

        let out = evolve_map(&spec, &record);

        prop_assert_eq!(out.keys().collect::<Vec<_>>(), record.keys().collect::<Vec<_>>());
        let mut expected_calls = 0;
        for (key, original) in record.iter() {
            let evolved = out.get(key).unwrap();
            if spec_keys.contains(key) {
                expected_calls += 1;
                prop_assert_eq!(evolved, &Value::from("evolved"));
            } else {
                prop_assert!(evolved.ptr_eq(original));
            }
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), expected_calls);
    }

    /// Partial application gives the same result as the two-argument form.
    #[test]
    fn evolver_agrees_with_evolve(record in arb_record()) {
        let spec = TransformationSpec::new()
            .leaf("a", leaves::add(1))
            .leaf("b", leaves::trim())
            .nested("c", TransformationSpec::new().leaf("a", leaves::not()));
        let source = Value::map(record);

        prop_assert_eq!(evolver(spec.clone()).apply(&source), evolve(&spec, &source));
    }

    /// The source is never modified.
    #[test]
    fn source_is_left_untouched(record in arb_record()) {
        let before = record.clone();
        let spec = TransformationSpec::new()
            .leaf("a", leaves::always(Value::Null))
            .nested("b", TransformationSpec::new().leaf("a", leaves::always(1)));

        let _ = evolve_map(&spec, &record);

        prop_assert_eq!(record, before);
    }
}

// ---------------------------------------------------------------------------
// Worked examples
// ---------------------------------------------------------------------------

#[test]
fn tomato_example() {
    let spec = TransformationSpec::new()
        .leaf("firstName", leaves::trim())
        .leaf("lastName", leaves::trim())
        .nested(
            "data",
            TransformationSpec::new()
                .leaf("elapsed", leaves::add(1))
                .leaf("remaining", leaves::add(-1)),
        );
    let tomato = obj([
        ("firstName", Value::from("  Tomato ")),
        (
            "data",
            obj([("elapsed", Value::from(100)), ("remaining", Value::from(1400))]),
        ),
        ("id", Value::from(123)),
    ]);

    let out = evolve(&spec, &tomato);

    assert_eq!(
        out,
        obj([
            ("firstName", Value::from("Tomato")),
            (
                "data",
                obj([("elapsed", Value::from(101)), ("remaining", Value::from(1399))]),
            ),
            ("id", Value::from(123)),
        ])
    );
}

#[test]
fn untouched_nested_maps_are_shared() {
    let address = obj([("city", Value::from("Paris"))]);
    let spec = TransformationSpec::new().leaf("name", leaves::to_upper());

    let out = evolve(
        &spec,
        &obj([("name", Value::from("ada")), ("address", address.clone())]),
    );

    assert!(out.as_map().unwrap().get("address").unwrap().ptr_eq(&address));
}

#[test]
fn nested_list_is_keyed_by_index() {
    let spec = TransformationSpec::new()
        .nested("a", TransformationSpec::new().leaf("0", leaves::add(1)));
    let source = obj([("a", Value::list(vec![Value::from(1), Value::from(2)]))]);

    assert_eq!(evolve(&spec, &source).to_string(), r#"{"a":{"0":2,"1":2}}"#);
}

#[test]
fn mismatched_nesting_is_empty_map() {
    let spec = TransformationSpec::new()
        .nested("a", TransformationSpec::new().leaf("b", leaves::add(1)));
    assert_eq!(
        evolve(&spec, &obj([("a", Value::from(5))])),
        obj([("a", Value::map(Map::new()))])
    );
}
