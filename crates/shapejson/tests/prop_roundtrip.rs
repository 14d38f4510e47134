/// Property-based roundtrip tests.
///
/// Uses the `proptest` crate to generate random records and JSON trees and
/// verify that `deserialize(serialize(x)) == x` holds, and that member filters
/// emit exactly the requested members.
///
/// Strategies generate:
/// - Arbitrary strings (unicode, control characters, quotes, empty)
/// - Integers across the full `i64` range, floats on a quarter grid so the
///   decimal form is exact
/// - Nested token trees up to 3 levels deep (no top-level strings, which are
///   written unquoted)
use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::{Map, Value};
use shapejson::{
    deserialize, deserialize_value, reflect_object, serialize, serialize_excluding,
    serialize_only, Describe, Options, TypeBuilder,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Record {
    id: i64,
    name: String,
    score: f64,
    flag: bool,
    letter: char,
    tags: Vec<String>,
    counts: BTreeMap<String, u32>,
    parent: Option<i32>,
}

impl Describe for Record {
    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.constructor(Record::default);
        ty.field("Id", |r| &r.id, |r| &mut r.id);
        ty.field("Name", |r| &r.name, |r| &mut r.name);
        ty.field("Score", |r| &r.score, |r| &mut r.score);
        ty.field("Flag", |r| &r.flag, |r| &mut r.flag);
        ty.field("Letter", |r| &r.letter, |r| &mut r.letter);
        ty.field("Tags", |r| &r.tags, |r| &mut r.tags);
        ty.field("Counts", |r| &r.counts, |r| &mut r.counts);
        ty.field("Parent", |r| &r.parent, |r| &mut r.parent);
    }
}

reflect_object!(Record);

const MEMBERS: [&str; 8] = [
    "Id", "Name", "Score", "Flag", "Letter", "Tags", "Counts", "Parent",
];

// ============================================================================
// Strategies
// ============================================================================

fn arb_quarter() -> impl Strategy<Value = f64> {
    (-4_000_000i64..4_000_000).prop_map(|q| q as f64 / 4.0)
}

fn arb_record() -> impl Strategy<Value = Record> {
    (
        any::<i64>(),
        any::<String>(),
        arb_quarter(),
        any::<bool>(),
        any::<char>(),
        prop::collection::vec(any::<String>(), 0..5),
        prop::collection::btree_map(any::<String>(), any::<u32>(), 0..5),
        any::<Option<i32>>(),
    )
        .prop_map(
            |(id, name, score, flag, letter, tags, counts, parent)| Record {
                id,
                name,
                score,
                flag,
                letter,
                tags,
                counts,
                parent,
            },
        )
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        "[ -~]{0,12}".prop_map(Value::String),
    ]
}

fn arb_tree() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-zA-Z_][a-zA-Z0-9_]{0,8}", inner), 0..6)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn arb_container() -> impl Strategy<Value = Value> {
    arb_tree().prop_filter("top-level strings are written unquoted", |v| {
        !v.is_string() && !v.is_null()
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn record_roundtrips(record in arb_record()) {
        let text = serialize(&record, &Options::compact());
        let back: Option<Record> = deserialize(&text).unwrap();
        prop_assert_eq!(back, Some(record));
    }

    #[test]
    fn record_roundtrips_pretty(record in arb_record()) {
        let text = serialize(&record, &Options::pretty());
        let back: Option<Record> = deserialize(&text).unwrap();
        prop_assert_eq!(back, Some(record));
    }

    #[test]
    fn token_tree_roundtrips(tree in arb_container()) {
        let text = serialize(&tree, &Options::compact());
        let back = deserialize_value(&text).unwrap();
        prop_assert_eq!(back, Some(tree));
    }

    #[test]
    fn serialize_only_emits_exactly_the_named_members(
        record in arb_record(),
        mask in prop::collection::vec(any::<bool>(), MEMBERS.len()),
    ) {
        let chosen: Vec<&str> = MEMBERS
            .iter()
            .zip(&mask)
            .filter(|(_, keep)| **keep)
            .map(|(name, _)| *name)
            .collect();
        let text = serialize_only(&record, false, &chosen);
        let parsed = deserialize_value(&text).unwrap().unwrap();
        let keys: Vec<&str> = parsed.as_object().unwrap().keys().map(String::as_str).collect();
        prop_assert_eq!(keys, chosen);
    }

    #[test]
    fn serialize_excluding_emits_the_complement(
        record in arb_record(),
        mask in prop::collection::vec(any::<bool>(), MEMBERS.len()),
    ) {
        let dropped: Vec<&str> = MEMBERS
            .iter()
            .zip(&mask)
            .filter(|(_, drop)| **drop)
            .map(|(name, _)| *name)
            .collect();
        let kept: Vec<&str> = MEMBERS
            .iter()
            .zip(&mask)
            .filter(|(_, drop)| !**drop)
            .map(|(name, _)| *name)
            .collect();
        let text = serialize_excluding(&record, false, &dropped);
        let parsed = deserialize_value(&text).unwrap().unwrap();
        let keys: Vec<&str> = parsed.as_object().unwrap().keys().map(String::as_str).collect();
        prop_assert_eq!(keys, kept);
    }
}
