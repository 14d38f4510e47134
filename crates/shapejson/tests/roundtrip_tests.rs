/// Serialize → deserialize roundtrips, both typed and through the generic
/// token tree.
use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use shapejson::{
    deserialize, deserialize_value, deserialize_with, reflect_enum, reflect_object, serialize,
    Bytes, Describe, NameCase, Options, TypeBuilder,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Open,
    Paid,
    Refunded,
}

reflect_enum!(Status { Open, Paid, Refunded });

#[derive(Debug, Default, Clone, PartialEq)]
struct Line {
    sku: String,
    quantity: u16,
    unit_price: f64,
}

impl Describe for Line {
    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.constructor(Line::default);
        ty.field("Sku", |l| &l.sku, |l| &mut l.sku);
        ty.field("Quantity", |l| &l.quantity, |l| &mut l.quantity);
        ty.field("UnitPrice", |l| &l.unit_price, |l| &mut l.unit_price);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Order {
    id: u64,
    customer: String,
    total: f64,
    paid: bool,
    status: Status,
    initial: char,
    placed: NaiveDateTime,
    shipped: Option<DateTime<Utc>>,
    due: NaiveDate,
    tags: Vec<String>,
    history: VecDeque<i64>,
    lines: Vec<Line>,
    attributes: BTreeMap<String, String>,
    note: Option<String>,
    raw: Bytes,
}

impl Default for Order {
    fn default() -> Self {
        Order {
            id: 0,
            customer: String::new(),
            total: 0.0,
            paid: false,
            status: Status::Open,
            initial: ' ',
            placed: NaiveDateTime::default(),
            shipped: None,
            due: NaiveDate::default(),
            tags: Vec::new(),
            history: VecDeque::new(),
            lines: Vec::new(),
            attributes: BTreeMap::new(),
            note: None,
            raw: Bytes::default(),
        }
    }
}

impl Describe for Order {
    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.constructor(Order::default);
        ty.field("Id", |o| &o.id, |o| &mut o.id);
        ty.field("Customer", |o| &o.customer, |o| &mut o.customer);
        ty.field("Total", |o| &o.total, |o| &mut o.total);
        ty.field("Paid", |o| &o.paid, |o| &mut o.paid);
        ty.field("Status", |o| &o.status, |o| &mut o.status);
        ty.field("Initial", |o| &o.initial, |o| &mut o.initial);
        ty.field("Placed", |o| &o.placed, |o| &mut o.placed);
        ty.field("Shipped", |o| &o.shipped, |o| &mut o.shipped);
        ty.field("Due", |o| &o.due, |o| &mut o.due);
        ty.field("Tags", |o| &o.tags, |o| &mut o.tags);
        ty.field("History", |o| &o.history, |o| &mut o.history);
        ty.field("Lines", |o| &o.lines, |o| &mut o.lines);
        ty.field("Attributes", |o| &o.attributes, |o| &mut o.attributes);
        ty.field("Note", |o| &o.note, |o| &mut o.note);
        ty.field("Raw", |o| &o.raw, |o| &mut o.raw);
    }
}

reflect_object!(Line, Order);

fn sample_order() -> Order {
    let placed = NaiveDate::from_ymd_opt(2024, 11, 2)
        .unwrap()
        .and_hms_micro_opt(8, 15, 0, 123_456)
        .unwrap();
    let mut attributes = BTreeMap::new();
    attributes.insert("gift".to_string(), "yes".to_string());
    attributes.insert("channel".to_string(), "web\tmobile".to_string());
    Order {
        id: 90_071,
        customer: "Zoë \"Z\" Ångström".into(),
        total: 149.75,
        paid: true,
        status: Status::Paid,
        initial: 'Z',
        placed,
        shipped: Some(placed.and_utc()),
        due: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        tags: vec!["priority".into(), String::new(), "line\nbreak".into()],
        history: VecDeque::from(vec![-1, 0, i64::MAX]),
        lines: vec![
            Line {
                sku: "A-1".into(),
                quantity: 2,
                unit_price: 49.5,
            },
            Line {
                sku: "B-2".into(),
                quantity: 1,
                unit_price: 50.75,
            },
        ],
        attributes,
        note: None,
        raw: Bytes::from("raw bytes\u{1}"),
    }
}

/// Assert that a generic document survives parse → serialize → parse.
fn assert_value_roundtrip(json: &str) {
    let original = deserialize_value(json).unwrap().unwrap();
    let text = serialize(&original, &Options::compact());
    let back = deserialize_value(&text).unwrap().unwrap();
    assert_eq!(
        original, back,
        "Roundtrip failed:\n  input:  {json}\n  output: {text}"
    );
}

// ============================================================================
// Typed roundtrips
// ============================================================================

#[test]
fn order_roundtrips_compact() {
    let order = sample_order();
    let text = serialize(&order, &Options::compact());
    let back: Order = deserialize(&text).unwrap().unwrap();
    assert_eq!(back, order);
}

#[test]
fn order_roundtrips_pretty() {
    let order = sample_order();
    let text = serialize(&order, &Options::pretty());
    assert!(text.contains('\n'));
    let back: Order = deserialize(&text).unwrap().unwrap();
    assert_eq!(back, order);
}

#[test]
fn order_roundtrips_under_name_case() {
    let opts = Options::compact().with_name_case(NameCase::Snake);
    let order = sample_order();
    let text = serialize(&order, &opts);
    assert!(text.contains("\"unit_price\": 49.5"));
    let back: Order = deserialize_with(&text, &opts).unwrap().unwrap();
    assert_eq!(back, order);
}

#[test]
fn default_order_roundtrips() {
    let order = Order::default();
    let text = serialize(&order, &Options::compact());
    assert!(text.contains(r#""Tags": [ ]"#));
    assert!(text.contains(r#""Attributes": { }"#));
    let back: Order = deserialize(&text).unwrap().unwrap();
    assert_eq!(back, order);
}

#[test]
fn sequences_of_objects_roundtrip() {
    let lines = sample_order().lines;
    let text = serialize(&lines, &Options::compact());
    let back: Vec<Line> = deserialize(&text).unwrap().unwrap();
    assert_eq!(back, lines);
}

// ============================================================================
// Generic roundtrips
// ============================================================================

#[test]
fn roundtrip_flat_object() {
    assert_value_roundtrip(r#"{"name": "Alice", "age": 30, "active": true, "score": 3.14}"#);
}

#[test]
fn roundtrip_nested_object() {
    assert_value_roundtrip(r#"{"user": {"address": {"city": "Oslo", "zip": null}}}"#);
}

#[test]
fn roundtrip_arrays() {
    assert_value_roundtrip(r#"[1, -2, 18446744073709551615, [], {}, [[]], "x"]"#);
}

#[test]
fn roundtrip_key_order_is_kept() {
    assert_value_roundtrip(r#"{"z": 1, "a": 2, "m": {"y": 1, "b": 2}}"#);
}

#[test]
fn roundtrip_escapes() {
    assert_value_roundtrip(r#"{"s": "tab\tquote\"slash\\nul\u0000bell\u0007é"}"#);
}
