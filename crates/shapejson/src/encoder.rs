//! Encoder: walks a [`Reflect`] value and writes JSON text.
//!
//! Layout rules:
//!
//! - **Pairs**: `"name": value`, one space after the colon, bare comma between
//!   pairs and elements
//! - **Empty containers**: `{ }` and `[ ]`, in both layouts
//! - **Top level**: a null value writes nothing, bare strings and enum names
//!   are written without quotes
//! - **Numbers**: no exponents, whole floats without a fraction, -0 → 0
//! - **Cycles**: a container already open on the current path is written as
//!   `{ "$circref": N }`, N being the ancestor's stack index
//!
//! # Example
//! ```
//! use shapejson::{serialize, Options};
//! use std::collections::BTreeMap;
//!
//! let mut scores = BTreeMap::new();
//! scores.insert("alice".to_string(), 1.5);
//! scores.insert("bob".to_string(), 2.0);
//! assert_eq!(serialize(&scores, &Options::compact()), r#"{"alice": 1.5,"bob": 2}"#);
//! assert_eq!(serialize("plain", &Options::compact()), "plain");
//! ```

use crate::context::Context;
use crate::filter::{NameFilter, Options};
use crate::reflect::Reflect;
use crate::types::{Identity, MapRef, ObjectRef, Primitive, SeqRef, ValueRef};

/// Serialize `value` under `options`. Never fails.
pub fn serialize<T: Reflect + ?Sized>(value: &T, options: &Options) -> String {
    let mut cx = Context::new(options.clone());
    serialize_in(value, &mut cx)
}

/// Serialize with a caller-supplied context. Ancestors already on the
/// context's stack count as open containers.
pub fn serialize_in<T: Reflect + ?Sized>(value: &T, cx: &mut Context) -> String {
    let mut out = String::new();
    let saved = cx.enter_root();
    encode_root(value.reflect(), cx, &mut out);
    cx.restore_root(saved);
    out
}

/// Serialize only the members named in `names` (declared or serialized name).
pub fn serialize_only<T: Reflect + ?Sized>(value: &T, pretty: bool, names: &[&str]) -> String {
    let options = Options {
        pretty,
        filter: NameFilter::only(names.iter().copied()),
        ..Options::default()
    };
    serialize(value, &options)
}

/// Serialize every member except those named in `names`.
pub fn serialize_excluding<T: Reflect + ?Sized>(
    value: &T,
    pretty: bool,
    names: &[&str],
) -> String {
    let options = Options {
        pretty,
        filter: NameFilter::excluding(names.iter().copied()),
        ..Options::default()
    };
    serialize(value, &options)
}

/// Convenience conversions for any reflectable value.
pub trait ToJson {
    /// Indented JSON. A null receiver gives an empty string.
    fn to_json(&self) -> String;

    /// Single-line JSON. A null receiver gives an empty string.
    fn to_json_compact(&self) -> String;
}

impl<T: Reflect + ?Sized> ToJson for T {
    fn to_json(&self) -> String {
        if matches!(self.reflect(), ValueRef::Null) {
            return String::new();
        }
        serialize(self, &Options::pretty())
    }

    fn to_json_compact(&self) -> String {
        if matches!(self.reflect(), ValueRef::Null) {
            return String::new();
        }
        serialize(self, &Options::compact())
    }
}

/// Top-level dispatch: null writes nothing, bare text is unquoted, other
/// primitives are written as their literal form.
fn encode_root(view: ValueRef<'_>, cx: &mut Context, out: &mut String) {
    match view {
        ValueRef::Null => {}
        ValueRef::Borrowed(inner) => encode_root(inner.reflect(), cx, out),
        ValueRef::Primitive(Primitive::Str(s)) => out.push_str(s),
        ValueRef::Primitive(Primitive::Enum(name)) => out.push_str(name),
        ValueRef::Primitive(Primitive::Char(c)) => out.push(c),
        view => encode_view(view, cx, out),
    }
}

fn encode_value(value: &dyn Reflect, cx: &mut Context, out: &mut String) {
    encode_view(value.reflect(), cx, out);
}

fn encode_view(view: ValueRef<'_>, cx: &mut Context, out: &mut String) {
    match view {
        ValueRef::Null => out.push_str("null"),
        ValueRef::TypeLiteral(name) => encode_string(name, cx.options(), out),
        ValueRef::Bytes(bytes) => {
            encode_string(&String::from_utf8_lossy(bytes), cx.options(), out)
        }
        ValueRef::Primitive(p) => encode_primitive(p, cx.options(), out),
        ValueRef::DateTime(ts) => encode_string(&ts.to_sortable(), cx.options(), out),
        ValueRef::Dictionary(map) => encode_dictionary(map, cx, out),
        ValueRef::Sequence(seq) => encode_sequence(seq, cx, out),
        ValueRef::Object(obj) => encode_object(obj, cx, out),
        ValueRef::Borrowed(inner) => encode_value(&*inner, cx, out),
    }
}

/// Push `identity` onto the ancestor stack, or write the cycle marker and
/// return false when it is already open on this path.
fn enter(identity: Identity, cx: &mut Context, out: &mut String) -> bool {
    if let Some(depth) = cx.ancestor_depth(identity) {
        log::trace!("cycle back to ancestor {depth}");
        out.push_str(&format!("{{ \"$circref\": {depth} }}"));
        return false;
    }
    cx.push_ancestor(identity);
    true
}

/// Separator before the next member or element. In pretty mode each item
/// starts on its own line at the current depth.
fn begin_item(first: &mut bool, cx: &Context, out: &mut String) {
    if !*first {
        out.push(',');
    }
    *first = false;
    if cx.options().pretty {
        out.push('\n');
        out.push_str(&make_indent(cx.level()));
    }
}

/// Close a container opened with `open`; `{ }`/`[ ]` when nothing was written.
fn close(bracket: char, empty: bool, cx: &Context, out: &mut String) {
    if empty {
        out.push(' ');
    } else if cx.options().pretty {
        out.push('\n');
        out.push_str(&make_indent(cx.level().saturating_sub(1)));
    }
    out.push(bracket);
}

fn encode_object(obj: ObjectRef<'_>, cx: &mut Context, out: &mut String) {
    if !enter(obj.identity(), cx, out) {
        return;
    }
    out.push('{');
    let owner = obj.value();
    let mut first = true;
    for member in obj.descriptor().members() {
        if !cx.options().admits(member) {
            continue;
        }
        let Some(value) = member.read(owner) else {
            continue;
        };
        begin_item(&mut first, cx, out);
        let name = cx.options().name_case.apply(member.serialized_name());
        encode_string(&name, cx.options(), out);
        out.push_str(": ");
        encode_value(value, cx, out);
    }
    close('}', first, cx, out);
    cx.pop_ancestor();
}

fn encode_dictionary(map: MapRef<'_>, cx: &mut Context, out: &mut String) {
    if !enter(map.identity(), cx, out) {
        return;
    }
    out.push('{');
    let mut first = true;
    for (key, value) in map.into_entries() {
        begin_item(&mut first, cx, out);
        encode_string(key, cx.options(), out);
        out.push_str(": ");
        encode_value(value, cx, out);
    }
    close('}', first, cx, out);
    cx.pop_ancestor();
}

fn encode_sequence(seq: SeqRef<'_>, cx: &mut Context, out: &mut String) {
    if !enter(seq.identity(), cx, out) {
        return;
    }
    out.push('[');
    let mut first = true;
    for item in seq.into_items() {
        begin_item(&mut first, cx, out);
        encode_value(item, cx, out);
    }
    close(']', first, cx, out);
    cx.pop_ancestor();
}

fn encode_primitive(p: Primitive<'_>, options: &Options, out: &mut String) {
    match p {
        Primitive::Bool(b) => out.push_str(if b { "true" } else { "false" }),
        Primitive::Int(i) => out.push_str(&i.to_string()),
        Primitive::UInt(u) => out.push_str(&u.to_string()),
        Primitive::F32(f) => out.push_str(&format_f32(f)),
        Primitive::F64(f) => out.push_str(&format_f64(f)),
        Primitive::Char(c) => encode_string(c.encode_utf8(&mut [0; 4]), options, out),
        Primitive::Str(s) => encode_string(s, options, out),
        Primitive::Enum(name) => encode_string(name, options, out),
    }
}

/// Format a double:
/// - NaN and infinities have no JSON form and become `null`
/// - Negative zero normalizes to 0
/// - Whole values print without a fractional part
/// - Everything else uses the shortest round-trip rendering (never exponent
///   form)
fn format_f64(f: f64) -> String {
    if !f.is_finite() {
        return "null".to_string();
    }
    let f = if f == 0.0 { 0.0 } else { f };
    if f.fract() == 0.0 && f.abs() < 9e15 {
        return (f as i64).to_string();
    }
    f.to_string()
}

/// Same rules as [`format_f64`], but non-whole values keep `f32`'s own
/// shortest rendering (`0.1f32` → `0.1`, not its widened digits).
fn format_f32(f: f32) -> String {
    if !f.is_finite() {
        return "null".to_string();
    }
    if f.fract() == 0.0 && f.abs() < 9e15 {
        return format_f64(f as f64);
    }
    f.to_string()
}

/// Write `s` as a quoted JSON string.
fn encode_string(s: &str, options: &Options, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => push_unicode_escape(c as u16, out),
            c if options.escape_non_ascii && !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    push_unicode_escape(*unit, out);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn push_unicode_escape(unit: u16, out: &mut String) {
    out.push_str(&format!("\\u{unit:04x}"));
}

/// Generate a 2-space-per-level indentation string.
fn make_indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoted(s: &str, escape_non_ascii: bool) -> String {
        let mut out = String::new();
        encode_string(s, &Options::compact().escape_non_ascii(escape_non_ascii), &mut out);
        out
    }

    #[test]
    fn floats_drop_whole_fractions() {
        assert_eq!(format_f64(1.0), "1");
        assert_eq!(format_f64(-0.0), "0");
        assert_eq!(format_f64(2.5), "2.5");
        assert_eq!(format_f64(0.1), "0.1");
        assert_eq!(format_f64(1e20), "100000000000000000000");
        assert_eq!(format_f64(f64::NAN), "null");
        assert_eq!(format_f64(f64::INFINITY), "null");
        assert_eq!(format_f32(0.1), "0.1");
        assert_eq!(format_f32(3.0), "3");
    }

    #[test]
    fn string_escapes() {
        assert_eq!(quoted("a\"b\\c", false), r#""a\"b\\c""#);
        assert_eq!(quoted("\u{8}\u{c}\n\r\t", false), r#""\b\f\n\r\t""#);
        assert_eq!(quoted("\0", false), r#""\u0000""#);
        assert_eq!(quoted("\u{1f}", false), r#""\u001f""#);
    }

    #[test]
    fn non_ascii_escaping_is_optional() {
        assert_eq!(quoted("café", false), "\"café\"");
        assert_eq!(quoted("café", true), r#""caf\u00e9""#);
        assert_eq!(quoted("😀", true), r#""\ud83d\ude00""#);
    }

    #[test]
    fn indent_is_two_spaces_per_level() {
        assert_eq!(make_indent(0), "");
        assert_eq!(make_indent(2), "    ");
    }
}
