//! Value classifier shared by both directions.
//!
//! Categories are checked in a fixed precedence: null, type literal, byte
//! sequence, primitive (enums included), date/time, dictionary, sequence,
//! object. Byte sequences come before sequences so opaque bytes are never
//! written as an array of numbers.

use std::fmt;

use serde_json::Value;

use crate::reflect::Reflect;
use crate::types::{ShapeHint, ValueRef};

/// Shape category of a concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    Null,
    TypeLiteral,
    ByteSequence,
    Primitive,
    DateTime,
    Dictionary,
    Sequence,
    Object,
}

impl Shape {
    /// Whether values of this shape are containers that take part in cycle
    /// detection.
    pub fn is_container(self) -> bool {
        matches!(self, Shape::Dictionary | Shape::Sequence | Shape::Object)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Null => "null",
            Shape::TypeLiteral => "type-literal",
            Shape::ByteSequence => "byte-sequence",
            Shape::Primitive => "primitive",
            Shape::DateTime => "date-time",
            Shape::Dictionary => "dictionary",
            Shape::Sequence => "sequence",
            Shape::Object => "object",
        };
        f.write_str(name)
    }
}

impl From<ShapeHint> for Shape {
    fn from(hint: ShapeHint) -> Self {
        match hint {
            ShapeHint::Primitive | ShapeHint::Enum => Shape::Primitive,
            ShapeHint::DateTime => Shape::DateTime,
            ShapeHint::ByteSequence => Shape::ByteSequence,
            ShapeHint::TypeLiteral => Shape::TypeLiteral,
            ShapeHint::Dictionary => Shape::Dictionary,
            ShapeHint::Sequence => Shape::Sequence,
            ShapeHint::Object => Shape::Object,
        }
    }
}

/// Classify a value by its current runtime view.
pub fn classify(value: &dyn Reflect) -> Shape {
    classify_view(&value.reflect())
}

/// Classify an already-taken view. `RefCell` contents are classified as the
/// value behind the borrow.
pub fn classify_view(view: &ValueRef<'_>) -> Shape {
    match view {
        ValueRef::Null => Shape::Null,
        ValueRef::TypeLiteral(_) => Shape::TypeLiteral,
        ValueRef::Bytes(_) => Shape::ByteSequence,
        ValueRef::Primitive(_) => Shape::Primitive,
        ValueRef::DateTime(_) => Shape::DateTime,
        ValueRef::Dictionary(_) => Shape::Dictionary,
        ValueRef::Sequence(_) => Shape::Sequence,
        ValueRef::Object(_) => Shape::Object,
        ValueRef::Borrowed(inner) => classify(&**inner),
    }
}

/// Shape of a generic token. Tokens never carry dates, bytes or type
/// literals; those only exist once a target type gives them meaning.
pub fn classify_token(token: &Value) -> Shape {
    match token {
        Value::Null => Shape::Null,
        Value::Bool(_) | Value::Number(_) | Value::String(_) => Shape::Primitive,
        Value::Array(_) => Shape::Sequence,
        Value::Object(_) => Shape::Dictionary,
    }
}
