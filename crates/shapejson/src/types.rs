//! Shape views handed from a [`Reflect`] value to the encoder.
//!
//! A [`ValueRef`] is the borrowed, per-visit answer to "what does this value
//! look like right now": a primitive, a date, a run of elements, a run of
//! named entries, or a described object. Containers carry an [`Identity`] so
//! the encoder can spot a value that is already being written further up the
//! current path.

use std::any::{Any, TypeId};
use std::cell::Ref;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::descriptor::{descriptor, Describe, TypeDescriptor};
use crate::reflect::Reflect;

/// Sortable ISO-8601 layout used for date/time values in both directions.
pub(crate) const SORTABLE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub(crate) const SORTABLE_FRACTION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Coarse shape of a type, recorded per member in a
/// [`PropertyDescriptor`](crate::descriptor::PropertyDescriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeHint {
    Primitive,
    Enum,
    DateTime,
    ByteSequence,
    TypeLiteral,
    Dictionary,
    Sequence,
    Object,
}

/// Identity token of a value on the ancestor stack.
///
/// Address plus type: a struct and its first field share an address but never
/// a type, so the pair is unique along one path. Nothing is owned, so holding
/// an identity never extends a value's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    addr: usize,
    ty: TypeId,
}

impl Identity {
    /// Identity of the value behind `value`.
    pub fn of<T: Any + ?Sized>(value: &T) -> Self {
        Self {
            addr: value as *const T as *const () as usize,
            ty: TypeId::of::<T>(),
        }
    }
}

/// Scalar payload of a primitive value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive<'a> {
    Bool(bool),
    Int(i64),
    UInt(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(&'a str),
    /// Symbolic variant name of a registered enum.
    Enum(&'static str),
}

/// A date/time value, rendered in the sortable layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
}

impl Timestamp {
    /// Render as sortable ISO-8601. Fractional seconds appear only when
    /// non-zero, so whole-second values stay in the short form.
    pub fn to_sortable(&self) -> String {
        match self {
            Timestamp::DateTime(dt) if dt.nanosecond() == 0 => {
                dt.format(SORTABLE_FORMAT).to_string()
            }
            Timestamp::DateTime(dt) => dt.format(SORTABLE_FRACTION_FORMAT).to_string(),
            Timestamp::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Elements of a sequence-like value.
pub struct SeqRef<'a> {
    identity: Identity,
    items: Box<dyn Iterator<Item = &'a dyn Reflect> + 'a>,
}

impl<'a> SeqRef<'a> {
    pub fn new<I>(identity: Identity, items: I) -> Self
    where
        I: Iterator<Item = &'a dyn Reflect> + 'a,
    {
        Self {
            identity,
            items: Box::new(items),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn into_items(self) -> Box<dyn Iterator<Item = &'a dyn Reflect> + 'a> {
        self.items
    }
}

/// Entries of a string-keyed dictionary, in the map's own iteration order.
pub struct MapRef<'a> {
    identity: Identity,
    entries: Box<dyn Iterator<Item = (&'a str, &'a dyn Reflect)> + 'a>,
}

impl<'a> MapRef<'a> {
    pub fn new<I>(identity: Identity, entries: I) -> Self
    where
        I: Iterator<Item = (&'a str, &'a dyn Reflect)> + 'a,
    {
        Self {
            identity,
            entries: Box::new(entries),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn into_entries(self) -> Box<dyn Iterator<Item = (&'a str, &'a dyn Reflect)> + 'a> {
        self.entries
    }
}

/// A described object together with its cached descriptor.
pub struct ObjectRef<'a> {
    identity: Identity,
    value: &'a dyn Any,
    descriptor: Arc<TypeDescriptor>,
}

impl<'a> ObjectRef<'a> {
    pub fn new<T: Describe>(value: &'a T) -> Self {
        Self {
            identity: Identity::of(value),
            value,
            descriptor: descriptor::<T>(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn value(&self) -> &'a dyn Any {
        self.value
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }
}

/// Borrowed view of a value's runtime shape.
pub enum ValueRef<'a> {
    Null,
    /// Fully qualified name of a type.
    TypeLiteral(&'static str),
    /// Opaque bytes, written as text.
    Bytes(&'a [u8]),
    Primitive(Primitive<'a>),
    DateTime(Timestamp),
    Dictionary(MapRef<'a>),
    Sequence(SeqRef<'a>),
    Object(ObjectRef<'a>),
    /// Contents behind a live `RefCell` borrow.
    Borrowed(Ref<'a, dyn Reflect + 'static>),
}

impl<'a> ValueRef<'a> {
    /// View of a described object.
    pub fn object<T: Describe>(value: &'a T) -> Self {
        ValueRef::Object(ObjectRef::new(value))
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Null => f.write_str("Null"),
            ValueRef::TypeLiteral(name) => f.debug_tuple("TypeLiteral").field(name).finish(),
            ValueRef::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            ValueRef::Primitive(p) => f.debug_tuple("Primitive").field(p).finish(),
            ValueRef::DateTime(t) => f.debug_tuple("DateTime").field(t).finish(),
            ValueRef::Dictionary(_) => f.write_str("Dictionary"),
            ValueRef::Sequence(_) => f.write_str("Sequence"),
            ValueRef::Object(obj) => f
                .debug_tuple("Object")
                .field(&obj.descriptor().type_name())
                .finish(),
            ValueRef::Borrowed(_) => f.write_str("Borrowed"),
        }
    }
}

/// Opaque byte sequence. Serialized as (lossy UTF-8) text rather than as an
/// array of numbers; deserialized from a JSON string's raw UTF-8 bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl From<&str> for Bytes {
    fn from(text: &str) -> Self {
        Bytes(text.as_bytes().to_vec())
    }
}

/// A type used as a value. Serializes as its quoted fully qualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeLiteral {
    name: &'static str,
}

impl TypeLiteral {
    pub fn of<T: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn from_name(name: &'static str) -> Self {
        Self { name }
    }
}
