//! [`Reflect`] and [`FromJson`] for std, chrono and serde_json types.

use std::borrow::Cow;
use std::cell::{OnceCell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::context::Context;
use crate::descriptor::find_descriptor;
use crate::error::ConvertError;
use crate::reflect::{as_reflect, FromJson, Reflect};
use crate::types::{
    Bytes, Identity, MapRef, Primitive, SeqRef, ShapeHint, Timestamp, TypeLiteral, ValueRef,
    DATE_FORMAT, SORTABLE_FRACTION_FORMAT,
};

// ============================================================================
// Primitives
// ============================================================================

impl Reflect for bool {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Primitive(Primitive::Bool(*self))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Primitive
    }
}

impl FromJson for bool {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        token
            .as_bool()
            .ok_or_else(|| ConvertError::mismatch("boolean", token))
    }

    fn fallback() -> Option<Self> {
        Some(false)
    }
}

/// Integer from a number token. Whole-valued floats are accepted when they fit.
fn integer_from<I>(token: &Value, target: &'static str) -> Result<I, ConvertError>
where
    I: TryFrom<i64> + TryFrom<u64>,
{
    let Value::Number(n) = token else {
        return Err(ConvertError::mismatch("integer", token));
    };
    let out_of_range = || ConvertError::invalid(target, format!("{n} is out of range"));
    if let Some(i) = n.as_i64() {
        return <I as TryFrom<i64>>::try_from(i).map_err(|_| out_of_range());
    }
    if let Some(u) = n.as_u64() {
        return <I as TryFrom<u64>>::try_from(u).map_err(|_| out_of_range());
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            <I as TryFrom<i64>>::try_from(f as i64).map_err(|_| out_of_range())
        }
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => {
            <I as TryFrom<u64>>::try_from(f as u64).map_err(|_| out_of_range())
        }
        Some(f) if f.fract() == 0.0 && f.is_finite() => Err(out_of_range()),
        _ => Err(ConvertError::invalid(target, format!("{n} is not a whole number"))),
    }
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {
        $(
            impl Reflect for $ty {
                fn reflect(&self) -> ValueRef<'_> {
                    ValueRef::Primitive(Primitive::Int(*self as i64))
                }

                fn shape_hint() -> ShapeHint {
                    ShapeHint::Primitive
                }
            }

            impl FromJson for $ty {
                fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
                    integer_from(token, stringify!($ty))
                }

                fn fallback() -> Option<Self> {
                    Some(0)
                }
            }
        )*
    };
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Reflect for $ty {
                fn reflect(&self) -> ValueRef<'_> {
                    ValueRef::Primitive(Primitive::UInt(*self as u64))
                }

                fn shape_hint() -> ShapeHint {
                    ShapeHint::Primitive
                }
            }

            impl FromJson for $ty {
                fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
                    integer_from(token, stringify!($ty))
                }

                fn fallback() -> Option<Self> {
                    Some(0)
                }
            }
        )*
    };
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u8, u16, u32, u64, usize);

impl Reflect for f32 {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Primitive(Primitive::F32(*self))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Primitive
    }
}

impl FromJson for f32 {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        token
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| ConvertError::mismatch("number", token))
    }

    fn fallback() -> Option<Self> {
        Some(0.0)
    }
}

impl Reflect for f64 {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Primitive(Primitive::F64(*self))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Primitive
    }
}

impl FromJson for f64 {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        token
            .as_f64()
            .ok_or_else(|| ConvertError::mismatch("number", token))
    }

    fn fallback() -> Option<Self> {
        Some(0.0)
    }
}

impl Reflect for char {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Primitive(Primitive::Char(*self))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Primitive
    }
}

impl FromJson for char {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        let text = token
            .as_str()
            .ok_or_else(|| ConvertError::mismatch("single-character string", token))?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConvertError::invalid(
                "char",
                format!("expected one character, found {:?}", text),
            )),
        }
    }

    fn fallback() -> Option<Self> {
        Some('\0')
    }
}

impl Reflect for str {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Primitive(Primitive::Str(self))
    }
}

impl Reflect for String {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Primitive(Primitive::Str(self))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Primitive
    }
}

impl FromJson for String {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        token
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ConvertError::mismatch("string", token))
    }

    fn fallback() -> Option<Self> {
        Some(String::new())
    }
}

impl Reflect for Cow<'static, str> {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Primitive(Primitive::Str(self))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Primitive
    }
}

impl FromJson for Cow<'static, str> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        String::from_json(token, cx).map(Cow::Owned)
    }

    fn fallback() -> Option<Self> {
        Some(Cow::Borrowed(""))
    }
}

impl Reflect for () {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Null
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Primitive
    }
}

impl FromJson for () {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        if token.is_null() {
            Ok(())
        } else {
            Err(ConvertError::mismatch("null", token))
        }
    }

    fn fallback() -> Option<Self> {
        Some(())
    }
}

// ============================================================================
// Bytes, type literals, dates
// ============================================================================

impl Reflect for Bytes {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Bytes(&self.0)
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::ByteSequence
    }
}

/// The string's UTF-8 bytes, stored verbatim (no base64).
impl FromJson for Bytes {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        token
            .as_str()
            .map(Bytes::from)
            .ok_or_else(|| ConvertError::mismatch("string", token))
    }

    fn fallback() -> Option<Self> {
        Some(Bytes::default())
    }
}

impl Reflect for TypeLiteral {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::TypeLiteral(self.name())
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::TypeLiteral
    }
}

/// Resolves against descriptors already published in the cache, so only
/// described types that have been used at least once can be named.
impl FromJson for TypeLiteral {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        let name = token
            .as_str()
            .ok_or_else(|| ConvertError::mismatch("type name", token))?;
        find_descriptor(name)
            .map(|d| TypeLiteral::from_name(d.type_name()))
            .ok_or_else(|| ConvertError::invalid("TypeLiteral", format!("unknown type `{name}`")))
    }

    /// The unit type stands in for a name that did not resolve.
    fn fallback() -> Option<Self> {
        Some(TypeLiteral::of::<()>())
    }
}

fn parse_naive(text: &str) -> Result<NaiveDateTime, ConvertError> {
    NaiveDateTime::parse_from_str(text, SORTABLE_FRACTION_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.naive_utc()))
        .map_err(|e| ConvertError::invalid("date/time", format!("{text:?}: {e}")))
}

impl Reflect for NaiveDateTime {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::DateTime(Timestamp::DateTime(*self))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::DateTime
    }
}

impl FromJson for NaiveDateTime {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        let text = token
            .as_str()
            .ok_or_else(|| ConvertError::mismatch("date/time string", token))?;
        parse_naive(text)
    }

    fn fallback() -> Option<Self> {
        Some(NaiveDateTime::default())
    }
}

impl Reflect for DateTime<Utc> {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::DateTime(Timestamp::DateTime(self.naive_utc()))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::DateTime
    }
}

impl FromJson for DateTime<Utc> {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        let text = token
            .as_str()
            .ok_or_else(|| ConvertError::mismatch("date/time string", token))?;
        parse_naive(text).map(|naive| naive.and_utc())
    }

    fn fallback() -> Option<Self> {
        Some(DateTime::<Utc>::default())
    }
}

impl Reflect for NaiveDate {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::DateTime(Timestamp::Date(*self))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::DateTime
    }
}

impl FromJson for NaiveDate {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        let text = token
            .as_str()
            .ok_or_else(|| ConvertError::mismatch("date string", token))?;
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .or_else(|_| parse_naive(text).map(|dt| dt.date()))
            .map_err(|_| ConvertError::invalid("date", format!("{text:?} is not a date")))
    }

    fn fallback() -> Option<Self> {
        Some(NaiveDate::default())
    }
}

// ============================================================================
// Wrappers
// ============================================================================

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(&self) -> ValueRef<'_> {
        match self {
            Some(value) => value.reflect(),
            None => ValueRef::Null,
        }
    }

    fn shape_hint() -> ShapeHint {
        T::shape_hint()
    }
}

impl<T: FromJson> FromJson for Option<T> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        if token.is_null() {
            return Ok(None);
        }
        T::from_json(token, cx).map(Some)
    }

    fn fallback() -> Option<Self> {
        Some(None)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn reflect(&self) -> ValueRef<'_> {
        (**self).reflect()
    }

    fn shape_hint() -> ShapeHint {
        T::shape_hint()
    }
}

impl<T: FromJson> FromJson for Box<T> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        T::from_json(token, cx).map(Box::new)
    }

    fn fallback() -> Option<Self> {
        T::fallback().map(Box::new)
    }
}

impl<T: Reflect> Reflect for Rc<T> {
    fn reflect(&self) -> ValueRef<'_> {
        (**self).reflect()
    }

    fn shape_hint() -> ShapeHint {
        T::shape_hint()
    }
}

impl<T: FromJson> FromJson for Rc<T> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        T::from_json(token, cx).map(Rc::new)
    }

    fn fallback() -> Option<Self> {
        T::fallback().map(Rc::new)
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn reflect(&self) -> ValueRef<'_> {
        (**self).reflect()
    }

    fn shape_hint() -> ShapeHint {
        T::shape_hint()
    }
}

impl<T: FromJson> FromJson for Arc<T> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        T::from_json(token, cx).map(Arc::new)
    }

    fn fallback() -> Option<Self> {
        T::fallback().map(Arc::new)
    }
}

impl Reflect for &'static str {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Primitive(Primitive::Str(self))
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Primitive
    }
}

/// A value that is mutably borrowed elsewhere reads as null.
impl<T: Reflect> Reflect for RefCell<T> {
    fn reflect(&self) -> ValueRef<'_> {
        match self.try_borrow() {
            Ok(guard) => ValueRef::Borrowed(std::cell::Ref::map(guard, as_reflect::<T>)),
            Err(_) => ValueRef::Null,
        }
    }

    fn shape_hint() -> ShapeHint {
        T::shape_hint()
    }
}

impl<T: FromJson> FromJson for RefCell<T> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        T::from_json(token, cx).map(RefCell::new)
    }

    fn fallback() -> Option<Self> {
        T::fallback().map(RefCell::new)
    }
}

/// An unset cell reads as null; lets `Rc` graphs close a cycle after
/// construction.
impl<T: Reflect> Reflect for OnceCell<T> {
    fn reflect(&self) -> ValueRef<'_> {
        match self.get() {
            Some(value) => value.reflect(),
            None => ValueRef::Null,
        }
    }

    fn shape_hint() -> ShapeHint {
        T::shape_hint()
    }
}

impl<T: FromJson> FromJson for OnceCell<T> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        let cell = OnceCell::new();
        if !token.is_null() {
            let _ = cell.set(T::from_json(token, cx)?);
        }
        Ok(cell)
    }

    fn fallback() -> Option<Self> {
        Some(OnceCell::new())
    }
}

// ============================================================================
// Sequences
// ============================================================================

/// Materialize each element; a failed element takes the element fallback or
/// is dropped.
fn materialize_elements<T: FromJson>(
    token: &Value,
    cx: &Context,
) -> Result<Vec<T>, ConvertError> {
    let items = token
        .as_array()
        .ok_or_else(|| ConvertError::mismatch("array", token))?;
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match T::from_json(item, cx) {
            Ok(value) => out.push(value),
            Err(err) => {
                log::debug!(
                    "element {index} of {}: {err}",
                    std::any::type_name::<Vec<T>>()
                );
                if let Some(value) = T::fallback() {
                    out.push(value);
                }
            }
        }
    }
    Ok(out)
}

fn elements<'a, T: Reflect>(
    container: &'a (impl Reflect + ?Sized),
    items: impl Iterator<Item = &'a T> + 'a,
) -> ValueRef<'a> {
    let items = items.map(|item| item as &dyn Reflect);
    ValueRef::Sequence(SeqRef::new(Identity::of(container), items))
}

impl<T: Reflect> Reflect for [T] {
    fn reflect(&self) -> ValueRef<'_> {
        elements(self, self.iter())
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect(&self) -> ValueRef<'_> {
        elements(self, self.iter())
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Sequence
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(&self) -> ValueRef<'_> {
        elements(self, self.iter())
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Sequence
    }
}

impl<T: FromJson> FromJson for Vec<T> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        materialize_elements(token, cx)
    }

    fn fallback() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn reflect(&self) -> ValueRef<'_> {
        elements(self, self.iter())
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Sequence
    }
}

impl<T: FromJson> FromJson for VecDeque<T> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        materialize_elements(token, cx).map(VecDeque::from)
    }

    fn fallback() -> Option<Self> {
        Some(VecDeque::new())
    }
}

impl<T: Reflect, S: 'static> Reflect for HashSet<T, S> {
    fn reflect(&self) -> ValueRef<'_> {
        elements(self, self.iter())
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Sequence
    }
}

impl<T, S> FromJson for HashSet<T, S>
where
    T: FromJson + Eq + Hash,
    S: BuildHasher + Default + 'static,
{
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        materialize_elements(token, cx).map(|items| items.into_iter().collect())
    }

    fn fallback() -> Option<Self> {
        Some(HashSet::default())
    }
}

impl<T: Reflect> Reflect for BTreeSet<T> {
    fn reflect(&self) -> ValueRef<'_> {
        elements(self, self.iter())
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Sequence
    }
}

impl<T: FromJson + Ord> FromJson for BTreeSet<T> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        materialize_elements(token, cx).map(|items| items.into_iter().collect())
    }

    fn fallback() -> Option<Self> {
        Some(BTreeSet::new())
    }
}

// ============================================================================
// Dictionaries
// ============================================================================

/// Materialize each entry of an object token; a failed entry takes the value
/// fallback or is dropped.
fn materialize_entries<V: FromJson>(
    token: &Value,
    cx: &Context,
) -> Result<Vec<(String, V)>, ConvertError> {
    let fields = token
        .as_object()
        .ok_or_else(|| ConvertError::mismatch("object", token))?;
    let mut out = Vec::with_capacity(fields.len());
    for (key, item) in fields {
        match V::from_json(item, cx) {
            Ok(value) => out.push((key.clone(), value)),
            Err(err) => {
                log::debug!("entry {key:?} of {}: {err}", std::any::type_name::<V>());
                if let Some(value) = V::fallback() {
                    out.push((key.clone(), value));
                }
            }
        }
    }
    Ok(out)
}

fn entries<'a, V: Reflect>(
    container: &'a (impl Reflect + ?Sized),
    items: impl Iterator<Item = (&'a String, &'a V)> + 'a,
) -> ValueRef<'a> {
    let items = items.map(|(key, value)| (key.as_str(), value as &dyn Reflect));
    ValueRef::Dictionary(MapRef::new(Identity::of(container), items))
}

impl<V: Reflect, S: 'static> Reflect for HashMap<String, V, S> {
    fn reflect(&self) -> ValueRef<'_> {
        entries(self, self.iter())
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Dictionary
    }
}

impl<V, S> FromJson for HashMap<String, V, S>
where
    V: FromJson,
    S: BuildHasher + Default + 'static,
{
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        materialize_entries(token, cx).map(|items| items.into_iter().collect())
    }

    fn fallback() -> Option<Self> {
        Some(HashMap::default())
    }
}

impl<V: Reflect> Reflect for BTreeMap<String, V> {
    fn reflect(&self) -> ValueRef<'_> {
        entries(self, self.iter())
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Dictionary
    }
}

impl<V: FromJson> FromJson for BTreeMap<String, V> {
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError> {
        materialize_entries(token, cx).map(|items| items.into_iter().collect())
    }

    fn fallback() -> Option<Self> {
        Some(BTreeMap::new())
    }
}

// ============================================================================
// Generic token tree
// ============================================================================

impl Reflect for Value {
    fn reflect(&self) -> ValueRef<'_> {
        match self {
            Value::Null => ValueRef::Null,
            Value::Bool(b) => ValueRef::Primitive(Primitive::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ValueRef::Primitive(Primitive::Int(i))
                } else if let Some(u) = n.as_u64() {
                    ValueRef::Primitive(Primitive::UInt(u))
                } else {
                    ValueRef::Primitive(Primitive::F64(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Value::String(s) => ValueRef::Primitive(Primitive::Str(s)),
            Value::Array(items) => elements(items, items.iter()),
            Value::Object(map) => map.reflect(),
        }
    }

    /// Loosely typed; reported under its most general shape.
    fn shape_hint() -> ShapeHint {
        ShapeHint::Dictionary
    }
}

impl FromJson for Value {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        Ok(token.clone())
    }

    fn fallback() -> Option<Self> {
        Some(Value::Null)
    }
}

impl Reflect for Map<String, Value> {
    fn reflect(&self) -> ValueRef<'_> {
        entries(self, self.iter())
    }

    fn shape_hint() -> ShapeHint {
        ShapeHint::Dictionary
    }
}

impl FromJson for Map<String, Value> {
    fn from_json(token: &Value, _cx: &Context) -> Result<Self, ConvertError> {
        token
            .as_object()
            .cloned()
            .ok_or_else(|| ConvertError::mismatch("object", token))
    }

    fn fallback() -> Option<Self> {
        Some(Map::new())
    }
}
