//! The two traits every (de)serializable type implements.
//!
//! [`Reflect`] answers "what shape is this value" for the encoder, and
//! [`FromJson`] builds a value back from a token. Implementations for std,
//! chrono and serde_json types live in [`crate::impls`]; user structs get both
//! through [`reflect_object!`](crate::reflect_object) and a
//! [`Describe`](crate::Describe) impl, user enums through
//! [`reflect_enum!`](crate::reflect_enum).

use std::any::Any;

use serde_json::Value;

use crate::context::Context;
use crate::error::ConvertError;
use crate::types::{ShapeHint, ValueRef};

/// Runtime shape view of a value.
pub trait Reflect: Any {
    /// Borrowed view of this value's current shape and contents.
    fn reflect(&self) -> ValueRef<'_>;

    /// Coarse shape of the implementing type, independent of any instance.
    fn shape_hint() -> ShapeHint
    where
        Self: Sized,
    {
        ShapeHint::Object
    }
}

/// Materialization of a value from a generic JSON token.
pub trait FromJson: Sized + 'static {
    /// Convert `token` into `Self`, or report why it does not fit.
    fn from_json(token: &Value, cx: &Context) -> Result<Self, ConvertError>;

    /// Stand-in used when conversion of an element fails. Types without a
    /// meaningful default return `None` and the element is dropped.
    fn fallback() -> Option<Self> {
        None
    }
}

/// Wire a [`Describe`](crate::Describe) type into the codec.
///
/// Implements [`Reflect`] (the value is viewed as an object through its cached
/// descriptor) and [`FromJson`] (members are written through the descriptor
/// after the registered constructor runs).
///
/// ```
/// use shapejson::{reflect_object, Describe, TypeBuilder};
///
/// #[derive(Default)]
/// struct Point { x: i32, y: i32 }
///
/// impl Describe for Point {
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.constructor(Point::default);
///         ty.field("X", |p| &p.x, |p| &mut p.x);
///         ty.field("Y", |p| &p.y, |p| &mut p.y);
///     }
/// }
/// reflect_object!(Point);
///
/// let opts = shapejson::Options::default();
/// assert_eq!(shapejson::serialize(&Point { x: 1, y: 2 }, &opts), r#"{"X": 1,"Y": 2}"#);
/// ```
#[macro_export]
macro_rules! reflect_object {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Reflect for $ty {
                fn reflect(&self) -> $crate::ValueRef<'_> {
                    $crate::ValueRef::object(self)
                }

                fn shape_hint() -> $crate::ShapeHint
                where
                    Self: Sized,
                {
                    $crate::ShapeHint::Object
                }
            }

            impl $crate::FromJson for $ty {
                fn from_json(
                    token: &$crate::Value,
                    cx: &$crate::Context,
                ) -> ::std::result::Result<Self, $crate::ConvertError> {
                    $crate::decoder::materialize_object::<Self>(token, cx)
                }

                fn fallback() -> ::std::option::Option<Self> {
                    $crate::descriptor::<Self>().construct::<Self>()
                }
            }
        )+
    };
}

/// Register a field-less enum as a symbolic primitive.
///
/// Variants serialize as their name and deserialize from it
/// (case-insensitively). The first variant is the fallback.
///
/// ```
/// use shapejson::reflect_enum;
///
/// #[derive(Debug, PartialEq)]
/// enum Color { Red, Green }
/// reflect_enum!(Color { Red, Green });
///
/// let opts = shapejson::Options::default();
/// assert_eq!(shapejson::serialize(&vec![Color::Green], &opts), r#"["Green"]"#);
/// assert_eq!(shapejson::deserialize::<Color>(r#""red""#).unwrap(), Some(Color::Red));
/// ```
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ident { $first:ident $(, $rest:ident)* $(,)? }) => {
        impl $crate::Reflect for $ty {
            fn reflect(&self) -> $crate::ValueRef<'_> {
                let name = match self {
                    $ty::$first => stringify!($first),
                    $($ty::$rest => stringify!($rest),)*
                };
                $crate::ValueRef::Primitive($crate::Primitive::Enum(name))
            }

            fn shape_hint() -> $crate::ShapeHint
            where
                Self: Sized,
            {
                $crate::ShapeHint::Enum
            }
        }

        impl $crate::FromJson for $ty {
            fn from_json(
                token: &$crate::Value,
                _cx: &$crate::Context,
            ) -> ::std::result::Result<Self, $crate::ConvertError> {
                let name = match token {
                    $crate::Value::String(name) => name.as_str(),
                    other => return Err($crate::ConvertError::mismatch("enum variant name", other)),
                };
                if name.eq_ignore_ascii_case(stringify!($first)) {
                    return Ok($ty::$first);
                }
                $(
                    if name.eq_ignore_ascii_case(stringify!($rest)) {
                        return Ok($ty::$rest);
                    }
                )*
                Err($crate::ConvertError::invalid(
                    ::std::any::type_name::<$ty>(),
                    format!("unknown variant `{}`", name),
                ))
            }

            fn fallback() -> ::std::option::Option<Self> {
                Some($ty::$first)
            }
        }
    };
}

/// Coerce a concrete reference into a `'static` trait object; used with
/// `Ref::map` so the mapped guard has a nameable type.
pub(crate) fn as_reflect<T: Reflect>(value: &T) -> &(dyn Reflect + 'static) {
    value
}
