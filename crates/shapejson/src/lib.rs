//! # shapejson
//!
//! Shape-driven JSON encoder and decoder for registered Rust types.
//!
//! Every value is first classified into a coarse shape (null, type literal,
//! byte sequence, primitive, date/time, dictionary, sequence, object) and the
//! shape decides how it is written or read back. Object types register their
//! members once through [`Describe`]; the resulting [`TypeDescriptor`] is
//! cached process-wide and shared by both directions.
//!
//! ## Quick start
//!
//! ```rust
//! use shapejson::{deserialize, reflect_object, serialize, Describe, Options, TypeBuilder};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Item {
//!     id: i64,
//!     properties: Vec<String>,
//! }
//!
//! impl Describe for Item {
//!     fn describe(ty: &mut TypeBuilder<Self>) {
//!         ty.constructor(Item::default);
//!         ty.field("Id", |i| &i.id, |i| &mut i.id);
//!         ty.field("Properties", |i| &i.properties, |i| &mut i.properties);
//!     }
//! }
//! reflect_object!(Item);
//!
//! let item = Item { id: 1, properties: vec!["One".into(), "Two".into()] };
//! let json = serialize(&item, &Options::compact());
//! assert_eq!(json, r#"{"Id": 1,"Properties": ["One","Two"]}"#);
//!
//! // JSON → value (roundtrip)
//! let back: Option<Item> = deserialize(&json).unwrap();
//! assert_eq!(back, Some(item));
//! ```
//!
//! ## Modules
//!
//! - [`descriptor`]: type descriptor cache and member registration
//! - [`classify`]: shape classification of values and tokens
//! - [`encoder`]: value → JSON text
//! - [`decoder`]: JSON text → value
//! - [`context`]: per-call options and ancestor stack
//! - [`filter`]: `Options`, member-name filters and casing
//! - [`error`]: error types for parse and conversion failures
//! - [`types`]: shape views handed from values to the encoder

pub mod classify;
pub mod context;
pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod filter;
mod impls;
pub mod reflect;
pub mod types;

pub use classify::{classify, classify_token, Shape};
pub use context::Context;
pub use decoder::{deserialize, deserialize_value, deserialize_with};
pub use descriptor::{
    descriptor, find_descriptor, Describe, MemberDirectives, PropertyDescriptor, TypeBuilder,
    TypeDescriptor,
};
pub use encoder::{serialize, serialize_excluding, serialize_in, serialize_only, ToJson};
pub use error::{ConvertError, Result, ShapeError};
pub use filter::{NameCase, NameFilter, Options};
pub use reflect::{FromJson, Reflect};
pub use serde_json::Value;
pub use types::{
    Bytes, Identity, MapRef, ObjectRef, Primitive, SeqRef, ShapeHint, Timestamp, TypeLiteral,
    ValueRef,
};
