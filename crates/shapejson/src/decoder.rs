//! Decoder: parses JSON text and materializes values from the token tree.
//!
//! Text is always parsed into a `serde_json::Value` first, independent of any
//! target type. Typed entry points then convert that tree through
//! [`FromJson`].
//!
//! # Key design decisions
//!
//! - **Empty input is not an error**: blank text yields `Ok(None)` from every
//!   entry point.
//! - **Malformed text is the only hard failure**: everything after a
//!   successful parse degrades quietly. A member whose token does not fit
//!   keeps its constructed default, unknown keys are skipped, and a target
//!   without a constructor (or a top-level shape mismatch) gives `Ok(None)`.
//! - **Tolerant member lookup**: keys match serialized names exactly first,
//!   then case-insensitively (also against the context's name-case rendering).
//!   Ignored, read-only and hidden non-public members never take part.

use serde_json::Value;

use crate::context::Context;
use crate::descriptor::{descriptor, Describe, PropertyDescriptor};
use crate::error::{ConvertError, Result};
use crate::filter::Options;
use crate::reflect::FromJson;

/// Parse `text` into a loosely-typed token tree. Blank text gives `None`.
pub fn deserialize_value(text: &str) -> Result<Option<Value>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(text)?;
    Ok(Some(value))
}

/// Parse `text` and materialize a `T` with default options.
///
/// ```
/// let items: Option<Vec<u16>> = shapejson::deserialize("[1, 2, \"x\", 4]").unwrap();
/// assert_eq!(items, Some(vec![1, 2, 0, 4]));
/// assert_eq!(shapejson::deserialize::<Vec<u16>>("").unwrap(), None);
/// ```
pub fn deserialize<T: FromJson>(text: &str) -> Result<Option<T>> {
    deserialize_with(text, &Options::default())
}

/// Parse `text` and materialize a `T` under `options`.
pub fn deserialize_with<T: FromJson>(text: &str, options: &Options) -> Result<Option<T>> {
    let Some(token) = deserialize_value(text)? else {
        return Ok(None);
    };
    let cx = Context::new(options.clone());
    Ok(materialize(&token, &cx))
}

/// Convert an already-parsed token, turning a conversion failure into `None`.
pub fn materialize<T: FromJson>(token: &Value, cx: &Context) -> Option<T> {
    match T::from_json(token, cx) {
        Ok(value) => Some(value),
        Err(err) => {
            log::debug!("cannot materialize {}: {err}", std::any::type_name::<T>());
            None
        }
    }
}

/// Build a described object from an object token.
///
/// Runs the registered constructor, then writes each matched member. A member
/// that fails to convert keeps the value the constructor gave it.
pub fn materialize_object<T: Describe>(
    token: &Value,
    cx: &Context,
) -> std::result::Result<T, ConvertError> {
    let descriptor = descriptor::<T>();
    let Some(mut target) = descriptor.construct::<T>() else {
        return Err(ConvertError::NoConstructor(descriptor.type_name()));
    };
    let Value::Object(pairs) = token else {
        return Err(ConvertError::mismatch("object", token));
    };

    let options = cx.options();
    let eligible = |member: &PropertyDescriptor| {
        !member.is_ignored()
            && member.can_write()
            && (member.is_public() || options.include_non_public)
    };
    for (key, value) in pairs {
        let Some(member) = descriptor.find_member_where(key, options.name_case, eligible) else {
            log::trace!("{}: no writable member for key {key:?}", descriptor.type_name());
            continue;
        };
        if let Err(err) = member.write(&mut target, value, cx) {
            log::debug!(
                "{}.{}: {err}; keeping default",
                descriptor.type_name(),
                member.declared_name()
            );
        }
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_none() {
        assert!(deserialize_value("").unwrap().is_none());
        assert!(deserialize_value(" \n\t").unwrap().is_none());
        assert!(deserialize::<i32>("  ").unwrap().is_none());
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(deserialize_value("{\"a\": ").is_err());
        assert!(deserialize::<Vec<i32>>("[1,").is_err());
    }

    #[test]
    fn top_level_mismatch_is_none() {
        assert_eq!(deserialize::<Vec<i32>>("{\"a\": 1}").unwrap(), None);
        assert_eq!(deserialize::<bool>("\"yes\"").unwrap(), None);
    }

    #[test]
    fn generic_tree_keeps_key_order() {
        let value = deserialize_value(r#"{"z": 1, "a": [true, null]}"#)
            .unwrap()
            .unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a"]);
    }
}
