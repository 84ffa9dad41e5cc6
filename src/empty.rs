//! Emptiness evaluation.
//!
//! A value is empty when it carries no information: `false`, zero, the empty
//! string, an absent optional, an empty collection, or a record all of whose
//! fields are empty. The same predicate drives `omitempty` in the marshaller
//! and is exported for validation code.
//!
//! Record emptiness looks at every field, tagged or not. A record whose only
//! non-empty field is untagged is therefore not empty, even though marshalling
//! it writes nothing but a section header.

use crate::error::CodecError;
use crate::schema::{Reflect, Value};

/// Whether `value` is empty.
///
/// # Examples
///
/// ```
/// use vsphere_cloud_config::is_empty;
///
/// assert!(is_empty(&String::new()).unwrap());
/// assert!(is_empty(&None::<i32>).unwrap());
/// assert!(is_empty(&Some(0_i32)).unwrap());
/// assert!(!is_empty(&443_i32).unwrap());
/// ```
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedKind`] when the value, or any value nested
/// in it that has to be looked at, has no emptiness rule.
pub fn is_empty<T: Reflect + ?Sized>(value: &T) -> Result<bool, CodecError> {
    evaluate(value.reflect())
}

/// Whether `value` is not empty; the negation of [`is_empty`].
///
/// # Errors
///
/// Same as [`is_empty`].
pub fn is_not_empty<T: Reflect + ?Sized>(value: &T) -> Result<bool, CodecError> {
    is_empty(value).map(|empty| !empty)
}

#[allow(clippy::float_cmp)]
pub(crate) fn evaluate(value: Value<'_>) -> Result<bool, CodecError> {
    match value {
        Value::Optional(None) => Ok(true),
        Value::Optional(Some(inner)) => evaluate(inner.reflect()),
        Value::Record(record) => {
            for field in record.fields() {
                if !evaluate(field.value.reflect())? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Value::Array(len) | Value::Seq(len) => Ok(len == 0),
        Value::Str(text) => Ok(text.is_empty()),
        Value::Bool(flag) => Ok(!flag),
        Value::Map(map) => Ok(map.is_empty()),
        Value::Float(number) => Ok(number == 0.0),
        Value::Int(number) => Ok(number == 0),
        Value::Uint(number) => Ok(number == 0),
        Value::Unsupported(kind) => Err(CodecError::UnsupportedKind(kind)),
    }
}
