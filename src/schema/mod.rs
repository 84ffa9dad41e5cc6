//! Schema visitor: the structural view the codec has of configuration types.
//!
//! The codec never inspects types at runtime. Instead every type that can
//! appear in a configuration implements [`Reflect`], which reports its
//! structural [`Value`] kind, and every record (a struct of named fields)
//! implements [`Record`], which lists its fields in declaration order together
//! with their INI metadata. Decoding goes the other way through [`RecordMut`]
//! and [`FromIni`].
//!
//! Plain structs get all three record traits from [`ini_record!`](crate::ini_record).

mod macros;
mod tag;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

pub use tag::FieldTag;

use crate::error::ValueError;

/// Structural kind of a value, borrowed from the value itself.
#[derive(Clone, Copy)]
pub enum Value<'a> {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    Uint(u64),
    /// A floating-point number.
    Float(f64),
    /// A text string.
    Str(&'a str),
    /// A value that may be absent (`Option`, `Box`).
    Optional(Option<&'a dyn Reflect>),
    /// A nested record.
    Record(&'a dyn Record),
    /// A map from string keys to values.
    Map(&'a dyn MapValue),
    /// A variable-length sequence, with its length.
    Seq(usize),
    /// A fixed-length array, with its length.
    Array(usize),
    /// A kind the codec has no rule for.
    Unsupported(&'static str),
}

impl Value<'_> {
    /// Short name of the kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Optional(_) => "optional",
            Self::Record(_) => "record",
            Self::Map(_) => "map",
            Self::Seq(_) => "slice",
            Self::Array(_) => "array",
            Self::Unsupported(kind) => *kind,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Uint(v) => f.debug_tuple("Uint").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Self::Optional(inner) => f
                .debug_tuple("Optional")
                .field(&inner.map(|value| value.reflect()))
                .finish(),
            Self::Record(record) => f
                .debug_list()
                .entries(record.fields().iter().map(|field| field.ident))
                .finish(),
            Self::Map(map) => f.debug_tuple("Map").field(&map.len()).finish(),
            Self::Seq(len) => f.debug_tuple("Seq").field(len).finish(),
            Self::Array(len) => f.debug_tuple("Array").field(len).finish(),
            Self::Unsupported(kind) => f.debug_tuple("Unsupported").field(kind).finish(),
        }
    }
}

/// Types the codec can look into.
pub trait Reflect {
    /// The structural view of this value.
    fn reflect(&self) -> Value<'_>;
}

/// A struct of named fields, visited in declaration order.
pub trait Record {
    /// All fields of the record, tagged or not, in declaration order.
    fn fields(&self) -> Vec<Field<'_>>;
}

/// A map section: string keys to values.
pub trait MapValue {
    /// Number of entries.
    fn len(&self) -> usize;

    /// Whether the map has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, in the map's iteration order.
    fn entries(&self) -> Vec<(&str, &dyn Reflect)>;
}

/// A record whose tagged properties can be assigned from INI text.
pub trait RecordMut {
    /// Assign `raw` to the property whose resolved name matches `name`.
    ///
    /// `raw` is `None` for a bare variable line (no `=`). Returns `Ok(false)`
    /// when the record has no such property.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] when the text does not convert to the
    /// property's type.
    fn assign(&mut self, name: &str, raw: Option<&str>) -> Result<bool, ValueError>;
}

/// Leaf property types that parse from INI values.
pub trait FromIni: Sized {
    /// Parse the value; `raw` is `None` for a bare variable line.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] when the text is not a valid value.
    fn from_ini(raw: Option<&str>) -> Result<Self, ValueError>;
}

/// One field of a [`Record`].
#[derive(Clone, Copy)]
pub struct Field<'a> {
    /// The field's identifier in the Rust struct.
    pub ident: &'static str,
    /// INI metadata (`name[,omitempty]`), `None` for untagged fields.
    pub metadata: Option<&'static str>,
    /// The field's value.
    pub value: &'a dyn Reflect,
}

impl<'a> Field<'a> {
    /// A field carrying INI metadata.
    #[must_use]
    pub const fn tagged(ident: &'static str, metadata: &'static str, value: &'a dyn Reflect) -> Self {
        Self {
            ident,
            metadata: Some(metadata),
            value,
        }
    }

    /// A field without INI metadata; the codec never writes or reads it.
    #[must_use]
    pub const fn untagged(ident: &'static str, value: &'a dyn Reflect) -> Self {
        Self {
            ident,
            metadata: None,
            value,
        }
    }

    /// Resolved INI name and omission flag, `None` when untagged.
    #[must_use]
    pub fn tag(&self) -> Option<FieldTag<'static>> {
        FieldTag::resolve(self.ident, self.metadata)
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("ident", &self.ident)
            .field("metadata", &self.metadata)
            .field("kind", &self.value.reflect().kind())
            .finish()
    }
}

fn required(raw: Option<&str>) -> Result<&str, ValueError> {
    raw.ok_or_else(|| ValueError::new("missing value"))
}

impl Reflect for bool {
    fn reflect(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl FromIni for bool {
    fn from_ini(raw: Option<&str>) -> Result<Self, ValueError> {
        let Some(text) = raw else {
            return Ok(true);
        };
        match text.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            _ => Err(ValueError::new(format!("invalid boolean {text:?}"))),
        }
    }
}

impl Reflect for String {
    fn reflect(&self) -> Value<'_> {
        Value::Str(self)
    }
}

impl FromIni for String {
    fn from_ini(raw: Option<&str>) -> Result<Self, ValueError> {
        required(raw).map(ToOwned::to_owned)
    }
}

macro_rules! impl_integer {
    ($variant:ident, $wide:ty => $($ty:ty),+) => {
        $(
            impl Reflect for $ty {
                fn reflect(&self) -> Value<'_> {
                    Value::$variant(<$wide>::from(*self))
                }
            }

            impl FromIni for $ty {
                fn from_ini(raw: Option<&str>) -> Result<Self, ValueError> {
                    let text = required(raw)?;
                    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                        Some(hex) => <$ty>::from_str_radix(hex, 16),
                        None => text.parse::<$ty>(),
                    };
                    parsed.map_err(|e| ValueError::new(format!("invalid integer {text:?}: {e}")))
                }
            }
        )+
    };
}

impl_integer!(Int, i64 => i8, i16, i32, i64);
impl_integer!(Uint, u64 => u8, u16, u32, u64);

macro_rules! impl_float {
    ($($ty:ty),+) => {
        $(
            impl Reflect for $ty {
                fn reflect(&self) -> Value<'_> {
                    Value::Float(f64::from(*self))
                }
            }

            impl FromIni for $ty {
                fn from_ini(raw: Option<&str>) -> Result<Self, ValueError> {
                    let text = required(raw)?;
                    text.parse::<$ty>()
                        .map_err(|e| ValueError::new(format!("invalid number {text:?}: {e}")))
                }
            }
        )+
    };
}

impl_float!(f32, f64);

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(&self) -> Value<'_> {
        Value::Optional(self.as_ref().map(|value| value as &dyn Reflect))
    }
}

impl<T: FromIni> FromIni for Option<T> {
    fn from_ini(raw: Option<&str>) -> Result<Self, ValueError> {
        T::from_ini(raw).map(Some)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn reflect(&self) -> Value<'_> {
        Value::Optional(Some(&**self as &dyn Reflect))
    }
}

impl<T> Reflect for Vec<T> {
    fn reflect(&self) -> Value<'_> {
        Value::Seq(self.len())
    }
}

impl<T, const N: usize> Reflect for [T; N] {
    fn reflect(&self) -> Value<'_> {
        Value::Array(N)
    }
}

impl<T: Reflect> Reflect for BTreeMap<String, T> {
    fn reflect(&self) -> Value<'_> {
        Value::Map(self)
    }
}

impl<T: Reflect> MapValue for BTreeMap<String, T> {
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn entries(&self) -> Vec<(&str, &dyn Reflect)> {
        self.iter()
            .map(|(key, value)| (key.as_str(), value as &dyn Reflect))
            .collect()
    }
}

impl<T: Reflect, S: BuildHasher> Reflect for HashMap<String, T, S> {
    fn reflect(&self) -> Value<'_> {
        Value::Map(self)
    }
}

impl<T: Reflect, S: BuildHasher> MapValue for HashMap<String, T, S> {
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn entries(&self) -> Vec<(&str, &dyn Reflect)> {
        self.iter()
            .map(|(key, value)| (key.as_str(), value as &dyn Reflect))
            .collect()
    }
}

impl Reflect for char {
    fn reflect(&self) -> Value<'_> {
        Value::Unsupported("char")
    }
}

impl Reflect for () {
    fn reflect(&self) -> Value<'_> {
        Value::Unsupported("unit")
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bool_parses_git_style_words() {
        assert!(bool::from_ini(Some("yes")).unwrap());
        assert!(bool::from_ini(Some("On")).unwrap());
        assert!(bool::from_ini(Some("TRUE")).unwrap());
        assert!(!bool::from_ini(Some("off")).unwrap());
        assert!(!bool::from_ini(Some("0")).unwrap());
        assert!(!bool::from_ini(Some("")).unwrap());
    }

    #[test]
    fn bare_bool_is_true() {
        assert!(bool::from_ini(None).unwrap());
    }

    #[test]
    fn bool_rejects_garbage() {
        let err = bool::from_ini(Some("maybe")).unwrap_err();
        assert_eq!(err.to_string(), "invalid boolean \"maybe\"");
    }

    #[test]
    fn bare_string_is_an_error() {
        let err = String::from_ini(None).unwrap_err();
        assert_eq!(err.to_string(), "missing value");
    }

    #[test]
    fn integers_accept_decimal_and_hex() {
        assert_eq!(i32::from_ini(Some("443")).unwrap(), 443);
        assert_eq!(i32::from_ini(Some("-3")).unwrap(), -3);
        assert_eq!(u16::from_ini(Some("0x1bb")).unwrap(), 443);
        assert!(i8::from_ini(Some("300")).is_err());
        assert!(u32::from_ini(Some("four")).is_err());
    }

    #[test]
    fn floats_parse() {
        assert!((f64::from_ini(Some("1.5")).unwrap() - 1.5).abs() < f64::EPSILON);
        assert!(f32::from_ini(Some("one")).is_err());
    }

    #[test]
    fn option_wraps_parsed_value() {
        assert_eq!(
            Option::<String>::from_ini(Some("default")).unwrap(),
            Some("default".to_string())
        );
        assert!(Option::<String>::from_ini(None).is_err());
    }

    #[test]
    fn kinds() {
        assert_eq!(true.reflect().kind(), "bool");
        assert_eq!(7_i32.reflect().kind(), "int");
        assert_eq!(7_u8.reflect().kind(), "uint");
        assert_eq!(1.5_f32.reflect().kind(), "float");
        assert_eq!(String::new().reflect().kind(), "string");
        assert_eq!(Some(1_i64).reflect().kind(), "optional");
        assert_eq!(Box::new(1_i64).reflect().kind(), "optional");
        assert_eq!(vec![1_u8].reflect().kind(), "slice");
        assert_eq!([0_u8; 4].reflect().kind(), "array");
        assert_eq!(BTreeMap::<String, bool>::new().reflect().kind(), "map");
        assert_eq!('x'.reflect().kind(), "char");
        assert_eq!(().reflect().kind(), "unit");
    }

    #[test]
    fn map_entries_follow_key_order() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 2_i32);
        map.insert("a".to_string(), 1_i32);
        let keys: Vec<&str> = MapValue::entries(&map).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
        assert!(!MapValue::is_empty(&map));
    }
}
