//! Attribute value types.
//!
//! This module defines the runtime representation of attribute values held by a
//! [`FlexObject`](crate::FlexObject). Every value is one of the JSON-shaped
//! variants or an [`Opaque`] payload for anything JSON cannot express.

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Error as _, Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Insertion-ordered mapping of attribute names to values.
pub type Attributes = IndexMap<String, AttrValue>;

/// Runtime representation of an attribute value.
///
/// The JSON-shaped variants are the safe set: they can be written out and read
/// back. `Opaque` holds everything else and is never serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Absence of a value (`null`)
    Null,

    Bool(bool),

    /// Integer that fits in an `i64`
    Int(i64),

    /// Integer above `i64::MAX`
    UInt(u64),

    /// Floating-point number. Only finite values are serializable.
    Float(f64),

    Str(String),

    /// Ordered sequence
    List(Vec<AttrValue>),

    /// String-keyed mapping, in insertion order
    Map(Attributes),

    /// Anything outside the safe set (closures, custom structs, handles)
    Opaque(Opaque),
}

/// Variant tag of an [`AttrValue`], used for logging and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Str,
    List,
    Map,
    Opaque,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Opaque => "opaque",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AttrValue {
    /// Wrap an arbitrary value as an opaque attribute.
    pub fn opaque<T: Any>(value: T) -> Self {
        AttrValue::Opaque(Opaque::new(value))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            AttrValue::Null => ValueKind::Null,
            AttrValue::Bool(_) => ValueKind::Bool,
            AttrValue::Int(_) => ValueKind::Int,
            AttrValue::UInt(_) => ValueKind::UInt,
            AttrValue::Float(_) => ValueKind::Float,
            AttrValue::Str(_) => ValueKind::Str,
            AttrValue::List(_) => ValueKind::List,
            AttrValue::Map(_) => ValueKind::Map,
            AttrValue::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Check whether this value can be written as JSON and read back unchanged.
    ///
    /// - Null, Bool, Int, UInt, Str: always
    /// - Float: only when finite
    /// - List, Map: only when every element is safe
    /// - Opaque: never
    pub fn is_json_safe(&self) -> bool {
        match self {
            AttrValue::Null
            | AttrValue::Bool(_)
            | AttrValue::Int(_)
            | AttrValue::UInt(_)
            | AttrValue::Str(_) => true,
            AttrValue::Float(v) => v.is_finite(),
            AttrValue::List(items) => items.iter().all(AttrValue::is_json_safe),
            AttrValue::Map(entries) => entries.values().all(AttrValue::is_json_safe),
            AttrValue::Opaque(_) => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get a non-negative integer as `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttrValue::Int(v) => u64::try_from(*v).ok(),
            AttrValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the number as `f64`, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            AttrValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            AttrValue::Opaque(o) => Some(o),
            _ => None,
        }
    }
}

/// A value outside the JSON-safe set.
///
/// Stored behind a shared pointer so attributes stay cheap to clone. Two
/// opaque values are equal only if they share the same allocation.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Rc<dyn Any>,
}

impl Opaque {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Rc::new(value),
        }
    }

    /// Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Null => serializer.serialize_unit(),
            AttrValue::Bool(v) => serializer.serialize_bool(*v),
            AttrValue::Int(v) => serializer.serialize_i64(*v),
            AttrValue::UInt(v) => serializer.serialize_u64(*v),
            AttrValue::Float(v) => serializer.serialize_f64(*v),
            AttrValue::Str(s) => serializer.serialize_str(s),
            AttrValue::List(items) => serializer.collect_seq(items),
            AttrValue::Map(entries) => serializer.collect_map(entries),
            AttrValue::Opaque(o) => Err(S::Error::custom(format!(
                "opaque value of type {} is not serializable",
                o.type_name()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(AttrValue::from)
    }
}

impl From<serde_json::Value> for AttrValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => AttrValue::Null,
            Value::Bool(v) => AttrValue::Bool(v),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttrValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    AttrValue::UInt(u)
                } else {
                    // Fractions, and integers outside both integer ranges
                    n.as_f64().map_or(AttrValue::Null, AttrValue::Float)
                }
            }
            Value::String(s) => AttrValue::Str(s),
            Value::Array(items) => AttrValue::List(items.into_iter().map(AttrValue::from).collect()),
            Value::Object(entries) => AttrValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, AttrValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<()> for AttrValue {
    fn from(_: ()) -> Self {
        AttrValue::Null
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttrValue {
                fn from(v: $ty) -> Self {
                    AttrValue::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for AttrValue {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(AttrValue::UInt(v), AttrValue::Int)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        AttrValue::Float(f64::from(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(items: Vec<T>) -> Self {
        AttrValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Attributes> for AttrValue {
    fn from(entries: Attributes) -> Self {
        AttrValue::Map(entries)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(AttrValue::Null, Into::into)
    }
}

impl From<Opaque> for AttrValue {
    fn from(o: Opaque) -> Self {
        AttrValue::Opaque(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Point {
        x: i32,
    }

    #[test]
    fn primitives_are_json_safe() {
        assert!(AttrValue::Null.is_json_safe());
        assert!(AttrValue::Bool(false).is_json_safe());
        assert!(AttrValue::Int(-3).is_json_safe());
        assert!(AttrValue::Float(1.5).is_json_safe());
        assert!(AttrValue::from("text").is_json_safe());
    }

    #[test]
    fn opaque_is_not_json_safe() {
        assert!(!AttrValue::opaque(Point { x: 1 }).is_json_safe());
        assert!(!AttrValue::opaque(|n: i32| n + 1).is_json_safe());
    }

    #[test]
    fn non_finite_floats_are_not_json_safe() {
        assert!(!AttrValue::Float(f64::NAN).is_json_safe());
        assert!(!AttrValue::Float(f64::INFINITY).is_json_safe());
    }

    #[test]
    fn containers_are_safe_only_when_every_element_is() {
        let clean = AttrValue::from(vec![1, 2, 3]);
        assert!(clean.is_json_safe());

        let tainted = AttrValue::List(vec![AttrValue::Int(1), AttrValue::opaque(Point { x: 2 })]);
        assert!(!tainted.is_json_safe());

        let mut entries = Attributes::new();
        entries.insert("inner".into(), tainted);
        assert!(!AttrValue::Map(entries).is_json_safe());
    }

    #[test]
    fn opaque_downcasts_to_original_type() {
        let value = AttrValue::opaque(Point { x: 7 });
        let point = value.as_opaque().and_then(|o| o.downcast_ref::<Point>());
        assert_eq!(point.map(|p| p.x), Some(7));
        assert!(value.as_opaque().unwrap().type_name().ends_with("Point"));
    }

    #[test]
    fn opaque_equality_is_identity() {
        let a = AttrValue::opaque(Point { x: 1 });
        let b = AttrValue::opaque(Point { x: 1 });
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn from_json_maps_numbers_by_shape() {
        assert_eq!(AttrValue::from(json!(36)), AttrValue::Int(36));
        assert_eq!(AttrValue::from(json!(2.5)), AttrValue::Float(2.5));
        assert_eq!(AttrValue::from(json!(u64::MAX)), AttrValue::UInt(u64::MAX));
        assert_eq!(AttrValue::from(json!(-1.5e300)), AttrValue::Float(-1.5e300));
    }

    #[test]
    fn from_json_keeps_object_order() {
        let value = AttrValue::from(json!({"b": 1, "a": [true, null]}));
        let keys: Vec<&str> = value.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(
            value.as_map().unwrap()["a"],
            AttrValue::List(vec![AttrValue::Bool(true), AttrValue::Null])
        );
    }

    #[test]
    fn serialize_safe_value() {
        let value = AttrValue::from(json!({"name": "Ada", "scores": [1, 2.5]}));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"name":"Ada","scores":[1,2.5]}"#
        );
    }

    #[test]
    fn from_u64_picks_narrowest_integer() {
        assert_eq!(AttrValue::from(5u64), AttrValue::Int(5));
        assert_eq!(AttrValue::from(u64::MAX), AttrValue::UInt(u64::MAX));
        assert!(AttrValue::UInt(u64::MAX).is_json_safe());
        assert_eq!(serde_json::to_string(&AttrValue::UInt(u64::MAX)).unwrap(), "18446744073709551615");
    }

    #[test]
    fn serialize_opaque_fails() {
        let value = AttrValue::opaque(Point { x: 1 });
        let err = serde_json::to_string(&value).unwrap_err();
        assert!(err.to_string().contains("not serializable"));
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(AttrValue::from(None::<i32>), AttrValue::Null);
        assert_eq!(AttrValue::from(Some("x")), AttrValue::from("x"));
    }

    #[test]
    fn accessors_match_variant() {
        assert_eq!(AttrValue::Int(4).as_f64(), Some(4.0));
        assert_eq!(AttrValue::UInt(u64::MAX).as_f64(), Some(u64::MAX as f64));
        assert_eq!(AttrValue::UInt(u64::MAX).as_u64(), Some(u64::MAX));
        assert_eq!(AttrValue::Int(-1).as_u64(), None);
        assert!(AttrValue::Null.is_null());
        assert!(!AttrValue::Bool(false).is_null());
        assert_eq!(AttrValue::Bool(false).as_bool(), Some(false));
        assert_eq!(AttrValue::Int(0).as_bool(), None);
        assert_eq!(
            AttrValue::from(vec![1, 2]).as_list(),
            Some(&[AttrValue::Int(1), AttrValue::Int(2)][..])
        );
        assert_eq!(AttrValue::Null.as_list(), None);
        assert_eq!(AttrValue::Int(4).as_i64(), Some(4));
        assert_eq!(AttrValue::Bool(true).as_i64(), None);
        assert_eq!(AttrValue::from("s").as_str(), Some("s"));
        assert_eq!(AttrValue::Null.kind(), ValueKind::Null);
        assert_eq!(AttrValue::opaque(()).kind().to_string(), "opaque");
        assert_eq!(AttrValue::UInt(1).kind().as_str(), "uint");
        assert_eq!(AttrValue::from("s").kind().as_str(), "string");
    }
}
