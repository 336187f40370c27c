//! # Flex Object
//!
//! A container for attributes you decide on at runtime. Attach named values
//! when the object is built or later, remove them, and write the JSON-safe
//! part of the object to a string or a file (or load it back).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  FlexObject (object.rs)                                  │
//! │  - set / set_attr / delete / get                         │
//! │  - safe_attributes(): the one filter every output uses   │
//! │  - serialize_to_text / deserialize_from_text             │
//! │  - write_to_file / read_from_file                        │
//! └──────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//!   value.rs              fs.rs                config.rs
//!   AttrValue, Opaque     paths, encoding,     indent, output dir
//!   safety check          JSON read/write      (flex.json)
//! ```
//!
//! ## What gets serialized
//!
//! An attribute is written only if its name does not start with `_` and its
//! value is one of the JSON-shaped [`AttrValue`] variants (null, bool, number,
//! string, list, map). Closures and other Rust values can be stored as
//! [`AttrValue::Opaque`]; they stay on the object but never reach the output.
//!
//! ## Example
//!
//! ```
//! use flex_object::{flex, AttrValue};
//!
//! let mut person = flex! { name: "Ada", age: 36 };
//! person.set([("_secret", 1)]);
//! person.set_attr("greet", AttrValue::opaque(|| "hello"));
//!
//! assert_eq!(
//!     person.serialize_to_text(2).unwrap(),
//!     "{\n  \"name\": \"Ada\",\n  \"age\": 36\n}"
//! );
//! ```
//!
//! ## Module Overview
//!
//! - [`object`]: The [`FlexObject`] container
//! - [`value`]: Attribute value types
//! - [`fs`]: JSON file helpers and default paths
//! - [`config`]: Serialization defaults
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod fs;
pub mod object;
pub mod value;

pub use config::FlexConfig;
pub use error::{FlexError, Result};
pub use object::{is_reserved, FlexObject, RESERVED_PREFIX};
pub use value::{AttrValue, Attributes, Opaque, ValueKind};

/// Build a [`FlexObject`] from named values.
///
/// ```
/// use flex_object::flex;
///
/// let empty = flex!();
/// let config = flex!(Config { debug: true, level: 3 });
/// let person = flex! { name: "Ada", age: 36 };
///
/// assert!(empty.is_empty());
/// assert_eq!(config.type_name(), "Config");
/// assert_eq!(person.len(), 2);
/// ```
#[macro_export]
macro_rules! flex {
    () => {
        $crate::FlexObject::new()
    };
    ($ty:ident { $($name:ident : $value:expr),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut object = $crate::FlexObject::new().with_type_name(stringify!($ty));
        $(object.set_attr(stringify!($name), $value);)*
        object
    }};
    ($($name:ident : $value:expr),+ $(,)?) => {{
        let mut object = $crate::FlexObject::new();
        object.set([$((stringify!($name), $crate::AttrValue::from($value))),+]);
        object
    }};
}
