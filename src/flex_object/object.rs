//! # Flexible Objects
//!
//! A [`FlexObject`] holds named attributes that can be attached at any time and
//! written to JSON. Only part of what an object holds is ever serialized:
//!
//! - Names starting with [`RESERVED_PREFIX`] are private. Bulk set skips them,
//!   so they are never stored and never written.
//! - Values must be JSON-safe (see [`AttrValue::is_json_safe`]). Anything else
//!   stays on the object but is left out of the output.
//!
//! [`FlexObject::safe_attributes`] applies both rules and is the only source
//! of data for the string, file, and `serde` outputs.
//!
//! ## Loading
//!
//! Loading parses the whole payload before touching the object. A parse error
//! or a non-object payload leaves the attributes exactly as they were; a
//! successful load goes through [`FlexObject::set`], so reserved names in the
//! input are dropped and other names overwrite.

use crate::config::FlexConfig;
use crate::error::{FlexError, Result};
use crate::fs;
use crate::value::{AttrValue, Attributes};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// Prefix marking an attribute name as private.
pub const RESERVED_PREFIX: char = '_';

const DEFAULT_TYPE_NAME: &str = "FlexObject";

/// Whether `name` is private and must never be stored by `set` or serialized.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// A container of named attributes with JSON-safe serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexObject {
    type_name: Cow<'static, str>,
    attrs: Attributes,
    config: FlexConfig,
}

impl Default for FlexObject {
    fn default() -> Self {
        Self {
            type_name: Cow::Borrowed(DEFAULT_TYPE_NAME),
            attrs: Attributes::new(),
            config: FlexConfig::default(),
        }
    }
}

impl FlexObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an object and bulk-set the given attributes.
    pub fn from_attrs<I, K, V>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttrValue>,
    {
        let mut object = Self::new();
        object.set(attrs);
        object
    }

    /// Set the type name used for the default file path (e.g. `Widget` →
    /// `Widget.json`).
    pub fn with_type_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.type_name = name.into();
        self
    }

    pub fn with_config(mut self, config: FlexConfig) -> Self {
        self.config = config;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn config(&self) -> &FlexConfig {
        &self.config
    }

    /// Bulk-set attributes.
    ///
    /// Each entry overwrites any attribute with the same name. Entries whose
    /// name starts with the reserved prefix are skipped.
    pub fn set<I, K, V>(&mut self, attrs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttrValue>,
    {
        for (name, value) in attrs {
            self.set_attr(name, value);
        }
    }

    /// Set a single attribute. Returns `false` if the name is reserved and
    /// nothing was stored.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> bool {
        let name = name.into();
        if is_reserved(&name) {
            tracing::debug!(name = %name, "skipping reserved attribute");
            return false;
        }
        self.attrs.insert(name, value.into());
        true
    }

    /// Remove the named attributes. Names that are not present are ignored.
    pub fn delete<I, N>(&mut self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        for name in names {
            self.attrs.shift_remove(name.as_ref());
        }
    }

    /// Remove attributes named by untyped values.
    ///
    /// Only string values are treated as names; everything else is ignored.
    pub fn delete_values(&mut self, names: &[AttrValue]) {
        self.delete(names.iter().filter_map(AttrValue::as_str));
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttrValue> {
        self.attrs.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Iterate over all attributes, safe or not, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }

    /// Attributes eligible for serialization, in insertion order.
    pub fn safe_attributes(&self) -> Attributes {
        self.attrs
            .iter()
            .filter(|(name, value)| {
                let keep = !is_reserved(name) && value.is_json_safe();
                if !keep {
                    tracing::trace!(name = %name, kind = %value.kind(), "attribute not serialized");
                }
                keep
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Render the safe attributes as pretty JSON with `indent` spaces per level.
    pub fn serialize_to_text(&self, indent: usize) -> Result<String> {
        fs::to_pretty_string(&self.safe_attributes(), indent)
    }

    /// Render the safe attributes using the configured indent.
    pub fn to_json_string(&self) -> Result<String> {
        self.serialize_to_text(self.config.indent)
    }

    /// Load attributes from JSON text. The top level must be an object.
    pub fn deserialize_from_text(&mut self, text: &str) -> Result<()> {
        let parsed: serde_json::Value = serde_json::from_str(text).map_err(FlexError::Parse)?;
        let entries = match parsed {
            serde_json::Value::Object(entries) => entries,
            other => {
                return Err(FlexError::NotAnObject {
                    found: json_kind(&other),
                })
            }
        };

        tracing::debug!(count = entries.len(), "loading attributes from JSON");
        self.set(entries.into_iter().map(|(name, value)| (name, AttrValue::from(value))));
        Ok(())
    }

    /// Path used by [`write_to_file`](Self::write_to_file) when no valid path is given.
    pub fn default_file_path(&self) -> PathBuf {
        fs::default_path(self.config.output_dir(), &self.type_name)
    }

    /// Write the safe attributes to a JSON file and return the path written.
    ///
    /// An empty path, or one that does not end in `.json`, is replaced by
    /// [`default_file_path`](Self::default_file_path). `encoding` is an
    /// `encoding_rs` label such as `"latin-1"`; `None` writes UTF-8.
    pub fn write_to_file<P: AsRef<Path>>(
        &self,
        path: P,
        indent: usize,
        encoding: Option<&str>,
    ) -> Result<PathBuf> {
        let encoding = fs::encoding_for_write(encoding)?;
        let path = fs::resolve_path(path.as_ref(), self.config.output_dir(), &self.type_name);

        let attrs = self.safe_attributes();
        fs::write_json(&path, &attrs, indent, encoding)?;
        tracing::debug!(path = %path.display(), count = attrs.len(), "wrote attributes");
        Ok(path)
    }

    /// Load attributes from a JSON file. The top level must be an object.
    pub fn read_from_file<P: AsRef<Path>>(&mut self, path: P, encoding: Option<&str>) -> Result<()> {
        let encoding = fs::encoding_for_read(encoding)?;
        let path = path.as_ref();
        let text = fs::read_text(path, encoding)?;
        tracing::debug!(path = %path.display(), "read attributes file");
        self.deserialize_from_text(&text)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for FlexObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_attrs(iter)
    }
}

impl<K: Into<String>, V: Into<AttrValue>> Extend<(K, V)> for FlexObject {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.set(iter);
    }
}

impl Serialize for FlexObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(&self.safe_attributes())
    }
}

impl fmt::Display for FlexObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_json_string().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
