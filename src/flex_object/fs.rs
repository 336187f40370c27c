//! JSON file access for flexible objects.
//!
//! Path defaulting, encoding lookup, and the read/write primitives used by
//! [`FlexObject::write_to_file`](crate::FlexObject::write_to_file) and
//! [`FlexObject::read_from_file`](crate::FlexObject::read_from_file).
//!
//! Encodings are looked up by label through [`encoding_rs`]. Besides the
//! WHATWG labels (`utf-8`, `latin1`, `windows-1252`, `shift_jis`, ...) the
//! common spellings `latin-1` and `utf_8` are accepted.

use crate::error::{FlexError, Result};
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const JSON_EXT: &str = ".json";

/// Widest indent honoured; larger values are clamped.
pub const MAX_INDENT: usize = 64;

/// Look up an encoding label. `None` means UTF-8.
pub fn encoding_for_read(label: Option<&str>) -> Result<&'static Encoding> {
    let Some(label) = label else {
        return Ok(UTF_8);
    };
    lookup_label(label).ok_or_else(|| FlexError::UnsupportedEncoding(label.to_string()))
}

/// Look up an encoding label for writing.
///
/// Encodings without an encoder of their own (UTF-16, `replacement`) are
/// rejected rather than silently written as UTF-8.
pub fn encoding_for_write(label: Option<&str>) -> Result<&'static Encoding> {
    let encoding = encoding_for_read(label)?;
    if encoding.output_encoding() != encoding {
        return Err(FlexError::UnsupportedEncoding(encoding.name().to_string()));
    }
    Ok(encoding)
}

fn lookup_label(label: &str) -> Option<&'static Encoding> {
    let label = label.trim().to_ascii_lowercase();
    let dashed = label.replace('_', "-");
    let squashed = dashed.replace('-', "");

    let found = [label.as_str(), dashed.as_str(), squashed.as_str()]
        .into_iter()
        .find_map(|candidate| Encoding::for_label(candidate.as_bytes()));
    found
}

/// Whether `path` names a JSON file we accept as-is.
pub fn has_json_ext(path: &Path) -> bool {
    path.as_os_str()
        .as_encoded_bytes()
        .ends_with(JSON_EXT.as_bytes())
}

/// Default file location for a type: `<dir>/<TypeName>.json`.
///
/// Without a directory the path is relative, so it lands in the current
/// working directory.
pub fn default_path(dir: Option<&Path>, type_name: &str) -> PathBuf {
    let file_name = format!("{}{}", type_name, JSON_EXT);
    match dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Resolve the path to write to, falling back to the default when the given
/// path is empty or lacks the `.json` extension.
pub fn resolve_path(path: &Path, dir: Option<&Path>, type_name: &str) -> PathBuf {
    if path.as_os_str().is_empty() || !has_json_ext(path) {
        let fallback = default_path(dir, type_name);
        tracing::debug!(
            requested = %path.display(),
            resolved = %fallback.display(),
            "using default file path"
        );
        return fallback;
    }
    path.to_path_buf()
}

/// Pretty-print `value` into `writer` with `indent` spaces per level.
pub fn write_pretty<W: Write, T: Serialize + ?Sized>(
    writer: W,
    value: &T,
    indent: usize,
) -> Result<W> {
    let indent = vec![b' '; indent.min(MAX_INDENT)];
    let formatter = PrettyFormatter::with_indent(&indent);
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut ser).map_err(FlexError::Serialization)?;
    Ok(ser.into_inner())
}

/// Pretty-print `value` into a string.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T, indent: usize) -> Result<String> {
    let bytes = write_pretty(Vec::new(), value, indent)?;
    String::from_utf8(bytes)
        .map_err(|e| FlexError::Serialization(<serde_json::Error as serde::ser::Error>::custom(e)))
}

/// Create or truncate `path` and write `value` as pretty JSON in `encoding`.
///
/// The text is encoded before the file is opened, so a value the encoding
/// cannot represent leaves any existing file alone.
pub fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    indent: usize,
    encoding: &'static Encoding,
) -> Result<()> {
    let text = to_pretty_string(value, indent)?;
    let (bytes, _, unmappable) = encoding.encode(&text);
    if unmappable {
        return Err(FlexError::Unencodable {
            encoding: encoding.name(),
        });
    }
    fs::write(path, bytes).map_err(FlexError::Io)
}

/// Read the whole file and decode it. Malformed byte sequences are an error.
pub fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = fs::read(path).map_err(FlexError::Io)?;
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            FlexError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is not valid {}", path.display(), encoding.name()),
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_16LE, WINDOWS_1252};
    use serde_json::json;

    #[test]
    fn no_label_means_utf8() {
        assert_eq!(encoding_for_read(None).unwrap(), UTF_8);
        assert_eq!(encoding_for_write(None).unwrap(), UTF_8);
    }

    #[test]
    fn labels_accept_common_spellings() {
        assert_eq!(encoding_for_read(Some("UTF-8")).unwrap(), UTF_8);
        assert_eq!(encoding_for_read(Some("utf_8")).unwrap(), UTF_8);
        assert_eq!(encoding_for_read(Some("latin-1")).unwrap(), WINDOWS_1252);
        assert_eq!(encoding_for_read(Some("Latin1")).unwrap(), WINDOWS_1252);
        assert_eq!(encoding_for_read(Some("utf-16le")).unwrap(), UTF_16LE);
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let err = encoding_for_read(Some("klingon")).unwrap_err();
        assert!(matches!(err, FlexError::UnsupportedEncoding(name) if name == "klingon"));
    }

    #[test]
    fn utf16_is_readable_but_not_writable() {
        assert!(encoding_for_read(Some("utf-16le")).is_ok());
        let err = encoding_for_write(Some("utf-16le")).unwrap_err();
        assert!(matches!(err, FlexError::UnsupportedEncoding(_)));
    }

    #[test]
    fn json_path_is_kept() {
        let path = Path::new("out/data.json");
        assert_eq!(resolve_path(path, None, "Widget"), PathBuf::from("out/data.json"));
    }

    #[test]
    fn empty_path_falls_back_to_type_name() {
        assert_eq!(resolve_path(Path::new(""), None, "Widget"), PathBuf::from("Widget.json"));
    }

    #[test]
    fn wrong_extension_falls_back_to_type_name() {
        let dir = Path::new("/tmp/flex");
        assert_eq!(
            resolve_path(Path::new("data.txt"), Some(dir), "Config"),
            PathBuf::from("/tmp/flex/Config.json")
        );
    }

    #[test]
    fn extension_check_is_case_sensitive() {
        assert!(has_json_ext(Path::new("a.json")));
        assert!(!has_json_ext(Path::new("a.JSON")));
        assert!(!has_json_ext(Path::new("a.jsonl")));
    }

    #[test]
    fn write_pretty_uses_requested_indent() {
        let out = to_pretty_string(&json!({"a": [1]}), 2).unwrap();
        assert_eq!(out, "{\n  \"a\": [\n    1\n  ]\n}");
    }

    #[test]
    fn write_pretty_zero_indent_keeps_newlines() {
        let out = to_pretty_string(&json!({"a": 1, "b": 2}), 0).unwrap();
        assert_eq!(out, "{\n\"a\": 1,\n\"b\": 2\n}");
    }

    #[test]
    fn huge_indent_is_clamped() {
        assert_eq!(to_pretty_string(&json!({}), usize::MAX).unwrap(), "{}");

        let out = to_pretty_string(&json!({"a": 1}), usize::MAX).unwrap();
        let expected = format!("{{\n{}\"a\": 1\n}}", " ".repeat(MAX_INDENT));
        assert_eq!(out, expected);
    }

    #[test]
    fn write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        write_json(&path, &json!({"k": "v"}), 4, UTF_8).unwrap();
        assert_eq!(read_text(&path, UTF_8).unwrap(), "{\n    \"k\": \"v\"\n}");
    }

    #[test]
    fn write_latin1_produces_single_byte_chars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        write_json(&path, &json!({"k": "é"}), 0, WINDOWS_1252).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.contains(&0xE9));
        assert_eq!(read_text(&path, WINDOWS_1252).unwrap(), "{\n\"k\": \"é\"\n}");
    }

    #[test]
    fn unmappable_text_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        fs::write(&path, "old").unwrap();

        let err = write_json(&path, &json!({"k": "日本"}), 4, WINDOWS_1252).unwrap_err();
        assert!(matches!(err, FlexError::Unencodable { encoding: "windows-1252" }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn invalid_utf8_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        fs::write(&path, [b'{', 0xFF, b'}']).unwrap();

        let err = read_text(&path, UTF_8).unwrap_err();
        assert!(matches!(err, FlexError::Io(e) if e.kind() == io::ErrorKind::InvalidData));
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text(&dir.path().join("missing.json"), UTF_8).unwrap_err();
        assert!(matches!(err, FlexError::Io(_)));
    }
}
