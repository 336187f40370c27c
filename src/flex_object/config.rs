use crate::error::{FlexError, Result};
use encoding_rs::UTF_8;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "flex.json";
pub const DEFAULT_INDENT: usize = 4;

/// Serialization defaults for flexible objects, stored in `flex.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlexConfig {
    /// Spaces per indentation level for JSON output
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Directory for default file paths. When absent, the current working
    /// directory is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_indent() -> usize {
    DEFAULT_INDENT
}

impl Default for FlexConfig {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            output_dir: None,
        }
    }
}

impl FlexConfig {
    /// Read `flex.json` from `config_dir`. A missing file yields the defaults;
    /// an unreadable or malformed one is an error.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let path = config_dir.as_ref().join(CONFIG_FILENAME);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no flex config, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(FlexError::Io(e)),
        };

        let config = serde_json::from_str::<FlexConfig>(&text).map_err(FlexError::Parse)?;
        tracing::debug!(path = %path.display(), indent = config.indent, "loaded flex config");
        Ok(config)
    }

    /// Write `flex.json` into `config_dir`, creating the directory as needed.
    ///
    /// Goes through the same writer as object files, so the config is
    /// formatted with [`DEFAULT_INDENT`] regardless of its own `indent`.
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let dir = config_dir.as_ref();
        fs::create_dir_all(dir)?;
        crate::fs::write_json(&dir.join(CONFIG_FILENAME), self, DEFAULT_INDENT, UTF_8)
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }
}
