use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlexError {
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Expected a JSON object at the top level, found {found}")]
    NotAnObject { found: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Text cannot be represented in {encoding}")]
    Unencodable { encoding: &'static str },

    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlexError>;
