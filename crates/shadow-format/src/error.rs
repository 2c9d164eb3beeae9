use thiserror::Error;

/// Errors that can occur when decoding or parsing document content.
#[derive(Debug, Error)]
pub enum Error {
    /// Content is not valid UTF-8 text.
    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Structured content could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// TOML parsing error.
    #[error("toml parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for shadow-format operations.
pub type Result<T> = std::result::Result<T, Error>;
