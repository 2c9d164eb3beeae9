use std::io;
use std::process::ExitStatus;

/// Errors raised while running the external encryption tool.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The tool could not be started (missing binary, permissions).
    #[error("failed to launch {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    /// The tool reported an error on stderr or exited unsuccessfully.
    #[error("sops failed ({status}): {stderr}")]
    Subprocess { status: ExitStatus, stderr: String },

    /// The tool succeeded but produced nothing.
    #[error("sops produced empty output")]
    EmptyOutput,

    /// The decrypted output is not text.
    #[error("sops output is not valid UTF-8")]
    InvalidUtf8,

    /// Staging or reading back a temp file failed.
    #[error("temp file error: {0}")]
    Filesystem(#[from] io::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
