use shadow_runtime::CryptoError;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ShadowError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("filesystem error on {}: {}", .path.display(), .source)]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Format(#[from] shadow_format::Error),
    #[error("invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("could not show {}: {}", .path.display(), .source)]
    Show {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no shadow file for {}", .0.display())]
    MissingShadow(PathBuf),
}

impl ShadowError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ShadowError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type ShadowResult<T> = Result<T, ShadowError>;
