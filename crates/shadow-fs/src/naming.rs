use shadow_format::DEFAULT_SHADOW_PREFIX;
use std::path::{Path, PathBuf};

/// Maps encrypted files to their shadow files and back.
///
/// A shadow lives next to its encrypted file and carries the same base name
/// behind a reserved prefix, so there is at most one shadow per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowNaming {
    prefix: String,
}

impl Default for ShadowNaming {
    fn default() -> Self {
        Self::new(DEFAULT_SHADOW_PREFIX)
    }
}

impl ShadowNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Shadow path for an encrypted file. `None` when the path has no file name.
    pub fn shadow_path_for(&self, encrypted: &Path) -> Option<PathBuf> {
        let file_name = encrypted.file_name()?.to_str()?;
        let shadow_name = format!("{}{}", self.prefix, file_name);
        Some(match encrypted.parent() {
            Some(parent) => parent.join(shadow_name),
            None => PathBuf::from(shadow_name),
        })
    }

    pub fn is_shadow(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(self.prefix.as_str()))
            .map_or(false, |rest| !rest.is_empty())
    }

    /// Encrypted file a shadow belongs to.
    pub fn encrypted_path_for(&self, shadow: &Path) -> Option<PathBuf> {
        let file_name = shadow.file_name()?.to_str()?;
        let original = file_name.strip_prefix(self.prefix.as_str())?;
        if original.is_empty() {
            return None;
        }
        Some(match shadow.parent() {
            Some(parent) => parent.join(original),
            None => PathBuf::from(original),
        })
    }
}
