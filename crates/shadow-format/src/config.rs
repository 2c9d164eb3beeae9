//! Configuration for the shadow tooling.
//!
//! ```toml
//! sops_binary = "/usr/local/bin/sops"
//! editor_helper = "/usr/local/bin/sops-shadow-editor"
//! shadow_prefix = ".decrypted~"
//! tie_policy = "skip"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the external sops executable.
pub const DEFAULT_SOPS_BINARY: &str = "sops";

/// Default file name prefix of a shadow file.
pub const DEFAULT_SHADOW_PREFIX: &str = ".decrypted~";

/// What to do when both sides share a modification time but differ in content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TiePolicy {
    /// Leave both files untouched.
    #[default]
    Skip,
    /// Refresh the shadow from the encrypted file.
    PreferEncrypted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadowConfig {
    /// Path or name of the sops executable.
    pub sops_binary: PathBuf,
    /// Helper program sops runs as its editor in encrypt mode.
    pub editor_helper: Option<PathBuf>,
    /// File name prefix marking a shadow file.
    pub shadow_prefix: String,
    /// Policy for equal timestamps with differing content.
    pub tie_policy: TiePolicy,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            sops_binary: PathBuf::from(DEFAULT_SOPS_BINARY),
            editor_helper: None,
            shadow_prefix: DEFAULT_SHADOW_PREFIX.to_string(),
            tie_policy: TiePolicy::default(),
        }
    }
}

impl ShadowConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ShadowConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.shadow_prefix.is_empty() {
            return Err(Error::Config("shadow_prefix cannot be empty".to_string()));
        }
        if self.shadow_prefix.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "shadow_prefix must not contain path separators: {}",
                self.shadow_prefix
            )));
        }
        if self.sops_binary.as_os_str().is_empty() {
            return Err(Error::Config("sops_binary cannot be empty".to_string()));
        }
        Ok(())
    }
}
