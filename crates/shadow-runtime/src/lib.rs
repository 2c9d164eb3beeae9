//! # shadow-runtime
//!
//! Drives the external `sops` executable to move document content between
//! its encrypted and plaintext forms.
//!
//! This crate provides:
//! - The `Cipher` trait, the decrypt/encrypt contract used by the shadow manager
//! - `SopsCli`, a `Cipher` backed by `sops` subprocess calls with temp-file staging
//! - The `sops-shadow-editor` helper binary used as the sops editor in encrypt mode
//!
//! ## Example
//!
//! ```ignore
//! use shadow_format::{Format, ShadowConfig};
//! use shadow_runtime::{Cipher, SopsCli};
//!
//! let sops = SopsCli::from_config(&ShadowConfig::default());
//! let encrypted = std::fs::read("secrets.yaml")?;
//! let plaintext = sops.decrypt(&encrypted, Format::Yaml)?;
//!
//! let edited = plaintext.replace("old", "new");
//! let ciphertext = sops.encrypt(&edited, &encrypted, Format::Yaml)?;
//! std::fs::write("secrets.yaml", ciphertext)?;
//! ```

mod cipher;
mod error;
mod sops;

pub use cipher::Cipher;
pub use error::{CryptoError, CryptoResult};
pub use sops::{default_editor_helper, SopsCli, EDITOR_HELPER_NAME, SOURCE_ENV};

// Re-export shadow-format types for convenience
pub use shadow_format::{Format, ShadowConfig};
