//! # shadow-format
//!
//! Content handling for sops-encrypted YAML/JSON documents.
//!
//! This crate provides:
//! - `Format` detection from file extensions and host language ids
//! - Strict UTF-8 decoding and structured parsing of document content
//! - Detection of the sops metadata marker (`sops.version`)
//! - BLAKE3 content checksums used for change detection
//! - `ShadowConfig`, the TOML-backed configuration shared by the other crates
//!
//! ## Example
//!
//! ```ignore
//! use shadow_format::{checksum, is_encryption_marker_present, Format};
//!
//! let bytes = std::fs::read("secrets.yaml")?;
//! if is_encryption_marker_present(&bytes, Format::Yaml) {
//!     println!("managed by sops");
//! }
//!
//! let digest = checksum("password: hunter2\n");
//! println!("{}", digest);
//! ```

mod checksum;
mod codec;
pub mod config;
mod error;

pub use checksum::{checksum, ContentChecksum};
pub use codec::{
    decode_text, is_encryption_marker_present, parse_document, Format, MARKER_KEY,
    MARKER_VERSION_KEY,
};
pub use config::{ShadowConfig, TiePolicy, DEFAULT_SHADOW_PREFIX, DEFAULT_SOPS_BINARY};
pub use error::{Error, Result};
