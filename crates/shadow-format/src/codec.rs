use crate::error::{Error, Result};
use log::debug;
use serde_yaml::Value;
use std::path::Path;

/// Top-level key under which sops stores its metadata.
pub const MARKER_KEY: &str = "sops";

/// Key inside the metadata mapping that carries the sops version tag.
pub const MARKER_VERSION_KEY: &str = "version";

/// Structured text formats understood by the shadow tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Detect the format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    /// Map a host-declared document language to a format.
    pub fn from_language_id(language_id: &str) -> Option<Self> {
        match language_id.trim() {
            "yaml" => Some(Format::Yaml),
            "json" | "jsonc" => Some(Format::Json),
            _ => None,
        }
    }

    /// Value passed to `--input-type` / `--output-type`.
    pub fn as_sops_type(self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sops_type())
    }
}

/// Decode raw file bytes as UTF-8 text.
pub fn decode_text(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}

/// Parse text into a format-agnostic value tree.
///
/// JSON documents are read with `serde_json` and YAML documents with
/// `serde_yaml`; both land in a `serde_yaml::Value` so that callers can
/// inspect them the same way.
pub fn parse_document(text: &str, format: Format) -> Result<Value> {
    match format {
        Format::Yaml => serde_yaml::from_str(text).map_err(|e| Error::Parse(e.to_string())),
        Format::Json => serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string())),
    }
}

/// Check whether content carries the sops metadata marker.
///
/// The marker is a top-level `sops` mapping holding a string `version`.
/// Content that cannot be decoded or parsed is treated as not encrypted.
pub fn is_encryption_marker_present(bytes: &[u8], format: Format) -> bool {
    let document = match decode_text(bytes).and_then(|text| parse_document(text, format)) {
        Ok(document) => document,
        Err(e) => {
            debug!("Ignoring unparseable {} content: {}", format, e);
            return false;
        }
    };

    document
        .get(MARKER_KEY)
        .filter(|meta| meta.is_mapping())
        .and_then(|meta| meta.get(MARKER_VERSION_KEY))
        .map_or(false, Value::is_string)
}
