use std::fmt;

/// BLAKE3 digest of a text content, used for change detection only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentChecksum([u8; 32]);

impl ContentChecksum {
    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blake3:{}", hex::encode(self.0))
    }
}

/// Compute the checksum of a text content.
pub fn checksum(text: &str) -> ContentChecksum {
    ContentChecksum(*blake3::hash(text.as_bytes()).as_bytes())
}
