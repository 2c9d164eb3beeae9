use crate::error::CryptoResult;
use shadow_format::Format;

/// Converts document content between its encrypted and plaintext forms.
pub trait Cipher {
    /// Decrypt encrypted document bytes into plaintext.
    fn decrypt(&self, encrypted: &[u8], format: Format) -> CryptoResult<String>;

    /// Encrypt plaintext, reusing the key material and metadata of `original`.
    fn encrypt(&self, plaintext: &str, original: &[u8], format: Format) -> CryptoResult<Vec<u8>>;
}
