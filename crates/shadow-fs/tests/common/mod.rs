#![allow(dead_code)]

#[cfg(unix)]
pub mod fake_sops;

use shadow_fs::{Cipher, CryptoError, Format};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const ENCRYPTED: &str = "/repo/secrets.yaml";
pub const SHADOW: &str = "/repo/.decrypted~secrets.yaml";

/// Reversible stand-in for sops: hex-encodes the plaintext under `data` and
/// appends a sops metadata block, so the output is valid, marked YAML.
#[derive(Debug, Default)]
pub struct HexCipher {
    decrypts: AtomicUsize,
    encrypts: AtomicUsize,
}

impl HexCipher {
    pub fn decrypts(&self) -> usize {
        self.decrypts.load(Ordering::SeqCst)
    }

    pub fn encrypts(&self) -> usize {
        self.encrypts.load(Ordering::SeqCst)
    }
}

pub fn seal(plaintext: &str) -> String {
    let data: String = plaintext.bytes().map(|b| format!("{:02x}", b)).collect();
    format!("data: \"{}\"\nsops:\n  version: \"3.7.1\"\n", data)
}

fn unseal(encrypted: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(encrypted).ok()?;
    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data: \""))?
        .strip_suffix('"')?;
    let bytes = (0..data.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(data.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}

impl Cipher for HexCipher {
    fn decrypt(&self, encrypted: &[u8], _format: Format) -> Result<String, CryptoError> {
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        match unseal(encrypted) {
            Some(plaintext) if !plaintext.is_empty() => Ok(plaintext),
            _ => Err(CryptoError::EmptyOutput),
        }
    }

    fn encrypt(
        &self,
        plaintext: &str,
        _original: &[u8],
        _format: Format,
    ) -> Result<Vec<u8>, CryptoError> {
        self.encrypts.fetch_add(1, Ordering::SeqCst);
        Ok(seal(plaintext).into_bytes())
    }
}

/// Cipher whose tool cannot be launched.
#[derive(Debug, Default)]
pub struct BrokenCipher;

impl Cipher for BrokenCipher {
    fn decrypt(&self, _encrypted: &[u8], _format: Format) -> Result<String, CryptoError> {
        Err(spawn_error())
    }

    fn encrypt(
        &self,
        _plaintext: &str,
        _original: &[u8],
        _format: Format,
    ) -> Result<Vec<u8>, CryptoError> {
        Err(spawn_error())
    }
}

fn spawn_error() -> CryptoError {
    CryptoError::Spawn {
        binary: "sops".to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
    }
}

/// Cipher that decrypts like `HexCipher` but cannot encrypt.
#[derive(Debug, Default)]
pub struct DecryptOnlyCipher;

impl Cipher for DecryptOnlyCipher {
    fn decrypt(&self, encrypted: &[u8], format: Format) -> Result<String, CryptoError> {
        HexCipher::default().decrypt(encrypted, format)
    }

    fn encrypt(
        &self,
        _plaintext: &str,
        _original: &[u8],
        _format: Format,
    ) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::EmptyOutput)
    }
}

/// Cipher that re-renders plaintext the way sops does: trailing spaces are
/// dropped from every line of the decrypted output.
#[derive(Debug, Default)]
pub struct ReformattingCipher {
    inner: HexCipher,
}

impl ReformattingCipher {
    pub fn encrypts(&self) -> usize {
        self.inner.encrypts()
    }
}

impl Cipher for ReformattingCipher {
    fn decrypt(&self, encrypted: &[u8], format: Format) -> Result<String, CryptoError> {
        let plaintext = self.inner.decrypt(encrypted, format)?;
        Ok(plaintext
            .lines()
            .map(|line| format!("{}\n", line.trim_end()))
            .collect())
    }

    fn encrypt(
        &self,
        plaintext: &str,
        original: &[u8],
        format: Format,
    ) -> Result<Vec<u8>, CryptoError> {
        self.inner.encrypt(plaintext, original, format)
    }
}
