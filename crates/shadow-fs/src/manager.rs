use crate::error::{ShadowError, ShadowResult};
use crate::host::Host;
use crate::naming::ShadowNaming;
use crate::visibility::VisibilityTracker;
use log::{debug, info, warn};
use shadow_format::{checksum, decode_text, Format, ShadowConfig, TiePolicy};
use shadow_runtime::Cipher;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Result of bringing a shadow file and its encrypted file back in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// No shadow existed; one was decrypted from the encrypted file.
    Created,
    /// Both sides already hold the same plaintext.
    InSync,
    /// The encrypted file was newer; the shadow was overwritten.
    RefreshedShadow,
    /// The shadow was newer; its content was encrypted into the encrypted file.
    ReencryptedSource,
    /// Equal timestamps with differing content, left untouched.
    TieSkipped,
    /// Equal timestamps with differing content, shadow refreshed by policy.
    TieRefreshedShadow,
}

impl Reconciliation {
    /// Whether any file was written.
    pub fn wrote(self) -> bool {
        !matches!(self, Reconciliation::InSync | Reconciliation::TieSkipped)
    }
}

/// Observed relation between an encrypted file and its shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowState {
    NoShadow,
    Stale,
    Synced,
}

/// Owns shadow file creation and bidirectional freshness reconciliation.
///
/// Reconciliations of the same encrypted file are serialized; different
/// files proceed independently.
#[derive(Debug)]
pub struct ShadowManager<C> {
    cipher: C,
    naming: ShadowNaming,
    tie_policy: TiePolicy,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl<C: Cipher> ShadowManager<C> {
    pub fn new(cipher: C, naming: ShadowNaming, tie_policy: TiePolicy) -> Self {
        Self {
            cipher,
            naming,
            tie_policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cipher: C, config: &ShadowConfig) -> Self {
        Self::new(
            cipher,
            ShadowNaming::new(config.shadow_prefix.clone()),
            config.tie_policy,
        )
    }

    pub fn naming(&self) -> &ShadowNaming {
        &self.naming
    }

    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    pub fn shadow_path_for(&self, encrypted: &Path) -> ShadowResult<PathBuf> {
        self.naming
            .shadow_path_for(encrypted)
            .ok_or_else(|| ShadowError::InvalidPath(encrypted.to_path_buf()))
    }

    /// Make sure a synced shadow exists for `encrypted` and is displayed.
    ///
    /// Creates the shadow when missing, otherwise reconciles it with the
    /// encrypted file, then asks the host to show it unless it is already
    /// visible. Any failure aborts before a partial write. A shadow that
    /// exists but could not be shown yields `ShadowError::Show`.
    pub fn ensure_open_decrypted<H: Host + ?Sized>(
        &self,
        host: &H,
        tracker: &VisibilityTracker,
        encrypted: &Path,
        format: Format,
    ) -> ShadowResult<Reconciliation> {
        let shadow = self.shadow_path_for(encrypted)?;
        let outcome = self.with_lock(encrypted, || {
            if host.exists(&shadow) {
                self.reconcile_paths(host, encrypted, &shadow, format)
            } else {
                let encrypted_bytes = read(host, encrypted)?;
                let plaintext = self.cipher.decrypt(&encrypted_bytes, format)?;
                write(host, &shadow, plaintext.as_bytes())?;
                info!("Created shadow {}", shadow.display());
                Ok(Reconciliation::Created)
            }
        })?;

        if !tracker.is_visible(host, &shadow) {
            host.show_document(&shadow)
                .map_err(|source| ShadowError::Show {
                    path: shadow.clone(),
                    source,
                })?;
        }

        Ok(outcome)
    }

    /// Reconcile an existing shadow with its encrypted file.
    pub fn reconcile<H: Host + ?Sized>(
        &self,
        host: &H,
        encrypted: &Path,
        format: Format,
    ) -> ShadowResult<Reconciliation> {
        let shadow = self.shadow_path_for(encrypted)?;
        self.with_lock(encrypted, || {
            if !host.exists(&shadow) {
                return Err(ShadowError::MissingShadow(encrypted.to_path_buf()));
            }
            self.reconcile_paths(host, encrypted, &shadow, format)
        })
    }

    /// Inspect the shadow of `encrypted` without writing anything.
    pub fn state<H: Host + ?Sized>(
        &self,
        host: &H,
        encrypted: &Path,
        format: Format,
    ) -> ShadowResult<ShadowState> {
        let shadow = self.shadow_path_for(encrypted)?;
        if !host.exists(&shadow) {
            return Ok(ShadowState::NoShadow);
        }

        let current = self.cipher.decrypt(&read(host, encrypted)?, format)?;
        let shadow_bytes = read(host, &shadow)?;
        if checksum(&current) == checksum(decode_text(&shadow_bytes)?) {
            Ok(ShadowState::Synced)
        } else {
            Ok(ShadowState::Stale)
        }
    }

    fn reconcile_paths<H: Host + ?Sized>(
        &self,
        host: &H,
        encrypted: &Path,
        shadow: &Path,
        format: Format,
    ) -> ShadowResult<Reconciliation> {
        let encrypted_bytes = read(host, encrypted)?;
        let current = self.cipher.decrypt(&encrypted_bytes, format)?;
        let shadow_bytes = read(host, shadow)?;
        let shadow_text = decode_text(&shadow_bytes)?;

        if checksum(&current) == checksum(shadow_text) {
            debug!("Shadow in sync: {}", shadow.display());
            return Ok(Reconciliation::InSync);
        }

        let encrypted_modified = modified(host, encrypted)?;
        let shadow_modified = modified(host, shadow)?;

        match encrypted_modified.cmp(&shadow_modified) {
            Ordering::Greater => {
                write(host, shadow, current.as_bytes())?;
                info!("Refreshed shadow {} from encrypted file", shadow.display());
                Ok(Reconciliation::RefreshedShadow)
            }
            Ordering::Less => {
                let ciphertext = self.cipher.encrypt(shadow_text, &encrypted_bytes, format)?;
                write(host, encrypted, &ciphertext)?;
                info!("Re-encrypted {} from shadow", encrypted.display());

                // sops re-renders the document in its own layout.
                let rendered = self.cipher.decrypt(&ciphertext, format)?;
                if checksum(&rendered) != checksum(shadow_text) {
                    write(host, shadow, rendered.as_bytes())?;
                    debug!("Rewrote shadow {} in sops layout", shadow.display());
                }
                Ok(Reconciliation::ReencryptedSource)
            }
            Ordering::Equal => match self.tie_policy {
                TiePolicy::Skip => {
                    warn!(
                        "{} and its shadow differ but share a modification time, leaving both",
                        encrypted.display()
                    );
                    Ok(Reconciliation::TieSkipped)
                }
                TiePolicy::PreferEncrypted => {
                    write(host, shadow, current.as_bytes())?;
                    info!("Refreshed shadow {} on timestamp tie", shadow.display());
                    Ok(Reconciliation::TieRefreshedShadow)
                }
            },
        }
    }

    /// Run `f` holding the lock of `encrypted`, then forget the lock if
    /// no other caller is waiting on it.
    fn with_lock<T>(
        &self,
        encrypted: &Path,
        f: impl FnOnce() -> ShadowResult<T>,
    ) -> ShadowResult<T> {
        let lock = self.lock_for(encrypted);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };
        drop(lock);
        self.release_lock(encrypted);
        result
    }

    fn lock_for(&self, encrypted: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(encrypted.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release_lock(&self, encrypted: &Path) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(encrypted)
            .map_or(false, |lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(encrypted);
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn read<H: Host + ?Sized>(host: &H, path: &Path) -> ShadowResult<Vec<u8>> {
    host.read(path).map_err(|e| ShadowError::filesystem(path, e))
}

fn write<H: Host + ?Sized>(host: &H, path: &Path, content: &[u8]) -> ShadowResult<()> {
    host.write(path, content)
        .map_err(|e| ShadowError::filesystem(path, e))
}

fn modified<H: Host + ?Sized>(host: &H, path: &Path) -> ShadowResult<SystemTime> {
    host.modified(path)
        .map_err(|e| ShadowError::filesystem(path, e))
}
