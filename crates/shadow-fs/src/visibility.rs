use crate::host::Host;
use crate::naming::ShadowNaming;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Tracks which documents are visible and removes shadows nobody looks at.
///
/// The visible set is a cache of host state and is re-derived from the host
/// before every decision.
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    naming: ShadowNaming,
    visible: Mutex<HashSet<PathBuf>>,
}

impl VisibilityTracker {
    pub fn new(naming: ShadowNaming) -> Self {
        Self {
            naming,
            visible: Mutex::new(HashSet::new()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.visible.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Re-derive the visible set from the host. Returns its size.
    pub fn refresh<H: Host + ?Sized>(&self, host: &H) -> usize {
        let mut cache = self.cache();
        cache.clear();
        cache.extend(host.visible_documents());
        cache.len()
    }

    pub fn is_visible<H: Host + ?Sized>(&self, host: &H, path: &Path) -> bool {
        self.refresh(host);
        self.cache().contains(path)
    }

    /// Handle the host's active document moving away from `previous`.
    ///
    /// Deletes `previous` when it is a shadow file that no viewport shows
    /// anymore. Returns whether a file was removed. Deletion failures are
    /// logged and otherwise ignored.
    pub fn on_active_changed<H: Host + ?Sized>(&self, host: &H, previous: &Path) -> bool {
        if !self.naming.is_shadow(previous) {
            return false;
        }
        if self.is_visible(host, previous) {
            debug!("Shadow still visible, keeping {}", previous.display());
            return false;
        }
        remove_shadow(host, previous)
    }

    /// Delete every listed shadow that is not visible. Returns how many were removed.
    pub fn sweep<'a, H, I>(&self, host: &H, shadows: I) -> usize
    where
        H: Host + ?Sized,
        I: IntoIterator<Item = &'a Path>,
    {
        self.refresh(host);
        let hidden: Vec<&Path> = {
            let cache = self.cache();
            shadows
                .into_iter()
                .filter(|shadow| self.naming.is_shadow(shadow) && !cache.contains(*shadow))
                .collect()
        };
        hidden
            .into_iter()
            .filter(|shadow| remove_shadow(host, shadow))
            .count()
    }
}

fn remove_shadow<H: Host + ?Sized>(host: &H, shadow: &Path) -> bool {
    if !host.exists(shadow) {
        debug!("Shadow already gone: {}", shadow.display());
        return false;
    }
    match host.delete(shadow) {
        Ok(()) => {
            info!("Removed shadow {}", shadow.display());
            true
        }
        Err(e) => {
            warn!("Failed to remove shadow {}: {}", shadow.display(), e);
            false
        }
    }
}
