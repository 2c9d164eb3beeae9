use crate::error::{ShadowError, ShadowResult};
use crate::host::Host;
use crate::manager::{Reconciliation, ShadowManager};
use crate::visibility::VisibilityTracker;
use log::{debug, error, info};
use shadow_format::{is_encryption_marker_present, Format, ShadowConfig};
use shadow_runtime::Cipher;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Lifecycle events delivered by the host editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A document was opened with the host's declared language.
    DocumentOpened { path: PathBuf, language_id: String },
    /// The active viewport now shows `next` (or nothing).
    ActiveEditorChanged { next: Option<PathBuf> },
}

/// Bridges host events to the shadow manager and visibility tracker.
///
/// Handlers never fail: errors are logged and reported through
/// `Host::notify_error` so one broken file cannot take the host down.
pub struct Orchestrator<H, C> {
    host: H,
    config: ShadowConfig,
    manager: ShadowManager<C>,
    tracker: VisibilityTracker,
    current_focus: Option<PathBuf>,
    opened_shadows: BTreeSet<PathBuf>,
}

impl<H: Host, C: Cipher> Orchestrator<H, C> {
    pub fn new(host: H, cipher: C, config: ShadowConfig) -> Self {
        let manager = ShadowManager::from_config(cipher, &config);
        let tracker = VisibilityTracker::new(manager.naming().clone());
        Self {
            host,
            config,
            manager,
            tracker,
            current_focus: None,
            opened_shadows: BTreeSet::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    pub fn manager(&self) -> &ShadowManager<C> {
        &self.manager
    }

    pub fn current_focus(&self) -> Option<&Path> {
        self.current_focus.as_deref()
    }

    /// Shadows opened during this session that have not been removed yet.
    pub fn opened_shadows(&self) -> impl Iterator<Item = &Path> {
        self.opened_shadows.iter().map(PathBuf::as_path)
    }

    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::DocumentOpened { path, language_id } => {
                self.on_document_opened(&path, &language_id)
            }
            HostEvent::ActiveEditorChanged { next } => self.on_active_editor_changed(next),
        }
    }

    pub fn on_document_opened(&mut self, path: &Path, language_id: &str) {
        let format = if language_id.is_empty() {
            Format::from_path(path)
        } else {
            Format::from_language_id(language_id)
        };
        let Some(format) = format else {
            return;
        };

        if self.manager.naming().is_shadow(path) {
            debug!("Ignoring shadow document {}", path.display());
            return;
        }

        match self.open_encrypted(path, format) {
            Ok(Some(outcome)) => info!("Opened {} ({:?})", path.display(), outcome),
            Ok(None) => debug!("{} is not sops-encrypted", path.display()),
            Err(e) => {
                error!("Failed to open decrypted view of {}: {}", path.display(), e);
                self.host.notify_error(&format!(
                    "Could not open decrypted view of {}: {}",
                    path.display(),
                    e
                ));
            }
        }
    }

    fn open_encrypted(
        &mut self,
        path: &Path,
        format: Format,
    ) -> ShadowResult<Option<Reconciliation>> {
        let content = self
            .host
            .read(path)
            .map_err(|e| ShadowError::filesystem(path, e))?;
        if !is_encryption_marker_present(&content, format) {
            return Ok(None);
        }

        let shadow = self.manager.shadow_path_for(path)?;
        let outcome = self
            .manager
            .ensure_open_decrypted(&self.host, &self.tracker, path, format);
        // Recorded even when showing it failed.
        if self.host.exists(&shadow) {
            self.opened_shadows.insert(shadow);
        }
        outcome.map(Some)
    }

    /// Deactivate the focused document, then activate `next`.
    pub fn on_active_editor_changed(&mut self, next: Option<PathBuf>) {
        if let Some(previous) = self.current_focus.take() {
            self.notify_deactivated(&previous);
        }
        self.notify_activated(next);
    }

    pub fn notify_deactivated(&mut self, previous: &Path) {
        if self.tracker.on_active_changed(&self.host, previous) {
            self.opened_shadows.remove(previous);
        }
    }

    pub fn notify_activated(&mut self, next: Option<PathBuf>) {
        self.current_focus = next;
    }

    /// Remove every shadow opened in this session that is no longer visible.
    pub fn shutdown(&mut self) -> usize {
        let opened: Vec<PathBuf> = self.opened_shadows.iter().cloned().collect();
        let removed = self
            .tracker
            .sweep(&self.host, opened.iter().map(PathBuf::as_path));
        self.opened_shadows.retain(|shadow| self.host.exists(shadow));
        removed
    }
}
