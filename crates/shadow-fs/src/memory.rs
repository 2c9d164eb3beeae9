use crate::host::Host;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// In-memory `Host` for tests and embedding.
///
/// Modification times come from a logical clock that advances one second on
/// every write, so "written later" always means "strictly newer".
/// Showing a document also makes it visible, as an editor would.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<PathBuf, MemoryFile>,
    clock: u64,
    visible: Vec<PathBuf>,
    shown: Vec<PathBuf>,
    notifications: Vec<String>,
    writes: usize,
    fail_deletes: bool,
    fail_shows: bool,
}

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    modified: u64,
}

impl MemoryState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a file without counting it as a write.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        let mut state = self.state();
        let modified = state.tick();
        state.files.insert(
            path.into(),
            MemoryFile {
                content: content.into(),
                modified,
            },
        );
    }

    /// Set a file's modification time to an explicit clock value.
    pub fn set_modified(&self, path: &Path, seconds: u64) {
        let mut state = self.state();
        if let Some(file) = state.files.get_mut(path) {
            file.modified = seconds;
        }
        state.clock = state.clock.max(seconds);
    }

    pub fn content(&self, path: &Path) -> Option<Vec<u8>> {
        self.state().files.get(path).map(|file| file.content.clone())
    }

    pub fn set_visible(&self, visible: Vec<PathBuf>) {
        self.state().visible = visible;
    }

    pub fn shown(&self) -> Vec<PathBuf> {
        self.state().shown.clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.state().notifications.clone()
    }

    /// Number of `write` calls made through the `Host` interface.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Make every subsequent `delete` fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.state().fail_deletes = fail;
    }

    /// Make every subsequent `show_document` fail, as with no open window.
    pub fn fail_shows(&self, fail: bool) {
        self.state().fail_shows = fail;
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    )
}

impl Host for MemoryHost {
    fn exists(&self, path: &Path) -> bool {
        self.state().files.contains_key(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.content(path).ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut state = self.state();
        let modified = state.tick();
        state.writes += 1;
        state.files.insert(
            path.to_path_buf(),
            MemoryFile {
                content: content.to_vec(),
                modified,
            },
        );
        Ok(())
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.fail_deletes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is in use", path.display()),
            ));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        let state = self.state();
        let file = state.files.get(path).ok_or_else(|| not_found(path))?;
        Ok(UNIX_EPOCH + Duration::from_secs(file.modified))
    }

    fn visible_documents(&self) -> Vec<PathBuf> {
        self.state().visible.clone()
    }

    fn show_document(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        if !state.files.contains_key(path) {
            return Err(not_found(path));
        }
        if state.fail_shows {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "no window available to show the document",
            ));
        }
        state.shown.push(path.to_path_buf());
        if !state.visible.iter().any(|p| p == path) {
            state.visible.push(path.to_path_buf());
        }
        Ok(())
    }

    fn notify_error(&self, message: &str) {
        self.state().notifications.push(message.to_string());
    }
}
