use log::{error, info};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use tempfile::NamedTempFile;

/// Capabilities the shadow tooling needs from its host environment.
///
/// Implemented by the local filesystem (`LocalHost`), by editor integrations,
/// and by the in-memory fake used in tests (`MemoryHost`).
pub trait Host {
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace the whole content of `path`.
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    fn delete(&self, path: &Path) -> io::Result<()>;

    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    /// Documents currently shown in any viewport.
    fn visible_documents(&self) -> Vec<PathBuf>;

    fn show_document(&self, path: &Path) -> io::Result<()>;

    /// Surface an error to the user.
    fn notify_error(&self, message: &str);
}

/// Host backed by the local filesystem.
///
/// There is no viewport: the visible set is whatever the caller declares,
/// and showing a document only records it.
#[derive(Debug, Default)]
pub struct LocalHost {
    visible: Mutex<Vec<PathBuf>>,
    shown: Mutex<Vec<PathBuf>>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visible(visible: Vec<PathBuf>) -> Self {
        Self {
            visible: Mutex::new(visible),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn set_visible(&self, visible: Vec<PathBuf>) {
        *self.visible.lock().unwrap_or_else(|e| e.into_inner()) = visible;
    }

    /// Documents passed to `show_document`, oldest first.
    pub fn shown(&self) -> Vec<PathBuf> {
        self.shown.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Host for LocalHost {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".tmp.sops-shadow-")
            .tempfile_in(parent)?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;

        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(temp.path(), metadata.permissions())?;
        }

        persist_tempfile(temp, path)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn visible_documents(&self) -> Vec<PathBuf> {
        self.visible.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn show_document(&self, path: &Path) -> io::Result<()> {
        info!("Shadow ready: {}", path.display());
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_path_buf());
        Ok(())
    }

    fn notify_error(&self, message: &str) {
        error!("{}", message);
    }
}

fn persist_tempfile(temp: NamedTempFile, final_path: &Path) -> io::Result<()> {
    temp.persist(final_path).map(|_| ()).map_err(|err| err.error)
}
