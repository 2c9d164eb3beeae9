use crate::cipher::Cipher;
use crate::error::{CryptoError, CryptoResult};
use log::{debug, warn};
use shadow_format::{Format, ShadowConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::NamedTempFile;

/// File name of the helper binary sops runs as its editor.
pub const EDITOR_HELPER_NAME: &str = "sops-shadow-editor";

/// Environment variable carrying the staged plaintext path to the helper.
pub const SOURCE_ENV: &str = "SOPS_SHADOW_SOURCE";

const TEMP_PREFIX: &str = ".sops-shadow-";

/// `Cipher` backed by the `sops` command line tool.
///
/// Every call stages its input in owner-only temp files with random names,
/// so concurrent calls on different documents never share a path.
#[derive(Debug, Clone)]
pub struct SopsCli {
    binary: PathBuf,
    editor_helper: PathBuf,
    temp_dir: Option<PathBuf>,
}

impl SopsCli {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(binary: P, editor_helper: Q) -> Self {
        Self {
            binary: binary.into(),
            editor_helper: editor_helper.into(),
            temp_dir: None,
        }
    }

    pub fn from_config(config: &ShadowConfig) -> Self {
        let editor_helper = config
            .editor_helper
            .clone()
            .unwrap_or_else(default_editor_helper);
        Self::new(config.sops_binary.clone(), editor_helper)
    }

    /// Stage temp files in `dir` instead of the system temp directory.
    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn editor_helper(&self) -> &Path {
        &self.editor_helper
    }

    fn base_command(&self, format: Format) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("--output-type")
            .arg(format.as_sops_type())
            .arg("--input-type")
            .arg(format.as_sops_type());
        command
    }

    fn run(&self, mut command: Command) -> CryptoResult<Output> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = command.output().map_err(|source| CryptoError::Spawn {
            binary: self.binary.display().to_string(),
            source,
        })?;

        if !output.stderr.is_empty() || !output.status.success() {
            return Err(CryptoError::Subprocess {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }

    fn stage(&self, content: &[u8], format: Format) -> CryptoResult<NamedTempFile> {
        let suffix = format!(".{}", format.as_sops_type());
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(&suffix);

        let mut temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        temp.write_all(content)?;
        temp.as_file().sync_all()?;
        Ok(temp)
    }

    fn run_decrypt(&self, encrypted_path: &Path, format: Format) -> CryptoResult<String> {
        let mut command = self.base_command(format);
        command.arg("--decrypt").arg(encrypted_path);

        let output = self.run(command)?;
        if output.stdout.is_empty() {
            return Err(CryptoError::EmptyOutput);
        }
        String::from_utf8(output.stdout).map_err(|_| CryptoError::InvalidUtf8)
    }

    fn run_encrypt(
        &self,
        plaintext_path: &Path,
        encrypted_path: &Path,
        format: Format,
    ) -> CryptoResult<Vec<u8>> {
        let mut command = self.base_command(format);
        command
            .arg(encrypted_path)
            .env("EDITOR", &self.editor_helper)
            .env("SOPS_EDITOR", &self.editor_helper)
            .env(SOURCE_ENV, plaintext_path);

        self.run(command)?;

        let ciphertext = fs::read(encrypted_path)?;
        if ciphertext.is_empty() {
            return Err(CryptoError::EmptyOutput);
        }
        Ok(ciphertext)
    }
}

impl Cipher for SopsCli {
    fn decrypt(&self, encrypted: &[u8], format: Format) -> CryptoResult<String> {
        let staged = self.stage(encrypted, format)?;
        debug!("Decrypting {} content via {}", format, self.binary.display());

        let result = self.run_decrypt(staged.path(), format);
        discard(staged);
        result
    }

    fn encrypt(&self, plaintext: &str, original: &[u8], format: Format) -> CryptoResult<Vec<u8>> {
        let source = self.stage(plaintext.as_bytes(), format)?;
        let target = match self.stage(original, format) {
            Ok(target) => target,
            Err(e) => {
                discard(source);
                return Err(e);
            }
        };
        debug!("Encrypting {} content via {}", format, self.binary.display());

        let result = self.run_encrypt(source.path(), target.path(), format);
        discard(source);
        discard(target);
        result
    }
}

/// Locate the helper next to the running executable, else rely on `PATH`.
pub fn default_editor_helper() -> PathBuf {
    let name = format!("{}{}", EDITOR_HELPER_NAME, std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&name)))
        .filter(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(name))
}

fn discard(temp: NamedTempFile) {
    let path = temp.path().to_path_buf();
    if let Err(e) = temp.close() {
        warn!("Failed to remove temp file {}: {}", path.display(), e);
    }
}
