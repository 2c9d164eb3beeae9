//! Shell scripts standing in for sops and its editor.

use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

/// ROT13 body followed by a plain `sops:` metadata block.
const FAKE_SOPS: &str = r#"#!/bin/sh
if [ "$1" != "--output-type" ] || [ "$3" != "--input-type" ] || [ "$2" != "$4" ]; then
  echo "unexpected arguments: $*" >&2
  exit 2
fi
shift 4
rot() { tr 'A-Za-z' 'N-ZA-Mn-za-m'; }
if [ "$1" = "--decrypt" ]; then
  sed '/^sops:$/,$d' "$2" | rot
  exit 0
fi
file="$1"
scratch=$(mktemp)
sed '/^sops:$/,$d' "$file" | rot > "$scratch"
"$EDITOR" "$scratch" || { rm -f "$scratch"; exit 1; }
{ rot < "$scratch"; printf 'sops:\n    version: "3.7.1"\n'; } > "$file"
rm -f "$scratch"
"#;

const FAILING_SOPS: &str = "#!/bin/sh\necho \"key not found\" >&2\nexit 128\n";

const COPY_EDITOR: &str = "#!/bin/sh\ncp \"$SOPS_SHADOW_SOURCE\" \"$1\"\n";

pub struct Tools {
    _dir: TempDir,
    pub sops: PathBuf,
    pub failing_sops: PathBuf,
    pub editor: PathBuf,
}

/// Scripts are written once per test binary, so no test executes a file
/// another thread still has open for writing.
pub fn tools() -> &'static Tools {
    static TOOLS: OnceLock<Tools> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let sops = install(dir.path(), "fake-sops", FAKE_SOPS);
        let failing_sops = install(dir.path(), "failing-sops", FAILING_SOPS);
        let editor = install(dir.path(), "copy-editor", COPY_EDITOR);
        Tools {
            _dir: dir,
            sops,
            failing_sops,
            editor,
        }
    })
}

fn install(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
            _ => c,
        })
        .collect()
}

pub fn encrypted_fixture(plaintext: &str) -> String {
    format!("{}sops:\n    version: \"3.7.1\"\n", rot13(plaintext))
}

/// Move `path`'s modification time `seconds` past `reference`'s.
pub fn bump_mtime(path: &Path, reference: &Path, seconds: u64) {
    let base = fs::metadata(reference).unwrap().modified().unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(base + Duration::from_secs(seconds))
        .unwrap();
}
