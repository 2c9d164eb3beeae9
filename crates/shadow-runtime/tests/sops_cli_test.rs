#![cfg(unix)]

use shadow_runtime::{Cipher, CryptoError, Format, SopsCli};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

/// Stand-in for sops: ROT13 body followed by a plain `sops:` metadata block.
/// Honours the decrypt invocation and the edit-mode `$EDITOR` round trip.
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

const FAILING_SOPS: &str = r#"#!/bin/sh
echo "key not found" >&2
exit 128
"#;

const SILENT_SOPS: &str = r#"#!/bin/sh
exit 0
"#;

struct Scripts {
    _dir: TempDir,
    fake: PathBuf,
    failing: PathBuf,
    silent: PathBuf,
}

fn scripts() -> &'static Scripts {
    static SCRIPTS: OnceLock<Scripts> = OnceLock::new();
    SCRIPTS.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let fake = install(dir.path(), "fake-sops", FAKE_SOPS);
        let failing = install(dir.path(), "failing-sops", FAILING_SOPS);
        let silent = install(dir.path(), "silent-sops", SILENT_SOPS);
        Scripts {
            _dir: dir,
            fake,
            failing,
            silent,
        }
    })
}

fn install(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn sops_with(binary: &Path, staging: &Path) -> SopsCli {
    SopsCli::new(binary, env!("CARGO_BIN_EXE_sops-shadow-editor")).with_temp_dir(staging)
}

fn rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
            _ => c,
        })
        .collect()
}

fn encrypted_fixture(plaintext: &str) -> String {
    format!("{}sops:\n    version: \"3.7.1\"\n", rot13(plaintext))
}

fn staging_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

#[test]
fn decrypt_returns_plaintext_and_cleans_up() {
    let staging = TempDir::new().unwrap();
    let sops = sops_with(&scripts().fake, staging.path());

    let encrypted = encrypted_fixture("password: hunter2\n");
    let plaintext = sops.decrypt(encrypted.as_bytes(), Format::Yaml).unwrap();

    assert_eq!(plaintext, "password: hunter2\n");
    assert!(staging_is_empty(staging.path()));
}

#[test]
fn encrypt_round_trips_through_editor_helper() {
    let staging = TempDir::new().unwrap();
    let sops = sops_with(&scripts().fake, staging.path());

    let original = encrypted_fixture("password: hunter2\n");
    let ciphertext = sops
        .encrypt("password: correct-horse\n", original.as_bytes(), Format::Yaml)
        .unwrap();

    let ciphertext = String::from_utf8(ciphertext).unwrap();
    assert!(ciphertext.contains("sops:\n    version: \"3.7.1\""));
    assert!(!ciphertext.contains("correct-horse"));

    let plaintext = sops.decrypt(ciphertext.as_bytes(), Format::Yaml).unwrap();
    assert_eq!(plaintext, "password: correct-horse\n");
    assert!(staging_is_empty(staging.path()));
}

#[test]
fn stderr_output_fails_decrypt() {
    let staging = TempDir::new().unwrap();
    let sops = sops_with(&scripts().failing, staging.path());

    let err = sops
        .decrypt(encrypted_fixture("a: b\n").as_bytes(), Format::Yaml)
        .unwrap_err();

    match err {
        CryptoError::Subprocess { stderr, status } => {
            assert_eq!(stderr, "key not found");
            assert!(!status.success());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(staging_is_empty(staging.path()));
}

#[test]
fn stderr_output_fails_encrypt() {
    let staging = TempDir::new().unwrap();
    let sops = sops_with(&scripts().failing, staging.path());

    let err = sops
        .encrypt("a: b\n", encrypted_fixture("a: c\n").as_bytes(), Format::Yaml)
        .unwrap_err();

    assert!(matches!(err, CryptoError::Subprocess { .. }));
    assert!(staging_is_empty(staging.path()));
}

#[test]
fn empty_output_is_an_error() {
    let staging = TempDir::new().unwrap();
    let sops = sops_with(&scripts().silent, staging.path());

    let err = sops.decrypt(b"a: b\n", Format::Yaml).unwrap_err();
    assert!(matches!(err, CryptoError::EmptyOutput));

    let err = sops.encrypt("a: b\n", b"", Format::Yaml).unwrap_err();
    assert!(matches!(err, CryptoError::EmptyOutput));
    assert!(staging_is_empty(staging.path()));
}

#[test]
fn json_flags_are_passed() {
    let staging = TempDir::new().unwrap();
    let sops = sops_with(&scripts().fake, staging.path());

    let plaintext = "{\"token\": \"abc\"}\n";
    let encrypted = encrypted_fixture(plaintext);
    assert_eq!(
        sops.decrypt(encrypted.as_bytes(), Format::Json).unwrap(),
        plaintext
    );
}

#[test]
fn helper_reports_missing_source() {
    let staging = TempDir::new().unwrap();
    let target = staging.path().join("scratch.yaml");
    fs::write(&target, "old").unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_sops-shadow-editor"))
        .arg(&target)
        .env("SOPS_SHADOW_SOURCE", staging.path().join("missing.yaml"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
}
