//! sops-shadow-editor: non-interactive editor for `sops` edit mode.
//!
//! `sops` decrypts the document into a scratch file and runs `$EDITOR` on it.
//! This helper replaces the scratch file content with the plaintext staged at
//! `$SOPS_SHADOW_SOURCE`, after which `sops` re-encrypts it.
//!
//! # Usage
//!
//! ```bash
//! SOPS_SHADOW_SOURCE=/tmp/plain.yaml EDITOR=sops-shadow-editor sops secrets.yaml
//! ```

use clap::Parser;
use shadow_runtime::SOURCE_ENV;
use std::fs;
use std::path::PathBuf;
use std::process;

/// Copy the staged plaintext over the file sops asks us to edit.
#[derive(Parser, Debug)]
#[command(name = "sops-shadow-editor")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scratch file handed over by sops
    #[arg(value_name = "FILE")]
    target: PathBuf,

    /// Path of the staged plaintext
    #[arg(long, env = SOURCE_ENV, value_name = "PATH")]
    source: PathBuf,
}

fn main() {
    let args = Args::parse();

    let content = match fs::read(&args.source) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to read {}: {}", args.source.display(), e);
            process::exit(1);
        }
    };

    if let Err(e) = fs::write(&args.target, content) {
        eprintln!("Failed to write {}: {}", args.target.display(), e);
        process::exit(1);
    }
}
