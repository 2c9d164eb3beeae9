//! sops-shadow: keep plaintext shadow copies of sops-encrypted files in sync.
//!
//! # Usage
//!
//! ```bash
//! # Decrypt secrets.yaml into .decrypted~secrets.yaml
//! sops-shadow open secrets.yaml
//!
//! # After editing the shadow, push the change back into secrets.yaml
//! sops-shadow sync secrets.yaml
//!
//! # Remove the shadow again (refused while it holds unsynced edits)
//! sops-shadow close secrets.yaml
//! ```

use anyhow::{anyhow, Context};
use chrono::{DateTime, Local, SecondsFormat};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::error;
use shadow_format::{is_encryption_marker_present, Format, ShadowConfig};
use shadow_fs::{Host, LocalHost, ShadowManager, ShadowState, VisibilityTracker};
use shadow_runtime::SopsCli;
use std::path::{Path, PathBuf};
use std::process;

/// Keep plaintext shadow copies of sops-encrypted YAML/JSON files in sync.
#[derive(Parser, Debug)]
#[command(name = "sops-shadow")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Path to the sops executable (overrides the configuration)
    #[arg(long, global = true, value_name = "SOPS")]
    sops: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether a file is sops-encrypted
    Check { file: PathBuf },
    /// Create or refresh the shadow of an encrypted file
    Open { file: PathBuf },
    /// Reconcile an existing shadow with its encrypted file
    Sync { file: PathBuf },
    /// Show the shadow state and modification times
    Status { file: PathBuf },
    /// Delete the shadow of an encrypted file
    Close {
        file: PathBuf,

        /// Delete even if the shadow differs from the encrypted file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    if let Err(e) = run(args) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ShadowConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ShadowConfig::default(),
    };
    if let Some(sops) = args.sops {
        config.sops_binary = sops;
    }

    let host = LocalHost::new();
    let manager = ShadowManager::from_config(SopsCli::from_config(&config), &config);
    let tracker = VisibilityTracker::new(manager.naming().clone());

    match args.command {
        Command::Check { file } => {
            let format = format_of(&file)?;
            let content = host
                .read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            if is_encryption_marker_present(&content, format) {
                println!("{}: sops-encrypted", file.display());
            } else {
                println!("{}: not encrypted", file.display());
            }
        }
        Command::Open { file } => {
            let format = encrypted_format_of(&host, &file)?;
            manager.ensure_open_decrypted(&host, &tracker, &file, format)?;
            println!("{}", manager.shadow_path_for(&file)?.display());
        }
        Command::Sync { file } => {
            let format = encrypted_format_of(&host, &file)?;
            let outcome = manager.reconcile(&host, &file, format)?;
            println!("{:?}", outcome);
        }
        Command::Status { file } => {
            let format = encrypted_format_of(&host, &file)?;
            let state = manager.state(&host, &file, format)?;
            println!("state:     {:?}", state);
            println!("encrypted: {}", modified_display(&host, &file)?);
            if state != ShadowState::NoShadow {
                let shadow = manager.shadow_path_for(&file)?;
                println!("shadow:    {}", modified_display(&host, &shadow)?);
            }
        }
        Command::Close { file, force } => {
            let shadow = manager.shadow_path_for(&file)?;
            if !force {
                let format = encrypted_format_of(&host, &file)?;
                if manager.state(&host, &file, format)? == ShadowState::Stale {
                    return Err(anyhow!(
                        "{} differs from {}; run `sops-shadow sync` first or pass --force",
                        shadow.display(),
                        file.display()
                    ));
                }
            }
            if tracker.on_active_changed(&host, &shadow) {
                println!("Removed {}", shadow.display());
            } else {
                println!("Nothing removed");
            }
        }
    }

    Ok(())
}

fn format_of(file: &Path) -> anyhow::Result<Format> {
    Format::from_path(file)
        .ok_or_else(|| anyhow!("{} is neither YAML nor JSON", file.display()))
}

fn encrypted_format_of(host: &LocalHost, file: &Path) -> anyhow::Result<Format> {
    let format = format_of(file)?;
    let content = host
        .read(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if !is_encryption_marker_present(&content, format) {
        return Err(anyhow!("{} is not sops-encrypted", file.display()));
    }
    Ok(format)
}

fn modified_display(host: &LocalHost, path: &Path) -> anyhow::Result<String> {
    let modified = host
        .modified(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    let local: DateTime<Local> = modified.into();
    Ok(local.to_rfc3339_opts(SecondsFormat::Millis, true))
}
