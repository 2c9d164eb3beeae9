//! # shadow-fs
//!
//! Plaintext shadow files for sops-encrypted documents.
//!
//! This crate provides:
//! - Shadow file naming (`.decrypted~secrets.yaml` next to `secrets.yaml`)
//! - The `Host` capability interface, with local-filesystem and in-memory hosts
//! - `ShadowManager`: creates shadows and reconciles them with their encrypted
//!   files, newest side wins
//! - `VisibilityTracker`: deletes shadows once no viewport shows them
//! - `Orchestrator`: turns host lifecycle events into the above
//! - **CLI** (`sops-shadow` binary, with `cli` feature)
//!
//! ## Example
//!
//! ```ignore
//! use shadow_fs::{HostEvent, LocalHost, Orchestrator};
//! use shadow_runtime::{ShadowConfig, SopsCli};
//!
//! let config = ShadowConfig::default();
//! let sops = SopsCli::from_config(&config);
//! let mut orchestrator = Orchestrator::new(LocalHost::new(), sops, config);
//!
//! orchestrator.handle(HostEvent::DocumentOpened {
//!     path: "secrets.yaml".into(),
//!     language_id: "yaml".into(),
//! });
//! orchestrator.handle(HostEvent::ActiveEditorChanged {
//!     next: Some(".decrypted~secrets.yaml".into()),
//! });
//! ```

mod error;
mod host;
mod manager;
mod memory;
mod naming;
mod orchestrator;
mod visibility;

pub use error::{ShadowError, ShadowResult};
pub use host::{Host, LocalHost};
pub use manager::{Reconciliation, ShadowManager, ShadowState};
pub use memory::MemoryHost;
pub use naming::ShadowNaming;
pub use orchestrator::{HostEvent, Orchestrator};
pub use visibility::VisibilityTracker;

// Re-export format and runtime types for convenience
pub use shadow_format::{Format, ShadowConfig, TiePolicy};
pub use shadow_runtime::{Cipher, CryptoError, SopsCli};
