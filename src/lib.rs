//! # gpg-wrap
//!
//! Async wrapper around the `gpg` command-line tool. Every operation spawns
//! one gpg process, feeds it bytes, and turns its exit status and output
//! into a typed result. No cryptography happens in this crate.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          GPG-WRAP MODULES                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │                     Operation Facade (Gpg)                        │ │
//! │  │  encrypt · decrypt · clearsign · verify · import · remove         │ │
//! │  │  + *_file · *_stream · *_to_file · *_to_stream variants           │ │
//! │  └──────────────────────────────┬────────────────────────────────────┘ │
//! │                                 │ caller args ++ operation flags       │
//! │                                 ▼                                      │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │                 GpgRunner (ProcessRunner by default)              │ │
//! │  └───────────────┬──────────────────────────────┬────────────────────┘ │
//! │                  ▼                              ▼                      │
//! │  ┌───────────────────────────┐  ┌───────────────────────────────────┐ │
//! │  │ Process Invocation Core   │  │ Streaming Invocation Core         │ │
//! │  │ payload ─► stdin          │  │ Source ─► stdin                   │ │
//! │  │ stdout/stderr ─► buffers  │  │ stdout ─► Destination             │ │
//! │  └─────────────┬─────────────┘  └─────────────────┬─────────────────┘ │
//! │                └──────────────┬───────────────────┘                   │
//! │                               ▼                                       │
//! │                   gpg --batch <args> (child process)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error type and codes
//! - [`config`] - Executable, global flags, timeout, `GNUPGHOME`
//! - [`operation`] - Static flag table per operation
//! - [`process`] - Buffered and streaming invocation cores
//! - [`runner`] - The seam between the facade and the cores
//! - [`keys`] - Import results and fingerprint extraction
//! - [`service`] - The [`Gpg`] facade
//!
//! ## Example
//!
//! ```no_run
//! use gpg_wrap::{Gpg, GpgConfig};
//!
//! # async fn demo() -> gpg_wrap::Result<()> {
//! let gpg = Gpg::new(GpgConfig::default());
//!
//! let sealed = gpg
//!     .encrypt("Hello World", &["--recipient", "ABCDEF12", "--armor"])
//!     .await?;
//! let opened = gpg.decrypt(&sealed.stdout, &[]).await?;
//! assert_eq!(&opened.stdout[..], b"Hello World");
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Invocations are independent: each owns its child process, pipes and
//! buffers. There is no lock around gpg, so concurrent imports/removals
//! against one keyring race inside gpg itself.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod error;
pub mod keys;
pub mod operation;
pub mod process;
pub mod runner;
pub mod service;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::GpgConfig;
pub use error::{Error, PipeStage, Result};
pub use keys::{extract_fingerprint, ImportOutcome};
pub use operation::Operation;
pub use process::streaming::{Destination, PipelineHandle, Source, StreamOptions, StreamingOutcome};
pub use process::GpgOutput;
pub use runner::{GpgRunner, ProcessRunner};
pub use service::Gpg;

/// Returns the version of gpg-wrap
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
