//! # Operation Facade
//!
//! One method per gpg action. Each method composes `caller args ++
//! operation flags` and hands the invocation to a [`GpgRunner`].
//!
//! ## Method Families
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         FACADE METHODS                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Buffered (payload in memory)        Streaming (source ──► dest)        │
//! │  ────────────────────────────        ───────────────────────────        │
//! │  encrypt / decrypt                   encrypt_to_file / decrypt_to_file  │
//! │  encrypt_file / decrypt_file         encrypt_to_stream /                │
//! │  encrypt_stream / decrypt_stream       decrypt_to_stream                │
//! │  clearsign                           call_streaming                     │
//! │  verify_signature                                                       │
//! │  import_key / import_key_from_file                                      │
//! │  remove_key                                                             │
//! │  call                                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `*_file` and `*_stream` read their whole input into memory first and
//! then take the buffered path. `*_to_file` and `*_to_stream` pipe through
//! the streaming core.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::GpgConfig;
use crate::error::{Error, Result};
use crate::keys::{is_existing_secret_key, ImportOutcome};
use crate::operation::Operation;
use crate::process::streaming::{Destination, Source, StreamOptions, StreamingOutcome};
use crate::process::GpgOutput;
use crate::runner::{GpgRunner, ProcessRunner};

/// Entry point for every gpg operation
///
/// Cheap to clone; clones share the runner. Concurrent calls are
/// independent child processes. Nothing serializes keyring mutations, so
/// callers that import or remove keys concurrently must coordinate
/// themselves.
#[derive(Clone)]
pub struct Gpg {
    runner: Arc<dyn GpgRunner>,
    tolerate_existing_secret_key: bool,
}

impl std::fmt::Debug for Gpg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gpg")
            .field("tolerate_existing_secret_key", &self.tolerate_existing_secret_key)
            .finish_non_exhaustive()
    }
}

impl Default for Gpg {
    fn default() -> Self {
        Self::new(GpgConfig::default())
    }
}

impl Gpg {
    /// Facade spawning real processes according to `config`
    ///
    /// The import conflict policy is taken from
    /// [`GpgConfig::tolerate_existing_secret_key`].
    pub fn new(config: GpgConfig) -> Self {
        let tolerate = config.tolerate_existing_secret_key;
        Self::with_runner(Arc::new(ProcessRunner::new(config)))
            .tolerate_existing_secret_key(tolerate)
    }

    /// Facade over a custom runner
    ///
    /// A runner is opaque to the facade, so the import conflict policy is
    /// not read from it: it starts tolerant, as [`GpgConfig::default`] does.
    /// Call [`Gpg::tolerate_existing_secret_key`] to change it, or use
    /// [`Gpg::new`] to take it from a config.
    pub fn with_runner(runner: Arc<dyn GpgRunner>) -> Self {
        Self {
            runner,
            tolerate_existing_secret_key: true,
        }
    }

    /// Choose whether an already-present secret key fails [`Gpg::import_key`]
    pub fn tolerate_existing_secret_key(mut self, tolerate: bool) -> Self {
        self.tolerate_existing_secret_key = tolerate;
        self
    }

    // ========================================================================
    // RAW CALLS
    // ========================================================================

    /// Run gpg with exactly `args` (after the global prefix)
    pub async fn call(&self, input: impl AsRef<[u8]>, args: &[&str]) -> Result<GpgOutput> {
        self.runner
            .run(Bytes::copy_from_slice(input.as_ref()), to_owned(args))
            .await
    }

    /// Stream through gpg with exactly `args` (after the global prefix)
    pub async fn call_streaming(
        &self,
        options: StreamOptions,
        args: &[&str],
    ) -> Result<StreamingOutcome> {
        self.runner.run_streaming(options, to_owned(args)).await
    }

    async fn buffered(&self, op: Operation, input: &[u8], args: &[&str]) -> Result<GpgOutput> {
        tracing::debug!(
            "gpg {} ({} bytes in, diagnostics on {})",
            op,
            input.len(),
            diagnostics_stream(op)
        );
        self.runner
            .run(Bytes::copy_from_slice(input), op.compose(args))
            .await
    }

    async fn streaming(
        &self,
        op: Operation,
        options: StreamOptions,
        args: &[&str],
    ) -> Result<StreamingOutcome> {
        tracing::debug!("gpg {} (streaming, diagnostics on {})", op, diagnostics_stream(op));
        self.runner.run_streaming(options, op.compose(args)).await
    }

    async fn to_file(
        &self,
        op: Operation,
        source: &Path,
        dest: &Path,
        args: &[&str],
    ) -> Result<()> {
        let options = StreamOptions::new(Source::path(source), Destination::path(dest));
        self.streaming(op, options, args).await?.finish().await
    }

    // ========================================================================
    // ENCRYPT
    // ========================================================================

    /// Encrypt a payload
    pub async fn encrypt(&self, input: impl AsRef<[u8]>, args: &[&str]) -> Result<GpgOutput> {
        self.buffered(Operation::Encrypt, input.as_ref(), args).await
    }

    /// Encrypt the contents of a file
    pub async fn encrypt_file(&self, path: impl AsRef<Path>, args: &[&str]) -> Result<GpgOutput> {
        let content = read_file(path.as_ref()).await?;
        self.encrypt(content, args).await
    }

    /// Drain `reader` and encrypt everything it produced
    pub async fn encrypt_stream<R>(&self, reader: R, args: &[&str]) -> Result<GpgOutput>
    where
        R: AsyncRead + Unpin + Send,
    {
        let content = drain(reader).await?;
        self.encrypt(content, args).await
    }

    /// Encrypt `source` into `dest`, returning once `dest` is complete
    pub async fn encrypt_to_file(
        &self,
        source: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        args: &[&str],
    ) -> Result<()> {
        self.to_file(Operation::Encrypt, source.as_ref(), dest.as_ref(), args)
            .await
    }

    /// Encrypt between arbitrary endpoints
    pub async fn encrypt_to_stream(
        &self,
        options: StreamOptions,
        args: &[&str],
    ) -> Result<StreamingOutcome> {
        self.streaming(Operation::Encrypt, options, args).await
    }

    // ========================================================================
    // DECRYPT
    // ========================================================================

    /// Decrypt a payload
    ///
    /// `stderr` of the result carries gpg's key information.
    pub async fn decrypt(&self, input: impl AsRef<[u8]>, args: &[&str]) -> Result<GpgOutput> {
        self.buffered(Operation::Decrypt, input.as_ref(), args).await
    }

    /// Decrypt the contents of a file
    pub async fn decrypt_file(&self, path: impl AsRef<Path>, args: &[&str]) -> Result<GpgOutput> {
        let content = read_file(path.as_ref()).await?;
        self.decrypt(content, args).await
    }

    /// Drain `reader` and decrypt everything it produced
    pub async fn decrypt_stream<R>(&self, reader: R, args: &[&str]) -> Result<GpgOutput>
    where
        R: AsyncRead + Unpin + Send,
    {
        let content = drain(reader).await?;
        self.decrypt(content, args).await
    }

    /// Decrypt `source` into `dest`, returning once `dest` is complete
    pub async fn decrypt_to_file(
        &self,
        source: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        args: &[&str],
    ) -> Result<()> {
        self.to_file(Operation::Decrypt, source.as_ref(), dest.as_ref(), args)
            .await
    }

    /// Decrypt between arbitrary endpoints
    pub async fn decrypt_to_stream(
        &self,
        options: StreamOptions,
        args: &[&str],
    ) -> Result<StreamingOutcome> {
        self.streaming(Operation::Decrypt, options, args).await
    }

    // ========================================================================
    // SIGNATURES
    // ========================================================================

    /// Produce a clearsigned message
    pub async fn clearsign(&self, input: impl AsRef<[u8]>, args: &[&str]) -> Result<GpgOutput> {
        self.buffered(Operation::Clearsign, input.as_ref(), args).await
    }

    /// Verify a signed message
    ///
    /// gpg's verification report is routed to stdout with `--logger-fd 1`,
    /// so it ends up in `stdout` of the result (or in the error message).
    pub async fn verify_signature(
        &self,
        input: impl AsRef<[u8]>,
        args: &[&str],
    ) -> Result<GpgOutput> {
        self.buffered(Operation::Verify, input.as_ref(), args).await
    }

    // ========================================================================
    // KEYS
    // ========================================================================

    /// Import key material (armored or binary)
    ///
    /// When the secret key is already present gpg fails with "already in
    /// secret keyring". Unless disabled with
    /// [`Gpg::tolerate_existing_secret_key`], that failure is returned as a
    /// success with [`ImportOutcome::already_present`] set, so check that
    /// flag rather than relying on `Ok` alone.
    pub async fn import_key(&self, key: impl AsRef<[u8]>, args: &[&str]) -> Result<ImportOutcome> {
        match self.buffered(Operation::Import, key.as_ref(), args).await {
            Ok(output) => {
                let outcome = ImportOutcome::from_report(output.stdout_text(), false);
                tracing::info!(
                    "Imported key {}",
                    outcome.fingerprint.as_deref().unwrap_or("<unknown>")
                );
                Ok(outcome)
            }
            Err(Error::ProcessFailed { message, .. })
                if self.tolerate_existing_secret_key && is_existing_secret_key(&message) =>
            {
                let outcome = ImportOutcome::from_report(message, true);
                tracing::warn!(
                    "Key {} already in secret keyring, treating import as success",
                    outcome.fingerprint.as_deref().unwrap_or("<unknown>")
                );
                Ok(outcome)
            }
            Err(e) => Err(e),
        }
    }

    /// Import key material read from a file
    pub async fn import_key_from_file(
        &self,
        path: impl AsRef<Path>,
        args: &[&str],
    ) -> Result<ImportOutcome> {
        let content = read_file(path.as_ref()).await?;
        self.import_key(content, args).await
    }

    /// Delete both the secret and the public key for `key_id`
    ///
    /// gpg refuses deletions in batch mode unless the identifier is a full
    /// fingerprint and `--yes` is among `args`.
    pub async fn remove_key(&self, key_id: &str, args: &[&str]) -> Result<GpgOutput> {
        let key_id = key_id.trim();
        if key_id.is_empty() {
            return Err(Error::InvalidArgument("key id must not be empty".into()));
        }

        let mut argv = Operation::RemoveKey.compose(args);
        argv.push(key_id.to_string());

        tracing::info!("Removing key {}", key_id);
        self.runner.run(Bytes::new(), argv).await
    }
}

fn diagnostics_stream(op: Operation) -> &'static str {
    if op.logs_to_stdout() {
        "stdout"
    } else {
        "stderr"
    }
}

fn to_owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::source_open(path.to_path_buf(), e))
}

async fn drain<R>(mut reader: R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .await
        .map_err(Error::StreamRead)?;
    Ok(content)
}

// ============================================================================
// TESTS
// ============================================================================
