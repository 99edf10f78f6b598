//! # Process Invocation Core
//!
//! Spawns gpg, feeds it a payload on stdin and collects what it prints.
//!
//! ## Invocation Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BUFFERED INVOCATION                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  spawn(executable, global ++ args) ──► Err(Spawn) ─────────────► done   │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  ┌──────────────────┬─────────────────────┬──────────────────────┐     │
//! │  │ write payload,   │ read stdout to end  │ read stderr to end   │     │
//! │  │ close stdin (EOF)│ (ordered bytes)     │ (ordered, lossy utf8)│     │
//! │  └──────────────────┴─────────────────────┴──────────────────────┘     │
//! │            │            (all three run concurrently)                    │
//! │            ▼                                                            │
//! │  wait() ──► exit 0   ──► Ok(GpgOutput { stdout, stderr })              │
//! │        └──► exit ≠ 0 ──► Err(ProcessFailed { stderr or stdout })       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every invocation owns its child, pipes and buffers. Completion is a single
//! `Result` returned from one `async fn`, so a caller observes exactly one
//! outcome. If the returned future is dropped early the child is killed.

pub mod streaming;

use std::future::Future;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::config::{GpgConfig, ENV_GNUPGHOME};
use crate::error::{Error, PipeStage, Result};
use crate::operation::full_argv;

/// Output of a successful invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpgOutput {
    /// Everything gpg wrote to stdout, in order
    pub stdout: Bytes,
    /// Everything gpg wrote to stderr, decoded lossily as UTF-8
    ///
    /// gpg prints key information here even on success (for example the
    /// recipient key id when decrypting).
    pub stderr: String,
}

impl GpgOutput {
    /// Stdout decoded lossily as UTF-8
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Run gpg once with `input` on stdin
///
/// argv is `config.global_args ++ args`.
pub async fn run(config: &GpgConfig, input: &[u8], args: &[String]) -> Result<GpgOutput> {
    let mut child = spawn(config, args)?;
    let (stdin, stdout, stderr) = take_pipes(&mut child)?;

    let work = async move {
        let (_, stdout, stderr) = tokio::try_join!(
            feed_stdin(stdin, input),
            read_all(stdout, PipeStage::Stdout),
            read_all(stderr, PipeStage::Stderr),
        )?;

        let status = wait(&mut child).await?;
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        check_status(status, &stdout, &stderr)?;

        Ok(GpgOutput {
            stdout: Bytes::from(stdout),
            stderr,
        })
    };

    with_deadline(config.timeout, work).await
}

/// Start the executable with piped stdio
pub(crate) fn spawn(config: &GpgConfig, args: &[String]) -> Result<Child> {
    if config.executable.trim().is_empty() {
        return Err(Error::InvalidArgument("executable must not be empty".into()));
    }

    let argv = full_argv(&config.global_args, args);
    tracing::debug!("Spawning {} {}", config.executable, argv.join(" "));

    let mut command = Command::new(&config.executable);
    command
        .args(&argv)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(home) = &config.home_dir {
        command.env(ENV_GNUPGHOME, home);
    }

    let child = command.spawn().map_err(|source| {
        tracing::debug!("Failed to spawn {}: {}", config.executable, source);
        Error::Spawn {
            executable: config.executable.clone(),
            source,
        }
    })?;

    tracing::debug!("Spawned {} (pid {:?})", config.executable, child.id());
    Ok(child)
}

pub(crate) fn take_pipes(child: &mut Child) -> Result<(ChildStdin, ChildStdout, ChildStderr)> {
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::Internal("child stdin was not piped".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Internal("child stdout was not piped".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::Internal("child stderr was not piped".into()))?;
    Ok((stdin, stdout, stderr))
}

/// Write the whole payload then close stdin
///
/// gpg may exit before reading everything (bad arguments, missing key);
/// the resulting broken pipe is left for the exit status to explain.
async fn feed_stdin(mut stdin: ChildStdin, input: &[u8]) -> Result<()> {
    let written = async {
        stdin.write_all(input).await?;
        stdin.shutdown().await
    };

    match written.await {
        Ok(()) => Ok(()),
        Err(e) if is_broken_pipe(&e) => {
            tracing::debug!("gpg closed stdin early: {}", e);
            Ok(())
        }
        Err(source) => Err(Error::Pipeline {
            stage: PipeStage::Stdin,
            source,
        }),
    }
}

pub(crate) async fn read_all<R>(mut reader: R, stage: PipeStage) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .await
        .map_err(|source| Error::Pipeline { stage, source })?;
    Ok(buf)
}

pub(crate) async fn wait(child: &mut Child) -> Result<ExitStatus> {
    let status = child
        .wait()
        .await
        .map_err(|e| Error::Internal(format!("failed to wait for gpg: {}", e)))?;
    tracing::debug!("gpg exited with {}", status);
    Ok(status)
}

/// Map a non-zero exit into [`Error::ProcessFailed`]
///
/// The message is stderr, or stdout when stderr is empty (operations run
/// with `--logger-fd 1`), or the bare status when both are empty.
pub(crate) fn check_status(status: ExitStatus, stdout: &[u8], stderr: &str) -> Result<()> {
    if status.success() {
        return Ok(());
    }

    let message = if !stderr.is_empty() {
        stderr.to_string()
    } else if !stdout.is_empty() {
        String::from_utf8_lossy(stdout).into_owned()
    } else {
        format!("gpg exited with {}", status)
    };

    Err(Error::ProcessFailed {
        code: status.code(),
        message,
    })
}

/// Bound `work` by the configured timeout
///
/// Dropping `work` drops the child it owns, which kills it.
pub(crate) async fn with_deadline<T, F>(timeout: Option<Duration>, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        None => work.await,
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("gpg did not finish within {:?}, killing it", limit);
                Err(Error::Timeout(limit))
            }
        },
    }
}

pub(crate) fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

// ============================================================================
// TESTS
// ============================================================================
