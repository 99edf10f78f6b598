//! # Streaming Invocation Core
//!
//! Pipes a source into gpg's stdin and gpg's stdout into a destination,
//! without holding the payload in memory.
//!
//! ```text
//! ┌──────────────┐   copy    ┌─────────┐   copy    ┌───────────────────┐
//! │ Source       │ ────────► │   gpg   │ ────────► │ Destination       │
//! │  Path/Reader │  (stdin)  │         │ (stdout)  │  Path/Writer      │
//! └──────────────┘           └────┬────┘           └───────────────────┘
//!                                 │ stderr (collected for diagnostics)
//!                                 ▼
//! ```
//!
//! Both copies use bounded buffers, so a slow destination throttles gpg and
//! gpg throttles the source.
//!
//! When the destination is a path the call returns after gpg exited and the
//! file was flushed and closed. When it is a caller-supplied writer the call
//! returns as soon as gpg has started; the pipeline keeps running on a task
//! and its result arrives through the returned [`PipelineHandle`].

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::FutureExt;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::oneshot;

use super::{check_status, is_broken_pipe, read_all, spawn, take_pipes, wait, with_deadline};
use crate::config::GpgConfig;
use crate::error::{Error, PipeStage, Result};

type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Where the bytes fed to gpg come from
pub enum Source {
    /// A file, opened for reading before gpg is spawned
    Path(PathBuf),
    /// An already-open reader
    Reader(BoxReader),
}

impl Source {
    /// Read from a file
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Source::Path(path.into())
    }

    /// Read from an open reader
    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Source::Reader(Box::new(reader))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Where gpg's stdout goes
pub enum Destination {
    /// A file, created or truncated before gpg is spawned
    Path(PathBuf),
    /// An already-open writer; shut down once gpg's output is exhausted
    Writer(BoxWriter),
}

impl Destination {
    /// Write to a file
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Destination::Path(path.into())
    }

    /// Write to an open writer
    pub fn writer<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Destination::Writer(Box::new(writer))
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Destination::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Endpoints of a streaming invocation
#[derive(Debug, Default)]
pub struct StreamOptions {
    /// Input side
    pub source: Option<Source>,
    /// Output side
    pub dest: Option<Destination>,
}

impl StreamOptions {
    /// Both endpoints at once
    pub fn new(source: Source, dest: Destination) -> Self {
        Self {
            source: Some(source),
            dest: Some(dest),
        }
    }

    /// Set the source
    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the destination
    pub fn dest(mut self, dest: Destination) -> Self {
        self.dest = Some(dest);
        self
    }

    fn into_parts(self) -> Result<(Source, Destination)> {
        let source = self.source.ok_or_else(|| {
            Error::InvalidOptions("Missing 'source' option (path or reader)".into())
        })?;
        let dest = self
            .dest
            .ok_or_else(|| Error::InvalidOptions("Missing 'dest' option (path or writer)".into()))?;
        Ok((source, dest))
    }
}

/// Result of a streaming invocation
#[derive(Debug)]
pub enum StreamingOutcome {
    /// gpg exited and the destination file is complete and closed
    Completed,
    /// gpg started; the pipeline into the caller's writer is still running
    Piping(PipelineHandle),
}

impl StreamingOutcome {
    /// Wait for the pipeline, whichever kind it is
    pub async fn finish(self) -> Result<()> {
        match self {
            StreamingOutcome::Completed => Ok(()),
            StreamingOutcome::Piping(handle) => handle.await,
        }
    }

    /// True when nothing is left running
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamingOutcome::Completed)
    }
}

/// Resolves once a pipeline into a caller-supplied writer has finished
///
/// The pipeline task sends its result exactly once; the handle can be
/// dropped without stopping the pipeline.
#[derive(Debug)]
pub struct PipelineHandle {
    rx: oneshot::Receiver<Result<()>>,
}

impl Future for PipelineHandle {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let received = futures::ready!(self.rx.poll_unpin(cx));
        Poll::Ready(received.unwrap_or_else(|_| {
            Err(Error::Internal(
                "pipeline task ended without reporting a result".into(),
            ))
        }))
    }
}

/// Run gpg between `options.source` and `options.dest`
///
/// Endpoint problems are reported before anything is spawned.
pub async fn run_streaming(
    config: &GpgConfig,
    options: StreamOptions,
    args: &[String],
) -> Result<StreamingOutcome> {
    let (source, dest) = options.into_parts()?;

    let reader: BoxReader = match source {
        Source::Path(path) => match File::open(&path).await {
            Ok(file) => Box::new(file),
            Err(e) => return Err(Error::source_open(path, e)),
        },
        Source::Reader(reader) => reader,
    };

    let (writer, dest_is_file): (BoxWriter, bool) = match dest {
        Destination::Path(path) => match File::create(&path).await {
            Ok(file) => (Box::new(file), true),
            Err(source) => return Err(Error::DestinationUnwritable { path, source }),
        },
        Destination::Writer(writer) => (writer, false),
    };

    let mut child = spawn(config, args)?;
    let pipes = take_pipes(&mut child)?;
    let pipeline = drive(child, pipes, reader, writer, config.timeout);

    if dest_is_file {
        pipeline.await?;
        return Ok(StreamingOutcome::Completed);
    }

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = pipeline.await;
        if let Err(e) = &result {
            tracing::debug!("Streaming pipeline failed: {}", e);
        }
        // The caller may have dropped the handle; the result is then unobserved.
        let _ = tx.send(result);
    });

    Ok(StreamingOutcome::Piping(PipelineHandle { rx }))
}

async fn drive(
    mut child: Child,
    (stdin, stdout, stderr): (ChildStdin, ChildStdout, ChildStderr),
    reader: BoxReader,
    writer: BoxWriter,
    timeout: Option<Duration>,
) -> Result<()> {
    let work = async move {
        let (_, _, stderr) = tokio::try_join!(
            pump_stdin(reader, stdin),
            pump_stdout(stdout, writer),
            read_all(stderr, PipeStage::Stderr),
        )?;

        let status = wait(&mut child).await?;
        check_status(status, &[], &String::from_utf8_lossy(&stderr))
    };

    with_deadline(timeout, work).await
}

async fn pump_stdin(mut reader: BoxReader, mut stdin: ChildStdin) -> Result<()> {
    match tokio::io::copy(&mut reader, &mut stdin).await {
        Ok(bytes) => {
            tracing::debug!("Piped {} bytes into gpg", bytes);
            // Dropping stdin closes it, so gpg sees EOF.
            Ok(())
        }
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

async fn pump_stdout(mut stdout: ChildStdout, mut writer: BoxWriter) -> Result<()> {
    let copied = async {
        let bytes = tokio::io::copy(&mut stdout, &mut writer).await?;
        writer.flush().await?;
        writer.shutdown().await?;
        Ok::<_, std::io::Error>(bytes)
    };

    match copied.await {
        Ok(bytes) => {
            tracing::debug!("Piped {} bytes out of gpg", bytes);
            Ok(())
        }
        Err(source) => Err(Error::Pipeline {
            stage: PipeStage::Stdout,
            source,
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================
