//! # Runner Seam
//!
//! The facade never spawns processes itself; it goes through a
//! [`GpgRunner`]. [`ProcessRunner`] is the real implementation. Tests and
//! embedders can substitute their own (recording argv, replaying canned
//! gpg output, routing through a sandbox).

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::GpgConfig;
use crate::error::Result;
use crate::process::streaming::{self, StreamOptions, StreamingOutcome};
use crate::process::{self, GpgOutput};

/// Executes one gpg invocation
///
/// `args` excludes the executable and the global prefix; the runner adds
/// those.
#[async_trait]
pub trait GpgRunner: Send + Sync {
    /// Buffered invocation: `input` on stdin, stdout/stderr collected
    async fn run(&self, input: Bytes, args: Vec<String>) -> Result<GpgOutput>;

    /// Streaming invocation between `options.source` and `options.dest`
    async fn run_streaming(
        &self,
        options: StreamOptions,
        args: Vec<String>,
    ) -> Result<StreamingOutcome>;
}

/// Runs gpg as a child process
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: GpgConfig,
}

impl ProcessRunner {
    /// Runner for the given configuration
    pub fn new(config: GpgConfig) -> Self {
        Self { config }
    }

    /// Configuration used for every spawn
    pub fn config(&self) -> &GpgConfig {
        &self.config
    }
}

#[async_trait]
impl GpgRunner for ProcessRunner {
    async fn run(&self, input: Bytes, args: Vec<String>) -> Result<GpgOutput> {
        process::run(&self.config, &input, &args).await
    }

    async fn run_streaming(
        &self,
        options: StreamOptions,
        args: Vec<String>,
    ) -> Result<StreamingOutcome> {
        streaming::run_streaming(&self.config, options, &args).await
    }
}
