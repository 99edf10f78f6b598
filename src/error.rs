//! # Error Handling
//!
//! Error types for every gpg invocation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                      │
//! │  │                                                                      │
//! │  ├── Invocation Errors                                                  │
//! │  │   ├── Spawn                 - Executable missing / not startable     │
//! │  │   ├── ProcessFailed         - Non-zero exit, carries diagnostics     │
//! │  │   ├── Timeout               - Child killed after the deadline        │
//! │  │   └── Pipeline              - I/O failure while piping               │
//! │  │                                                                      │
//! │  ├── Stream Endpoint Errors                                             │
//! │  │   ├── SourceNotFound        - Source path does not exist             │
//! │  │   ├── SourceUnreadable      - Source path could not be opened        │
//! │  │   ├── DestinationUnwritable - Destination could not be opened        │
//! │  │   └── StreamRead            - Caller's reader emitted an error       │
//! │  │                                                                      │
//! │  ├── Validation Errors                                                  │
//! │  │   ├── InvalidOptions        - Missing source/dest                    │
//! │  │   └── InvalidArgument       - Bad caller-supplied value              │
//! │  │                                                                      │
//! │  └── Internal                                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried automatically. The only failure that is ever turned
//! into a success is the "already in secret keyring" import conflict, and
//! only when [`GpgConfig::tolerate_existing_secret_key`] is set.
//!
//! [`GpgConfig::tolerate_existing_secret_key`]: crate::GpgConfig::tolerate_existing_secret_key

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for gpg-wrap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a pipeline an I/O failure happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeStage {
    /// Copying the source into the child's stdin
    Stdin,
    /// Copying the child's stdout into the destination
    Stdout,
    /// Draining the child's stderr
    Stderr,
}

impl std::fmt::Display for PipeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipeStage::Stdin => write!(f, "stdin"),
            PipeStage::Stdout => write!(f, "stdout"),
            PipeStage::Stderr => write!(f, "stderr"),
        }
    }
}

/// Main error type for gpg-wrap
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Invocation Errors (100-199)
    // ========================================================================

    /// The executable could not be started
    #[error("Failed to spawn '{executable}': {source}")]
    Spawn {
        /// Executable that was attempted
        executable: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The process exited with a non-zero status
    ///
    /// `message` is the stderr text, or the stdout text when stderr was
    /// empty (operations run with `--logger-fd 1` report there).
    #[error("{message}")]
    ProcessFailed {
        /// Exit code, `None` when the process was killed by a signal
        code: Option<i32>,
        /// Diagnostic text reported by the tool
        message: String,
    },

    /// The process outlived the configured timeout and was killed
    #[error("gpg did not finish within {0:?}")]
    Timeout(Duration),

    /// Reading or writing one of the pipes failed
    #[error("Pipe error on {stage}: {source}")]
    Pipeline {
        /// Pipe that failed
        stage: PipeStage,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    // ========================================================================
    // Stream Endpoint Errors (200-299)
    // ========================================================================

    /// Source path does not exist
    #[error("{} does not exist. Error: {source}", path.display())]
    SourceNotFound {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Source path exists but could not be opened or read
    #[error("Error reading {}. Error: {source}", path.display())]
    SourceUnreadable {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Destination path could not be opened for writing
    #[error("Error opening {}. Error: {source}", path.display())]
    DestinationUnwritable {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A caller-supplied reader failed while being drained
    #[error("Source stream error: {0}")]
    StreamRead(#[source] io::Error),

    // ========================================================================
    // Validation Errors (300-399)
    // ========================================================================

    /// Streaming options are incomplete
    #[error("{0}")]
    InvalidOptions(String),

    /// A caller-supplied value is unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Numeric error code, grouped by category:
    /// - 100-199: Invocation
    /// - 200-299: Stream endpoints
    /// - 300-399: Validation
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            Error::Spawn { .. } => 100,
            Error::ProcessFailed { .. } => 101,
            Error::Timeout(_) => 102,
            Error::Pipeline { .. } => 103,

            Error::SourceNotFound { .. } => 200,
            Error::SourceUnreadable { .. } => 201,
            Error::DestinationUnwritable { .. } => 202,
            Error::StreamRead(_) => 203,

            Error::InvalidOptions(_) => 300,
            Error::InvalidArgument(_) => 301,

            Error::Internal(_) => 900,
        }
    }

    /// True when the executable never started
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, Error::Spawn { .. })
    }

    /// True for errors raised before any process was spawned
    pub fn is_pre_spawn(&self) -> bool {
        matches!(
            self,
            Error::SourceNotFound { .. }
                | Error::SourceUnreadable { .. }
                | Error::DestinationUnwritable { .. }
                | Error::StreamRead(_)
                | Error::InvalidOptions(_)
                | Error::InvalidArgument(_)
        )
    }

    /// Diagnostic text reported by gpg, if the process ran and failed
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Error::ProcessFailed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Exit code of a failed process
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ProcessFailed { code, .. } => *code,
            _ => None,
        }
    }

    pub(crate) fn source_open(path: PathBuf, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Error::SourceNotFound { path, source: err }
        } else {
            Error::SourceUnreadable { path, source: err }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let spawn = Error::Spawn {
            executable: "gpg".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(spawn.code(), 100);
        assert_eq!(
            Error::ProcessFailed {
                code: Some(2),
                message: "x".into()
            }
            .code(),
            101
        );
        assert_eq!(Error::StreamRead(io::Error::from(io::ErrorKind::Other)).code(), 203);
        assert_eq!(Error::InvalidOptions("x".into()).code(), 300);
        assert_eq!(Error::Internal("x".into()).code(), 900);
    }

    #[test]
    fn test_source_open_distinguishes_missing() {
        let missing = Error::source_open(
            PathBuf::from("/nope"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(matches!(missing, Error::SourceNotFound { .. }));
        assert!(missing.to_string().starts_with("/nope does not exist. Error:"));

        let denied = Error::source_open(
            PathBuf::from("/root/secret"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(denied, Error::SourceUnreadable { .. }));
        assert!(denied.is_pre_spawn());
    }

    #[test]
    fn test_process_failure_exposes_diagnostic() {
        let err = Error::ProcessFailed {
            code: Some(2),
            message: "gpg: decryption failed: No secret key".into(),
        };
        assert_eq!(err.to_string(), "gpg: decryption failed: No secret key");
        assert_eq!(err.diagnostic(), Some("gpg: decryption failed: No secret key"));
        assert_eq!(err.exit_code(), Some(2));
        assert!(!err.is_spawn_failure());
        assert!(!err.is_pre_spawn());
    }

    #[test]
    fn test_destination_message_names_path() {
        let err = Error::DestinationUnwritable {
            path: PathBuf::from("/readonly/out.gpg"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("Error opening /readonly/out.gpg. Error:"));
    }
}
