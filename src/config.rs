//! Invocation configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::operation::{DEFAULT_EXECUTABLE, GLOBAL_ARGS};

/// Environment variable overriding the executable
pub const ENV_EXECUTABLE: &str = "GPG_WRAP_EXECUTABLE";

/// Environment variable holding a timeout in whole seconds
pub const ENV_TIMEOUT_SECS: &str = "GPG_WRAP_TIMEOUT_SECS";

/// Environment variable gpg reads its home directory from
pub const ENV_GNUPGHOME: &str = "GNUPGHOME";

/// Configuration shared by every invocation made through a runner
#[derive(Debug, Clone)]
pub struct GpgConfig {
    /// Executable name or path (default `gpg`)
    pub executable: String,
    /// Arguments placed before everything else (default `--batch`)
    pub global_args: Vec<String>,
    /// Kill the child and fail with [`Error::Timeout`] after this long
    ///
    /// [`Error::Timeout`]: crate::Error::Timeout
    pub timeout: Option<Duration>,
    /// `GNUPGHOME` for the child; inherited from the parent when `None`
    pub home_dir: Option<PathBuf>,
    /// Treat "already in secret keyring" import failures as success
    pub tolerate_existing_secret_key: bool,
}

impl Default for GpgConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            global_args: GLOBAL_ARGS.iter().map(|s| s.to_string()).collect(),
            timeout: None,
            home_dir: None,
            tolerate_existing_secret_key: true,
        }
    }
}

impl GpgConfig {
    /// Defaults overridden by `GPG_WRAP_EXECUTABLE`, `GPG_WRAP_TIMEOUT_SECS`
    /// and `GNUPGHOME`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(executable) = std::env::var(ENV_EXECUTABLE) {
            if !executable.trim().is_empty() {
                config.executable = executable;
            }
        }

        if let Ok(secs) = std::env::var(ENV_TIMEOUT_SECS) {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Some(Duration::from_secs(secs)),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Ignoring invalid {}='{}': {}", ENV_TIMEOUT_SECS, secs, e);
                }
            }
        }

        if let Some(home) = std::env::var_os(ENV_GNUPGHOME) {
            config.home_dir = Some(PathBuf::from(home));
        }

        config
    }

    /// Set the executable
    pub fn executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Replace the global argument prefix
    pub fn global_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the invocation timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run gpg against a specific home directory
    pub fn home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    /// Choose whether an already-present secret key fails an import
    pub fn tolerate_existing_secret_key(mut self, tolerate: bool) -> Self {
        self.tolerate_existing_secret_key = tolerate;
        self
    }
}
