//! # Operation Descriptors
//!
//! Static flag table for each gpg action and the rule for merging it with
//! caller arguments.
//!
//! ## Argument Order
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          ARGV LAYOUT                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   gpg  --batch   --recipient ABCDEF12 --armor   --encrypt               │
//! │   ───  ───────   ─────────────────────────────  ─────────               │
//! │    │      │                  │                      │                   │
//! │    │      │                  │                      └── operation flags │
//! │    │      │                  └── caller arguments                       │
//! │    │      └── global prefix (GpgConfig::global_args)                    │
//! │    └── executable (GpgConfig::executable)                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Caller arguments always come before the operation flags so that option
//! flags such as `--recipient` are seen before the command flag.

/// Canonical executable name
pub const DEFAULT_EXECUTABLE: &str = "gpg";

/// Global prefix: never prompt
pub const GLOBAL_ARGS: &[&str] = &["--batch"];

/// Routes gpg's log output to stdout
pub(crate) const LOG_TO_STDOUT: &[&str] = &["--logger-fd", "1"];

/// A gpg action with a fixed set of default flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `--encrypt`
    Encrypt,
    /// `--decrypt`
    Decrypt,
    /// `--clearsign`
    Clearsign,
    /// `--logger-fd 1 --verify`
    Verify,
    /// `--logger-fd 1 --import`
    Import,
    /// `--logger-fd 1 --delete-secret-and-public-key`
    RemoveKey,
}

impl Operation {
    /// Every operation, in table order
    pub const ALL: [Operation; 6] = [
        Operation::Encrypt,
        Operation::Decrypt,
        Operation::Clearsign,
        Operation::Verify,
        Operation::Import,
        Operation::RemoveKey,
    ];

    /// Default flags appended after caller arguments
    pub const fn flags(self) -> &'static [&'static str] {
        match self {
            Operation::Encrypt => &["--encrypt"],
            Operation::Decrypt => &["--decrypt"],
            Operation::Clearsign => &["--clearsign"],
            Operation::Verify => &["--logger-fd", "1", "--verify"],
            Operation::Import => &["--logger-fd", "1", "--import"],
            Operation::RemoveKey => &["--logger-fd", "1", "--delete-secret-and-public-key"],
        }
    }

    /// Whether diagnostics are routed to stdout for this operation
    pub fn logs_to_stdout(self) -> bool {
        self.flags().starts_with(LOG_TO_STDOUT)
    }

    /// Short name used in log lines
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Encrypt => "encrypt",
            Operation::Decrypt => "decrypt",
            Operation::Clearsign => "clearsign",
            Operation::Verify => "verify",
            Operation::Import => "import",
            Operation::RemoveKey => "remove-key",
        }
    }

    /// `caller ++ flags`, without touching either input
    pub fn compose(self, caller: &[&str]) -> Vec<String> {
        caller
            .iter()
            .chain(self.flags())
            .map(|s| s.to_string())
            .collect()
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Full argv after the executable: `global ++ args`
pub(crate) fn full_argv(global: &[String], args: &[String]) -> Vec<String> {
    global.iter().chain(args).cloned().collect()
}
