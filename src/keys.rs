//! Key import results and the text scanning around them.
//!
//! gpg reports imports in its log output, e.g.
//!
//! ```text
//! gpg: key 833744386F20F59D: public key "Test <test@example.com>" imported
//! gpg: Total number processed: 1
//! gpg:               imported: 1
//! ```
//!
//! The hex identifier after `key` is returned as the fingerprint, including
//! the `0x` prefix gpg prints under `keyid-format 0xlong`/`0xshort`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Phrase gpg uses when a secret key is imported a second time
pub const ALREADY_IN_SECRET_KEYRING: &str = "already in secret keyring";

static KEY_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"key ((?:0[xX])?[0-9A-Fa-f]+):").expect("key id pattern is valid"));

/// Result of importing key material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// gpg's diagnostic report
    pub output: String,
    /// Identifier of the first key mentioned in the report
    pub fingerprint: Option<String>,
    /// Set when a failed import was downgraded because the secret key was
    /// already present
    pub already_present: bool,
}

impl ImportOutcome {
    pub(crate) fn from_report(output: String, already_present: bool) -> Self {
        let fingerprint = extract_fingerprint(&output);
        Self {
            output,
            fingerprint,
            already_present,
        }
    }
}

/// First `key <hex>:` identifier in `text`
pub fn extract_fingerprint(text: &str) -> Option<String> {
    KEY_ID_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether a failure message is the "already in secret keyring" conflict
pub fn is_existing_secret_key(message: &str) -> bool {
    message.contains(ALREADY_IN_SECRET_KEYRING)
}
