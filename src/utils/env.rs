//! Environment variable handling
//!
//! Shell completion is requested through `_RCTCLIENT_COMPLETE`. Besides the
//! plain shell names, the `source_<shell>` and `<shell>_source` forms are
//! accepted, so `eval "$(_RCTCLIENT_COMPLETE=source_bash rctclient)"` works.

use std::env;
use tracing::debug;

/// Variable that switches the program into completion mode
pub const COMPLETE_VAR: &str = "_RCTCLIENT_COMPLETE";

const SHELLS: [&str; 5] = ["bash", "elvish", "fish", "powershell", "zsh"];

/// Shell named by a completion request value
#[must_use]
pub fn completion_shell(value: &str) -> Option<&'static str> {
    let shell = value
        .strip_prefix("source_")
        .or_else(|| value.strip_suffix("_source"))
        .unwrap_or(value);
    SHELLS.into_iter().find(|candidate| *candidate == shell)
}

/// Rewrite a legacy completion request to the plain shell name
///
/// Must run before any other thread is started.
pub fn normalize_completion_var() {
    let Ok(value) = env::var(COMPLETE_VAR) else {
        return;
    };
    if let Some(shell) = completion_shell(&value) {
        if shell != value {
            debug!("Completion request {} treated as {}", value, shell);
            EnvUtils::set_var(COMPLETE_VAR, shell);
        }
    }
}

/// Environment variable utilities
#[derive(Debug)]
pub struct EnvUtils;

impl EnvUtils {
    /// Set environment variable
    pub fn set_var<K, V>(key: K, value: V)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        unsafe { env::set_var(key.as_ref(), value.as_ref()) }
    }
}
