//! Error types for gitscope

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for gitscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gitscope operations
#[derive(Error, Debug)]
pub enum Error {
    /// No git metadata entry was found walking up from the path
    #[error("Not a git repository (or any parent up to the filesystem root): {}", path.display())]
    NotARepository { path: PathBuf },

    /// The metadata store exists but could not be read or is corrupt
    #[error("Repository state unreadable: {0}")]
    RepositoryStateUnreadable(String),

    /// Remote URL matches none of the supported dialects
    #[error("Unrecognized remote URL '{url}': {reason}")]
    UnrecognizedUrl { url: String, reason: String },

    /// `git worktree add` (or its preparation) failed
    #[error("Worktree creation failed: {0}")]
    WorktreeCreationFailed(String),

    /// A single teardown step failed; only ever reported to a diagnostic sink
    #[error("Worktree teardown step '{step}' failed: {message}")]
    WorktreeTeardownFailed { step: String, message: String },

    /// The external process did not finish within the configured timeout
    #[error("Command `{command}` timed out after {}s", timeout.as_secs())]
    ProcessTimedOut { command: String, timeout: Duration },

    /// The external process exited with a non-zero status
    #[error("Command `{command}` failed with exit code {code:?}: {stderr}")]
    ProcessFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn unrecognized_url(url: &str, reason: impl Into<String>) -> Self {
        Error::UnrecognizedUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<git2::Error> for Error {
    fn from(e: git2::Error) -> Self {
        Error::RepositoryStateUnreadable(e.message().to_string())
    }
}
