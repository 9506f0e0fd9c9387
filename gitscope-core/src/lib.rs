//! gitscope Core - Repository descriptors for build tooling
//!
//! Resolves a path inside a git working tree (main tree or linked worktree)
//! into an immutable [`RepositoryDescriptor`]: branch, commit, HEAD, tags,
//! tracking information, and the primary remote in canonical HTTPS and SSH
//! forms. Also manages short-lived isolated worktrees for tests and
//! isolated builds.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod git;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use descriptor::{resolve, RepositoryDescriptor};
pub use error::{Error, Result};
pub use git::{
    locate, normalize, DiagnosticSink, GitLocation, GitRunner, Protocol, RemoteUrl,
    TeardownReport, TeardownStep, TracingSink, Worktree, WorktreeOptions,
};
