//! Git operations for gitscope
//!
//! This module provides metadata discovery, ref state reading, remote URL
//! normalization, and isolated worktree management.

pub mod locate;
pub mod process;
pub mod remote;
pub mod state;
pub mod worktree;

pub use locate::{locate, GitLocation};
pub use process::{GitRunner, ProcessOutput};
pub use remote::{normalize, Protocol, RemoteUrl};
pub use state::{RemoteConfig, RepositoryState};
pub use worktree::{
    worktree_path, DiagnosticSink, TeardownReport, TeardownStep, TracingSink, Worktree,
    WorktreeOptions,
};
