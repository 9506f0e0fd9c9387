//! Immutable repository descriptor and the `resolve` entry point

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::git::locate::locate;
use crate::git::remote::{normalize, Protocol, RemoteUrl};
use crate::git::state::{open, primary_remote, read_state};
use crate::Result;

/// Everything a build needs to know about the repository at a path.
///
/// Produced from a single snapshot by [`resolve`] and never mutated; resolve
/// again to observe later changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDescriptor {
    local_directory: PathBuf,
    common_directory: PathBuf,
    work_tree: PathBuf,
    branch: Option<String>,
    commit: String,
    head: Option<String>,
    remote_name: Option<String>,
    remote_branch: Option<String>,
    #[serde(flatten)]
    remote: Option<RemoteUrl>,
    tags: BTreeSet<String>,
}

/// Resolve the repository containing `path`.
///
/// Works from the main working tree and from linked worktrees alike. Fails
/// with the first error from locating, reading state, or normalizing the
/// primary remote URL; no partial descriptor is ever returned.
pub fn resolve(path: impl AsRef<Path>) -> Result<RepositoryDescriptor> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "resolving repository");

    let location = locate(path)?;
    let repo = open(&location)?;
    let state = read_state(&repo)?;

    let remote = match primary_remote(&repo, state.remote_name.as_deref())? {
        Some(config) => {
            tracing::debug!(remote = %config.name, urls = ?config.urls, "normalizing remote");
            Some(normalize(&config.urls)?)
        }
        None => None,
    };

    let descriptor = RepositoryDescriptor {
        local_directory: location.git_dir,
        common_directory: location.common_dir,
        work_tree: location.work_tree,
        branch: state.branch,
        commit: state.commit,
        head: state.head,
        remote_name: state.remote_name,
        remote_branch: state.remote_branch,
        remote,
        tags: state.tags,
    };

    tracing::debug!(
        local_directory = %descriptor.local_directory.display(),
        branch = ?descriptor.branch,
        commit = %descriptor.commit,
        "resolved repository"
    );

    Ok(descriptor)
}

impl RepositoryDescriptor {
    /// Metadata directory for this working tree (`.git` or `.git/worktrees/<name>`)
    pub fn local_directory(&self) -> &Path {
        &self.local_directory
    }

    /// Main metadata store shared by every worktree
    pub fn common_directory(&self) -> &Path {
        &self.common_directory
    }

    /// Root of the working tree that was resolved
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Root of the main working tree (parent of the main metadata store)
    pub fn main_work_tree(&self) -> &Path {
        self.common_directory
            .parent()
            .unwrap_or(&self.common_directory)
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn commit(&self) -> &str {
        &self.commit
    }

    /// Symbolic HEAD target such as `refs/heads/main`
    pub fn head(&self) -> Option<&str> {
        self.head.as_deref()
    }

    pub fn remote_name(&self) -> Option<&str> {
        self.remote_name.as_deref()
    }

    pub fn remote_branch(&self) -> Option<&str> {
        self.remote_branch.as_deref()
    }

    /// Normalized primary remote, `None` if no remote is configured
    pub fn remote(&self) -> Option<&RemoteUrl> {
        self.remote.as_ref()
    }

    pub fn protocol(&self) -> Option<Protocol> {
        self.remote.as_ref().map(|r| r.protocol)
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.endpoint.as_str())
    }

    pub fn identifier(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.identifier.as_str())
    }

    pub fn https_url(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.https_url.as_str())
    }

    pub fn ssh_url(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.ssh_url.as_str())
    }

    /// Tags pointing at [`commit`](Self::commit)
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// HEAD points directly at a commit
    pub fn is_detached(&self) -> bool {
        self.head.is_none()
    }

    pub fn is_on_branch(&self, name: &str) -> bool {
        self.branch.as_deref() == Some(name)
    }

    /// Resolved from a linked worktree rather than the main working tree
    pub fn is_linked_worktree(&self) -> bool {
        self.local_directory != self.common_directory
    }

    /// Directory name of the main working tree, used to name sibling worktrees
    pub fn repository_name(&self) -> String {
        self.main_work_tree()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("repository")
            .to_string()
    }
}
