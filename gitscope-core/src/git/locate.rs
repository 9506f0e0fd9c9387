//! Locating the git metadata directory for a path
//!
//! Linked worktrees contain a `.git` *file* holding a single
//! `gitdir: <path>` line instead of the metadata directory itself. The
//! referenced directory is usually `<main>/.git/worktrees/<name>`, which
//! holds the worktree's own HEAD and a `commondir` file pointing back at
//! the shared store.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

const DOT_GIT: &str = ".git";
const GITDIR_PREFIX: &str = "gitdir:";
const COMMONDIR_FILE: &str = "commondir";

/// Where a repository's metadata lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLocation {
    /// Metadata directory holding HEAD for this working tree
    pub git_dir: PathBuf,
    /// Main metadata store shared by all worktrees (config, refs, tags)
    pub common_dir: PathBuf,
    /// Working tree root that contained the `.git` entry
    pub work_tree: PathBuf,
}

impl GitLocation {
    /// Whether this location is a linked worktree rather than the main tree
    pub fn is_linked_worktree(&self) -> bool {
        self.git_dir != self.common_dir
    }
}

/// Walk upward from `start` to find the git metadata directory.
pub fn locate(start: impl AsRef<Path>) -> Result<GitLocation> {
    locate_below(start.as_ref(), None)
}

/// Like [`locate`], but never look above `ceiling` (which is itself searched).
fn locate_below(start: &Path, ceiling: Option<&Path>) -> Result<GitLocation> {
    let canonical = fs::canonicalize(start).map_err(|_| Error::NotARepository {
        path: start.to_path_buf(),
    })?;

    let mut dir = if canonical.is_file() {
        canonical.parent().map(Path::to_path_buf).unwrap_or(canonical)
    } else {
        canonical
    };

    loop {
        let entry = dir.join(DOT_GIT);

        if entry.is_dir() {
            tracing::debug!(git_dir = %entry.display(), "found metadata directory");
            let common_dir = read_common_dir(&entry)?;
            return Ok(GitLocation {
                git_dir: entry,
                common_dir,
                work_tree: dir,
            });
        }

        if entry.is_file() {
            let git_dir = follow_pointer(&entry)?;
            tracing::debug!(
                pointer = %entry.display(),
                git_dir = %git_dir.display(),
                "followed worktree pointer"
            );
            let common_dir = read_common_dir(&git_dir)?;
            return Ok(GitLocation {
                git_dir,
                common_dir,
                work_tree: dir,
            });
        }

        if ceiling.is_some_and(|c| dir == c) || !dir.pop() {
            return Err(Error::NotARepository {
                path: start.to_path_buf(),
            });
        }
    }
}

/// Read a `.git` pointer file and return the canonical directory it names.
fn follow_pointer(pointer: &Path) -> Result<PathBuf> {
    let content = fs::read_to_string(pointer).map_err(|e| {
        Error::RepositoryStateUnreadable(format!("cannot read {}: {}", pointer.display(), e))
    })?;

    let target = parse_gitdir_pointer(&content).ok_or_else(|| {
        Error::RepositoryStateUnreadable(format!(
            "{} does not contain a '{}' line",
            pointer.display(),
            GITDIR_PREFIX
        ))
    })?;

    // Relative targets are relative to the directory holding the pointer
    let base = pointer.parent().unwrap_or_else(|| Path::new("."));
    resolve_dir(base, &target)
}

/// Follow `commondir` if present; otherwise the directory is its own store.
fn read_common_dir(git_dir: &Path) -> Result<PathBuf> {
    let commondir = git_dir.join(COMMONDIR_FILE);
    if !commondir.is_file() {
        return Ok(git_dir.to_path_buf());
    }

    let content = fs::read_to_string(&commondir).map_err(|e| {
        Error::RepositoryStateUnreadable(format!("cannot read {}: {}", commondir.display(), e))
    })?;
    let target = content.trim();
    if target.is_empty() {
        return Err(Error::RepositoryStateUnreadable(format!(
            "{} is empty",
            commondir.display()
        )));
    }

    resolve_dir(git_dir, Path::new(target))
}

fn resolve_dir(base: &Path, target: &Path) -> Result<PathBuf> {
    let joined = base.join(target);
    let resolved = fs::canonicalize(&joined).map_err(|e| {
        Error::RepositoryStateUnreadable(format!(
            "metadata directory {} is missing: {}",
            joined.display(),
            e
        ))
    })?;

    if !resolved.is_dir() {
        return Err(Error::RepositoryStateUnreadable(format!(
            "{} is not a directory",
            resolved.display()
        )));
    }

    Ok(resolved)
}

fn parse_gitdir_pointer(content: &str) -> Option<PathBuf> {
    content.lines().find_map(|line| {
        line.trim()
            .strip_prefix(GITDIR_PREFIX)
            .map(str::trim)
            .filter(|rest| !rest.is_empty())
            .map(PathBuf::from)
    })
}
