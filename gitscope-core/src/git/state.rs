//! Reading HEAD, tracking configuration, tags and remotes

use std::collections::BTreeSet;

use git2::{ErrorCode, Repository};

use super::locate::GitLocation;
use crate::{Error, Result};

const HEADS_PREFIX: &str = "refs/heads/";

/// Point-in-time snapshot of a working tree's ref state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryState {
    /// Current branch, `None` when HEAD is detached
    pub branch: Option<String>,
    /// Full hash HEAD resolves to
    pub commit: String,
    /// Symbolic target of HEAD (e.g. `refs/heads/main`), `None` when detached
    pub head: Option<String>,
    /// Remote the current branch tracks
    pub remote_name: Option<String>,
    /// Branch on the remote the current branch tracks
    pub remote_branch: Option<String>,
    /// Tags pointing at `commit`
    pub tags: BTreeSet<String>,
}

/// A configured remote and its URLs in config order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub name: String,
    pub urls: Vec<String>,
}

/// Open the repository for a located working tree.
///
/// The working tree is opened rather than the metadata directory so that
/// libgit2 reads the worktree's own HEAD while sharing config and refs with
/// the main store.
pub fn open(location: &GitLocation) -> Result<Repository> {
    Repository::open(&location.work_tree).map_err(|e| {
        Error::RepositoryStateUnreadable(format!(
            "cannot open repository at {}: {}",
            location.work_tree.display(),
            e.message()
        ))
    })
}

/// Read branch, commit, HEAD, tracking info and tags. Never mutates the repository.
pub fn read_state(repo: &Repository) -> Result<RepositoryState> {
    let head_ref = repo.find_reference("HEAD")?;
    let head = head_ref.symbolic_target().map(str::to_string);
    let branch = head
        .as_deref()
        .and_then(|target| target.strip_prefix(HEADS_PREFIX))
        .map(str::to_string);

    let commit = match repo.head() {
        Ok(reference) => reference.peel_to_commit()?.id(),
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            return Err(Error::RepositoryStateUnreadable(
                "HEAD does not point at a commit yet".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let (remote_name, remote_branch) = match branch.as_deref() {
        Some(name) => read_tracking(repo, name)?,
        None => (None, None),
    };

    let tags = tags_at(repo, commit)?;

    tracing::debug!(
        branch = ?branch,
        commit = %commit,
        remote = ?remote_name,
        tags = tags.len(),
        "read repository state"
    );

    Ok(RepositoryState {
        branch,
        commit: commit.to_string(),
        head,
        remote_name,
        remote_branch,
        tags,
    })
}

/// `branch.<name>.remote` and `branch.<name>.merge`, only as a pair.
fn read_tracking(repo: &Repository, branch: &str) -> Result<(Option<String>, Option<String>)> {
    let config = repo.config()?;

    let remote = match config.get_string(&format!("branch.{}.remote", branch)) {
        Ok(remote) => remote,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok((None, None)),
        Err(e) => return Err(e.into()),
    };

    let merge = match config.get_string(&format!("branch.{}.merge", branch)) {
        Ok(merge) => merge,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok((Some(remote), None)),
        Err(e) => return Err(e.into()),
    };

    let remote_branch = merge.strip_prefix(HEADS_PREFIX).unwrap_or(&merge).to_string();
    Ok((Some(remote), Some(remote_branch)))
}

fn tags_at(repo: &Repository, commit: git2::Oid) -> Result<BTreeSet<String>> {
    let mut tags = BTreeSet::new();

    for name in repo.tag_names(None)?.iter().flatten() {
        let reference = match repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(tag = name, error = %e, "skipping unreadable tag");
                continue;
            }
        };

        // Tags on trees or blobs do not peel to a commit
        if let Ok(target) = reference.peel_to_commit() {
            if target.id() == commit {
                tags.insert(name.to_string());
            }
        }
    }

    Ok(tags)
}

/// Pick the primary remote: the tracked one, else `origin`, else the first configured.
pub fn primary_remote(repo: &Repository, tracked: Option<&str>) -> Result<Option<RemoteConfig>> {
    let remotes = repo.remotes()?;
    let names: Vec<&str> = remotes.iter().flatten().collect();

    let chosen = tracked
        .filter(|t| names.contains(t))
        .or_else(|| names.iter().copied().find(|n| *n == "origin"))
        .or_else(|| names.first().copied());

    let Some(name) = chosen else {
        return Ok(None);
    };

    let config = repo.config()?;
    let mut entries = config.multivar(&format!("remote.{}.url", name), None)?;
    let mut urls = Vec::new();
    while let Some(entry) = entries.next() {
        let entry = entry?;
        if let Some(value) = entry.value() {
            urls.push(value.to_string());
        }
    }

    Ok(Some(RemoteConfig {
        name: name.to_string(),
        urls,
    }))
}
