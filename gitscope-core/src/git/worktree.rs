//! Isolated linked worktree with guaranteed, best-effort teardown
//!
//! A [`Worktree`] is created eagerly next to the main working tree on a
//! fresh, uniquely named branch. Disposal removes the worktree, deletes the
//! branch, and deletes any leftover directory. Each step runs regardless of
//! the others; failures go to a [`DiagnosticSink`] and are never returned.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::process::GitRunner;
use crate::config::WorktreeConfig;
use crate::descriptor::{resolve, RepositoryDescriptor};
use crate::{Error, Result};

/// Receives teardown failures that are swallowed by [`Worktree::dispose`]
pub trait DiagnosticSink: Send {
    fn report(&self, step: TeardownStep, failure: &Error);
}

/// Default sink: logs each failure as a warning
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, step: TeardownStep, failure: &Error) {
        tracing::warn!(step = %step, error = %failure, "worktree teardown step failed");
    }
}

/// Options for creating a worktree
#[derive(Debug, Clone)]
pub struct WorktreeOptions {
    /// Appended to the repository directory name
    pub suffix: String,
    /// Prefix for the generated branch name
    pub branch_prefix: String,
}

impl Default for WorktreeOptions {
    fn default() -> Self {
        Self::from(&WorktreeConfig::default())
    }
}

impl From<&WorktreeConfig> for WorktreeOptions {
    fn from(config: &WorktreeConfig) -> Self {
        Self {
            suffix: config.suffix.clone(),
            branch_prefix: config.branch_prefix.clone(),
        }
    }
}

/// One step of worktree teardown, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    RemoveWorktree,
    DeleteBranch,
    RemoveDirectory,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownStep::RemoveWorktree => f.write_str("remove worktree"),
            TeardownStep::DeleteBranch => f.write_str("delete branch"),
            TeardownStep::RemoveDirectory => f.write_str("remove directory"),
        }
    }
}

/// Outcome of each teardown step
#[derive(Debug, Default)]
pub struct TeardownReport {
    pub outcomes: Vec<(TeardownStep, Result<()>)>,
}

impl TeardownReport {
    /// All steps succeeded (trivially true for a repeated dispose)
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// Failed steps and their errors
    pub fn failures(&self) -> impl Iterator<Item = (TeardownStep, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|(step, outcome)| outcome.as_ref().err().map(|e| (*step, e)))
    }
}

/// Compute the worktree directory for a repository.
///
/// The directory is a sibling of the main working tree, named after it
/// plus `suffix`: `/src/widgets` becomes `/src/widgets-worktree`.
pub fn worktree_path(main_work_tree: &Path, suffix: &str) -> Result<PathBuf> {
    let parent = main_work_tree.parent().ok_or_else(|| {
        Error::WorktreeCreationFailed(format!(
            "{} has no parent directory to place a worktree in",
            main_work_tree.display()
        ))
    })?;

    let name = main_work_tree
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("repository");

    Ok(parent.join(format!("{}{}", name, suffix)))
}

/// A linked worktree owned for the lifetime of this value
pub struct Worktree {
    path: PathBuf,
    branch: String,
    repo_root: PathBuf,
    runner: GitRunner,
    sink: Box<dyn DiagnosticSink>,
    disposed: bool,
}

impl fmt::Debug for Worktree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worktree")
            .field("path", &self.path)
            .field("branch", &self.branch)
            .field("repo_root", &self.repo_root)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Worktree {
    /// Create a worktree for `repository`, logging teardown failures via tracing
    pub fn create(
        repository: &RepositoryDescriptor,
        runner: GitRunner,
        options: &WorktreeOptions,
    ) -> Result<Self> {
        Self::create_with_sink(repository, runner, options, TracingSink)
    }

    /// Create a worktree, sending teardown failures to `sink`
    pub fn create_with_sink(
        repository: &RepositoryDescriptor,
        runner: GitRunner,
        options: &WorktreeOptions,
        sink: impl DiagnosticSink + 'static,
    ) -> Result<Self> {
        let repo_root = repository.main_work_tree().to_path_buf();
        let path = worktree_path(&repo_root, &options.suffix)?;

        // Leftovers from a previous run that never got cleaned up
        if path.exists() {
            tracing::info!(path = %path.display(), "removing stale worktree directory");
            fs::remove_dir_all(&path).map_err(|e| {
                Error::WorktreeCreationFailed(format!(
                    "cannot remove stale directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        let prune = runner.run(["worktree", "prune"], &repo_root)?;
        if !prune.success() {
            tracing::warn!(stderr = %prune.stderr.trim(), "git worktree prune failed");
        }

        let branch = format!("{}{}", options.branch_prefix, Uuid::new_v4().simple());

        let mut worktree = Self {
            path,
            branch,
            repo_root,
            runner,
            sink: Box::new(sink),
            disposed: false,
        };

        match worktree.add() {
            Ok(()) => {
                tracing::info!(
                    worktree = %worktree.path.display(),
                    branch = %worktree.branch,
                    "created git worktree"
                );
                Ok(worktree)
            }
            Err(e) => {
                // Partial state may exist after a timeout. Missing pieces are
                // expected here, so the sink never hears about them.
                let report = worktree.teardown();
                for (step, failure) in report.failures() {
                    tracing::debug!(step = %step, error = %failure, "cleanup after failed create");
                }
                Err(e)
            }
        }
    }

    fn add(&self) -> Result<()> {
        let args = [
            OsStr::new("worktree"),
            OsStr::new("add"),
            self.path.as_os_str(),
            OsStr::new("-b"),
            OsStr::new(&self.branch),
        ];

        let output = self.runner.run(args, &self.repo_root)?;
        if !output.success() {
            return Err(Error::WorktreeCreationFailed(output.stderr));
        }

        Ok(())
    }

    /// Directory of the worktree
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Branch checked out in the worktree
    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Resolve the descriptor of the worktree itself
    pub fn resolve(&self) -> Result<RepositoryDescriptor> {
        resolve(&self.path)
    }

    /// Tear the worktree down. Never fails; repeated calls do nothing.
    pub fn dispose(&mut self) -> TeardownReport {
        if self.disposed {
            return TeardownReport::default();
        }

        let report = self.teardown();
        for (step, failure) in report.failures() {
            self.sink.report(step, failure);
        }

        tracing::info!(
            worktree = %self.path.display(),
            clean = report.is_clean(),
            "disposed git worktree"
        );

        report
    }

    /// Run every teardown step once and mark the worktree disposed
    fn teardown(&mut self) -> TeardownReport {
        self.disposed = true;

        let mut report = TeardownReport::default();

        // Forcing twice overrides both the "dirty" and the "locked" guard
        let remove = [
            OsStr::new("worktree"),
            OsStr::new("remove"),
            OsStr::new("--force"),
            OsStr::new("--force"),
            self.path.as_os_str(),
        ];
        let removed = self.git_step(TeardownStep::RemoveWorktree, remove);
        report.outcomes.push((TeardownStep::RemoveWorktree, removed));

        let delete = [
            OsStr::new("branch"),
            OsStr::new("-D"),
            OsStr::new(&self.branch),
        ];
        let deleted = self.git_step(TeardownStep::DeleteBranch, delete);
        report.outcomes.push((TeardownStep::DeleteBranch, deleted));

        let directory = if self.path.exists() {
            fs::remove_dir_all(&self.path).map_err(|e| Error::WorktreeTeardownFailed {
                step: TeardownStep::RemoveDirectory.to_string(),
                message: e.to_string(),
            })
        } else {
            Ok(())
        };
        report.outcomes.push((TeardownStep::RemoveDirectory, directory));

        report
    }

    fn git_step<'a>(
        &self,
        step: TeardownStep,
        args: impl IntoIterator<Item = &'a OsStr>,
    ) -> Result<()> {
        let failed = |message: String| Error::WorktreeTeardownFailed {
            step: step.to_string(),
            message,
        };

        match self.runner.run(args, &self.repo_root) {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(failed(output.stderr.trim().to_string())),
            Err(e) => Err(failed(e.to_string())),
        }
    }
}

impl Drop for Worktree {
    fn drop(&mut self) {
        if !self.disposed {
            self.dispose();
        }
    }
}
