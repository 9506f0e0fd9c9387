//! Scoped repository fixtures for tests
//!
//! Each [`TestRepo`] owns a temporary directory laid out as
//! `<tmp>/widgets` (the repository) with room for sibling worktrees, and is
//! removed when dropped. Git is driven through the CLI with environment
//! variables that could leak from an enclosing repository stripped.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::git::worktree::{DiagnosticSink, TeardownStep};
use crate::Error;

pub struct TestRepo {
    _dir: TempDir,
    root: PathBuf,
    path: PathBuf,
}

impl TestRepo {
    /// Repository on `main` with one empty commit
    pub fn new() -> Self {
        let repo = Self::empty();
        repo.commit("initial");
        repo
    }

    /// Freshly initialized repository without commits
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let path = root.join("widgets");
        std::fs::create_dir_all(&path).unwrap();

        Self::git_in(&path, &["init", "--quiet"]);
        Self::git_in(&path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        Self::git_in(&path, &["config", "user.name", "Test"]);
        Self::git_in(&path, &["config", "user.email", "test@example.com"]);
        Self::git_in(&path, &["config", "commit.gpgsign", "false"]);
        Self::git_in(&path, &["config", "tag.gpgsign", "false"]);

        Self {
            _dir: dir,
            root,
            path,
        }
    }

    /// Temporary directory containing the repository and its sibling worktrees
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Main working tree
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_dir(&self) -> PathBuf {
        self.path.join(".git")
    }

    /// Run git in the main working tree and return trimmed stdout
    pub fn git(&self, args: &[&str]) -> String {
        Self::git_in(&self.path, args)
    }

    /// Run git in `dir`, panicking with stderr on failure
    pub fn git_in(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .env_remove("GIT_DIR")
            .env_remove("GIT_INDEX_FILE")
            .env_remove("GIT_WORK_TREE")
            .output()
            .unwrap();

        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );

        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Create an empty commit and return its hash
    pub fn commit(&self, message: &str) -> String {
        self.git(&["commit", "--allow-empty", "--quiet", "-m", message]);
        self.head_commit()
    }

    pub fn head_commit(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn add_remote(&self, name: &str, url: &str) {
        self.git(&["remote", "add", name, url]);
    }

    /// Add a linked worktree at `<root>/<dir_name>` on a new branch
    pub fn add_worktree(&self, dir_name: &str, branch: &str) -> PathBuf {
        let path = self.root.join(dir_name);
        let path_arg = path.to_string_lossy().into_owned();
        self.git(&["worktree", "add", &path_arg, "-b", branch]);
        path
    }

    /// Local branch names
    pub fn branches(&self) -> Vec<String> {
        self.git(&["branch", "--format=%(refname:short)"])
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Sink that remembers which teardown steps failed
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    steps: Arc<Mutex<Vec<TeardownStep>>>,
}

impl RecordingSink {
    pub fn steps(&self) -> Vec<TeardownStep> {
        self.steps.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, step: TeardownStep, _failure: &Error) {
        self.steps.lock().unwrap().push(step);
    }
}
