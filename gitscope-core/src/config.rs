//! Configuration management for gitscope
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GITSCOPE_*)
//! 3. Config file (~/.config/gitscope/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Settings for the external git executable
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitConfig {
    /// Path to the git executable
    pub binary: String,

    /// Kill git invocations that run longer than this (e.g. "30s")
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            timeout: None,
        }
    }
}

/// Settings for isolated worktrees
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorktreeConfig {
    /// Appended to the repository directory name to form the worktree directory
    pub suffix: String,

    /// Prefix for generated worktree branch names
    pub branch_prefix: String,
}

impl Default for WorktreeConfig {
    fn default() -> Self {
        Self {
            suffix: "-worktree".to_string(),
            branch_prefix: "gitscope/".to_string(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Git executable configuration
    pub git: GitConfig,

    /// Worktree configuration
    pub worktree: WorktreeConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/gitscope/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitscope").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITSCOPE_GIT_PATH: Path to git executable
    /// - GITSCOPE_GIT_TIMEOUT: Timeout for git invocations (e.g. "45s")
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(binary) = lookup("GITSCOPE_GIT_PATH") {
            self.git.binary = binary;
        }

        if let Some(timeout) = lookup("GITSCOPE_GIT_TIMEOUT") {
            let parsed = humantime_serde::re::humantime::parse_duration(&timeout).map_err(|e| {
                Error::Config(format!("Invalid GITSCOPE_GIT_TIMEOUT '{}': {}", timeout, e))
            })?;
            self.git.timeout = Some(parsed);
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, git_path: Option<String>) -> Self {
        if let Some(path) = git_path {
            self.git.binary = path;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(git_path: Option<String>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(git_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.git.binary, "git");
        assert!(config.git.timeout.is_none());
        assert_eq!(config.worktree.suffix, "-worktree");
        assert_eq!(config.worktree.branch_prefix, "gitscope/");
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(Some("/opt/git/bin/git".to_string()));
        assert_eq!(config.git.binary, "/opt/git/bin/git");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_overrides_from(|key| match key {
                "GITSCOPE_GIT_PATH" => Some("/usr/local/bin/git".to_string()),
                "GITSCOPE_GIT_TIMEOUT" => Some("45s".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.git.binary, "/usr/local/bin/git");
        assert_eq!(config.git.timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn test_env_override_bad_timeout() {
        let result = Config::default().with_overrides_from(|key| {
            (key == "GITSCOPE_GIT_TIMEOUT").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[git]
binary = "/usr/bin/git"
timeout = "2m"

[worktree]
suffix = "-isolated"
branch_prefix = "ci/"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.git.binary, "/usr/bin/git");
        assert_eq!(config.git.timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.worktree.suffix, "-isolated");
        assert_eq!(config.worktree.branch_prefix, "ci/");
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[worktree]
suffix = "-tmp"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        // Unspecified values fall back to defaults
        assert_eq!(config.git.binary, "git");
        assert!(config.git.timeout.is_none());
        assert_eq!(config.worktree.suffix, "-tmp");
        assert_eq!(config.worktree.branch_prefix, "gitscope/");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[git]\nbinary = \"git2\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.git.binary, "git2");
    }

    #[test]
    fn test_load_from_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[git\nbinary = ").unwrap();

        assert!(matches!(
            Config::load_from_file(&path),
            Err(Error::Config(_))
        ));
    }
}
