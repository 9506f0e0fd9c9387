//! Worktree commands - Run work inside an isolated linked worktree

use std::path::{Path, PathBuf};
use std::process::Command;

use clap::{Args, Subcommand};
use gitscope_core::{Config, GitRunner, Worktree, WorktreeOptions};

/// Worktree commands
#[derive(Args, Debug)]
pub struct WorktreeArgs {
    #[command(subcommand)]
    pub command: WorktreeCommand,
}

#[derive(Subcommand, Debug)]
pub enum WorktreeCommand {
    /// Run a command in a fresh worktree, then tear the worktree down
    Exec {
        /// Path inside the repository (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Command and arguments to run, given after `--`
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

impl WorktreeArgs {
    /// Execute the worktree command, returning the exit code to use
    pub fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<i32> {
        match &self.command {
            WorktreeCommand::Exec { path, command } => exec(path, command, verbose, config),
        }
    }
}

fn exec(path: &Path, command: &[String], verbose: bool, config: &Config) -> anyhow::Result<i32> {
    let descriptor = gitscope_core::resolve(path)?;
    let runner = GitRunner::from_config(&config.git);
    let options = WorktreeOptions::from(&config.worktree);

    let mut worktree = Worktree::create(&descriptor, runner, &options)?;

    if verbose {
        println!("Worktree: {}", worktree.path().display());
        println!("Branch:   {}", worktree.branch());
    }

    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("no command given"))?;

    tracing::info!(program = %program, worktree = %worktree.path().display(), "Running command");

    let status = Command::new(program)
        .args(args)
        .current_dir(worktree.path())
        .status();

    // Tear down before reporting so a spawn failure still cleans up
    let report = worktree.dispose();
    if verbose && !report.is_clean() {
        for (step, error) in report.failures() {
            eprintln!("warning: {}: {}", step, error);
        }
    }

    let status = status?;
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        worktree: WorktreeArgs,
    }

    fn parse(args: &[&str]) -> (PathBuf, Vec<String>) {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.worktree.command {
            WorktreeCommand::Exec { path, command } => (path, command),
        }
    }

    #[test]
    fn test_exec_takes_path_before_separator() {
        let (path, command) = parse(&["gitscope", "exec", "../widgets", "--", "make", "-j4"]);
        assert_eq!(path, PathBuf::from("../widgets"));
        assert_eq!(command, vec!["make", "-j4"]);
    }

    #[test]
    fn test_exec_path_defaults_to_current_directory() {
        let (path, command) = parse(&["gitscope", "exec", "--", "cargo", "--version"]);
        assert_eq!(path, PathBuf::from("."));
        assert_eq!(command, vec!["cargo", "--version"]);
    }

    #[test]
    fn test_exec_requires_command() {
        assert!(Cli::try_parse_from(["gitscope", "exec", "."]).is_err());
    }
}
