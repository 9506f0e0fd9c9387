//! gitscope CLI - Inspect git repositories from build tooling
//!
//! Prints repository descriptors and runs commands in isolated worktrees.

mod commands;

use clap::{Parser, Subcommand};
use gitscope_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{DescribeArgs, WorktreeArgs};

/// gitscope: repository descriptors and isolated worktrees
#[derive(Parser, Debug)]
#[command(name = "gitscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to git executable (overrides config and env)
    #[arg(long, global = true, env = "GITSCOPE_GIT_PATH")]
    git_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Describe the repository containing a path
    #[command(visible_alias = "d")]
    Describe(DescribeArgs),

    /// Work with isolated worktrees
    #[command(visible_alias = "wt")]
    Worktree(WorktreeArgs),

    /// Show current configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.git_path.clone())?;

    if cli.verbose {
        tracing::info!(
            git = %config.git.binary,
            timeout = ?config.git.timeout,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("gitscope {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Describe(args)) => {
            args.execute(cli.verbose)?;
        }
        Some(Commands::Worktree(args)) => {
            let code = args.execute(cli.verbose, &config)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Some(Commands::Config) => {
            println!("gitscope Configuration");
            println!("======================");
            println!();
            println!("Git Settings:");
            println!("  binary:  {}", config.git.binary);
            match config.git.timeout {
                Some(timeout) => println!("  timeout: {}s", timeout.as_secs()),
                None => println!("  timeout: (none)"),
            }
            println!();
            println!("Worktree Settings:");
            println!("  suffix:        {}", config.worktree.suffix);
            println!("  branch_prefix: {}", config.worktree.branch_prefix);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("gitscope - Repository descriptors for build tooling");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
