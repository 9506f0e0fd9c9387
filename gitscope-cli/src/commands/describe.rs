//! Describe command - Print the repository descriptor for a path

use std::path::PathBuf;

use clap::Args;
use gitscope_core::RepositoryDescriptor;

/// Arguments for the describe command
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Path inside the working tree (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Print the descriptor as JSON
    #[arg(long)]
    pub json: bool,
}

impl DescribeArgs {
    /// Execute the describe command
    pub fn execute(&self, verbose: bool) -> anyhow::Result<()> {
        if verbose {
            tracing::info!(path = %self.path.display(), "Resolving repository");
        }

        let descriptor = gitscope_core::resolve(&self.path)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        } else {
            print_descriptor(&descriptor);
        }

        Ok(())
    }
}

fn print_descriptor(d: &RepositoryDescriptor) {
    let or_none = |value: Option<&str>| value.unwrap_or("(none)").to_string();

    println!("Repository");
    println!("==========");
    println!();
    println!("Name:          {}", d.repository_name());
    println!("Directory:     {}", d.local_directory().display());
    println!("Work tree:     {}", d.work_tree().display());
    if d.is_linked_worktree() {
        println!("Main store:    {}", d.common_directory().display());
    }
    println!(
        "Branch:        {}",
        if d.is_detached() {
            "(detached HEAD)".to_string()
        } else {
            or_none(d.branch())
        }
    );
    println!("Commit:        {}", d.commit());
    println!("HEAD:          {}", or_none(d.head()));
    println!("Remote:        {}", or_none(d.remote_name()));
    println!("Remote branch: {}", or_none(d.remote_branch()));

    match d.remote() {
        Some(remote) => {
            println!("Protocol:      {}", remote.protocol);
            println!("Endpoint:      {}", remote.endpoint);
            println!("Identifier:    {}", remote.identifier);
            println!("HTTPS URL:     {}", remote.https_url);
            println!("SSH URL:       {}", remote.ssh_url);
        }
        None => println!("Protocol:      (no remote configured)"),
    }

    if d.tags().is_empty() {
        println!("Tags:          (none)");
    } else {
        let tags: Vec<&str> = d.tags().iter().map(String::as_str).collect();
        println!("Tags:          {}", tags.join(", "));
    }
}
