//! Blocking invocation of the external git executable

use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::GitConfig;
use crate::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished git process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs git subcommands in a working directory
#[derive(Debug, Clone)]
pub struct GitRunner {
    binary: String,
    timeout: Option<Duration>,
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::from_config(&GitConfig::default())
    }
}

impl GitRunner {
    /// Create a runner using `git` from PATH and no timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner from git configuration
    pub fn from_config(config: &GitConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: config.timeout,
        }
    }

    /// Set a custom path to the git executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Kill invocations that exceed `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run git with `args` in `cwd`, returning the output whatever the exit code
    pub fn run<I, S>(&self, args: I, cwd: &Path) -> Result<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        let rendered = self.render(&args);

        tracing::debug!(command = %rendered, cwd = %cwd.display(), "running git");

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("GIT_TERMINAL_PROMPT", "0")
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .env_remove("GIT_INDEX_FILE");

        let output = match self.timeout {
            None => {
                let output = cmd.output()?;
                ProcessOutput {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }
            }
            Some(timeout) => wait_with_timeout(cmd.spawn()?, timeout, &rendered)?,
        };

        tracing::debug!(command = %rendered, code = ?output.code, "git finished");
        Ok(output)
    }

    /// Run git and turn a non-zero exit into [`Error::ProcessFailed`]
    pub fn run_checked<I, S>(&self, args: I, cwd: &Path) -> Result<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        let output = self.run(&args, cwd)?;

        if !output.success() {
            return Err(Error::ProcessFailed {
                command: self.render(&args),
                code: output.code,
                stderr: output.stderr,
            });
        }

        Ok(output)
    }

    fn render(&self, args: &[std::ffi::OsString]) -> String {
        let mut rendered = self.binary.clone();
        for arg in args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }
}

/// Poll `child` until it exits or `timeout` elapses.
///
/// Pipes are drained on separate threads so a chatty child cannot block on a
/// full pipe while we wait for it.
fn wait_with_timeout(mut child: Child, timeout: Duration, command: &str) -> Result<ProcessOutput> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }

        if start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(command, timeout = ?timeout, "git timed out");
            return Err(Error::ProcessTimedOut {
                command: command.to_string(),
                timeout,
            });
        }

        thread::sleep(POLL_INTERVAL);
    };

    let collect = |handle: Option<thread::JoinHandle<Vec<u8>>>| {
        handle
            .and_then(|h| h.join().ok())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    };

    Ok(ProcessOutput {
        code: status.code(),
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}
