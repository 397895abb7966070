//! Version-control capability used by the resolver.
//!
//! [`GitRunner`] runs one `git` invocation and returns stdout or a classified
//! failure. Tests substitute a recording fake.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Classified failure of one `git` invocation.
#[derive(Debug, Error)]
pub enum GitFailure {
    /// The remote repository does not exist or is not accessible.
    #[error("repository not found: {stderr}")]
    RepositoryMissing {
        /// Captured stderr.
        stderr: String,
    },
    /// The requested revision does not exist.
    #[error("revision not found: {stderr}")]
    RevisionMissing {
        /// Captured stderr.
        stderr: String,
    },
    /// The remote could not be reached.
    #[error("network failure: {stderr}")]
    Network {
        /// Captured stderr.
        stderr: String,
    },
    /// Any other non-zero exit.
    #[error("`{command}` failed (exit code {exit_code:?}): {stderr}")]
    Command {
        /// Command line that failed.
        command: String,
        /// Captured stderr.
        stderr: String,
        /// Exit code, when the process was not killed by a signal.
        exit_code: Option<i32>,
    },
    /// The process could not be spawned.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs `git` with `args`, optionally inside `cwd`.
pub trait GitRunner {
    /// Return trimmed stdout on success, or a classified failure.
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String, GitFailure>;
}

/// [`GitRunner`] backed by the system `git` binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemGit;

impl GitRunner for SystemGit {
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String, GitFailure> {
        let mut command = Command::new("git");
        command.args(args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        let output = command.output()?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        Err(classify_failure(
            format!("git {}", args.join(" ")),
            stderr,
            output.status.code(),
        ))
    }
}

const REPOSITORY_MARKERS: &[&str] = &[
    "repository not found",
    "does not appear to be a git repository",
    "could not read from remote repository",
    "not found",
];

const REVISION_MARKERS: &[&str] = &[
    "couldn't find remote ref",
    "not our ref",
    "unknown revision",
    "did not match any file(s) known to git",
    "reference is not a tree",
    "invalid reference",
    "bad object",
];

const NETWORK_MARKERS: &[&str] = &[
    "could not resolve host",
    "unable to access",
    "connection timed out",
    "connection refused",
    "network is unreachable",
    "operation timed out",
    "early eof",
];

/// Map stderr of a failed invocation onto a [`GitFailure`].
///
/// Revision markers are checked before repository markers because some git
/// versions report a missing ref with a generic "not found".
pub fn classify_failure(command: String, stderr: String, exit_code: Option<i32>) -> GitFailure {
    let lowered = stderr.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|marker| lowered.contains(marker));
    if has(NETWORK_MARKERS) {
        GitFailure::Network { stderr }
    } else if has(REVISION_MARKERS) {
        GitFailure::RevisionMissing { stderr }
    } else if has(REPOSITORY_MARKERS) {
        GitFailure::RepositoryMissing { stderr }
    } else {
        GitFailure::Command {
            command,
            stderr,
            exit_code,
        }
    }
}
