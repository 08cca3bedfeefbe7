use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

/// Version-control collaborator: stage one file, then commit.
pub trait VersionControl {
    fn stage(&self, path: &Path) -> Result<(), VcsError>;
    fn commit(&self, message: &str) -> Result<(), VcsError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("git not available: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("git {step} failed (exit {code}): {stderr}")]
    Failed {
        step: &'static str,
        code: i32,
        stderr: String,
    },
    #[error("git {step} timed out after {}s", .after.as_secs())]
    TimedOut { step: &'static str, after: Duration },
}

/// Runs the `git` binary with an argument vector (no shell).
pub struct GitCli {
    workdir: PathBuf,
    timeout: Option<Duration>,
}

impl GitCli {
    pub fn new(workdir: &Path, timeout: Option<Duration>) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            timeout,
        }
    }

    fn run(&self, step: &'static str, args: &[&str]) -> Result<(), VcsError> {
        tracing::debug!(step, ?args, "running git");
        let mut child = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(VcsError::Spawn)?;

        // Hooks can write more than a pipe buffer; drain while git runs.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });

        let status = match self.timeout {
            None => child.wait().map_err(VcsError::Spawn)?,
            Some(limit) => match child.wait_timeout(limit).map_err(VcsError::Spawn)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(VcsError::TimedOut { step, after: limit });
                }
            },
        };

        if status.success() {
            return Ok(());
        }
        let stderr = stderr
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        Err(VcsError::Failed {
            step,
            code: status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        })
    }
}

impl VersionControl for GitCli {
    fn stage(&self, path: &Path) -> Result<(), VcsError> {
        let path = path.to_string_lossy();
        self.run("add", &["add", "--", &*path])
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.run("commit", &["commit", "-m", message])
    }
}

/// Stage `path` and commit it. Failures are logged and reported through
/// the return value; they never abort the caller. A failed stage skips
/// the commit so unrelated staged changes are not committed alone.
pub fn commit_checkpoint(vcs: &dyn VersionControl, path: &Path, message: &str) -> bool {
    if let Err(e) = vcs.stage(path) {
        tracing::warn!(error = %e, path = %path.display(), "could not stage thread file");
        return false;
    }
    match vcs.commit(message) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "commit failed");
            false
        }
    }
}

/// Records calls instead of running git.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingVcs {
    pub calls: std::cell::RefCell<Vec<String>>,
    pub fail_stage: bool,
    pub fail_commit: bool,
}

#[cfg(test)]
impl VersionControl for RecordingVcs {
    fn stage(&self, path: &Path) -> Result<(), VcsError> {
        self.calls.borrow_mut().push(format!("add {}", path.display()));
        if self.fail_stage {
            return Err(VcsError::Failed {
                step: "add",
                code: 128,
                stderr: "not a git repository".into(),
            });
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.calls.borrow_mut().push(format!("commit {message}"));
        if self.fail_commit {
            return Err(VcsError::Failed {
                step: "commit",
                code: 1,
                stderr: "nothing to commit".into(),
            });
        }
        Ok(())
    }
}
