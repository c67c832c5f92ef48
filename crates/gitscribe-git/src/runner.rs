use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::{classify_failure, GitError};

/// Deadline applied to every git invocation unless overridden.
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of one git invocation.
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl GitOutput {
    pub fn new(stdout: String, stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            duration,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout and stderr together; git spreads failure detail across both.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs the `git` executable with an explicit working directory and deadline.
///
/// Every other engine component goes through this type; nothing else spawns
/// processes. Non-zero exits are data for [`GitRunner::run`] and errors for
/// [`GitRunner::run_checked`].
#[derive(Debug)]
pub struct GitRunner {
    repo_root: PathBuf,
    timeout: Duration,
}

impl GitRunner {
    /// Locate the repository containing `working_dir` and bind a runner to
    /// its root.
    pub async fn discover(working_dir: &Path) -> Result<Self, GitError> {
        let output = exec(
            working_dir,
            &["rev-parse", "--show-toplevel"],
            &[],
            DEFAULT_GIT_TIMEOUT,
        )
        .await?;

        if !output.success() {
            return Err(GitError::NotARepository(working_dir.to_path_buf()));
        }

        let repo_root = PathBuf::from(output.stdout.trim());
        debug!(repo_root = %repo_root.display(), "discovered git repository");

        Ok(Self {
            repo_root,
            timeout: DEFAULT_GIT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Run git and hand back whatever happened, non-zero exits included.
    pub async fn run(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        exec(&self.repo_root, args, &[], self.timeout).await
    }

    /// Run git with extra environment variables set for the child process.
    pub async fn run_with_env(
        &self,
        args: &[&str],
        env: &[(String, String)],
    ) -> Result<GitOutput, GitError> {
        exec(&self.repo_root, args, env, self.timeout).await
    }

    /// Run git and turn a non-zero exit into a classified error.
    pub async fn run_checked(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        let output = self.run(args).await?;
        if !output.success() {
            let command = args.first().copied().unwrap_or("git");
            return Err(classify_failure(
                &self.repo_root,
                command,
                output.exit_code,
                &output.stderr,
            ));
        }
        Ok(output)
    }
}

async fn exec(
    dir: &Path,
    args: &[&str],
    env: &[(String, String)],
    timeout: Duration,
) -> Result<GitOutput, GitError> {
    let start = Instant::now();

    debug!(
        args = ?args,
        working_dir = %dir.display(),
        "running git"
    );

    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true);

    for (key, value) in env {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn()?;

    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let capture = async move {
        let mut stdout = String::new();
        let mut stderr = String::new();

        if let (Some(out), Some(err)) = (stdout_handle, stderr_handle) {
            let mut stdout_reader = BufReader::new(out).lines();
            let mut stderr_reader = BufReader::new(err).lines();
            let mut stderr_done = false;

            // Read both streams concurrently so neither pipe fills up
            loop {
                tokio::select! {
                    biased;

                    result = stdout_reader.next_line() => {
                        match result {
                            Ok(Some(line)) => {
                                trace!(line = %line, "stdout");
                                if !stdout.is_empty() {
                                    stdout.push('\n');
                                }
                                stdout.push_str(&line);
                            }
                            Ok(None) => {
                                // stdout closed, drain remaining stderr
                                while let Ok(Some(line)) = stderr_reader.next_line().await {
                                    trace!(line = %line, "stderr");
                                    if !stderr.is_empty() {
                                        stderr.push('\n');
                                    }
                                    stderr.push_str(&line);
                                }
                                break;
                            }
                            Err(e) => return Err(GitError::SpawnFailed(e)),
                        }
                    }
                    result = stderr_reader.next_line(), if !stderr_done => {
                        match result {
                            Ok(Some(line)) => {
                                trace!(line = %line, "stderr");
                                if !stderr.is_empty() {
                                    stderr.push('\n');
                                }
                                stderr.push_str(&line);
                            }
                            Ok(None) => {
                                // stderr closed, keep reading stdout
                                stderr_done = true;
                            }
                            Err(e) => return Err(GitError::SpawnFailed(e)),
                        }
                    }
                }
            }
        }

        let status = child.wait().await?;
        Ok((stdout, stderr, status))
    };

    match tokio::time::timeout(timeout, capture).await {
        Ok(result) => {
            let (stdout, stderr, status) = result?;
            let duration = start.elapsed();

            debug!(
                exit_code = status.code().unwrap_or(-1),
                duration_ms = duration.as_millis(),
                "git completed"
            );

            Ok(GitOutput::new(
                stdout,
                stderr,
                status.code().unwrap_or(-1),
                duration,
            ))
        }
        // Dropping the capture future drops the child; kill_on_drop reaps it
        Err(_) => Err(GitError::Timeout {
            command: args.first().copied().unwrap_or("git").to_string(),
            timeout,
        }),
    }
}
