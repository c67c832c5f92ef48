use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::{GeneratorConfig, GeneratorError, GeneratorOutput};

/// Utility for spawning generator processes
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Spawn a process and capture its output, enforcing the configured
    /// timeout when one is set
    pub async fn spawn(
        binary: &Path,
        args: &[&str],
        config: &GeneratorConfig,
    ) -> Result<GeneratorOutput, GeneratorError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            working_dir = %config.working_dir.display(),
            "Spawning generator process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .current_dir(&config.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null()) // Non-interactive
            .kill_on_drop(true);

        // Add environment variables
        for (key, value) in &config.env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn()?;

        // Capture stdout and stderr
        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();

        let capture = async move {
            let mut stdout = String::new();
            let mut stderr = String::new();

            if let (Some(out), Some(err)) = (stdout_handle, stderr_handle) {
                let mut stdout_reader = BufReader::new(out).lines();
                let mut stderr_reader = BufReader::new(err).lines();
                let mut stderr_done = false;

                // Read both streams concurrently
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
                                    // stdout closed, wait for stderr to close too
                                    while let Ok(Some(line)) = stderr_reader.next_line().await {
                                        trace!(line = %line, "stderr");
                                        if !stderr.is_empty() {
                                            stderr.push('\n');
                                        }
                                        stderr.push_str(&line);
                                    }
                                    break;
                                }
                                Err(e) => {
                                    return Err(GeneratorError::GenerationFailed(format!(
                                        "Failed to read stdout: {}",
                                        e
                                    )));
                                }
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
                                    // stderr closed, continue reading stdout
                                    stderr_done = true;
                                }
                                Err(e) => {
                                    return Err(GeneratorError::GenerationFailed(format!(
                                        "Failed to read stderr: {}",
                                        e
                                    )));
                                }
                            }
                        }
                    }
                }
            }

            let status = child.wait().await?;
            Ok((stdout, stderr, status))
        };

        let (stdout, stderr, status) = match config.timeout {
            Some(limit) => match tokio::time::timeout(limit, capture).await {
                Ok(result) => result?,
                // Dropping the future kills the child via kill_on_drop
                Err(_) => return Err(GeneratorError::Timeout(limit)),
            },
            None => capture.await?,
        };

        let duration = start.elapsed();

        debug!(
            exit_code = status.code().unwrap_or(-1),
            duration_ms = duration.as_millis(),
            "Generator process completed"
        );

        Ok(GeneratorOutput::new(
            stdout,
            stderr,
            status.code().unwrap_or(-1),
            duration,
        ))
    }
}
