use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{truncate_output, GitError, MAX_ERROR_OUTPUT};
use crate::runner::GitRunner;

/// Author/committer override applied through the process environment, so
/// the user's global git config is never touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl CommitIdentity {
    fn env(&self) -> Vec<(String, String)> {
        vec![
            ("GIT_AUTHOR_NAME".to_string(), self.name.clone()),
            ("GIT_AUTHOR_EMAIL".to_string(), self.email.clone()),
            ("GIT_COMMITTER_NAME".to_string(), self.name.clone()),
            ("GIT_COMMITTER_EMAIL".to_string(), self.email.clone()),
        ]
    }
}

/// Create a commit from whatever is currently staged and return its short
/// hash. Everything below the porcelain surface (object writing, hooks,
/// signing) belongs to git itself.
pub async fn create_commit(
    runner: &GitRunner,
    message: &str,
    identity: Option<&CommitIdentity>,
) -> Result<String, GitError> {
    let env = identity.map(CommitIdentity::env).unwrap_or_default();
    let output = runner.run_with_env(&["commit", "-m", message], &env).await?;

    if !output.success() {
        let lowered = output.stderr.to_lowercase();
        if lowered.contains("gpg failed")
            || lowered.contains("signing failed")
            || lowered.contains("cannot run gpg")
        {
            return Err(GitError::SigningFailed(truncate_output(
                &output.stderr,
                MAX_ERROR_OUTPUT,
            )));
        }
        return Err(GitError::CommandFailed {
            command: "commit".to_string(),
            exit_code: output.exit_code,
            output: truncate_output(&output.combined(), MAX_ERROR_OUTPUT),
        });
    }

    let sha = runner
        .run_checked(&["rev-parse", "--short", "HEAD"])
        .await?
        .stdout
        .trim()
        .to_string();

    info!(sha = %sha, "created commit");
    Ok(sha)
}
