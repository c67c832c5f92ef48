use thiserror::Error;

use gitscribe_git::StagingFailure;

/// Errors that can abort a commit flow run.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Git error: {0}")]
    GitError(#[from] gitscribe_git::GitError),

    #[error("Generator error: {0}")]
    GeneratorError(#[from] gitscribe_agent::GeneratorError),

    /// Automatic staging partially failed. Every path the flow managed to
    /// stage has already been unstaged again.
    #[error("staging failed for {} file(s); all paths staged by this run were rolled back", failures.len())]
    StagingFailed { failures: Vec<StagingFailure> },

    /// The staging area could not be returned to its pre-run state. The
    /// message carries the exact command to finish the cleanup by hand.
    #[error("failed to restore the staging area ({details}); finish manually with `{}`", restore_command(.paths))]
    RestorationFailed { paths: Vec<String>, details: String },

    #[error("Interrupted")]
    Interrupted,

    #[error("Confirmation failed: {0}")]
    ConfirmFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

fn restore_command(paths: &[String]) -> String {
    if paths.is_empty() {
        "git status -s` and `git reset -q HEAD -- <path>".to_string()
    } else {
        format!("git reset -q HEAD -- {}", paths.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitscribe_git::FailureKind;

    #[test]
    fn test_restoration_error_names_the_manual_command() {
        let err = FlowError::RestorationFailed {
            paths: vec!["src/a.go".to_string(), "src/b.go".to_string()],
            details: "index locked".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("git reset -q HEAD -- src/a.go src/b.go"));
        assert!(text.contains("index locked"));
    }

    #[test]
    fn test_restoration_error_without_known_paths_points_at_status() {
        let err = FlowError::RestorationFailed {
            paths: Vec::new(),
            details: "could not read the current staging state".to_string(),
        };
        assert!(err.to_string().contains("git status -s"));
    }

    #[test]
    fn test_staging_error_counts_failures() {
        let err = FlowError::StagingFailed {
            failures: vec![StagingFailure {
                path: "missing.go".to_string(),
                error: "pathspec did not match".to_string(),
                kind: FailureKind::NotFound,
            }],
        };
        assert!(err.to_string().contains("1 file(s)"));
    }
}
