use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Longest stderr/stdout excerpt carried inside an error message.
pub(crate) const MAX_ERROR_OUTPUT: usize = 600;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("commit signing failed: {0}")]
    SigningFailed(String),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("git {command} failed with exit code {exit_code}: {output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("git {command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("failed to spawn git: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("operation interrupted")]
    Interrupted,
}

/// Truncate captured process output so error messages stay bounded.
///
/// Keeps the head of the text (preferring a line boundary, like the prompt
/// builders do) and appends an explicit marker with the number of characters
/// dropped, so nothing disappears silently.
pub(crate) fn truncate_output(text: &str, max_len: usize) -> String {
    let text = text.trim_end();
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    if let Some(pos) = text[..cut].rfind('\n') {
        if pos > 0 {
            cut = pos;
        }
    }

    format!(
        "{} ... ({} additional characters)",
        &text[..cut],
        text.len() - cut
    )
}

/// Map a failed git invocation onto an error kind.
///
/// Categorization is a best-effort heuristic over stderr text. git's exit
/// codes do not discriminate between failure classes, so we match known
/// phrases (lowercased) and fall back to the generic kind with the exit code
/// and a truncated excerpt preserved.
pub(crate) fn classify_failure(
    repo_root: &Path,
    command: &str,
    exit_code: i32,
    stderr: &str,
) -> GitError {
    let lowered = stderr.to_lowercase();

    if lowered.contains("not a git repository") {
        return GitError::NotARepository(repo_root.to_path_buf());
    }
    if lowered.contains("permission denied")
        || lowered.contains("insufficient permission")
        || lowered.contains("operation not permitted")
    {
        return GitError::PermissionDenied(truncate_output(stderr, MAX_ERROR_OUTPUT));
    }
    if lowered.contains("gpg failed")
        || lowered.contains("signing failed")
        || lowered.contains("cannot run gpg")
        || lowered.contains("no secret key")
    {
        return GitError::SigningFailed(truncate_output(stderr, MAX_ERROR_OUTPUT));
    }
    if lowered.contains("did not match any file")
        || lowered.contains("no such file or directory")
    {
        return GitError::PathNotFound(truncate_output(stderr, MAX_ERROR_OUTPUT));
    }

    GitError::CommandFailed {
        command: command.to_string(),
        exit_code,
        output: truncate_output(stderr, MAX_ERROR_OUTPUT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_output_unchanged() {
        assert_eq!(truncate_output("error: short", 600), "error: short");
    }

    #[test]
    fn test_truncate_appends_character_count() {
        let long = "x".repeat(700);
        let truncated = truncate_output(&long, 600);
        assert!(truncated.starts_with("xxx"));
        assert!(truncated.ends_with("... (100 additional characters)"));
    }

    #[test]
    fn test_truncate_prefers_line_boundary() {
        let text = format!("first line\n{}", "y".repeat(600));
        let truncated = truncate_output(&text, 20);
        assert!(truncated.starts_with("first line ..."));
    }

    #[test]
    fn test_classify_not_a_repository() {
        let err = classify_failure(
            Path::new("/tmp/x"),
            "status",
            128,
            "fatal: not a git repository (or any of the parent directories): .git",
        );
        assert!(matches!(err, GitError::NotARepository(_)));
    }

    #[test]
    fn test_classify_permission_denied() {
        let err = classify_failure(
            Path::new("/tmp/x"),
            "add",
            1,
            "error: open(\"secret.txt\"): Permission denied",
        );
        assert!(matches!(err, GitError::PermissionDenied(_)));
    }

    #[test]
    fn test_classify_signing_failure() {
        let err = classify_failure(Path::new("/tmp/x"), "commit", 128, "error: gpg failed to sign the data");
        assert!(matches!(err, GitError::SigningFailed(_)));
    }

    #[test]
    fn test_classify_missing_pathspec() {
        let err = classify_failure(
            Path::new("/tmp/x"),
            "add",
            128,
            "fatal: pathspec 'nope.txt' did not match any files",
        );
        assert!(matches!(err, GitError::PathNotFound(_)));
    }

    #[test]
    fn test_classify_unknown_falls_back_to_command_failed() {
        let err = classify_failure(Path::new("/tmp/x"), "fetch", 128, "fatal: unable to access remote");
        match err {
            GitError::CommandFailed {
                command, exit_code, ..
            } => {
                assert_eq!(command, "fetch");
                assert_eq!(exit_code, 128);
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }
}
