use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Integration tests drive a real `git` binary; skip gracefully when the
/// environment has none.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn init_repo() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    run_git(dir.path(), &["init", "-q"]);
    run_git(dir.path(), &["config", "user.name", "Test User"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
    dir
}

pub fn write_file(dir: &Path, rel: &str, content: &str) {
    let full = dir.join(rel);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dirs");
    }
    fs::write(full, content).expect("failed to write file");
}

pub fn commit_all(dir: &Path, message: &str) {
    run_git(dir, &["add", "-A"]);
    run_git(dir, &["commit", "-q", "-m", message]);
}

/// Paths currently staged, straight from git for cross-checking the engine.
pub fn staged_paths(dir: &Path) -> Vec<String> {
    git_stdout(dir, &["diff", "--cached", "--name-only"])
        .lines()
        .map(str::to_string)
        .collect()
}

/// Index contents; unlike `diff --cached` this also works before the first
/// commit exists.
pub fn index_paths(dir: &Path) -> Vec<String> {
    git_stdout(dir, &["ls-files", "--cached"])
        .lines()
        .map(str::to_string)
        .collect()
}
