mod common;

use common::*;
use gitscribe_git::{DiffEngine, FileStatus, GitRunner, StagingManager, MAX_DIFF_CHARS};

async fn annotated_state(
    repo: &std::path::Path,
) -> (gitscribe_git::RepositoryState, gitscribe_git::DiffStats) {
    let runner = GitRunner::discover(repo).await.unwrap();
    let staging = StagingManager::new(&runner);
    let mut state = staging.repository_state().await.unwrap();
    let stats = DiffEngine::new(&runner).annotate(&mut state).await;
    (state, stats)
}

#[tokio::test]
async fn test_staged_modification_gets_zero_context_diff() {
    if !git_available() {
        eprintln!("skipping: git not found");
        return;
    }

    let repo = init_repo();
    write_file(
        repo.path(),
        "src/app.rs",
        "line one\nline two\nline three\nline four\nline five\n",
    );
    commit_all(repo.path(), "initial");
    write_file(
        repo.path(),
        "src/app.rs",
        "line one\nline two\nline three CHANGED\nline four\nline five\n",
    );
    run_git(repo.path(), &["add", "src/app.rs"]);

    let (state, stats) = annotated_state(repo.path()).await;

    assert_eq!(state.staged.len(), 1);
    assert_eq!(stats.annotated, 1);

    let diff = &state.staged[0].diff;
    assert!(diff.contains("@@"), "expected hunks in: {diff}");
    assert!(diff.contains("-line three"));
    assert!(diff.contains("+line three CHANGED"));

    // Zero context: after the first hunk header nothing but change lines
    let body = diff.split_once("@@").unwrap().1;
    for line in body.lines().skip(1) {
        assert!(
            line.is_empty()
                || line.starts_with('+')
                || line.starts_with('-')
                || line.starts_with('@')
                || line.starts_with('\\'),
            "unexpected context line: {line:?}"
        );
    }
}

#[tokio::test]
async fn test_unstaged_records_keep_empty_diffs() {
    if !git_available() {
        eprintln!("skipping: git not found");
        return;
    }

    let repo = init_repo();
    write_file(repo.path(), "a.txt", "v1\n");
    commit_all(repo.path(), "initial");
    write_file(repo.path(), "a.txt", "v2\n");

    let (state, _) = annotated_state(repo.path()).await;

    assert!(state.staged.is_empty());
    assert_eq!(state.unstaged.len(), 1);
    assert_eq!(state.unstaged[0].diff, "");
}

#[tokio::test]
async fn test_binary_extension_yields_empty_diff() {
    if !git_available() {
        eprintln!("skipping: git not found");
        return;
    }

    let repo = init_repo();
    write_file(repo.path(), "logo.png", "not really an image\n");
    run_git(repo.path(), &["add", "logo.png"]);

    let (state, stats) = annotated_state(repo.path()).await;

    assert_eq!(state.staged[0].diff, "");
    assert_eq!(stats.binary, 1);
}

#[tokio::test]
async fn test_null_byte_sniff_yields_empty_diff() {
    if !git_available() {
        eprintln!("skipping: git not found");
        return;
    }

    let repo = init_repo();
    std::fs::write(repo.path().join("blob"), b"ascii then \x00 bytes").unwrap();
    run_git(repo.path(), &["add", "blob"]);

    let (state, stats) = annotated_state(repo.path()).await;

    assert_eq!(state.staged[0].diff, "");
    assert_eq!(stats.binary, 1);
}

#[tokio::test]
async fn test_oversized_diff_collapses_to_metadata_block() {
    if !git_available() {
        eprintln!("skipping: git not found");
        return;
    }

    let repo = init_repo();
    write_file(repo.path(), "seed.txt", "seed\n");
    commit_all(repo.path(), "initial");

    let mut content = String::new();
    for i in 0..400 {
        content.push_str(&format!("content line {i:04}\n"));
    }
    write_file(repo.path(), "big.go", &content);
    run_git(repo.path(), &["add", "big.go"]);

    let (state, stats) = annotated_state(repo.path()).await;

    assert_eq!(stats.truncated, 1);
    let diff = &state.staged[0].diff;
    assert!(diff.len() <= MAX_DIFF_CHARS);
    assert!(diff.starts_with("File: big.go\n"), "got: {diff}");
    assert!(diff.contains(&format!("Size: {} bytes", content.len())));
    assert!(diff.contains("Lines: 400"));
    assert!(diff.contains("Changes: +400 -0"));
}

#[tokio::test]
async fn test_rename_produces_summary_not_diff() {
    if !git_available() {
        eprintln!("skipping: git not found");
        return;
    }

    let repo = init_repo();
    write_file(repo.path(), "old.go", "package main\nfunc main() {}\n");
    commit_all(repo.path(), "initial");
    run_git(repo.path(), &["mv", "old.go", "new.go"]);

    let (state, _) = annotated_state(repo.path()).await;

    assert_eq!(state.staged.len(), 1);
    assert_eq!(state.staged[0].path, "new.go");
    assert_eq!(state.staged[0].status, FileStatus::Renamed);
    assert_eq!(
        state.staged[0].diff,
        "rename from old.go\nrename to new.go\nsimilarity 100%"
    );
}

#[tokio::test]
async fn test_unborn_head_diffs_against_empty_tree() {
    if !git_available() {
        eprintln!("skipping: git not found");
        return;
    }

    let repo = init_repo();
    write_file(repo.path(), "hello.txt", "hello scribe\n");
    run_git(repo.path(), &["add", "hello.txt"]);

    let (state, stats) = annotated_state(repo.path()).await;

    assert_eq!(stats.annotated, 1);
    assert_eq!(state.staged[0].status, FileStatus::Added);
    assert!(
        state.staged[0].diff.contains("+hello scribe"),
        "got: {}",
        state.staged[0].diff
    );
}

#[tokio::test]
async fn test_staged_deletion_diffs_removed_lines() {
    if !git_available() {
        eprintln!("skipping: git not found");
        return;
    }

    let repo = init_repo();
    write_file(repo.path(), "doomed.txt", "farewell\n");
    commit_all(repo.path(), "initial");
    run_git(repo.path(), &["rm", "-q", "doomed.txt"]);

    let (state, _) = annotated_state(repo.path()).await;

    assert_eq!(state.staged[0].status, FileStatus::Deleted);
    assert!(state.staged[0].diff.contains("-farewell"));
}
