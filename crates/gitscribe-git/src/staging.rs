use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{truncate_output, GitError, MAX_ERROR_OUTPUT};
use crate::runner::GitRunner;
use crate::status::{self, RepositoryState};

/// Which worktree changes an auto-staging pass picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageMode {
    ModifiedOnly,
    ModifiedAndUntracked,
}

impl StageMode {
    pub fn label(&self) -> &'static str {
        match self {
            StageMode::ModifiedOnly => "modified",
            StageMode::ModifiedAndUntracked => "modified+untracked",
        }
    }
}

/// Point-in-time record of which paths were staged.
///
/// Immutable once captured; restoration works on set differences between
/// two of these, never by mutating one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingSnapshot {
    pub staged_paths: BTreeSet<String>,
    pub captured_at: DateTime<Utc>,
    pub repo_root: PathBuf,
}

impl StagingSnapshot {
    pub fn contains(&self, path: &str) -> bool {
        self.staged_paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.staged_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged_paths.is_empty()
    }
}

/// Why one `git add` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Permission,
    Locked,
    Conflict,
    NotFound,
    Other,
}

impl FailureKind {
    /// Best-effort bucket from stderr text, same caveats as the error
    /// classifier: git only talks in prose.
    pub(crate) fn from_stderr(stderr: &str) -> Self {
        let lowered = stderr.to_lowercase();
        if lowered.contains("permission denied") || lowered.contains("operation not permitted") {
            FailureKind::Permission
        } else if lowered.contains("index.lock") || lowered.contains(".lock': file exists") {
            FailureKind::Locked
        } else if lowered.contains("needs merge")
            || lowered.contains("unmerged")
            || lowered.contains("not concluded your merge")
        {
            FailureKind::Conflict
        } else if lowered.contains("did not match any file")
            || lowered.contains("no such file or directory")
        {
            FailureKind::NotFound
        } else {
            FailureKind::Other
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingFailure {
    pub path: String,
    pub error: String,
    pub kind: FailureKind,
}

/// Outcome of one auto-staging pass.
///
/// `success == failed.is_empty()` always. On failure `staged` is empty:
/// partial successes have already been rolled back and the staging area
/// matches the pre-call snapshot again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoStagingResult {
    pub staged: Vec<String>,
    pub failed: Vec<StagingFailure>,
    pub success: bool,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl AutoStagingResult {
    fn succeeded(staged: Vec<String>, duration: Duration) -> Self {
        Self {
            staged,
            failed: Vec::new(),
            success: true,
            duration,
        }
    }

    fn rolled_back(failed: Vec<StagingFailure>, duration: Duration) -> Self {
        Self {
            staged: Vec::new(),
            failed,
            success: false,
            duration,
        }
    }
}

/// Snapshot/stage/unstage operations over the real staging area.
///
/// Per run the lifecycle is: capture a snapshot, optionally stage, then
/// either commit or execute a [`RestorationPlan`] computed against a fresh
/// snapshot. Staging is all-or-nothing: any failure inside one call rolls
/// back everything that call staged before returning.
pub struct StagingManager<'a> {
    runner: &'a GitRunner,
}

impl<'a> StagingManager<'a> {
    pub fn new(runner: &'a GitRunner) -> Self {
        Self { runner }
    }

    /// Current staged/unstaged listings, diffs not yet filled in.
    pub async fn repository_state(&self) -> Result<RepositoryState, GitError> {
        let output = self.runner.run_checked(&["status", "--porcelain"]).await?;
        Ok(status::parse_status(&output.stdout))
    }

    pub async fn capture_snapshot(&self) -> Result<StagingSnapshot, GitError> {
        let output = self.runner.run_checked(&["status", "--porcelain"]).await?;
        let staged_paths = status::staged_path_set(&output.stdout);

        debug!(staged = staged_paths.len(), "captured staging snapshot");

        Ok(StagingSnapshot {
            staged_paths,
            captured_at: Utc::now(),
            repo_root: self.runner.repo_root().to_path_buf(),
        })
    }

    /// Paths the given mode would pick up from the working tree right now.
    pub async fn worktree_candidates(&self, mode: StageMode) -> Result<Vec<String>, GitError> {
        let include_untracked = mode == StageMode::ModifiedAndUntracked;
        let output = self.runner.run_checked(&["status", "--porcelain"]).await?;
        Ok(status::worktree_candidate_paths(
            &output.stdout,
            include_untracked,
        ))
    }

    /// Stage every worktree change the mode selects. See [`Self::stage_paths`]
    /// for the failure contract.
    pub async fn stage_changes(
        &self,
        mode: StageMode,
        cancel: &AtomicBool,
    ) -> Result<AutoStagingResult, GitError> {
        let candidates = self.worktree_candidates(mode).await?;
        self.stage_paths(candidates, cancel).await
    }

    pub async fn stage_modified(&self, cancel: &AtomicBool) -> Result<AutoStagingResult, GitError> {
        self.stage_changes(StageMode::ModifiedOnly, cancel).await
    }

    pub async fn stage_modified_and_untracked(
        &self,
        cancel: &AtomicBool,
    ) -> Result<AutoStagingResult, GitError> {
        self.stage_changes(StageMode::ModifiedAndUntracked, cancel)
            .await
    }

    /// Attempt to stage every path, accumulating failures instead of
    /// stopping at the first one. If anything failed, every path that did
    /// succeed in this call is unstaged again before returning, so the
    /// result is never partially applied.
    ///
    /// A cancellation observed mid-loop returns [`GitError::Interrupted`]
    /// without rolling back; the shutdown restoration path owns cleanup in
    /// that case.
    pub async fn stage_paths(
        &self,
        candidates: Vec<String>,
        cancel: &AtomicBool,
    ) -> Result<AutoStagingResult, GitError> {
        let start = Instant::now();
        let mut staged: Vec<String> = Vec::new();
        let mut failed: Vec<StagingFailure> = Vec::new();

        for path in candidates {
            if cancel.load(Ordering::SeqCst) {
                info!(
                    staged = staged.len(),
                    "staging loop interrupted, leaving cleanup to restoration"
                );
                return Err(GitError::Interrupted);
            }

            let output = self.runner.run(&["add", "--", &path]).await?;
            if output.success() {
                staged.push(path);
            } else {
                let kind = FailureKind::from_stderr(&output.stderr);
                warn!(path = %path, kind = ?kind, "failed to stage path");
                failed.push(StagingFailure {
                    path,
                    error: truncate_output(&output.stderr, MAX_ERROR_OUTPUT),
                    kind,
                });
            }
        }

        if !failed.is_empty() {
            info!(
                succeeded = staged.len(),
                failed = failed.len(),
                "staging incomplete, rolling back successful paths"
            );
            self.unstage(&staged).await?;
            return Ok(AutoStagingResult::rolled_back(failed, start.elapsed()));
        }

        debug!(staged = staged.len(), "staging completed");
        Ok(AutoStagingResult::succeeded(staged, start.elapsed()))
    }

    /// Remove paths from the staging area. Used for rollback and
    /// restoration; not retried on failure.
    pub async fn unstage(&self, paths: &[String]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }

        // `reset HEAD` needs a commit to reset to; before the first commit
        // the index entries have to be dropped instead.
        let mut args: Vec<&str> = if self.head_exists().await? {
            vec!["reset", "-q", "HEAD", "--"]
        } else {
            vec!["rm", "--cached", "-q", "-r", "--"]
        };
        args.extend(paths.iter().map(String::as_str));

        self.runner.run_checked(&args).await?;
        debug!(count = paths.len(), "unstaged paths");
        Ok(())
    }

    async fn head_exists(&self) -> Result<bool, GitError> {
        let output = self
            .runner
            .run(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await?;
        Ok(output.success())
    }
}

/// Undo instructions scoped to what this process staged.
///
/// `to_unstage` is the set difference `current \ pre`, so paths the user
/// had staged before the run can never appear in it.
#[derive(Debug, Clone)]
pub struct RestorationPlan {
    to_unstage: BTreeSet<String>,
    pre: StagingSnapshot,
    current: StagingSnapshot,
}

impl RestorationPlan {
    pub fn between(pre: &StagingSnapshot, current: &StagingSnapshot) -> Self {
        let to_unstage = current
            .staged_paths
            .difference(&pre.staged_paths)
            .cloned()
            .collect();
        Self {
            to_unstage,
            pre: pre.clone(),
            current: current.clone(),
        }
    }

    /// Snapshot taken before this run staged anything.
    pub fn pre(&self) -> &StagingSnapshot {
        &self.pre
    }

    /// Snapshot the plan was computed from.
    pub fn current(&self) -> &StagingSnapshot {
        &self.current
    }

    pub fn is_empty(&self) -> bool {
        self.to_unstage.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.to_unstage.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.to_unstage.len()
    }

    /// Unstage the planned paths, revalidated against a fresh snapshot:
    /// anything no longer staged is already in the desired state and is
    /// dropped from the work list. Returns how many paths were unstaged.
    pub async fn execute(&self, manager: &StagingManager<'_>) -> Result<usize, GitError> {
        if self.to_unstage.is_empty() {
            return Ok(0);
        }

        let live = manager.capture_snapshot().await?;
        let work: Vec<String> = self
            .to_unstage
            .iter()
            .filter(|p| live.contains(p))
            .cloned()
            .collect();

        if work.is_empty() {
            debug!("restoration plan already satisfied");
            return Ok(0);
        }

        manager.unstage(&work).await?;
        info!(restored = work.len(), "restored staging area");
        Ok(work.len())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(paths: &[&str]) -> StagingSnapshot {
        StagingSnapshot {
            staged_paths: paths.iter().map(|p| p.to_string()).collect(),
            captured_at: Utc::now(),
            repo_root: PathBuf::from("/tmp/repo"),
        }
    }

    #[test]
    fn test_plan_covers_only_engine_added_paths() {
        let pre = snapshot(&["user.go"]);
        let current = snapshot(&["user.go", "engine_a.go", "engine_b.go"]);

        let plan = RestorationPlan::between(&pre, &current);
        let paths: Vec<&str> = plan.paths().collect();

        assert_eq!(paths, vec!["engine_a.go", "engine_b.go"]);
        assert!(!paths.contains(&"user.go"));
        assert!(plan.pre().contains("user.go"));
        assert_eq!(plan.current().len(), 3);
    }

    #[test]
    fn test_plan_is_empty_when_nothing_was_added() {
        let pre = snapshot(&["a.go", "b.go"]);
        let current = snapshot(&["a.go", "b.go"]);
        assert!(RestorationPlan::between(&pre, &current).is_empty());
    }

    #[test]
    fn test_plan_ignores_paths_the_user_unstaged() {
        // The user unstaging something mid-run must not turn into us
        // unstaging even more.
        let pre = snapshot(&["a.go", "b.go"]);
        let current = snapshot(&["b.go", "engine.go"]);

        let plan = RestorationPlan::between(&pre, &current);
        let paths: Vec<&str> = plan.paths().collect();
        assert_eq!(paths, vec!["engine.go"]);
    }

    #[test]
    fn test_failure_kind_classification() {
        let cases = [
            ("error: open(\"x\"): Permission denied", FailureKind::Permission),
            (
                "fatal: Unable to create '/repo/.git/index.lock': File exists.",
                FailureKind::Locked,
            ),
            ("error: path 'x' needs merge", FailureKind::Conflict),
            (
                "fatal: pathspec 'gone.txt' did not match any files",
                FailureKind::NotFound,
            ),
            ("fatal: something novel", FailureKind::Other),
        ];
        for (stderr, expected) in cases {
            assert_eq!(FailureKind::from_stderr(stderr), expected, "{stderr}");
        }
    }

    #[test]
    fn test_result_invariants() {
        let ok = AutoStagingResult::succeeded(vec!["a.go".into()], Duration::from_millis(5));
        assert!(ok.success);
        assert!(ok.failed.is_empty());

        let failure = StagingFailure {
            path: "b.go".into(),
            error: "denied".into(),
            kind: FailureKind::Permission,
        };
        let rolled = AutoStagingResult::rolled_back(vec![failure], Duration::from_millis(5));
        assert!(!rolled.success);
        assert!(rolled.staged.is_empty());
    }

    #[test]
    fn test_result_serializes_duration_as_seconds() {
        let result = AutoStagingResult::succeeded(vec![], Duration::from_millis(1500));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["duration"], serde_json::json!(1.5));
    }
}
