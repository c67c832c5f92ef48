use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Terminal state of a commit flow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// A commit was created from the staged changes.
    Committed {
        sha: String,
        message: String,
        files: usize,
        total_duration_secs: f64,
    },

    /// The working tree had no changes to stage or commit.
    NothingToCommit,

    /// Dry run: the full flow ran but no commit was created, and any
    /// staging performed by the flow was undone.
    DryRun {
        message: String,
        files: usize,
        restored: bool,
        total_duration_secs: f64,
    },

    /// The user declined the proposed message.
    Aborted { restored: bool },

    /// An interrupt arrived before the commit was created.
    Interrupted { restored: bool },
}

impl FlowOutcome {
    pub fn committed(sha: String, message: String, files: usize, total: Duration) -> Self {
        FlowOutcome::Committed {
            sha,
            message,
            files,
            total_duration_secs: total.as_secs_f64(),
        }
    }

    pub fn dry_run(message: String, files: usize, restored: bool, total: Duration) -> Self {
        FlowOutcome::DryRun {
            message,
            files,
            restored,
            total_duration_secs: total.as_secs_f64(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FlowOutcome::Committed { .. } | FlowOutcome::DryRun { .. })
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            FlowOutcome::Committed { .. } | FlowOutcome::DryRun { .. } => 0,
            FlowOutcome::NothingToCommit | FlowOutcome::Aborted { .. } => 1,
            FlowOutcome::Interrupted { .. } => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let committed = FlowOutcome::committed(
            "abc1234".to_string(),
            "Add widget".to_string(),
            2,
            Duration::from_secs(3),
        );
        assert_eq!(committed.exit_code(), 0);
        assert!(committed.is_success());

        assert_eq!(FlowOutcome::NothingToCommit.exit_code(), 1);
        assert_eq!(FlowOutcome::Aborted { restored: true }.exit_code(), 1);
        assert_eq!(FlowOutcome::Interrupted { restored: false }.exit_code(), 130);
        assert!(!FlowOutcome::Aborted { restored: true }.is_success());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = FlowOutcome::committed(
            "abc1234".to_string(),
            "Add widget".to_string(),
            1,
            Duration::from_millis(2500),
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "committed");
        assert_eq!(json["sha"], "abc1234");
        assert_eq!(json["total_duration_secs"], 2.5);

        let nothing = serde_json::to_value(FlowOutcome::NothingToCommit).unwrap();
        assert_eq!(nothing["status"], "nothing_to_commit");
    }
}
