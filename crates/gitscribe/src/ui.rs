//! Terminal presentation: the review prompt and final outcome summaries.

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::{Editor, Select};

use gitscribe_core::{Confirmer, FlowError, FlowOutcome, ReviewDecision};
use gitscribe_git::RepositoryState;

/// Review prompt backed by the terminal. Lets the user commit the proposal,
/// rewrite it in `$EDITOR`, or walk away.
pub struct InteractiveConfirmer;

#[async_trait]
impl Confirmer for InteractiveConfirmer {
    async fn review(
        &self,
        message: &str,
        state: &RepositoryState,
    ) -> Result<ReviewDecision, FlowError> {
        let mut current = message.to_string();

        loop {
            print_proposal(&current, state);

            let choice = Select::new()
                .with_prompt("Use this message?")
                .items(&["Commit", "Edit", "Abort"])
                .default(0)
                .interact()
                .map_err(|e| FlowError::ConfirmFailed(e.to_string()))?;

            match choice {
                0 => return Ok(ReviewDecision::Commit(current)),
                1 => {
                    let edited = Editor::new()
                        .edit(&current)
                        .map_err(|e| FlowError::ConfirmFailed(e.to_string()))?;
                    match edited {
                        Some(text) if !text.trim().is_empty() => {
                            current = text.trim().to_string();
                        }
                        _ => eprintln!("{}", "Keeping the previous message.".dimmed()),
                    }
                }
                _ => return Ok(ReviewDecision::Abort),
            }
        }
    }
}

fn print_proposal(message: &str, state: &RepositoryState) {
    eprintln!();
    eprintln!("{}", "Proposed commit message".bold());
    eprintln!();
    for line in message.lines() {
        eprintln!("  {}", line);
    }
    eprintln!();
    eprintln!(
        "{}",
        format!("Staged files ({})", state.staged.len()).dimmed()
    );
    for record in &state.staged {
        eprintln!("  {} {}", record.status.label().dimmed(), record.path);
    }
    eprintln!();
}

/// Print the final outcome banner.
pub fn print_outcome(outcome: &FlowOutcome) {
    match outcome {
        FlowOutcome::Committed {
            sha,
            message,
            files,
            total_duration_secs,
        } => {
            eprintln!();
            eprintln!("{}", "=== COMMITTED ===".bright_green());
            eprintln!("Commit: {}", sha);
            eprintln!("Files: {}", files);
            eprintln!("Duration: {:.1}s", total_duration_secs);
            eprintln!("Message: {}", message.lines().next().unwrap_or(""));
        }
        FlowOutcome::NothingToCommit => {
            eprintln!();
            eprintln!("{}", "Nothing to commit.".yellow());
            eprintln!("The working tree is clean, or nothing matched the staging mode.");
        }
        FlowOutcome::DryRun {
            message,
            files,
            restored,
            total_duration_secs,
        } => {
            eprintln!();
            eprintln!("{}", "=== DRY RUN ===".bright_cyan());
            eprintln!(
                "Would commit {} file(s); finished in {:.1}s",
                files, total_duration_secs
            );
            if !restored {
                eprintln!(
                    "{}",
                    "Warning: the staging area was not fully restored; check `git status`."
                        .bright_yellow()
                );
            }
            eprintln!();
            for line in message.lines() {
                eprintln!("  {}", line);
            }
        }
        FlowOutcome::Aborted { restored } => {
            eprintln!();
            eprintln!("{}", "=== ABORTED ===".yellow());
            if *restored {
                eprintln!("Staging area restored; your changes are untouched.");
            } else {
                eprintln!(
                    "{}",
                    "The staging area may not be fully restored; check `git status`."
                        .bright_yellow()
                );
            }
        }
        FlowOutcome::Interrupted { restored } => {
            eprintln!();
            eprintln!("{}", "=== INTERRUPTED ===".yellow());
            if *restored {
                eprintln!("Staging area restored; nothing was committed.");
            } else {
                eprintln!(
                    "{}",
                    "The staging area may not be fully restored; check `git status`."
                        .bright_yellow()
                );
            }
        }
    }
}
