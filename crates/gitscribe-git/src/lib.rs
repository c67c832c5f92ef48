//! # gitscribe-git
//!
//! Git operations for the gitscribe commit assistant.
//!
//! This crate is a facade over the `git` executable: every operation shells
//! out to git with an explicit working directory and a deadline, then
//! interprets the captured textual output. There is no object-database or
//! index implementation here.
//!
//! ## Overview
//!
//! The engine answers three questions for the layers above it:
//! - What is pending? ([`RepositoryState`] from `git status --porcelain`)
//! - What does each staged change look like? ([`DiffEngine`] produces a
//!   size-bounded, zero-context diff per staged file)
//! - How do we mutate the staging area safely? ([`StagingManager`] stages
//!   with all-or-nothing rollback and [`RestorationPlan`] undoes exactly
//!   what this process staged, never what the user staged beforehand)
//!
//! ## Key Types
//!
//! - [`GitRunner`] - Spawns git subprocesses with a deadline
//! - [`RepositoryState`] - Staged and unstaged [`FileRecord`] listings
//! - [`DiffEngine`] - Per-file bounded diff computation
//! - [`StagingManager`] - Snapshot, stage, unstage
//! - [`RestorationPlan`] - Undo for engine-added staging entries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gitscribe_git::{DiffEngine, GitRunner, StagingManager};
//! use std::path::Path;
//!
//! let runner = GitRunner::discover(Path::new(".")).await?;
//! let staging = StagingManager::new(&runner);
//!
//! // Remember what the user had staged before we touch anything
//! let before = staging.capture_snapshot().await?;
//!
//! // ... stage changes, collect state ...
//! let mut state = staging.repository_state().await?;
//! DiffEngine::new(&runner).annotate(&mut state).await;
//!
//! // On abort, put the staging area back the way we found it
//! let after = staging.capture_snapshot().await?;
//! RestorationPlan::between(&before, &after).execute(&staging).await?;
//! ```
//!
//! ## Diff Format
//!
//! Diffs are unified format with zero context lines, capped at
//! [`MAX_DIFF_CHARS`] characters per file. Oversized diffs collapse into a
//! fixed metadata block; binary files and failed computations yield an
//! empty string. Consumers must treat an empty diff as meaningful.

mod commit;
mod diff;
mod error;
mod runner;
mod staging;
mod status;

pub use commit::{create_commit, CommitIdentity};
pub use diff::{DiffEngine, DiffStats, EMPTY_TREE_OID, MAX_DIFF_CHARS};
pub use error::GitError;
pub use runner::{GitOutput, GitRunner, DEFAULT_GIT_TIMEOUT};
pub use staging::{
    AutoStagingResult, FailureKind, RestorationPlan, StageMode, StagingFailure, StagingManager,
    StagingSnapshot,
};
pub use status::{parse_status, FileRecord, FileStatus, RepositoryState};
