use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use gitscribe_agent::{GeneratorConfig, MessageGenerator};
use gitscribe_git::{
    create_commit, CommitIdentity, DiffEngine, GitError, GitRunner, RepositoryState,
    RestorationPlan, StageMode, StagingManager, StagingSnapshot, DEFAULT_GIT_TIMEOUT,
};
use gitscribe_logging::{LogEvent, Logger};

use crate::error::FlowError;
use crate::outcome::FlowOutcome;

/// What the caller decided to do with a proposed commit message.
#[derive(Debug, Clone)]
pub enum ReviewDecision {
    /// Create the commit with this (possibly edited) message.
    Commit(String),
    /// Walk away; the flow restores the staging area.
    Abort,
}

/// Reviews a proposed commit message before anything irreversible happens.
///
/// The binary wires this to an interactive prompt; `--yes` and tests use
/// [`AcceptAll`].
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn review(
        &self,
        message: &str,
        state: &RepositoryState,
    ) -> Result<ReviewDecision, FlowError>;
}

/// Accepts every proposal unchanged.
pub struct AcceptAll;

#[async_trait]
impl Confirmer for AcceptAll {
    async fn review(
        &self,
        message: &str,
        _state: &RepositoryState,
    ) -> Result<ReviewDecision, FlowError> {
        Ok(ReviewDecision::Commit(message.to_string()))
    }
}

/// Knobs for a single flow run.
#[derive(Debug, Clone)]
pub struct FlowOptions {
    pub working_dir: PathBuf,
    pub stage_mode: StageMode,
    /// When false the flow never touches the staging area and commits
    /// whatever is already staged.
    pub auto_stage: bool,
    /// Run everything except the commit, then undo any staging this run
    /// performed.
    pub dry_run: bool,
    pub model: Option<String>,
    pub git_timeout: Duration,
    pub generation_timeout: Option<Duration>,
    pub identity: Option<CommitIdentity>,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            stage_mode: StageMode::ModifiedOnly,
            auto_stage: true,
            dry_run: false,
            model: None,
            git_timeout: DEFAULT_GIT_TIMEOUT,
            generation_timeout: Some(Duration::from_secs(120)),
            identity: None,
        }
    }
}

/// Orchestrates one snapshot/stage/generate/commit pass.
pub struct CommitFlow<'a> {
    generator: &'a dyn MessageGenerator,
    confirmer: &'a dyn Confirmer,
    logger: Arc<Logger>,
    options: FlowOptions,
    interrupted: Arc<AtomicBool>,
}

impl<'a> CommitFlow<'a> {
    pub fn new(
        generator: &'a dyn MessageGenerator,
        confirmer: &'a dyn Confirmer,
        logger: Arc<Logger>,
        options: FlowOptions,
    ) -> Self {
        Self {
            generator,
            confirmer,
            logger,
            options,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle to signal interruption
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    fn interrupt_requested(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Run the flow until a commit, a clean stop, or an interrupt.
    ///
    /// Every exit except a created commit leaves the staging area the way
    /// the initial snapshot recorded it.
    pub async fn run(&self) -> Result<FlowOutcome, FlowError> {
        let start = Instant::now();

        self.logger.log(&LogEvent::FlowStarted {
            working_dir: self.options.working_dir.clone(),
            generator: self.generator.name().to_string(),
        });

        let runner = GitRunner::discover(&self.options.working_dir)
            .await?
            .with_timeout(self.options.git_timeout);
        let staging = StagingManager::new(&runner);

        // Everything past this point may mutate the staging area. The
        // snapshot is what every non-commit exit restores to.
        let snapshot = staging.capture_snapshot().await?;
        self.logger.log(&LogEvent::SnapshotCaptured {
            staged: snapshot.len(),
        });

        match self.drive(&runner, &staging, &snapshot, start).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                // Hand the staging area back before surfacing the error.
                if !matches!(e, FlowError::RestorationFailed { .. }) {
                    if let Err(restore_err) = self.restore(&staging, &snapshot).await {
                        warn!(error = %restore_err, "restoration after failure did not complete");
                    }
                }
                self.logger.log(&LogEvent::ErrorEncountered {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        runner: &GitRunner,
        staging: &StagingManager<'_>,
        snapshot: &StagingSnapshot,
        start: Instant,
    ) -> Result<FlowOutcome, FlowError> {
        if self.interrupt_requested() {
            return self.stop_interrupted(staging, snapshot).await;
        }

        // Stage worktree changes, but only when the user staged nothing
        // themselves; a hand-picked index is committed exactly as-is.
        if self.options.auto_stage && snapshot.is_empty() {
            if let Some(outcome) = self.auto_stage(staging, snapshot).await? {
                return Ok(outcome);
            }
        }

        if self.interrupt_requested() {
            return self.stop_interrupted(staging, snapshot).await;
        }

        // Collect and annotate the state the generator will see
        let mut state = staging.repository_state().await?;
        if state.staged.is_empty() {
            info!("nothing staged and nothing to stage");
            return Ok(FlowOutcome::NothingToCommit);
        }

        let stats = DiffEngine::new(runner).annotate(&mut state).await;
        self.logger.log(&LogEvent::StateCollected {
            staged: state.staged.len(),
            unstaged: state.unstaged.len(),
            binary: stats.binary,
            truncated: stats.truncated,
        });

        if self.interrupt_requested() {
            return self.stop_interrupted(staging, snapshot).await;
        }

        // Generate the message
        self.logger.log(&LogEvent::GenerationStarted {
            generator: self.generator.name().to_string(),
        });
        let generation_started = Instant::now();
        let config = self.generator_config(runner);
        let message = self.generator.generate(&state, &config).await?;
        self.logger.log(&LogEvent::GenerationCompleted {
            duration_secs: generation_started.elapsed().as_secs_f64(),
            subject: subject_line(&message),
        });

        if self.interrupt_requested() {
            return self.stop_interrupted(staging, snapshot).await;
        }

        if self.options.dry_run {
            let files = state.staged.len();
            let restored = match self.restore(staging, snapshot).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "dry run could not restore the staging area");
                    false
                }
            };
            return Ok(FlowOutcome::dry_run(message, files, restored, start.elapsed()));
        }

        // Let the caller accept, rewrite, or reject the proposal
        match self.confirmer.review(&message, &state).await? {
            ReviewDecision::Commit(final_message) => {
                let sha =
                    create_commit(runner, &final_message, self.options.identity.as_ref()).await?;
                self.logger.log(&LogEvent::CommitCreated {
                    sha: sha.clone(),
                    files: state.staged.len(),
                });
                Ok(FlowOutcome::committed(
                    sha,
                    final_message,
                    state.staged.len(),
                    start.elapsed(),
                ))
            }
            ReviewDecision::Abort => {
                info!("proposal rejected, restoring staging area");
                self.restore(staging, snapshot).await?;
                Ok(FlowOutcome::Aborted { restored: true })
            }
        }
    }

    /// Stage the current worktree candidates. Returns `Some` when the pass
    /// was interrupted and the flow should stop with that outcome.
    async fn auto_stage(
        &self,
        staging: &StagingManager<'_>,
        snapshot: &StagingSnapshot,
    ) -> Result<Option<FlowOutcome>, FlowError> {
        let candidates = staging.worktree_candidates(self.options.stage_mode).await?;
        if candidates.is_empty() {
            debug!("no worktree changes to stage");
            return Ok(None);
        }

        self.logger.log(&LogEvent::AutoStageStarted {
            mode: self.options.stage_mode.label().to_string(),
            candidates: candidates.len(),
        });

        let result = match staging.stage_paths(candidates, &self.interrupted).await {
            Ok(result) => result,
            Err(GitError::Interrupted) => {
                return Ok(Some(self.stop_interrupted(staging, snapshot).await?));
            }
            Err(e) => return Err(e.into()),
        };

        if !result.success {
            let first_error = result
                .failed
                .first()
                .map(|f| f.error.clone())
                .unwrap_or_default();
            self.logger.log(&LogEvent::AutoStageRolledBack {
                failed: result.failed.len(),
                first_error,
            });
            return Err(FlowError::StagingFailed {
                failures: result.failed,
            });
        }

        self.logger.log(&LogEvent::AutoStageCompleted {
            staged: result.staged.len(),
            duration_secs: result.duration.as_secs_f64(),
        });
        Ok(None)
    }

    async fn stop_interrupted(
        &self,
        staging: &StagingManager<'_>,
        snapshot: &StagingSnapshot,
    ) -> Result<FlowOutcome, FlowError> {
        self.logger.log(&LogEvent::Interrupted);
        let restored = match self.restore(staging, snapshot).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "restoration after interrupt did not complete");
                false
            }
        };
        Ok(FlowOutcome::Interrupted { restored })
    }

    /// Compute and execute the restoration plan against a fresh snapshot.
    async fn restore(
        &self,
        staging: &StagingManager<'_>,
        snapshot: &StagingSnapshot,
    ) -> Result<(), FlowError> {
        let current =
            staging
                .capture_snapshot()
                .await
                .map_err(|e| FlowError::RestorationFailed {
                    paths: Vec::new(),
                    details: format!("could not read the current staging state: {e}"),
                })?;

        let plan = RestorationPlan::between(snapshot, &current);
        if plan.is_empty() {
            debug!("staging area already matches the snapshot");
            return Ok(());
        }

        self.logger.log(&LogEvent::RestorationStarted {
            paths: plan.len(),
        });

        match plan.execute(staging).await {
            Ok(restored) => {
                self.logger
                    .log(&LogEvent::RestorationCompleted { restored });
                Ok(())
            }
            Err(e) => {
                self.logger.log(&LogEvent::RestorationFailed {
                    error: e.to_string(),
                });
                Err(FlowError::RestorationFailed {
                    paths: plan.paths().map(str::to_string).collect(),
                    details: e.to_string(),
                })
            }
        }
    }

    fn generator_config(&self, runner: &GitRunner) -> GeneratorConfig {
        let mut config = GeneratorConfig::new(runner.repo_root().to_path_buf());
        if let Some(timeout) = self.options.generation_timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(model) = &self.options.model {
            config = config.with_model(model.clone());
        }
        config
    }
}

fn subject_line(message: &str) -> String {
    message.lines().next().unwrap_or("").to_string()
}
