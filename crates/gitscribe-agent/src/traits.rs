use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use gitscribe_git::RepositoryState;

use crate::{prompt, GeneratorOutput};

/// Errors that can occur while producing a commit message
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to spawn generator process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Generation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Generator not found at path: {0}")]
    NotFound(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Generator returned an empty message")]
    EmptyMessage,
}

/// Configuration for one generation call
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Working directory for the generator CLI
    pub working_dir: PathBuf,
    /// Optional timeout (None = no limit)
    pub timeout: Option<std::time::Duration>,
    /// Additional environment variables
    pub env_vars: HashMap<String, String>,
    /// Model to use (if the CLI supports it)
    pub model: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            timeout: None,
            env_vars: HashMap::new(),
            model: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_env(mut self, key: String, value: String) -> Self {
        self.env_vars.insert(key, value);
        self
    }
}

/// Supported generator backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    Claude,
    Codex,
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorKind::Claude => write!(f, "claude"),
            GeneratorKind::Codex => write!(f, "codex"),
        }
    }
}

impl std::str::FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" | "claude-cli" | "claude-code" => Ok(GeneratorKind::Claude),
            "codex" | "codex-cli" => Ok(GeneratorKind::Codex),
            _ => Err(format!("Unknown generator: {}", s)),
        }
    }
}

/// The core abstraction for commit message generators
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    /// Human-readable name (e.g., "Claude CLI")
    fn name(&self) -> &str;

    /// The backend kind
    fn kind(&self) -> GeneratorKind;

    /// Path to the CLI binary
    fn binary_path(&self) -> &Path;

    /// Check if the CLI is available on the system
    async fn is_available(&self) -> bool;

    /// Run the underlying CLI once with a fully prepared prompt
    async fn execute(
        &self,
        prompt: &str,
        config: &GeneratorConfig,
    ) -> Result<GeneratorOutput, GeneratorError>;

    /// Render the repository state, run the CLI, and clean the reply into a
    /// usable commit message
    async fn generate(
        &self,
        state: &RepositoryState,
        config: &GeneratorConfig,
    ) -> Result<String, GeneratorError> {
        let prompt_text = prompt::build_commit_prompt(state);
        debug!(
            generator = self.name(),
            prompt_len = prompt_text.len(),
            staged = state.staged.len(),
            "generating commit message"
        );

        let output = self.execute(&prompt_text, config).await?;
        if !output.success() {
            return Err(GeneratorError::GenerationFailed(output.error_excerpt()));
        }

        let message = prompt::clean_message(&output.stdout);
        if message.is_empty() {
            return Err(GeneratorError::EmptyMessage);
        }
        Ok(message)
    }
}
