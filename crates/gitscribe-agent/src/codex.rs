use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::{GeneratorConfig, GeneratorError, GeneratorKind, GeneratorOutput, MessageGenerator, ProcessSpawner};

/// Codex CLI backend
pub struct CodexCliGenerator {
    binary_path: PathBuf,
}

impl CodexCliGenerator {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("codex"),
        }
    }

    pub fn with_binary_path(path: PathBuf) -> Self {
        Self { binary_path: path }
    }
}

impl Default for CodexCliGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageGenerator for CodexCliGenerator {
    fn name(&self) -> &str {
        "Codex CLI"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Codex
    }

    fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn execute(
        &self,
        prompt: &str,
        config: &GeneratorConfig,
    ) -> Result<GeneratorOutput, GeneratorError> {
        // Codex uses the "exec" subcommand for non-interactive execution
        let mut args = vec!["exec"];

        // Add model if specified
        let model_arg;
        if let Some(ref model) = config.model {
            args.push("--model");
            model_arg = model.clone();
            args.push(&model_arg);
        }

        // Add the prompt
        args.push("--");
        args.push(prompt);

        ProcessSpawner::spawn(&self.binary_path, &args, config).await
    }
}
