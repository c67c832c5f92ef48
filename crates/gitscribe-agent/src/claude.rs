use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::{GeneratorConfig, GeneratorError, GeneratorKind, GeneratorOutput, MessageGenerator, ProcessSpawner};

/// Claude CLI backend
pub struct ClaudeCliGenerator {
    binary_path: PathBuf,
}

impl ClaudeCliGenerator {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("claude"),
        }
    }

    pub fn with_binary_path(path: PathBuf) -> Self {
        Self { binary_path: path }
    }
}

impl Default for ClaudeCliGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageGenerator for ClaudeCliGenerator {
    fn name(&self) -> &str {
        "Claude CLI"
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Claude
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
        let mut args = vec![
            "--print", // Non-interactive mode, output only
        ];

        // Add model if specified
        let model_arg;
        if let Some(ref model) = config.model {
            args.push("--model");
            model_arg = model.clone();
            args.push(&model_arg);
        }

        // Add -- to signal end of options, then the prompt as positional argument
        // This prevents prompts starting with '-' from being interpreted as options
        args.push("--");
        args.push(prompt);

        ProcessSpawner::spawn(&self.binary_path, &args, config).await
    }
}
