//! Message generation backends for gitscribe.
//!
//! A [`MessageGenerator`] turns a [`gitscribe_git::RepositoryState`] into a
//! commit message by shelling out to an LLM CLI (`claude` or `codex`). The
//! backends only differ in binary name and argument shape; prompt rendering
//! and reply cleanup are shared.

mod claude;
mod codex;
mod output;
mod prompt;
mod spawner;
mod traits;

pub use claude::ClaudeCliGenerator;
pub use codex::CodexCliGenerator;
pub use output::GeneratorOutput;
pub use prompt::{build_commit_prompt, clean_message};
pub use spawner::ProcessSpawner;
pub use traits::{GeneratorConfig, GeneratorError, GeneratorKind, MessageGenerator};

/// Create a generator by kind
pub fn create_generator(kind: GeneratorKind) -> Box<dyn MessageGenerator> {
    match kind {
        GeneratorKind::Claude => Box::new(ClaudeCliGenerator::new()),
        GeneratorKind::Codex => Box::new(CodexCliGenerator::new()),
    }
}
