use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;

use gitscribe_agent::{create_generator, GeneratorKind};
use gitscribe_core::{AcceptAll, CommitFlow, Confirmer, FlowOptions, InterruptCoordinator};
use gitscribe_git::{StageMode, DEFAULT_GIT_TIMEOUT};
use gitscribe_logging::{init_tracing, LogFormat, Logger};

mod config;
mod ui;

use config::Settings;
use ui::InteractiveConfirmer;

#[derive(Parser, Debug)]
#[command(
    name = "gitscribe",
    about = "Git commit assistant driven by coding agent CLIs",
    version,
    author
)]
struct Cli {
    /// Working directory (default: current directory)
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Also stage untracked files, not just modified ones
    #[arg(short = 'a', long)]
    all: bool,

    /// Never touch the staging area; commit only what is already staged
    #[arg(long)]
    no_stage: bool,

    /// Skip the review prompt and commit the generated message
    #[arg(short = 'y', long)]
    yes: bool,

    /// Run the full flow, then undo any staging instead of committing
    #[arg(long)]
    dry_run: bool,

    /// Generator CLI to use
    #[arg(long, value_enum)]
    agent: Option<GeneratorChoice>,

    /// Model to use (if the generator supports it)
    #[arg(short, long)]
    model: Option<String>,

    /// Per-git-command timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Output the final result as JSON on stdout
    #[arg(long)]
    json_output: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GeneratorChoice {
    Claude,
    Codex,
}

impl From<GeneratorChoice> for GeneratorKind {
    fn from(choice: GeneratorChoice) -> Self {
        match choice {
            GeneratorChoice::Claude => GeneratorKind::Claude,
            GeneratorChoice::Codex => GeneratorKind::Codex,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let working_dir = cli
        .working_dir
        .clone()
        .unwrap_or_else(|| std::env::current_dir().expect("Failed to get current directory"));

    // Layer config files under the CLI flags
    let settings = Settings::load(&working_dir)?;

    let log_format: LogFormat = cli.log_format.into();
    init_tracing("warn", log_format);

    // Resolve the generator
    let kind: GeneratorKind = match cli.agent {
        Some(choice) => choice.into(),
        None => match settings.agent() {
            Some(name) => name.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            None => GeneratorKind::Claude,
        },
    };
    let generator = create_generator(kind);
    if !generator.is_available().await {
        anyhow::bail!(
            "Generator '{}' is not available. Make sure it's installed and in PATH.",
            generator.name()
        );
    }

    let stage_mode = if cli.all || settings.include_untracked().unwrap_or(false) {
        StageMode::ModifiedAndUntracked
    } else {
        StageMode::ModifiedOnly
    };

    let git_timeout = cli
        .timeout_secs
        .or_else(|| settings.timeout_secs())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_GIT_TIMEOUT);

    let options = FlowOptions {
        working_dir: working_dir.clone(),
        stage_mode,
        auto_stage: !cli.no_stage,
        dry_run: cli.dry_run,
        model: cli
            .model
            .clone()
            .or_else(|| settings.model().map(str::to_string)),
        git_timeout,
        generation_timeout: Some(Duration::from_secs(120)),
        identity: settings.identity(),
    };

    let logger = Arc::new(Logger::new(log_format));

    let confirmer: Box<dyn Confirmer> = if cli.yes {
        Box::new(AcceptAll)
    } else {
        Box::new(InteractiveConfirmer)
    };

    let flow = CommitFlow::new(generator.as_ref(), confirmer.as_ref(), logger, options);

    // Handle Ctrl+C gracefully
    InterruptCoordinator::install(flow.interrupt_handle())
        .context("Failed to set Ctrl+C handler")?;

    // Run the flow
    let outcome = match flow.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".bright_red(), e);
            std::process::exit(2);
        }
    };

    // Output result
    if cli.json_output {
        let json = serde_json::to_string_pretty(&outcome)?;
        println!("{}", json);
    } else {
        ui::print_outcome(&outcome);
    }

    // Exit with appropriate code
    std::process::exit(outcome.exit_code());
}
