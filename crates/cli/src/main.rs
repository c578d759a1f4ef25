use std::path::PathBuf;

use anyhow::Result;
use baton_core::pipeline_manager::{PipelineManager, PipelineManagerConfig};
use baton_core::registry::CapabilityRegistry;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

/// Baton - A sequential build runner
#[derive(Parser)]
#[command(name = "baton")]
#[command(about = "Run build pipelines one step at a time")]
#[command(version)]
struct Cli {
    /// Path to the pipeline root (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Main pipeline file, relative to the root (defaults to .baton/pipeline.yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr (BATON_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task, step or target group
    Run {
        /// Task name followed by overrides, e.g. `dist --port=9000 --no-minify`.
        /// `-v`/`--verbose` is still recognised here; `--root` and `--config`
        /// must come before the task.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Show execution plan for a task without running it
    Plan {
        #[arg(default_value = "default")]
        task: String,
    },
    /// List tasks and steps
    List,
    /// Show what each task runs
    Graph,
    /// List the capabilities steps can use
    Capabilities {
        /// Also print each capability's option schema
        #[arg(long)]
        options: bool,
    },
    /// Print the JSON schema of the pipeline file
    Schema,
}

fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_env("BATON_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Trailing run arguments swallow global flags, so pick verbosity out of them
    if let Commands::Run { args } = &mut cli.command {
        let before = args.len();
        args.retain(|arg| arg != "-v" && arg != "--verbose");
        cli.verbose |= args.len() != before;
    }
    init_tracing(cli.verbose);

    // These do not need a pipeline file
    match &cli.command {
        Commands::Schema => return commands::schema::execute(),
        Commands::Capabilities { options } => {
            return commands::capabilities::execute(&CapabilityRegistry::with_builtins(), *options)
        }
        _ => {}
    }

    let manager = PipelineManager::new(PipelineManagerConfig {
        config_file: cli.config,
        ..PipelineManagerConfig::new(cli.root)
    })
    .map_err(|e| anyhow::anyhow!("Failed to load pipeline: {}", e))?;
    debug!(
        root = %manager.root().display(),
        steps = manager.orchestrator().steps().len(),
        tasks = manager.orchestrator().tasks().len(),
        "pipeline ready"
    );

    // Execute command (CLI layer only handles presentation)
    match cli.command {
        Commands::Run { args } => commands::run::execute(&manager, &args),
        Commands::Plan { task } => commands::plan::execute(&manager, &task),
        Commands::List => commands::list::execute(&manager),
        Commands::Graph => commands::graph::execute(&manager),
        Commands::Capabilities { .. } | Commands::Schema => Ok(()),
    }
}
