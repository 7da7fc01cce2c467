//! wbx - Build orchestrator for WebAssembly web apps
//!
//! The CLI loads the project configuration, hands build requests to the
//! builder crate and renders the event stream and final summary.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{variant, Cli, Commands};
use crate::display::{CommandReport, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tokio::select;
use tracing::{error, info};
use wbx_builder::{BuildController, BuildOutcome};
use wbx_config::Config;
use wbx_events::EventReceiver;
use wbx_types::{AbortHandler, BuildRequest, BuildVariant, CleanScope};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// What a command produced before the summary is assembled
enum CommandResult {
    Built {
        variant: BuildVariant,
        output_dir: PathBuf,
        duration: Duration,
        skipped: Vec<String>,
    },
    Cleaned {
        scope: CleanScope,
        removed: Vec<PathBuf>,
    },
}

async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting wbx v{}", env!("CARGO_PKG_VERSION"));

    let root = match cli.global.project.clone() {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    // File config (or defaults), then environment overrides
    let mut config = Config::load_or_default(cli.global.config.as_deref(), &root).await?;
    config.merge_env()?;
    config.validate()?;

    let (event_sender, event_receiver) = wbx_events::channel();
    let controller = BuildController::new(config, &root).with_event_sender(event_sender);

    let renderer = OutputRenderer::new(cli.global.json);
    let mut event_handler = EventHandler::new(renderer.supports_color(), cli.global.json);

    let abort = AbortHandler::new();
    let signal = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.abort();
        }
    });

    let result = execute_command_with_events(
        cli.command,
        &controller,
        abort,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    let report = match result {
        CommandResult::Built {
            variant,
            output_dir,
            duration,
            skipped,
        } => CommandReport::Build {
            variant,
            output_dir,
            duration,
            skipped,
            phases: event_handler.records().to_vec(),
            warnings: event_handler.warnings(),
        },
        CommandResult::Cleaned { scope, removed } => CommandReport::Clean { scope, removed },
    };
    renderer.render(&report)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    controller: &BuildController,
    abort: AbortHandler,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, controller, abort));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

async fn execute_command(
    command: Commands,
    controller: &BuildController,
    abort: AbortHandler,
) -> Result<CommandResult, CliError> {
    match command {
        Commands::Build {
            release,
            force,
            target,
        } => {
            let mut request = BuildRequest::new(variant(release))
                .with_force(force)
                .with_abort(abort);
            if let Some(target) = target {
                request = request.with_target(target);
            }
            let variant = request.variant;
            let outcome = controller.start(request).await;
            finish(controller.paths().output(variant), variant, outcome)
        }

        Commands::Merge { release, force } => {
            let request = BuildRequest::new(variant(release))
                .with_force(force)
                .with_abort(abort);
            let variant = request.variant;
            let outcome = controller.merge(request).await;
            finish(controller.paths().output(variant), variant, outcome)
        }

        Commands::Clean { scope } => {
            let removed = controller.clean(scope).await?;
            Ok(CommandResult::Cleaned { scope, removed })
        }
    }
}

fn finish(
    output_dir: &Path,
    variant: BuildVariant,
    outcome: BuildOutcome,
) -> Result<CommandResult, CliError> {
    match outcome {
        BuildOutcome::Succeeded { duration, skipped } => Ok(CommandResult::Built {
            variant,
            output_dir: output_dir.to_path_buf(),
            duration,
            skipped,
        }),
        BuildOutcome::Failed(e) => Err(e.into()),
        BuildOutcome::Aborted => Err(CliError::Aborted),
        BuildOutcome::AlreadyRunning => Err(CliError::AlreadyRunning),
    }
}

/// Folder for `--debug` log files
fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("wbx")
        .join("logs")
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let default_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,wbx=debug,wbx_builder=debug"))
    };

    if debug_enabled {
        // Structured JSON logs to a timestamped file
        let log_dir = log_dir();
        let log_file = log_dir.join(format!(
            "wbx-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));
        let file = std::fs::create_dir_all(&log_dir).and_then(|()| std::fs::File::create(&log_file));

        match file {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_env_filter(default_filter())
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) if !json_mode => {
                eprintln!("Warning: Failed to create log file: {e}");
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(default_filter())
                    .init();
                return;
            }
            Err(_) => {}
        }
    }

    if json_mode {
        // Keep stdout clean for the JSON report
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // The event handler prints status lines; library warnings still reach stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter("warn,wbx=off")
            .without_time()
            .with_target(false)
            .init();
    }
}
