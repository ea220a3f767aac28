//! Typecheck Monitor - file-change subscription for a type-checking daemon.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use typecheck_monitor::config::{ConfigLoader, MonitorConfig};
use typecheck_monitor::daemon::Daemon;
use typecheck_monitor::filesystem::AnalysisDirectory;
use typecheck_monitor::monitor::ProjectFilesMonitor;
use typecheck_monitor::options::StartupOptions;
use typecheck_monitor::service::NotifyWatchService;
use typecheck_monitor::watchman::Subscriber;

#[derive(Parser)]
#[command(
    name = "typecheck-monitor",
    about = "File-change subscription for a type-checking daemon",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the project's source files and report changes.
    Monitor {
        /// Directory to start the watch root search from.
        #[arg(long)]
        current_directory: Option<PathBuf>,
        /// Configuration file to use instead of the default search.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory for the pid file.
        #[arg(long)]
        log_directory: Option<PathBuf>,
        /// Debounce window in milliseconds.
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Print the watchman subscribe command without starting the daemon.
    Subscription {
        /// Directory to start the watch root search from.
        #[arg(long)]
        current_directory: Option<PathBuf>,
        /// Configuration file to use instead of the default search.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Resolve the startup options and configuration shared by all commands.
fn prepare(
    current_directory: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<(StartupOptions, MonitorConfig), String> {
    let current_directory = match current_directory {
        Some(directory) => directory,
        None => std::env::current_dir()
            .map_err(|e| format!("Cannot determine current directory: {e}"))?,
    };
    let loader = match config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(&current_directory),
    };
    let config = loader.load().map_err(|e| e.to_string())?;
    Ok((StartupOptions::new(current_directory), config))
}

fn build_monitor(options: &StartupOptions, config: &MonitorConfig) -> ProjectFilesMonitor {
    let analysis_directory = AnalysisDirectory::new(options.current_directory.clone());
    ProjectFilesMonitor::new(options, config, analysis_directory)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn run_monitor(
    options: &StartupOptions,
    mut config: MonitorConfig,
    debounce_ms: Option<u64>,
) -> ExitCode {
    if let Some(debounce_ms) = debounce_ms {
        config.debounce_ms = debounce_ms;
    }

    let mut monitor = build_monitor(options, &config);
    tracing::info!(
        analysis_root = %monitor.analysis_directory().root().display(),
        watchman_root = ?monitor.watchman_root(),
        "Starting project files monitor"
    );
    let mut service = match NotifyWatchService::new(config.debounce()) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start watch service");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    let daemon = Daemon::new(options.resolve_log_directory(&config));
    let result = daemon.run(&mut monitor, &mut service, cancel).await;
    match result {
        Ok(exit) => {
            tracing::info!(
                exit = ?exit,
                subscribed = monitor.is_subscribed(),
                "Monitor stopped"
            );
            ExitCode::SUCCESS
        }
        // A missing watch root exits with status 0: the monitor runs as a
        // detached child and a failure status would be misread by its parent.
        // The subscriber has already logged the error.
        Err(e) if e.is_root_not_found() => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Monitor failed");
            ExitCode::FAILURE
        }
    }
}

fn print_subscription(options: &StartupOptions, config: &MonitorConfig) -> ExitCode {
    let monitor = build_monitor(options, config);
    // Same exit status as the daemon when the watch root is missing.
    let Ok(subscriptions) = monitor.subscriptions() else {
        return ExitCode::SUCCESS;
    };

    for subscription in subscriptions {
        match subscription.to_command() {
            Ok(command) => println!("{command}"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render subscription");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Monitor {
            current_directory,
            config,
            log_directory,
            debounce_ms,
        } => {
            let (mut options, config) = match prepare(current_directory, config) {
                Ok(prepared) => prepared,
                Err(e) => {
                    tracing::error!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            if let Some(log_directory) = log_directory {
                options = options.with_log_directory(log_directory);
            }
            tracing::debug!(
                current_directory = %options.current_directory.display(),
                extensions = ?config.extensions,
                "Loaded monitor configuration"
            );
            run_monitor(&options, config, debounce_ms).await
        }
        Commands::Subscription {
            current_directory,
            config,
        } => match prepare(current_directory, config) {
            Ok((options, config)) => print_subscription(&options, &config),
            Err(e) => {
                tracing::error!("{e}");
                ExitCode::FAILURE
            }
        },
    }
}
