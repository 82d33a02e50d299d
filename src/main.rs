//! Answer Desk - main entry point

use answer_desk::bootstrap::{build_resolver, build_state};
use answer_desk::catalog::TaskCatalog;
use answer_desk::config::DeskConfig;
use answer_desk::observability::{init_default_logging, metrics};
use answer_desk::server::{self, AppState};
use answer_desk::AnswerService;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

/// Keyword-routed question answering service
#[derive(Parser)]
#[command(name = "answer-desk")]
#[command(about = "Classify questions against a keyword table and answer them over HTTP")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "ANSWER_DESK_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Defaults to `serve`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve,
    /// Classify a single question and print the result
    Classify {
        /// Question text
        question: String,
        /// Also resolve the answer
        #[arg(long)]
        answer: bool,
    },
    /// Validate configuration
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Classify { question, answer } => classify_once(config, &question, answer).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<DeskConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(DeskConfig::load_from_file(path)?);
    }

    for candidate in ["answer-desk.toml", "config/answer-desk.toml"] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(DeskConfig::load_from_file(&path)?);
        }
    }

    Err("No configuration file found. Pass -c/--config or create answer-desk.toml".into())
}

async fn run_server(config: DeskConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting answer desk v{}", env!("CARGO_PKG_VERSION"));

    let addr = config.bind_addr()?;
    let state = build_state(&config)?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully..."),
        }
    };

    let reloader = tokio::spawn(reload_on_hangup(state.clone(), config));

    server::serve(state, addr, shutdown).await?;
    reloader.abort();

    info!("Application shutdown complete");
    Ok(())
}

/// Reload the task table on SIGHUP, keeping the old table if loading fails
async fn reload_on_hangup(state: Arc<AppState>, config: DeskConfig) {
    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!("SIGHUP handler unavailable, catalog reload disabled: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        info!("Received SIGHUP, reloading task table");
        let catalog = state.service.catalog().clone();
        let path = config.tasks.table_path.clone();
        let sheet = config.tasks.sheet.clone();

        let reloaded =
            tokio::task::spawn_blocking(move || catalog.reload(&path, sheet.as_deref())).await;

        match reloaded {
            Ok(Ok(())) => metrics().catalog_reload(true),
            Ok(Err(_)) => metrics().catalog_reload(false),
            Err(e) => {
                metrics().catalog_reload(false);
                error!("Catalog reload task failed: {}", e);
            }
        }
    }
}

async fn classify_once(
    config: DeskConfig,
    question: &str,
    resolve: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Arc::new(TaskCatalog::load(
        &config.tasks.table_path,
        config.tasks.sheet.as_deref(),
    )?);
    let service = AnswerService::new(
        catalog,
        build_resolver(&config),
        config.resolver.computed_tasks.clone(),
    );

    if resolve {
        let outcome = service.answer(question, None).await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", service.classify(question));
    }
    Ok(())
}

fn handle_config_command(config: &DeskConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
