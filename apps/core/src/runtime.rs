use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use crate::catalog_sync::SyncStatus;
use crate::command_registry::SlashCommandSuggestion;
use crate::config::{self, Config, ConfigError};
use crate::core_service::{CoreService, InputOutcome, ServiceError};
use crate::logging::{self, LoggingError};
use crate::model::SearchResult;
use crate::scheduler::spawn_periodic_sync;
use crate::transport::serve_lines;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "leetjump", version, about = "Search a local mirror of the problem catalog")]
pub struct CliOptions {
    /// Config file (JSON5 or TOML). Defaults to the app data directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Mirror log output to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Search the local catalog by id, title or slug.
    Search {
        query: String,
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// Refresh the catalog if it is stale (or always, with --force).
    Sync {
        #[arg(long)]
        force: bool,
    },
    /// Show mirror freshness and size.
    Status,
    /// Print the URL for a problem slug.
    Url { slug: String },
    /// Open a problem in the browser.
    Open { slug: String },
    /// Treat the text like popup input: `/` runs a command, anything else searches.
    Input { text: String },
    /// Answer JSON requests line by line on stdin while syncing in the background.
    Serve,
    /// Write the default config file if none exists.
    InitConfig,
}

pub fn parse_cli_args<I, T>(args: I) -> Result<CliOptions, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    CliOptions::try_parse_from(args)
}

pub fn run_with_options(options: CliOptions) -> Result<(), RuntimeError> {
    let config = config::load(options.config.as_deref())?;
    if let CliCommand::InitConfig = options.command {
        return init_config(&config);
    }

    logging::init(&config, options.verbose)?;
    log::info!(
        "startup command={:?} config_path={} catalog_db_path={}",
        options.command,
        config.config_path.display(),
        config.catalog_db_path.display(),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_command(config, options.command))
}

async fn run_command(config: Config, command: CliCommand) -> Result<(), RuntimeError> {
    let service = CoreService::new(config)?;
    match command {
        CliCommand::Search { query, limit } => {
            print_results(&service.search(&query, limit)?);
        }
        CliCommand::Sync { force } => {
            let synced = service.sync(force).await?;
            if synced {
                let count = service.store().count().map_err(ServiceError::from)?;
                println!("synced {count} problems");
            } else {
                println!("catalog is up to date");
            }
        }
        CliCommand::Status => print_status(&service.sync_status()?),
        CliCommand::Url { slug } => println!("{}", service.problem_url(&slug)),
        CliCommand::Open { slug } => println!("opened {}", service.open_problem(&slug)?),
        CliCommand::Input { text } => match service.handle_input(&text).await? {
            InputOutcome::Suggestions(suggestions) => print_suggestions(&suggestions),
            InputOutcome::Executed(input) => println!("ran {input}"),
            InputOutcome::Results(results) => print_results(&results),
        },
        CliCommand::Serve => serve(service).await?,
        CliCommand::InitConfig => {}
    }
    Ok(())
}

fn init_config(config: &Config) -> Result<(), RuntimeError> {
    if config.config_path.exists() {
        println!("config already exists at {}", config.config_path.display());
        return Ok(());
    }
    config::save(config)?;
    println!("wrote default config to {}", config.config_path.display());
    Ok(())
}

async fn serve(service: CoreService) -> Result<(), RuntimeError> {
    let service = Arc::new(service);
    let background = spawn_periodic_sync(
        Arc::clone(service.sync_service()),
        service.config().sync_check_interval(),
    );
    log::info!("serving JSON requests on stdin");

    let served = serve_lines(
        Arc::clone(&service),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    background.abort();
    served?;
    log::info!("stdin closed; shutting down");
    Ok(())
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("no matches");
        return;
    }
    for result in results {
        let problem = &result.problem;
        let paid = if problem.is_paid_only { " [paid]" } else { "" };
        println!(
            "{:>5}  {:<6}  {:5.1}%  {}{}  ({:?})",
            problem.id,
            problem.difficulty.as_str(),
            problem.ac_rate,
            problem.title,
            paid,
            result.match_type,
        );
    }
}

fn print_suggestions(suggestions: &[SlashCommandSuggestion]) {
    if suggestions.is_empty() {
        println!("no commands found; try /help");
        return;
    }
    for suggestion in suggestions {
        println!(
            "/{:<10} {}",
            suggestion.matched_alias, suggestion.command.description
        );
    }
}

fn print_status(status: &SyncStatus) {
    let last_sync = status
        .last_sync
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    println!("problems:  {}", status.total_count);
    println!("last sync: {last_sync}");
    println!("stale:     {}", status.is_stale);
}
