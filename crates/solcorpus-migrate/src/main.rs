//! solcorpus-migrate CLI
//!
//! Moves the crawler's SQLite catalog of Solidity files into MongoDB.
//! Pedantic lints relaxed for CLI ergonomics.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::{Args, Parser, Subcommand};
use console::style;
use dialoguer::Password;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use solcorpus_migrate::config::redact_uri;
use solcorpus_migrate::{MigrationConfig, MigrationStats, Pipeline, RunOutcome};

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "solcorpus-migrate")]
#[command(version)]
#[command(about = "Migrate the Solidity contract catalog from SQLite to MongoDB", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Dry run mode (don't write to destination)
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migration
    Run(RunArgs),

    /// Validate configuration file
    Validate,

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "migration.yaml")]
        output: PathBuf,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// SQLite catalog produced by the crawler
    #[arg(short, long, value_name = "FILE")]
    source: Option<PathBuf>,

    /// MongoDB connection string (mongodb:// or mongodb+srv://)
    #[arg(short, long, value_name = "URI", env = "MONGODB_URI", hide_env_values = true)]
    destination: Option<String>,

    /// Destination database
    #[arg(long)]
    database: Option<String>,

    /// Destination collection
    #[arg(long)]
    collection: Option<String>,

    /// Only migrate repositories with an open-source license
    #[arg(long)]
    check_license: bool,

    /// Access token for the license API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Run(args)) => {
            let config = build_config(cli.config.as_deref(), &args, cli.dry_run)?;
            run_migration(config).await?;
        }
        Some(Commands::Validate) => {
            let path = cli
                .config
                .ok_or_else(|| anyhow::anyhow!("validate requires --config <FILE>"))?;
            validate_config(&path)?;
        }
        Some(Commands::Init { output }) => {
            generate_config(&output)?;
        }
        None => {
            // Default: run migration if config provided
            if let Some(path) = cli.config {
                let config = build_config(Some(&path), &RunArgs::default(), cli.dry_run)?;
                run_migration(config).await?;
            } else {
                eprintln!("Usage: solcorpus-migrate --config <FILE> or solcorpus-migrate <COMMAND>");
                eprintln!("Try 'solcorpus-migrate --help' for more information.");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Merges the config file (if any) with command-line overrides.
fn build_config(
    config_path: Option<&Path>,
    args: &RunArgs,
    dry_run: bool,
) -> anyhow::Result<MigrationConfig> {
    let mut config = match (config_path, &args.source) {
        (Some(path), _) => {
            info!("Loading configuration from {:?}", path);
            MigrationConfig::from_file(path)?
        }
        (None, Some(source)) => MigrationConfig::for_source(source.clone()),
        (None, None) => anyhow::bail!("either --config <FILE> or --source <FILE> is required"),
    };

    if let Some(source) = &args.source {
        config.source.path = source.clone();
    }
    if let Some(uri) = &args.destination {
        config.destination.uri = uri.clone();
    }
    if let Some(database) = &args.database {
        config.destination.database = database.clone();
    }
    if let Some(collection) = &args.collection {
        config.destination.collection = collection.clone();
    }
    if args.check_license {
        config.license.enabled = true;
    }
    if config.license.token.is_none() {
        config.license.token = args.token.clone();
    }
    if dry_run {
        config.options.dry_run = true;
    }

    if config.license.enabled && config.license.token.as_deref().unwrap_or("").is_empty() {
        config.license.token = Some(prompt_token()?);
    }

    config.validate()?;
    Ok(config)
}

fn prompt_token() -> anyhow::Result<String> {
    let token = Password::new()
        .with_prompt("License checks need an API access token")
        .interact()
        .map_err(|e| anyhow::anyhow!("Token prompt cancelled: {e}"))?;
    Ok(token)
}

async fn run_migration(config: MigrationConfig) -> anyhow::Result<()> {
    info!("Starting migration...");

    let mut pipeline = Pipeline::from_config(&config).await?;

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let report = pipeline.run_until(interrupt).await;
    let dry_run = config.options.dry_run;

    match report.outcome {
        RunOutcome::Completed => {
            print_summary("Migration Complete!", &report.stats, dry_run);
            Ok(())
        }
        RunOutcome::Aborted(e) => {
            error!("Migration aborted: {}", e);
            print_summary("Migration Aborted", &report.stats, dry_run);
            Err(e.into())
        }
        RunOutcome::Interrupted => {
            print_summary("Migration Interrupted", &report.stats, dry_run);
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }
}

fn print_summary(title: &str, stats: &MigrationStats, dry_run: bool) {
    println!();
    println!("{}", style(title).bold());
    if dry_run {
        println!("   (dry run, nothing was written)");
    }
    println!(
        "   Repositories: {}/{} ({} without open-source license)",
        stats.repositories, stats.repositories_total, stats.repositories_skipped
    );
    println!("   Files:        {}/{}", stats.files, stats.files_total);
    println!("   Commits:      {}/{}", stats.commits, stats.commits_total);
    println!("   Uploaded:     {}", style(stats.uploaded).green());
    println!("   Duplicates:   {}", stats.duplicates);
    println!("   Skipped JSON: {}", stats.skipped_json);
    println!("   Empty files:  {}", stats.skipped_empty);
    println!("   Failed:       {}", style(stats.failed).red());
    println!("   API requests: {}", stats.api_requests);
    println!("   Duration:     {:.2}s", stats.duration_secs);
    println!("   Throughput:   {:.0} files/sec", stats.throughput());
}

fn validate_config(config_path: &Path) -> anyhow::Result<()> {
    info!("Validating configuration from {:?}", config_path);

    let config = MigrationConfig::from_file(config_path)?;
    config.validate()?;

    println!("Configuration is valid!");
    println!("   Source:      {:?}", config.source.path);
    println!("   Destination: {}", redact_uri(&config.destination.uri));
    println!(
        "   Collection:  {}.{}",
        config.destination.database, config.destination.collection
    );
    println!(
        "   License:     {}",
        if config.license.enabled {
            "checked"
        } else {
            "not checked"
        }
    );

    Ok(())
}

fn generate_config(output: &Path) -> anyhow::Result<()> {
    std::fs::write(output, CONFIG_TEMPLATE)?;
    println!("Generated configuration: {:?}", output);
    println!(
        "   Edit the file and run: solcorpus-migrate run --config {:?}",
        output
    );

    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# solcorpus-migrate configuration
source:
  path: ./contracts.db

destination:
  uri: mongodb://localhost:27017  # or MONGODB_URI; mongodb+srv:// also accepted
  database: smart_contracts
  collection: contracts

license:
  enabled: false
  # token: your-token  # or GITHUB_TOKEN
  api_url: https://api.github.com
  throttle_ms: 720  # 5000 requests per hour
  default_retry_after_secs: 60

options:
  dry_run: false
"#;
