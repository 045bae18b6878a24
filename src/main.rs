use anyhow::{bail, Context};
use api_client::{BenchmarkApiClient, FileBenchmarkProvider, NarrativeClient};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use configuration::Config;
use core_types::{BenchmarkProvider, ClientProfile, MetricSeries, Summarizer};
use database::{connect, run_migrations, DbRepository};
use engine::{AnalysisOptions, AnalysisRequest, AnalyticsOrchestrator, Collaborators};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use web_server::AppState;

mod output;

/// The main entry point for the Meridian analytics application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    // The guard flushes the file log on drop, so it must live until the end of main.
    let _log_guard = configuration::init_tracing(&config.logging).context("Failed to initialize logging")?;

    // Execute the appropriate command
    match cli.command {
        Commands::Migrate => {
            connect_repository().await?;
            println!("Database migrations applied.");
        }
        Commands::Import(args) => handle_import(args).await?,
        Commands::Analyze(args) => handle_analyze(&config, args).await?,
        Commands::AnalyzeOrg(args) => handle_analyze_org(&config, args).await?,
        Commands::Serve(args) => handle_serve(&config, args).await?,
    }
    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Forecasting, risk scoring and benchmarking for client portfolios.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the database migrations.
    Migrate,
    /// Load client profiles and metric history from a JSON file.
    Import(ImportArgs),
    /// Analyse one client and print the results.
    Analyze(AnalyzeArgs),
    /// Analyse every client of an organization.
    AnalyzeOrg(AnalyzeOrgArgs),
    /// Serve the JSON API.
    Serve(ServeArgs),
}

#[derive(Args)]
struct ImportArgs {
    /// JSON file with `clients` and `series` arrays.
    #[arg(long)]
    file: PathBuf,
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Metrics to analyse, comma separated (defaults to the configured list).
    #[arg(long, value_delimiter = ',')]
    metrics: Vec<String>,

    /// Forecast horizon in periods.
    #[arg(long)]
    horizon: Option<usize>,

    /// Months of history to fetch.
    #[arg(long)]
    lookback_months: Option<u32>,

    /// Analyse as of this date (format: YYYY-MM-DD) instead of today.
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Do not persist the produced insights.
    #[arg(long)]
    dry_run: bool,

    /// Print the full result as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn options(&self) -> anyhow::Result<AnalysisOptions> {
        let as_of = match self.as_of {
            Some(date) => Some(
                date.and_hms_opt(23, 59, 59)
                    .context("invalid --as-of date")?
                    .and_utc(),
            ),
            None => None,
        };
        Ok(AnalysisOptions {
            metrics: self.metrics.clone(),
            horizon: self.horizon,
            lookback_months: self.lookback_months,
            as_of,
            dry_run: self.dry_run,
        })
    }
}

#[derive(Args)]
struct AnalyzeArgs {
    #[arg(long)]
    client_id: Uuid,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct AnalyzeOrgArgs {
    #[arg(long)]
    organization_id: Uuid,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct ServeArgs {
    /// Overrides `server.bind_address`.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

// ==============================================================================
// Wiring
// ==============================================================================

async fn connect_repository() -> anyhow::Result<DbRepository> {
    let pool = connect().await.context("Failed to connect to the database")?;
    run_migrations(&pool).await.context("Failed to run database migrations")?;
    Ok(DbRepository::new(pool))
}

/// Picks the production collaborators named by the provider settings.
fn build_collaborators(config: &Config, repository: &DbRepository) -> anyhow::Result<Collaborators> {
    let providers = &config.providers;
    let benchmarks: Arc<dyn BenchmarkProvider> = match (&providers.benchmark_api, &providers.benchmark_file) {
        (Some(api), _) => Arc::new(BenchmarkApiClient::new(api)?),
        (None, Some(path)) => Arc::new(FileBenchmarkProvider::new(path.clone())),
        (None, None) => bail!("no benchmark provider configured: set providers.benchmark_api or providers.benchmark_file"),
    };
    let summarizer: Option<Arc<dyn Summarizer>> = match &providers.narrative {
        Some(settings) => Some(Arc::new(NarrativeClient::new(settings)?)),
        None => None,
    };
    let repository = Arc::new(repository.clone());
    Ok(Collaborators {
        history: repository.clone(),
        benchmarks,
        sink: repository,
        summarizer,
    })
}

async fn build_orchestrator(config: &Config) -> anyhow::Result<(AnalyticsOrchestrator, DbRepository)> {
    let repository = connect_repository().await?;
    let collaborators = build_collaborators(config, &repository)?;
    let orchestrator = AnalyticsOrchestrator::new(config, collaborators).context("Invalid analytics settings")?;
    Ok((orchestrator, repository))
}

// ==============================================================================
// Command Logic
// ==============================================================================

#[derive(Deserialize)]
struct ImportFile {
    #[serde(default)]
    clients: Vec<ClientProfile>,
    #[serde(default)]
    series: Vec<MetricSeries>,
}

/// Loads clients first, then every series, one transaction per series.
async fn handle_import(args: ImportArgs) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let file: ImportFile = serde_json::from_str(&raw).context("Invalid import file")?;
    let repository = connect_repository().await?;

    let progress_bar = ProgressBar::new((file.clients.len() + file.series.len()) as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    for client in &file.clients {
        progress_bar.set_message(client.name.clone());
        repository.save_client(client).await?;
        progress_bar.inc(1);
    }
    for series in &file.series {
        // Re-validate: deserialization bypasses `MetricSeries::new`.
        let series = MetricSeries::new(series.client_id, series.metric.clone(), series.points.clone())
            .with_context(|| format!("Invalid series {} for client {}", series.metric, series.client_id))?
            .with_polarity(series.polarity)
            .with_non_negative(series.non_negative);
        progress_bar.set_message(series.metric.clone());
        repository.save_series(&series).await?;
        progress_bar.inc(1);
    }
    progress_bar.finish_with_message("Import complete!");
    tracing::info!(
        clients = file.clients.len(),
        series = file.series.len(),
        "Imported {}",
        args.file.display()
    );
    Ok(())
}

async fn handle_analyze(config: &Config, args: AnalyzeArgs) -> anyhow::Result<()> {
    let (orchestrator, _) = build_orchestrator(config).await?;
    let request = AnalysisRequest::new(args.client_id).with_options(args.run.options()?);
    let analysis = orchestrator.analyze_client(&request).await?;

    if args.run.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        output::print_client_analysis(&analysis);
    }
    Ok(())
}

async fn handle_analyze_org(config: &Config, args: AnalyzeOrgArgs) -> anyhow::Result<()> {
    let (orchestrator, repository) = build_orchestrator(config).await?;
    let options = args.run.options()?;
    let client_count = repository.get_clients_for_organization(args.organization_id).await?.len();

    let progress_bar = ProgressBar::new(client_count as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );
    let started = Utc::now();
    let result = orchestrator
        .analyze_organization_with(args.organization_id, &options, |client, ok| {
            progress_bar.inc(1);
            progress_bar.set_message(format!("{} {}", client.name, if ok { "done" } else { "failed" }));
        })
        .await?;
    progress_bar.finish_with_message(format!(
        "Analysed {} clients in {}s",
        result.client_count(),
        (Utc::now() - started).num_seconds()
    ));

    if args.run.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::print_organization_analysis(&result);
    }
    Ok(())
}

async fn handle_serve(config: &Config, args: ServeArgs) -> anyhow::Result<()> {
    let addr = match args.bind {
        Some(addr) => addr,
        None => config
            .server
            .bind_address
            .parse()
            .with_context(|| format!("Invalid server.bind_address '{}'", config.server.bind_address))?,
    };
    let (orchestrator, repository) = build_orchestrator(config).await?;
    tracing::info!(%addr, "Starting API server");
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        repository,
    };
    web_server::run_server(state, addr).await
}
