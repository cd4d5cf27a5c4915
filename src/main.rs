use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use wormscan_governor::config::{AppConfig, LogFormat};
use wormscan_governor::governor::ChainFilter;
use wormscan_governor::service::GovernorService;
use wormscan_governor::telemetry;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "GOVERNOR_CONFIG")]
    config: Option<PathBuf>,

    /// JSON export of governor config and status documents
    #[arg(long, global = true, env = "GOVERNOR_DOCUMENTS")]
    documents: Option<PathBuf>,

    /// Postgres connection string for the relational report store
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Number of guardians that must agree on a value
    #[arg(long, global = true, env = "GOVERNOR_MIN_GUARDIANS")]
    min_guardians: Option<usize>,

    /// Log output format
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the governor REST API
    #[cfg(feature = "rest-api")]
    Serve(ServeArgs),
    /// Run one aggregation and print the result as JSON
    Aggregate(AggregateArgs),
    /// Show version information
    Version,
}

#[cfg(feature = "rest-api")]
#[derive(Parser, Debug)]
struct ServeArgs {
    /// Listen address, overrides the configured one
    #[arg(long, env = "LISTEN_ADDR")]
    listen_addr: Option<std::net::SocketAddr>,
}

#[derive(Parser, Debug)]
struct AggregateArgs {
    /// Which view to compute
    #[arg(long, value_enum, default_value = "limits")]
    report: ReportKind,

    /// Restrict the output to one chain
    #[arg(long)]
    chain: Option<u16>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportKind {
    /// Quorum-derived limits per chain
    Limits,
    /// Most restrictive single guardian report per chain
    Available,
    /// Deduplicated enqueued VAAs per chain
    Enqueued,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => AppConfig::default(),
        };

        if let Some(documents) = &self.documents {
            config.source.documents_path = Some(documents.clone());
        }
        if let Some(url) = &self.database_url {
            config.source.database_url = Some(url.clone());
        }
        if let Some(min_guardians) = self.min_guardians {
            config.quorum.set_min_guardians(min_guardians);
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Commands::Version = args.command {
        println!("Wormscan Governor v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = args.load_config()?;
    telemetry::init(config.log_format);

    match &args.command {
        #[cfg(feature = "rest-api")]
        Commands::Serve(serve_args) => run_serve(config, serve_args).await,
        Commands::Aggregate(aggregate_args) => run_aggregate(config, aggregate_args).await,
        Commands::Version => Ok(()),
    }
}

#[cfg(feature = "rest-api")]
async fn run_serve(mut config: AppConfig, args: &ServeArgs) -> anyhow::Result<()> {
    if let Some(addr) = args.listen_addr {
        config.api.listen_addr = addr;
    }

    let service = GovernorService::from_config(&config).context("Invalid configuration")?;
    tracing::info!(
        "Starting Wormscan Governor v{} with sources {:?} (quorum={})",
        env!("CARGO_PKG_VERSION"),
        service.source_names(),
        service.aggregator().min_guardians()
    );

    let server = wormscan_governor::rest_api::run_server(std::sync::Arc::new(service), config.api.listen_addr);

    tokio::select! {
        result = server => result.context("REST API server failed")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Received shutdown signal"),
    }

    Ok(())
}

async fn run_aggregate(config: AppConfig, args: &AggregateArgs) -> anyhow::Result<()> {
    let service = GovernorService::from_config(&config).context("Invalid configuration")?;
    let filter = ChainFilter::from(args.chain);

    let output = match args.report {
        ReportKind::Limits => serde_json::to_string_pretty(&service.governor_limits(filter).await?)?,
        ReportKind::Available => {
            let mut rows = service.available_notional_by_chain().await?;
            rows.retain(|row| filter.matches(row.chain_id));
            serde_json::to_string_pretty(&rows)?
        }
        ReportKind::Enqueued => serde_json::to_string_pretty(&service.enqueued_vaas(filter).await?)?,
    };

    println!("{}", output);
    Ok(())
}
