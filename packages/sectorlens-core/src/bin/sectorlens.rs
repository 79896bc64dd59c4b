//! Sectorlens CLI - portfolio analytics over a price snapshot.
//!
//! Every command prints a JSON `ApiResponse` on stdout; logs go to stderr.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sectorlens_core::{
    AnalyzerConfig, ApiResponse, DateRange, InMemoryPriceStore, Portfolio, PortfolioAnalyzer,
    ScenarioKind, StaticSectorSource,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sectorlens")]
#[command(about = "Portfolio performance, risk and sector-rotation analytics")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $SECTORLENS_CONFIG_FILE or ~/.sectorlens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a portfolio: metrics, sectors, underperformers, replacements
    Analyze(Inputs),
    /// Apply a shock scenario to the portfolio's daily returns
    Stress {
        #[command(flatten)]
        inputs: Inputs,
        /// market_crash, rate_hike or baseline
        #[arg(short, long, default_value = "market_crash")]
        scenario: String,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct Inputs {
    /// Portfolio JSON: [{"ticker": "TCS.NS", "weight": 0.5}, ...]
    #[arg(short, long)]
    portfolio: PathBuf,
    /// Price snapshot JSON: {"TICKER": [{"date": "2024-01-02", "price": 101.5}, ...]}
    #[arg(long)]
    prices: PathBuf,
    /// First date of the analysis window (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,
    /// Last date of the analysis window (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match run(cli) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            serde_json::to_string_pretty(&ApiResponse::<()>::err(format!("{:#}", e)))?
        }
    };

    println!("{}", output);
    Ok(())
}

fn run(cli: Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(inputs) => {
            let (analyzer, portfolio, range) = prepare(config, &inputs)?;
            let analysis = analyzer.analyze_portfolio(&portfolio, &range)?;
            respond(&analysis)
        }
        Commands::Stress { inputs, scenario } => {
            let (analyzer, portfolio, range) = prepare(config, &inputs)?;
            let summary =
                analyzer.run_stress_test(&portfolio, &range, ScenarioKind::parse(&scenario))?;
            respond(&summary)
        }
        Commands::Config => respond(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    let config = match path {
        Some(path) => AnalyzerConfig::load_from_path(path),
        None => AnalyzerConfig::load(),
    };
    config.context("failed to load config")
}

type CliAnalyzer = PortfolioAnalyzer<InMemoryPriceStore, StaticSectorSource>;

fn prepare(config: AnalyzerConfig, inputs: &Inputs) -> Result<(CliAnalyzer, Portfolio, DateRange)> {
    let range = DateRange::new(inputs.start, inputs.end)?;

    let content = fs::read_to_string(&inputs.portfolio)
        .with_context(|| format!("failed to read {}", inputs.portfolio.display()))?;
    let portfolio: Portfolio = serde_json::from_str(&content)
        .with_context(|| format!("invalid portfolio {}", inputs.portfolio.display()))?;

    let store = InMemoryPriceStore::load_from_path(&inputs.prices)
        .with_context(|| format!("failed to load prices from {}", inputs.prices.display()))?;
    tracing::info!(tickers = store.len(), "loaded price snapshot");

    let sectors = StaticSectorSource::from_config(&config);
    Ok((PortfolioAnalyzer::new(store, sectors, config), portfolio, range))
}

fn respond<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ApiResponse::ok(data))?)
}
