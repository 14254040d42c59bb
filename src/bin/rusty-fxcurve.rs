//! rusty-fxcurve CLI - build and inspect cached FX forward curves
//!
//! ## Example Usage
//!
//! ```bash
//! # Build one curve to CSV
//! rusty-fxcurve build EURUSD --start 2024-01-01 --end 2024-06-30 -o eurusd.csv
//!
//! # Build every configured pair as JSON, weekly
//! rusty-fxcurve build --all --start 2023-01-01 --end 2023-12-31 -p weekly -f json
//!
//! # Show what the history cache already holds
//! rusty-fxcurve coverage
//! ```

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rusty_fxcurve::builder::CurveBuilder;
use rusty_fxcurve::cache::HistoryStore;
use rusty_fxcurve::config::{CacheSettings, CurveConfig, DEFAULT_REFERENCE_TTL_DAYS};
use rusty_fxcurve::currency::CurrencyPair;
use rusty_fxcurve::curve::ForwardCurve;
use rusty_fxcurve::source::InMemorySource;
use rusty_fxcurve::types::Periodicity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

/// rusty-fxcurve: cached FX forward-curve builder
#[derive(Parser)]
#[command(name = "rusty-fxcurve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build FX forward curves through a persistent market-data cache", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build forward curves
    Build {
        /// Currency pair, e.g. EURUSD or EUR/USD
        #[arg(value_name = "PAIR", required_unless_present = "all")]
        pair: Option<String>,

        /// Build every configured pair
        #[arg(long, conflicts_with = "pair")]
        all: bool,

        /// Start date (YYYY-MM-DD)
        #[arg(short = 's', long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(short = 'e', long)]
        end: String,

        /// Sampling periodicity
        #[arg(short = 'p', long, default_value = "daily")]
        periodicity: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// List configured currency pairs
    Pairs,

    /// Show cached history intervals
    Coverage,

    /// Show paths and settings in effect
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_cache_dir")]
    cache_dir: PathBuf,
    #[serde(default = "default_curves_file")]
    curves_file: PathBuf,
    /// Directory with `reference.csv` and `history.csv`
    #[serde(default = "default_source_dir")]
    source_dir: PathBuf,
    #[serde(default = "default_reference_ttl_days")]
    reference_ttl_days: i64,
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rusty-fxcurve")
}

fn default_cache_dir() -> PathBuf {
    app_dir().join("cache")
}

fn default_curves_file() -> PathBuf {
    app_dir().join("curves.toml")
}

fn default_source_dir() -> PathBuf {
    app_dir().join("data")
}

fn default_reference_ttl_days() -> i64 {
    DEFAULT_REFERENCE_TTL_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            curves_file: default_curves_file(),
            source_dir: default_source_dir(),
            reference_ttl_days: default_reference_ttl_days(),
        }
    }
}

impl Config {
    fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_config = app_dir().join("config.toml");
                if !default_config.exists() {
                    return Ok(Config::default());
                }
                default_config
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            db_path: self.cache_dir.join("market_data.sqlite"),
            reference_ttl_days: self.reference_ttl_days,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = Config::load(cli.config.as_deref()).and_then(|config| {
        fs::create_dir_all(&config.cache_dir).with_context(|| {
            format!("Failed to create cache dir {}", config.cache_dir.display())
        })?;
        match cli.command {
            Commands::Build {
                pair,
                all,
                start,
                end,
                periodicity,
                format,
                output,
            } => build_curves(
                &config,
                BuildArgs {
                    pair,
                    all,
                    start,
                    end,
                    periodicity,
                    format,
                    output,
                },
            ),
            Commands::Pairs => list_pairs(&config),
            Commands::Coverage => show_coverage(&config),
            Commands::Info => show_info(&config),
        }
    });

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

struct BuildArgs {
    pair: Option<String>,
    all: bool,
    start: String,
    end: String,
    periodicity: String,
    format: OutputFormat,
    output: Option<PathBuf>,
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

fn load_curves(config: &Config) -> anyhow::Result<CurveConfig> {
    CurveConfig::from_file(&config.curves_file)
        .with_context(|| format!("Failed to load curves from {}", config.curves_file.display()))
}

fn build_curves(config: &Config, args: BuildArgs) -> anyhow::Result<()> {
    let start = parse_date(&args.start)?;
    let end = parse_date(&args.end)?;
    let periodicity: Periodicity = args.periodicity.parse()?;
    let curves = load_curves(config)?;

    let pairs: Vec<CurrencyPair> = if args.all {
        curves.pairs().copied().collect()
    } else {
        match args.pair.as_deref() {
            Some(pair) => vec![pair.parse()?],
            None => bail!("Specify a currency pair or --all"),
        }
    };
    if pairs.is_empty() {
        bail!("No currency pairs configured in {}", config.curves_file.display());
    }

    let source = InMemorySource::from_csv_dir(&config.source_dir)
        .with_context(|| format!("Failed to load source data from {}", config.source_dir.display()))?;
    let source = Arc::new(source);
    let mut builder = CurveBuilder::open(source.clone(), &config.cache_settings())?;

    let progress = ProgressBar::new(pairs.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut built = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        progress.set_message(pair.to_string());
        let curve = builder
            .build(&curves, pair, start, end, periodicity)
            .with_context(|| format!("Failed to build {} curve", pair))?;
        built.push(curve);
        progress.inc(1);
    }
    progress.finish_and_clear();

    for curve in &built {
        for warning in curve.warnings() {
            eprintln!("{} {}", "Warning:".yellow(), warning);
        }
    }

    match &args.output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_curves(&built, args.format, file)?;
            eprintln!(
                "{} {} curve(s) written to {}",
                "✓".green(),
                built.len(),
                path.display()
            );
        }
        None => write_curves(&built, args.format, io::stdout().lock())?,
    }

    eprintln!(
        "{} {} remote call(s) issued",
        "Source:".cyan(),
        source.total_calls()
    );
    Ok(())
}

fn write_curves<W: Write>(curves: &[ForwardCurve], format: OutputFormat, mut out: W) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, curves)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            for curve in curves {
                if curves.len() > 1 {
                    writeln!(out, "# {} ({})", curve.pair(), curve.direction())?;
                }
                curve.write_csv(&mut out)?;
            }
        }
    }
    Ok(())
}

fn list_pairs(config: &Config) -> anyhow::Result<()> {
    let curves = load_curves(config)?;
    println!("{}", "Configured pairs:".bold());
    for pair in curves.pairs() {
        let spec = curves.get(pair)?;
        let tenors: Vec<String> = spec.tenors().map(|t| t.to_string()).collect();
        println!(
            "  {} {:<8} spot={} tenors=[{}]",
            pair.to_string().cyan(),
            spec.direction.to_string(),
            spec.spot,
            tenors.join(", ")
        );
    }
    Ok(())
}

fn show_coverage(config: &Config) -> anyhow::Result<()> {
    let store = HistoryStore::open(&config.cache_settings().db_path)?;
    let keys = store.coverage_all()?;
    if keys.is_empty() {
        println!("{}", "History cache is empty".dimmed());
        return Ok(());
    }

    println!("{}", "Cached history:".bold());
    for (key, start, end) in keys {
        println!("  {:<40} {} .. {}", key.to_string(), start, end);
    }
    println!(
        "{} observation(s) total",
        store.observation_count()?.to_string().green()
    );
    Ok(())
}

fn show_info(config: &Config) -> anyhow::Result<()> {
    println!(
        "{} v{}",
        "rusty-fxcurve".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("Cache database: {}", config.cache_settings().db_path.display());
    println!("Curves file:    {}", config.curves_file.display());
    println!("Source data:    {}", config.source_dir.display());
    println!("Reference TTL:  {} days", config.reference_ttl_days);
    Ok(())
}
