//! Hobart CLI - portfolio backtesting from the command line

mod cache_manager;
mod progress;

use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use hobart::{DefaultUniverse, GicsSector, Universe, sample_weights};
use hobart_backtest::{
    Allocation, BacktestConfig, BacktestRequest, BacktestResult, Backtester, PortfolioAllocation, parse_date,
};
use hobart_data::{CachedQuoteSource, FetchConfig, RetryingQuoteSource, YahooQuoteProvider};
use hobart_output::{ExportFormat, Exporter, RunSummary, metrics_rows, render_markdown, render_text};
use progress::ProgressQuoteSource;
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default lookback when no start date is given.
const DEFAULT_LOOKBACK_DAYS: i64 = 730;

#[derive(Debug, Parser)]
#[command(name = "hobart")]
#[command(about = "Backtest equity portfolios against historical prices", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a backtest
    Backtest {
        /// Tickers for an equal-weight portfolio
        tickers: Vec<String>,

        /// Portfolio weights file (JSON or TOML)
        #[arg(short, long, conflicts_with_all = ["tickers", "sample"])]
        weights: Option<PathBuf>,

        /// Use the built-in sample portfolio
        #[arg(long, conflicts_with = "tickers")]
        sample: bool,

        /// First date, inclusive (YYYY-MM-DD). Defaults to two years ago
        #[arg(short, long)]
        start: Option<String>,

        /// Last date, exclusive (YYYY-MM-DD). Defaults to tomorrow
        #[arg(short, long)]
        end: Option<String>,

        /// Benchmark ticker
        #[arg(short, long)]
        benchmark: Option<String>,

        /// Skip the benchmark comparison
        #[arg(long, conflicts_with = "benchmark")]
        no_benchmark: bool,

        /// Starting capital
        #[arg(long)]
        capital: Option<f64>,

        /// Engine configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Parallel quote requests
        #[arg(long)]
        concurrency: Option<usize>,

        /// Fail when any ticker has no data
        #[arg(long)]
        strict: bool,

        /// Report format on stdout
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,

        /// Also write the result to a file (.json or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the per-ticker metrics table to a file (.csv or .json)
        #[arg(long)]
        metrics_output: Option<PathBuf>,

        /// Bypass the quote cache
        #[arg(long)]
        no_cache: bool,

        /// Ignore cached quotes but store fresh ones
        #[arg(long, conflicts_with = "no_cache")]
        refresh: bool,

        /// Cache database path
        #[arg(long)]
        cache_path: Option<PathBuf>,
    },
    /// Show the built-in stock universe
    Universe {
        /// Only list one sector (name, alias or GICS code)
        #[arg(long)]
        sector: Option<String>,

        /// List sector names and codes
        #[arg(long)]
        list_sectors: bool,
    },
    /// Inspect or clear the quote cache
    Cache {
        /// Show cache statistics (the default when nothing else is asked)
        #[arg(long)]
        stats: bool,

        /// Delete cached quotes
        #[arg(long)]
        clear: bool,

        /// Restrict --clear to one symbol
        #[arg(long, requires = "clear")]
        symbol: Option<String>,

        /// Cache database path
        #[arg(long)]
        cache_path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Markdown,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Backtest {
            tickers,
            weights,
            sample,
            start,
            end,
            benchmark,
            no_benchmark,
            capital,
            config,
            concurrency,
            strict,
            format,
            output,
            metrics_output,
            no_cache,
            refresh,
            cache_path,
        } => {
            let mut engine_config = match config {
                Some(path) => BacktestConfig::from_file(&path)?,
                None => BacktestConfig::default(),
            };
            if let Some(capital) = capital {
                engine_config = engine_config.with_initial_capital(capital);
            }
            if no_benchmark {
                engine_config = engine_config.with_benchmark(None);
            } else if benchmark.is_some() {
                engine_config = engine_config.with_benchmark(benchmark);
            }
            if let Some(concurrency) = concurrency {
                engine_config.concurrency = concurrency;
            }
            engine_config.require_full_coverage |= strict;
            engine_config.validate()?;

            let (start, end) = resolve_window(start.as_deref(), end.as_deref())?;
            let request = if let Some(path) = weights {
                let allocation = PortfolioAllocation::from_file(&path)?;
                BacktestRequest::weighted(allocation.weights()?, start, end)
            } else if sample || tickers.is_empty() {
                info!("using the sample portfolio");
                BacktestRequest::weighted(sample_weights()?, start, end)
            } else {
                BacktestRequest::equal_weight(&tickers, start, end)
            };

            let fetch = FetchConfig {
                use_cache: !no_cache,
                force_refresh: refresh,
            };
            let result = run_backtest(&request, engine_config, fetch, cache_path, format).await?;

            match format {
                ReportFormat::Text => {
                    print!("{}", render_text(&result));
                    println!();
                    println!("{}", RunSummary::from_result(&result));
                }
                ReportFormat::Markdown => print!("{}", render_markdown(&result)),
                ReportFormat::Json => println!("{}", result.to_json()?),
            }

            if let Some(path) = output {
                let export_format = ExportFormat::from_path(&path)?;
                result.export_to_file(&path, export_format)?;
                eprintln!("Results saved to {}", path.display());
            }

            if let Some(path) = metrics_output {
                let export_format = ExportFormat::from_path(&path)?;
                metrics_rows(&result).export_to_file(&path, export_format)?;
                eprintln!("Metrics saved to {}", path.display());
            }
        }
        Commands::Universe { sector, list_sectors } => {
            let universe = DefaultUniverse::new();

            if list_sectors {
                println!("GICS sectors:");
                for sector in GicsSector::ALL {
                    println!("  {:>2}  {}", sector.code(), sector);
                }
                return Ok(());
            }

            if let Some(sector) = sector {
                let sector: GicsSector = sector.parse()?;
                let symbols = universe.symbols_in_sector(sector);
                println!("{} ({} stocks):", sector, symbols.len());
                println!("  {}", symbols.join(", "));
                return Ok(());
            }

            println!("Default universe ({} stocks):", universe.size());
            for (sector, symbols) in universe.by_sector() {
                println!("  {:<24} {}", sector.name(), symbols.join(", "));
            }
        }
        Commands::Cache {
            stats,
            clear,
            symbol,
            cache_path,
        } => {
            let path = cache_path.unwrap_or_else(cache_manager::default_cache_path);
            let cache = cache_manager::open_cache(&path)?;

            if clear {
                match symbol {
                    Some(symbol) => {
                        let symbol = symbol.trim().to_uppercase();
                        cache.clear_symbol(&symbol)?;
                        println!("Cleared cached quotes for {}", symbol);
                    }
                    None => {
                        cache.clear_all()?;
                        println!("Cleared all cached quotes");
                    }
                }
            }

            if stats || !clear {
                cache_manager::print_stats(&path, &cache.stats()?);
            }
        }
    }

    Ok(())
}

/// Resolve the `[start, end)` window, filling in defaults relative to today.
fn resolve_window(start: Option<&str>, end: Option<&str>) -> Result<(NaiveDate, NaiveDate), Box<dyn std::error::Error>> {
    let today = Local::now().date_naive();
    let start = match start {
        Some(s) => parse_date(s)?,
        None => today - Duration::days(DEFAULT_LOOKBACK_DAYS),
    };
    let end = match end {
        Some(s) => parse_date(s)?,
        None => today + Duration::days(1),
    };
    Ok((start, end))
}

/// Build the quote source stack and run one request.
async fn run_backtest(
    request: &BacktestRequest,
    config: BacktestConfig,
    fetch: FetchConfig,
    cache_path: Option<PathBuf>,
    format: ReportFormat,
) -> Result<BacktestResult, Box<dyn std::error::Error>> {
    let remote = RetryingQuoteSource::new(YahooQuoteProvider::new()?, config.retry);
    let cached = if fetch.use_cache {
        let path = cache_path.unwrap_or_else(cache_manager::default_cache_path);
        debug!(path = %path.display(), "opening quote cache");
        CachedQuoteSource::new(remote, cache_manager::open_cache(&path)?, fetch)
    } else {
        CachedQuoteSource::uncached(remote)
    };

    let requests = expected_requests(request, config.benchmark.as_deref());
    let source = if format == ReportFormat::Text {
        ProgressQuoteSource::new(cached, requests)
    } else {
        ProgressQuoteSource::hidden(cached)
    };

    let backtester = Backtester::new(source, config);
    let result = backtester.run(request).await;
    backtester.source().finish("Done");

    Ok(result?)
}

/// Number of quote requests a run will make.
fn expected_requests(request: &BacktestRequest, benchmark: Option<&str>) -> usize {
    let symbols = match &request.allocation {
        Allocation::EqualWeight => request.tickers.clone(),
        Allocation::Weighted(weights) => weights.symbols(),
    };
    let extra = benchmark.is_some_and(|b| !symbols.iter().any(|s| s == b));
    symbols.len() + usize::from(extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_backtest_args() {
        let cli = Cli::parse_from([
            "hobart", "backtest", "aapl", "msft", "--start", "2023-01-01", "--no-benchmark", "-f", "json",
        ]);
        match cli.command {
            Commands::Backtest {
                tickers,
                start,
                no_benchmark,
                format,
                ..
            } => {
                assert_eq!(tickers, vec!["aapl", "msft"]);
                assert_eq!(start.as_deref(), Some("2023-01-01"));
                assert!(no_benchmark);
                assert_eq!(format, ReportFormat::Json);
            }
            _ => panic!("expected backtest"),
        }
    }

    #[test]
    fn test_export_paths() {
        let cli = Cli::parse_from(["hobart", "backtest", "AAPL", "-o", "run.json", "--metrics-output", "metrics.csv"]);
        let Commands::Backtest {
            output, metrics_output, ..
        } = cli.command
        else {
            panic!("expected backtest");
        };

        let output = output.unwrap();
        let metrics_output = metrics_output.unwrap();
        assert_eq!(ExportFormat::from_path(&output).unwrap(), ExportFormat::PrettyJson);
        assert_eq!(ExportFormat::from_path(&metrics_output).unwrap(), ExportFormat::Csv);
    }

    #[test]
    fn test_weights_conflict_with_tickers() {
        let parsed = Cli::try_parse_from(["hobart", "backtest", "AAPL", "--weights", "w.json"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_cache_symbol_requires_clear() {
        assert!(Cli::try_parse_from(["hobart", "cache", "--symbol", "AAPL"]).is_err());
        assert!(Cli::try_parse_from(["hobart", "cache", "--clear", "--symbol", "AAPL"]).is_ok());
    }

    #[test]
    fn test_default_window() {
        let (start, end) = resolve_window(None, None).unwrap();
        assert_eq!((end - start).num_days(), DEFAULT_LOOKBACK_DAYS + 1);

        let (start, end) = resolve_window(Some("2024-01-01"), Some("2024-06-30")).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());

        assert!(resolve_window(Some("yesterday"), None).is_err());
    }

    #[test]
    fn test_expected_requests_counts_benchmark_once() {
        let (start, end) = resolve_window(None, None).unwrap();
        let request = BacktestRequest::equal_weight(["AAPL", "SPY"], start, end);

        assert_eq!(expected_requests(&request, Some("SPY")), 2);
        assert_eq!(expected_requests(&request, Some("QQQ")), 3);
        assert_eq!(expected_requests(&request, None), 2);
    }
}
