//! Folio CLI - Command line interface for portfolio backtests.
//!
//! Prints JSON responses on stdout (or a label table with `--table`); logs go
//! to stderr (`RUST_LOG` to adjust).

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use folio_core::portfolio::{
    apply_contributions, build_portfolio, compute_metrics_with_rate, compute_ticker_metrics,
    latest_common_start, ticker_values,
};
use folio_core::{
    ApiResponse, CsvPriceProvider, EngineConfig, Error, Frequency, MetricsReport,
    PortfolioReport, PortfolioWeights, PriceSeries, Result, TickerChart, TickerMetrics,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio CLI - portfolio backtests with periodic contributions")]
#[command(version)]
struct Cli {
    /// Config file (defaults to FOLIO_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of <SYMBOL>.csv price files (overrides config and FOLIO_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print labelled statistics instead of JSON
    #[arg(long, global = true)]
    table: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a weighted portfolio with periodic contributions
    Portfolio {
        /// Weights as SYMBOL=WEIGHT pairs (comma-separated), e.g. AAPL=0.6,MSFT=0.4
        #[arg(short, long)]
        weights: String,
        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,
        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,
        /// Starting balance
        #[arg(short, long, default_value = "10000")]
        initial: f64,
        /// Amount added each period
        #[arg(short, long, default_value = "0")]
        addition: f64,
        /// Contribution frequency: weekly, monthly or yearly
        #[arg(short, long, default_value = "monthly")]
        frequency: String,
        /// Annual risk-free rate (overrides config)
        #[arg(long)]
        risk_free_rate: Option<f64>,
    },
    /// Normalized series and statistics for individual symbols
    Tickers {
        /// Symbols (comma-separated)
        #[arg(short = 'y', long)]
        symbols: String,
        /// Start date (YYYY-MM-DD); moved forward to the first date all symbols share
        #[arg(short, long)]
        start: String,
        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,
        /// Annual risk-free rate (overrides config)
        #[arg(long)]
        risk_free_rate: Option<f64>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match run(cli) {
        Ok(out) => out,
        Err(e) => {
            tracing::error!("{}", e);
            render(&ApiResponse::<()>::err(e.to_string()))
        }
    };

    println!("{}", output);
}

fn run(cli: Cli) -> Result<String> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load()?,
    }
    .with_data_dir(cli.data_dir);

    let provider = CsvPriceProvider::new(&config.data_dir);
    if !config.preload.is_empty() {
        provider.preload(&config.preload);
    }

    match cli.command {
        Commands::Portfolio {
            weights,
            start,
            end,
            initial,
            addition,
            frequency,
            risk_free_rate,
        } => {
            let weights = parse_weights(&weights)?;
            let frequency: Frequency = frequency.parse()?;
            let (start, end) = (parse_date(&start)?, parse_date(&end)?);
            let rate = risk_free_rate.unwrap_or(config.risk_free_rate);

            tracing::info!(symbols = weights.len(), %start, %end, %frequency, "running portfolio");

            let index = build_portfolio(&provider, &weights, start, end)?;
            let trajectory = apply_contributions(&index, initial, addition, frequency);
            let metrics = compute_metrics_with_rate(&index, &trajectory, rate)?;

            if cli.table {
                return Ok(metrics_table(&metrics));
            }
            Ok(render(&ApiResponse::ok(PortfolioReport::new(
                &index,
                &trajectory,
                &metrics,
            ))))
        }
        Commands::Tickers {
            symbols,
            start,
            end,
            risk_free_rate,
        } => {
            let symbols = parse_symbols(&symbols);
            let (start, end) = (parse_date(&start)?, parse_date(&end)?);
            let rate = risk_free_rate.unwrap_or(config.risk_free_rate);

            let histories = symbols
                .iter()
                .map(|symbol| provider.history(symbol).map(|h| PriceSeries::clone(&h)))
                .collect::<Result<Vec<_>>>()?;
            let start = start.max(latest_common_start(&histories)?);

            tracing::info!(symbols = symbols.len(), %start, %end, "running ticker stats");

            let normalized = ticker_values(&provider, &symbols, start, end)?;
            let ticker_vals: BTreeMap<String, Vec<f64>> = normalized
                .into_iter()
                .map(|(symbol, series)| (symbol, series.values()))
                .collect();
            let stats = compute_ticker_metrics(&ticker_vals, start, end, rate)?;

            if cli.table {
                return Ok(ticker_table(&stats));
            }
            let chart = TickerChart {
                ticker_stats: stats
                    .into_iter()
                    .map(|(symbol, m)| (symbol, m.to_array().to_vec()))
                    .collect(),
                ticker_vals,
            };
            Ok(render(&ApiResponse::ok(chart)))
        }
    }
}

fn render<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response)
        .unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"serialization failed: {}\"}}", e))
}

fn metrics_table(metrics: &MetricsReport) -> String {
    MetricsReport::LABELS
        .iter()
        .zip(metrics.to_array())
        .map(|(label, value)| format!("{:<22}{:>14}", label, value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn ticker_table(stats: &BTreeMap<String, TickerMetrics>) -> String {
    let mut out = format!("{:<22}", "");
    for symbol in stats.keys() {
        let _ = write!(out, "{:>12}", symbol);
    }
    for (row, label) in TickerMetrics::LABELS.iter().enumerate() {
        let _ = write!(out, "\n{:<22}", label);
        for metrics in stats.values() {
            let _ = write!(out, "{:>12}", metrics.to_array()[row]);
        }
    }
    out
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidDate(format!("'{}': {}", raw, e)))
}

fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_weights(raw: &str) -> Result<PortfolioWeights> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (symbol, weight) = pair.split_once('=').ok_or_else(|| {
                Error::NoValidTickers(format!("expected SYMBOL=WEIGHT, got '{}'", pair))
            })?;
            let weight: f64 = weight.trim().parse().map_err(|_| {
                Error::NoValidTickers(format!("invalid weight for {}: '{}'", symbol, weight))
            })?;
            Ok((symbol.trim().to_uppercase(), weight))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weights() {
        let weights = parse_weights(" aapl=0.6, MSFT = 0.4 ,").unwrap();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights["AAPL"], 0.6);
        assert_eq!(weights["MSFT"], 0.4);
    }

    #[test]
    fn test_parse_weights_malformed() {
        assert!(matches!(
            parse_weights("AAPL=0.5,MSFT"),
            Err(Error::NoValidTickers(_))
        ));
        assert!(matches!(
            parse_weights("AAPL=half"),
            Err(Error::NoValidTickers(_))
        ));
    }

    #[test]
    fn test_parse_symbols_and_dates() {
        assert_eq!(parse_symbols("spy, ,qqq"), vec!["SPY", "QQQ"]);
        assert_eq!(
            parse_date(" 2024-02-29 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(matches!(parse_date("2024-02-30"), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_ticker_table_uses_labels() {
        let mut stats = BTreeMap::new();
        stats.insert(
            "SPY".to_string(),
            TickerMetrics {
                cagr: 0.1,
                annualized_volatility: 0.2,
                best_year: 0.3,
                worst_year: -0.1,
                max_drawdown: -0.25,
                sharpe_ratio: 0.4,
                sortino_ratio: f64::NAN,
            },
        );
        let table = ticker_table(&stats);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 1 + TickerMetrics::LABELS.len());
        assert!(lines[0].trim_end().ends_with("SPY"));
        assert!(lines[1].starts_with("CAGR"));
        assert!(lines[7].starts_with("Sortino Ratio") && lines[7].ends_with("NaN"));
    }
}
