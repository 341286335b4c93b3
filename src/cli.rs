//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::{CsvAdapter, read_forecast_file, read_ohlcv_file};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{AnalysisConfig, build_analysis_config};
use crate::domain::error::ArbiterError;
use crate::domain::pipeline::{AnalysisReport, run_analysis};
use crate::domain::recommendation::Recommendation;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "signalarb", about = "Indicator arbitration and performance simulation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the analysis pipeline
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// OHLC CSV file, or a directory of <SYMBOL>.csv files
        #[arg(short, long)]
        data: PathBuf,
        /// Forecast CSV aligned to the prediction horizon
        #[arg(short, long)]
        forecast: Option<PathBuf>,
        /// Overrides [analysis] symbol
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the symbols in a data directory
    ListSymbols {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            data,
            forecast,
            symbol,
        } => run_analyze(&config, &data, forecast.as_deref(), symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data } => run_list_symbols(&data),
    }
}

pub fn load_config(path: &Path) -> Result<AnalysisConfig, ArbiterError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    build_analysis_config(&adapter)
}

/// Symbols named on the command line or in the config, upper-cased.
pub fn resolve_symbols(symbol_override: Option<&str>, config: &AnalysisConfig) -> Vec<String> {
    symbol_override
        .or(config.symbol.as_deref())
        .map(|list| {
            list.split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Load inputs and run the pipeline for every requested symbol.
pub fn analyze(
    config_path: &Path,
    data_path: &Path,
    forecast_path: Option<&Path>,
    symbol_override: Option<&str>,
) -> Result<Vec<Result<AnalysisReport, ArbiterError>>, ArbiterError> {
    let config = load_config(config_path)?;
    let symbols = resolve_symbols(symbol_override, &config);

    if data_path.is_dir() {
        if forecast_path.is_some() {
            return Err(ArbiterError::configuration(
                "forecast",
                "a forecast file applies to a single data file, not a directory",
            ));
        }
        let adapter = CsvAdapter::new(data_path.to_path_buf());
        let symbols = if symbols.is_empty() {
            adapter.list_symbols()?
        } else {
            symbols
        };
        return Ok(symbols
            .iter()
            .map(|s| {
                adapter
                    .fetch_ohlcv(s, config.start_date, config.end_date)
                    .and_then(|dataset| run_analysis(&dataset, &config, None))
            })
            .collect());
    }

    let symbol = match symbols.first() {
        Some(s) => s.clone(),
        None => data_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_uppercase())
            .unwrap_or_default(),
    };
    let dataset = read_ohlcv_file(data_path, &symbol)?;
    let forecast = forecast_path.map(read_forecast_file).transpose()?;
    Ok(vec![run_analysis(&dataset, &config, forecast.as_deref())])
}

/// Tab-separated report lines.
pub fn format_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let s = &report.summary;
    let opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"));
    let rec = |r: Option<Recommendation>| {
        r.map_or_else(|| "-".to_string(), |r| r.to_string())
    };

    let _ = writeln!(out, "symbol\t{}", report.symbol);
    let _ = writeln!(out, "bars\t{}", report.dataset.len());
    if let (Some(first), Some(last)) = (report.dataset.bars.first(), report.dataset.bars.last()) {
        let _ = writeln!(out, "window\t{}\t{}", first.date, last.date);
    }
    let last_decision = report
        .decision
        .values
        .iter()
        .rposition(Option::is_some)
        .map(|i| (report.decision.dates[i], report.decision.values[i]));
    match last_decision {
        Some((date, value)) => {
            let _ = writeln!(out, "decision\t{}\t{}", date, rec(value));
        }
        None => {
            let _ = writeln!(out, "decision\t-\t-");
        }
    }
    let _ = writeln!(out, "last_event\t{}", rec(s.last_event));
    let _ = writeln!(out, "previous_event\t{}", rec(s.previous_event));
    let _ = writeln!(
        out,
        "final_value\t{:.2}",
        report
            .simulation
            .performance
            .final_value()
            .unwrap_or_default()
    );
    let _ = writeln!(out, "net_return\t{:.6}", s.net_return);
    let _ = writeln!(out, "reference_return\t{:.6}", s.reference_return);
    let _ = writeln!(out, "relative_gain_comparison\t{}", opt(s.relative_gain_comparison));
    let _ = writeln!(out, "trades\t{}\t{}\t{}", s.trade_count, s.wins, s.losses);
    let _ = writeln!(out, "win_rate\t{:.4}", s.win_rate);
    let _ = writeln!(out, "max_drawdown\t{:.6}", s.max_drawdown);
    let _ = writeln!(out, "up_down_ratio\t{}", opt(s.ratio_up_down));
    let _ = writeln!(out, "average_volume\t{:.0}", s.average_volume);

    for m in &report.method_results {
        let _ = writeln!(
            out,
            "method\t{}\t{}\t{}\t{:.6}\t{}",
            m.name,
            m.weight,
            rec(m.output.recommendation.last_defined()),
            m.summary.net_return,
            m.summary.trade_count
        );
    }
    for w in &report.warnings {
        let _ = writeln!(out, "warning\t{}\t{}", w.method, w.reason);
    }
    out
}

fn run_analyze(
    config_path: &Path,
    data_path: &Path,
    forecast_path: Option<&Path>,
    symbol_override: Option<&str>,
) -> ExitCode {
    let results = match analyze(config_path, data_path, forecast_path, symbol_override) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "analysis aborted");
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut exit = ExitCode::SUCCESS;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(report) => {
                if i > 0 {
                    println!();
                }
                print!("{}", format_report(report));
            }
            Err(e) => {
                eprintln!("error: {e}");
                exit = e.into();
            }
        }
    }
    exit
}

fn run_validate(config_path: &Path) -> ExitCode {
    match load_config(config_path) {
        Ok(config) => {
            println!("config\tok");
            for m in &config.methods {
                println!("method\t{}\t{}", m.method, m.weight);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_symbols(data_path: &Path) -> ExitCode {
    match CsvAdapter::new(data_path.to_path_buf()).list_symbols() {
        Ok(symbols) => {
            for s in symbols {
                println!("{s}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
