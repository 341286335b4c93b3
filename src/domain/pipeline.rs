//! End-to-end analysis of one symbol.
//!
//! prepare window -> compute methods -> arbitrate -> simulate -> summarise.
//! A method that cannot be computed on the window (too little history, a
//! forecast of the wrong length) is dropped from the ballot and reported as
//! a [`MethodWarning`]; every other error aborts the run.

use tracing::{debug, info, warn};

use super::config_validation::AnalysisConfig;
use super::error::ArbiterError;
use super::indicator::{MethodInput, MethodOutput};
use super::ohlcv::OhlcDataset;
use super::preprocessing::{TradingCalendar, bound_window, extend_horizon, truncate_range};
use super::recommendation::Signal;
use super::simulation::{SimulationResult, simulate};
use super::summary::{Summary, up_down_ratio};

#[derive(Debug, Clone, PartialEq)]
pub struct MethodWarning {
    pub method: String,
    pub reason: String,
}

/// One method's output replayed on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodResult {
    pub name: String,
    pub weight: f64,
    pub output: MethodOutput,
    pub simulation: SimulationResult,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub symbol: String,
    /// The bounded window the analysis ran on.
    pub dataset: OhlcDataset,
    pub decision: Signal,
    pub events: Signal,
    pub method_results: Vec<MethodResult>,
    pub simulation: SimulationResult,
    pub summary: Summary,
    pub warnings: Vec<MethodWarning>,
}

/// Bound, truncate and extend the raw dataset to the configured window.
pub fn prepare(dataset: &OhlcDataset, config: &AnalysisConfig) -> Result<OhlcDataset, ArbiterError> {
    let mut window = bound_window(dataset, config.start_date, config.end_date)?;
    if let Some(length) = config.analysis_length {
        window = truncate_range(&window, length);
    }
    if window.is_empty() {
        return Err(ArbiterError::NoData {
            symbol: dataset.symbol.clone(),
        });
    }
    if config.prediction_length > 0 {
        let calendar = TradingCalendar::new(config.holidays.iter().copied());
        window = extend_horizon(&window, config.prediction_length, &calendar)?;
    }
    Ok(window)
}

pub fn run_analysis(
    dataset: &OhlcDataset,
    config: &AnalysisConfig,
    forecast: Option<&[f64]>,
) -> Result<AnalysisReport, ArbiterError> {
    config.validate()?;
    if config.uses_forecast() && forecast.is_none() {
        return Err(ArbiterError::configuration(
            "forecast",
            "the forecast method is active but no forecast sequence was supplied",
        ));
    }

    let window = prepare(dataset, config)?;
    info!(
        symbol = %window.symbol,
        bars = window.len(),
        horizon = window.horizon.len(),
        methods = config.methods.len(),
        "running analysis"
    );

    let input = MethodInput::new(&window, config.price_column).with_forecast(forecast);
    let mut computed = Vec::new();
    let mut warnings = Vec::new();
    for active in &config.methods {
        match active.method.compute(&input) {
            Ok(output) => {
                debug!(symbol = %window.symbol, method = %active.method, "method computed");
                computed.push((active, output));
            }
            Err(e) if e.is_method_local() => {
                warn!(symbol = %window.symbol, method = %active.method, error = %e, "method excluded");
                warnings.push(MethodWarning {
                    method: active.method.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let ratio = up_down_ratio(&window, config.price_column);
    if let Some(switch) = &config.regime_switch {
        info!(
            symbol = %window.symbol,
            ratio_up_down = ?ratio,
            selected = switch.selected(ratio),
            "combined regime"
        );
    }
    let ballots: Vec<_> = computed
        .iter()
        .filter(|(active, _)| {
            config
                .regime_switch
                .is_none_or(|switch| switch.votes(active.method.key(), ratio))
        })
        .map(|(active, output)| active.ballot(output))
        .collect();
    let decision = config.arbiter.arbitrate(&window.dates(), &ballots);
    let events = decision.events();

    let simulation = simulate(&window, config.price_column, &decision, &config.simulation)?;
    let summary = Summary::compute(
        &window,
        config.price_column,
        &decision,
        &simulation,
        config.simulation.initial_value,
    );

    let mut method_results = Vec::with_capacity(computed.len());
    for (active, output) in computed {
        let result = simulate(
            &window,
            config.price_column,
            &output.recommendation,
            &config.simulation,
        )?;
        let method_summary = Summary::compute(
            &window,
            config.price_column,
            &output.recommendation,
            &result,
            config.simulation.initial_value,
        );
        method_results.push(MethodResult {
            name: active.method.to_string(),
            weight: active.weight,
            output,
            simulation: result,
            summary: method_summary,
        });
    }

    info!(
        symbol = %window.symbol,
        trades = summary.trade_count,
        net_return = summary.net_return,
        warnings = warnings.len(),
        "analysis complete"
    );

    Ok(AnalysisReport {
        symbol: window.symbol.clone(),
        dataset: window,
        decision,
        events,
        method_results,
        simulation,
        summary,
        warnings,
    })
}

/// Independent runs over several symbols, in input order.
pub fn run_many<'a>(
    inputs: impl IntoIterator<Item = (&'a OhlcDataset, Option<&'a [f64]>)>,
    config: &AnalysisConfig,
) -> Vec<Result<AnalysisReport, ArbiterError>> {
    inputs
        .into_iter()
        .map(|(dataset, forecast)| run_analysis(dataset, config, forecast))
        .collect()
}
