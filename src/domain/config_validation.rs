//! Configuration loading and validation.
//!
//! Reads every section through a [`ConfigPort`] into a typed
//! [`AnalysisConfig`], then rejects contradictory parameters before any
//! computation starts.

use crate::domain::arbitration::{Arbiter, ThresholdCross};
use crate::domain::error::ArbiterError;
use crate::domain::indicator::combined::{CombinedPreset, PRESET_NAME, RegimeSwitch};
use crate::domain::indicator::{
    ActiveMethod, BollingerParams, CrashParams, ForecastParams, MaCrossoverParams, MaKind,
    MacdParams, Method, RsiParams, RsiSmoothing, VoteMode,
};
use crate::domain::ohlcv::PriceColumn;
use crate::domain::simulation::{Fill, OperationCost, SimulationConfig};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub symbol: Option<String>,
    /// Latest bars kept for analysis; `None` keeps the whole window.
    pub analysis_length: Option<usize>,
    pub prediction_length: usize,
    pub price_column: PriceColumn,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub holidays: Vec<NaiveDate>,
    pub simulation: SimulationConfig,
    pub arbiter: Arbiter,
    /// Replaces the weighted vote of the combined members when set.
    pub regime_switch: Option<RegimeSwitch>,
    pub methods: Vec<ActiveMethod>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbol: None,
            analysis_length: None,
            prediction_length: 0,
            price_column: PriceColumn::default(),
            start_date: None,
            end_date: None,
            holidays: Vec::new(),
            simulation: SimulationConfig::default(),
            arbiter: Arbiter::default(),
            regime_switch: None,
            methods: CombinedPreset::default().members,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if self.analysis_length == Some(0) {
            return Err(ArbiterError::configuration(
                "analysis_length",
                "analysis_length must be positive",
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ArbiterError::configuration(
                    "start_date",
                    format!("start_date {start} is after end_date {end}"),
                ));
            }
        }
        self.simulation.validate()?;
        self.arbiter.validate()?;
        if let Some(switch) = &self.regime_switch {
            switch.validate()?;
        }

        if self.methods.is_empty() {
            return Err(ArbiterError::configuration(
                "methods",
                "at least one method must be active",
            ));
        }
        for method in &self.methods {
            method.validate()?;
        }
        if self.uses_forecast() && self.prediction_length == 0 {
            return Err(ArbiterError::configuration(
                "prediction_length",
                "the forecast method needs a positive prediction_length",
            ));
        }
        Ok(())
    }

    pub fn uses_forecast(&self) -> bool {
        self.methods
            .iter()
            .any(|m| matches!(m.method, Method::Forecast(_)))
    }
}

/// Read and validate the full analysis configuration.
pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, ArbiterError> {
    let analysis = AnalysisConfig {
        symbol: non_empty(config, "analysis", "symbol"),
        analysis_length: match get_usize(config, "analysis", "analysis_length", 0)? {
            0 if config.get_string("analysis", "analysis_length").is_none() => None,
            n => Some(n),
        },
        prediction_length: get_usize(config, "analysis", "prediction_length", 0)?,
        price_column: parse_choice(
            config,
            "analysis",
            "price_column",
            PriceColumn::parse,
            PriceColumn::default(),
        )?,
        start_date: parse_date(config, "analysis", "start_date")?,
        end_date: parse_date(config, "analysis", "end_date")?,
        holidays: parse_date_list(config, "analysis", "holidays")?,
        simulation: build_simulation_config(config)?,
        arbiter: Arbiter {
            dead_zone: config.get_double("arbitration", "dead_zone", Arbiter::default().dead_zone)?,
        },
        regime_switch: match config.get_string(PRESET_NAME, "regime_ratio") {
            Some(_) => Some(RegimeSwitch {
                threshold: config.get_double(PRESET_NAME, "regime_ratio", 0.0)?,
            }),
            None => None,
        },
        methods: build_methods(config)?,
    };
    analysis.validate()?;
    Ok(analysis)
}

fn build_simulation_config(config: &dyn ConfigPort) -> Result<SimulationConfig, ArbiterError> {
    let defaults = SimulationConfig::default();
    let cost = config.get_double("simulation", "operation_cost", 0.0)?;
    let operation_cost = match config
        .get_string("simulation", "operation_cost_kind")
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        None | Some("fixed") => OperationCost::Fixed(cost),
        Some("percentage") => OperationCost::Percentage(cost),
        Some(other) => {
            return Err(invalid(
                "simulation",
                "operation_cost_kind",
                format!("expected fixed or percentage, got '{other}'"),
            ));
        }
    };

    Ok(SimulationConfig {
        initial_value: config.get_double("simulation", "initial_value", defaults.initial_value)?,
        stop_loss: config.get_double("simulation", "stop_loss", defaults.stop_loss)?,
        stop_gain: config.get_double("simulation", "stop_gain", defaults.stop_gain)?,
        operation_cost,
        tax_percentage: config.get_double("simulation", "tax_percentage", 0.0)?,
        fill: parse_choice(config, "simulation", "fill", Fill::parse, Fill::default())?,
    })
}

fn build_methods(config: &dyn ConfigPort) -> Result<Vec<ActiveMethod>, ArbiterError> {
    let Some(list) = config.get_string("arbitration", "methods") else {
        return Ok(build_combined(config)?.members);
    };

    let mut methods = Vec::new();
    for key in list.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if key == PRESET_NAME {
            methods.extend(build_combined(config)?.members);
            continue;
        }
        let method = build_method(config, key)?;
        let weight = config.get_double(key, "weight", 1.0)?;
        let vote = parse_choice(config, key, "vote", VoteMode::parse, VoteMode::default())?;
        methods.push(ActiveMethod::new(method).weighted(weight).voting(vote));
    }
    Ok(methods)
}

fn build_combined(config: &dyn ConfigPort) -> Result<CombinedPreset, ArbiterError> {
    let mut preset = CombinedPreset::weighted(
        config.get_double(PRESET_NAME, "macd_weight", 1.0)?,
        config.get_double(PRESET_NAME, "rsi_weight", 1.0)?,
        config.get_double(PRESET_NAME, "bollinger_weight", 1.0)?,
    )
    .with_params(build_method(config, "macd")?)
    .with_params(build_method(config, "rsi")?)
    .with_params(build_method(config, "bollinger")?);

    for key in ["macd", "rsi", "bollinger"] {
        let vote = parse_choice(config, key, "vote", VoteMode::parse, VoteMode::default())?;
        preset = preset.voting(key, vote);
    }
    Ok(preset)
}

fn build_method(config: &dyn ConfigPort, key: &str) -> Result<Method, ArbiterError> {
    let method = match key {
        "bollinger" => {
            let d = BollingerParams::default();
            Method::Bollinger(BollingerParams {
                period: get_usize(config, key, "period", d.period)?,
                multiplier: config.get_double(key, "multiplier", d.multiplier)?,
            })
        }
        "ma_crossover" => {
            let d = MaCrossoverParams::default();
            Method::MaCrossover(MaCrossoverParams {
                fast: get_usize(config, key, "fast", d.fast)?,
                slow: get_usize(config, key, "slow", d.slow)?,
                kind: parse_choice(config, key, "kind", MaKind::parse, d.kind)?,
            })
        }
        "macd" => {
            let d = MacdParams::default();
            let histogram_band = match config.get_string(key, "histogram_upper") {
                Some(_) => Some(ThresholdCross::normalized(
                    config.get_double(key, "histogram_upper", 0.5)?,
                    config.get_double(key, "histogram_lower", 0.5)?,
                    config.get_double(key, "histogram_release", 0.1)?,
                )),
                None => None,
            };
            Method::Macd(MacdParams {
                fast: get_usize(config, key, "fast", d.fast)?,
                slow: get_usize(config, key, "slow", d.slow)?,
                signal: get_usize(config, key, "signal", d.signal)?,
                histogram_band,
            })
        }
        "rsi" => {
            let d = RsiParams::default();
            let upper = config.get_double(key, "upper", d.thresholds.upper)?;
            let lower = config.get_double(key, "lower", d.thresholds.lower)?;
            let band = config.get_double(
                key,
                "hysteresis",
                d.thresholds.upper - d.thresholds.release_upper,
            )?;
            Method::Rsi(RsiParams {
                period: get_usize(config, key, "period", d.period)?,
                smoothing: parse_choice(config, key, "smoothing", RsiSmoothing::parse, d.smoothing)?,
                thresholds: ThresholdCross::with_hysteresis(upper, lower, band),
            })
        }
        "forecast" => Method::Forecast(ForecastParams {
            margin: config.get_double(key, "margin", ForecastParams::default().margin)?,
        }),
        "crash" => Method::Crash(CrashParams {
            drop: config.get_double(key, "drop", CrashParams::default().drop)?,
        }),
        other => {
            return Err(invalid(
                "arbitration",
                "methods",
                format!("unknown method '{other}'"),
            ));
        }
    };
    Ok(method)
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ArbiterError {
    ArbiterError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn get_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ArbiterError> {
    let value = config.get_int(section, key, default as i64)?;
    usize::try_from(value).map_err(|_| invalid(section, key, format!("{key} must be non-negative")))
}

fn parse_choice<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
    default: T,
) -> Result<T, ArbiterError> {
    match non_empty(config, section, key) {
        None => Ok(default),
        Some(raw) => {
            parse(&raw).ok_or_else(|| invalid(section, key, format!("unrecognised value '{raw}'")))
        }
    }
}

fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, ArbiterError> {
    non_empty(config, section, key)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                invalid(section, key, format!("invalid {key} format, expected YYYY-MM-DD"))
            })
        })
        .transpose()
}

fn parse_date_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<NaiveDate>, ArbiterError> {
    let Some(raw) = non_empty(config, section, key) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| invalid(section, key, format!("invalid date '{s}' in {key}")))
        })
        .collect()
}
