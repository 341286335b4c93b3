//! Performance simulation.
//!
//! Replays a decision signal against the price series of a dataset with a
//! single long-only position:
//! - `flat` + buy enters at the fill price (next open, or same close)
//! - `long` exits on stop-loss or take-profit at the close, checked first
//! - `long` + sell exits at the fill price
//! - a position still open after the last bar exits at the final close
//!
//! Undefined decisions count as hold. Every exit realises
//! `profit = capital × gross_return − cost`, minus tax on positive profit
//! only, and capital never falls below zero.

use chrono::NaiveDate;
use std::fmt;

use super::error::ArbiterError;
use super::ohlcv::{OhlcDataset, PriceColumn};
use super::recommendation::{Recommendation, Signal};

pub const DEFAULT_INITIAL_VALUE: f64 = 10_000.0;
pub const DEFAULT_STOP_LOSS: f64 = 0.05;
pub const DEFAULT_STOP_GAIN: f64 = 0.10;

/// Cost charged once per round trip, at entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationCost {
    Fixed(f64),
    /// Fraction of the capital committed at entry.
    Percentage(f64),
}

impl Default for OperationCost {
    fn default() -> Self {
        OperationCost::Fixed(0.0)
    }
}

impl OperationCost {
    pub fn amount(&self, capital: f64) -> f64 {
        match self {
            OperationCost::Fixed(amount) => *amount,
            OperationCost::Percentage(fraction) => capital * fraction,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            OperationCost::Fixed(v) | OperationCost::Percentage(v) => *v,
        }
    }
}

/// Price at which decisions are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fill {
    /// Open of the following bar.
    #[default]
    NextOpen,
    /// Close of the deciding bar.
    SameClose,
}

impl Fill {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "next_open" => Some(Fill::NextOpen),
            "same_close" => Some(Fill::SameClose),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_value: f64,
    pub stop_loss: f64,
    pub stop_gain: f64,
    pub operation_cost: OperationCost,
    pub tax_percentage: f64,
    pub fill: Fill,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_value: DEFAULT_INITIAL_VALUE,
            stop_loss: DEFAULT_STOP_LOSS,
            stop_gain: DEFAULT_STOP_GAIN,
            operation_cost: OperationCost::default(),
            tax_percentage: 0.0,
            fill: Fill::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if !(self.initial_value > 0.0 && self.initial_value.is_finite()) {
            return Err(ArbiterError::configuration(
                "initial_value",
                "initial_value must be positive",
            ));
        }
        if !(self.stop_loss > 0.0 && self.stop_loss < 1.0) {
            return Err(ArbiterError::configuration(
                "stop_loss",
                format!("stop_loss ({}) must be in (0, 1)", self.stop_loss),
            ));
        }
        if !(self.stop_gain > 0.0 && self.stop_gain.is_finite()) {
            return Err(ArbiterError::configuration(
                "stop_gain",
                format!("stop_gain ({}) must be positive", self.stop_gain),
            ));
        }
        if !(0.0..1.0).contains(&self.tax_percentage) {
            return Err(ArbiterError::configuration(
                "tax_percentage",
                "tax_percentage must be in [0, 1)",
            ));
        }
        let cost = self.operation_cost.value();
        if !(cost >= 0.0 && cost.is_finite()) {
            return Err(ArbiterError::configuration(
                "operation_cost",
                "operation_cost must be non-negative",
            ));
        }
        if matches!(self.operation_cost, OperationCost::Percentage(f) if f >= 1.0) {
            return Err(ArbiterError::configuration(
                "operation_cost",
                "percentage operation_cost must be below 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Flat {
        capital: f64,
    },
    Long {
        entry_price: f64,
        entry_date: NaiveDate,
        /// Capital committed at entry, before cost.
        capital: f64,
        cost: f64,
    },
}

impl PositionState {
    pub fn is_long(&self) -> bool {
        matches!(self, PositionState::Long { .. })
    }

    pub fn capital(&self) -> f64 {
        match self {
            PositionState::Flat { capital } | PositionState::Long { capital, .. } => *capital,
        }
    }

    /// Value of the account at `price` on `date`. A position whose fill date
    /// is still ahead is worth its committed capital.
    pub fn marked_value(&self, date: NaiveDate, price: f64) -> f64 {
        match *self {
            PositionState::Flat { capital } => capital,
            PositionState::Long {
                entry_date,
                capital,
                ..
            } if date < entry_date => capital,
            PositionState::Long {
                entry_price,
                capital,
                cost,
                ..
            } => (capital * price / entry_price - cost).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
    EndOfSeries,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::EndOfSeries => write!(f, "end_of_series"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub capital_in: f64,
    pub cost: f64,
    pub tax: f64,
    pub profit: f64,
    pub capital_out: f64,
    pub reason: ExitReason,
}

impl ClosedTrade {
    pub fn net_return(&self) -> f64 {
        if self.capital_in == 0.0 {
            return 0.0;
        }
        (self.capital_out - self.capital_in) / self.capital_in
    }

    pub fn is_win(&self) -> bool {
        self.capital_out > self.capital_in
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    Entered {
        date: NaiveDate,
        price: f64,
        cost: f64,
    },
    Exited(ClosedTrade),
}

/// Prices visible to one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub date: NaiveDate,
    pub close: f64,
    /// Where a decision taken on this bar executes; `None` on the last bar,
    /// where buys cannot fill and sells exit at the close.
    pub fill: Option<(NaiveDate, f64)>,
}

/// One step of the position state machine.
pub fn transition(
    state: PositionState,
    decision: Option<Recommendation>,
    quote: &Quote,
    config: &SimulationConfig,
) -> (PositionState, Option<TradeEvent>) {
    match state {
        PositionState::Flat { capital } => match (decision, quote.fill) {
            (Some(Recommendation::Buy), Some((date, price))) if capital > 0.0 && price > 0.0 => {
                let cost = config.operation_cost.amount(capital);
                (
                    PositionState::Long {
                        entry_price: price,
                        entry_date: date,
                        capital,
                        cost,
                    },
                    Some(TradeEvent::Entered { date, price, cost }),
                )
            }
            _ => (state, None),
        },
        PositionState::Long { entry_price, .. } => {
            if quote.close <= entry_price * (1.0 - config.stop_loss) {
                exit(state, quote.date, quote.close, ExitReason::StopLoss, config)
            } else if quote.close >= entry_price * (1.0 + config.stop_gain) {
                exit(state, quote.date, quote.close, ExitReason::TakeProfit, config)
            } else if decision == Some(Recommendation::Sell) {
                let (date, price) = quote.fill.unwrap_or((quote.date, quote.close));
                exit(state, date, price, ExitReason::Signal, config)
            } else {
                (state, None)
            }
        }
    }
}

/// Close a long position at `price`. Flat states pass through unchanged.
pub fn exit(
    state: PositionState,
    date: NaiveDate,
    price: f64,
    reason: ExitReason,
    config: &SimulationConfig,
) -> (PositionState, Option<TradeEvent>) {
    let PositionState::Long {
        entry_price,
        entry_date,
        capital,
        cost,
    } = state
    else {
        return (state, None);
    };

    let gross = price / entry_price - 1.0;
    let profit = capital * gross - cost;
    let tax = if profit > 0.0 {
        profit * config.tax_percentage
    } else {
        0.0
    };
    let capital_out = (capital + profit - tax).max(0.0);

    let trade = ClosedTrade {
        entry_date,
        exit_date: date,
        entry_price,
        exit_price: price,
        capital_in: capital,
        cost,
        tax,
        profit,
        capital_out,
        reason,
    };
    (
        PositionState::Flat {
            capital: capital_out,
        },
        Some(TradeEvent::Exited(trade)),
    )
}

/// Account value over time, one entry per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSeries {
    pub dates: Vec<NaiveDate>,
    /// Capital after realised trades only.
    pub realized: Vec<f64>,
    /// Open positions marked to the close.
    pub marked: Vec<f64>,
    /// Buy-and-hold from the first close.
    pub reference: Vec<f64>,
}

impl PerformanceSeries {
    pub fn final_value(&self) -> Option<f64> {
        self.realized.last().copied()
    }

    pub fn final_reference(&self) -> Option<f64> {
        self.reference.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub performance: PerformanceSeries,
    pub trades: Vec<ClosedTrade>,
    pub entries: usize,
    pub final_state: PositionState,
}

/// Buy-and-hold value of `initial_value` at every close.
pub fn calculate_reference(closes: &[f64], initial_value: f64) -> Result<Vec<f64>, ArbiterError> {
    let Some(&first) = closes.first() else {
        return Ok(Vec::new());
    };
    if first <= 0.0 {
        return Err(ArbiterError::Data {
            reason: format!("reference needs a positive first close, got {first}"),
        });
    }
    Ok(closes
        .iter()
        .map(|close| (initial_value * close / first).max(0.0))
        .collect())
}

pub fn simulate(
    dataset: &OhlcDataset,
    column: PriceColumn,
    decision: &Signal,
    config: &SimulationConfig,
) -> Result<SimulationResult, ArbiterError> {
    if dataset.is_empty() {
        return Err(ArbiterError::NoData {
            symbol: dataset.symbol.clone(),
        });
    }
    if decision.len() != dataset.len() {
        return Err(ArbiterError::Length {
            left: decision.name.clone(),
            right: format!("{} {}", dataset.symbol, column),
            left_len: decision.len(),
            right_len: dataset.len(),
        });
    }

    let closes: Vec<f64> = dataset.bars.iter().map(|b| column.price(b)).collect();
    let reference = calculate_reference(&closes, config.initial_value)?;

    let n = dataset.len();
    let mut state = PositionState::Flat {
        capital: config.initial_value,
    };
    let mut trades = Vec::new();
    let mut entries = 0;
    let mut realized = Vec::with_capacity(n);
    let mut marked = Vec::with_capacity(n);

    for (i, bar) in dataset.bars.iter().enumerate() {
        // buys cannot fill on the last bar
        let fill = dataset.bars.get(i + 1).map(|next| match config.fill {
            Fill::SameClose => (bar.date, closes[i]),
            Fill::NextOpen => (next.date, column.open(next)),
        });
        let quote = Quote {
            date: bar.date,
            close: closes[i],
            fill,
        };

        let (next, event) = transition(state, decision.get(i), &quote, config);
        // an exit filling on a later bar is not visible yet
        let visible = match &event {
            Some(TradeEvent::Exited(trade)) if trade.exit_date > bar.date => state,
            _ => next,
        };
        realized.push(visible.capital());
        marked.push(visible.marked_value(bar.date, closes[i]));

        match event {
            Some(TradeEvent::Entered { .. }) => entries += 1,
            Some(TradeEvent::Exited(trade)) => trades.push(trade),
            None => {}
        }
        state = next;
    }

    if state.is_long() {
        let last = n - 1;
        let (next, event) = exit(
            state,
            dataset.bars[last].date,
            closes[last],
            ExitReason::EndOfSeries,
            config,
        );
        if let Some(TradeEvent::Exited(trade)) = event {
            trades.push(trade);
        }
        state = next;
        realized[last] = state.capital();
        marked[last] = state.capital();
    }

    Ok(SimulationResult {
        performance: PerformanceSeries {
            dates: dataset.dates(),
            realized,
            marked,
            reference,
        },
        trades,
        entries,
        final_state: state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use Recommendation::*;

    fn date(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn dataset_oc(prices: &[(f64, f64)]) -> OhlcDataset {
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &(open, close))| OhlcvBar {
                date: date(i),
                open,
                high: open.max(close),
                low: open.min(close),
                close,
                adj_close: None,
                volume: 100,
            })
            .collect();
        OhlcDataset::new("TEST", bars).unwrap()
    }

    fn dataset(closes: &[f64]) -> OhlcDataset {
        let pairs: Vec<(f64, f64)> = closes.iter().map(|&c| (c, c)).collect();
        dataset_oc(&pairs)
    }

    fn decisions(values: &[Option<Recommendation>]) -> Signal {
        Signal::new(
            "decision",
            (0..values.len()).map(date).collect(),
            values.to_vec(),
        )
    }

    fn config() -> SimulationConfig {
        SimulationConfig {
            initial_value: 10_000.0,
            stop_loss: 0.05,
            stop_gain: 0.10,
            operation_cost: OperationCost::Fixed(0.0),
            tax_percentage: 0.0,
            fill: Fill::SameClose,
        }
    }

    fn run(closes: &[f64], values: &[Option<Recommendation>], cfg: &SimulationConfig) -> SimulationResult {
        simulate(&dataset(closes), PriceColumn::Close, &decisions(values), cfg).unwrap()
    }

    #[test]
    fn all_hold_is_flat_at_initial_value() {
        let result = run(&[100.0, 120.0, 80.0, 90.0], &[Some(Hold); 4], &config());
        assert!(result.performance.realized.iter().all(|v| *v == 10_000.0));
        assert!(result.performance.marked.iter().all(|v| *v == 10_000.0));
        assert!(result.trades.is_empty());
    }

    #[test]
    fn undefined_decision_is_hold() {
        let result = run(&[100.0, 101.0, 102.0], &[None, None, None], &config());
        assert!(result.trades.is_empty());
        assert_eq!(result.entries, 0);
        assert_eq!(result.final_state, PositionState::Flat { capital: 10_000.0 });
    }

    #[test]
    fn stop_loss_forces_exit_on_hold() {
        let result = run(
            &[100.0, 94.0, 94.0],
            &[Some(Buy), Some(Hold), Some(Hold)],
            &config(),
        );
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_date, date(1));
        assert_eq!(trade.exit_price, 94.0);
        assert_relative_eq!(result.performance.realized[1], 9_400.0, epsilon = 1e-9);
        assert!(!result.final_state.is_long());
    }

    #[test]
    fn take_profit_with_tax_on_gain() {
        let cfg = SimulationConfig {
            tax_percentage: 0.25,
            ..config()
        };
        let result = run(&[100.0, 105.0, 111.0], &[Some(Buy), Some(Hold), Some(Hold)], &cfg);
        let trade = &result.trades[0];
        assert_eq!(trade.reason, ExitReason::TakeProfit);
        assert_relative_eq!(trade.profit, 1_100.0, epsilon = 1e-9);
        assert_relative_eq!(trade.tax, 275.0, epsilon = 1e-9);
        assert_relative_eq!(trade.capital_out, 10_825.0, epsilon = 1e-9);
        assert!(trade.is_win());
    }

    #[test]
    fn no_tax_on_losing_trade() {
        let cfg = SimulationConfig {
            tax_percentage: 0.25,
            ..config()
        };
        let result = run(&[100.0, 97.0, 97.0], &[Some(Buy), Some(Sell), Some(Hold)], &cfg);
        let trade = &result.trades[0];
        assert_eq!(trade.reason, ExitReason::Signal);
        assert_eq!(trade.tax, 0.0);
        assert_relative_eq!(trade.capital_out, 9_700.0, epsilon = 1e-9);
        assert!(!trade.is_win());
    }

    #[test]
    fn next_open_fill() {
        let ds = dataset_oc(&[(100.0, 100.0), (102.0, 104.0), (106.0, 108.0), (110.0, 109.0)]);
        let cfg = SimulationConfig {
            fill: Fill::NextOpen,
            ..config()
        };
        let signal = decisions(&[Some(Buy), Some(Hold), Some(Sell), Some(Hold)]);
        let result = simulate(&ds, PriceColumn::Close, &signal, &cfg).unwrap();

        let trade = &result.trades[0];
        assert_eq!(trade.entry_date, date(1));
        assert_eq!(trade.entry_price, 102.0);
        assert_eq!(trade.exit_date, date(3));
        assert_eq!(trade.exit_price, 110.0);
        assert_relative_eq!(trade.capital_out, 10_000.0 * 110.0 / 102.0, epsilon = 1e-9);

        let marked = &result.performance.marked;
        assert_eq!(marked[0], 10_000.0);
        assert_relative_eq!(marked[1], 10_000.0 * 104.0 / 102.0, epsilon = 1e-9);
    }

    #[test]
    fn next_open_exit_shows_on_fill_bar() {
        let ds = dataset_oc(&[
            (100.0, 100.0),
            (100.0, 100.0),
            (100.0, 104.0),
            (108.0, 108.0),
            (108.0, 108.0),
        ]);
        let cfg = SimulationConfig {
            fill: Fill::NextOpen,
            stop_gain: 0.5,
            ..config()
        };
        let signal = decisions(&[Some(Buy), Some(Hold), Some(Sell), Some(Hold), Some(Hold)]);
        let result = simulate(&ds, PriceColumn::Close, &signal, &cfg).unwrap();

        assert_eq!(result.trades[0].exit_date, date(3));
        assert_eq!(result.trades[0].exit_price, 108.0);
        let perf = &result.performance;
        assert_eq!(perf.realized[2], 10_000.0);
        assert_relative_eq!(perf.marked[2], 10_400.0, epsilon = 1e-9);
        assert_relative_eq!(perf.realized[3], 10_800.0, epsilon = 1e-9);
        assert_relative_eq!(perf.marked[3], 10_800.0, epsilon = 1e-9);
    }

    #[test]
    fn buy_on_last_bar_never_enters_at_same_close() {
        let cfg = SimulationConfig {
            operation_cost: OperationCost::Fixed(50.0),
            ..config()
        };
        let result = run(&[100.0, 100.0, 100.0], &[Some(Hold), Some(Hold), Some(Buy)], &cfg);
        assert_eq!(result.entries, 0);
        assert!(result.trades.is_empty());
        assert_eq!(result.performance.final_value(), Some(10_000.0));
    }

    #[test]
    fn sell_on_last_bar_exits_at_close() {
        let cfg = SimulationConfig {
            fill: Fill::NextOpen,
            stop_gain: 0.5,
            ..config()
        };
        let ds = dataset_oc(&[(100.0, 100.0), (100.0, 101.0), (101.0, 103.0)]);
        let signal = decisions(&[Some(Buy), Some(Hold), Some(Sell)]);
        let result = simulate(&ds, PriceColumn::Close, &signal, &cfg).unwrap();
        assert_eq!(result.trades[0].reason, ExitReason::Signal);
        assert_eq!(result.trades[0].exit_price, 103.0);
        assert_relative_eq!(result.performance.realized[2], 10_300.0, epsilon = 1e-9);
    }

    #[test]
    fn buy_on_last_bar_cannot_fill_at_next_open() {
        let cfg = SimulationConfig {
            fill: Fill::NextOpen,
            ..config()
        };
        let result = run(&[100.0, 101.0], &[Some(Hold), Some(Buy)], &cfg);
        assert_eq!(result.entries, 0);
    }

    #[test]
    fn percentage_cost_charged_at_entry() {
        let cfg = SimulationConfig {
            operation_cost: OperationCost::Percentage(0.01),
            tax_percentage: 0.1,
            stop_gain: 0.5,
            ..config()
        };
        let result = run(&[100.0, 110.0, 110.0], &[Some(Buy), Some(Sell), Some(Hold)], &cfg);
        assert_relative_eq!(result.performance.marked[0], 9_900.0, epsilon = 1e-9);
        let trade = &result.trades[0];
        assert_relative_eq!(trade.cost, 100.0, epsilon = 1e-9);
        assert_relative_eq!(trade.profit, 900.0, epsilon = 1e-9);
        assert_relative_eq!(trade.capital_out, 10_810.0, epsilon = 1e-9);
    }

    #[test]
    fn capital_never_negative() {
        let cfg = SimulationConfig {
            operation_cost: OperationCost::Fixed(20_000.0),
            ..config()
        };
        let result = run(
            &[100.0, 100.0, 100.0, 100.0],
            &[Some(Buy), Some(Sell), Some(Buy), Some(Hold)],
            &cfg,
        );
        assert_eq!(result.performance.realized[1], 0.0);
        assert!(result.performance.marked.iter().all(|v| *v >= 0.0));
        // no capital left to commit
        assert_eq!(result.entries, 1);
    }

    #[test]
    fn end_of_series_forces_exit() {
        let cfg = SimulationConfig {
            stop_gain: 0.5,
            ..config()
        };
        let result = run(&[100.0, 101.0, 102.0], &[Some(Buy), Some(Hold), Some(Hold)], &cfg);
        let trade = &result.trades[0];
        assert_eq!(trade.reason, ExitReason::EndOfSeries);
        assert_eq!(trade.exit_date, date(2));
        assert_relative_eq!(result.performance.realized[2], 10_200.0, epsilon = 1e-9);
        assert!(!result.final_state.is_long());
    }

    #[test]
    fn realized_changes_only_on_exit() {
        let cfg = SimulationConfig {
            stop_gain: 0.5,
            ..config()
        };
        let result = run(
            &[100.0, 103.0, 104.0, 104.0],
            &[Some(Buy), Some(Hold), Some(Sell), Some(Hold)],
            &cfg,
        );
        let realized = &result.performance.realized;
        assert_eq!(realized[0], 10_000.0);
        assert_eq!(realized[1], 10_000.0);
        assert_relative_eq!(realized[2], 10_400.0, epsilon = 1e-9);
        assert_relative_eq!(result.performance.marked[1], 10_300.0, epsilon = 1e-9);
    }

    #[test]
    fn held_buy_reenters_after_stop() {
        let result = run(
            &[100.0, 94.0, 95.0, 96.0],
            &[Some(Buy), Some(Buy), Some(Buy), Some(Buy)],
            &config(),
        );
        assert_eq!(result.trades[0].reason, ExitReason::StopLoss);
        assert_eq!(result.entries, 2);
    }

    #[test]
    fn reference_is_buy_and_hold() {
        let closes = [100.0, 102.0, 97.0, 105.0, 110.0];
        let result = run(&closes, &[Some(Buy), Some(Sell), Some(Hold), Some(Buy), Some(Hold)], &config());
        let reference = &result.performance.reference;
        assert_eq!(reference[0], 10_000.0);
        assert_relative_eq!(reference[4], 10_000.0 * (1.0 + (110.0 - 100.0) / 100.0), epsilon = 1e-9);
    }

    #[test]
    fn mismatched_decision_length() {
        let err = simulate(
            &dataset(&[100.0, 101.0]),
            PriceColumn::Close,
            &decisions(&[Some(Hold)]),
            &config(),
        )
        .unwrap_err();
        assert!(matches!(err, ArbiterError::Length { .. }));
    }

    #[test]
    fn transition_is_pure() {
        let quote = Quote {
            date: date(0),
            close: 100.0,
            fill: Some((date(0), 100.0)),
        };
        let flat = PositionState::Flat { capital: 1_000.0 };
        let a = transition(flat, Some(Buy), &quote, &config());
        let b = transition(flat, Some(Buy), &quote, &config());
        assert_eq!(a, b);
        assert!(a.0.is_long());
    }

    #[test]
    fn validate_rejects_bad_stops_and_tax() {
        let bad = [
            SimulationConfig { stop_loss: 0.0, ..config() },
            SimulationConfig { stop_loss: 1.0, ..config() },
            SimulationConfig { stop_gain: -0.1, ..config() },
            SimulationConfig { tax_percentage: 1.0, ..config() },
            SimulationConfig { initial_value: 0.0, ..config() },
            SimulationConfig { operation_cost: OperationCost::Fixed(-1.0), ..config() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(ArbiterError::Configuration { .. })));
        }
        assert!(config().validate().is_ok());
    }

    #[test]
    fn fill_parse() {
        assert_eq!(Fill::parse("next_open"), Some(Fill::NextOpen));
        assert_eq!(Fill::parse("SAME_CLOSE"), Some(Fill::SameClose));
        assert_eq!(Fill::parse("vwap"), None);
    }

    fn recommendation() -> impl Strategy<Value = Option<Recommendation>> {
        prop_oneof![Just(None), Just(Some(Buy)), Just(Some(Sell)), Just(Some(Hold))]
    }

    proptest! {
        #[test]
        fn simulation_is_deterministic(
            closes in prop::collection::vec(1.0f64..500.0, 2..40),
            seed in prop::collection::vec(recommendation(), 40),
        ) {
            let values = &seed[..closes.len()];
            let first = run(&closes, values, &config());
            let second = run(&closes, values, &config());
            prop_assert_eq!(&first, &second);
            prop_assert!(first.performance.realized.iter().all(|v| *v >= 0.0));
            prop_assert!(!first.final_state.is_long());
        }
    }
}
