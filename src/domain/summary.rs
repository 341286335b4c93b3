//! Summary statistics for one simulated decision stream.

use super::ohlcv::{OhlcDataset, PriceColumn};
use super::recommendation::{Recommendation, Signal};
use super::simulation::SimulationResult;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
    pub win_rate: f64,
    /// Realised return over the initial value.
    pub net_return: f64,
    /// Buy-and-hold return over the same window.
    pub reference_return: f64,
    /// Final value relative to the final reference value; `None` when the
    /// reference ended at zero.
    pub relative_gain_comparison: Option<f64>,
    pub max_drawdown: f64,
    /// Longest stretch of bars spent below a previous peak.
    pub max_drawdown_duration: usize,
    pub avg_trade_duration: f64,
    /// Mean positive daily change per bar.
    pub up_movement: f64,
    /// Mean magnitude of negative daily change per bar.
    pub down_movement: f64,
    /// `None` when the series never fell.
    pub ratio_up_down: Option<f64>,
    pub average_volume: f64,
    /// Decision event on the last bar.
    pub last_event: Option<Recommendation>,
    /// Decision event on the bar before it.
    pub previous_event: Option<Recommendation>,
}

impl Summary {
    pub fn compute(
        dataset: &OhlcDataset,
        column: PriceColumn,
        decision: &Signal,
        result: &SimulationResult,
        initial_value: f64,
    ) -> Self {
        let performance = &result.performance;
        let final_value = performance.final_value().unwrap_or(initial_value);
        let final_reference = performance.final_reference().unwrap_or(initial_value);

        let net_return = (final_value - initial_value) / initial_value;
        let reference_return = (final_reference - initial_value) / initial_value;
        let relative_gain_comparison = if final_reference > 0.0 {
            Some((final_value - final_reference) / final_reference)
        } else {
            None
        };

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut breakeven = 0usize;
        let mut total_duration_days = 0i64;
        for trade in &result.trades {
            let net = trade.capital_out - trade.capital_in;
            if net > 0.0 {
                wins += 1;
            } else if net < 0.0 {
                losses += 1;
            } else {
                breakeven += 1;
            }
            total_duration_days += (trade.exit_date - trade.entry_date).num_days();
        }

        let trade_count = result.trades.len();
        let win_rate = if trade_count > 0 {
            wins as f64 / trade_count as f64
        } else {
            0.0
        };
        let avg_trade_duration = if trade_count > 0 {
            total_duration_days as f64 / trade_count as f64
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&performance.marked);
        let (up_movement, down_movement) = movements(dataset, column);
        let ratio_up_down = if down_movement > 0.0 {
            Some(up_movement / down_movement)
        } else {
            None
        };

        let events = decision.events();
        let n = events.len();
        let last_event = n.checked_sub(1).and_then(|i| events.get(i));
        let previous_event = n.checked_sub(2).and_then(|i| events.get(i));

        Summary {
            trade_count,
            wins,
            losses,
            breakeven,
            win_rate,
            net_return,
            reference_return,
            relative_gain_comparison,
            max_drawdown,
            max_drawdown_duration,
            avg_trade_duration,
            up_movement,
            down_movement,
            ratio_up_down,
            average_volume: dataset.average_volume(),
            last_event,
            previous_event,
        }
    }
}

/// Mean daily gain over mean daily loss; `None` when the prices never fell.
pub fn up_down_ratio(dataset: &OhlcDataset, column: PriceColumn) -> Option<f64> {
    let (up, down) = movements(dataset, column);
    (down > 0.0).then(|| up / down)
}

fn movements(dataset: &OhlcDataset, column: PriceColumn) -> (f64, f64) {
    let n = dataset.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let change = dataset.prices(column).pct_change();
    let up = change.clip_lower(0.0).sum_defined() / n as f64;
    let down = change.clip_upper(0.0).abs().sum_defined() / n as f64;
    (up, down)
}

fn compute_drawdown(curve: &[f64]) -> (f64, usize) {
    let Some(&first) = curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for &value in curve {
        if value >= peak {
            peak = value;
            current_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::simulation::{Fill, OperationCost, SimulationConfig, simulate};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use Recommendation::*;

    fn date(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn dataset(closes: &[f64]) -> OhlcDataset {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: date(i),
                open: close,
                high: close,
                low: close,
                close,
                adj_close: None,
                volume: 100 * (i as i64 + 1),
            })
            .collect();
        OhlcDataset::new("TEST", bars).unwrap()
    }

    fn config() -> SimulationConfig {
        SimulationConfig {
            initial_value: 1_000.0,
            stop_loss: 0.5,
            stop_gain: 1.0,
            operation_cost: OperationCost::Fixed(0.0),
            tax_percentage: 0.0,
            fill: Fill::SameClose,
        }
    }

    fn summarize(closes: &[f64], values: &[Option<Recommendation>]) -> Summary {
        let ds = dataset(closes);
        let decision = Signal::new("decision", ds.dates(), values.to_vec());
        let result = simulate(&ds, PriceColumn::Close, &decision, &config()).unwrap();
        Summary::compute(&ds, PriceColumn::Close, &decision, &result, 1_000.0)
    }

    #[test]
    fn wins_losses_and_returns() {
        let summary = summarize(
            &[100.0, 110.0, 100.0, 90.0, 100.0],
            &[Some(Buy), Some(Sell), Some(Buy), Some(Sell), Some(Hold)],
        );
        assert_eq!(summary.trade_count, 2);
        assert_eq!(summary.wins, 1);
        assert_eq!(summary.losses, 1);
        assert_relative_eq!(summary.win_rate, 0.5);
        // 1000 -> 1100 -> 990
        assert_relative_eq!(summary.net_return, -0.01, epsilon = 1e-12);
        assert_relative_eq!(summary.reference_return, 0.0, epsilon = 1e-12);
        assert_relative_eq!(summary.relative_gain_comparison.unwrap(), -0.01, epsilon = 1e-12);
        assert_relative_eq!(summary.avg_trade_duration, 1.0);
    }

    #[test]
    fn drawdown_on_marked_curve() {
        let summary = summarize(
            &[100.0, 120.0, 90.0, 95.0],
            &[Some(Buy), Some(Hold), Some(Hold), Some(Hold)],
        );
        // marked: 1000, 1200, 900, 950
        assert_relative_eq!(summary.max_drawdown, 0.25, epsilon = 1e-12);
        assert_eq!(summary.max_drawdown_duration, 2);
    }

    #[test]
    fn movements_and_ratio() {
        let summary = summarize(&[100.0, 110.0, 99.0, 99.0], &[Some(Hold); 4]);
        assert_relative_eq!(summary.up_movement, 0.1 / 4.0, epsilon = 1e-12);
        assert_relative_eq!(summary.down_movement, 0.1 / 4.0, epsilon = 1e-12);
        assert_relative_eq!(summary.ratio_up_down.unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(summary.average_volume, 250.0);
    }

    #[test]
    fn ratio_undefined_without_down_moves() {
        let summary = summarize(&[100.0, 101.0, 102.0], &[Some(Hold); 3]);
        assert_eq!(summary.ratio_up_down, None);
    }

    #[test]
    fn last_and_previous_events() {
        let summary = summarize(
            &[100.0, 101.0, 102.0, 103.0],
            &[Some(Hold), Some(Hold), Some(Buy), Some(Buy)],
        );
        assert_eq!(summary.previous_event, Some(Buy));
        assert_eq!(summary.last_event, Some(Hold));
    }

    #[test]
    fn no_trades() {
        let summary = summarize(&[100.0, 100.0], &[None, None]);
        assert_eq!(summary.trade_count, 0);
        assert_eq!(summary.win_rate, 0.0);
        assert_eq!(summary.net_return, 0.0);
        assert_eq!(summary.last_event, None);
    }

    #[test]
    fn drawdown_empty_curve() {
        assert_eq!(compute_drawdown(&[]), (0.0, 0));
    }
}
