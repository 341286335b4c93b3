//! Time-indexed series and the numeric primitives indicators are built from.
//!
//! A [`Series`] carries one optional value per date; `None` marks an
//! undefined entry (typically the warmup of a rolling window).
//!
//! Alignment policy for binary operations: when two series differ in length,
//! only the first `min(len)` entries of each are combined (oldest first) and
//! the result carries the shorter prefix of dates. An empty overlap is a
//! [`ArbiterError::Length`].
//!
//! Rolling operations over window `n` start counting at the first defined
//! input, so the first `n - 1` entries after it are undefined. A window of
//! zero, or one longer than the defined history, is a [`ArbiterError::Window`].

use chrono::NaiveDate;

use super::error::ArbiterError;

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl Series {
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self {
            name: name.into(),
            dates,
            values,
        }
    }

    pub fn from_values(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        Self::new(name, dates, values.into_iter().map(Some).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    pub fn last_defined(&self) -> Option<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, v)| v.map(|v| (i, v)))
    }

    pub fn column_min(&self) -> Option<f64> {
        self.values.iter().flatten().copied().reduce(f64::min)
    }

    pub fn column_max(&self) -> Option<f64> {
        self.values.iter().flatten().copied().reduce(f64::max)
    }

    pub fn sum_defined(&self) -> f64 {
        self.values.iter().flatten().sum()
    }

    // ------------------------------------------------------------------
    // Elementwise arithmetic
    // ------------------------------------------------------------------

    pub fn add(&self, other: &Series) -> Result<Series, ArbiterError> {
        self.zip_with(other, "plus", |a, b| Some(a + b))
    }

    pub fn sub(&self, other: &Series) -> Result<Series, ArbiterError> {
        self.zip_with(other, "minus", |a, b| Some(a - b))
    }

    pub fn mul(&self, other: &Series) -> Result<Series, ArbiterError> {
        self.zip_with(other, "times", |a, b| Some(a * b))
    }

    /// Division by zero yields an undefined entry.
    pub fn div(&self, other: &Series) -> Result<Series, ArbiterError> {
        self.zip_with(other, "over", |a, b| if b == 0.0 { None } else { Some(a / b) })
    }

    fn zip_with(
        &self,
        other: &Series,
        op: &str,
        f: impl Fn(f64, f64) -> Option<f64>,
    ) -> Result<Series, ArbiterError> {
        let n = self.len().min(other.len());
        if n == 0 {
            return Err(ArbiterError::Length {
                left: self.name.clone(),
                right: other.name.clone(),
                left_len: self.len(),
                right_len: other.len(),
            });
        }

        let dates = if self.len() <= other.len() {
            self.dates[..n].to_vec()
        } else {
            other.dates[..n].to_vec()
        };
        let values = self.values[..n]
            .iter()
            .zip(&other.values[..n])
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => f(*a, *b),
                _ => None,
            })
            .collect();

        Ok(Series::new(
            format!("{} {} {}", self.name, op, other.name),
            dates,
            values,
        ))
    }

    pub fn scale(&self, factor: f64) -> Series {
        self.map_defined(format!("{} x {}", self.name, factor), |v| Some(v * factor))
    }

    /// Division by a zero constant leaves every entry undefined.
    pub fn divide_by(&self, divisor: f64) -> Series {
        self.map_defined(format!("{} / {}", self.name, divisor), |v| {
            if divisor == 0.0 { None } else { Some(v / divisor) }
        })
    }

    pub fn abs(&self) -> Series {
        self.map_defined(format!("|{}|", self.name), |v| Some(v.abs()))
    }

    pub fn clip_lower(&self, bound: f64) -> Series {
        self.map_defined(self.name.clone(), |v| Some(v.max(bound)))
    }

    pub fn clip_upper(&self, bound: f64) -> Series {
        self.map_defined(self.name.clone(), |v| Some(v.min(bound)))
    }

    fn map_defined(&self, name: String, f: impl Fn(f64) -> Option<f64>) -> Series {
        Series::new(
            name,
            self.dates.clone(),
            self.values.iter().map(|v| v.and_then(&f)).collect(),
        )
    }

    /// Day-over-day difference; the first entry is undefined.
    pub fn change(&self) -> Series {
        self.lagged(format!("{} change", self.name), |prev, curr| Some(curr - prev))
    }

    /// Day-over-day relative change; undefined where the previous value is zero.
    pub fn pct_change(&self) -> Series {
        self.lagged(format!("{} pct change", self.name), |prev, curr| {
            if prev == 0.0 { None } else { Some((curr - prev) / prev) }
        })
    }

    fn lagged(&self, name: String, f: impl Fn(f64, f64) -> Option<f64>) -> Series {
        let mut values = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            let value = if i == 0 {
                None
            } else {
                match (self.values[i - 1], self.values[i]) {
                    (Some(prev), Some(curr)) => f(prev, curr),
                    _ => None,
                }
            };
            values.push(value);
        }
        Series::new(name, self.dates.clone(), values)
    }

    // ------------------------------------------------------------------
    // Rolling windows
    // ------------------------------------------------------------------

    fn window_start(&self, window: usize, label: &str) -> Result<usize, ArbiterError> {
        let start = self.first_defined().unwrap_or(self.len());
        let available = self.len() - start;
        if window == 0 || window > available {
            return Err(ArbiterError::Window {
                series: format!("{}({}) {}", label, window, self.name),
                window,
                available,
            });
        }
        Ok(start)
    }

    fn rolling(
        &self,
        window: usize,
        label: &str,
        f: impl Fn(&[f64]) -> f64,
    ) -> Result<Series, ArbiterError> {
        let start = self.window_start(window, label)?;
        let mut values = vec![None; self.len()];
        let mut buffer: Vec<f64> = Vec::with_capacity(window);

        for i in (start + window - 1)..self.len() {
            buffer.clear();
            buffer.extend(self.values[i + 1 - window..=i].iter().flatten());
            if buffer.len() == window {
                values[i] = Some(f(&buffer));
            }
        }

        Ok(Series::new(
            format!("{}({}) {}", label, window, self.name),
            self.dates.clone(),
            values,
        ))
    }

    /// Simple moving average.
    pub fn sma(&self, window: usize) -> Result<Series, ArbiterError> {
        self.rolling(window, "SMA", mean)
    }

    /// Population standard deviation over the window.
    pub fn rolling_std(&self, window: usize) -> Result<Series, ArbiterError> {
        self.rolling(window, "STDDEV", |w| {
            let m = mean(w);
            (w.iter().map(|v| (v - m).powi(2)).sum::<f64>() / w.len() as f64).sqrt()
        })
    }

    pub fn rolling_min(&self, window: usize) -> Result<Series, ArbiterError> {
        self.rolling(window, "MIN", |w| w.iter().copied().fold(f64::INFINITY, f64::min))
    }

    pub fn rolling_max(&self, window: usize) -> Result<Series, ArbiterError> {
        self.rolling(window, "MAX", |w| {
            w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        })
    }

    /// Rolling sum, i.e. the discrete integral over the window.
    pub fn rolling_sum(&self, window: usize) -> Result<Series, ArbiterError> {
        self.rolling(window, "SUM", |w| w.iter().sum())
    }

    /// Exponential moving average, k = 2/(n+1), seeded with the SMA of the
    /// first n defined values.
    pub fn ema(&self, window: usize) -> Result<Series, ArbiterError> {
        let alpha = 2.0 / (window as f64 + 1.0);
        self.exp_smooth(window, alpha, "EMA")
    }

    /// Wilder smoothing, k = 1/n, seeded like [`Series::ema`].
    pub fn wilder(&self, window: usize) -> Result<Series, ArbiterError> {
        let alpha = 1.0 / window.max(1) as f64;
        self.exp_smooth(window, alpha, "WILDER")
    }

    fn exp_smooth(&self, window: usize, alpha: f64, label: &str) -> Result<Series, ArbiterError> {
        let start = self.window_start(window, label)?;
        let mut values = vec![None; self.len()];
        let mut seen = 0usize;
        let mut sum = 0.0;
        let mut smoothed = 0.0;

        for i in start..self.len() {
            let Some(v) = self.values[i] else {
                continue;
            };
            seen += 1;
            if seen < window {
                sum += v;
            } else if seen == window {
                sum += v;
                smoothed = sum / window as f64;
                values[i] = Some(smoothed);
            } else {
                // incremental form keeps constant input exact
                smoothed = if window == 1 {
                    v
                } else {
                    smoothed + alpha * (v - smoothed)
                };
                values[i] = Some(smoothed);
            }
        }

        Ok(Series::new(
            format!("{}({}) {}", label, window, self.name),
            self.dates.clone(),
            values,
        ))
    }

    // ------------------------------------------------------------------
    // Thresholding
    // ------------------------------------------------------------------

    pub fn above(&self, bound: f64) -> Vec<Option<bool>> {
        self.values.iter().map(|v| v.map(|v| v > bound)).collect()
    }

    pub fn below(&self, bound: f64) -> Vec<Option<bool>> {
        self.values.iter().map(|v| v.map(|v| v < bound)).collect()
    }

    /// True where the previous value was at or below `bound` and the current
    /// one is strictly above it. Undefined where the current value is.
    pub fn crosses_above(&self, bound: f64) -> Vec<Option<bool>> {
        self.crossings(|prev, curr| prev <= bound && curr > bound)
    }

    /// Mirror of [`Series::crosses_above`].
    pub fn crosses_below(&self, bound: f64) -> Vec<Option<bool>> {
        self.crossings(|prev, curr| prev >= bound && curr < bound)
    }

    /// True where the previous value was strictly negative and the current
    /// one strictly positive. A move off exactly zero does not count.
    pub fn turns_positive(&self) -> Vec<Option<bool>> {
        self.crossings(|prev, curr| prev < 0.0 && curr > 0.0)
    }

    pub fn turns_negative(&self) -> Vec<Option<bool>> {
        self.crossings(|prev, curr| prev > 0.0 && curr < 0.0)
    }

    /// True where this series moves from at-or-below `other` to above it.
    pub fn crosses_above_series(&self, other: &Series) -> Result<Vec<Option<bool>>, ArbiterError> {
        Ok(self.sub(other)?.crosses_above(0.0))
    }

    pub fn crosses_below_series(&self, other: &Series) -> Result<Vec<Option<bool>>, ArbiterError> {
        Ok(self.sub(other)?.crosses_below(0.0))
    }

    fn crossings(&self, f: impl Fn(f64, f64) -> bool) -> Vec<Option<bool>> {
        (0..self.len())
            .map(|i| {
                let curr = self.values[i]?;
                let prev = if i == 0 { None } else { self.values[i - 1] };
                Some(prev.is_some_and(|prev| f(prev, curr)))
            })
            .collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    fn series(values: &[f64]) -> Series {
        Series::from_values("close", dates(values.len()), values.to_vec())
    }

    #[test]
    fn add_equal_lengths() {
        let a = series(&[1.0, 2.0, 3.0]);
        let b = series(&[10.0, 20.0, 30.0]);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.values, vec![Some(11.0), Some(22.0), Some(33.0)]);
        assert_eq!(sum.dates, a.dates);
    }

    #[test]
    fn sub_truncates_to_shorter_prefix() {
        let a = series(&[5.0, 6.0, 7.0, 8.0]);
        let b = Series::from_values("b", dates(2), vec![1.0, 1.0]);
        let diff = a.sub(&b).unwrap();
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.values, vec![Some(4.0), Some(5.0)]);
        assert_eq!(diff.dates, dates(2));
    }

    #[test]
    fn empty_overlap_is_length_error() {
        let a = series(&[1.0, 2.0]);
        let b = Series::new("empty", vec![], vec![]);
        assert!(matches!(a.mul(&b), Err(ArbiterError::Length { .. })));
    }

    #[test]
    fn div_by_zero_is_undefined() {
        let a = series(&[1.0, 2.0]);
        let b = series(&[0.0, 4.0]);
        assert_eq!(a.div(&b).unwrap().values, vec![None, Some(0.5)]);
    }

    #[test]
    fn undefined_propagates_through_arithmetic() {
        let a = Series::new("a", dates(2), vec![None, Some(2.0)]);
        let b = series(&[1.0, 1.0]);
        assert_eq!(a.add(&b).unwrap().values, vec![None, Some(3.0)]);
    }

    #[test]
    fn scalar_operations() {
        let a = series(&[2.0, 4.0]);
        assert_eq!(a.scale(2.0).values, vec![Some(4.0), Some(8.0)]);
        assert_eq!(a.divide_by(2.0).values, vec![Some(1.0), Some(2.0)]);
        assert_eq!(a.divide_by(0.0).values, vec![None, None]);
    }

    #[test]
    fn sma_basic() {
        let s = series(&[10.0, 20.0, 30.0, 40.0]).sma(3).unwrap();
        assert_eq!(s.values[0], None);
        assert_eq!(s.values[1], None);
        assert_relative_eq!(s.values[2].unwrap(), 20.0);
        assert_relative_eq!(s.values[3].unwrap(), 30.0);
    }

    #[test]
    fn window_longer_than_history_is_window_error() {
        let err = series(&[1.0, 2.0]).sma(3).unwrap_err();
        match err {
            ArbiterError::Window {
                window, available, ..
            } => {
                assert_eq!(window, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn zero_window_is_window_error() {
        assert!(matches!(
            series(&[1.0, 2.0]).ema(0),
            Err(ArbiterError::Window { .. })
        ));
    }

    #[test]
    fn ema_seed_is_sma_then_recursive() {
        let s = series(&[10.0, 20.0, 30.0, 40.0, 50.0]).ema(3).unwrap();
        let k = 0.5;
        let seed = 20.0;
        assert_eq!(s.values[1], None);
        assert_relative_eq!(s.values[2].unwrap(), seed);
        let e3 = 40.0 * k + seed * (1.0 - k);
        assert_relative_eq!(s.values[3].unwrap(), e3);
        assert_relative_eq!(s.values[4].unwrap(), 50.0 * k + e3 * (1.0 - k));
    }

    #[test]
    fn ema_of_series_with_warmup_shifts_window() {
        let inner = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).sma(2).unwrap();
        let outer = inner.ema(3).unwrap();
        // inner defined from index 1, so outer defined from index 1 + 3 - 1
        assert!(outer.values[..3].iter().all(Option::is_none));
        assert!(outer.values[3..].iter().all(Option::is_some));
    }

    #[test]
    fn wilder_smoothing() {
        let s = series(&[1.0, 2.0, 3.0, 6.0]).wilder(3).unwrap();
        assert_relative_eq!(s.values[2].unwrap(), 2.0);
        assert_relative_eq!(s.values[3].unwrap(), (2.0 * 2.0 + 6.0) / 3.0);
    }

    #[test]
    fn rolling_std_population() {
        let s = series(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
            .rolling_std(8)
            .unwrap();
        assert_relative_eq!(s.values[7].unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn rolling_std_flat_is_zero() {
        let s = series(&[5.0, 5.0, 5.0]).rolling_std(3).unwrap();
        assert_eq!(s.values[2], Some(0.0));
    }

    #[test]
    fn rolling_min_max_sum() {
        let s = series(&[3.0, 1.0, 4.0, 1.0, 5.0]);
        assert_eq!(s.rolling_min(3).unwrap().values[2], Some(1.0));
        assert_eq!(s.rolling_max(3).unwrap().values[4], Some(5.0));
        assert_eq!(s.rolling_sum(2).unwrap().values[1], Some(4.0));
    }

    #[test]
    fn change_and_pct_change() {
        let s = series(&[100.0, 110.0, 99.0]);
        assert_eq!(s.change().values, vec![None, Some(10.0), Some(-11.0)]);
        let pct = s.pct_change();
        assert_eq!(pct.values[0], None);
        assert_relative_eq!(pct.values[1].unwrap(), 0.1);
        assert_relative_eq!(pct.values[2].unwrap(), -0.1);
    }

    #[test]
    fn clip_and_abs() {
        let s = series(&[-2.0, 3.0]);
        assert_eq!(s.clip_lower(0.0).values, vec![Some(0.0), Some(3.0)]);
        assert_eq!(s.clip_upper(0.0).values, vec![Some(-2.0), Some(0.0)]);
        assert_eq!(s.abs().values, vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn column_min_max_ignore_undefined() {
        let s = Series::new("x", dates(3), vec![None, Some(-1.0), Some(4.0)]);
        assert_eq!(s.column_min(), Some(-1.0));
        assert_eq!(s.column_max(), Some(4.0));
    }

    #[test]
    fn thresholds_and_crossings() {
        let s = series(&[1.0, 3.0, 3.0, 1.0, 4.0]);
        assert_eq!(
            s.above(2.0),
            vec![Some(false), Some(true), Some(true), Some(false), Some(true)]
        );
        assert_eq!(
            s.crosses_above(2.0),
            vec![Some(false), Some(true), Some(false), Some(false), Some(true)]
        );
        assert_eq!(
            s.crosses_below(2.0),
            vec![Some(false), Some(false), Some(false), Some(true), Some(false)]
        );
    }

    #[test]
    fn crossing_after_warmup_needs_previous_value() {
        let s = Series::new("x", dates(3), vec![None, Some(5.0), Some(1.0)]);
        assert_eq!(s.crosses_above(2.0), vec![None, Some(false), Some(false)]);
        assert_eq!(s.crosses_below(2.0), vec![None, Some(false), Some(true)]);
    }

    #[test]
    fn sign_turns_are_strict() {
        let s = series(&[-1.0, 0.0, 2.0, -3.0, 1.0, 0.0, -1.0]);
        assert_eq!(
            s.turns_positive(),
            vec![Some(false), Some(false), Some(false), Some(false), Some(true), Some(false), Some(false)]
        );
        assert_eq!(
            s.turns_negative(),
            vec![Some(false), Some(false), Some(false), Some(true), Some(false), Some(false), Some(false)]
        );
    }

    #[test]
    fn line_crossings() {
        let fast = series(&[1.0, 2.0, 4.0, 3.0]);
        let slow = series(&[2.0, 2.0, 3.0, 3.5]);
        assert_eq!(
            fast.crosses_above_series(&slow).unwrap(),
            vec![Some(false), Some(false), Some(true), Some(false)]
        );
        assert_eq!(
            fast.crosses_below_series(&slow).unwrap(),
            vec![Some(false), Some(false), Some(false), Some(true)]
        );
    }

    proptest! {
        #[test]
        fn rolling_prefix_is_undefined(
            values in prop::collection::vec(-1000.0f64..1000.0, 1..60),
            window in 1usize..60,
        ) {
            prop_assume!(window <= values.len());
            let s = series(&values);
            for result in [s.sma(window).unwrap(), s.ema(window).unwrap(), s.rolling_std(window).unwrap()] {
                prop_assert!(result.values[..window - 1].iter().all(Option::is_none));
                prop_assert!(result.values[window - 1..].iter().all(Option::is_some));
            }
        }

        #[test]
        fn ema_window_one_is_identity(values in prop::collection::vec(-1000.0f64..1000.0, 1..60)) {
            let s = series(&values);
            let ema = s.ema(1).unwrap();
            prop_assert_eq!(ema.values, s.values);
        }
    }
}
