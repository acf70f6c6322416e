//! Market data observers.
//!
//! A [`MarketObserver`] answers "what is the value of identifier `i` at time
//! `t`". `observe` may decline with `None`; `get` is total and defaults a
//! miss to 0.0. Implementations report internal failures through
//! `ObserverError`, which the engine surfaces unchanged.

use std::collections::HashMap;

use crate::types::error::ObserverError;
use crate::types::time::ActusDateTime;

/// Typed query interface for market and behavioral data.
pub trait MarketObserver: Send + Sync {
    /// Observes `identifier` at `at`; `None` when this observer has no
    /// answer for the pair.
    fn observe(&self, identifier: &str, at: ActusDateTime) -> Result<Option<f64>, ObserverError>;

    /// Total form of [`observe`](MarketObserver::observe): a miss becomes
    /// 0.0.
    fn get(&self, identifier: &str, at: ActusDateTime) -> Result<f64, ObserverError> {
        Ok(self.observe(identifier, at)?.unwrap_or(0.0))
    }
}

/// Observer returning one fixed value for every query.
///
/// # Examples
///
/// ```
/// use actus_core::observers::market::{ConstantObserver, MarketObserver};
/// use actus_core::types::time::ActusDateTime;
///
/// let obs = ConstantObserver::new(0.08);
/// let t = ActusDateTime::from_ymd(2024, 7, 15).unwrap();
/// assert_eq!(obs.get("ANY", t).unwrap(), 0.08);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConstantObserver {
    value: f64,
}

impl ConstantObserver {
    /// Creates an observer that always answers `value`.
    pub fn new(value: f64) -> Self {
        ConstantObserver { value }
    }
}

impl MarketObserver for ConstantObserver {
    fn observe(&self, _identifier: &str, _at: ActusDateTime) -> Result<Option<f64>, ObserverError> {
        Ok(Some(self.value))
    }
}

/// Observer backed by a map of identifier to scalar; unknown identifiers
/// yield the default 0.0 through `get`.
#[derive(Debug, Clone, Default)]
pub struct DictObserver {
    values: HashMap<String, f64>,
}

impl DictObserver {
    /// Creates an observer over the given identifier/value pairs.
    pub fn new(values: HashMap<String, f64>) -> Self {
        DictObserver { values }
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, identifier: impl Into<String>, value: f64) {
        self.values.insert(identifier.into(), value);
    }
}

impl MarketObserver for DictObserver {
    fn observe(&self, identifier: &str, _at: ActusDateTime) -> Result<Option<f64>, ObserverError> {
        Ok(self.values.get(identifier).copied())
    }
}

/// Observer over per-identifier time series with piecewise-constant
/// interpolation.
///
/// The value at a query time is the value of the greatest sample at or
/// before it; queries before the first sample return the first value.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesObserver {
    series: HashMap<String, Vec<(ActusDateTime, f64)>>,
}

impl TimeSeriesObserver {
    /// Creates an empty observer.
    pub fn new() -> Self {
        TimeSeriesObserver::default()
    }

    /// Adds a series for `identifier`. Samples are sorted by time; duplicate
    /// timestamps keep the last value given.
    pub fn insert_series(
        &mut self,
        identifier: impl Into<String>,
        mut samples: Vec<(ActusDateTime, f64)>,
    ) -> Result<(), ObserverError> {
        if samples.is_empty() {
            return Err(ObserverError::InsufficientData { got: 0, need: 1 });
        }
        samples.sort_by_key(|(t, _)| *t);
        samples.dedup_by_key(|(t, _)| *t);
        self.series.insert(identifier.into(), samples);
        Ok(())
    }
}

impl MarketObserver for TimeSeriesObserver {
    fn observe(&self, identifier: &str, at: ActusDateTime) -> Result<Option<f64>, ObserverError> {
        let Some(samples) = self.series.get(identifier) else {
            return Ok(None);
        };
        // Greatest sample at or before the query time; first value before
        // the first sample.
        let value = match samples.partition_point(|(t, _)| *t <= at) {
            0 => samples[0].1,
            n => samples[n - 1].1,
        };
        Ok(Some(value))
    }
}

/// Observer over a tenor curve with linear interpolation between bracketing
/// tenors and flat extrapolation outside.
///
/// The query time is converted to a tenor in years (A/365) from the curve's
/// base date.
#[derive(Debug, Clone)]
pub struct CurveObserver {
    identifier: String,
    base_date: ActusDateTime,
    tenors: Vec<f64>,
    values: Vec<f64>,
}

impl CurveObserver {
    /// Creates a curve keyed by tenor (in years).
    ///
    /// # Errors
    ///
    /// `InsufficientData` with fewer than one point; `NonMonotonicData` when
    /// tenors are not strictly increasing.
    pub fn new(
        identifier: impl Into<String>,
        base_date: ActusDateTime,
        points: &[(f64, f64)],
    ) -> Result<Self, ObserverError> {
        if points.is_empty() {
            return Err(ObserverError::InsufficientData { got: 0, need: 1 });
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(ObserverError::NonMonotonicData { index: i + 1 });
            }
        }
        Ok(CurveObserver {
            identifier: identifier.into(),
            base_date,
            tenors: points.iter().map(|(t, _)| *t).collect(),
            values: points.iter().map(|(_, v)| *v).collect(),
        })
    }

    fn value_at_tenor(&self, tenor: f64) -> f64 {
        let n = self.tenors.len();
        if tenor <= self.tenors[0] {
            return self.values[0];
        }
        if tenor >= self.tenors[n - 1] {
            return self.values[n - 1];
        }
        let hi = self.tenors.partition_point(|&t| t < tenor);
        let (t0, t1) = (self.tenors[hi - 1], self.tenors[hi]);
        let (v0, v1) = (self.values[hi - 1], self.values[hi]);
        v0 + (v1 - v0) * (tenor - t0) / (t1 - t0)
    }
}

impl MarketObserver for CurveObserver {
    fn observe(&self, identifier: &str, at: ActusDateTime) -> Result<Option<f64>, ObserverError> {
        if identifier != self.identifier {
            return Ok(None);
        }
        let tenor = self.base_date.days_between(at) as f64 / 365.0;
        Ok(Some(self.value_at_tenor(tenor)))
    }
}

/// Ordered list of observers; the first non-default answer wins.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Box<dyn MarketObserver>>,
}

impl CompositeObserver {
    /// Creates an empty composite.
    pub fn new() -> Self {
        CompositeObserver::default()
    }

    /// Appends an observer; earlier observers take precedence.
    pub fn push(&mut self, observer: Box<dyn MarketObserver>) {
        self.observers.push(observer);
    }
}

impl MarketObserver for CompositeObserver {
    fn observe(&self, identifier: &str, at: ActusDateTime) -> Result<Option<f64>, ObserverError> {
        for observer in &self.observers {
            if let Some(value) = observer.observe(identifier, at)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> ActusDateTime {
        ActusDateTime::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_constant() {
        let obs = ConstantObserver::new(1.5);
        assert_eq!(obs.get("X", d(2024, 1, 1)).unwrap(), 1.5);
        assert_eq!(obs.get("Y", d(2030, 1, 1)).unwrap(), 1.5);
    }

    #[test]
    fn test_dict_missing_key_defaults_to_zero() {
        let mut obs = DictObserver::default();
        obs.insert("LIBOR-3M", 0.03);
        assert_eq!(obs.get("LIBOR-3M", d(2024, 1, 1)).unwrap(), 0.03);
        assert_eq!(obs.get("UNKNOWN", d(2024, 1, 1)).unwrap(), 0.0);
        assert_eq!(obs.observe("UNKNOWN", d(2024, 1, 1)).unwrap(), None);
    }

    #[test]
    fn test_time_series_piecewise_constant() {
        let mut obs = TimeSeriesObserver::new();
        obs.insert_series(
            "RATE",
            vec![(d(2024, 3, 1), 0.05), (d(2024, 1, 1), 0.03), (d(2024, 6, 1), 0.04)],
        )
        .unwrap();
        // Before the first sample: first value.
        assert_eq!(obs.get("RATE", d(2023, 12, 1)).unwrap(), 0.03);
        // Exactly on a sample.
        assert_eq!(obs.get("RATE", d(2024, 3, 1)).unwrap(), 0.05);
        // Between samples: previous value holds.
        assert_eq!(obs.get("RATE", d(2024, 4, 15)).unwrap(), 0.05);
        // After the last sample.
        assert_eq!(obs.get("RATE", d(2025, 1, 1)).unwrap(), 0.04);
    }

    #[test]
    fn test_time_series_rejects_empty() {
        let mut obs = TimeSeriesObserver::new();
        assert!(obs.insert_series("RATE", vec![]).is_err());
    }

    #[test]
    fn test_curve_interpolation() {
        let base = d(2024, 1, 1);
        let obs = CurveObserver::new("CURVE", base, &[(1.0, 0.02), (2.0, 0.04)]).unwrap();
        // Midpoint of the bracketing tenors.
        let mid = base.add_days(548); // ~1.5y
        assert_relative_eq!(obs.get("CURVE", mid).unwrap(), 0.03, epsilon = 1e-3);
        // Flat extrapolation on both sides.
        assert_eq!(obs.get("CURVE", base).unwrap(), 0.02);
        assert_eq!(obs.get("CURVE", base.add_days(3650)).unwrap(), 0.04);
        // Foreign identifier: no answer.
        assert_eq!(obs.observe("OTHER", mid).unwrap(), None);
    }

    #[test]
    fn test_curve_rejects_bad_axes() {
        let base = d(2024, 1, 1);
        assert!(CurveObserver::new("C", base, &[]).is_err());
        assert!(CurveObserver::new("C", base, &[(1.0, 0.02), (1.0, 0.04)]).is_err());
        assert!(CurveObserver::new("C", base, &[(2.0, 0.02), (1.0, 0.04)]).is_err());
    }

    #[test]
    fn test_composite_first_answer_wins() {
        let mut specific = DictObserver::default();
        specific.insert("SPREAD", 0.01);
        let mut composite = CompositeObserver::new();
        composite.push(Box::new(specific));
        composite.push(Box::new(ConstantObserver::new(9.9)));
        assert_eq!(composite.get("SPREAD", d(2024, 1, 1)).unwrap(), 0.01);
        // Falls through to the constant for anything else.
        assert_eq!(composite.get("OTHER", d(2024, 1, 1)).unwrap(), 9.9);
    }
}
