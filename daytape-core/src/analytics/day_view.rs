//! Per-index view over one loaded day.
//!
//! Everything that depends only on the record list (cumulative sums, minute
//! closes, minute returns) is computed once at construction. A
//! [`Snapshot`] is then an O(1) lookup plus one volatility window.

use super::minute::MinuteSeries;
use super::volatility::RollingVolatility;
use crate::domain::DayRecord;
use serde::Serialize;

/// Readout for a single cursor position.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub index: usize,
    pub total: usize,
    pub record: DayRecord,
    pub cum_volume: f64,
    pub cum_count: f64,
    /// `(c / first_close - 1) * 100`.
    pub pct_return: f64,
    /// Annualized, as a fraction. Absent until enough minute returns exist.
    pub volatility: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct DayView {
    records: Vec<DayRecord>,
    cum_volume: Vec<f64>,
    cum_count: Vec<f64>,
    first_close: f64,
    minutes: MinuteSeries,
    minute_returns: Vec<f64>,
    volatility: RollingVolatility,
}

impl DayView {
    pub fn new(records: Vec<DayRecord>, volatility: RollingVolatility) -> Self {
        let cum_volume = cumulative(records.iter().map(|r| r.v));
        let cum_count = cumulative(records.iter().map(|r| r.cnt));
        let first_close = records.first().map(|r| r.c).unwrap_or(f64::NAN);
        let minutes = MinuteSeries::build(&records);
        let minute_returns = minutes.log_returns();
        Self {
            records,
            cum_volume,
            cum_count,
            first_close,
            minutes,
            minute_returns,
            volatility,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.records
    }

    pub fn minutes(&self) -> &MinuteSeries {
        &self.minutes
    }

    /// Index of the last record, or `None` for an empty day.
    pub fn last_index(&self) -> Option<usize> {
        self.records.len().checked_sub(1)
    }

    /// Clamp `index` into `0..len`.
    pub fn clamp(&self, index: usize) -> usize {
        index.min(self.records.len().saturating_sub(1))
    }

    /// Percent return of `close` against the day's first close.
    pub fn pct_return(&self, close: f64) -> f64 {
        if self.first_close == 0.0 || self.first_close.is_nan() {
            return 0.0;
        }
        (close / self.first_close - 1.0) * 100.0
    }

    /// Rolling volatility at the minute containing record `index`.
    pub fn volatility_at(&self, index: usize) -> Option<f64> {
        let rec = self.records.get(index)?;
        let minute = self.minutes.index_of(rec.minute_key())?;
        self.volatility.at_minute(&self.minute_returns, minute)
    }

    /// Snapshot at `index`, clamped into range. `None` for an empty day.
    pub fn snapshot(&self, index: usize) -> Option<Snapshot> {
        if self.records.is_empty() {
            return None;
        }
        let index = self.clamp(index);
        let record = self.records[index].clone();
        Some(Snapshot {
            index,
            total: self.records.len(),
            cum_volume: self.cum_volume[index],
            cum_count: self.cum_count[index],
            pct_return: self.pct_return(record.c),
            volatility: self.volatility_at(index),
            record,
        })
    }
}

/// Running sum with `NaN` contributing zero.
fn cumulative(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut total = 0.0;
    values
        .map(|v| {
            if !v.is_nan() {
                total += v;
            }
            total
        })
        .collect()
}
