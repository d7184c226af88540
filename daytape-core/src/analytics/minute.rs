//! Minute bucketing of intraday records.
//!
//! Records are grouped by the `HH:MM` prefix of their timestamp. A bucket's
//! close is the close of the last record seen before the key changes. Minutes
//! with no records between two observed minutes are filled with the previous
//! bucket's close.

use crate::domain::DayRecord;
use chrono::{NaiveTime, Timelike};
use std::collections::HashMap;

const MINUTE_FORMAT: &str = "%H:%M";

/// Per-minute closes for one day. Rebuilt from scratch for every loaded day.
///
/// Filled gaps count as buckets, so a volatility window of `n` returns spans
/// `n` wall-clock minutes even on sparse days.
#[derive(Debug, Clone, Default)]
pub struct MinuteSeries {
    pub times: Vec<String>,
    pub closes: Vec<f64>,
    pub index_by_key: HashMap<String, usize>,
}

impl MinuteSeries {
    /// Bucket `records`, which are assumed to be in time order.
    pub fn build(records: &[DayRecord]) -> Self {
        let mut series = Self::default();
        let mut current: Option<&str> = None;
        let mut last_close: Option<f64> = None;

        for rec in records {
            let key = rec.minute_key();
            if key.is_empty() {
                continue;
            }
            match current {
                None => current = Some(key),
                Some(prev) if prev != key => {
                    series.push(prev, last_close.unwrap_or(rec.c));
                    series.fill_gap(prev, key);
                    current = Some(key);
                }
                Some(_) => {}
            }
            last_close = Some(rec.c);
        }

        if let Some(key) = current {
            let close = last_close
                .or_else(|| records.last().map(|r| r.c))
                .unwrap_or(f64::NAN);
            series.push(key, close);
        }
        series
    }

    fn push(&mut self, key: &str, close: f64) {
        self.index_by_key.insert(key.to_string(), self.times.len());
        self.times.push(key.to_string());
        self.closes.push(close);
    }

    /// Insert carry-forward buckets for every whole minute strictly between
    /// `prev` and `next`. Keys that are not `HH:MM` times are left alone.
    fn fill_gap(&mut self, prev: &str, next: &str) {
        let (Ok(from), Ok(to)) = (
            NaiveTime::parse_from_str(prev, MINUTE_FORMAT),
            NaiveTime::parse_from_str(next, MINUTE_FORMAT),
        ) else {
            return;
        };
        let from = from.hour() * 60 + from.minute();
        let to = to.hour() * 60 + to.minute();
        if to <= from + 1 {
            return;
        }
        let carried = self.closes.last().copied().unwrap_or(f64::NAN);
        for minute in (from + 1)..to {
            let key = format!("{:02}:{:02}", minute / 60, minute % 60);
            self.push(&key, carried);
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Bucket index for an `HH:MM` key.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index_by_key.get(key).copied()
    }

    /// Minute-over-minute log returns of the bucket closes.
    pub fn log_returns(&self) -> Vec<f64> {
        log_returns(&self.closes)
    }
}

/// `ln(p1 / p0)` for consecutive prices, or `0` unless both are positive.
pub fn log_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|w| {
            let (p0, p1) = (w[0], w[1]);
            if p0 > 0.0 && p1 > 0.0 && p0.is_finite() && p1.is_finite() {
                (p1 / p0).ln()
            } else {
                0.0
            }
        })
        .collect()
}
